/// 托管后端的 REST / Auth 路径
pub const PATH_EVALUATION_JOBS: &str = "/rest/v1/evaluation_jobs";
pub const PATH_AUTH_TOKEN: &str = "/auth/v1/token";
pub const PATH_AUTH_LOGOUT: &str = "/auth/v1/logout";

pub fn url_evaluation_jobs(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), PATH_EVALUATION_JOBS)
}

pub fn url_auth_token(base_url: &str, grant_type: &str) -> String {
    format!(
        "{}{}?grant_type={}",
        base_url.trim_end_matches('/'),
        PATH_AUTH_TOKEN,
        grant_type
    )
}

pub fn url_auth_logout(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), PATH_AUTH_LOGOUT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_paths_without_double_slash() {
        assert_eq!(
            url_evaluation_jobs("https://x.example.co/"),
            "https://x.example.co/rest/v1/evaluation_jobs"
        );
        assert_eq!(
            url_auth_token("https://x.example.co", "password"),
            "https://x.example.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(
            url_auth_logout("https://x.example.co"),
            "https://x.example.co/auth/v1/logout"
        );
    }
}
