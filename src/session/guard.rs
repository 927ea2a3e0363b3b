use super::auth::{AuthState, UserIdentity};

/// 路由守卫的结果
#[derive(Debug, PartialEq, Eq)]
pub enum GuardOutcome<'a> {
    /// 会话解析中，只显示加载页
    Loading,
    /// 未登录，跳转登录页
    RedirectToLogin,
    Render(&'a UserIdentity),
}

pub fn guard(state: &AuthState) -> GuardOutcome<'_> {
    match state {
        AuthState::Resolving => GuardOutcome::Loading,
        AuthState::SignedOut => GuardOutcome::RedirectToLogin,
        AuthState::SignedIn(user) => GuardOutcome::Render(user),
    }
}
