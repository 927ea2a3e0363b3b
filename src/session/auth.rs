use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: String,
    pub email: Option<String>,
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.email {
            Some(email) => write!(f, "{} ({})", email, self.id),
            None => f.write_str(&self.id),
        }
    }
}

/// 会话状态：启动时为 Resolving，解析完成后为 SignedOut 或 SignedIn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Resolving,
    SignedOut,
    SignedIn(UserIdentity),
}

impl AuthState {
    pub fn user(&self) -> Option<&UserIdentity> {
        match self {
            AuthState::SignedIn(user) => Some(user),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("auth service returned {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("auth response carried no user")]
    MissingUser,
    #[error("not signed in")]
    NotSignedIn,
    #[error("email and password are required")]
    MissingCredentials,
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// 启动时解析已有会话，None 表示需要登录
    async fn resolve(&self) -> Result<Option<UserIdentity>, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// 本地模式：没有托管认证服务，使用配置的本地身份
pub struct LocalAuthenticator {
    user_id: String,
}

impl LocalAuthenticator {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

#[async_trait]
impl Authenticator for LocalAuthenticator {
    async fn resolve(&self) -> Result<Option<UserIdentity>, AuthError> {
        Ok(Some(UserIdentity {
            id: self.user_id.clone(),
            email: None,
        }))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        // 本地库按邮箱隔离任务
        Ok(UserIdentity {
            id: email.trim().to_string(),
            email: Some(email.trim().to_string()),
        })
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_authenticator_resolves_configured_identity() {
        let auth = LocalAuthenticator::new("local");
        let user = auth.resolve().await.unwrap().unwrap();
        assert_eq!(user.id, "local");
        assert_eq!(user.to_string(), "local");
    }

    #[tokio::test]
    async fn local_sign_in_requires_credentials() {
        let auth = LocalAuthenticator::new("local");
        assert!(matches!(
            auth.sign_in(" ", "pw").await,
            Err(AuthError::MissingCredentials)
        ));
        let user = auth.sign_in("ana@example.com", "pw").await.unwrap();
        assert_eq!(user.id, "ana@example.com");
    }
}
