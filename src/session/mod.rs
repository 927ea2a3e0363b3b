pub mod auth;
pub mod dto;
pub mod guard;
pub mod hosted_session;
pub mod urls;

pub use auth::{AuthError, AuthState, Authenticator, LocalAuthenticator, UserIdentity};
pub use guard::{guard, GuardOutcome};
pub use hosted_session::HostedSession;
