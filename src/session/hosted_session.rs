use super::auth::{AuthError, Authenticator, UserIdentity};
use super::dto::{PasswordGrant, RefreshGrant, TokenResponse};
use super::urls::{url_auth_logout, url_auth_token};
use crate::config::HostedBackend;
use async_trait::async_trait;
use base64::Engine;
use log::{info, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Tokens {
    access_token: String,
    refresh_token: Option<String>,
    user: UserIdentity,
}

/// 托管后端会话
///
/// 持有 access/refresh token，为每个请求附加 `apikey` 与 Bearer 头。
/// 请求返回 401 时会刷新 token 并重试。
pub struct HostedSession {
    client: Client,
    base_url: String,
    anon_key: String,
    tokens: RwLock<Option<Tokens>>,
    max_tries: usize,
    delay_unexpected: Duration,
}

impl HostedSession {
    /// 创建一个新的 HostedSession
    ///
    /// # 参数
    ///
    /// * `backend` - 托管后端地址与匿名 key
    /// * `max_tries` - 普通请求最大尝试次数
    /// * `delay_unexpected` - 认证失效后重试前的等待时间（秒）
    pub fn new(
        backend: &HostedBackend,
        max_tries: usize,
        delay_unexpected: f64,
    ) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("mleval/0.1")
            .build()?;
        Ok(Self {
            client,
            base_url: backend.url.clone(),
            anon_key: backend.anon_key.clone(),
            tokens: RwLock::new(None),
            max_tries: max_tries.max(1),
            delay_unexpected: Duration::from_secs_f64(delay_unexpected.max(0.0)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn current_user(&self) -> Option<UserIdentity> {
        self.tokens.read().await.as_ref().map(|t| t.user.clone())
    }

    async fn token_request<T: serde::Serialize + ?Sized>(
        &self,
        grant_type: &str,
        body: &T,
    ) -> Result<TokenResponse, AuthError> {
        let url = url_auth_token(&self.base_url, grant_type);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("{} token_request({}) [{}]", self, grant_type, status);
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json::<TokenResponse>().await?)
    }

    fn store_tokens(resp: TokenResponse, fallback_email: Option<&str>) -> Result<Tokens, AuthError> {
        let user = match resp.user {
            Some(u) => UserIdentity {
                id: u.id,
                email: u.email.or_else(|| fallback_email.map(str::to_string)),
            },
            None => UserIdentity {
                id: user_id_from_token(&resp.access_token).ok_or(AuthError::MissingUser)?,
                email: fallback_email.map(str::to_string),
            },
        };
        Ok(Tokens {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
            user,
        })
    }

    /// 用 refresh token 换取新的 access token
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let (refresh_token, email) = {
            let guard = self.tokens.read().await;
            let tokens = guard.as_ref().ok_or(AuthError::NotSignedIn)?;
            let refresh = tokens.refresh_token.clone().ok_or(AuthError::NotSignedIn)?;
            (refresh, tokens.user.email.clone())
        };

        let resp = self
            .token_request(
                "refresh_token",
                &RefreshGrant {
                    refresh_token: &refresh_token,
                },
            )
            .await?;
        let tokens = Self::store_tokens(resp, email.as_deref())?;
        info!("{} refresh(...) [{}]", self, tokens.user.id);
        *self.tokens.write().await = Some(tokens);
        Ok(())
    }

    fn authorize(&self, builder: RequestBuilder, access_token: &str) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
    }

    /// 执行带认证头的请求，401 时刷新会话并重试
    ///
    /// # 参数
    ///
    /// * `builder` - 一个闭包，接收 Client 并返回 RequestBuilder
    pub async fn request<F>(&self, builder: F) -> Result<Response, AuthError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut tries = 0;
        loop {
            tries += 1;
            let access_token = self
                .tokens
                .read()
                .await
                .as_ref()
                .map(|t| t.access_token.clone())
                .ok_or(AuthError::NotSignedIn)?;

            let resp = self
                .authorize(builder(&self.client), &access_token)
                .send()
                .await?;

            if resp.status() != StatusCode::UNAUTHORIZED || tries >= self.max_tries {
                if resp.status() == StatusCode::UNAUTHORIZED {
                    warn!("{} request(...) [max {} tries ran out]", self, tries);
                }
                return Ok(resp);
            }

            // 会话过期：等待后刷新再试
            tokio::time::sleep(self.delay_unexpected).await;
            if let Err(e) = self.refresh().await {
                warn!("{} refresh after 401 failed: {}", self, e);
            }
        }
    }
}

#[async_trait]
impl Authenticator for HostedSession {
    async fn resolve(&self) -> Result<Option<UserIdentity>, AuthError> {
        Ok(self.current_user().await)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let resp = self
            .token_request(
                "password",
                &PasswordGrant {
                    email: email.trim(),
                    password,
                },
            )
            .await?;
        let tokens = Self::store_tokens(resp, Some(email.trim()))?;
        let user = tokens.user.clone();
        *self.tokens.write().await = Some(tokens);
        info!("{} sign_in(...) [{}]", self, user.id);
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let tokens = self.tokens.write().await.take();
        if let Some(tokens) = tokens {
            let resp = self
                .authorize(
                    self.client.post(url_auth_logout(&self.base_url)),
                    &tokens.access_token,
                )
                .send()
                .await?;
            if !resp.status().is_success() {
                // 本地 token 已清除，服务端失败只记录
                warn!("{} sign_out(...) [{}]", self, resp.status());
            }
        }
        Ok(())
    }
}

/// 从 JWT 的 payload 中读取 `sub`
pub fn user_id_from_token(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("sub")?.as_str().map(str::to_string)
}

impl std::fmt::Display for HostedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<HostedSession [{}]>", self.base_url)
    }
}

impl std::fmt::Debug for HostedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<HostedSession [{}]>", self.base_url)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::session::dto::AuthUser;
    use crate::session::urls::url_evaluation_jobs;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    pub(crate) fn http(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    pub(crate) fn token_body(access: &str, refresh: &str, user_id: &str) -> String {
        serde_json::json!({
            "access_token": access,
            "refresh_token": refresh,
            "expires_in": 3600,
            "user": {"id": user_id, "email": "ana@example.com"}
        })
        .to_string()
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + len {
                break;
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// 本地 HTTP 替身：按顺序对每个连接回放一条响应，并记录收到的原始请求
    pub(crate) async fn serve(responses: Vec<String>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        tokio::spawn(async move {
            for response in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let request = read_request(&mut stream).await;
                log.lock().unwrap().push(request);
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        (format!("http://{}", addr), seen)
    }

    pub(crate) fn header<'a>(request: &'a str, name: &str) -> Option<&'a str> {
        request.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }

    pub(crate) fn session_at(base: &str, max_tries: usize) -> HostedSession {
        let backend = HostedBackend {
            url: base.to_string(),
            anon_key: "anon-key".into(),
        };
        HostedSession::new(&backend, max_tries, 0.0).unwrap()
    }

    fn jwt_with(claims: &str) -> String {
        let enc = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        format!(
            "{}.{}.sig",
            enc.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            enc.encode(claims)
        )
    }

    #[test]
    fn reads_sub_claim() {
        let token = jwt_with(r#"{"sub":"3f1c-user","role":"authenticated"}"#);
        assert_eq!(user_id_from_token(&token).as_deref(), Some("3f1c-user"));
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert_eq!(user_id_from_token("not-a-jwt"), None);
        assert_eq!(user_id_from_token("a.!!!.c"), None);
        assert_eq!(user_id_from_token(&jwt_with(r#"{"role":"anon"}"#)), None);
    }

    #[test]
    fn prefers_user_object_over_token_claims() {
        let resp = TokenResponse {
            access_token: jwt_with(r#"{"sub":"from-token"}"#),
            refresh_token: Some("r".into()),
            expires_in: Some(3600),
            user: Some(AuthUser {
                id: "from-user".into(),
                email: None,
            }),
        };
        let tokens = HostedSession::store_tokens(resp, Some("a@b.c")).unwrap();
        assert_eq!(tokens.user.id, "from-user");
        assert_eq!(tokens.user.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn falls_back_to_token_sub() {
        let resp = TokenResponse {
            access_token: jwt_with(r#"{"sub":"from-token"}"#),
            refresh_token: None,
            expires_in: None,
            user: None,
        };
        let tokens = HostedSession::store_tokens(resp, None).unwrap();
        assert_eq!(tokens.user.id, "from-token");

        let opaque = TokenResponse {
            access_token: "opaque".into(),
            refresh_token: None,
            expires_in: None,
            user: None,
        };
        assert!(matches!(
            HostedSession::store_tokens(opaque, None),
            Err(AuthError::MissingUser)
        ));
    }

    #[tokio::test]
    async fn requests_need_a_session() {
        let backend = HostedBackend {
            url: "http://127.0.0.1:9".into(),
            anon_key: "anon".into(),
        };
        let session = HostedSession::new(&backend, 3, 0.0).unwrap();
        assert!(session.current_user().await.is_none());
        let err = session.request(|c| c.get("http://127.0.0.1:9")).await.unwrap_err();
        assert!(matches!(err, AuthError::NotSignedIn));
        assert!(matches!(session.refresh().await, Err(AuthError::NotSignedIn)));
    }

    #[tokio::test]
    async fn sign_in_uses_password_grant_with_apikey() {
        let (base, seen) = serve(vec![http("200 OK", &token_body("access-1", "refresh-1", "u1"))]).await;
        let session = session_at(&base, 3);

        let user = session.sign_in(" ana@example.com ", "pw").await.unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(session.current_user().await, Some(user));

        let seen = seen.lock().unwrap();
        assert!(seen[0].starts_with("POST /auth/v1/token?grant_type=password "));
        assert_eq!(header(&seen[0], "apikey"), Some("anon-key"));
        assert!(seen[0].contains(r#""email":"ana@example.com""#));
    }

    #[tokio::test]
    async fn unauthorized_request_refreshes_then_retries_with_new_token() {
        let (base, seen) = serve(vec![
            http("200 OK", &token_body("access-1", "refresh-1", "u1")),
            http("401 Unauthorized", r#"{"message":"JWT expired"}"#),
            http("200 OK", &token_body("access-2", "refresh-2", "u1")),
            http("200 OK", "[]"),
        ])
        .await;
        let session = session_at(&base, 3);
        session.sign_in("ana@example.com", "pw").await.unwrap();

        let url = url_evaluation_jobs(&base);
        let resp = session.request(|c| c.get(&url)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen[1].starts_with("GET /rest/v1/evaluation_jobs "));
        assert_eq!(header(&seen[1], "authorization"), Some("Bearer access-1"));
        assert_eq!(header(&seen[1], "apikey"), Some("anon-key"));
        assert!(seen[2].starts_with("POST /auth/v1/token?grant_type=refresh_token "));
        assert!(seen[2].contains(r#""refresh_token":"refresh-1""#));
        assert_eq!(header(&seen[3], "authorization"), Some("Bearer access-2"));
        drop(seen);

        // refresh token 随响应轮换
        let tokens = session.tokens.read().await.clone().unwrap();
        assert_eq!(tokens.access_token, "access-2");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-2"));
    }

    #[tokio::test]
    async fn retries_stop_at_max_tries() {
        let (base, seen) = serve(vec![
            http("200 OK", &token_body("access-1", "refresh-1", "u1")),
            http("401 Unauthorized", "{}"),
            http("200 OK", &token_body("access-2", "refresh-2", "u1")),
            http("401 Unauthorized", "{}"),
        ])
        .await;
        let session = session_at(&base, 2);
        session.sign_in("ana@example.com", "pw").await.unwrap();

        let url = url_evaluation_jobs(&base);
        let resp = session.request(|c| c.get(&url)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(seen.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn sign_out_drops_tokens_and_calls_logout() {
        let (base, seen) = serve(vec![
            http("200 OK", &token_body("access-1", "refresh-1", "u1")),
            http("204 No Content", ""),
        ])
        .await;
        let session = session_at(&base, 3);
        session.sign_in("ana@example.com", "pw").await.unwrap();
        session.sign_out().await.unwrap();

        assert!(session.current_user().await.is_none());
        let seen = seen.lock().unwrap();
        assert!(seen[1].starts_with("POST /auth/v1/logout "));
        assert_eq!(header(&seen[1], "authorization"), Some("Bearer access-1"));
    }
}
