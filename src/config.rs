use anyhow::{bail, Context};
use std::path::PathBuf;

/// 托管后端（REST 表 + 认证服务）
#[derive(Debug, Clone, PartialEq)]
pub struct HostedBackend {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    Hosted(HostedBackend),
    Local { database_url: String, user_id: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub email: Option<String>,
    pub password: Option<String>,
    pub step_scale: f64,
    pub report_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Config {
    /// 读取 `.env` 后再从进程环境变量构建配置
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend = match get("EVAL_BACKEND_URL") {
            Some(url) => {
                let anon_key = get("EVAL_ANON_KEY")
                    .context("EVAL_BACKEND_URL is set but EVAL_ANON_KEY is missing")?;
                Backend::Hosted(HostedBackend {
                    url: url.trim_end_matches('/').to_string(),
                    anon_key,
                })
            }
            None => Backend::Local {
                database_url: get("DATABASE_URL")
                    .unwrap_or_else(|| "sqlite://evaluations.db?mode=rwc".to_string()),
                user_id: get("EVAL_LOCAL_USER").unwrap_or_else(|| "local".to_string()),
            },
        };

        let step_scale = match get("EVAL_STEP_SCALE") {
            Some(raw) => raw
                .parse::<f64>()
                .with_context(|| format!("invalid EVAL_STEP_SCALE: {}", raw))?,
            None => 1.0,
        };
        if !step_scale.is_finite() || step_scale < 0.0 {
            bail!("EVAL_STEP_SCALE must be a non-negative number, got {}", step_scale);
        }

        Ok(Self {
            backend,
            email: get("EVAL_EMAIL"),
            password: get("EVAL_PASSWORD"),
            step_scale,
            report_dir: PathBuf::from(get("EVAL_REPORT_DIR").unwrap_or_else(|| "reports".into())),
            log_dir: PathBuf::from(get("EVAL_LOG_DIR").unwrap_or_else(|| "logs".into())),
        })
    }

    /// 同时提供账号和密码时才自动登录
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.email, &self.password) {
            (Some(e), Some(p)) => Some((e.clone(), p.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_to_local_sqlite_store() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(
            cfg.backend,
            Backend::Local {
                database_url: "sqlite://evaluations.db?mode=rwc".to_string(),
                user_id: "local".to_string(),
            }
        );
        assert_eq!(cfg.step_scale, 1.0);
        assert_eq!(cfg.report_dir, PathBuf::from("reports"));
        assert!(cfg.credentials().is_none());
    }

    #[test]
    fn hosted_backend_requires_anon_key() {
        assert!(config_from(&[("EVAL_BACKEND_URL", "https://db.example.com")]).is_err());

        let cfg = config_from(&[
            ("EVAL_BACKEND_URL", "https://db.example.com/"),
            ("EVAL_ANON_KEY", "anon"),
            ("EVAL_EMAIL", "a@b.c"),
            ("EVAL_PASSWORD", "pw"),
        ])
        .unwrap();
        assert_eq!(
            cfg.backend,
            Backend::Hosted(HostedBackend {
                url: "https://db.example.com".to_string(),
                anon_key: "anon".to_string(),
            })
        );
        assert_eq!(cfg.credentials(), Some(("a@b.c".to_string(), "pw".to_string())));
    }

    #[test]
    fn rejects_negative_step_scale() {
        assert!(config_from(&[("EVAL_STEP_SCALE", "-1")]).is_err());
        assert!(config_from(&[("EVAL_STEP_SCALE", "abc")]).is_err());
        let cfg = config_from(&[("EVAL_STEP_SCALE", "0")]).unwrap();
        assert_eq!(cfg.step_scale, 0.0);
    }
}
