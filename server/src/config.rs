use anyhow::{Result, anyhow};
use axum::http::HeaderValue;
use platform_db::SnapshotSettings;

const DEFAULT_SERVICE_NAME: &str = "employee-directory";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub service_name: String,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<HeaderValue>,
    pub snapshot: SnapshotSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            cors_allowed_origins: Vec::new(),
            snapshot: SnapshotSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let service_name = lookup("SERVICE_NAME")
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVICE_NAME.into());

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .map_err(|_| anyhow!("invalid CORS origin {origin:?}"))
            })
            .collect::<Result<Vec<_>>>()?;

        let snapshot = SnapshotSettings::from_lookup(&lookup);

        Ok(Self {
            service_name,
            cors_allowed_origins,
            snapshot,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, path::PathBuf};

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = load(&[]).unwrap();
        assert_eq!(config.service_name, "employee-directory");
        assert!(config.cors_allowed_origins.is_empty());
        assert!(config.snapshot.path.is_none());
    }

    #[test]
    fn reads_origins_and_snapshot_path() {
        let config = load(&[
            ("SERVICE_NAME", "hr-directory"),
            ("CORS_ALLOWED_ORIGINS", "http://localhost:5173, https://hr.example.com,"),
            ("EMPLOYEE_SNAPSHOT_PATH", "./db.json"),
        ])
        .unwrap();
        assert_eq!(config.service_name, "hr-directory");
        assert_eq!(config.cors_allowed_origins.len(), 2);
        assert_eq!(config.cors_allowed_origins[1], "https://hr.example.com");
        assert_eq!(config.snapshot.path, Some(PathBuf::from("./db.json")));
    }

    #[test]
    fn rejects_unprintable_origin() {
        let err = load(&[("CORS_ALLOWED_ORIGINS", "http://ok.example.com,bad\u{7f}origin")])
            .unwrap_err();
        assert!(err.to_string().contains("invalid CORS origin"));
    }
}
