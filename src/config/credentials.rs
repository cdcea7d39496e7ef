use crate::utils::error::{EtlError, Result};
use serde_json::Value;
use std::path::Path;
use std::{env, fs};

pub const CREDENTIALS_ENV: &str = "GOOGLE_CREDENTIALS";

/// Service-account credentials, treated as an opaque JSON object. Only
/// validated for shape early so a garbled secret fails the run before any
/// fetching happens.
#[derive(Debug, Clone)]
pub struct ServiceCredentials {
    raw: Value,
}

impl ServiceCredentials {
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(content)?;
        if !raw.is_object() {
            return Err(EtlError::ConfigError {
                message: "credentials JSON must be an object".to_string(),
            });
        }
        Ok(Self { raw })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn from_env() -> Result<Option<Self>> {
        match env::var(CREDENTIALS_ENV) {
            Ok(content) => Self::from_json(&content).map(Some),
            Err(_) => Ok(None),
        }
    }

    pub fn client_email(&self) -> Option<&str> {
        self.raw.get("client_email").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_service_account_json() {
        let creds = ServiceCredentials::from_json(
            r#"{"type": "service_account", "client_email": "bot@example.iam.gserviceaccount.com"}"#,
        )
        .unwrap();
        assert_eq!(
            creds.client_email(),
            Some("bot@example.iam.gserviceaccount.com")
        );
    }

    #[test]
    fn garbage_is_a_credentials_error() {
        let err = ServiceCredentials::from_json("not json").unwrap_err();
        assert!(matches!(err, EtlError::CredentialsError(_)));
    }

    #[test]
    fn non_object_json_is_rejected() {
        let err = ServiceCredentials::from_json("[1, 2]").unwrap_err();
        assert!(matches!(err, EtlError::ConfigError { .. }));
    }
}
