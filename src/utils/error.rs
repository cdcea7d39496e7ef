use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("HTTP request failed: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Credentials error: {0}")]
    CredentialsError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Unparsable date '{value}' (expected {expected})")]
    DateError { value: String, expected: String },

    #[error("Sink header mismatch: expected {expected:?}, found {found:?}")]
    HeaderMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

impl EtlError {
    /// Process exit code for a fatal error. Success and benign no-ops exit 0.
    pub fn exit_code(&self) -> i32 {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::CredentialsError(_) => 2,
            EtlError::FetchError(_) => 3,
            EtlError::ParseError { .. } | EtlError::DateError { .. } => 4,
            EtlError::HeaderMismatch { .. } => 5,
            EtlError::IoError(_) | EtlError::CsvError(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_nonzero_and_stable() {
        let config = EtlError::ConfigError {
            message: "missing store".into(),
        };
        assert_eq!(config.exit_code(), 2);

        let parse = EtlError::ParseError {
            message: "no result tables".into(),
        };
        assert_eq!(parse.exit_code(), 4);

        let mismatch = EtlError::HeaderMismatch {
            expected: vec!["Ngày".into()],
            found: vec!["Date".into()],
        };
        assert_eq!(mismatch.exit_code(), 5);
    }

    #[test]
    fn date_error_message_names_value_and_format() {
        let err = EtlError::DateError {
            value: "31/31/2024".into(),
            expected: "%d/%m/%Y".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("31/31/2024"));
        assert!(msg.contains("%d/%m/%Y"));
    }
}
