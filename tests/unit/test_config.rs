//! Unit tests for the config module
//!
//! Tests cover:
//! - Config defaults
//! - TOML loading from an explicit path
//! - Environment overrides
//! - Validation and its exit code

use std::collections::HashMap;
use std::io::Write;

use lms_quiz::config::Config;
use lms_quiz::errors::{get_exit_code, EXIT_CONFIG_ERROR};

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

mod defaults_tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:5000/api");
        assert!(config.api_token.is_none());
        assert_eq!(config.http.request_timeout_secs, 30);
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert_eq!(config.retry.max_retries, 3);
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn test_default_validates() {
        assert!(Config::default().validate().is_ok());
    }
}

mod file_tests {
    use super::*;

    #[test]
    fn test_load_explicit_path() {
        let file = write_config(
            r#"
api_base_url = "https://lms.example.edu/api"
api_token = "abc"

[http]
request_timeout_secs = 5

[storage]
data_dir = "/tmp/lms-quiz-test"
"#,
        );
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.api_base_url, "https://lms.example.edu/api");
        assert_eq!(config.api_token.as_deref(), Some("abc"));
        assert_eq!(config.http.request_timeout_secs, 5);
        // Unset keys keep their defaults.
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert_eq!(config.retry.base_delay_ms, 500);
        assert_eq!(
            config.data_dir().unwrap(),
            std::path::PathBuf::from("/tmp/lms-quiz-test")
        );
    }

    #[test]
    fn test_empty_file_is_defaults() {
        let file = write_config("");
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.api_base_url, Config::default().api_base_url);
    }

    #[test]
    fn test_invalid_toml_fails() {
        let file = write_config("api_base_url = [");
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        assert!(Config::load(Some("/definitely/not/here/lms-quiz.toml")).is_err());
    }
}

mod env_tests {
    use super::*;

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("LMS_API_BASE_URL", "https://override.example/api"),
            ("LMS_API_TOKEN", "from-env"),
            ("LMS_TIMEOUT", "12"),
            ("LMS_DATA_DIR", "/var/lib/lms"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_base_url, "https://override.example/api");
        assert_eq!(config.api_token.as_deref(), Some("from-env"));
        assert_eq!(config.http.request_timeout_secs, 12);
        assert_eq!(
            config.storage.data_dir,
            Some(std::path::PathBuf::from("/var/lib/lms"))
        );
    }

    #[test]
    fn test_bad_timeout_and_blank_token_ignored() {
        let mut config = Config::default();
        config.apply_env_overrides(|k| match k {
            "LMS_TIMEOUT" => Some("soon".to_string()),
            "LMS_API_TOKEN" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.http.request_timeout_secs, 30);
        assert!(config.api_token.is_none());
    }
}

mod validation_tests {
    use super::*;

    #[test]
    fn test_non_http_url_rejected() {
        let config = Config {
            api_base_url: "ftp://lms".to_string(),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(get_exit_code(&err), EXIT_CONFIG_ERROR);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.http.request_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"));
    }
}
