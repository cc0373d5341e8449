//! Connection settings from the environment and optional TOML overrides.

use std::fs;
use std::path::{Path, PathBuf};

use quiz_core::{ParseOptions, QuizSettings, RetryPolicy};
use serde::Deserialize;
use thiserror::Error;

pub const URL_VAR: &str = "CANVAS_URL";
pub const TOKEN_VAR: &str = "CANVAS_API_TOKEN";
pub const COURSE_VAR: &str = "CANVAS_COURSE_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Where and as whom to create quizzes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub base_url: String,
    pub token: String,
    pub course_id: u64,
}

impl Connection {
    /// Read `CANVAS_URL`, `CANVAS_API_TOKEN` and `CANVAS_COURSE_ID`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let base_url = required(URL_VAR)?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: URL_VAR,
                expected: "an http(s) URL",
                value: base_url,
            });
        }
        let token = required(TOKEN_VAR)?;
        let course = required(COURSE_VAR)?;
        let course_id = course.parse().map_err(|_| ConfigError::Invalid {
            name: COURSE_VAR,
            expected: "an integer",
            value: course.clone(),
        })?;

        Ok(Self {
            base_url,
            token,
            course_id,
        })
    }
}

/// Contents of the `--config` file. Every table is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub parse: ParseOptions,
    pub quiz: QuizSettings,
    pub retry: RetryPolicy,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn reads_all_three_variables() {
        let conn = Connection::from_lookup(lookup(&[
            (URL_VAR, "https://school.instructure.com"),
            (TOKEN_VAR, " abc "),
            (COURSE_VAR, "4321"),
        ]))
        .unwrap();
        assert_eq!(conn.base_url, "https://school.instructure.com");
        assert_eq!(conn.token, "abc");
        assert_eq!(conn.course_id, 4321);
    }

    #[test]
    fn missing_token_names_the_variable() {
        let err = Connection::from_lookup(lookup(&[
            (URL_VAR, "https://school.instructure.com"),
            (COURSE_VAR, "1"),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "CANVAS_API_TOKEN is not set");
    }

    #[test]
    fn blank_values_count_as_missing() {
        let err = Connection::from_lookup(lookup(&[(URL_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(URL_VAR)));
    }

    #[test]
    fn course_id_must_be_an_integer() {
        let err = Connection::from_lookup(lookup(&[
            (URL_VAR, "https://school.instructure.com"),
            (TOKEN_VAR, "abc"),
            (COURSE_VAR, "intro-101"),
        ]))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "CANVAS_COURSE_ID must be an integer, got \"intro-101\""
        );
    }

    #[test]
    fn url_needs_a_scheme() {
        let err = Connection::from_lookup(lookup(&[(URL_VAR, "school.instructure.com")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: URL_VAR, .. }));
    }

    #[test]
    fn config_tables_override_defaults() {
        let config: FileConfig = toml::from_str(
            "[parse]\ndefault_points = 2.5\n\n[quiz]\nshuffle_answers = true\n\n[retry]\nmax_attempts = 6\n",
        )
        .unwrap();
        assert_eq!(config.parse.default_points, 2.5);
        assert_eq!(config.parse.fallback_title, "Quiz");
        assert!(config.quiz.shuffle_answers);
        assert!(!config.quiz.shuffle_questions);
        assert_eq!(config.retry.max_attempts, 6);
        assert_eq!(config.retry.initial_backoff_ms, RetryPolicy::default().initial_backoff_ms);
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn unknown_tables_are_rejected() {
        assert!(toml::from_str::<FileConfig>("[publish]\nnow = true\n").is_err());
    }

    #[test]
    fn load_reports_the_path() {
        let err = FileConfig::load(Path::new("/nonexistent/quizgen.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/quizgen.toml"), "{err}");
    }
}
