//! Credential and LLM settings loading.
//!
//! Settings come from a TOML secrets file with a top-level `API_KEY` and an
//! optional `[llm]` table:
//!
//! ```toml
//! API_KEY = "sk-..."
//!
//! [llm]
//! model = "gpt-4o"
//! base_url = "https://api.openai.com/v1/chat/completions"
//! max_tokens = 1500
//! temperature = 0.3
//! retries = 2
//! ```
//!
//! The `CDSS_API_KEY` environment variable overrides the file's key. A
//! missing file is not an error by itself; a missing key is, but only when
//! [`Settings::api_key`] is asked for it.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ConfigurationError;

/// Environment variable that overrides `API_KEY` in the secrets file.
pub const API_KEY_ENV: &str = "CDSS_API_KEY";

/// Default secrets file location, relative to the working directory.
pub const DEFAULT_SECRETS_PATH: &str = "secrets.toml";

/// Optional per-deployment LLM overrides from the `[llm]` table.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LlmSettings {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub retries: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
struct SecretsFile {
    #[serde(rename = "API_KEY")]
    api_key: Option<String>,
    #[serde(default)]
    llm: LlmSettings,
}

/// Resolved settings: where they came from, the credential, and overrides.
#[derive(Debug, Clone)]
pub struct Settings {
    path: PathBuf,
    api_key: Option<String>,
    pub llm: LlmSettings,
}

impl Settings {
    /// Load from `path`, then apply the `CDSS_API_KEY` override.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let env_key = std::env::var(API_KEY_ENV).ok();
        Self::load_with_env(path, env_key)
    }

    /// Load from `path` with an explicit environment override value.
    pub fn load_with_env(
        path: impl AsRef<Path>,
        env_key: Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let path = path.as_ref().to_path_buf();
        let file = if path.exists() {
            let text = std::fs::read_to_string(&path).map_err(|source| {
                ConfigurationError::Unreadable {
                    path: path.clone(),
                    source,
                }
            })?;
            toml::from_str::<SecretsFile>(&text).map_err(|source| {
                ConfigurationError::Malformed {
                    path: path.clone(),
                    source,
                }
            })?
        } else {
            debug!("No secrets file at {}", path.display());
            SecretsFile::default()
        };

        let api_key = non_blank(env_key).or_else(|| non_blank(file.api_key));
        if api_key.is_none() {
            warn!(
                "API key not found: set {API_KEY_ENV} or API_KEY in {}",
                path.display()
            );
        }

        Ok(Self {
            path,
            api_key,
            llm: file.llm,
        })
    }

    /// Settings built in code, bypassing any file.
    pub fn from_key(api_key: Option<String>) -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SECRETS_PATH),
            api_key: non_blank(api_key),
            llm: LlmSettings::default(),
        }
    }

    /// The credential, or the error that must block every LLM call.
    pub fn api_key(&self) -> Result<&str, ConfigurationError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ConfigurationError::MissingCredential {
                env_var: API_KEY_ENV.to_string(),
                path: self.path.clone(),
            })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn secrets_file(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn reads_key_and_llm_table() {
        let f = secrets_file(
            r#"
API_KEY = "sk-test"

[llm]
model = "gpt-4o-mini"
retries = 4
"#,
        );
        let settings = Settings::load_with_env(f.path(), None).unwrap();
        assert_eq!(settings.api_key().unwrap(), "sk-test");
        assert_eq!(settings.llm.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(settings.llm.retries, Some(4));
        assert_eq!(settings.llm.temperature, None);
    }

    #[test]
    fn env_overrides_file_key() {
        let f = secrets_file(r#"API_KEY = "from-file""#);
        let settings = Settings::load_with_env(f.path(), Some("from-env".into())).unwrap();
        assert_eq!(settings.api_key().unwrap(), "from-env");
    }

    #[test]
    fn blank_env_falls_back_to_file() {
        let f = secrets_file(r#"API_KEY = "from-file""#);
        let settings = Settings::load_with_env(f.path(), Some("  ".into())).unwrap();
        assert_eq!(settings.api_key().unwrap(), "from-file");
    }

    #[test]
    fn missing_file_and_env_is_missing_credential() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        let settings = Settings::load_with_env(&path, None).unwrap();
        assert!(!settings.has_credential());
        assert!(matches!(
            settings.api_key(),
            Err(ConfigurationError::MissingCredential { .. })
        ));
    }

    #[test]
    fn blank_key_in_file_is_missing() {
        let f = secrets_file(r#"API_KEY = """#);
        let settings = Settings::load_with_env(f.path(), None).unwrap();
        assert!(settings.api_key().is_err());
    }

    #[test]
    fn malformed_file_is_reported() {
        let f = secrets_file("API_KEY = ");
        assert!(matches!(
            Settings::load_with_env(f.path(), None),
            Err(ConfigurationError::Malformed { .. })
        ));
    }

    #[test]
    fn unknown_llm_keys_are_rejected() {
        let f = secrets_file("[llm]\nmodle = \"typo\"\n");
        assert!(Settings::load_with_env(f.path(), None).is_err());
    }
}
