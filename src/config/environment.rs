//! Deployment environment.
//!
//! Chooses which `config/<env>.toml` layer sits on top of `default.toml`.
//! The same type backs `CINOTIFY_APP_ENV` and the `--env` flag, so both
//! accept the same names and aliases.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    #[value(alias = "dev")]
    Development,
    Test,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl Environment {
    pub const ENV_VAR: &'static str = "CINOTIFY_APP_ENV";

    /// Environment named by `CINOTIFY_APP_ENV`.
    ///
    /// Unset or unparsable values give [`Environment::Development`].
    pub fn from_env() -> Self {
        match std::env::var(Self::ENV_VAR) {
            Ok(value) => value.parse().unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    /// Name of the layer file loaded for this environment.
    pub fn file_name(&self) -> String {
        format!("{}.toml", self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    /// Case-insensitive, accepting the same aliases as `--env`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s.trim(), true).map_err(|_| {
            let valid: Vec<&str> = Self::value_variants().iter().map(Self::as_str).collect();
            ConfigError::EnvVarError(format!(
                "Invalid environment '{}'. Valid values are: {}",
                s,
                valid.join(", ")
            ))
        })
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::env_lock;

    #[test]
    fn test_names_and_aliases() {
        let cases = [
            ("development", Environment::Development),
            ("dev", Environment::Development),
            ("test", Environment::Test),
            ("staging", Environment::Staging),
            ("stage", Environment::Staging),
            ("production", Environment::Production),
            ("prod", Environment::Production),
            (" Prod ", Environment::Production),
            ("STAGING", Environment::Staging),
        ];
        for (input, expected) in cases {
            assert_eq!(input.parse::<Environment>().unwrap(), expected, "{input}");
        }
    }

    #[test]
    fn test_invalid_lists_every_name() {
        let err = "qa".parse::<Environment>().unwrap_err().to_string();
        assert!(err.contains("'qa'"));
        assert!(err.contains("development, test, staging, production"));
    }

    #[test]
    fn test_value_enum_names_match_as_str() {
        for env in Environment::value_variants() {
            let value = env.to_possible_value().unwrap();
            assert_eq!(value.get_name(), env.as_str());
            assert_eq!(env.to_string(), env.as_str());
        }
    }

    #[test]
    fn test_file_name() {
        assert_eq!(Environment::default().file_name(), "development.toml");
        assert_eq!(Environment::Staging.file_name(), "staging.toml");
    }

    #[test]
    fn test_from_env() {
        let _lock = env_lock();

        unsafe { std::env::set_var(Environment::ENV_VAR, "stage") };
        assert_eq!(Environment::from_env(), Environment::Staging);

        unsafe { std::env::set_var(Environment::ENV_VAR, "nonsense") };
        assert_eq!(Environment::from_env(), Environment::Development);

        unsafe { std::env::remove_var(Environment::ENV_VAR) };
        assert_eq!(Environment::from_env(), Environment::Development);
    }
}
