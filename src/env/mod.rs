//! Build environment resolution
//!
//! The environment is read exactly once per run and then passed by value
//! to every component that needs it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Process variable that selects the build environment
pub const ENV_VAR: &str = "NODE_ENV";

/// The only value of [`ENV_VAR`] that selects development
pub const DEVELOPMENT_TOKEN: &str = "development";

/// Build environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Resolve the environment from the process environment.
    ///
    /// Anything other than the literal development token, including an
    /// unset variable, resolves to production.
    pub fn resolve() -> Self {
        let value = std::env::var(ENV_VAR).ok();
        Self::from_flag(value.as_deref())
    }

    /// Map a raw flag value to an environment
    pub fn from_flag(value: Option<&str>) -> Self {
        match value {
            Some(DEVELOPMENT_TOKEN) => Environment::Development,
            _ => Environment::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
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

    #[test]
    fn test_development_token() {
        assert_eq!(Environment::from_flag(Some("development")), Environment::Development);
    }

    #[test]
    fn test_everything_else_is_production() {
        assert_eq!(Environment::from_flag(None), Environment::Production);
        assert_eq!(Environment::from_flag(Some("production")), Environment::Production);
        assert_eq!(Environment::from_flag(Some("Development")), Environment::Production);
        assert_eq!(Environment::from_flag(Some("")), Environment::Production);
        assert_eq!(Environment::from_flag(Some("dev")), Environment::Production);
    }

    #[test]
    fn test_display() {
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Production.to_string(), "production");
    }
}
