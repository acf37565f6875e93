// Runtime settings, read from the environment like the rest of the CLI.
//
// - `SOAP_SERVER_URL`: server root, `/soap` and `/api/health` are appended.
// - `SOAP_TIMEOUT_SECS`: optional request timeout; none by default.
// - `RUST_LOG`: log filter for the tracing subscriber.

use anyhow::{Context, Result};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: None,
            log_level: DEFAULT_LOG_LEVEL.into(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns the value of a variable
    /// if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = present("SOAP_SERVER_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let timeout = match present("SOAP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("SOAP_TIMEOUT_SECS must be a number of seconds, got `{}`", raw))?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };
        let log_level = present("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_LEVEL.into());

        Ok(Settings {
            base_url,
            timeout,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.timeout, None);
    }

    #[test]
    fn reads_every_variable() {
        let settings = Settings::from_lookup(lookup(&[
            ("SOAP_SERVER_URL", "http://directory.local:8080"),
            ("SOAP_TIMEOUT_SECS", "15"),
            ("RUST_LOG", "userdir_soap_cli=debug"),
        ]))
        .unwrap();

        assert_eq!(settings.base_url, "http://directory.local:8080");
        assert_eq!(settings.timeout, Some(Duration::from_secs(15)));
        assert_eq!(settings.log_level, "userdir_soap_cli=debug");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let settings = Settings::from_lookup(lookup(&[("SOAP_SERVER_URL", "  ")])).unwrap();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn invalid_timeout_is_an_error() {
        let err = Settings::from_lookup(lookup(&[("SOAP_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("SOAP_TIMEOUT_SECS"));
    }
}
