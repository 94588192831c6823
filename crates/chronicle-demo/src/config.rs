//! Environment configuration for the demo binary.

use chronicle_core::bus::HandlingStrategy;

use crate::error::AppError;

/// Environment variable selecting the event bus strategy.
pub const STRATEGY_VAR: &str = "EVENT_HANDLING_STRATEGY";
/// Environment variable naming the demo user.
pub const USER_NAME_VAR: &str = "DEMO_USER_NAME";

const DEFAULT_USER_NAME: &str = "Ann";

/// Settings read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    /// Handling strategy of the event bus.
    pub strategy: HandlingStrategy,
    /// Name given to the user created by the scenario.
    pub user_name: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            strategy: HandlingStrategy::default(),
            user_name: DEFAULT_USER_NAME.to_owned(),
        }
    }
}

impl DemoConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, unset variables falling
    /// back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let strategy = match lookup(STRATEGY_VAR) {
            Some(raw) => raw
                .parse::<HandlingStrategy>()
                .map_err(|e| AppError::Config(format!("{STRATEGY_VAR}: {e}")))?,
            None => defaults.strategy,
        };

        let user_name = match lookup(USER_NAME_VAR) {
            Some(raw) if raw.trim().is_empty() => {
                return Err(AppError::Config(format!("{USER_NAME_VAR} must not be empty")));
            }
            Some(raw) => raw,
            None => defaults.user_name,
        };

        Ok(Self {
            strategy,
            user_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = DemoConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, DemoConfig::default());
        assert_eq!(config.strategy, HandlingStrategy::Synchronous);
        assert_eq!(config.user_name, "Ann");
    }

    #[test]
    fn test_reads_strategy_and_user_name() {
        let config = DemoConfig::from_lookup(lookup(&[
            (STRATEGY_VAR, "async"),
            (USER_NAME_VAR, "Bob"),
        ]))
        .unwrap();

        assert_eq!(config.strategy, HandlingStrategy::Asynchronous);
        assert_eq!(config.user_name, "Bob");
    }

    #[test]
    fn test_invalid_strategy_is_a_config_error() {
        let result = DemoConfig::from_lookup(lookup(&[(STRATEGY_VAR, "parallel")]));

        match result {
            Err(AppError::Config(msg)) => assert_eq!(
                msg,
                "EVENT_HANDLING_STRATEGY: unknown handling strategy: \"parallel\""
            ),
            other => panic!("expected Config, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_user_name_is_a_config_error() {
        let result = DemoConfig::from_lookup(lookup(&[(USER_NAME_VAR, "  ")]));

        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
