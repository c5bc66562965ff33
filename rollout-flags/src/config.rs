use envconfig::Envconfig;
use once_cell::sync::Lazy;
use std::ops::Deref;
use std::str::FromStr;

use crate::errors::FlagError;
use crate::flags::flag_matching::FlagIdentity;
use crate::flags::flag_models::FlagConfigTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlexBool(pub bool);

impl FromStr for FlexBool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(FlexBool(true)),
            "false" | "0" | "no" | "off" | "" => Ok(FlexBool(false)),
            _ => Err(format!("Invalid boolean value: {}", s)),
        }
    }
}

impl From<FlexBool> for bool {
    fn from(flex: FlexBool) -> Self {
        flex.0
    }
}

impl Deref for FlexBool {
    type Target = bool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Like [`FlexBool`], but an empty value means "not set".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ForcedValue(pub Option<bool>);

impl FromStr for ForcedValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(ForcedValue(None));
        }
        FlexBool::from_str(s).map(|flex| ForcedValue(Some(flex.0)))
    }
}

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(from = "FLAG_CONFIG_PATH", default = "")]
    pub flag_config_path: String,

    #[envconfig(from = "DEBUG", default = "false")]
    pub debug: FlexBool,

    #[envconfig(from = "PROJECT_ID", default = "")]
    pub project_id: String,

    #[envconfig(from = "WORKSPACE_ID", default = "")]
    pub workspace_id: String,

    #[envconfig(from = "ADMIN_ID", default = "")]
    pub admin_id: String,

    #[envconfig(from = "FLAG_OVERRIDE", default = "")]
    pub flag_override: ForcedValue,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl Config {
    pub fn default_test_config() -> Self {
        Self {
            flag_config_path: "".to_string(),
            debug: FlexBool(false),
            project_id: "".to_string(),
            workspace_id: "".to_string(),
            admin_id: "".to_string(),
            flag_override: ForcedValue(None),
        }
    }

    /// Unset environment values are unknown identities, not empty ones.
    pub fn identity(&self) -> FlagIdentity {
        FlagIdentity {
            project_id: non_empty(&self.project_id),
            workspace_id: non_empty(&self.workspace_id),
            admin_id: non_empty(&self.admin_id),
        }
    }

    pub fn forced_value(&self) -> Option<bool> {
        self.flag_override.0
    }

    pub fn load_table(&self) -> Result<FlagConfigTable, FlagError> {
        if self.flag_config_path.is_empty() {
            tracing::info!("no FLAG_CONFIG_PATH set, using built-in rollout");
            Ok(FlagConfigTable::default_rollout())
        } else {
            FlagConfigTable::from_path(&self.flag_config_path)
        }
    }
}

pub static DEFAULT_TEST_CONFIG: Lazy<Config> = Lazy::new(Config::default_test_config);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flex_bool() {
        assert!(*FlexBool::from_str("YES").unwrap());
        assert!(*FlexBool::from_str(" on ").unwrap());
        assert!(!*FlexBool::from_str("").unwrap());
        assert!(!*FlexBool::from_str("0").unwrap());
        assert!(FlexBool::from_str("maybe").is_err());
    }

    #[test]
    fn test_forced_value() {
        assert_eq!(ForcedValue::from_str("").unwrap(), ForcedValue(None));
        assert_eq!(ForcedValue::from_str("true").unwrap(), ForcedValue(Some(true)));
        assert_eq!(ForcedValue::from_str("off").unwrap(), ForcedValue(Some(false)));
        assert!(ForcedValue::from_str("sometimes").is_err());
    }

    #[test]
    fn test_default_test_config() {
        let config = &*DEFAULT_TEST_CONFIG;
        assert_eq!(config.identity(), FlagIdentity::new());
        assert_eq!(config.forced_value(), None);
        assert!(!*config.debug);

        let table = config.load_table().unwrap();
        table.validate_complete().unwrap();
        assert_eq!(table, FlagConfigTable::default_rollout());
    }

    #[test]
    fn test_identity_from_config() {
        let config = Config {
            workspace_id: "701".to_string(),
            admin_id: "admin-3".to_string(),
            ..Config::default_test_config()
        };
        assert_eq!(
            config.identity(),
            FlagIdentity::new().with_workspace("701").with_admin("admin-3")
        );
    }

    #[test]
    fn test_load_table_from_missing_path() {
        let config = Config {
            flag_config_path: "/nonexistent/flags.json".to_string(),
            ..Config::default_test_config()
        };
        assert!(matches!(
            config.load_table(),
            Err(FlagError::ConfigRead { .. })
        ));
    }
}
