// Settings loading: YAML file + FUTBOT_* environment overrides

use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;

use crate::Result;

/// Main configuration structure, loaded once at startup
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Which server set to use (key into `servers`)
    pub environment: String,
    /// Which group inside the server set (key into `servers[environment]`)
    pub group: String,
    pub servers: HashMap<String, HashMap<String, ServerGroup>>,
    pub account: AccountSettings,
    /// Product name -> product id (e.g. "rebar" -> "rb")
    pub products: HashMap<String, String>,
    /// Product id -> session rows as [start_hour, start_min, end_hour, end_min]
    pub trading_sessions: HashMap<String, Vec<[u32; 4]>>,
    #[serde(default)]
    pub execution: ExecutionSettings,
    /// Contract-month code appended to the product id to form the main
    /// contract (placeholder policy, see DESIGN.md)
    #[serde(default = "default_main_contract_suffix")]
    pub main_contract_suffix: String,
}

/// One front-address pair
#[derive(Debug, Clone, Deserialize)]
pub struct ServerGroup {
    pub market_data_address: String,
    pub trading_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountSettings {
    pub broker_id: String,
    pub user_id: String,
    pub password: String,
    pub investor_id: String,
    pub app_id: String,
    pub auth_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionSettings {
    /// Seconds a pending order may live before a cancel is requested
    #[serde(default = "default_order_timeout_secs")]
    pub order_timeout_secs: u64,
    /// Stale-order timer period in seconds
    #[serde(default = "default_stale_poll_secs")]
    pub stale_poll_secs: u64,
}

fn default_order_timeout_secs() -> u64 {
    20
}

fn default_stale_poll_secs() -> u64 {
    1
}

fn default_main_contract_suffix() -> String {
    "2410".to_string()
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            order_timeout_secs: default_order_timeout_secs(),
            stale_poll_secs: default_stale_poll_secs(),
        }
    }
}

impl Settings {
    /// Load configuration from a settings file and environment variables
    /// (FUTBOT_ACCOUNT__PASSWORD etc. override file values)
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("FUTBOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// The server group selected by `environment` and `group`
    pub fn active_servers(&self) -> Option<&ServerGroup> {
        self.servers.get(&self.environment)?.get(&self.group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    const SAMPLE: &str = r#"
environment: first_set
group: telecom1
servers:
  first_set:
    telecom1:
      market_data_address: "tcp://10.0.0.1:10131"
      trading_address: "tcp://10.0.0.1:10130"
account:
  broker_id: "9999"
  user_id: "000001"
  password: "secret"
  investor_id: "000001"
  app_id: "client_test"
  auth_code: "0000000000000000"
products:
  rebar: rb
trading_sessions:
  rb:
    - [21, 0, 23, 0]
    - [9, 0, 11, 30]
"#;

    fn parse(yaml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_parse_sample_settings() {
        let settings = parse(SAMPLE);

        assert_eq!(settings.environment, "first_set");
        assert_eq!(settings.products["rebar"], "rb");
        assert_eq!(settings.trading_sessions["rb"].len(), 2);
        assert_eq!(settings.trading_sessions["rb"][0], [21, 0, 23, 0]);
        assert_eq!(settings.account.broker_id, "9999");
    }

    #[test]
    fn test_execution_defaults_apply() {
        let settings = parse(SAMPLE);

        assert_eq!(settings.execution.order_timeout_secs, 20);
        assert_eq!(settings.execution.stale_poll_secs, 1);
        assert_eq!(settings.main_contract_suffix, "2410");
    }

    #[test]
    fn test_active_servers_selection() {
        let settings = parse(SAMPLE);

        let servers = settings.active_servers().expect("group should resolve");
        assert_eq!(servers.market_data_address, "tcp://10.0.0.1:10131");

        let mut missing = settings.clone();
        missing.group = "telecom9".to_string();
        assert!(missing.active_servers().is_none());
    }
}
