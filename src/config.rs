use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::protocol::error::{FdfsError, ValidationError};

pub const TRACKER_SERVER_KEY: &str = "tracker_server";
pub const MAX_CONNS_KEY: &str = "maxConns";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// `host:port` of every tracker, in file order
    #[serde(rename = "tracker_server", default)]
    pub tracker_addr: Vec<String>,
    #[serde(rename = "maxConns", default)]
    pub max_conns: usize,
}

impl ClientConfig {
    /// Load a `key=value` client config, or TOML when the file ends in `.toml`.
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self, FdfsError> {
        let config_path = config_path.as_ref();
        let content = std::fs::read_to_string(config_path).map_err(|source| FdfsError::File {
            path: config_path.to_path_buf(),
            source,
        })?;

        let config = if config_path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content).map_err(|e| ValidationError::ConfigFormat(e.to_string()))?
        } else {
            Self::parse(&content)?
        };

        debug!(
            "Loaded {:?}: {} tracker(s), maxConns={}",
            config_path,
            config.tracker_addr.len(),
            config.max_conns
        );
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, FdfsError> {
        let mut config = Self::default();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| ValidationError::ConfigLine {
                line_no: idx + 1,
                line: line.to_string(),
            })?;
            let (key, value) = (key.trim(), value.trim());

            match key {
                TRACKER_SERVER_KEY => config.tracker_addr.push(value.to_string()),
                MAX_CONNS_KEY => {
                    config.max_conns =
                        value.parse().map_err(|_| ValidationError::ConfigValue {
                            key: key.to_string(),
                            value: value.to_string(),
                        })?;
                }
                other => debug!("Ignoring config key {:?}", other),
            }
        }

        Ok(config)
    }

    pub fn save(&self, config_path: impl AsRef<Path>) -> Result<(), FdfsError> {
        let config_path = config_path.as_ref();
        let mut content = String::new();
        for addr in &self.tracker_addr {
            content.push_str(&format!("{}={}\n", TRACKER_SERVER_KEY, addr));
        }
        content.push_str(&format!("{}={}\n", MAX_CONNS_KEY, self.max_conns));
        std::fs::write(config_path, content).map_err(|source| FdfsError::File {
            path: config_path.to_path_buf(),
            source,
        })
    }

    /// First tracker; failing over to the others is left to the caller.
    pub fn primary_tracker(&self) -> Result<&str, FdfsError> {
        self.tracker_addr
            .first()
            .map(String::as_str)
            .ok_or_else(|| ValidationError::NoTrackers.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trackers_in_order() {
        let content = "tracker_server=10.0.0.1:22122\n\
                       tracker_server=10.0.0.2:22122\n\
                       #comment\n\
                       maxConns=100\n";
        let config = ClientConfig::parse(content).unwrap();
        assert_eq!(
            config.tracker_addr,
            vec!["10.0.0.1:22122".to_string(), "10.0.0.2:22122".to_string()]
        );
        assert_eq!(config.max_conns, 100);
    }

    #[test]
    fn bad_max_conns_fails_the_load() {
        let err = ClientConfig::parse("tracker_server=a:1\nmaxConns=abc\n").unwrap_err();
        assert!(matches!(
            err,
            FdfsError::Validation(ValidationError::ConfigValue { ref key, ref value })
                if key == "maxConns" && value == "abc"
        ));
    }

    #[test]
    fn negative_max_conns_is_rejected() {
        let err = ClientConfig::parse("tracker_server=a:1\nmaxConns=-1\n").unwrap_err();
        assert!(matches!(
            err,
            FdfsError::Validation(ValidationError::ConfigValue { ref key, ref value })
                if key == "maxConns" && value == "-1"
        ));
    }

    #[test]
    fn duplicates_kept_and_last_max_conns_wins() {
        let content = "tracker_server=a:1\r\ntracker_server=a:1\r\nmaxConns=5\r\nmaxConns=7\r\n";
        let config = ClientConfig::parse(content).unwrap();
        assert_eq!(config.tracker_addr, vec!["a:1", "a:1"]);
        assert_eq!(config.max_conns, 7);
    }

    #[test]
    fn empty_input_yields_empty_config() {
        let config = ClientConfig::parse("# nothing here\n\n").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert!(matches!(
            config.primary_tracker(),
            Err(FdfsError::Validation(ValidationError::NoTrackers))
        ));
    }

    #[test]
    fn unknown_keys_are_ignored_and_lines_without_equals_fail() {
        let config = ClientConfig::parse("network_timeout=30\ntracker_server=a:1").unwrap();
        assert_eq!(config.primary_tracker().unwrap(), "a:1");

        let err = ClientConfig::parse("tracker_server=a:1\ngarbage\n").unwrap_err();
        assert!(matches!(
            err,
            FdfsError::Validation(ValidationError::ConfigLine { line_no: 2, .. })
        ));
    }

    #[test]
    fn value_may_contain_equals() {
        let config = ClientConfig::parse("tracker_server=host=x:1").unwrap();
        assert_eq!(config.tracker_addr, vec!["host=x:1"]);
    }

    #[test]
    fn load_key_value_and_toml() {
        let dir = tempfile::tempdir().unwrap();

        let conf = dir.path().join("client.conf");
        let config = ClientConfig {
            tracker_addr: vec!["10.0.0.1:22122".into()],
            max_conns: 12,
        };
        config.save(&conf).unwrap();
        assert_eq!(ClientConfig::load(&conf).unwrap(), config);

        let toml_path = dir.path().join("client.toml");
        std::fs::write(
            &toml_path,
            "tracker_server = [\"10.0.0.1:22122\"]\nmaxConns = 12\n",
        )
        .unwrap();
        assert_eq!(ClientConfig::load(&toml_path).unwrap(), config);
    }

    #[test]
    fn missing_file_is_a_file_error() {
        let err = ClientConfig::load("/nonexistent/client.conf").unwrap_err();
        assert!(matches!(err, FdfsError::File { .. }));
    }
}
