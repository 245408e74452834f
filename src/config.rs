// SPDX-License-Identifier: MIT

//! YAML configuration with environment variable overrides. Lookup
//! order for a key like `datasets.base-url` is the environment
//! (`CASEVIEW_DATASETS_BASE_URL`) and then the configuration file.

use crate::prelude::*;

pub struct Config {
    config: serde_yaml::Value,
}

impl Config {
    pub fn empty() -> Self {
        Self {
            config: serde_yaml::Value::Null,
        }
    }

    pub fn from_file(filename: &str) -> Result<Self> {
        let file = std::fs::File::open(filename)
            .with_context(|| format!("failed to open {}", filename))?;
        let config: serde_yaml::Value = serde_yaml::from_reader(file)?;
        Ok(Self { config })
    }

    pub fn env_key(&self, key: &str) -> String {
        let xform = key.replace(['.', '-'], "_");
        format!("CASEVIEW_{}", xform.to_uppercase())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        if let Ok(val) = std::env::var(self.env_key(key)) {
            return Some(val);
        }
        match self.find_value(key) {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Get a value as a bool, returning false if the key does not exist.
    pub fn get_bool(&self, key: &str) -> bool {
        if let Ok(val) = std::env::var(self.env_key(key)) {
            return matches!(val.to_lowercase().as_str(), "true" | "yes" | "1");
        }
        if let serde_yaml::Value::Bool(v) = self.find_value(key) {
            return *v;
        }
        false
    }

    fn find_value(&self, key: &str) -> &serde_yaml::Value {
        let val = &self.config[key];
        match val {
            serde_yaml::Value::Null => {}
            _ => return val,
        }
        let mut value = &self.config;
        for part in key.split('.') {
            value = &value[part];
        }
        value
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_config() {
        let yaml = r#"
datasets:
  base-url: https://data.example.com/v2
  no-verify-tls: true
report:
  top: 10
"#;
        let config = Config {
            config: serde_yaml::from_str(yaml).unwrap(),
        };

        assert_eq!(
            config.get_string("datasets.base-url").unwrap(),
            "https://data.example.com/v2"
        );
        assert_eq!(config.get_string("report.top").unwrap(), "10");
        assert!(config.get_bool("datasets.no-verify-tls"));
        assert!(!config.get_bool("datasets.missing"));
        assert!(config.get_string("datasets.missing").is_none());
    }

    #[test]
    fn test_env_key() {
        let config = Config::empty();
        assert_eq!(
            config.env_key("datasets.base-url"),
            "CASEVIEW_DATASETS_BASE_URL"
        );
    }

    #[test]
    fn test_env_override() {
        let config = Config::empty();
        std::env::set_var("CASEVIEW_TEST_ONLY_KEY", "from-env");
        assert_eq!(
            config.get_string("test.only-key").unwrap(),
            "from-env"
        );
        std::env::remove_var("CASEVIEW_TEST_ONLY_KEY");
    }
}
