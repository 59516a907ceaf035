use serde::{Deserialize, Serialize};

/// Application settings mirrored from `conf/config.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Application identity, display only
    #[serde(default)]
    pub app: AppSection,

    /// Dataset preferences editable from the settings page
    #[serde(default)]
    pub dataset: DatasetSection,

    /// Backend connection descriptor, absent in most deployments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mysql: Option<MysqlSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub startup: String,
}

impl AppSection {
    pub const FALLBACK_NAME: &'static str = "Dataset-Sync";
    pub const FALLBACK_VERSION: &'static str = "1.0.0";

    /// Window title, falling back to built-in identity when name or version is blank
    pub fn window_title(&self) -> String {
        if self.name.is_empty() || self.version.is_empty() {
            format!("{} v{}", Self::FALLBACK_NAME, Self::FALLBACK_VERSION)
        } else {
            format!("{} v{}", self.name, self.version)
        }
    }

    pub fn has_identity(&self) -> bool {
        !self.name.is_empty() && !self.version.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSection {
    /// Staging directory for files waiting to be uploaded
    pub tmp_dir: String,
    /// Directory where synced datasets are kept
    pub save_dir: String,
    pub auto_rename: bool,
    /// Prefix used for renamed files when `auto_rename` is on
    pub auto_rename_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MysqlSection {
    pub host: String,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub port: u16,
    pub max_open_conns: u32,
    pub max_idle_conns: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_document() {
        let yaml = r#"
app:
  name: Dataset-Sync
  version: 0.2.0
  description: image dataset manager
  author: tester
  startup: window
dataset:
  tmp_dir: ./tmp
  save_dir: ./datasets
  auto_rename: true
  auto_rename_key: cap
mysql:
  host: 127.0.0.1
  user: root
  password: secret
  dbname: datasets
  port: 3306
  max_open_conns: 20
  max_idle_conns: 5
"#;
        let config: Configuration = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.app.version, "0.2.0");
        assert_eq!(config.dataset.save_dir, "./datasets");
        assert!(config.dataset.auto_rename);
        let mysql = config.mysql.unwrap();
        assert_eq!(mysql.port, 3306);
        assert_eq!(mysql.max_idle_conns, 5);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Configuration = serde_yaml::from_str("dataset:\n  save_dir: /data\n").unwrap();
        assert_eq!(config.dataset.save_dir, "/data");
        assert!(!config.dataset.auto_rename);
        assert!(config.app.name.is_empty());
        assert!(config.mysql.is_none());
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        assert!(serde_yaml::from_str::<Configuration>("dataset: just text\n").is_err());
        assert!(serde_yaml::from_str::<Configuration>("dataset:\n  auto_rename: maybe\n").is_err());
    }

    #[test]
    fn test_window_title_fallback() {
        let mut app = AppSection::default();
        assert_eq!(app.window_title(), "Dataset-Sync v1.0.0");
        assert!(!app.has_identity());

        app.name = "Sync".to_string();
        app.version = "2.1".to_string();
        assert_eq!(app.window_title(), "Sync v2.1");
    }
}
