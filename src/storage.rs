use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME};
use crate::host::ImporterSettings;
use crate::models::{DbType, QueryData};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted user settings
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Engine preselected in the import dialog
    pub default_db_type: DbType,
    /// Directory the import and query dialogs start in
    pub assets_dir: Option<PathBuf>,
    /// Where saved queries are written
    pub save_location: Option<PathBuf>,
    /// Databases created so far, used to reject duplicate names
    pub databases: Vec<String>,
    pub importer: ImporterSettings,
    /// Directory for the log file; the config directory when unset
    pub log_dir: Option<PathBuf>,
}

/// Manages the settings file on disk
pub struct Storage {
    pub settings: Settings,
    config_path: PathBuf,
}

impl Storage {
    /// Load `~/.dbdesk/config.yaml`, falling back to defaults
    pub fn load_default() -> Result<Self> {
        let config_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME);
        Self::load(config_dir.join(CONFIG_FILE_NAME))
    }

    /// Load settings from `config_path`; a missing file yields defaults
    pub fn load(config_path: PathBuf) -> Result<Self> {
        let settings = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid settings in {}", config_path.display()))?
        } else {
            Settings::default()
        };

        Ok(Storage {
            settings,
            config_path,
        })
    }

    /// Write the settings back to disk
    pub fn save(&self) -> Result<()> {
        self.ensure_dir()?;
        let content = serde_yaml::to_string(&self.settings)?;
        fs::write(&self.config_path, content)
            .with_context(|| format!("Failed to write {}", self.config_path.display()))?;
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config_dir(&self) -> PathBuf {
        self.config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Starting directory of the import and query dialogs
    pub fn assets_dir(&self) -> PathBuf {
        self.settings
            .assets_dir
            .clone()
            .unwrap_or_else(|| self.config_dir().join("assets"))
    }

    /// Default target of the save-location dialog
    pub fn app_data_dir(&self) -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join(crate::constants::APP_NAME))
            .unwrap_or_else(|| self.config_dir())
    }

    pub fn log_dir(&self) -> PathBuf {
        self.settings
            .log_dir
            .clone()
            .unwrap_or_else(|| self.config_dir())
    }

    /// Record a database name; returns false when it was already known
    pub fn remember_database(&mut self, name: &str) -> bool {
        if self.settings.databases.iter().any(|db| db == name) {
            return false;
        }
        self.settings.databases.push(name.to_string());
        true
    }

    pub fn set_save_location(&mut self, path: PathBuf) {
        self.settings.save_location = Some(path);
    }

    /// Ensure config directory exists
    fn ensure_dir(&self) -> Result<()> {
        let dir = self.config_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

/// Serialize queries to the save-file format: an object keyed by query key
pub fn queries_to_json(queries: &[QueryData]) -> Result<String> {
    let by_key: BTreeMap<String, &QueryData> = queries.iter().map(|q| (q.key(), q)).collect();
    Ok(serde_json::to_string_pretty(&by_key)?)
}

/// Parse a query file, accepting the keyed object or a plain array
pub fn queries_from_json(text: &str) -> Result<Vec<QueryData>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum QueryFile {
        Keyed(BTreeMap<String, QueryData>),
        List(Vec<QueryData>),
    }

    let parsed: QueryFile = serde_json::from_str(text).context("Not a query file")?;
    Ok(match parsed {
        QueryFile::Keyed(map) => map.into_values().collect(),
        QueryFile::List(list) => list,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_config_gives_defaults() {
        let dir = tempdir().unwrap();
        let storage = Storage::load(dir.path().join("config.yaml")).unwrap();
        assert_eq!(storage.settings, Settings::default());
        assert_eq!(storage.assets_dir(), dir.path().join("assets"));
        assert_eq!(storage.log_dir(), dir.path());
    }

    #[test]
    fn test_settings_persist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut storage = Storage::load(path.clone()).unwrap();
        assert!(storage.remember_database("sales"));
        assert!(!storage.remember_database("sales"));
        storage.set_save_location(dir.path().join("queries.json"));
        storage.settings.default_db_type = DbType::MySQL;
        storage.save().unwrap();

        let reloaded = Storage::load(path.clone()).unwrap();
        assert_eq!(reloaded.config_path(), path.as_path());
        assert_eq!(reloaded.settings.databases, vec!["sales"]);
        assert_eq!(reloaded.settings.default_db_type, DbType::MySQL);
        assert_eq!(reloaded.settings.save_location, Some(dir.path().join("queries.json")));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "default_db_type: mysql\nimporter:\n  psql: /opt/pg/bin/psql\n").unwrap();

        let storage = Storage::load(path).unwrap();
        assert_eq!(storage.settings.default_db_type, DbType::MySQL);
        assert_eq!(storage.settings.importer.psql, "/opt/pg/bin/psql");
        assert_eq!(storage.settings.importer.createdb, "createdb");
    }

    #[test]
    fn test_query_file_formats() {
        let queries = vec![
            QueryData::new("top customers", "sales", "reports", "SELECT * FROM customers LIMIT 10"),
            QueryData::new("count", "sales", "adhoc", "SELECT count(*) FROM orders"),
        ];
        let json = queries_to_json(&queries).unwrap();
        let parsed = queries_from_json(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed.contains(&queries[0]));

        let list = r#"[{"label":"a","db":"d","sqlString":"select 1"}]"#;
        let parsed = queries_from_json(list).unwrap();
        assert_eq!(parsed[0].group, "");
        assert!(queries_from_json("not json").is_err());
    }
}
