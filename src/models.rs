use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Database engine a dump is imported into
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbType {
    #[default]
    #[serde(rename = "pg")]
    Postgres,
    #[serde(rename = "mysql")]
    MySQL,
}

impl DbType {
    pub fn label(&self) -> &str {
        match self {
            DbType::Postgres => "Postgres",
            DbType::MySQL => "MySQL",
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DbType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pg" | "postgres" | "postgresql" => Ok(DbType::Postgres),
            "mysql" => Ok(DbType::MySQL),
            other => Err(format!("unknown database type '{}' (expected postgres or mysql)", other)),
        }
    }
}

/// A named group of file extensions shown by a file dialog
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn new(name: impl Into<String>, extensions: &[&str]) -> Self {
        FileFilter {
            name: name.into(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|allowed| allowed == "*" || allowed.eq_ignore_ascii_case(ext))
    }
}

/// Options for the open/save file dialogs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogOptions {
    pub title: String,
    pub default_path: PathBuf,
    pub button_label: String,
    #[serde(default)]
    pub filters: Vec<FileFilter>,
}

impl DialogOptions {
    /// True when no filter is set or any filter matches the path
    pub fn accepts(&self, path: &Path) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|f| f.matches(path))
    }

    /// Extension a save dialog appends when the user typed none
    pub fn default_extension(&self) -> Option<&str> {
        self.filters
            .first()
            .and_then(|f| f.extensions.first())
            .map(String::as_str)
            .filter(|ext| *ext != "*")
    }

    /// Human readable filter list, e.g. `Custom File Type (*.sql, *.tar)`
    pub fn describe_filters(&self) -> String {
        self.filters
            .iter()
            .map(|f| {
                let exts: Vec<String> = f.extensions.iter().map(|e| format!("*.{}", e)).collect();
                format!("{} ({})", f.name, exts.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Payload of the database import operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPayload {
    pub new_db_name: String,
    pub file_path: PathBuf,
    pub db_type: DbType,
}

/// Payload of the database duplicate operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicatePayload {
    /// Database to copy from
    pub db_name: String,
    pub db_copy_name: String,
    /// Copy rows as well as the schema
    pub copy: bool,
    pub db_type: DbType,
}

/// A saved query as listed in the sidebar
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryData {
    pub label: String,
    pub db: String,
    #[serde(default)]
    pub group: String,
    pub sql_string: String,
    #[serde(default)]
    pub db_type: DbType,
    /// Execution time of the last run, when the query has been compared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl QueryData {
    pub fn new(
        label: impl Into<String>,
        db: impl Into<String>,
        group: impl Into<String>,
        sql: impl Into<String>,
    ) -> Self {
        QueryData {
            label: label.into(),
            db: db.into(),
            group: group.into(),
            sql_string: sql.into(),
            db_type: DbType::default(),
            execution_time_ms: None,
            saved_at: None,
        }
    }

    /// Unique key of a query within a save file
    pub fn key(&self) -> String {
        format!("label:{} db:{} group:{}", self.label, self.db, self.group)
    }
}

/// Group queries by their group label, keeping first-seen group order
pub fn group_queries(queries: &[QueryData]) -> Vec<(String, Vec<&QueryData>)> {
    let mut groups: Vec<(String, Vec<&QueryData>)> = Vec::new();
    for query in queries {
        match groups.iter_mut().find(|(name, _)| *name == query.group) {
            Some((_, members)) => members.push(query),
            None => groups.push((query.group.clone(), vec![query])),
        }
    }
    groups
}
