//! App state - pure data structure with no I/O logic

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::constants::{NAME_REQUIRED_MESSAGE, NAME_TAKEN_MESSAGE};
use crate::messages::{RenderState, Status};
use crate::models::{group_queries, DbType, QueryData};
use crate::storage::Storage;

/// Why the typed database name cannot be used as is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameError {
    /// Nothing left after sanitizing; a dump may still provide a name
    Empty,
    /// A database with this name already exists; blocks the import
    Taken,
}

impl NameError {
    pub fn message(&self) -> &'static str {
        match self {
            NameError::Empty => NAME_REQUIRED_MESSAGE,
            NameError::Taken => NAME_TAKEN_MESSAGE,
        }
    }
}

/// Main application state - pure data, no I/O
pub struct AppState {
    // Progress
    pub status: Status,
    pub is_loading: bool,
    pub events_handled: u64,

    // Import modal
    pub import_dialog_open: bool,
    pub db_name: String,
    pub name_error: Option<NameError>,
    pub db_type: DbType,

    // Duplicate modal, open while a source is set
    pub duplicate_source: Option<String>,
    pub copy_name: String,
    pub copy_data: bool,

    // Query sidebar
    pub query_file: Option<PathBuf>,
    pub queries: Vec<QueryData>,
    /// Keys of the queries selected for comparison
    pub compared: BTreeSet<String>,

    // Storage (persisted data)
    pub storage: Storage,
}

impl AppState {
    pub fn new(storage: Storage) -> Self {
        AppState {
            status: Status::Idle,
            is_loading: false,
            events_handled: 0,
            import_dialog_open: false,
            db_name: String::new(),
            name_error: Some(NameError::Empty),
            db_type: storage.settings.default_db_type,
            duplicate_source: None,
            copy_name: String::new(),
            copy_data: true,
            query_file: None,
            queries: Vec::new(),
            compared: BTreeSet::new(),
            storage,
        }
    }

    pub fn known_databases(&self) -> &[String] {
        &self.storage.settings.databases
    }

    pub fn save_location(&self) -> Option<&PathBuf> {
        self.storage.settings.save_location.as_ref()
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        RenderState {
            events_handled: self.events_handled,
            is_loading: self.is_loading,
            status: self.status.clone(),
            import_dialog_open: self.import_dialog_open,
            db_name: self.db_name.clone(),
            name_error: self.name_error.map(|e| e.message().to_string()),
            db_type: self.db_type,
            known_databases: self.known_databases().to_vec(),
            duplicate_source: self.duplicate_source.clone(),
            copy_name: self.copy_name.clone(),
            copy_data: self.copy_data,
            query_file: self.query_file.clone(),
            save_location: self.save_location().cloned(),
            query_groups: group_queries(&self.queries)
                .into_iter()
                .map(|(group, members)| {
                    (group, members.iter().map(|q| q.label.clone()).collect())
                })
                .collect(),
            compared: self.compared.iter().cloned().collect(),
        }
    }
}
