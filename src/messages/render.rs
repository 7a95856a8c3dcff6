//! Render state - data structure sent from App layer to UI for rendering

use std::fmt;
use std::path::PathBuf;

use crate::models::DbType;

/// Progress of the latest user action
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Idle,
    Working(String),
    Done(String),
    Cancelled,
    Failed(String),
}

impl Status {
    /// True once the action has finished, one way or another
    pub fn is_settled(&self) -> bool {
        !matches!(self, Status::Working(_))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => f.write_str("idle"),
            Status::Working(what) => write!(f, "{}...", what),
            Status::Done(what) => f.write_str(what),
            Status::Cancelled => f.write_str("cancelled"),
            Status::Failed(why) => write!(f, "failed: {}", why),
        }
    }
}

/// Complete state needed by the UI to render
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    /// Number of UI events the app has handled so far
    pub events_handled: u64,
    pub is_loading: bool,
    pub status: Status,

    // Import modal
    pub import_dialog_open: bool,
    pub db_name: String,
    pub name_error: Option<String>,
    pub db_type: DbType,
    pub known_databases: Vec<String>,

    // Duplicate modal
    pub duplicate_source: Option<String>,
    pub copy_name: String,
    pub copy_data: bool,

    // Query sidebar
    pub query_file: Option<PathBuf>,
    pub save_location: Option<PathBuf>,
    /// Group label and query labels, in sidebar order
    pub query_groups: Vec<(String, Vec<String>)>,
    /// Keys of the queries selected for comparison
    pub compared: Vec<String>,
}
