//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Application name
pub const APP_NAME: &str = "dbdesk";

/// Directory under the user's home holding config and logs
pub const CONFIG_DIR_NAME: &str = ".dbdesk";

/// Settings file inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Log file written by the tracing appender
pub const LOG_FILE_NAME: &str = "dbdesk.log";

/// Default name of the saved queries file
pub const QUERIES_FILE_NAME: &str = "queries.json";

/// Message delivered to every waiter when the host goes away
pub const HOST_DISCONNECTED: &str = "host disconnected";

// Dialog presets for the import modal and the query sidebar
pub const IMPORT_DIALOG_TITLE: &str = "Import DB";
pub const IMPORT_DIALOG_BUTTON: &str = "Import";
pub const IMPORT_FILTER_NAME: &str = "Custom File Type";
pub const IMPORT_EXTENSIONS: &[&str] = &["sql", "tar"];

pub const QUERY_DIALOG_TITLE: &str = "Upload Query";
pub const QUERY_DIALOG_BUTTON: &str = "Upload";
pub const QUERY_FILTER_NAME: &str = "Text Files";
pub const QUERY_EXTENSIONS: &[&str] = &["json", "docx", "txt"];

pub const SAVE_DIALOG_TITLE: &str = "Choose File Path";
pub const SAVE_DIALOG_BUTTON: &str = "Select Path";
pub const SAVE_FILTER_NAME: &str = "JSON";
pub const SAVE_EXTENSIONS: &[&str] = &["json"];

// Validation messages of the import modal
pub const NAME_REQUIRED_MESSAGE: &str =
    "Required: Database must have a name. Please enter a unique name.";
pub const NAME_TAKEN_MESSAGE: &str =
    "This database name already exists. Please enter a unique name.";
