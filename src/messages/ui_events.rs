//! UI events - messages from UI layer to App layer

use crate::models::{DbType, QueryData};

/// Events generated from user input in the UI layer
#[derive(Debug, Clone)]
pub enum UiEvent {
    // Import modal
    OpenImportDialog,
    CloseImportDialog,
    SetDbName(String),
    SelectDbType(DbType),
    ImportDatabase,

    // Duplicate modal
    OpenDuplicateDialog(String),
    CloseDuplicateDialog,
    SetCopyName(String),
    SetCopyData(bool),
    DuplicateDatabase,

    // Query sidebar
    LoadQueryFile,
    DesignateSaveLocation,
    AddQuery(QueryData),
    DeleteQuery(String),
    SetCompared(String, bool),
    SaveQueries,

    // System
    Quit,
}
