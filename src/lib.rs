//! # dbdesk
//!
//! A database desk: import SQL dumps into Postgres or MySQL and keep a
//! library of saved queries.
//!
//! ## Features
//! - Import `.sql`/`.tar` dumps, naming the database after the dump's
//!   `CREATE DATABASE` statement when it has one
//! - Copy a known database, with or without its data
//! - Load query files, pick queries to compare, save the library as JSON
//! - Remember known databases and the query save location in a YAML config
//!
//! ## Architecture
//! Actor-based with channels:
//! - App Layer (state machine, the single "UI thread")
//! - Bridge - correlates requests with host answers and tracks busy state
//! - Host Layer (Tokio blocking pool) - dialogs, file I/O, import tools

pub mod models;
pub mod storage;
pub mod constants;
pub mod dump;
pub mod messages;
pub mod bridge;
pub mod host;
pub mod app;

// Re-export commonly used types
pub use models::{DbType, DialogOptions, DuplicatePayload, FileFilter, ImportPayload, QueryData};
pub use dump::{choose_import_name, find_database_name, sanitize_db_name};
pub use bridge::{Bridge, BusyMonitor, Envelope, HostRequest, Outcome, RequestId};
pub use messages::{UiEvent, HostCommand, HostResponse, RenderState, Status};
pub use host::{HostActor, HostServices, LocalHost};
pub use app::{AppState, AppActor};
pub use storage::Storage;
