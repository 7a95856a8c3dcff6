//! Host layer - privileged operations (dialogs, file I/O, database import)
//!
//! The Host actor receives envelopes from the bridge and sends back outcomes.

pub mod actor;
pub mod dialogs;
pub mod importer;
pub mod services;

pub use actor::HostActor;
pub use dialogs::{Dialogs, RfdDialogs, ScriptedDialogs};
pub use importer::{CliImporter, DatabaseImporter, ImporterSettings};
pub use services::{execute, HostServices, LocalHost};
