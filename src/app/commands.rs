//! Command handlers - business logic for processing UI events
//!
//! Handlers that need the host return a [`Followup`]: the request to
//! dispatch plus the [`Continuation`] to run with its outcome. `resume`
//! runs a continuation and may return the next hop of the chain.

use std::path::{Path, PathBuf};

use crate::app::state::{AppState, NameError};
use crate::bridge::{HostRequest, Outcome};
use crate::constants::*;
use crate::dump::{choose_import_name, sanitize_db_name};
use crate::messages::Status;
use crate::models::{DbType, DialogOptions, DuplicatePayload, FileFilter, ImportPayload, QueryData};
use crate::storage::{queries_from_json, queries_to_json};

/// What to do with the outcome of a dispatched request
#[derive(Clone, Debug, PartialEq)]
pub enum Continuation {
    ImportFileChosen {
        db_name: String,
        db_type: DbType,
    },
    DumpRead {
        db_name: String,
        db_type: DbType,
        file_path: PathBuf,
    },
    DatabaseImported {
        db_name: String,
    },
    DatabaseDuplicated {
        source: String,
        db_name: String,
    },
    QueryFileChosen,
    QueryFileRead {
        path: PathBuf,
    },
    SaveLocationChosen,
    QueriesSaved {
        path: PathBuf,
        count: usize,
    },
}

/// A request to dispatch and the continuation waiting for it
#[derive(Clone, Debug, PartialEq)]
pub struct Followup {
    pub request: HostRequest,
    pub then: Continuation,
}

impl Followup {
    fn new(request: HostRequest, then: Continuation) -> Option<Self> {
        Some(Followup { request, then })
    }
}

impl AppState {
    // ========================
    // Import modal
    // ========================

    pub fn open_import_dialog(&mut self) {
        self.import_dialog_open = true;
    }

    pub fn close_import_dialog(&mut self) {
        self.import_dialog_open = false;
        self.db_name.clear();
        self.name_error = Some(NameError::Empty);
    }

    /// Store the sanitized name and flag empty or duplicate names
    pub fn set_db_name(&mut self, input: &str) {
        let name = sanitize_db_name(input);
        self.name_error = self.name_problem(&name);
        self.db_name = name;
    }

    pub fn select_db_type(&mut self, db_type: DbType) {
        self.db_type = db_type;
    }

    /// Start the import chain: pick a dump, read it, import it
    pub fn import_database(&mut self) -> Option<Followup> {
        if self.is_loading {
            tracing::debug!("Import ignored while busy");
            return None;
        }
        if self.name_error == Some(NameError::Taken) {
            self.status = Status::Failed(NAME_TAKEN_MESSAGE.to_string());
            return None;
        }

        self.import_dialog_open = true;
        self.status = Status::Working("Choosing a dump file".to_string());
        let options = dialog(
            IMPORT_DIALOG_TITLE,
            self.storage.assets_dir(),
            IMPORT_DIALOG_BUTTON,
            FileFilter::new(IMPORT_FILTER_NAME, IMPORT_EXTENSIONS),
        );
        Followup::new(
            HostRequest::OpenFileDialog(options),
            Continuation::ImportFileChosen {
                db_name: self.db_name.clone(),
                db_type: self.db_type,
            },
        )
    }

    // ========================
    // Duplicate modal
    // ========================

    pub fn open_duplicate_dialog(&mut self, source: &str) {
        self.duplicate_source = Some(source.to_string());
        self.copy_name.clear();
        self.copy_data = true;
    }

    pub fn close_duplicate_dialog(&mut self) {
        self.duplicate_source = None;
        self.copy_name.clear();
    }

    pub fn set_copy_name(&mut self, input: &str) {
        self.copy_name = sanitize_db_name(input);
    }

    pub fn set_copy_data(&mut self, copy_data: bool) {
        self.copy_data = copy_data;
    }

    /// Copy the selected database under the entered name
    pub fn duplicate_database(&mut self) -> Option<Followup> {
        if self.is_loading {
            tracing::debug!("Duplicate ignored while busy");
            return None;
        }
        let Some(source) = self.duplicate_source.clone() else {
            self.status = Status::Failed("No database selected to copy".to_string());
            return None;
        };
        let name = self.copy_name.clone();
        if let Some(error) = self.name_problem(&name) {
            self.status = Status::Failed(error.message().to_string());
            return None;
        }

        self.status = Status::Working(format!("Copying {} into {}", source, name));
        Followup::new(
            HostRequest::DuplicateDatabase(DuplicatePayload {
                db_name: source.clone(),
                db_copy_name: name.clone(),
                copy: self.copy_data,
                db_type: self.db_type,
            }),
            Continuation::DatabaseDuplicated {
                source,
                db_name: name,
            },
        )
    }

    // ========================
    // Query sidebar
    // ========================

    pub fn load_query_file(&mut self) -> Option<Followup> {
        self.status = Status::Working("Choosing a query file".to_string());
        let options = dialog(
            QUERY_DIALOG_TITLE,
            self.storage.assets_dir(),
            QUERY_DIALOG_BUTTON,
            FileFilter::new(QUERY_FILTER_NAME, QUERY_EXTENSIONS),
        );
        Followup::new(HostRequest::OpenFileDialog(options), Continuation::QueryFileChosen)
    }

    pub fn designate_save_location(&mut self) -> Option<Followup> {
        self.status = Status::Working("Choosing a save location".to_string());
        let options = dialog(
            SAVE_DIALOG_TITLE,
            self.storage.app_data_dir().join(QUERIES_FILE_NAME),
            SAVE_DIALOG_BUTTON,
            FileFilter::new(SAVE_FILTER_NAME, SAVE_EXTENSIONS),
        );
        Followup::new(HostRequest::SaveFileDialog(options), Continuation::SaveLocationChosen)
    }

    /// Add a query, replacing one with the same key
    pub fn add_query(&mut self, query: QueryData) {
        let key = query.key();
        match self.queries.iter_mut().find(|q| q.key() == key) {
            Some(existing) => *existing = query,
            None => self.queries.push(query),
        }
    }

    pub fn delete_query(&mut self, key: &str) {
        self.queries.retain(|q| q.key() != key);
        self.compared.remove(key);
    }

    /// Add or remove a query from the comparison set
    pub fn set_compared(&mut self, key: &str, compared: bool) {
        if !compared {
            self.compared.remove(key);
        } else if self.queries.iter().any(|q| q.key() == key) {
            self.compared.insert(key.to_string());
        } else {
            tracing::debug!(key = %key, "Cannot compare unknown query");
        }
    }

    pub fn save_queries(&mut self) -> Option<Followup> {
        let Some(path) = self.save_location().cloned() else {
            self.status = Status::Failed("No save location designated".to_string());
            return None;
        };

        let now = chrono::Utc::now();
        let stamped: Vec<QueryData> = self
            .queries
            .iter()
            .cloned()
            .map(|mut q| {
                q.saved_at.get_or_insert(now);
                q
            })
            .collect();

        match queries_to_json(&stamped) {
            Ok(contents) => {
                self.status = Status::Working(format!("Saving queries to {}", path.display()));
                Followup::new(
                    HostRequest::write_file(&path, contents),
                    Continuation::QueriesSaved {
                        path,
                        count: stamped.len(),
                    },
                )
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not serialize queries");
                self.status = Status::Failed(format!("{:#}", e));
                None
            }
        }
    }

    // ========================
    // Outcome handling
    // ========================

    /// Run a continuation with the outcome of its request
    pub fn resume(&mut self, then: Continuation, outcome: Outcome) -> Option<Followup> {
        match (then, outcome) {
            (_, Outcome::Cancelled) => {
                self.status = Status::Cancelled;
                None
            }
            (then, Outcome::Failed(message)) => {
                tracing::warn!(?then, message = %message, "Host request failed");
                self.status = Status::Failed(message);
                None
            }

            (Continuation::ImportFileChosen { db_name, db_type }, Outcome::Path(file_path))
                if is_archive(&file_path) =>
            {
                // Archives are binary; there is no CREATE DATABASE to scan for
                let name = sanitize_db_name(&db_name);
                self.start_import(name, file_path, db_type)
            }
            (Continuation::ImportFileChosen { db_name, db_type }, Outcome::Path(file_path)) => {
                self.status = Status::Working(format!("Reading {}", file_path.display()));
                Followup::new(
                    HostRequest::read_file(&file_path),
                    Continuation::DumpRead {
                        db_name,
                        db_type,
                        file_path,
                    },
                )
            }
            (
                Continuation::DumpRead {
                    db_name,
                    db_type,
                    file_path,
                },
                Outcome::Text(contents),
            ) => {
                let name = choose_import_name(&contents, &db_name);
                self.start_import(name, file_path, db_type)
            }
            (Continuation::DatabaseImported { db_name }, Outcome::Done) => {
                if self.storage.remember_database(&db_name) {
                    self.persist();
                }
                self.close_import_dialog();
                self.status = Status::Done(format!("Imported database {}", db_name));
                None
            }
            (Continuation::DatabaseDuplicated { source, db_name }, Outcome::Done) => {
                if self.storage.remember_database(&db_name) {
                    self.persist();
                }
                self.close_duplicate_dialog();
                self.status = Status::Done(format!("Copied {} into {}", source, db_name));
                None
            }

            (Continuation::QueryFileChosen, Outcome::Path(path)) => {
                self.query_file = Some(path.clone());
                self.status = Status::Working(format!("Reading {}", path.display()));
                Followup::new(HostRequest::read_file(&path), Continuation::QueryFileRead { path })
            }
            (Continuation::QueryFileRead { path }, Outcome::Text(text)) => {
                self.load_queries(&path, &text);
                None
            }

            (Continuation::SaveLocationChosen, Outcome::Path(path)) => {
                self.storage.set_save_location(path.clone());
                self.persist();
                self.status = Status::Done(format!("Queries will be saved to {}", path.display()));
                None
            }
            (Continuation::QueriesSaved { path, count }, Outcome::Done) => {
                self.status = Status::Done(format!("Saved {} queries to {}", count, path.display()));
                None
            }

            (then, outcome) => {
                tracing::warn!(?then, outcome = outcome.label(), "Unexpected host result");
                self.status = Status::Failed(format!("unexpected {} result", outcome.label()));
                None
            }
        }
    }

    /// Why `name` cannot be used for a new database, if it cannot
    fn name_problem(&self, name: &str) -> Option<NameError> {
        if name.is_empty() {
            Some(NameError::Empty)
        } else if self.known_databases().iter().any(|db| db == name) {
            Some(NameError::Taken)
        } else {
            None
        }
    }

    /// Last hop of the import chain, once the final name is known
    fn start_import(&mut self, name: String, file_path: PathBuf, db_type: DbType) -> Option<Followup> {
        if let Some(error) = self.name_problem(&name) {
            tracing::warn!(name = %name, file = %file_path.display(), ?error, "Import name rejected");
            self.status = Status::Failed(error.message().to_string());
            return None;
        }
        self.db_name = name.clone();
        self.status = Status::Working(format!("Importing into {}", name));
        Followup::new(
            HostRequest::ImportDatabase(ImportPayload {
                new_db_name: name.clone(),
                file_path,
                db_type,
            }),
            Continuation::DatabaseImported { db_name: name },
        )
    }

    fn load_queries(&mut self, path: &Path, text: &str) {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if !is_json {
            self.status = Status::Done(format!("Selected query file {}", path.display()));
            return;
        }

        match queries_from_json(text) {
            Ok(queries) => {
                let count = queries.len();
                for query in queries {
                    self.add_query(query);
                }
                self.status = Status::Done(format!("Loaded {} queries from {}", count, path.display()));
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable query file");
                self.status = Status::Failed(format!("{:#}", e));
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = self.storage.save() {
            tracing::warn!(error = %e, "Failed to save settings");
        }
    }
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tar"))
}

fn dialog(title: &str, default_path: PathBuf, button_label: &str, filter: FileFilter) -> DialogOptions {
    DialogOptions {
        title: title.to_string(),
        default_path,
        button_label: button_label.to_string(),
        filters: vec![filter],
    }
}
