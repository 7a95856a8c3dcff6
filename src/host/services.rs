//! Host services - the privileged operations behind the catalog

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::bridge::{HostRequest, Outcome};
use crate::host::dialogs::Dialogs;
use crate::host::importer::DatabaseImporter;
use crate::models::{DialogOptions, DuplicatePayload, ImportPayload};

/// Operations only the host may perform. Called on a blocking worker.
pub trait HostServices: Send + Sync {
    fn open_file_dialog(&self, options: &DialogOptions) -> Result<Option<PathBuf>>;
    fn save_file_dialog(&self, options: &DialogOptions) -> Result<Option<PathBuf>>;
    fn read_file(&self, path: &Path) -> Result<String>;
    fn write_file(&self, path: &Path, contents: &str) -> Result<()>;
    fn import_database(&self, payload: &ImportPayload) -> Result<()>;
    fn duplicate_database(&self, payload: &DuplicatePayload) -> Result<()>;
}

/// Host backed by the local filesystem, a dialog provider and an importer
pub struct LocalHost {
    dialogs: Box<dyn Dialogs>,
    importer: Box<dyn DatabaseImporter>,
}

impl LocalHost {
    pub fn new(dialogs: impl Dialogs + 'static, importer: impl DatabaseImporter + 'static) -> Self {
        LocalHost {
            dialogs: Box::new(dialogs),
            importer: Box::new(importer),
        }
    }
}

impl HostServices for LocalHost {
    fn open_file_dialog(&self, options: &DialogOptions) -> Result<Option<PathBuf>> {
        self.dialogs.open(options)
    }

    fn save_file_dialog(&self, options: &DialogOptions) -> Result<Option<PathBuf>> {
        self.dialogs.save(options)
    }

    /// Decodes lossily; binary content is never an error
    fn read_file(&self, path: &Path) -> Result<String> {
        let bytes =
            fs::read(path).with_context(|| format!("Error reading file {}", path.display()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, contents).with_context(|| format!("Error writing file {}", path.display()))
    }

    fn import_database(&self, payload: &ImportPayload) -> Result<()> {
        self.importer.import(payload).with_context(|| {
            format!(
                "Failed to import {} into {} database '{}'",
                payload.file_path.display(),
                payload.db_type,
                payload.new_db_name
            )
        })
    }

    fn duplicate_database(&self, payload: &DuplicatePayload) -> Result<()> {
        self.importer.duplicate(payload).with_context(|| {
            format!(
                "Failed to copy {} database '{}' into '{}'",
                payload.db_type, payload.db_name, payload.db_copy_name
            )
        })
    }
}

/// Run one catalog operation and turn its result into an [`Outcome`]
pub fn execute(services: &dyn HostServices, request: HostRequest) -> Outcome {
    let result = match request {
        HostRequest::OpenFileDialog(options) => services.open_file_dialog(&options).map(selection),
        HostRequest::SaveFileDialog(options) => services.save_file_dialog(&options).map(selection),
        HostRequest::ReadFile(payload) => services.read_file(&payload.path).map(Outcome::Text),
        HostRequest::WriteFile(payload) => services
            .write_file(&payload.path, &payload.contents)
            .map(|()| Outcome::Done),
        HostRequest::ImportDatabase(payload) => {
            services.import_database(&payload).map(|()| Outcome::Done)
        }
        HostRequest::DuplicateDatabase(payload) => {
            services.duplicate_database(&payload).map(|()| Outcome::Done)
        }
        HostRequest::Custom { event, .. } => {
            tracing::warn!(event = %event, "Unrecognized host operation");
            return Outcome::Failed(format!("unrecognized operation: {}", event));
        }
    };

    result.unwrap_or_else(|e| Outcome::Failed(format!("{:#}", e)))
}

fn selection(path: Option<PathBuf>) -> Outcome {
    match path {
        Some(path) => Outcome::Path(path),
        None => Outcome::Cancelled,
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingImporter;
    use super::*;
    use crate::host::dialogs::ScriptedDialogs;
    use crate::models::{DbType, FileFilter};
    use serde_json::json;
    use tempfile::tempdir;

    fn dialog(extensions: &[&str]) -> DialogOptions {
        DialogOptions {
            title: "Upload Query".into(),
            default_path: PathBuf::from("/tmp"),
            button_label: "Upload".into(),
            filters: vec![FileFilter::new("Text Files", extensions)],
        }
    }

    #[test]
    fn test_dialog_selection_and_cancel() {
        let host = LocalHost::new(
            ScriptedDialogs::new([Some(PathBuf::from("/tmp/q.json")), None]),
            RecordingImporter::default(),
        );
        assert_eq!(
            execute(&host, HostRequest::OpenFileDialog(dialog(&["json"]))),
            Outcome::Path(PathBuf::from("/tmp/q.json"))
        );
        assert_eq!(
            execute(&host, HostRequest::SaveFileDialog(dialog(&["json"]))),
            Outcome::Cancelled
        );
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("queries.json");
        let host = LocalHost::new(ScriptedDialogs::default(), RecordingImporter::default());

        assert_eq!(execute(&host, HostRequest::write_file(&path, "{}")), Outcome::Done);
        assert_eq!(
            execute(&host, HostRequest::read_file(&path)),
            Outcome::Text("{}".to_string())
        );
    }

    #[test]
    fn test_read_missing_file_fails() {
        let host = LocalHost::new(ScriptedDialogs::default(), RecordingImporter::default());
        let outcome = execute(&host, HostRequest::read_file("/definitely/not/here.sql"));
        match outcome {
            Outcome::Failed(message) => assert!(message.contains("Error reading file")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_import_reaches_importer() {
        let importer = RecordingImporter::default();
        let host = LocalHost::new(ScriptedDialogs::default(), importer.clone());
        let payload = ImportPayload {
            new_db_name: "mydb".into(),
            file_path: PathBuf::from("/tmp/mydb.sql"),
            db_type: DbType::Postgres,
        };

        assert_eq!(execute(&host, HostRequest::ImportDatabase(payload.clone())), Outcome::Done);
        assert_eq!(*importer.imports.lock().unwrap(), vec![payload]);
    }

    #[test]
    fn test_unrecognized_operation_fails() {
        let host = LocalHost::new(ScriptedDialogs::default(), RecordingImporter::default());
        let outcome = execute(
            &host,
            HostRequest::Custom {
                event: "run-query".into(),
                payload: json!({}),
            },
        );
        assert_eq!(outcome, Outcome::Failed("unrecognized operation: run-query".into()));
    }

    #[test]
    fn test_binary_file_reads_lossily() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backup.tar");
        std::fs::write(&path, [0x1f, 0x8b, 0xff, 0xfe, b'o', b'k']).unwrap();
        let host = LocalHost::new(ScriptedDialogs::default(), RecordingImporter::default());

        match execute(&host, HostRequest::read_file(&path)) {
            Outcome::Text(text) => assert!(text.ends_with("ok")),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_reaches_importer() {
        let importer = RecordingImporter::default();
        let host = LocalHost::new(ScriptedDialogs::default(), importer.clone());
        let payload = DuplicatePayload {
            db_name: "shop".into(),
            db_copy_name: "shop_copy".into(),
            copy: true,
            db_type: DbType::MySQL,
        };

        assert_eq!(execute(&host, HostRequest::DuplicateDatabase(payload.clone())), Outcome::Done);
        assert_eq!(*importer.duplicates.lock().unwrap(), vec![payload]);
    }
}
