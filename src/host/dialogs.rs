//! File dialogs available to the host
//!
//! `RfdDialogs` shows the platform's native open/save dialogs;
//! `ScriptedDialogs` answers from a queue of preset selections.

use anyhow::{bail, Result};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::models::DialogOptions;

/// Native-style open/save dialogs. `Ok(None)` means the user cancelled.
pub trait Dialogs: Send + Sync {
    fn open(&self, options: &DialogOptions) -> Result<Option<PathBuf>>;
    fn save(&self, options: &DialogOptions) -> Result<Option<PathBuf>>;
}

/// Add the first filter's extension when a save target has none
fn with_default_extension(options: &DialogOptions, path: PathBuf) -> PathBuf {
    match (path.extension(), options.default_extension()) {
        (None, Some(ext)) => path.with_extension(ext),
        _ => path,
    }
}

fn check_accepted(options: &DialogOptions, answer: Option<PathBuf>) -> Result<Option<PathBuf>> {
    match answer {
        Some(path) if !options.accepts(&path) => bail!(
            "{} is not an accepted file type for '{}': {}",
            path.display(),
            options.title,
            options.describe_filters()
        ),
        other => Ok(other),
    }
}

/// Directory a dialog opens in, and the file name a save dialog suggests
fn start_location(default_path: &Path, saving: bool) -> (Option<&Path>, Option<String>) {
    if default_path.is_dir() || default_path.extension().is_none() {
        return (Some(default_path), None);
    }
    let dir = default_path.parent().filter(|p| !p.as_os_str().is_empty());
    let file_name = default_path
        .file_name()
        .filter(|_| saving)
        .map(|name| name.to_string_lossy().into_owned());
    (dir, file_name)
}

/// Platform dialogs via `rfd`. Native dialogs have no custom button label.
#[derive(Clone, Copy, Debug, Default)]
pub struct RfdDialogs;

impl RfdDialogs {
    fn dialog(options: &DialogOptions, saving: bool) -> rfd::FileDialog {
        let mut dialog = rfd::FileDialog::new().set_title(options.title.as_str());

        let (dir, file_name) = start_location(&options.default_path, saving);
        if let Some(dir) = dir.filter(|d| d.is_dir()) {
            dialog = dialog.set_directory(dir);
        }
        if let Some(file_name) = file_name {
            dialog = dialog.set_file_name(file_name);
        }
        for filter in &options.filters {
            dialog = dialog.add_filter(filter.name.as_str(), filter.extensions.as_slice());
        }
        dialog
    }
}

impl Dialogs for RfdDialogs {
    fn open(&self, options: &DialogOptions) -> Result<Option<PathBuf>> {
        tracing::debug!(title = %options.title, "Showing open dialog");
        check_accepted(options, Self::dialog(options, false).pick_file())
    }

    fn save(&self, options: &DialogOptions) -> Result<Option<PathBuf>> {
        tracing::debug!(title = %options.title, "Showing save dialog");
        let picked = Self::dialog(options, true).save_file();
        Ok(picked.map(|path| with_default_extension(options, path)))
    }
}

/// Dialogs that answer from a queue; an empty queue cancels
#[derive(Default)]
pub struct ScriptedDialogs {
    answers: Mutex<VecDeque<Option<PathBuf>>>,
}

impl ScriptedDialogs {
    pub fn new(answers: impl IntoIterator<Item = Option<PathBuf>>) -> Self {
        ScriptedDialogs {
            answers: Mutex::new(answers.into_iter().collect()),
        }
    }

    fn next(&self) -> Option<PathBuf> {
        self.answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .flatten()
    }
}

impl Dialogs for ScriptedDialogs {
    fn open(&self, options: &DialogOptions) -> Result<Option<PathBuf>> {
        check_accepted(options, self.next())
    }

    fn save(&self, options: &DialogOptions) -> Result<Option<PathBuf>> {
        let answer = self.next().map(|path| with_default_extension(options, path));
        check_accepted(options, answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileFilter;
    use tempfile::tempdir;

    fn options(dir: &Path, extensions: &[&str]) -> DialogOptions {
        DialogOptions {
            title: "Import DB".into(),
            default_path: dir.to_path_buf(),
            button_label: "Import".into(),
            filters: vec![FileFilter::new("Custom File Type", extensions)],
        }
    }

    #[test]
    fn test_start_location_for_directories_and_files() {
        let dir = tempdir().unwrap();
        assert_eq!(start_location(dir.path(), false), (Some(dir.path()), None));

        let target = dir.path().join("queries.json");
        assert_eq!(
            start_location(&target, true),
            (Some(dir.path()), Some("queries.json".to_string()))
        );
        assert_eq!(start_location(&target, false), (Some(dir.path()), None));
    }

    #[test]
    fn test_scripted_answers_in_order() {
        let dir = tempdir().unwrap();
        let dialogs = ScriptedDialogs::new([Some(PathBuf::from("/tmp/a.sql")), None]);
        let opts = options(dir.path(), &["sql"]);

        assert_eq!(dialogs.open(&opts).unwrap(), Some(PathBuf::from("/tmp/a.sql")));
        assert_eq!(dialogs.open(&opts).unwrap(), None);
        assert_eq!(dialogs.open(&opts).unwrap(), None);
    }

    #[test]
    fn test_scripted_rejects_filtered_out_file() {
        let dir = tempdir().unwrap();
        let dialogs = ScriptedDialogs::new([Some(PathBuf::from("/tmp/a.txt"))]);
        let err = dialogs.open(&options(dir.path(), &["sql", "tar"])).unwrap_err();
        assert!(err.to_string().contains("Custom File Type (*.sql, *.tar)"));
    }

    #[test]
    fn test_save_appends_default_extension() {
        let dir = tempdir().unwrap();
        let dialogs = ScriptedDialogs::new([Some(dir.path().join("queries"))]);
        let picked = dialogs.save(&options(dir.path(), &["json"])).unwrap();
        assert_eq!(picked, Some(dir.path().join("queries.json")));
    }
}
