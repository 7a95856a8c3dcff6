//! Database import and duplication through the engines' own command line clients

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::dump::sanitize_db_name;
use crate::models::{DbType, DuplicatePayload, ImportPayload};

/// Creates databases from dump files or from existing databases
pub trait DatabaseImporter: Send + Sync {
    /// Load a dump file into a new database
    fn import(&self, payload: &ImportPayload) -> Result<()>;
    /// Copy an existing database's schema, and optionally its rows
    fn duplicate(&self, payload: &DuplicatePayload) -> Result<()>;
}

/// Client programs and connection flags used by [`CliImporter`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterSettings {
    pub createdb: String,
    pub psql: String,
    pub pg_restore: String,
    pub pg_dump: String,
    pub mysql: String,
    pub mysqldump: String,
    /// Extra connection arguments for Postgres clients, e.g. `-U postgres`
    pub pg_args: Vec<String>,
    /// Extra connection arguments for the MySQL client, e.g. `-uroot`
    pub mysql_args: Vec<String>,
}

impl Default for ImporterSettings {
    fn default() -> Self {
        ImporterSettings {
            createdb: "createdb".into(),
            psql: "psql".into(),
            pg_restore: "pg_restore".into(),
            pg_dump: "pg_dump".into(),
            mysql: "mysql".into(),
            mysqldump: "mysqldump".into(),
            pg_args: Vec::new(),
            mysql_args: Vec::new(),
        }
    }
}

/// One client invocation of an import
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub program: String,
    pub args: Vec<String>,
    /// File fed to the program's stdin
    pub stdin: Option<PathBuf>,
}

impl Step {
    fn new(program: &str, base: &[String], args: &[&str]) -> Self {
        Step {
            program: program.to_string(),
            args: base
                .iter()
                .cloned()
                .chain(args.iter().map(|a| a.to_string()))
                .collect(),
            stdin: None,
        }
    }

    fn run(&self) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).stdout(Stdio::null()).stderr(Stdio::piped());
        if let Some(path) = &self.stdin {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            cmd.stdin(file);
        }

        tracing::info!(program = %self.program, args = ?self.args, "Running import step");
        let output = cmd
            .output()
            .with_context(|| format!("Failed to start {}", self.program))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{} exited with {}: {}", self.program, output.status, stderr.trim());
        }
        Ok(())
    }
}

/// Imports by running `createdb`/`psql`/`pg_restore` or `mysql`
#[derive(Clone, Debug, Default)]
pub struct CliImporter {
    settings: ImporterSettings,
}

impl CliImporter {
    pub fn new(settings: ImporterSettings) -> Self {
        CliImporter { settings }
    }

    /// Client invocations needed to import `payload`, in order
    pub fn plan(&self, payload: &ImportPayload) -> Result<Vec<Step>> {
        let name = payload.new_db_name.as_str();
        check_name(name)?;

        let file = payload.file_path.to_string_lossy().into_owned();
        let is_tar = has_extension(&payload.file_path, "tar");
        let s = &self.settings;

        let steps = match payload.db_type {
            DbType::Postgres => {
                let load = if is_tar {
                    Step::new(&s.pg_restore, &s.pg_args, &["-d", name, file.as_str()])
                } else {
                    Step::new(&s.psql, &s.pg_args, &["-v", "ON_ERROR_STOP=1", "-d", name, "-f", file.as_str()])
                };
                vec![Step::new(&s.createdb, &s.pg_args, &[name]), load]
            }
            DbType::MySQL => {
                if is_tar {
                    bail!("MySQL imports need a .sql dump, got {}", payload.file_path.display());
                }
                let create = format!("CREATE DATABASE IF NOT EXISTS `{}`", name);
                let mut load = Step::new(&s.mysql, &s.mysql_args, &[name]);
                load.stdin = Some(payload.file_path.clone());
                vec![Step::new(&s.mysql, &s.mysql_args, &["-e", create.as_str()]), load]
            }
        };
        Ok(steps)
    }

    /// Client invocations needed to duplicate a database, staging any dump
    /// in `scratch`
    pub fn plan_duplicate(&self, payload: &DuplicatePayload, scratch: &Path) -> Result<Vec<Step>> {
        let source = payload.db_name.as_str();
        let copy = payload.db_copy_name.as_str();
        check_name(source)?;
        check_name(copy)?;
        if source == copy {
            bail!("Copy of '{}' needs a different name", source);
        }

        let scratch = scratch.to_string_lossy().into_owned();
        let s = &self.settings;

        let steps = match payload.db_type {
            DbType::Postgres if payload.copy => {
                vec![Step::new(&s.createdb, &s.pg_args, &["-T", source, copy])]
            }
            DbType::Postgres => vec![
                Step::new(&s.pg_dump, &s.pg_args, &["--schema-only", "-f", scratch.as_str(), source]),
                Step::new(&s.createdb, &s.pg_args, &[copy]),
                Step::new(&s.psql, &s.pg_args, &["-v", "ON_ERROR_STOP=1", "-d", copy, "-f", scratch.as_str()]),
            ],
            DbType::MySQL => {
                let result_file = format!("--result-file={}", scratch);
                let mut dump_args = vec![result_file.as_str()];
                if !payload.copy {
                    dump_args.push("--no-data");
                }
                dump_args.push(source);

                let create = format!("CREATE DATABASE `{}`", copy);
                let mut load = Step::new(&s.mysql, &s.mysql_args, &[copy]);
                load.stdin = Some(PathBuf::from(&scratch));
                vec![
                    Step::new(&s.mysqldump, &s.mysql_args, &dump_args),
                    Step::new(&s.mysql, &s.mysql_args, &["-e", create.as_str()]),
                    load,
                ]
            }
        };
        Ok(steps)
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("Database must have a name");
    }
    if sanitize_db_name(name) != name {
        bail!("Invalid database name '{}'", name);
    }
    Ok(())
}

impl DatabaseImporter for CliImporter {
    fn import(&self, payload: &ImportPayload) -> Result<()> {
        for step in self.plan(payload)? {
            step.run()?;
        }
        tracing::info!(db = %payload.new_db_name, db_type = %payload.db_type, "Database imported");
        Ok(())
    }

    fn duplicate(&self, payload: &DuplicatePayload) -> Result<()> {
        let scratch = std::env::temp_dir().join(format!(
            "dbdesk-{}-{}.sql",
            payload.db_name, payload.db_copy_name
        ));
        let result = self
            .plan_duplicate(payload, &scratch)
            .and_then(|steps| steps.iter().try_for_each(Step::run));
        if scratch.exists() {
            if let Err(e) = fs::remove_file(&scratch) {
                tracing::warn!(path = %scratch.display(), error = %e, "Could not remove staged dump");
            }
        }
        result?;

        tracing::info!(
            db = %payload.db_name,
            copy = %payload.db_copy_name,
            with_data = payload.copy,
            "Database duplicated"
        );
        Ok(())
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}
