//! dbdesk - import database dumps and manage saved queries
//!
//! Architecture:
//! - UI Layer (this CLI) - turns arguments into UI events, prints status
//! - App Layer - central state machine processing events
//! - Host Layer (Tokio) - dialogs, file I/O and import tools behind the bridge

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use dbdesk::constants::LOG_FILE_NAME;
use dbdesk::host::{CliImporter, HostServices, RfdDialogs, ScriptedDialogs};
use dbdesk::find_database_name;
use dbdesk::{AppActor, AppState, Bridge, DbType, HostActor, LocalHost, RenderState, Status, Storage, UiEvent};

#[derive(Parser)]
#[command(
    name = "dbdesk",
    version,
    about = "Import SQL dumps into Postgres or MySQL and manage saved queries"
)]
struct Cli {
    /// Path to the settings file (defaults to ~/.dbdesk/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a dump into a new database
    Import {
        /// Name of the new database; a CREATE DATABASE in the dump wins
        #[arg(long)]
        name: Option<String>,

        /// Engine to import into (postgres or mysql)
        #[arg(long)]
        db_type: Option<DbType>,

        /// Dump to import; opens a file dialog when omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Copy a known database into a new one
    Duplicate {
        /// Database to copy
        source: String,

        /// Name of the copy
        #[arg(long)]
        name: String,

        /// Engine both databases live on (postgres or mysql)
        #[arg(long)]
        db_type: Option<DbType>,

        /// Copy the schema only, without data
        #[arg(long, default_value_t = false)]
        schema_only: bool,
    },

    /// Load a query file into the query library
    LoadQueries {
        /// Query file to load; opens a file dialog when omitted
        #[arg(long)]
        file: Option<PathBuf>,

        /// Write the library to the designated save location afterwards
        #[arg(long, default_value_t = false)]
        save: bool,
    },

    /// Choose where the query library is saved
    SaveLocation {
        /// Target JSON file; opens a file dialog when omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print the database name a dump would create
    Scan { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let storage = match cli.config {
        Some(path) => Storage::load(path)?,
        None => Storage::load_default()?,
    };

    // Initialize logging to file
    let log_dir = storage.log_dir();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    tracing::info!(config = %storage.config_path().display(), "Loaded settings");

    let (events, file) = match cli.cmd {
        Commands::Scan { file } => return scan(&file),
        Commands::Import {
            name,
            db_type,
            file,
        } => {
            let mut events = vec![UiEvent::OpenImportDialog];
            if let Some(name) = name {
                events.push(UiEvent::SetDbName(name));
            }
            if let Some(db_type) = db_type {
                events.push(UiEvent::SelectDbType(db_type));
            }
            events.push(UiEvent::ImportDatabase);
            (events, file)
        }
        Commands::Duplicate {
            source,
            name,
            db_type,
            schema_only,
        } => {
            let mut events = vec![UiEvent::OpenDuplicateDialog(source), UiEvent::SetCopyName(name)];
            if let Some(db_type) = db_type {
                events.push(UiEvent::SelectDbType(db_type));
            }
            events.push(UiEvent::SetCopyData(!schema_only));
            events.push(UiEvent::DuplicateDatabase);
            (events, None)
        }
        Commands::LoadQueries { file, save } => {
            let mut events = vec![UiEvent::LoadQueryFile];
            if save {
                events.push(UiEvent::SaveQueries);
            }
            (events, file)
        }
        Commands::SaveLocation { file } => (vec![UiEvent::DesignateSaveLocation], file),
    };

    let importer = CliImporter::new(storage.settings.importer.clone());
    let services: Arc<dyn HostServices> = match file {
        Some(path) => Arc::new(LocalHost::new(ScriptedDialogs::new([Some(path)]), importer)),
        None => Arc::new(LocalHost::new(RfdDialogs, importer)),
    };

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (host_tx, host_rx) = mpsc::unbounded_channel();
    let (response_tx, response_rx) = mpsc::unbounded_channel();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn host actor and the bridge's response router
    let (bridge, busy) = Bridge::new(host_tx);
    tokio::spawn(HostActor::new(services, response_tx).run(host_rx));
    tokio::spawn(bridge.clone().route(response_rx));

    // Spawn app actor
    let app_actor = AppActor::new(AppState::new(storage), bridge, render_tx);
    tokio::spawn(app_actor.run(ui_rx, busy));

    let mut sent = 0;
    let mut result = Ok(());
    for event in events {
        ui_tx.send(event).context("App stopped")?;
        sent += 1;
        let state = settled(&mut render_rx, sent).await?;
        match &state.status {
            Status::Failed(why) => {
                result = Err(anyhow::anyhow!("{}", why));
                break;
            }
            Status::Cancelled => {
                println!("{}", state.status);
                break;
            }
            Status::Idle => {}
            status => println!("{}", status),
        }
    }

    let _ = ui_tx.send(UiEvent::Quit);
    result
}

/// Wait for the render that follows the `sent`-th event once its work is done
async fn settled(render_rx: &mut mpsc::UnboundedReceiver<RenderState>, sent: u64) -> Result<RenderState> {
    while let Some(state) = render_rx.recv().await {
        if state.events_handled >= sent && state.status.is_settled() && !state.is_loading {
            return Ok(state);
        }
    }
    bail!("App stopped before finishing")
}

fn scan(file: &Path) -> Result<()> {
    let contents = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    match find_database_name(&contents) {
        Some(name) => {
            tracing::info!(file = %file.display(), name = %name, "Scanned dump");
            println!("{}", name);
        }
        None => bail!("No CREATE DATABASE statement in {}", file.display()),
    }
    Ok(())
}
