//! Host actor - runs dispatched operations on Tokio's blocking pool

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::bridge::Outcome;
use crate::host::services::{execute, HostServices};
use crate::messages::{HostCommand, HostResponse};

/// Host actor that executes envelopes and answers with their outcome
pub struct HostActor {
    services: Arc<dyn HostServices>,
    response_tx: mpsc::UnboundedSender<HostResponse>,
    active_jobs: JoinSet<()>,
}

impl HostActor {
    pub fn new(
        services: Arc<dyn HostServices>,
        response_tx: mpsc::UnboundedSender<HostResponse>,
    ) -> Self {
        HostActor {
            services,
            response_tx,
            active_jobs: JoinSet::new(),
        }
    }

    /// Run the host actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<HostCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(HostCommand::Dispatch(envelope)) => {
                            let services = Arc::clone(&self.services);
                            let response_tx = self.response_tx.clone();
                            let id = envelope.id;
                            let request = envelope.request;

                            self.active_jobs.spawn(async move {
                                tracing::info!(%id, operation = %request.operation(), "Executing host operation");
                                let job = tokio::task::spawn_blocking(move || execute(services.as_ref(), request));
                                let outcome = match job.await {
                                    Ok(outcome) => outcome,
                                    Err(e) => {
                                        tracing::error!(%id, error = %e, "Host operation panicked");
                                        Outcome::Failed(format!("host operation failed: {}", e))
                                    }
                                };
                                let _ = response_tx.send(HostResponse::new(id, outcome));
                            });
                        }

                        Some(HostCommand::Shutdown) | None => {
                            tracing::info!(active = self.active_jobs.len(), "Host shutting down");
                            break;
                        }
                    }
                }

                // Clean up completed jobs
                Some(_result) = self.active_jobs.join_next() => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{Bridge, HostRequest};
    use crate::host::dialogs::ScriptedDialogs;
    use crate::host::services::testing::RecordingImporter;
    use crate::host::services::LocalHost;
    use crate::models::{DbType, ImportPayload};
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn start(host: LocalHost) -> (Bridge, crate::bridge::BusyMonitor) {
        let (host_tx, host_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let (bridge, busy) = Bridge::new(host_tx);
        tokio::spawn(HostActor::new(Arc::new(host), response_tx).run(host_rx));
        tokio::spawn(bridge.clone().route(response_rx));
        (bridge, busy)
    }

    #[tokio::test]
    async fn test_round_trip_through_host_actor() {
        let dir = tempdir().unwrap();
        let dump = dir.path().join("mydb.sql");
        std::fs::write(&dump, "CREATE DATABASE mydb;").unwrap();

        let importer = RecordingImporter::default();
        let (bridge, mut busy) = start(LocalHost::new(
            ScriptedDialogs::new([Some(dump.clone())]),
            importer.clone(),
        ));

        let text = bridge.dispatch(HostRequest::read_file(&dump)).await.into_outcome();
        assert_eq!(text, Outcome::Text("CREATE DATABASE mydb;".into()));

        let payload = ImportPayload {
            new_db_name: "mydb".into(),
            file_path: dump,
            db_type: DbType::MySQL,
        };
        let done = bridge
            .dispatch(HostRequest::ImportDatabase(payload.clone()))
            .await
            .into_outcome();
        assert_eq!(done, Outcome::Done);
        assert_eq!(*importer.imports.lock().unwrap(), vec![payload]);

        busy.wait_idle().await;
    }

    #[tokio::test]
    async fn test_shutdown_fails_unanswered_requests() {
        let (bridge, _busy) = start(LocalHost::new(
            ScriptedDialogs::default(),
            RecordingImporter::default(),
        ));
        let done = bridge
            .dispatch(HostRequest::read_file(PathBuf::from("/definitely/missing")))
            .await
            .into_outcome();
        assert!(done.is_failure());

        bridge.shutdown();
        let after = bridge.dispatch(HostRequest::read_file("/tmp/x")).await.into_outcome();
        assert_eq!(after, Outcome::Failed(crate::constants::HOST_DISCONNECTED.into()));
    }
}
