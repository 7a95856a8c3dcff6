//! App actor - message loop processing UI events and host outcomes
//!
//! The loop is the app's single UI thread: continuations run here, one at a
//! time, in the order their outcomes arrive.

use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::sync::mpsc;

use crate::app::commands::{Continuation, Followup};
use crate::app::state::AppState;
use crate::bridge::{Bridge, BusyMonitor, Completion};
use crate::messages::{RenderState, UiEvent};

/// A dispatched request together with the continuation awaiting it
type InFlight = BoxFuture<'static, (Continuation, Completion)>;

/// App actor that processes UI events and host outcomes
pub struct AppActor {
    state: AppState,
    bridge: Bridge,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl AppActor {
    pub fn new(
        state: AppState,
        bridge: Bridge,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        AppActor {
            state,
            bridge,
            render_tx,
        }
    }

    /// Run the actor message loop
    pub async fn run(mut self, mut ui_rx: mpsc::UnboundedReceiver<UiEvent>, mut busy: BusyMonitor) {
        let mut in_flight: FuturesUnordered<InFlight> = FuturesUnordered::new();

        // Send initial render state
        self.publish(&busy);

        loop {
            tokio::select! {
                event = ui_rx.recv() => {
                    let Some(event) = event else {
                        tracing::info!("UI channel closed, stopping app actor");
                        break;
                    };
                    self.state.is_loading = busy.is_busy();
                    self.state.events_handled += 1;
                    if matches!(event, UiEvent::Quit) {
                        self.bridge.shutdown();
                        break;
                    }
                    if let Some(followup) = self.handle_ui_event(event) {
                        self.launch(followup, &in_flight);
                    }
                    self.publish(&busy);
                }
                Some((then, completion)) = in_flight.next() => {
                    // The request stays busy until its continuation has run
                    let (outcome, _busy_token) = completion.split();
                    if let Some(followup) = self.state.resume(then, outcome) {
                        self.launch(followup, &in_flight);
                    }
                    self.publish(&busy);
                }
                true = busy.changed() => {
                    self.publish(&busy);
                }
                else => break,
            }
        }
    }

    /// Handle a UI event, returning a request to dispatch if it needs one
    fn handle_ui_event(&mut self, event: UiEvent) -> Option<Followup> {
        match event {
            // Import modal
            UiEvent::OpenImportDialog => self.state.open_import_dialog(),
            UiEvent::CloseImportDialog => self.state.close_import_dialog(),
            UiEvent::SetDbName(name) => self.state.set_db_name(&name),
            UiEvent::SelectDbType(db_type) => self.state.select_db_type(db_type),
            UiEvent::ImportDatabase => return self.state.import_database(),

            // Duplicate modal
            UiEvent::OpenDuplicateDialog(source) => self.state.open_duplicate_dialog(&source),
            UiEvent::CloseDuplicateDialog => self.state.close_duplicate_dialog(),
            UiEvent::SetCopyName(name) => self.state.set_copy_name(&name),
            UiEvent::SetCopyData(copy_data) => self.state.set_copy_data(copy_data),
            UiEvent::DuplicateDatabase => return self.state.duplicate_database(),

            // Query sidebar
            UiEvent::LoadQueryFile => return self.state.load_query_file(),
            UiEvent::DesignateSaveLocation => return self.state.designate_save_location(),
            UiEvent::AddQuery(query) => self.state.add_query(query),
            UiEvent::DeleteQuery(key) => self.state.delete_query(&key),
            UiEvent::SetCompared(key, compared) => self.state.set_compared(&key, compared),
            UiEvent::SaveQueries => return self.state.save_queries(),

            // Handled by the loop
            UiEvent::Quit => {}
        }
        None
    }

    fn launch(&self, followup: Followup, in_flight: &FuturesUnordered<InFlight>) {
        let Followup { request, then } = followup;
        let pending = self.bridge.dispatch(request);
        in_flight.push(Box::pin(async move { (then, pending.await) }));
    }

    fn publish(&mut self, busy: &BusyMonitor) {
        self.state.is_loading = busy.is_busy();
        let _ = self.render_tx.send(self.state.to_render_state());
    }
}
