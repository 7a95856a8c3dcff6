//! Action dispatch bridge - the only way the app reaches the host
//!
//! `dispatch` wraps a [`HostRequest`] in an [`Envelope`], marks its id busy,
//! forwards it to the host and returns at once. The host's answer comes back
//! through [`Bridge::route`] and is handed to exactly one waiter: either the
//! [`PendingDispatch`] future or the callback given to `dispatch_with`.
//!
//! There is no retry, timeout or cancellation. A host that never answers
//! leaves its request outstanding, and the app busy, indefinitely.

pub mod busy;
pub mod envelope;

pub use busy::{BusyMonitor, BusyToken, BusyTracker};
pub use envelope::{
    DispatchKind, Envelope, HostRequest, LoadingTag, Outcome, ReadFilePayload, RequestId,
    WriteFilePayload,
};

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};

use crate::constants::HOST_DISCONNECTED;
use crate::messages::{HostCommand, HostResponse};

/// A request waiting for the host
struct Pending {
    operation: String,
    reply: oneshot::Sender<Completion>,
    token: BusyToken,
}

struct Inner {
    host_tx: mpsc::UnboundedSender<HostCommand>,
    next_id: AtomicU64,
    pending: Mutex<HashMap<RequestId, Pending>>,
    busy: Arc<BusyTracker>,
}

/// Cloneable handle to the dispatch bridge
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Inner>,
}

impl Bridge {
    pub fn new(host_tx: mpsc::UnboundedSender<HostCommand>) -> (Self, BusyMonitor) {
        let (busy, monitor) = BusyTracker::new();
        let bridge = Bridge {
            inner: Arc::new(Inner {
                host_tx,
                next_id: AtomicU64::new(1),
                pending: Mutex::new(HashMap::new()),
                busy,
            }),
        };
        (bridge, monitor)
    }

    /// Send a request to the host without waiting for it.
    ///
    /// The returned future resolves once the host answers. Dropping it
    /// discards the result; the request still runs on the host.
    pub fn dispatch(&self, request: HostRequest) -> PendingDispatch {
        let id = RequestId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let operation = request.operation().to_string();
        let token = self.inner.busy.begin(id);
        let (reply, rx) = oneshot::channel();

        tracing::info!(%id, operation = %operation, "Dispatching host request");
        self.lock_pending().insert(
            id,
            Pending {
                operation,
                reply,
                token,
            },
        );

        let envelope = Envelope::new(id, request);
        if self.inner.host_tx.send(HostCommand::Dispatch(envelope)).is_err() {
            tracing::warn!(%id, "Host is not running");
            self.complete(id, Outcome::Failed(HOST_DISCONNECTED.to_string()));
        }

        PendingDispatch { id, rx }
    }

    /// Send a request and run `callback` with its outcome, exactly once.
    ///
    /// The request stays outstanding until the callback returns, so a
    /// callback that dispatches the next step of a chain keeps the app busy
    /// throughout.
    pub fn dispatch_with<F>(&self, request: HostRequest, callback: F) -> RequestId
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        let pending = self.dispatch(request);
        let id = pending.id();
        tokio::spawn(async move {
            let (outcome, _busy) = pending.await.split();
            callback(outcome);
        });
        id
    }

    /// Send a request whose result nobody reads
    pub fn dispatch_detached(&self, request: HostRequest) -> RequestId {
        self.dispatch(request).id()
    }

    /// Route host responses to their waiters until the host hangs up.
    ///
    /// Requests still pending at that point fail with "host disconnected".
    pub async fn route(self, mut response_rx: mpsc::UnboundedReceiver<HostResponse>) {
        while let Some(HostResponse { id, outcome }) = response_rx.recv().await {
            self.complete(id, outcome);
        }

        let orphaned: Vec<(RequestId, Pending)> = self.lock_pending().drain().collect();
        if !orphaned.is_empty() {
            tracing::warn!(count = orphaned.len(), "Host disconnected with requests pending");
        }
        for (id, pending) in orphaned {
            pending.resolve(id, Outcome::Failed(HOST_DISCONNECTED.to_string()));
        }
    }

    /// Ask the host actor to stop
    pub fn shutdown(&self) {
        if self.inner.host_tx.send(HostCommand::Shutdown).is_err() {
            tracing::debug!("Host already stopped");
        }
    }

    /// Number of requests the host has not answered yet
    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }

    fn complete(&self, id: RequestId, outcome: Outcome) {
        let pending = self.lock_pending().remove(&id);
        match pending {
            Some(pending) => pending.resolve(id, outcome),
            None => tracing::warn!(%id, "Dropping response for unknown request"),
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<RequestId, Pending>> {
        self.inner.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Pending {
    fn resolve(self, id: RequestId, outcome: Outcome) {
        if outcome.is_failure() {
            tracing::warn!(%id, operation = %self.operation, ?outcome, "Host request failed");
        } else {
            tracing::info!(%id, operation = %self.operation, outcome = outcome.label(), "Host request completed");
        }
        let completion = Completion {
            id,
            outcome,
            token: Some(self.token),
        };
        if self.reply.send(completion).is_err() {
            tracing::debug!(%id, "No waiter, result discarded");
        }
    }
}

/// Outcome of a dispatch plus the busy token of its request
#[derive(Debug)]
pub struct Completion {
    pub id: RequestId,
    outcome: Outcome,
    token: Option<BusyToken>,
}

impl Completion {
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Take the outcome, keeping the request busy while the token lives
    pub fn split(self) -> (Outcome, Option<BusyToken>) {
        (self.outcome, self.token)
    }

    pub fn into_outcome(self) -> Outcome {
        self.outcome
    }
}

/// Future side of a dispatch
#[derive(Debug)]
pub struct PendingDispatch {
    id: RequestId,
    rx: oneshot::Receiver<Completion>,
}

impl PendingDispatch {
    pub fn id(&self) -> RequestId {
        self.id
    }
}

impl Future for PendingDispatch {
    type Output = Completion;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(completion)) => Poll::Ready(completion),
            Poll::Ready(Err(_)) => Poll::Ready(Completion {
                id: this.id,
                outcome: Outcome::Failed(HOST_DISCONNECTED.to_string()),
                token: None,
            }),
            Poll::Pending => Poll::Pending,
        }
    }
}
