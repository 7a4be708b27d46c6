use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use super::{Reply, SyncCall, SyncError, SyncRequest, SyncResponse};
use crate::io::store::Store;

/// Runs store calls on a background thread, one at a time, in submission
/// order. The UI thread submits requests and drains responses each tick.
pub struct SyncWorker {
    tx: Option<mpsc::Sender<SyncRequest>>,
    rx: mpsc::Receiver<SyncResponse>,
    handle: Option<JoinHandle<()>>,
}

impl SyncWorker {
    /// Spawn the worker. Every call sleeps `latency` first.
    pub fn start(store: Box<dyn Store + Send>, latency: Duration) -> std::io::Result<Self> {
        let (req_tx, req_rx) = mpsc::channel::<SyncRequest>();
        let (resp_tx, resp_rx) = mpsc::channel();
        let mut store = store;

        let handle = thread::Builder::new()
            .name("tileboard-sync".into())
            .spawn(move || {
                while let Ok(request) = req_rx.recv() {
                    if !latency.is_zero() {
                        thread::sleep(latency);
                    }
                    debug!(ticket = request.ticket, call = ?request.call, "dispatching");
                    let result = dispatch(store.as_mut(), request.call);
                    let response = SyncResponse {
                        ticket: request.ticket,
                        result,
                    };
                    if resp_tx.send(response).is_err() {
                        break;
                    }
                }
            })?;

        Ok(SyncWorker {
            tx: Some(req_tx),
            rx: resp_rx,
            handle: Some(handle),
        })
    }

    /// Queue a request. Fails with `Unreachable` if the worker has exited.
    pub fn submit(&self, request: SyncRequest) -> Result<(), SyncError> {
        let Some(tx) = &self.tx else {
            return Err(SyncError::Unreachable("sync worker stopped".into()));
        };
        tx.send(request).map_err(|err| {
            warn!(ticket = err.0.ticket, "sync worker gone");
            SyncError::Unreachable("sync worker stopped".into())
        })
    }

    /// Non-blocking drain of finished responses (may be empty).
    pub fn poll(&self) -> Vec<SyncResponse> {
        let mut out = Vec::new();
        while let Ok(response) = self.rx.try_recv() {
            out.push(response);
        }
        out
    }

    /// Block up to `timeout` for the next response.
    pub fn wait(&self, timeout: Duration) -> Option<SyncResponse> {
        self.rx.recv_timeout(timeout).ok()
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Perform one call against `store`.
pub fn dispatch(store: &mut dyn Store, call: SyncCall) -> Result<Reply, SyncError> {
    match call {
        SyncCall::GetOrder => store.get_order().map(Reply::Order),
        SyncCall::SetOrder(order) => store.set_order(&order).map(|()| Reply::Ack),
        SyncCall::SetStatus { id, group } => store.set_status(id, &group).map(|()| Reply::Ack),
        SyncCall::DeleteItem(id) => store.delete_item(id).map(|()| Reply::Ack),
        SyncCall::EditItem { id, fields } => store.edit_item(id, &fields).map(Reply::Task),
    }
}
