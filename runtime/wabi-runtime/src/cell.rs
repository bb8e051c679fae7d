//! The single-shot per-edge synchronization cell (§4.8/§5/§9): a thin wrapper over
//! `tokio::sync::oneshot` rather than a general-purpose cross-thread primitive, since an edge is
//! written exactly once (by its source vertex's task) and read exactly once (by its sink
//! vertex's task). Dropping the sender without sending — e.g. because the round was cancelled —
//! surfaces to the receiver as `RuntimeError::EdgeNotFulfilled`.

use tokio::sync::oneshot;

use wabi_kvac::Credential;

use crate::error::RuntimeError;

pub struct EdgeSender(oneshot::Sender<Credential>);

pub struct EdgeReceiver(oneshot::Receiver<Credential>);

/// Creates one sender/receiver pair for one edge of the resolved graph.
pub fn edge_cell() -> (EdgeSender, EdgeReceiver) {
  let (tx, rx) = oneshot::channel();
  (EdgeSender(tx), EdgeReceiver(rx))
}

impl EdgeSender {
  /// Delivers `credential` to this edge's waiting consumer. Failure means the consumer side was
  /// dropped first (round already cancelled); the credential is simply discarded.
  pub fn fulfill(self, credential: Credential) {
    let _ = self.0.send(credential);
  }
}

impl EdgeReceiver {
  pub async fn await_credential(self) -> Result<Credential, RuntimeError> {
    self.0.await.map_err(|_| RuntimeError::EdgeNotFulfilled)
  }
}
