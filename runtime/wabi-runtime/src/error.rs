//! `RuntimeError` (§7): layers the runtime's own failure modes — an edge whose cell was
//! dropped before it fired, a per-vertex deadline elapsing, cooperative cancellation, and an
//! opaque collaborator/network failure — over `wabi-credential`'s `CredentialError`.

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
  #[error(transparent)]
  Credential(#[from] wabi_credential::CredentialError),
  #[error("edge was dropped before its credential was delivered")]
  EdgeNotFulfilled,
  #[error("vertex request deadline elapsed")]
  DeadlineElapsed,
  #[error("round cancelled")]
  Cancelled,
  /// A failure reported by the collaborator-facing `RequestHandler` implementation — a network
  /// or protocol error from the other side, not a defect in this crate. Per §7's propagation
  /// rule this is retryable by the caller, so it is carried as an opaque, non-matchable payload
  /// rather than folded into this enum's own variants.
  #[error("collaborator request failed: {0}")]
  Collaborator(#[source] Box<dyn std::error::Error + 'static>),
}
