//! The credential client (§4.6): `CreateRequestForZeroAmount`, `CreateRequest`,
//! `HandleResponse`, a small owned `CredentialPool`, and the wire message
//! types of §6. Everything here assembles `wabi-kvac` statements/proofs into
//! the three client-facing operations; no new cryptography is defined in
//! this crate.

pub mod pool;
pub mod request;
pub mod response;
pub mod wire;

pub use pool::CredentialPool;
pub use request::{CreateRequestOutput, PendingCredential, RequestProof};
pub use response::HandleResponseOutput;

use wabi_kvac::KvacError;

/// The client-facing error enum, layering §7's request-construction-time errors over
/// `wabi-kvac`'s proof-verification errors (`FrostError`'s role in the teacher: one
/// `thiserror` enum per crate, composed upward via `#[from]`).
#[derive(Clone, Debug, thiserror::Error)]
pub enum CredentialError {
  #[error(transparent)]
  Kvac(#[from] KvacError),
  #[error("two presented credentials share the same MAC serial")]
  CredentialToPresentDuplicated,
  #[error("issued credential count ({issued}) does not match requested count ({requested})")]
  IssuedCredentialNumberMismatch { issued: usize, requested: usize },
  #[error("credential pool index {0} is out of range")]
  CredentialIndexOutOfRange(usize),
  #[error("wire message failed to decode: {0}")]
  Malformed(&'static str),
}
