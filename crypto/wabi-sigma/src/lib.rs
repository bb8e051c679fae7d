//! Generalized Schnorr-style Σ-protocols over linear relations (§4.3), made
//! non-interactive via Fiat-Shamir and composed by AND and by
//! Abe–Ohkubo–Suzuki OR (§4.4). Built on `wabi-group` (C1) and
//! `wabi-transcript` (C2), this crate is C3+C4 of the WabiSabi credential
//! core; `wabi-kvac` builds the issuance/show/range/balance statements on
//! top of it the way `frost::schnorr` builds Schnorr signatures on top of
//! the single-equation special case of the same machinery.

pub mod relation;
pub mod or_ring;
pub mod compose;

pub use relation::{LeafProof, Statement};
pub use or_ring::OrProof;
pub use compose::{AndProof, Conjunct, ConjunctProof, ConjunctStatement};

use wabi_group::GroupError;
use wabi_transcript::TranscriptError;

#[derive(Clone, Copy, Debug, thiserror::Error, PartialEq, Eq)]
pub enum SigmaError {
  #[error("statement has no equations")]
  EmptyStatement,
  #[error("statement rows have mismatched witness lengths")]
  RaggedStatement,
  #[error("a statement row has every generator set to infinity")]
  AllInfinityRow,
  #[error("witness length does not match the statement's witness length")]
  WitnessLengthMismatch,
  #[error("a Sigma-protocol response was zero; retry with fresh randomness")]
  ZeroResponse,
  #[error("an OR ring needs at least two alternatives")]
  RingTooShort,
  #[error("OR ring index out of range")]
  InvalidRingIndex,
  #[error(transparent)]
  Group(#[from] GroupError),
  #[error(transparent)]
  Transcript(#[from] TranscriptError),
}
