//! The WabiSabi algebraic MAC (§4.5) and the four statements built over it:
//! issuance, show, range, and balance. Everything here is a concrete
//! instantiation of `wabi-sigma`'s linear-relation machinery (C3/C4) — this
//! crate only ever assembles `Statement`s and feeds them to
//! `relation::prove`/`verify` or `compose::prove`/`verify`, the same
//! division of labor `frost::schnorr` keeps with the curve arithmetic it
//! sits on top of.

pub mod mac;
pub mod issuance;
pub mod show;
pub mod range;
pub mod balance;

pub use mac::{commit_attribute, CoordinatorParameters, CoordinatorSecretKey, Credential, Mac};
pub use show::{Presentation, ShowWitness};

use wabi_group::{GroupError, Scalar};
use wabi_sigma::SigmaError;
use wabi_transcript::TranscriptError;

#[derive(Clone, Debug, thiserror::Error)]
pub enum KvacError {
  #[error(transparent)]
  Group(#[from] GroupError),
  #[error(transparent)]
  Transcript(#[from] TranscriptError),
  #[error(transparent)]
  Sigma(#[from] SigmaError),
  #[error("issuance proof did not verify")]
  InvalidIssuanceProof,
  #[error("show proof did not verify")]
  InvalidShowProof,
  #[error("range proof did not verify")]
  InvalidRangeProof,
  #[error("balance proof did not verify")]
  InvalidBalanceProof,
}

/// Wide-reduces a `u64` attribute value into a scalar. Amounts and vsizes are always far smaller
/// than the field order, so this never needs the rejecting `Scalar::from_bytes` parser.
pub fn scalar_from_u64(value: u64) -> Scalar {
  Scalar::from_bytes_mod_order_wide(&value.to_be_bytes())
}
