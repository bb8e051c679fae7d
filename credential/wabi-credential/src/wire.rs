//! Wire message types (§6): opaque to the cryptographic core, defined here as
//! the boundary between it and the network. Points are fixed 33-byte SEC1
//! compressed encodings, scalars fixed 32-byte big-endian, and every length
//! prefix a big-endian `u32` — all enforced by `codec`, in the same explicit
//! cursor style as `frost::MultisigKeys::serialize`/`deserialize`.

pub mod codec;

use wabi_group::{GroupElement, Scalar};
use wabi_kvac::{Mac, Presentation};
use wabi_sigma::AndProof;

use crate::request::RequestProof;

/// The null-request wire message: `k` zero-valued commitments and one combined proof of
/// knowledge of their randomness.
#[derive(Clone, Debug)]
pub struct ZeroCredentialsRequest {
  pub requested: Vec<GroupElement>,
  pub proof: AndProof,
}

/// One requested (to-be-issued) credential's public material: its amount and vsize attribute
/// commitments, and the bit commitments backing each one's range proof.
#[derive(Clone, Debug)]
pub struct RequestedCredential {
  pub amount_commitment: GroupElement,
  pub vsize_commitment: GroupElement,
  pub amount_bit_commitments: Vec<GroupElement>,
  pub vsize_bit_commitments: Vec<GroupElement>,
}

/// The real (non-null) request wire message.
#[derive(Clone, Debug)]
pub struct RealCredentialsRequest {
  /// `A_in − A_out` for this request: positive when it net-introduces value, negative when it
  /// net-removes it.
  pub delta_amount: i64,
  pub presentations: Vec<Presentation>,
  pub requested: Vec<RequestedCredential>,
  pub proof: RequestProof,
}

/// The coordinator's response to either request message: one MAC per requested credential, and
/// one issuance proof per MAC (chained sequentially over the shared transcript — see
/// `wabi_kvac::issuance`).
#[derive(Clone, Debug)]
pub struct CredentialsResponse {
  pub issued: Vec<Mac>,
  pub proof: Vec<wabi_sigma::LeafProof>,
}

/// Round/participant identifiers carried by every envelope; these alone are what §6 means by
/// "serde-derived round and participant identifiers" — the cryptographic payloads use `codec`,
/// not serde, since `GroupElement`/`Scalar` intentionally don't implement it (see `wabi-group`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoundParticipant {
  pub round_id: u64,
  pub participant_id: u16,
}

/// Registers an input's ownership and requests `k` zero-valued placeholder credentials, to be
/// traded up for real ones in the matching `ConnectionConfirmation`.
#[derive(Clone, Debug)]
pub struct InputRegistration {
  pub id: RoundParticipant,
  pub zero_request: ZeroCredentialsRequest,
}

/// Presents the zero-valued placeholders from `InputRegistration` and requests real amount/vsize
/// credentials for the registered input's value.
#[derive(Clone, Debug)]
pub struct ConnectionConfirmation {
  pub id: RoundParticipant,
  pub request: RealCredentialsRequest,
}

#[derive(Clone, Debug)]
pub struct Reissuance {
  pub id: RoundParticipant,
  pub request: RealCredentialsRequest,
}

#[derive(Clone, Debug)]
pub struct OutputRegistration {
  pub id: RoundParticipant,
  pub request: RealCredentialsRequest,
}

/// Opaque: transaction signing is out of this core's scope (§1 Non-goals). The envelope shape
/// is still named here since §6 lists it alongside the credential envelopes.
#[derive(Clone, Debug)]
pub struct TransactionSignatures {
  pub id: RoundParticipant,
  pub signatures: Vec<Vec<u8>>,
}

/// The randomness-source collaborator seam (§6): anything satisfying `RngCore + CryptoRng`
/// qualifies. Implementations must be thread-safe if shared across parallel vertex tasks and
/// must never repeat output across the process lifetime — properties this trait cannot itself
/// enforce, only document.
pub trait RandomnessSource: rand_core::RngCore + rand_core::CryptoRng {
  fn get_bytes(&mut self, n: usize) -> Vec<u8> {
    let mut out = vec![0u8; n];
    self.fill_bytes(&mut out);
    out
  }

  fn get_scalar(&mut self, allow_zero: bool) -> Scalar {
    if allow_zero {
      Scalar::random(self)
    } else {
      Scalar::random_nonzero(self)
    }
  }
}

impl<T: rand_core::RngCore + rand_core::CryptoRng> RandomnessSource for T {}
