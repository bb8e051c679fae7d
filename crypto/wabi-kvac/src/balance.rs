//! The balance proof (§4.5): the client proves knowledge of `(Σ zᵢ, ΔR)`
//! such that `B = (Σ zᵢ)·Ga + ΔR·Gh`, where `B` is a difference of publicly
//! known commitments the coordinator computes unaided: the sum of the
//! presented (blinded) amount commitments, minus the sum of the freshly
//! requested ones, minus the declared public `delta_amount · Ga`.

use rand_core::{CryptoRng, RngCore};

use wabi_group::{GroupElement, GroupElementVector, Generators, Scalar, ScalarVector};
use wabi_sigma::{relation, LeafProof, Statement};
use wabi_transcript::WabiTranscript;

use crate::{scalar_from_u64, KvacError};

/// `delta = A_in − A_out`: positive when the request net-introduces value (e.g. registering an
/// on-chain input), negative when it net-removes value (e.g. registering an on-chain output).
pub fn public_difference(
  gens: &Generators,
  presented_amount_commitments: &[GroupElement],
  requested_amount_commitments: &[GroupElement],
  delta_amount: i64,
) -> GroupElement {
  let mut acc = GroupElement::identity();
  for c in presented_amount_commitments {
    acc = acc.add(c);
  }
  for c in requested_amount_commitments {
    acc = acc.add(&c.negate());
  }
  let delta_scalar =
    if delta_amount >= 0 { scalar_from_u64(delta_amount as u64) } else { scalar_from_u64((-delta_amount) as u64).negate() };
  acc.add(&gens.g_a.mul(&delta_scalar).negate())
}

pub fn build_statement(gens: &Generators, public_difference: &GroupElement) -> Result<Statement, KvacError> {
  Statement::new(b"kvac/balance", vec![(*public_difference, GroupElementVector(vec![gens.g_a, gens.g_h]))])
    .map_err(KvacError::Sigma)
}

/// `sum_z` is the sum of the per-presentation blinding scalars (§4.5's `z`) used across the
/// presented credentials; `delta_r` is the sum of their original attribute randomness minus the
/// sum of the freshly chosen randomness for the requested commitments.
pub fn prove(
  statement: &Statement,
  sum_z: &Scalar,
  delta_r: &Scalar,
  transcript: &mut WabiTranscript,
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<LeafProof, KvacError> {
  let witness = ScalarVector(vec![*sum_z, *delta_r]);
  relation::prove(statement, &witness, transcript, rng).map_err(KvacError::Sigma)
}

pub fn verify(statement: &Statement, proof: &LeafProof, transcript: &mut WabiTranscript) -> Result<bool, KvacError> {
  relation::verify(statement, proof, transcript).map_err(KvacError::Sigma)
}
