//! `CreateRequestForZeroAmount` and `CreateRequest` (§4.6): the client side of both request wire
//! messages. Each presented credential's show proof, each requested credential's amount/vsize
//! range proof, and (for the real-amount case) the one balance proof are all produced against a
//! single shared transcript in a fixed order — the same "chain several independently-composed
//! proofs over one Fiat-Shamir transcript" pattern the coordinator's response proof uses, rather
//! than flattening everything into one giant statement.

use rand_core::{CryptoRng, RngCore};
use tracing::instrument;

use wabi_group::{GroupElement, Generators, Scalar};
use wabi_kvac::{
  balance, mac::commit_attribute, range, show, CoordinatorParameters, Credential, KvacError, Presentation, ShowWitness,
};
use wabi_sigma::{compose, AndProof, Conjunct, LeafProof};
use wabi_transcript::WabiTranscript;

use crate::wire::{RealCredentialsRequest, RequestedCredential, ZeroCredentialsRequest};
use crate::CredentialError;

/// The combined proof bundled into `RealCredentialsRequest`: one show proof per presented
/// credential, one range `AndProof` per requested credential per attribute, and one balance
/// proof, all chained over the request's shared transcript.
#[derive(Clone, Debug)]
pub struct RequestProof {
  pub show_proofs: Vec<LeafProof>,
  pub amount_range_proofs: Vec<AndProof>,
  pub vsize_range_proofs: Vec<AndProof>,
  pub balance_proof: LeafProof,
}

/// A requested credential's private state the client must retain between sending the request
/// and handling the response — the plaintext value and randomness needed to materialize a
/// `Credential` once the coordinator's MAC comes back.
#[derive(Clone, Copy, Debug)]
pub struct PendingCredential {
  pub amount: u64,
  pub vsize: u64,
  pub randomness_a: Scalar,
  pub randomness_v: Scalar,
  pub amount_commitment: GroupElement,
  pub vsize_commitment: GroupElement,
}

/// What `CreateRequest`/`CreateRequestForZeroAmount` return: the wire message to send, and the
/// per-credential state to hold onto until `HandleResponse`.
#[derive(Clone, Debug)]
pub struct CreateRequestOutput<M> {
  pub message: M,
  pub pending: Vec<PendingCredential>,
}

fn transcript_for(operation: &str, count: usize, is_null: bool) -> WabiTranscript {
  WabiTranscript::new(format!("{operation}/{count}/{is_null}").as_bytes())
}

/// Builds the null-request message: `count` zero-valued commitments, each with a Schnorr proof
/// of knowledge of its own blinding randomness, chained into one `AndProof`.
#[instrument(level = "debug", skip(gens, rng))]
pub fn create_request_for_zero_amount(
  gens: &Generators,
  count: usize,
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<CreateRequestOutput<ZeroCredentialsRequest>, CredentialError> {
  let mut transcript = transcript_for("CreateRequestForZeroAmount", count, true);

  let mut requested = Vec::with_capacity(count);
  let mut pending = Vec::with_capacity(count);
  let mut conjuncts = Vec::with_capacity(count);

  for _ in 0 .. count {
    let (commitment, randomness) = commit_attribute(&Scalar::zero(), &gens.g_a, gens, rng);
    let statement = wabi_sigma::Statement::new(
      b"credential/zero_commitment",
      vec![(commitment, wabi_group::GroupElementVector(vec![gens.g_h]))],
    )
    .map_err(KvacError::Sigma)?;
    conjuncts.push(Conjunct::Leaf { statement, witness: wabi_group::ScalarVector(vec![randomness]) });
    requested.push(commitment);
    pending.push(PendingCredential {
      amount: 0,
      vsize: 0,
      randomness_a: randomness,
      randomness_v: Scalar::zero(),
      amount_commitment: commitment,
      vsize_commitment: GroupElement::identity(),
    });
  }

  let proof = compose::prove(conjuncts, &mut transcript, rng).map_err(KvacError::Sigma)?;
  Ok(CreateRequestOutput { message: ZeroCredentialsRequest { requested, proof }, pending })
}

/// Builds the real request message: presents `credentials_to_present` (consuming them), requests
/// fresh credentials for `amounts_to_request`/`vsizes_to_request` (same length, paired
/// index-by-index), and declares `delta_amount` as the net value this request introduces
/// (positive) or removes (negative).
#[instrument(level = "debug", skip(gens, params, credentials_to_present, rng), fields(presented = credentials_to_present.len()))]
pub fn create_request(
  gens: &Generators,
  params: &CoordinatorParameters,
  credentials_to_present: Vec<Credential>,
  amounts_to_request: &[u64],
  vsizes_to_request: &[u64],
  delta_amount: i64,
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<CreateRequestOutput<RealCredentialsRequest>, CredentialError> {
  assert_eq!(amounts_to_request.len(), vsizes_to_request.len(), "amount/vsize request lists must pair up");

  let mut seen_serials = std::collections::HashSet::new();
  for credential in &credentials_to_present {
    if !seen_serials.insert(credential.mac.t.to_bytes()) {
      return Err(CredentialError::CredentialToPresentDuplicated);
    }
  }

  let count = amounts_to_request.len();
  let mut transcript = transcript_for("CreateRequest", count, false);

  let mut presentations = Vec::with_capacity(credentials_to_present.len());
  let mut show_proofs = Vec::with_capacity(credentials_to_present.len());
  let mut sum_z = Scalar::zero();
  let mut presented_randomness_sum = Scalar::zero();

  for credential in &credentials_to_present {
    let (presentation, witness): (Presentation, ShowWitness) = show::present(credential, gens, params, rng);
    let statement = show::build_statement(gens, params, &presentation).map_err(CredentialError::Kvac)?;
    let proof = show::prove(&statement, &witness, &mut transcript, rng).map_err(CredentialError::Kvac)?;
    sum_z = sum_z.add(&witness.z);
    presented_randomness_sum = presented_randomness_sum.add(&credential.randomness_a);
    presentations.push(presentation);
    show_proofs.push(proof);
  }

  let mut requested = Vec::with_capacity(count);
  let mut pending = Vec::with_capacity(count);
  let mut amount_range_proofs = Vec::with_capacity(count);
  let mut vsize_range_proofs = Vec::with_capacity(count);
  let mut requested_amount_commitments = Vec::with_capacity(count);
  let mut requested_randomness_sum = Scalar::zero();

  for (&amount, &vsize) in amounts_to_request.iter().zip(vsizes_to_request.iter()) {
    let (amount_commitment, randomness_a) = commit_attribute(&wabi_kvac::scalar_from_u64(amount), &gens.g_a, gens, rng);
    let (vsize_commitment, randomness_v) = commit_attribute(&wabi_kvac::scalar_from_u64(vsize), &gens.g_s, gens, rng);

    let (amount_proof, amount_bit_commitments) =
      range::prove(gens, amount, &amount_commitment, &randomness_a, range::RANGE_BITS, &mut transcript, rng)
        .map_err(CredentialError::Kvac)?;
    let (vsize_proof, vsize_bit_commitments) =
      range::prove(gens, vsize, &vsize_commitment, &randomness_v, range::RANGE_BITS, &mut transcript, rng)
        .map_err(CredentialError::Kvac)?;

    requested_randomness_sum = requested_randomness_sum.add(&randomness_a);
    requested_amount_commitments.push(amount_commitment);
    amount_range_proofs.push(amount_proof);
    vsize_range_proofs.push(vsize_proof);
    requested.push(RequestedCredential {
      amount_commitment,
      vsize_commitment,
      amount_bit_commitments,
      vsize_bit_commitments,
    });
    pending.push(PendingCredential { amount, vsize, randomness_a, randomness_v, amount_commitment, vsize_commitment });
  }

  let presented_amount_commitments: Vec<GroupElement> = presentations.iter().map(|p| p.amount_commitment).collect();
  let public_diff =
    balance::public_difference(gens, &presented_amount_commitments, &requested_amount_commitments, delta_amount);
  let balance_statement = balance::build_statement(gens, &public_diff).map_err(CredentialError::Kvac)?;
  let delta_r = presented_randomness_sum.sub(&requested_randomness_sum);
  let balance_proof =
    balance::prove(&balance_statement, &sum_z, &delta_r, &mut transcript, rng).map_err(CredentialError::Kvac)?;

  let proof = RequestProof { show_proofs, amount_range_proofs, vsize_range_proofs, balance_proof };
  let message = RealCredentialsRequest { delta_amount, presentations, requested, proof };
  Ok(CreateRequestOutput { message, pending })
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand_core::OsRng;
  use wabi_kvac::CoordinatorSecretKey;

  #[test]
  fn zero_request_builds_the_declared_count_of_commitments() {
    let gens = Generators::new();
    let output = create_request_for_zero_amount(&gens, 3, &mut OsRng).unwrap();
    assert_eq!(output.message.requested.len(), 3);
    assert_eq!(output.pending.len(), 3);
  }

  #[test]
  fn real_request_rejects_duplicate_presented_credentials() {
    let gens = Generators::new();
    let sk = CoordinatorSecretKey::generate(&mut OsRng);
    let params = sk.parameters(&gens);
    let (ma, ra) = commit_attribute(&wabi_kvac::scalar_from_u64(10), &gens.g_a, &gens, &mut OsRng);
    let (ms, rv) = commit_attribute(&wabi_kvac::scalar_from_u64(1), &gens.g_s, &gens, &mut OsRng);
    let mac = wabi_kvac::Mac::compute(&sk, &gens, &ma, &ms, &mut OsRng);
    let credential = Credential {
      amount: 10,
      vsize: 1,
      randomness_a: ra,
      randomness_v: rv,
      amount_commitment: ma,
      vsize_commitment: ms,
      mac,
    };

    let err = create_request(
      &gens,
      &params,
      vec![credential.clone(), credential],
      &[10],
      &[2],
      0,
      &mut OsRng,
    )
    .unwrap_err();
    assert!(matches!(err, CredentialError::CredentialToPresentDuplicated));
  }
}
