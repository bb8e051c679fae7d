//! The show proof (§4.5): the client rerandomizes its MAC with a fresh `z`
//! (and an auxiliary `z0`), produces the blinded presentation `(Z, Ca, Cv,
//! Cx0, Cx1)`, and proves knowledge of `(z, z0, t)` satisfying `Z = z·I` and
//! `Cx1 = t·Cx0 + z·Gx1 + z0·Gx0` — both checkable by the coordinator from
//! its public parameters alone, with no secret-key access needed at show
//! time. `Ca`/`Cv` are not part of this statement; they flow into the
//! balance proof instead.

use rand_core::{CryptoRng, RngCore};

use wabi_group::{GroupElement, GroupElementVector, Generators, Scalar, ScalarVector};
use wabi_sigma::{relation, LeafProof, Statement};
use wabi_transcript::WabiTranscript;

use crate::mac::{CoordinatorParameters, Credential};
use crate::KvacError;

/// The blinded values the client reveals to the coordinator for one presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Presentation {
  pub z: GroupElement,
  pub amount_commitment: GroupElement,
  pub vsize_commitment: GroupElement,
  pub cx0: GroupElement,
  pub cx1: GroupElement,
}

/// The witness behind a `Presentation`, kept by the client only long enough to build the show
/// proof and the balance proof that references `z`.
#[derive(Clone, Copy, Debug)]
pub struct ShowWitness {
  pub z: Scalar,
  pub z0: Scalar,
  pub t: Scalar,
}

/// Rerandomizes `credential` for a single presentation.
pub fn present(
  credential: &Credential,
  gens: &Generators,
  params: &CoordinatorParameters,
  rng: &mut (impl RngCore + CryptoRng),
) -> (Presentation, ShowWitness) {
  let z = Scalar::random_nonzero(rng);
  let z0 = Scalar::random_nonzero(rng);
  let t = credential.mac.t;

  let z_point = params.i.mul(&z);
  let amount_commitment = credential.amount_commitment.add(&gens.g_a.mul(&z));
  let vsize_commitment = credential.vsize_commitment.add(&gens.g_s.mul(&z));
  let cx0 = gens.g_x0.mul(&t).add(&gens.u.mul(&z));
  let cx1 = cx0.mul(&t).add(&gens.g_x1.mul(&z)).add(&gens.g_x0.mul(&z0));

  (Presentation { z: z_point, amount_commitment, vsize_commitment, cx0, cx1 }, ShowWitness { z, z0, t })
}

pub fn build_statement(
  gens: &Generators,
  params: &CoordinatorParameters,
  presentation: &Presentation,
) -> Result<Statement, KvacError> {
  let infinity = GroupElement::identity();
  let eq_z = (presentation.z, GroupElementVector(vec![params.i, infinity, infinity]));
  let eq_cx1 = (presentation.cx1, GroupElementVector(vec![gens.g_x1, gens.g_x0, presentation.cx0]));
  Statement::new(b"kvac/show", vec![eq_z, eq_cx1]).map_err(KvacError::Sigma)
}

pub fn prove(
  statement: &Statement,
  witness: &ShowWitness,
  transcript: &mut WabiTranscript,
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<LeafProof, KvacError> {
  let w = ScalarVector(vec![witness.z, witness.z0, witness.t]);
  relation::prove(statement, &w, transcript, rng).map_err(KvacError::Sigma)
}

pub fn verify(statement: &Statement, proof: &LeafProof, transcript: &mut WabiTranscript) -> Result<bool, KvacError> {
  relation::verify(statement, proof, transcript).map_err(KvacError::Sigma)
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand_core::OsRng;
  use wabi_group::Generators;

  use crate::mac::{commit_attribute, CoordinatorSecretKey, Mac};

  fn sample_credential(gens: &Generators, sk: &CoordinatorSecretKey) -> Credential {
    let amount = 42_000u64;
    let vsize = 140u64;
    let (amount_commitment, randomness_a) = commit_attribute(&crate::scalar_from_u64(amount), &gens.g_a, gens, &mut OsRng);
    let (vsize_commitment, randomness_v) = commit_attribute(&crate::scalar_from_u64(vsize), &gens.g_s, gens, &mut OsRng);
    let mac = Mac::compute(sk, gens, &amount_commitment, &vsize_commitment, &mut OsRng);
    Credential { amount, vsize, randomness_a, randomness_v, amount_commitment, vsize_commitment, mac }
  }

  #[test]
  fn show_round_trips() {
    let gens = Generators::new();
    let sk = CoordinatorSecretKey::generate(&mut OsRng);
    let params = sk.parameters(&gens);
    let credential = sample_credential(&gens, &sk);

    let (presentation, witness) = present(&credential, &gens, &params, &mut OsRng);
    let statement = build_statement(&gens, &params, &presentation).unwrap();

    let mut prover_t = WabiTranscript::new(b"show-test");
    let proof = prove(&statement, &witness, &mut prover_t, &mut OsRng).unwrap();

    let mut verifier_t = WabiTranscript::new(b"show-test");
    assert!(verify(&statement, &proof, &mut verifier_t).unwrap());
  }

  #[test]
  fn tampered_presentation_fails() {
    let gens = Generators::new();
    let sk = CoordinatorSecretKey::generate(&mut OsRng);
    let params = sk.parameters(&gens);
    let credential = sample_credential(&gens, &sk);

    let (mut presentation, witness) = present(&credential, &gens, &params, &mut OsRng);
    let statement = build_statement(&gens, &params, &presentation).unwrap();
    let mut prover_t = WabiTranscript::new(b"show-test-2");
    let proof = prove(&statement, &witness, &mut prover_t, &mut OsRng).unwrap();

    presentation.z = GroupElement::generator();
    let tampered_statement = build_statement(&gens, &params, &presentation).unwrap();
    let mut verifier_t = WabiTranscript::new(b"show-test-2");
    assert!(!verify(&tampered_statement, &proof, &mut verifier_t).unwrap());
  }
}
