//! The issuance proof (§4.5): a 3-equation linear relation, over the shared
//! witness `(w, w', x0, x1, ya, ys, yv)`, that fixes `Cw`, `Gv − I`, and `V`
//! to the generator combinations below. The issuer proves it holds the
//! secret key consistent with the `CoordinatorParameters` the client already
//! trusts and the `V` it just handed back; the client is the verifier.

use rand_core::{CryptoRng, RngCore};

use wabi_group::{GroupElement, GroupElementVector, Generators};
use wabi_sigma::{relation, LeafProof, Statement};
use wabi_transcript::WabiTranscript;

use crate::mac::{CoordinatorParameters, CoordinatorSecretKey, Mac};
use crate::KvacError;

pub fn build_statement(
  gens: &Generators,
  params: &CoordinatorParameters,
  amount_commitment: &GroupElement,
  vsize_commitment: &GroupElement,
  mac: &Mac,
) -> Result<Statement, KvacError> {
  let infinity = GroupElement::identity();
  let t_u = gens.u.mul(&mac.t);

  let eq_cw =
    (params.cw, GroupElementVector(vec![gens.g_w, gens.g_wp, infinity, infinity, infinity, infinity, infinity]));
  let eq_i = (
    gens.g_v.add(&params.i.negate()),
    GroupElementVector(vec![infinity, infinity, gens.g_x0, gens.g_x1, gens.g_a, gens.g_s, gens.g_v]),
  );
  let eq_v = (
    mac.v,
    GroupElementVector(vec![gens.g_w, infinity, gens.u, t_u, *amount_commitment, *vsize_commitment, gens.g_v]),
  );

  Statement::new(b"kvac/issuance", vec![eq_cw, eq_i, eq_v]).map_err(KvacError::Sigma)
}

/// Issuer side: proves knowledge of `sk` satisfying `statement`.
pub fn prove(
  sk: &CoordinatorSecretKey,
  statement: &Statement,
  transcript: &mut WabiTranscript,
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<LeafProof, KvacError> {
  relation::prove(statement, &sk.witness(), transcript, rng).map_err(KvacError::Sigma)
}

/// Client side: verifies the issuer's proof against the statement the client itself built from
/// its own commitments and the `V` the issuer returned.
pub fn verify(statement: &Statement, proof: &LeafProof, transcript: &mut WabiTranscript) -> Result<bool, KvacError> {
  relation::verify(statement, proof, transcript).map_err(KvacError::Sigma)
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand_core::OsRng;
  use wabi_group::Generators;

  #[test]
  fn issuance_round_trips() {
    let gens = Generators::new();
    let sk = CoordinatorSecretKey::generate(&mut OsRng);
    let params = sk.parameters(&gens);

    let (ma, _) = crate::mac::commit_attribute(&crate::scalar_from_u64(50_000), &gens.g_a, &gens, &mut OsRng);
    let (ms, _) = crate::mac::commit_attribute(&crate::scalar_from_u64(150), &gens.g_s, &gens, &mut OsRng);
    let mac = Mac::compute(&sk, &gens, &ma, &ms, &mut OsRng);

    let statement = build_statement(&gens, &params, &ma, &ms, &mac).unwrap();

    let mut prover_t = WabiTranscript::new(b"issuance-test");
    let proof = prove(&sk, &statement, &mut prover_t, &mut OsRng).unwrap();

    let mut verifier_t = WabiTranscript::new(b"issuance-test");
    assert!(verify(&statement, &proof, &mut verifier_t).unwrap());
  }

  #[test]
  fn issuance_rejects_wrong_secret_key() {
    let gens = Generators::new();
    let sk = CoordinatorSecretKey::generate(&mut OsRng);
    let other_sk = CoordinatorSecretKey::generate(&mut OsRng);
    let params = sk.parameters(&gens);

    let (ma, _) = crate::mac::commit_attribute(&crate::scalar_from_u64(1), &gens.g_a, &gens, &mut OsRng);
    let (ms, _) = crate::mac::commit_attribute(&crate::scalar_from_u64(1), &gens.g_s, &gens, &mut OsRng);
    let mac = Mac::compute(&sk, &gens, &ma, &ms, &mut OsRng);

    let statement = build_statement(&gens, &params, &ma, &ms, &mac).unwrap();

    let mut prover_t = WabiTranscript::new(b"issuance-test-2");
    // Proving with a key inconsistent with `params`/`mac` should fail to produce a valid proof.
    let proof = prove(&other_sk, &statement, &mut prover_t, &mut OsRng).unwrap();

    let mut verifier_t = WabiTranscript::new(b"issuance-test-2");
    assert!(!verify(&statement, &proof, &mut verifier_t).unwrap());
  }
}
