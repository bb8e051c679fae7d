//! The linear-relation Σ-protocol (§4.3): a `Statement` is a system of `k`
//! equations sharing one witness vector of length `n`. Prover, verifier, and
//! simulator below are the single-equation Schnorr sign/verify pair of
//! `frost::schnorr` generalized to a matrix of generators, the same
//! generalization `other_examples/…mmaker-sigma-rs__src-fiat_shamir.rs.rs`
//! organizes as a `SigmaProtocol` trait's `prover_commit`/`prover_response`/
//! `verifier`.

use rand_core::{CryptoRng, RngCore};

use wabi_group::{GroupElement, GroupElementVector, Scalar, ScalarVector};
use wabi_transcript::WabiTranscript;

use crate::SigmaError;

/// One equation is `Pᵢ = Σⱼ xⱼ · Gᵢⱼ`; `Gᵢⱼ` may be infinity, excluding `xⱼ` from that row.
pub type Equation = (GroupElement, GroupElementVector);

/// A system of `k` equations over a shared witness of `n` scalars.
#[derive(Clone)]
pub struct Statement {
  pub label: &'static [u8],
  pub equations: Vec<Equation>,
}

impl Statement {
  pub fn new(label: &'static [u8], equations: Vec<Equation>) -> Result<Self, SigmaError> {
    if equations.is_empty() {
      return Err(SigmaError::EmptyStatement);
    }
    let n = equations[0].1.len();
    for (_, row) in &equations {
      if row.len() != n {
        return Err(SigmaError::RaggedStatement);
      }
      if row.0.iter().all(|g| g.is_infinity()) {
        return Err(SigmaError::AllInfinityRow);
      }
    }
    Ok(Statement { label, equations })
  }

  pub fn witness_len(&self) -> usize {
    self.equations[0].1.len()
  }

  pub fn num_equations(&self) -> usize {
    self.equations.len()
  }

  pub(crate) fn commit(&self, transcript: &mut WabiTranscript) -> Result<(), SigmaError> {
    transcript.commit_statement(self.label, &self.equations).map_err(Into::into)
  }
}

/// A leaf proof: one public nonce `Rᵢ` and one response vector `sᵢ` per equation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafProof {
  pub nonces: GroupElementVector,
  pub responses: Vec<ScalarVector>,
}

/// Per-row secret nonces carried from the commit-nonces phase into the respond phase; zeroized
/// on drop since it's witness-derived secret material.
#[derive(Clone, zeroize::Zeroize)]
#[zeroize(drop)]
pub struct LeafNonceState {
  #[zeroize(skip)]
  row_nonces: Vec<ScalarVector>,
}

/// Generates one fresh nonce vector per equation row and the matching public nonces, without
/// committing them to the transcript. Used by the OR ring (`or_ring.rs`), which only commits the
/// whole ring's nonces once, after closing the cycle.
pub(crate) fn generate_row_nonces(
  statement: &Statement,
  witness: &ScalarVector,
  transcript: &WabiTranscript,
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<(Vec<ScalarVector>, GroupElementVector), SigmaError> {
  if witness.len() != statement.witness_len() {
    return Err(SigmaError::WitnessLengthMismatch);
  }
  let mut row_nonces = Vec::with_capacity(statement.num_equations());
  let mut public_nonces = Vec::with_capacity(statement.num_equations());
  for (_, generators) in &statement.equations {
    let k_i = transcript.generate_secret_nonces(witness, rng);
    let r_i = generators.inner_product(&k_i)?;
    row_nonces.push(k_i);
    public_nonces.push(r_i);
  }
  Ok((row_nonces, GroupElementVector(public_nonces)))
}

/// Phase 2 of §4.4: generate secret nonces, derive public nonces, commit them to the transcript.
/// Returns the state needed by `respond` once the shared challenge is known.
pub fn commit_nonces(
  statement: &Statement,
  witness: &ScalarVector,
  transcript: &mut WabiTranscript,
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<(LeafNonceState, GroupElementVector), SigmaError> {
  if witness.len() != statement.witness_len() {
    return Err(SigmaError::WitnessLengthMismatch);
  }
  let mut row_nonces = Vec::with_capacity(statement.num_equations());
  let mut public_nonces = Vec::with_capacity(statement.num_equations());
  for (_, generators) in &statement.equations {
    let k_i = transcript.generate_secret_nonces(witness, rng);
    let r_i = generators.inner_product(&k_i)?;
    row_nonces.push(k_i);
    public_nonces.push(r_i);
  }
  transcript.commit_public_nonces(&public_nonces)?;
  Ok((LeafNonceState { row_nonces }, GroupElementVector(public_nonces)))
}

/// Phase 3: respond to the (by now shared) challenge. Rejects if any response would be zero,
/// per §4.3's edge case — the caller is expected to retry the whole proof with fresh randomness
/// on the (cryptographically negligible) `ZeroResponse` error.
pub fn respond(
  statement: &Statement,
  witness: &ScalarVector,
  nonces: LeafNonceState,
  nonce_points: GroupElementVector,
  challenge: &Scalar,
) -> Result<LeafProof, SigmaError> {
  let mut responses = Vec::with_capacity(statement.num_equations());
  for k_i in &nonces.row_nonces {
    let mut row = Vec::with_capacity(witness.len());
    for (k_ij, x_j) in k_i.0.iter().zip(witness.0.iter()) {
      let s_ij = k_ij.add(&challenge.mul(x_j));
      if s_ij.is_zero() {
        return Err(SigmaError::ZeroResponse);
      }
      row.push(s_ij);
    }
    responses.push(ScalarVector(row));
  }
  Ok(LeafProof { nonces: nonce_points, responses })
}

/// One-shot prove of a standalone leaf statement: commits the statement, commits nonces, draws
/// the challenge, and responds, all against the given transcript.
pub fn prove(
  statement: &Statement,
  witness: &ScalarVector,
  transcript: &mut WabiTranscript,
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<LeafProof, SigmaError> {
  statement.commit(transcript)?;
  let (nonce_state, nonce_points) = commit_nonces(statement, witness, transcript, rng)?;
  let challenge = transcript.challenge();
  respond(statement, witness, nonce_state, nonce_points, &challenge)
}

/// Verifies a leaf proof against an already-known challenge (for AND composition the caller
/// derives one shared challenge and calls this per conjunct).
pub fn verify_with_challenge(
  statement: &Statement,
  proof: &LeafProof,
  challenge: &Scalar,
) -> bool {
  if proof.nonces.len() != statement.num_equations() || proof.responses.len() != statement.num_equations() {
    return false;
  }
  for (i, (public_point, generators)) in statement.equations.iter().enumerate() {
    let lhs = match generators.inner_product(&proof.responses[i]) {
      Ok(v) => v,
      Err(_) => return false,
    };
    let rhs = proof.nonces.0[i].add(&public_point.mul(challenge));
    if lhs != rhs {
      return false;
    }
  }
  true
}

/// Standalone verify: commits the statement, commits the proof's own nonces, derives the
/// challenge, then checks every equation.
pub fn verify(
  statement: &Statement,
  proof: &LeafProof,
  transcript: &mut WabiTranscript,
) -> Result<bool, SigmaError> {
  statement.commit(transcript)?;
  transcript.commit_public_nonces(&proof.nonces.0)?;
  let challenge = transcript.challenge();
  Ok(verify_with_challenge(statement, proof, &challenge))
}

/// The OR-composition simulator (§4.3): given a challenge and arbitrary responses, recovers the
/// public nonces that make the verification equations hold. Used to fake every ring alternative
/// except the one the prover actually knows.
pub fn simulate(
  statement: &Statement,
  challenge: &Scalar,
  responses: &[ScalarVector],
) -> Result<GroupElementVector, SigmaError> {
  if responses.len() != statement.num_equations() {
    return Err(SigmaError::WitnessLengthMismatch);
  }
  let mut nonces = Vec::with_capacity(statement.num_equations());
  for ((public_point, generators), s_i) in statement.equations.iter().zip(responses) {
    let r_i = generators.inner_product(s_i)?.add(&public_point.mul(challenge).negate());
    nonces.push(r_i);
  }
  Ok(GroupElementVector(nonces))
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand_core::OsRng;
  use wabi_group::Generators;

  fn one_equation_statement() -> Statement {
    let g = Generators::new();
    Statement::new(
      b"test/single",
      vec![(GroupElement::generator(), GroupElementVector(vec![g.g_h]))],
    )
    .unwrap()
  }

  #[test]
  fn prove_verify_round_trip() {
    let witness_scalar = Scalar::random(&mut OsRng);
    let gens = Generators::new();
    let public = gens.g_h.mul(&witness_scalar);
    let statement = Statement::new(b"test/single", vec![(public, GroupElementVector(vec![gens.g_h]))]).unwrap();
    let witness = ScalarVector(vec![witness_scalar]);

    let mut prover_t = WabiTranscript::new(b"unit-test");
    let proof = prove(&statement, &witness, &mut prover_t, &mut OsRng).unwrap();

    let mut verifier_t = WabiTranscript::new(b"unit-test");
    assert!(verify(&statement, &proof, &mut verifier_t).unwrap());
  }

  #[test]
  fn tampered_response_fails() {
    let witness_scalar = Scalar::random(&mut OsRng);
    let gens = Generators::new();
    let public = gens.g_h.mul(&witness_scalar);
    let statement = Statement::new(b"test/single", vec![(public, GroupElementVector(vec![gens.g_h]))]).unwrap();
    let witness = ScalarVector(vec![witness_scalar]);

    let mut prover_t = WabiTranscript::new(b"unit-test");
    let mut proof = prove(&statement, &witness, &mut prover_t, &mut OsRng).unwrap();
    proof.responses[0].0[0] = proof.responses[0].0[0].add(&Scalar::one());

    let mut verifier_t = WabiTranscript::new(b"unit-test");
    assert!(!verify(&statement, &proof, &mut verifier_t).unwrap());
  }

  #[test]
  fn all_infinity_row_rejected() {
    let result = Statement::new(
      b"test/bad",
      vec![(GroupElement::generator(), GroupElementVector(vec![GroupElement::identity()]))],
    );
    assert!(matches!(result, Err(SigmaError::AllInfinityRow)));
  }

  #[test]
  fn simulator_produces_verifying_proof() {
    let statement = one_equation_statement();
    let challenge = Scalar::random(&mut OsRng);
    let responses = vec![ScalarVector(vec![Scalar::random(&mut OsRng)])];
    let nonces = simulate(&statement, &challenge, &responses).unwrap();
    let proof = LeafProof { nonces, responses };
    assert!(verify_with_challenge(&statement, &proof, &challenge));
  }
}
