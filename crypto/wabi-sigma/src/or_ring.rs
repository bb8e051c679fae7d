//! Abe–Ohkubo–Suzuki OR composition (§4.4): a witness-indistinguishable proof
//! that the prover knows a witness for *one* of `n` alternative statements,
//! without revealing which. Modeled with explicit index rotation (§9
//! "Cycles in OR proofs": the ring's cyclic structure is never hidden behind
//! references).

use rand_core::{CryptoRng, RngCore};

use wabi_group::{GroupElement, GroupElementVector, Scalar, ScalarVector};
use wabi_transcript::WabiTranscript;

use crate::relation::{self, Statement};
use crate::SigmaError;

/// An OR-composed proof: one `(Rᵢ, sᵢ)` pair per alternative, in canonical order. There is
/// nothing in this struct that reveals which index the prover actually knew a witness for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrProof {
  pub nonces: Vec<GroupElementVector>,
  pub responses: Vec<Vec<ScalarVector>>,
}

fn flatten_nonces(nonces: &[GroupElementVector]) -> Vec<GroupElement> {
  nonces.iter().flat_map(|v| v.0.clone()).collect()
}

/// Proves that the prover knows a witness for `alternatives[known_index]`. `alternatives` must
/// already have had every member's statement committed to `transcript` (phase 1); this function
/// performs phase 2 (the ring) in full, including absorbing the resulting nonces — an OR
/// sub-proof never needs the top-level shared challenge, so phase 3 is a no-op for it.
pub fn prove(
  alternatives: &[Statement],
  known_index: usize,
  witness: &ScalarVector,
  transcript: &mut WabiTranscript,
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<OrProof, SigmaError> {
  let n = alternatives.len();
  if n < 2 {
    return Err(SigmaError::RingTooShort);
  }
  if known_index >= n {
    return Err(SigmaError::InvalidRingIndex);
  }

  let base = transcript.clone();

  let mut nonces: Vec<GroupElementVector> = vec![GroupElementVector(vec![]); n];
  let mut responses: Vec<Vec<ScalarVector>> = vec![Vec::new(); n];

  let (real_row_nonces, real_public_nonces) =
    relation::generate_row_nonces(&alternatives[known_index], witness, &base, rng)?;
  nonces[known_index] = real_public_nonces;

  let mut prev_index = known_index;
  for step in 1 .. n {
    let i = (known_index + step) % n;
    let challenge = base.ring_link_challenge(&nonces[prev_index].0);
    let alt = &alternatives[i];
    let mut sampled = Vec::with_capacity(alt.num_equations());
    for (_, generators) in &alt.equations {
      sampled.push(ScalarVector((0 .. generators.len()).map(|_| Scalar::random(rng)).collect()));
    }
    let simulated_nonces = relation::simulate(alt, &challenge, &sampled)?;
    nonces[i] = simulated_nonces;
    responses[i] = sampled;
    prev_index = i;
  }

  // Close the cycle: derive the real link's challenge from the last simulated (or, if n == 2,
  // the only other) alternative's nonces, then respond with the real witness.
  let closing_challenge = base.ring_link_challenge(&nonces[prev_index].0);
  let known_statement = &alternatives[known_index];
  let mut known_responses = Vec::with_capacity(known_statement.num_equations());
  for (row_k, (_, _generators)) in real_row_nonces.iter().zip(&known_statement.equations) {
    let mut row = Vec::with_capacity(witness.len());
    for (k_j, x_j) in row_k.0.iter().zip(witness.0.iter()) {
      let s_j = k_j.add(&closing_challenge.mul(x_j));
      if s_j.is_zero() {
        return Err(SigmaError::ZeroResponse);
      }
      row.push(s_j);
    }
    known_responses.push(ScalarVector(row));
  }
  responses[known_index] = known_responses;

  transcript.commit_public_nonces(&flatten_nonces(&nonces))?;

  Ok(OrProof { nonces, responses })
}

/// Verifies an OR proof. `alternatives` must already have had every member's statement
/// committed to `transcript` (mirroring the prover's phase 1) before this is called.
pub fn verify(
  alternatives: &[Statement],
  proof: &OrProof,
  transcript: &mut WabiTranscript,
) -> Result<bool, SigmaError> {
  let n = alternatives.len();
  if n < 2 || proof.nonces.len() != n || proof.responses.len() != n {
    return Ok(false);
  }

  let base = transcript.clone();

  for i in 0 .. n {
    let prev = (i + n - 1) % n;
    let challenge = base.ring_link_challenge(&proof.nonces[prev].0);
    let alt = &alternatives[i];
    if proof.nonces[i].len() != alt.num_equations() || proof.responses[i].len() != alt.num_equations()
    {
      return Ok(false);
    }
    for (eq_idx, (public_point, generators)) in alt.equations.iter().enumerate() {
      let lhs = match generators.inner_product(&proof.responses[i][eq_idx]) {
        Ok(v) => v,
        Err(_) => return Ok(false),
      };
      let rhs = proof.nonces[i].0[eq_idx].add(&public_point.mul(&challenge));
      if lhs != rhs {
        return Ok(false);
      }
    }
  }

  transcript.commit_public_nonces(&flatten_nonces(&proof.nonces))?;
  Ok(true)
}
