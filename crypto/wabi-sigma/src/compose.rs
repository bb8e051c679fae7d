//! Fiat-Shamir AND composition (§4.4): delegates the three phases to every
//! conjunct in a fixed order so the final challenge is common to all of
//! them, binding them together. A conjunct is either a plain linear-relation
//! leaf or an OR ring; OR sub-proofs are fully resolved during phase 2 (they
//! never consume the shared challenge — see `or_ring`), so phase 3 only
//! touches leaf conjuncts.

use rand_core::{CryptoRng, RngCore};

use wabi_group::{GroupElementVector, ScalarVector};
use wabi_transcript::WabiTranscript;

use crate::or_ring::{self, OrProof};
use crate::relation::{self, LeafNonceState, LeafProof, Statement};
use crate::SigmaError;

/// One conjunct going into an AND composition, together with the witness it is proven with.
pub enum Conjunct {
  Leaf { statement: Statement, witness: ScalarVector },
  Or { alternatives: Vec<Statement>, known_index: usize, witness: ScalarVector },
}

/// The statement-only shape of a conjunct, used by the verifier (which has no witness).
pub enum ConjunctStatement {
  Leaf(Statement),
  Or(Vec<Statement>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConjunctProof {
  Leaf(LeafProof),
  Or(OrProof),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AndProof {
  pub parts: Vec<ConjunctProof>,
}

enum InFlight {
  Leaf { statement: Statement, witness: ScalarVector, nonce_state: LeafNonceState, nonce_points: GroupElementVector },
  Or(OrProof),
}

pub fn prove(
  conjuncts: Vec<Conjunct>,
  transcript: &mut WabiTranscript,
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<AndProof, SigmaError> {
  // Phase 1: commit-to-statements, every conjunct, fixed order.
  for conjunct in &conjuncts {
    match conjunct {
      Conjunct::Leaf { statement, .. } => statement.commit(transcript)?,
      Conjunct::Or { alternatives, .. } => {
        for alt in alternatives {
          alt.commit(transcript)?;
        }
      }
    }
  }

  // Phase 2: commit-to-nonces.
  let mut in_flight = Vec::with_capacity(conjuncts.len());
  for conjunct in conjuncts {
    match conjunct {
      Conjunct::Leaf { statement, witness } => {
        let (nonce_state, nonce_points) = relation::commit_nonces(&statement, &witness, transcript, rng)?;
        in_flight.push(InFlight::Leaf { statement, witness, nonce_state, nonce_points });
      }
      Conjunct::Or { alternatives, known_index, witness } => {
        let proof = or_ring::prove(&alternatives, known_index, &witness, transcript, rng)?;
        in_flight.push(InFlight::Or(proof));
      }
    }
  }

  // The shared challenge, common to every leaf conjunct.
  let challenge = transcript.challenge();

  // Phase 3: respond.
  let mut parts = Vec::with_capacity(in_flight.len());
  for item in in_flight {
    match item {
      InFlight::Leaf { statement, witness, nonce_state, nonce_points } => {
        let leaf = relation::respond(&statement, &witness, nonce_state, nonce_points, &challenge)?;
        parts.push(ConjunctProof::Leaf(leaf));
      }
      InFlight::Or(proof) => parts.push(ConjunctProof::Or(proof)),
    }
  }

  Ok(AndProof { parts })
}

pub fn verify(
  conjuncts: &[ConjunctStatement],
  proof: &AndProof,
  transcript: &mut WabiTranscript,
) -> Result<bool, SigmaError> {
  if conjuncts.len() != proof.parts.len() {
    return Ok(false);
  }

  // Phase 1.
  for conjunct in conjuncts {
    match conjunct {
      ConjunctStatement::Leaf(statement) => statement.commit(transcript)?,
      ConjunctStatement::Or(alternatives) => {
        for alt in alternatives {
          alt.commit(transcript)?;
        }
      }
    }
  }

  // Phase 2.
  for (conjunct, part) in conjuncts.iter().zip(&proof.parts) {
    match (conjunct, part) {
      (ConjunctStatement::Leaf(_), ConjunctProof::Leaf(leaf)) => {
        transcript.commit_public_nonces(&leaf.nonces.0)?;
      }
      (ConjunctStatement::Or(alternatives), ConjunctProof::Or(or_proof)) => {
        if !or_ring::verify(alternatives, or_proof, transcript)? {
          return Ok(false);
        }
      }
      _ => return Ok(false),
    }
  }

  // Phase 3: shared challenge, checked against every leaf conjunct (OR conjuncts already
  // verified themselves internally above).
  let challenge = transcript.challenge();
  for (conjunct, part) in conjuncts.iter().zip(&proof.parts) {
    if let (ConjunctStatement::Leaf(statement), ConjunctProof::Leaf(leaf)) = (conjunct, part) {
      if !relation::verify_with_challenge(statement, leaf, &challenge) {
        return Ok(false);
      }
    }
  }

  Ok(true)
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand_core::OsRng;
  use wabi_group::{GroupElement, GroupElementVector, Generators, Scalar};

  #[test]
  fn and_of_leaf_and_or_round_trips() {
    let gens = Generators::new();
    let x = Scalar::random(&mut OsRng);
    let leaf_public = gens.g_h.mul(&x);
    let leaf_statement =
      Statement::new(b"and/leaf", vec![(leaf_public, GroupElementVector(vec![gens.g_h]))]).unwrap();

    let r = Scalar::random(&mut OsRng);
    let bit_a = gens.g_h.mul(&r);
    let alt0 = Statement::new(b"and/or0", vec![(bit_a, GroupElementVector(vec![gens.g_h]))]).unwrap();
    let alt1 = Statement::new(
      b"and/or1",
      vec![(bit_a.add(&gens.g_g.negate()), GroupElementVector(vec![gens.g_h]))],
    )
    .unwrap();

    let conjuncts = vec![
      Conjunct::Leaf { statement: leaf_statement.clone(), witness: ScalarVector(vec![x]) },
      Conjunct::Or {
        alternatives: vec![alt0.clone(), alt1.clone()],
        known_index: 0,
        witness: ScalarVector(vec![r]),
      },
    ];

    let mut prover_t = WabiTranscript::new(b"and-test");
    let proof = prove(conjuncts, &mut prover_t, &mut OsRng).unwrap();

    let verify_conjuncts =
      vec![ConjunctStatement::Leaf(leaf_statement), ConjunctStatement::Or(vec![alt0, alt1])];
    let mut verifier_t = WabiTranscript::new(b"and-test");
    assert!(verify(&verify_conjuncts, &proof, &mut verifier_t).unwrap());
  }

  #[test]
  fn tampering_either_conjunct_fails() {
    let gens = Generators::new();
    let x = Scalar::random(&mut OsRng);
    let leaf_public = gens.g_h.mul(&x);
    let leaf_statement =
      Statement::new(b"and/leaf2", vec![(leaf_public, GroupElementVector(vec![gens.g_h]))]).unwrap();

    let conjuncts = vec![Conjunct::Leaf { statement: leaf_statement.clone(), witness: ScalarVector(vec![x]) }];
    let mut prover_t = WabiTranscript::new(b"and-test-2");
    let mut proof = prove(conjuncts, &mut prover_t, &mut OsRng).unwrap();
    if let ConjunctProof::Leaf(leaf) = &mut proof.parts[0] {
      leaf.nonces.0[0] = GroupElement::generator();
    }

    let verify_conjuncts = vec![ConjunctStatement::Leaf(leaf_statement)];
    let mut verifier_t = WabiTranscript::new(b"and-test-2");
    assert!(!verify(&verify_conjuncts, &proof, &mut verifier_t).unwrap());
  }
}
