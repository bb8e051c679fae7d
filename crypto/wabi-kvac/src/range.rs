//! The range proof (§4.5): bit-decompose an attribute value under a
//! dedicated generator `Gg`, Pedersen-commit each bit, tie the weighted sum
//! of bit commitments back to the attribute commitment with a 2-equation
//! linear relation, and prove each bit is `0` or `1` with the AOS OR ring
//! `wabi-sigma::or_ring` already provides. The whole thing is one
//! `wabi-sigma::compose::AndProof`: one leaf conjunct (the tie-back) and one
//! OR conjunct per bit.

use rand_core::{CryptoRng, RngCore};

use wabi_group::{GroupElement, GroupElementVector, Generators, Scalar, ScalarVector};
use wabi_sigma::compose::{self, AndProof, Conjunct, ConjunctStatement};
use wabi_sigma::Statement;
use wabi_transcript::WabiTranscript;

use crate::{scalar_from_u64, KvacError};

/// Attribute values here are spendable-output amounts in satoshis; 51 bits comfortably covers
/// the full 21,000,000 BTC supply with headroom.
pub const RANGE_BITS: usize = 51;

#[derive(Clone, Copy, Debug)]
pub struct BitCommitment {
  pub point: GroupElement,
  pub bit: u8,
  pub randomness: Scalar,
}

/// Commits each bit of `value` (bit `j` first), under `Gg` when set and blinded by `Gh`
/// unconditionally.
pub fn commit_bits(value: u64, width: usize, gens: &Generators, rng: &mut (impl RngCore + CryptoRng)) -> Vec<BitCommitment> {
  (0 .. width)
    .map(|j| {
      let bit = ((value >> j) & 1) as u8;
      let randomness = Scalar::random_nonzero(rng);
      let blinding = gens.g_h.mul(&randomness);
      let point = if bit == 1 { gens.g_g.add(&blinding) } else { blinding };
      BitCommitment { point, bit, randomness }
    })
    .collect()
}

fn weighted_sum(points: &[GroupElement]) -> GroupElement {
  let mut acc = GroupElement::identity();
  for (j, p) in points.iter().enumerate() {
    acc = acc.add(&p.mul(&scalar_from_u64(1u64 << j)));
  }
  acc
}

/// The two-equation statement tying the attribute commitment `Ma = a·Ga + r_a·Gh` to the
/// weighted sum of bit commitments `Σ 2ʲ·Aⱼ = a·Gg + R'·Gh`, shared witness `(a, r_a, R')`.
pub fn build_tie_back_statement(
  gens: &Generators,
  amount_commitment: &GroupElement,
  bit_points: &[GroupElement],
) -> Result<Statement, KvacError> {
  let infinity = GroupElement::identity();
  let weighted = weighted_sum(bit_points);
  let eq_attribute = (*amount_commitment, GroupElementVector(vec![gens.g_a, gens.g_h, infinity]));
  let eq_bits = (weighted, GroupElementVector(vec![gens.g_g, infinity, gens.g_h]));
  Statement::new(b"kvac/range/tie_back", vec![eq_attribute, eq_bits]).map_err(KvacError::Sigma)
}

/// The `{bit = 0} OR {bit = 1}` alternatives for one bit commitment.
pub fn bit_statements(bit_commitment: &GroupElement, gens: &Generators) -> Result<Vec<Statement>, KvacError> {
  let alt0 = Statement::new(b"kvac/range/bit0", vec![(*bit_commitment, GroupElementVector(vec![gens.g_h]))])
    .map_err(KvacError::Sigma)?;
  let shifted = bit_commitment.add(&gens.g_g.negate());
  let alt1 =
    Statement::new(b"kvac/range/bit1", vec![(shifted, GroupElementVector(vec![gens.g_h]))]).map_err(KvacError::Sigma)?;
  Ok(vec![alt0, alt1])
}

/// Proves that `amount_commitment` opens to a value in `[0, 2^width)`. Returns the proof and the
/// public bit commitments, which the verifier needs alongside it.
pub fn prove(
  gens: &Generators,
  amount: u64,
  amount_commitment: &GroupElement,
  randomness_a: &Scalar,
  width: usize,
  transcript: &mut WabiTranscript,
  rng: &mut (impl RngCore + CryptoRng),
) -> Result<(AndProof, Vec<GroupElement>), KvacError> {
  let bits = commit_bits(amount, width, gens, rng);
  let bit_points: Vec<GroupElement> = bits.iter().map(|b| b.point).collect();

  let r_prime = bits
    .iter()
    .enumerate()
    .fold(Scalar::zero(), |acc, (j, b)| acc.add(&scalar_from_u64(1u64 << j).mul(&b.randomness)));

  let tie_back = build_tie_back_statement(gens, amount_commitment, &bit_points)?;
  let tie_back_witness = ScalarVector(vec![scalar_from_u64(amount), *randomness_a, r_prime]);

  let mut conjuncts = vec![Conjunct::Leaf { statement: tie_back, witness: tie_back_witness }];
  for bit in &bits {
    let alternatives = bit_statements(&bit.point, gens)?;
    conjuncts.push(Conjunct::Or {
      alternatives,
      known_index: bit.bit as usize,
      witness: ScalarVector(vec![bit.randomness]),
    });
  }

  let proof = compose::prove(conjuncts, transcript, rng).map_err(KvacError::Sigma)?;
  Ok((proof, bit_points))
}

pub fn verify(
  gens: &Generators,
  amount_commitment: &GroupElement,
  bit_points: &[GroupElement],
  proof: &AndProof,
  transcript: &mut WabiTranscript,
) -> Result<bool, KvacError> {
  let tie_back = build_tie_back_statement(gens, amount_commitment, bit_points)?;
  let mut conjuncts = vec![ConjunctStatement::Leaf(tie_back)];
  for p in bit_points {
    conjuncts.push(ConjunctStatement::Or(bit_statements(p, gens)?));
  }
  compose::verify(&conjuncts, proof, transcript).map_err(KvacError::Sigma)
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand_core::OsRng;
  use wabi_group::Generators;

  use crate::mac::commit_attribute;

  const TEST_WIDTH: usize = 8;

  #[test]
  fn range_round_trips_for_in_bounds_value() {
    let gens = Generators::new();
    let amount = 200u64; // fits in 8 bits
    let (amount_commitment, randomness_a) =
      commit_attribute(&scalar_from_u64(amount), &gens.g_a, &gens, &mut OsRng);

    let mut prover_t = WabiTranscript::new(b"range-test");
    let (proof, bit_points) =
      prove(&gens, amount, &amount_commitment, &randomness_a, TEST_WIDTH, &mut prover_t, &mut OsRng).unwrap();

    let mut verifier_t = WabiTranscript::new(b"range-test");
    assert!(verify(&gens, &amount_commitment, &bit_points, &proof, &mut verifier_t).unwrap());
  }

  #[test]
  fn range_rejects_tampered_bit_commitment() {
    let gens = Generators::new();
    let amount = 10u64;
    let (amount_commitment, randomness_a) =
      commit_attribute(&scalar_from_u64(amount), &gens.g_a, &gens, &mut OsRng);

    let mut prover_t = WabiTranscript::new(b"range-test-2");
    let (proof, mut bit_points) =
      prove(&gens, amount, &amount_commitment, &randomness_a, TEST_WIDTH, &mut prover_t, &mut OsRng).unwrap();

    bit_points[0] = bit_points[0].add(&gens.g_g);

    let mut verifier_t = WabiTranscript::new(b"range-test-2");
    assert!(!verify(&gens, &amount_commitment, &bit_points, &proof, &mut verifier_t).unwrap());
  }
}
