//! Fiat-Shamir transcript.
//!
//! A long-lived, clonable `Blake2b512` accumulator standing in for the
//! reference's STROBE-128 sponge, absorbing domain-separated data the same
//! way `frost::curve::kp256::hash_to_F` chains fixed tags and caller bytes
//! into `Sha256` before finalizing — except here the hasher is never
//! consumed by a single call; a challenge clones it first, so absorption
//! keeps accumulating across the whole proof session.

use blake2::{Blake2b512, Digest};
use rand_core::{CryptoRng, RngCore};

use wabi_group::{GroupElement, GroupElementVector, Scalar, ScalarVector};

const PROTOCOL_TAG: &[u8] = b"WabiSabi_v1.0";

#[derive(Clone, Copy, Debug, thiserror::Error, PartialEq, Eq)]
pub enum TranscriptError {
  #[error("infinity point committed to transcript")]
  InfinityInStatement,
  #[error("statement equation row count does not match generator row count")]
  MalformedStatement,
}

/// A single proof session's hash state. Lives for exactly one proof (one `prove`/`verify`
/// call), per the data model's transcript lifecycle.
#[derive(Clone)]
pub struct WabiTranscript {
  hasher: Blake2b512,
}

fn absorb(hasher: &mut Blake2b512, label: &[u8], data: &[u8]) {
  hasher.update((label.len() as u32).to_be_bytes());
  hasher.update(label);
  hasher.update((data.len() as u32).to_be_bytes());
  hasher.update(data);
}

impl WabiTranscript {
  /// `context` is the caller-supplied label, e.g. `"UnifiedRegistration/2/false"`; the fixed
  /// protocol tag is prepended unconditionally.
  pub fn new(context: &[u8]) -> Self {
    let mut hasher = Blake2b512::new();
    absorb(&mut hasher, b"protocol", PROTOCOL_TAG);
    absorb(&mut hasher, b"context", context);
    WabiTranscript { hasher }
  }

  /// Absorbs a statement: its type tag, equation count, and for each equation the public point
  /// and its ordered generator row (each preceded by its count). Rejects any infinity point.
  pub fn commit_statement(
    &mut self,
    statement_type: &[u8],
    equations: &[(GroupElement, GroupElementVector)],
  ) -> Result<(), TranscriptError> {
    absorb(&mut self.hasher, b"statement", b"");
    absorb(&mut self.hasher, b"statement_type", statement_type);
    self.hasher.update((equations.len() as u32).to_be_bytes());
    for (public_point, generators) in equations {
      if public_point.is_infinity() {
        return Err(TranscriptError::InfinityInStatement);
      }
      absorb(&mut self.hasher, b"equation_point", &public_point.to_bytes());
      self.hasher.update((generators.len() as u32).to_be_bytes());
      for g in &generators.0 {
        if g.is_infinity() {
          // Infinity generators are a valid "excluded witness component" marker; they are not
          // committed as points (there's nothing canonical to hash), just their count is, via
          // a one-byte sentinel so the transcript still binds the matrix's shape.
          self.hasher.update([0u8]);
          continue;
        }
        self.hasher.update([1u8]);
        self.hasher.update(g.to_bytes());
      }
    }
    Ok(())
  }

  /// Absorbs the prover's public nonces (the `Rᵢ` of §4.3). Rejects infinity.
  pub fn commit_public_nonces(
    &mut self,
    points: &[GroupElement],
  ) -> Result<(), TranscriptError> {
    absorb(&mut self.hasher, b"nonce_commitment", b"");
    self.hasher.update((points.len() as u32).to_be_bytes());
    for p in points {
      if p.is_infinity() {
        return Err(TranscriptError::InfinityInStatement);
      }
      self.hasher.update(p.to_bytes());
    }
    Ok(())
  }

  /// Derives the Fiat-Shamir challenge. Clones the hasher before finalizing so the live
  /// transcript keeps accumulating (an AND composition calls this once after every conjunct has
  /// committed its nonces; an OR ring calls a per-link variant below instead).
  pub fn challenge(&mut self) -> Scalar {
    absorb(&mut self.hasher, b"challenge", b"");
    let digest = self.hasher.clone().finalize();
    Scalar::from_bytes_mod_order_wide(&digest)
  }

  /// The per-link challenge used inside an OR ring (§4.4 step 3/4): forks from the *shared*
  /// transcript state as it stood when the ring began, absorbing only the previous link's
  /// public nonces, so each link's challenge depends on the ring's position without the links
  /// polluting each other's base state.
  pub fn ring_link_challenge(&self, previous_nonces: &[GroupElement]) -> Scalar {
    let mut fork = self.clone();
    fork.hasher.update((previous_nonces.len() as u32).to_be_bytes());
    for p in previous_nonces {
      absorb(&mut fork.hasher, b"or_ring_link", &p.to_bytes());
    }
    fork.challenge()
  }

  /// Synthetic nonce generation (§4.2): fork the transcript, absorb the witness and external
  /// randomness as key material, then squeeze one scalar per witness element from successive
  /// finalizations of the forked, ever-mutating hasher.
  pub fn generate_secret_nonces(
    &self,
    witness: &ScalarVector,
    rng: &mut (impl RngCore + CryptoRng),
  ) -> ScalarVector {
    let mut fork = self.clone();
    absorb(&mut fork.hasher, b"witness_key", b"");
    for w in &witness.0 {
      fork.hasher.update(w.to_bytes());
    }
    let mut external = [0u8; 32];
    rng.fill_bytes(&mut external);
    absorb(&mut fork.hasher, b"external_randomness", &external);

    let mut nonces = Vec::with_capacity(witness.len());
    for i in 0 .. witness.len() {
      absorb(&mut fork.hasher, b"synthetic_nonce_index", &(i as u32).to_be_bytes());
      let digest = fork.hasher.clone().finalize();
      // Mix the squeeze output back into the forked state so successive indices are
      // independent, not just differently-tagged views of the same prefix.
      fork.hasher.update(&digest);
      nonces.push(Scalar::from_bytes_mod_order_wide(&digest));
    }
    ScalarVector(nonces)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand_core::OsRng;

  fn sample_equations() -> Vec<(GroupElement, GroupElementVector)> {
    vec![(GroupElement::generator(), GroupElementVector(vec![GroupElement::generator()]))]
  }

  #[test]
  fn identical_absorption_yields_identical_challenge() {
    let mut a = WabiTranscript::new(b"ctx");
    let mut b = WabiTranscript::new(b"ctx");
    a.commit_statement(b"stmt", &sample_equations()).unwrap();
    b.commit_statement(b"stmt", &sample_equations()).unwrap();
    assert_eq!(a.challenge(), b.challenge());
  }

  #[test]
  fn different_context_yields_different_challenge() {
    let mut a = WabiTranscript::new(b"ctx-a");
    let mut b = WabiTranscript::new(b"ctx-b");
    assert_ne!(a.challenge(), b.challenge());
  }

  #[test]
  fn infinity_point_in_statement_rejected() {
    let mut t = WabiTranscript::new(b"ctx");
    let eqs = vec![(GroupElement::identity(), GroupElementVector(vec![GroupElement::generator()]))];
    assert_eq!(t.commit_statement(b"stmt", &eqs), Err(TranscriptError::InfinityInStatement));
  }

  #[test]
  fn synthetic_nonces_depend_on_witness() {
    let t = WabiTranscript::new(b"ctx");
    let w1 = ScalarVector(vec![Scalar::one()]);
    let w2 = ScalarVector(vec![Scalar::one().add(&Scalar::one())]);
    let n1 = t.generate_secret_nonces(&w1, &mut OsRng);
    let n2 = t.generate_secret_nonces(&w2, &mut OsRng);
    assert_ne!(n1.0[0], n2.0[0]);
  }

  #[test]
  fn synthetic_nonces_depend_on_prior_transcript_state() {
    let mut base = WabiTranscript::new(b"ctx");
    base.commit_statement(b"stmt", &sample_equations()).unwrap();
    let w = ScalarVector(vec![Scalar::one()]);

    let mut other = WabiTranscript::new(b"ctx");
    other
      .commit_statement(b"stmt", &[(GroupElement::generator().mul(&Scalar::one().add(&Scalar::one())), GroupElementVector(vec![GroupElement::generator()]))])
      .unwrap();

    let n1 = base.generate_secret_nonces(&w, &mut OsRng);
    let n2 = other.generate_secret_nonces(&w, &mut OsRng);
    assert_ne!(n1.0[0], n2.0[0]);
  }

  #[test]
  fn clone_is_independent() {
    let mut t = WabiTranscript::new(b"ctx");
    t.commit_statement(b"stmt", &sample_equations()).unwrap();
    let mut forked = t.clone();
    forked.commit_public_nonces(&[GroupElement::generator()]).unwrap();
    // Mutating the fork must not be visible in `t`.
    let c_t = t.challenge();
    let mut t2 = WabiTranscript::new(b"ctx");
    t2.commit_statement(b"stmt", &sample_equations()).unwrap();
    assert_eq!(c_t, t2.challenge());
  }
}
