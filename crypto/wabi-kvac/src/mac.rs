//! The algebraic MAC itself (§4.5): coordinator key generation, the public
//! parameters `(Cw, I)` derived from it, and `Mac::compute`. Attribute
//! commitments (`Ma`, the vsize equivalent) are Pedersen commitments under a
//! per-attribute value generator and the shared blinding generator `Gh`.

use rand_core::{CryptoRng, RngCore};

use wabi_group::{GroupElement, Generators, Scalar, ScalarVector};

/// The coordinator's long-term secret key. `w`/`w'` blind the MAC's fixed part; `x0`/`x1` bind
/// the per-credential serial scalar `t`; `ya`/`ys` are the amount/vsize attribute coefficients;
/// `yv` is the coefficient of the implicit, always-present constant attribute fixed at `Gv`.
#[derive(Clone, Debug)]
pub struct CoordinatorSecretKey {
  pub w: Scalar,
  pub wp: Scalar,
  pub x0: Scalar,
  pub x1: Scalar,
  pub ya: Scalar,
  pub ys: Scalar,
  pub yv: Scalar,
}

impl CoordinatorSecretKey {
  pub fn generate(rng: &mut (impl RngCore + CryptoRng)) -> Self {
    CoordinatorSecretKey {
      w: Scalar::random_nonzero(rng),
      wp: Scalar::random_nonzero(rng),
      x0: Scalar::random_nonzero(rng),
      x1: Scalar::random_nonzero(rng),
      ya: Scalar::random_nonzero(rng),
      ys: Scalar::random_nonzero(rng),
      yv: Scalar::random_nonzero(rng),
    }
  }

  /// The witness vector in the fixed order every issuance statement's equations are built
  /// against: `(w, w', x0, x1, ya, ys, yv)`.
  pub fn witness(&self) -> ScalarVector {
    ScalarVector(vec![self.w, self.wp, self.x0, self.x1, self.ya, self.ys, self.yv])
  }

  pub fn parameters(&self, gens: &Generators) -> CoordinatorParameters {
    let cw = gens.g_w.mul(&self.w).add(&gens.g_wp.mul(&self.wp));
    let i = gens
      .g_v
      .add(&gens.g_x0.mul(&self.x0).negate())
      .add(&gens.g_x1.mul(&self.x1).negate())
      .add(&gens.g_a.mul(&self.ya).negate())
      .add(&gens.g_s.mul(&self.ys).negate())
      .add(&gens.g_v.mul(&self.yv).negate());
    CoordinatorParameters { cw, i }
  }
}

/// The public parameters every client needs: `Cw` for the issuance proof, `I` for both issuance
/// and show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoordinatorParameters {
  pub cw: GroupElement,
  pub i: GroupElement,
}

/// A MAC over a pair of attribute commitments: the per-credential serial scalar `t` and the
/// resulting tag `V`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mac {
  pub t: Scalar,
  pub v: GroupElement,
}

impl Mac {
  /// Draws a fresh serial scalar `t` and computes `V = w·Gw + x0·U + x1·t·U + ya·Ma + ys·Ms +
  /// yv·Gv` over the given attribute commitments.
  pub fn compute(
    sk: &CoordinatorSecretKey,
    gens: &Generators,
    amount_commitment: &GroupElement,
    vsize_commitment: &GroupElement,
    rng: &mut (impl RngCore + CryptoRng),
  ) -> Self {
    let t = Scalar::random_nonzero(rng);
    let v = gens
      .g_w
      .mul(&sk.w)
      .add(&gens.u.mul(&sk.x0))
      .add(&gens.u.mul(&sk.x1.mul(&t)))
      .add(&amount_commitment.mul(&sk.ya))
      .add(&vsize_commitment.mul(&sk.ys))
      .add(&gens.g_v.mul(&sk.yv));
    Mac { t, v }
  }
}

/// Commits a scalar attribute value under its own value generator, blinded by the shared `Gh`.
/// Returns the commitment and the randomness used, which the caller must retain: it is needed
/// again both to reissue the attribute and to prove the range/balance statements over it.
pub fn commit_attribute(
  value: &Scalar,
  value_generator: &GroupElement,
  gens: &Generators,
  rng: &mut (impl RngCore + CryptoRng),
) -> (GroupElement, Scalar) {
  let r = Scalar::random_nonzero(rng);
  (value_generator.mul(value).add(&gens.g_h.mul(&r)), r)
}

/// A credential as held by a client: the plaintext attribute values and their commitment
/// randomness, plus the MAC the coordinator issued over the commitments. `amount_commitment`/
/// `vsize_commitment` are kept alongside the MAC since both the show and balance proofs need to
/// re-derive blinded versions of them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
  pub amount: u64,
  pub vsize: u64,
  pub randomness_a: Scalar,
  pub randomness_v: Scalar,
  pub amount_commitment: GroupElement,
  pub vsize_commitment: GroupElement,
  pub mac: Mac,
}
