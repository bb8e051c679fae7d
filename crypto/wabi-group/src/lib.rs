//! Scalar and group-element arithmetic for the WabiSabi credential core,
//! plus derivation of the fixed generator family every other crate in this
//! workspace builds its statements over.
//!
//! The group is secp256k1, exposed through `k256`/`group`/`ff` the same way
//! `frost::curve::kp256` wires up its `secp256k1` feature. Everything here is
//! a thin newtype layer: the point of the layer is the canonical-encoding and
//! constant-time-comparison discipline the credential scheme depends on, not
//! a new algebra.

use core::{
  fmt,
  ops::{Add, Mul, Neg, Sub},
};

use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

use elliptic_curve::ops::Reduce;
use group::{ff::Field, ff::PrimeField, Group, GroupEncoding};
use k256::{AffinePoint, ProjectivePoint, U256};

mod generators;
pub use generators::Generators;

#[derive(Clone, Copy, Debug, thiserror::Error, PartialEq, Eq)]
pub enum GroupError {
  #[error("scalar bytes do not reduce to a canonical element (overflow)")]
  ScalarOverflow,
  #[error("point bytes do not decode to a valid curve point")]
  InvalidPoint,
  #[error("point is the identity where a non-infinity point is required")]
  UnexpectedInfinity,
  #[error("expected {0} bytes, got {1}")]
  InvalidLength(usize, usize),
}

/// An element of `Z/qZ`, `q` the order of the secp256k1 group.
///
/// Wraps `k256::Scalar`; every constructor that can fail (from untrusted
/// bytes) rejects values `>= q` rather than silently reducing them, per the
/// data model's `is-overflow` requirement.
#[derive(Clone, Copy, Default, Zeroize)]
pub struct Scalar(pub(crate) k256::Scalar);

impl fmt::Debug for Scalar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Scalar({})", hex::encode(self.to_bytes()))
  }
}

impl ConstantTimeEq for Scalar {
  fn ct_eq(&self, other: &Self) -> Choice {
    self.0.to_bytes().ct_eq(&other.0.to_bytes())
  }
}

impl PartialEq for Scalar {
  fn eq(&self, other: &Self) -> bool {
    bool::from(self.ct_eq(other))
  }
}
impl Eq for Scalar {}

impl Scalar {
  pub fn zero() -> Self {
    Scalar(k256::Scalar::zero())
  }

  pub fn one() -> Self {
    Scalar(k256::Scalar::one())
  }

  pub fn random(rng: &mut (impl RngCore + CryptoRng)) -> Self {
    Scalar(k256::Scalar::random(rng))
  }

  /// Samples a non-zero scalar, resampling on the (negligible-probability) zero case. Several
  /// MAC/proof operations require a non-zero nonce or blinding factor.
  pub fn random_nonzero(rng: &mut (impl RngCore + CryptoRng)) -> Self {
    loop {
      let s = Self::random(rng);
      if !s.is_zero() {
        return s;
      }
    }
  }

  pub fn is_zero(&self) -> bool {
    bool::from(self.0.is_zero())
  }

  pub fn add(&self, other: &Self) -> Self {
    Scalar(self.0 + other.0)
  }

  pub fn sub(&self, other: &Self) -> Self {
    Scalar(self.0 - other.0)
  }

  pub fn mul(&self, other: &Self) -> Self {
    Scalar(self.0 * other.0)
  }

  pub fn negate(&self) -> Self {
    Scalar(-self.0)
  }

  /// `None` iff `self` is zero.
  pub fn invert(&self) -> Option<Self> {
    let inv = self.0.invert();
    if bool::from(inv.is_some()) {
      Some(Scalar(inv.unwrap()))
    } else {
      None
    }
  }

  /// Big-endian, rejecting values that do not canonically reduce mod `q`.
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, GroupError> {
    let arr: [u8; 32] = bytes.try_into().map_err(|_| GroupError::InvalidLength(32, bytes.len()))?;
    let repr = k256::FieldBytes::from(arr);
    let scalar = k256::Scalar::from_repr(repr);
    if bool::from(scalar.is_some()) {
      Ok(Scalar(scalar.unwrap()))
    } else {
      Err(GroupError::ScalarOverflow)
    }
  }

  /// Reduces arbitrary bytes mod `q`; used only for deriving non-secret, domain-separated
  /// challenge/nonce material, never for parsing untrusted wire scalars.
  pub fn from_bytes_mod_order_wide(bytes: &[u8]) -> Self {
    let u256 = U256::from_be_slice(&{
      let mut padded = vec![0u8; 64usize.saturating_sub(bytes.len())];
      padded.extend_from_slice(bytes);
      padded
    });
    Scalar(k256::Scalar::reduce(u256))
  }

  pub fn to_bytes(&self) -> [u8; 32] {
    self.0.to_bytes().into()
  }
}

impl Add for Scalar {
  type Output = Scalar;
  fn add(self, rhs: Self) -> Self {
    Scalar::add(&self, &rhs)
  }
}
impl Sub for Scalar {
  type Output = Scalar;
  fn sub(self, rhs: Self) -> Self {
    Scalar::sub(&self, &rhs)
  }
}
impl Mul for Scalar {
  type Output = Scalar;
  fn mul(self, rhs: Self) -> Self {
    Scalar::mul(&self, &rhs)
  }
}
impl Neg for Scalar {
  type Output = Scalar;
  fn neg(self) -> Self {
    Scalar::negate(&self)
  }
}

/// A point in the secp256k1 group, including the distinguished infinity element.
#[derive(Clone, Copy)]
pub struct GroupElement(pub(crate) ProjectivePoint);

impl fmt::Debug for GroupElement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_infinity() {
      write!(f, "GroupElement(infinity)")
    } else {
      write!(f, "GroupElement({})", hex::encode(self.to_bytes()))
    }
  }
}

impl PartialEq for GroupElement {
  fn eq(&self, other: &Self) -> bool {
    // Equality by canonical encoding, per the data model.
    self.to_bytes() == other.to_bytes()
  }
}
impl Eq for GroupElement {}

impl GroupElement {
  pub fn identity() -> Self {
    GroupElement(ProjectivePoint::identity())
  }

  pub fn generator() -> Self {
    GroupElement(ProjectivePoint::generator())
  }

  pub fn is_infinity(&self) -> bool {
    bool::from(self.0.is_identity())
  }

  pub fn add(&self, other: &Self) -> Self {
    GroupElement(self.0 + other.0)
  }

  pub fn negate(&self) -> Self {
    GroupElement(-self.0)
  }

  pub fn mul(&self, scalar: &Scalar) -> Self {
    GroupElement(self.0 * scalar.0)
  }

  /// SEC1 compressed encoding, 33 bytes.
  pub fn to_bytes(&self) -> [u8; 33] {
    let bytes = self.0.to_affine().to_bytes();
    let mut out = [0u8; 33];
    out.copy_from_slice(bytes.as_slice());
    out
  }

  pub fn from_bytes(bytes: &[u8]) -> Result<Self, GroupError> {
    let arr: [u8; 33] = bytes.try_into().map_err(|_| GroupError::InvalidLength(33, bytes.len()))?;
    let point = AffinePoint::from_bytes((&arr).into());
    if bool::from(point.is_none()) {
      return Err(GroupError::InvalidPoint);
    }
    Ok(GroupElement(ProjectivePoint::from(point.unwrap())))
  }

  /// Same as `from_bytes`, but additionally rejects the identity. Every point committed to a
  /// transcript must pass through this, per the data model's invariant that no public point
  /// committed to a transcript may be infinity.
  pub fn from_bytes_non_infinity(bytes: &[u8]) -> Result<Self, GroupError> {
    let point = Self::from_bytes(bytes)?;
    if point.is_infinity() {
      return Err(GroupError::UnexpectedInfinity);
    }
    Ok(point)
  }
}

impl Add for GroupElement {
  type Output = GroupElement;
  fn add(self, rhs: Self) -> Self {
    GroupElement::add(&self, &rhs)
  }
}
impl Neg for GroupElement {
  type Output = GroupElement;
  fn neg(self) -> Self {
    GroupElement::negate(&self)
  }
}
impl Mul<Scalar> for GroupElement {
  type Output = GroupElement;
  fn mul(self, rhs: Scalar) -> Self {
    GroupElement::mul(&self, &rhs)
  }
}

/// An ordered sequence of scalars.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScalarVector(pub Vec<Scalar>);

impl ScalarVector {
  pub fn new(len: usize) -> Self {
    ScalarVector(vec![Scalar::zero(); len])
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

/// An ordered sequence of group elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupElementVector(pub Vec<GroupElement>);

impl GroupElementVector {
  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// `sum(scalars[i] * self[i])`. Infinity generators contribute zero, matching the statement
  /// matrix's convention that an infinity entry excludes that witness component from the
  /// equation.
  pub fn inner_product(&self, scalars: &ScalarVector) -> Result<GroupElement, GroupError> {
    if self.len() != scalars.len() {
      return Err(GroupError::InvalidLength(self.len(), scalars.len()));
    }
    let mut acc = ProjectivePoint::identity();
    for (g, s) in self.0.iter().zip(scalars.0.iter()) {
      if g.is_infinity() {
        continue;
      }
      acc += g.0 * s.0;
    }
    Ok(GroupElement(acc))
  }
}

/// Hashes an arbitrary domain-separated label into a field element; used for deriving
/// non-secret scalars (e.g. challenge reduction) outside the transcript's own PRF.
pub fn hash_label_to_scalar(label: &[u8]) -> Scalar {
  let digest = Sha256::digest(label);
  Scalar::from_bytes_mod_order_wide(&digest)
}
