//! Big-endian, length-prefixed encode/decode for the group elements, scalars, and proof trees
//! that make up the wire messages in the parent module. Mirrors
//! `frost::MultisigKeys::serialize`/`deserialize`'s explicit-cursor style rather than deriving
//! through `serde`, since `GroupElement`/`Scalar` intentionally stay outside `serde`'s blanket
//! (§6: fixed 33/32-byte canonical encodings, not whatever a derive would produce).

use wabi_group::{GroupElement, GroupElementVector, Scalar, ScalarVector};
use wabi_sigma::{AndProof, ConjunctProof, LeafProof, OrProof};

use crate::CredentialError;

pub fn write_u32(buf: &mut Vec<u8>, n: usize) {
  buf.extend_from_slice(&(u32::try_from(n).expect("length exceeds u32")).to_be_bytes());
}

pub fn read_u32(cursor: &mut &[u8]) -> Result<usize, CredentialError> {
  if cursor.len() < 4 {
    return Err(CredentialError::Malformed("truncated length prefix"));
  }
  let (head, rest) = cursor.split_at(4);
  *cursor = rest;
  Ok(u32::from_be_bytes(head.try_into().unwrap()) as usize)
}

pub fn write_point(buf: &mut Vec<u8>, point: &GroupElement) {
  buf.extend_from_slice(&point.to_bytes());
}

pub fn read_point(cursor: &mut &[u8]) -> Result<GroupElement, CredentialError> {
  if cursor.len() < 33 {
    return Err(CredentialError::Malformed("truncated point"));
  }
  let (head, rest) = cursor.split_at(33);
  *cursor = rest;
  GroupElement::from_bytes(head).map_err(|_| CredentialError::Malformed("invalid point encoding"))
}

pub fn write_scalar(buf: &mut Vec<u8>, scalar: &Scalar) {
  buf.extend_from_slice(&scalar.to_bytes());
}

pub fn read_scalar(cursor: &mut &[u8]) -> Result<Scalar, CredentialError> {
  if cursor.len() < 32 {
    return Err(CredentialError::Malformed("truncated scalar"));
  }
  let (head, rest) = cursor.split_at(32);
  *cursor = rest;
  Scalar::from_bytes(head).map_err(|_| CredentialError::Malformed("invalid scalar encoding"))
}

pub fn write_points(buf: &mut Vec<u8>, points: &[GroupElement]) {
  write_u32(buf, points.len());
  for point in points {
    write_point(buf, point);
  }
}

pub fn read_points(cursor: &mut &[u8]) -> Result<Vec<GroupElement>, CredentialError> {
  let len = read_u32(cursor)?;
  (0 .. len).map(|_| read_point(cursor)).collect()
}

pub fn write_scalar_vector(buf: &mut Vec<u8>, vector: &ScalarVector) {
  write_u32(buf, vector.len());
  for scalar in &vector.0 {
    write_scalar(buf, scalar);
  }
}

pub fn read_scalar_vector(cursor: &mut &[u8]) -> Result<ScalarVector, CredentialError> {
  let len = read_u32(cursor)?;
  let mut out = Vec::with_capacity(len);
  for _ in 0 .. len {
    out.push(read_scalar(cursor)?);
  }
  Ok(ScalarVector(out))
}

pub fn write_leaf_proof(buf: &mut Vec<u8>, proof: &LeafProof) {
  write_points(buf, &proof.nonces.0);
  write_u32(buf, proof.responses.len());
  for row in &proof.responses {
    write_scalar_vector(buf, row);
  }
}

pub fn read_leaf_proof(cursor: &mut &[u8]) -> Result<LeafProof, CredentialError> {
  let nonces = GroupElementVector(read_points(cursor)?);
  let rows = read_u32(cursor)?;
  let mut responses = Vec::with_capacity(rows);
  for _ in 0 .. rows {
    responses.push(read_scalar_vector(cursor)?);
  }
  Ok(LeafProof { nonces, responses })
}

pub fn write_or_proof(buf: &mut Vec<u8>, proof: &OrProof) {
  write_u32(buf, proof.nonces.len());
  for alt in &proof.nonces {
    write_points(buf, &alt.0);
  }
  write_u32(buf, proof.responses.len());
  for alt in &proof.responses {
    write_u32(buf, alt.len());
    for row in alt {
      write_scalar_vector(buf, row);
    }
  }
}

pub fn read_or_proof(cursor: &mut &[u8]) -> Result<OrProof, CredentialError> {
  let alt_count = read_u32(cursor)?;
  let mut nonces = Vec::with_capacity(alt_count);
  for _ in 0 .. alt_count {
    nonces.push(GroupElementVector(read_points(cursor)?));
  }
  let response_alt_count = read_u32(cursor)?;
  let mut responses = Vec::with_capacity(response_alt_count);
  for _ in 0 .. response_alt_count {
    let rows = read_u32(cursor)?;
    let mut alt = Vec::with_capacity(rows);
    for _ in 0 .. rows {
      alt.push(read_scalar_vector(cursor)?);
    }
    responses.push(alt);
  }
  Ok(OrProof { nonces, responses })
}

pub fn write_and_proof(buf: &mut Vec<u8>, proof: &AndProof) {
  write_u32(buf, proof.parts.len());
  for part in &proof.parts {
    match part {
      ConjunctProof::Leaf(leaf) => {
        buf.push(0);
        write_leaf_proof(buf, leaf);
      }
      ConjunctProof::Or(or) => {
        buf.push(1);
        write_or_proof(buf, or);
      }
    }
  }
}

pub fn read_and_proof(cursor: &mut &[u8]) -> Result<AndProof, CredentialError> {
  let len = read_u32(cursor)?;
  let mut parts = Vec::with_capacity(len);
  for _ in 0 .. len {
    if cursor.is_empty() {
      return Err(CredentialError::Malformed("truncated conjunct tag"));
    }
    let tag = cursor[0];
    *cursor = &cursor[1 ..];
    parts.push(match tag {
      0 => ConjunctProof::Leaf(read_leaf_proof(cursor)?),
      1 => ConjunctProof::Or(read_or_proof(cursor)?),
      _ => return Err(CredentialError::Malformed("unknown conjunct proof tag")),
    });
  }
  Ok(AndProof { parts })
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand_core::OsRng;

  #[test]
  fn point_round_trips() {
    let point = GroupElement::generator();
    let mut buf = Vec::new();
    write_point(&mut buf, &point);
    let mut cursor = buf.as_slice();
    assert_eq!(read_point(&mut cursor).unwrap(), point);
    assert!(cursor.is_empty());
  }

  #[test]
  fn scalar_vector_round_trips() {
    let vector = ScalarVector(vec![Scalar::random_nonzero(&mut OsRng), Scalar::random_nonzero(&mut OsRng)]);
    let mut buf = Vec::new();
    write_scalar_vector(&mut buf, &vector);
    let mut cursor = buf.as_slice();
    assert_eq!(read_scalar_vector(&mut cursor).unwrap(), vector);
  }

  #[test]
  fn truncated_point_is_malformed() {
    let buf = vec![0u8; 10];
    let mut cursor = buf.as_slice();
    assert!(matches!(read_point(&mut cursor), Err(CredentialError::Malformed(_))));
  }
}
