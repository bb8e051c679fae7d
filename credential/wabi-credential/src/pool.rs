//! A small owned collection of credentials held between rounds (§3's
//! "Lifecycles": a credential is created on response, consumed on its next
//! presentation). Not named directly in §4.6, but implied by it — the
//! runtime (C8) needs somewhere to draw presentable credentials from and
//! deposit freshly issued ones, the same way `frost::MultisigKeys` is a
//! plain owned struct produced by one phase and consumed by the next.

use wabi_kvac::Credential;

use crate::CredentialError;

/// Owns a set of not-yet-presented credentials. `take_for_presentation` removes the credential
/// it returns, so a caller cannot accidentally hand the same one to two different presentations
/// — the client-side mirror of the coordinator's duplicate-MAC check.
#[derive(Clone, Debug, Default)]
pub struct CredentialPool(Vec<Credential>);

impl CredentialPool {
  pub fn new() -> Self {
    CredentialPool(Vec::new())
  }

  pub fn insert(&mut self, credential: Credential) {
    self.0.push(credential);
  }

  pub fn insert_many(&mut self, credentials: impl IntoIterator<Item = Credential>) {
    self.0.extend(credentials);
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Removes and returns the credential at `index`.
  pub fn take_for_presentation(&mut self, index: usize) -> Result<Credential, CredentialError> {
    if index >= self.0.len() {
      return Err(CredentialError::CredentialIndexOutOfRange(index));
    }
    Ok(self.0.remove(index))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand_core::OsRng;
  use wabi_group::Generators;
  use wabi_kvac::{mac::commit_attribute, scalar_from_u64, CoordinatorSecretKey, Mac};

  fn sample_credential() -> Credential {
    let gens = Generators::new();
    let sk = CoordinatorSecretKey::generate(&mut OsRng);
    let (amount_commitment, randomness_a) = commit_attribute(&scalar_from_u64(1), &gens.g_a, &gens, &mut OsRng);
    let (vsize_commitment, randomness_v) = commit_attribute(&scalar_from_u64(1), &gens.g_s, &gens, &mut OsRng);
    let mac = Mac::compute(&sk, &gens, &amount_commitment, &vsize_commitment, &mut OsRng);
    Credential { amount: 1, vsize: 1, randomness_a, randomness_v, amount_commitment, vsize_commitment, mac }
  }

  #[test]
  fn take_for_presentation_removes_the_credential() {
    let mut pool = CredentialPool::new();
    pool.insert(sample_credential());
    assert_eq!(pool.len(), 1);
    pool.take_for_presentation(0).unwrap();
    assert!(pool.is_empty());
  }

  #[test]
  fn take_for_presentation_rejects_out_of_range_index() {
    let mut pool = CredentialPool::new();
    pool.insert(sample_credential());
    assert!(matches!(pool.take_for_presentation(5), Err(CredentialError::CredentialIndexOutOfRange(5))));
  }
}
