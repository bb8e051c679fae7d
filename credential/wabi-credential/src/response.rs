//! `HandleResponse` (§4.6): verifies the coordinator's issuance proofs against the same shared
//! transcript the request was built over, then materializes one `Credential` per pending
//! commitment from the plaintext state `CreateRequest` retained and the MAC the coordinator sent
//! back.

use tracing::{instrument, warn};

use wabi_group::Generators;
use wabi_kvac::{issuance, CoordinatorParameters, Credential, Mac};
use wabi_transcript::WabiTranscript;

use crate::request::PendingCredential;
use crate::wire::CredentialsResponse;
use crate::CredentialError;

#[derive(Clone, Debug)]
pub struct HandleResponseOutput {
  pub credentials: Vec<Credential>,
}

fn transcript_for(operation: &str, count: usize, is_null: bool) -> WabiTranscript {
  WabiTranscript::new(format!("{operation}/{count}/{is_null}").as_bytes())
}

/// Verifies `response` against `pending` (the state `CreateRequestForZeroAmount`/`CreateRequest`
/// returned) and, on success, returns the freshly issued credentials in the same order `pending`
/// was built in. `is_null` must match what the corresponding request call used to label its
/// transcript.
#[instrument(level = "debug", skip(gens, params, pending, response), fields(requested = pending.len()))]
pub fn handle_response(
  gens: &Generators,
  params: &CoordinatorParameters,
  pending: &[PendingCredential],
  response: CredentialsResponse,
  is_null: bool,
) -> Result<HandleResponseOutput, CredentialError> {
  if response.issued.len() != pending.len() || response.proof.len() != pending.len() {
    warn!(issued = response.issued.len(), requested = pending.len(), "issuance count mismatch");
    return Err(CredentialError::IssuedCredentialNumberMismatch {
      issued: response.issued.len(),
      requested: pending.len(),
    });
  }

  let operation = if is_null { "CreateRequestForZeroAmount" } else { "CreateRequest" };
  let mut transcript = transcript_for(operation, pending.len(), is_null);

  let mut credentials = Vec::with_capacity(pending.len());
  for ((slot, mac), proof) in pending.iter().zip(response.issued.iter()).zip(response.proof.iter()) {
    let statement =
      issuance::build_statement(gens, params, &slot.amount_commitment, &slot.vsize_commitment, mac)
        .map_err(CredentialError::Kvac)?;
    let ok = issuance::verify(&statement, proof, &mut transcript).map_err(CredentialError::Kvac)?;
    if !ok {
      warn!("issuance proof failed verification");
      return Err(CredentialError::Kvac(wabi_kvac::KvacError::InvalidIssuanceProof));
    }
    credentials.push(Credential {
      amount: slot.amount,
      vsize: slot.vsize,
      randomness_a: slot.randomness_a,
      randomness_v: slot.randomness_v,
      amount_commitment: slot.amount_commitment,
      vsize_commitment: slot.vsize_commitment,
      mac: *mac,
    });
  }

  Ok(HandleResponseOutput { credentials })
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand_core::OsRng;
  use wabi_kvac::CoordinatorSecretKey;

  use crate::request::create_request_for_zero_amount;
  use crate::wire::CredentialsResponse;

  #[test]
  fn zero_round_trip_issues_matching_credentials() {
    let gens = Generators::new();
    let sk = CoordinatorSecretKey::generate(&mut OsRng);
    let params = sk.parameters(&gens);

    let output = create_request_for_zero_amount(&gens, 2, &mut OsRng).unwrap();

    let mut issuer_transcript = transcript_for("CreateRequestForZeroAmount", 2, true);
    let mut issued = Vec::new();
    let mut proofs = Vec::new();
    for pending in &output.pending {
      let mac = Mac::compute(&sk, &gens, &pending.amount_commitment, &pending.vsize_commitment, &mut OsRng);
      let statement =
        issuance::build_statement(&gens, &params, &pending.amount_commitment, &pending.vsize_commitment, &mac).unwrap();
      let proof = issuance::prove(&sk, &statement, &mut issuer_transcript, &mut OsRng).unwrap();
      issued.push(mac);
      proofs.push(proof);
    }

    let response = CredentialsResponse { issued, proof: proofs };
    let result = handle_response(&gens, &params, &output.pending, response, true).unwrap();
    assert_eq!(result.credentials.len(), 2);
  }

  #[test]
  fn mismatched_issued_count_is_rejected() {
    let gens = Generators::new();
    let sk = CoordinatorSecretKey::generate(&mut OsRng);
    let params = sk.parameters(&gens);

    let output = create_request_for_zero_amount(&gens, 2, &mut OsRng).unwrap();
    let response = CredentialsResponse { issued: Vec::new(), proof: Vec::new() };
    let err = handle_response(&gens, &params, &output.pending, response, true).unwrap_err();
    assert!(matches!(err, CredentialError::IssuedCredentialNumberMismatch { issued: 0, requested: 2 }));
  }
}
