//! `RequestHandler` (§6): the collaborator seam a vertex task calls through to reach the
//! coordinator. One method per wire message, each returning either a response or an opaque
//! protocol/network error — the runtime never inspects the error's contents, only propagates it
//! as `RuntimeError::Collaborator`.

use async_trait::async_trait;

use wabi_credential::wire::{ConnectionConfirmation, CredentialsResponse, InputRegistration, OutputRegistration, Reissuance};

/// `?Send`: the runtime drives every vertex task on a single-threaded `LocalSet` (§5's
/// "single-threaded cooperative concurrency"), so implementations are free to hold non-`Send`
/// state (e.g. an `Rc<RefCell<_>>`-shared connection) without fighting the executor.
#[async_trait(?Send)]
pub trait RequestHandler {
  type Error: std::error::Error + 'static;

  async fn register_input(&self, request: InputRegistration) -> Result<CredentialsResponse, Self::Error>;

  async fn confirm_connection(&self, confirmation: ConnectionConfirmation) -> Result<CredentialsResponse, Self::Error>;

  async fn reissue(&self, request: Reissuance) -> Result<CredentialsResponse, Self::Error>;

  /// Output registration is terminal (§4.8: "no outputs"): the coordinator either accepts the
  /// request or rejects it, and issues nothing back.
  async fn register_output(&self, request: OutputRegistration) -> Result<(), Self::Error>;
}
