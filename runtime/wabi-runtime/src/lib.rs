//! The graph execution runtime (§4.8/§5): drives a `wabi_graph::ResolvedGraph` to completion by
//! spawning one task per vertex on a single-threaded `LocalSet`, each awaiting its in-edges'
//! single-shot cells, issuing exactly one collaborator request, and fulfilling its out-edges'
//! cells from the response — mirroring `serai-processor`'s choice of `async-trait` + `tokio` for
//! driving a multi-party protocol state machine, scaled down to this round's single DAG.

pub mod cell;
pub mod error;
pub mod handler;

pub use error::RuntimeError;
pub use handler::RequestHandler;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use rand_core::{CryptoRng, RngCore};
use tokio::task::LocalSet;
use tokio_util::sync::CancellationToken;
use tracing::{info_span, Instrument};

use wabi_credential::request::{create_request, create_request_for_zero_amount};
use wabi_credential::response::handle_response;
use wabi_credential::wire::{ConnectionConfirmation, InputRegistration, OutputRegistration, Reissuance, RoundParticipant};
use wabi_graph::{EdgeId, ResolvedGraph, VertexId, VertexKind};
use wabi_group::Generators;
use wabi_kvac::{Credential, CoordinatorParameters};

use cell::{edge_cell, EdgeReceiver, EdgeSender};

/// Per-round configuration: identifiers stamped onto every wire envelope, and the deadline every
/// vertex's single collaborator request must complete within.
#[derive(Clone, Copy, Debug)]
pub struct RoundConfig {
  pub round_id: u64,
  pub participant_id: u16,
  pub deadline: Duration,
}

/// Credential-type index 0 (amount) / 1 (vsize); the runtime is the layer where the otherwise
/// type-count-generic `wabi_graph::Graph` is pinned to the two concrete KVAC attributes.
const AMOUNT_TYPE: usize = 0;
const VSIZE_TYPE: usize = 1;

fn pad_to_k(mut values: Vec<u64>, k: usize) -> Vec<u64> {
  values.resize(k, 0);
  values
}

/// Drives every vertex of `graph` to completion, reporting `RuntimeError::DeadlineElapsed` if any
/// single vertex's collaborator exchange overruns `config.deadline`, and stopping early if
/// `cancellation` fires. Cancellation drops every outstanding edge cell; tasks still waiting on
/// one observe `RuntimeError::EdgeNotFulfilled` rather than a credential.
pub async fn run_round<H, R>(
  graph: &ResolvedGraph,
  handler: Rc<H>,
  gens: Rc<Generators>,
  params: Rc<CoordinatorParameters>,
  rng: Rc<RefCell<R>>,
  config: RoundConfig,
  cancellation: CancellationToken,
) -> Result<(), RuntimeError>
where
  H: RequestHandler + 'static,
  H::Error: 'static,
  R: RngCore + CryptoRng + 'static,
{
  let local = LocalSet::new();
  local.run_until(run_round_inner(graph, handler, gens, params, rng, config, cancellation)).await
}

async fn run_round_inner<H, R>(
  graph: &ResolvedGraph,
  handler: Rc<H>,
  gens: Rc<Generators>,
  params: Rc<CoordinatorParameters>,
  rng: Rc<RefCell<R>>,
  config: RoundConfig,
  cancellation: CancellationToken,
) -> Result<(), RuntimeError>
where
  H: RequestHandler + 'static,
  H::Error: 'static,
  R: RngCore + CryptoRng + 'static,
{
  let k = graph.k();

  // One cell per edge; the source task holds the sender, the sink task the receiver.
  let mut senders: HashMap<EdgeId, EdgeSender> = HashMap::new();
  let mut receivers_by_vertex: HashMap<VertexId, Vec<(EdgeId, EdgeReceiver)>> = HashMap::new();
  let mut out_edges_by_vertex: HashMap<VertexId, Vec<EdgeId>> = HashMap::new();

  for edge in graph.edges() {
    let (tx, rx) = edge_cell();
    senders.insert(edge.id, tx);
    receivers_by_vertex.entry(edge.to).or_default().push((edge.id, rx));
    out_edges_by_vertex.entry(edge.from).or_default().push(edge.id);
  }

  let mut join_handles = Vec::new();

  for vertex in graph.vertices() {
    let id = vertex.id;
    let kind = vertex.kind;
    let in_edges = receivers_by_vertex.remove(&id).unwrap_or_default();
    let out_edge_ids = out_edges_by_vertex.remove(&id).unwrap_or_default();
    let out_amounts: Vec<(u64, u64)> = out_edge_ids
      .iter()
      .map(|eid| {
        let edge = graph.edge(*eid);
        (edge.amounts[AMOUNT_TYPE], edge.amounts[VSIZE_TYPE])
      })
      .collect();
    let mut out_senders: Vec<EdgeSender> = out_edge_ids.iter().map(|eid| senders.remove(eid).unwrap()).collect();

    let handler = handler.clone();
    let gens = gens.clone();
    let params = params.clone();
    let rng = rng.clone();
    let cancellation = cancellation.clone();
    let deadline = config.deadline;
    let round = RoundParticipant { round_id: config.round_id, participant_id: config.participant_id };

    let span = info_span!("vertex", id = id.0, kind = ?kind);
    let task = async move {
      let body = async {
        match kind {
          VertexKind::Input => run_input_vertex(&handler, &gens, &params, &rng, round, k, &out_amounts).await,
          VertexKind::Output => {
            let presented = gather(in_edges).await?;
            run_output_vertex(&handler, &gens, &params, round, presented).await?;
            Ok(Vec::new())
          }
          VertexKind::Reissuance => {
            let presented = gather(in_edges).await?;
            run_reissuance_vertex(&handler, &gens, &params, &rng, round, k, &out_amounts, presented).await
          }
        }
      };

      let result: Result<Vec<Credential>, RuntimeError> = tokio::select! {
        _ = cancellation.cancelled() => Err(RuntimeError::Cancelled),
        result = tokio::time::timeout(deadline, body) => result.map_err(|_| RuntimeError::DeadlineElapsed).and_then(|inner| inner),
      };

      let credentials = result?;
      for (sender, credential) in out_senders.drain(..).zip(credentials.into_iter()) {
        sender.fulfill(credential);
      }
      Ok::<(), RuntimeError>(())
    }
    .instrument(span);

    join_handles.push(tokio::task::spawn_local(task));
  }

  for handle in join_handles {
    handle.await.expect("vertex task panicked")?;
  }

  Ok(())
}

async fn gather(in_edges: Vec<(EdgeId, EdgeReceiver)>) -> Result<Vec<Credential>, RuntimeError> {
  let mut credentials = Vec::with_capacity(in_edges.len());
  for (_, receiver) in in_edges {
    credentials.push(receiver.await_credential().await?);
  }
  Ok(credentials)
}

async fn run_input_vertex<H, R>(
  handler: &H,
  gens: &Generators,
  params: &CoordinatorParameters,
  rng: &Rc<RefCell<R>>,
  round: RoundParticipant,
  k: usize,
  out_amounts: &[(u64, u64)],
) -> Result<Vec<Credential>, RuntimeError>
where
  H: RequestHandler,
  R: RngCore + CryptoRng,
{
  let zero_output = {
    let mut rng = rng.borrow_mut();
    create_request_for_zero_amount(gens, k, &mut *rng).map_err(RuntimeError::Credential)?
  };
  let response = handler
    .register_input(InputRegistration { id: round, zero_request: zero_output.message })
    .await
    .map_err(|e| RuntimeError::Collaborator(Box::new(e)))?;
  let placeholders = handle_response(gens, params, &zero_output.pending, response, true)?.credentials;

  let total_amount: u64 = out_amounts.iter().map(|(a, _)| a).sum();
  let amounts = pad_to_k(out_amounts.iter().map(|(a, _)| *a).collect(), k);
  let vsizes = pad_to_k(out_amounts.iter().map(|(_, v)| *v).collect(), k);

  // The placeholders presented here carry no amount (`create_request_for_zero_amount`), so
  // `public_difference`'s Σpresented_a − Σrequested_a is `0 − total_amount`.
  let real_output = {
    let mut rng = rng.borrow_mut();
    create_request(gens, params, placeholders, &amounts, &vsizes, -(total_amount as i64), &mut *rng)?
  };
  let response = handler
    .confirm_connection(ConnectionConfirmation { id: round, request: real_output.message })
    .await
    .map_err(|e| RuntimeError::Collaborator(Box::new(e)))?;
  let issued = handle_response(gens, params, &real_output.pending, response, false)?.credentials;

  Ok(issued.into_iter().take(out_amounts.len()).collect())
}

async fn run_reissuance_vertex<H, R>(
  handler: &H,
  gens: &Generators,
  params: &CoordinatorParameters,
  rng: &Rc<RefCell<R>>,
  round: RoundParticipant,
  k: usize,
  out_amounts: &[(u64, u64)],
  presented: Vec<Credential>,
) -> Result<Vec<Credential>, RuntimeError>
where
  H: RequestHandler,
  R: RngCore + CryptoRng,
{
  let amounts = pad_to_k(out_amounts.iter().map(|(a, _)| *a).collect(), k);
  let vsizes = pad_to_k(out_amounts.iter().map(|(_, v)| *v).collect(), k);

  let output = {
    let mut rng = rng.borrow_mut();
    create_request(gens, params, presented, &amounts, &vsizes, 0, &mut *rng)?
  };
  let response = handler
    .reissue(Reissuance { id: round, request: output.message })
    .await
    .map_err(|e| RuntimeError::Collaborator(Box::new(e)))?;
  let issued = handle_response(gens, params, &output.pending, response, false)?.credentials;

  Ok(issued.into_iter().take(out_amounts.len()).collect())
}

async fn run_output_vertex<H>(
  handler: &H,
  gens: &Generators,
  params: &CoordinatorParameters,
  round: RoundParticipant,
  presented: Vec<Credential>,
) -> Result<(), RuntimeError>
where
  H: RequestHandler,
{
  // Nothing is requested here, so `public_difference`'s Σpresented_a − Σrequested_a is
  // `total_amount − 0`.
  let total_amount: u64 = presented.iter().map(|c| c.amount).sum();
  let mut dummy_rng = rand_core::OsRng;
  let output = create_request(gens, params, presented, &[], &[], total_amount as i64, &mut dummy_rng)?;
  handler
    .register_output(OutputRegistration { id: round, request: output.message })
    .await
    .map_err(|e| RuntimeError::Collaborator(Box::new(e)))
}

#[cfg(test)]
mod tests {
  use super::*;

  use async_trait::async_trait;
  use rand_core::OsRng;

  use wabi_credential::wire::CredentialsResponse;
  use wabi_graph::Graph;
  use wabi_group::GroupElement;
  use wabi_kvac::{issuance, CoordinatorSecretKey, Mac};
  use wabi_transcript::WabiTranscript;

  /// Stands in for the coordinator: issues whatever is requested without verifying the client's
  /// own proofs, since exercising `run_round`'s vertex scheduling and edge wiring is the point of
  /// this test, not re-deriving coordinator-side request verification.
  struct MockCoordinator {
    sk: CoordinatorSecretKey,
    gens: Generators,
  }

  #[derive(Debug, thiserror::Error)]
  #[error("mock handler never fails")]
  struct MockHandlerError;

  impl MockCoordinator {
    fn issue(&self, requested: &[(GroupElement, GroupElement)], operation: &str, is_null: bool) -> CredentialsResponse {
      let count = requested.len();
      let mut transcript = WabiTranscript::new(format!("{operation}/{count}/{is_null}").as_bytes());
      let mut issued = Vec::with_capacity(count);
      let mut proof = Vec::with_capacity(count);
      let params = self.sk.parameters(&self.gens);
      for (amount_commitment, vsize_commitment) in requested {
        let mac = Mac::compute(&self.sk, &self.gens, amount_commitment, vsize_commitment, &mut OsRng);
        let statement = issuance::build_statement(&self.gens, &params, amount_commitment, vsize_commitment, &mac).unwrap();
        let p = issuance::prove(&self.sk, &statement, &mut transcript, &mut OsRng).unwrap();
        issued.push(mac);
        proof.push(p);
      }
      CredentialsResponse { issued, proof }
    }
  }

  #[async_trait(?Send)]
  impl RequestHandler for MockCoordinator {
    type Error = MockHandlerError;

    async fn register_input(&self, request: InputRegistration) -> Result<CredentialsResponse, MockHandlerError> {
      let pairs: Vec<_> =
        request.zero_request.requested.iter().map(|ma| (*ma, GroupElement::identity())).collect();
      Ok(self.issue(&pairs, "CreateRequestForZeroAmount", true))
    }

    async fn confirm_connection(&self, confirmation: ConnectionConfirmation) -> Result<CredentialsResponse, MockHandlerError> {
      let pairs: Vec<_> =
        confirmation.request.requested.iter().map(|rc| (rc.amount_commitment, rc.vsize_commitment)).collect();
      Ok(self.issue(&pairs, "CreateRequest", false))
    }

    async fn reissue(&self, request: Reissuance) -> Result<CredentialsResponse, MockHandlerError> {
      let pairs: Vec<_> = request.request.requested.iter().map(|rc| (rc.amount_commitment, rc.vsize_commitment)).collect();
      Ok(self.issue(&pairs, "CreateRequest", false))
    }

    async fn register_output(&self, _request: OutputRegistration) -> Result<(), MockHandlerError> {
      Ok(())
    }
  }

  #[tokio::test]
  async fn run_round_drives_a_single_input_to_output_graph_to_completion() {
    let mut graph = Graph::new(1, 2);
    let input = graph.add_input(vec![10, 3]).unwrap();
    let output = graph.add_output(vec![-10, -3]).unwrap();
    let resolved = graph.resolve().unwrap();
    assert_eq!(resolved.out_edges(input).count(), 1);
    assert_eq!(resolved.in_edges(output).count(), 1);

    let gens = Rc::new(Generators::new());
    let sk = CoordinatorSecretKey::generate(&mut OsRng);
    let params = Rc::new(sk.parameters(&gens));
    let handler = Rc::new(MockCoordinator { sk, gens: (*gens).clone() });
    let rng = Rc::new(RefCell::new(OsRng));
    let config = RoundConfig { round_id: 1, participant_id: 0, deadline: Duration::from_secs(5) };

    let result = run_round(&resolved, handler, gens, params, rng, config, CancellationToken::new()).await;
    assert!(result.is_ok(), "{result:?}");
  }

  #[tokio::test]
  async fn run_round_surfaces_deadline_elapsed_for_an_unresponsive_handler() {
    struct HangingHandler;

    #[derive(Debug, thiserror::Error)]
    #[error("unreachable")]
    struct HangingError;

    #[async_trait(?Send)]
    impl RequestHandler for HangingHandler {
      type Error = HangingError;

      async fn register_input(&self, _request: InputRegistration) -> Result<CredentialsResponse, HangingError> {
        std::future::pending().await
      }
      async fn confirm_connection(&self, _confirmation: ConnectionConfirmation) -> Result<CredentialsResponse, HangingError> {
        std::future::pending().await
      }
      async fn reissue(&self, _request: Reissuance) -> Result<CredentialsResponse, HangingError> {
        std::future::pending().await
      }
      async fn register_output(&self, _request: OutputRegistration) -> Result<(), HangingError> {
        std::future::pending().await
      }
    }

    let mut graph = Graph::new(1, 2);
    graph.add_input(vec![10, 3]).unwrap();
    graph.add_output(vec![-10, -3]).unwrap();
    let resolved = graph.resolve().unwrap();

    let gens = Rc::new(Generators::new());
    let sk = CoordinatorSecretKey::generate(&mut OsRng);
    let params = Rc::new(sk.parameters(&gens));
    let handler = Rc::new(HangingHandler);
    let rng = Rc::new(RefCell::new(OsRng));
    let config = RoundConfig { round_id: 1, participant_id: 0, deadline: Duration::from_millis(10) };

    let result = run_round(&resolved, handler, gens, params, rng, config, CancellationToken::new()).await;
    assert!(matches!(result, Err(RuntimeError::DeadlineElapsed)));
  }
}
