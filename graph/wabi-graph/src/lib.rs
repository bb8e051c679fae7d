//! The dependency graph resolver (§4.7): given the signed per-credential-type balances of a
//! round's input and output registrations, builds a k-ary DAG of reissuance vertices and
//! credential-carrying edges such that every vertex's balance nets to zero and every
//! presentation round can always be handed exactly `k` credentials (real or zero-filled).
//!
//! The graph is arena-allocated: vertices and edges live in flat `Vec`s owned by `Graph`,
//! addressed by stable `VertexId`/`EdgeId` indices rather than references, the same way
//! `frost` addresses multisig participants by a small integer key instead of a pointer.

pub mod resolve;

use std::collections::HashMap;

use tracing::{debug, instrument};

/// A stable index into `Graph::vertices`. Never reused: removing a vertex is not supported,
/// since the resolver only ever adds vertices and edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub usize);

/// A stable index into `Graph::edges`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexKind {
  Input,
  Output,
  Reissuance,
}

/// What kind of credential an edge carries, distinguishing the two shapes of "zero-valued" edge
/// named in §4.7/§9: a reserved change slot is still a normally presented credential (just one
/// whose value happens to be zero after resolution), while a zero-filler has no presented
/// credential behind it at all and is requested via `CreateRequestForZeroAmount` instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
  Value,
  Change,
  ZeroFiller,
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum GraphError {
  #[error("vertex {0:?} exceeded its degree bound for kind {1:?}")]
  DegreeExceeded(VertexId, VertexKind),
  #[error("vertex {0:?} has a nonzero balance of {1} for type {2} after resolution")]
  BalanceNotDischarged(VertexId, i64, usize),
  #[error("credential type count mismatch: expected {expected}, got {got}")]
  TypeCountMismatch { expected: usize, got: usize },
}

#[derive(Clone, Debug)]
pub struct Vertex {
  pub id: VertexId,
  pub kind: VertexKind,
  /// Remaining signed balance per credential type: positive means the vertex still has value to
  /// send out, negative means it still needs value to arrive, zero means discharged.
  balances: Vec<i64>,
  /// Every out-edge regardless of kind, for iteration (`ResolvedGraph::out_edges`).
  out_edges: Vec<EdgeId>,
  in_edges: Vec<EdgeId>,
  /// Count of non-`ZeroFiller` out-edges created so far. `remaining_out_slots` is bounded by
  /// this, not `out_edges.len()`, since §4.7 budgets ordinary out-degree and zero-valued
  /// out-degree separately — a vertex that has spent its `k` real out-slots must still be able
  /// to source zero-fillers for its sinks.
  value_out_used: usize,
  /// Count of `EdgeKind::ZeroFiller` out-edges created so far (bounded separately from ordinary
  /// out-degree, per §4.7's "zero-valued out-degree ≤ k" / "≤ k·(k−1)" caps).
  zero_out_used: usize,
  change_reserved: bool,
}

impl Vertex {
  fn max_out_degree(&self, k: usize) -> usize {
    match self.kind {
      VertexKind::Input => k,
      VertexKind::Output => 0,
      VertexKind::Reissuance => k,
    }
  }

  fn max_in_degree(&self, k: usize) -> usize {
    match self.kind {
      VertexKind::Input => 0,
      VertexKind::Output => k,
      VertexKind::Reissuance => k,
    }
  }

  fn max_zero_out_degree(&self, k: usize) -> usize {
    match self.kind {
      VertexKind::Input => k,
      VertexKind::Output => 0,
      VertexKind::Reissuance => k * (k.saturating_sub(1)),
    }
  }

  fn remaining_out_slots(&self, k: usize) -> usize {
    self.max_out_degree(k).saturating_sub(self.value_out_used)
  }

  fn remaining_in_slots(&self, k: usize) -> usize {
    self.max_in_degree(k).saturating_sub(self.in_edges.len())
  }

  fn remaining_zero_out_slots(&self, k: usize) -> usize {
    self.max_zero_out_degree(k).saturating_sub(self.zero_out_used)
  }

  pub fn balance(&self, ty: usize) -> i64 {
    self.balances[ty]
  }
}

#[derive(Clone, Debug)]
pub struct Edge {
  pub id: EdgeId,
  pub from: VertexId,
  pub to: VertexId,
  pub kind: EdgeKind,
  /// One amount per credential type; types this edge does not carry value for stay `0`.
  pub amounts: Vec<u64>,
}

/// A mutable, in-progress dependency graph. `resolve` consumes it (conceptually — it mutates in
/// place) and exports an immutable `ResolvedGraph` snapshot.
pub struct Graph {
  k: usize,
  num_types: usize,
  vertices: Vec<Vertex>,
  edges: Vec<Edge>,
  /// `(from, to, kind)` -> edge index, so repeated calls across different credential types
  /// between the same pair of vertices reuse one edge (and so one degree slot) instead of
  /// allocating a new edge per type.
  edge_index: HashMap<(VertexId, VertexId, u8), EdgeId>,
}

fn edge_kind_tag(kind: EdgeKind) -> u8 {
  match kind {
    EdgeKind::Value => 0,
    EdgeKind::Change => 1,
    EdgeKind::ZeroFiller => 2,
  }
}

impl Graph {
  pub fn new(k: usize, num_types: usize) -> Self {
    Graph { k, num_types, vertices: Vec::new(), edges: Vec::new(), edge_index: HashMap::new() }
  }

  pub fn k(&self) -> usize {
    self.k
  }

  pub fn num_types(&self) -> usize {
    self.num_types
  }

  fn push_vertex(&mut self, kind: VertexKind, balances: Vec<i64>) -> Result<VertexId, GraphError> {
    if balances.len() != self.num_types {
      return Err(GraphError::TypeCountMismatch { expected: self.num_types, got: balances.len() });
    }
    let id = VertexId(self.vertices.len());
    self.vertices.push(Vertex {
      id,
      kind,
      balances,
      out_edges: Vec::new(),
      in_edges: Vec::new(),
      value_out_used: 0,
      zero_out_used: 0,
      change_reserved: false,
    });
    Ok(id)
  }

  /// `balances` are the input's per-type values, all `>= 0`.
  pub fn add_input(&mut self, balances: Vec<i64>) -> Result<VertexId, GraphError> {
    self.push_vertex(VertexKind::Input, balances)
  }

  /// `balances` are the output's per-type values expressed as `<= 0` (sinks).
  pub fn add_output(&mut self, balances: Vec<i64>) -> Result<VertexId, GraphError> {
    self.push_vertex(VertexKind::Output, balances)
  }

  fn add_reissuance(&mut self) -> VertexId {
    self.push_vertex(VertexKind::Reissuance, vec![0; self.num_types]).expect("num_types matches by construction")
  }

  pub fn vertex(&self, id: VertexId) -> &Vertex {
    &self.vertices[id.0]
  }

  pub fn edges(&self) -> &[Edge] {
    &self.edges
  }

  pub fn vertices(&self) -> &[Vertex] {
    &self.vertices
  }

  /// Adds `amount` of `ty` across the edge `from -> to`, creating one if this is the first
  /// value moved between them, and updating both endpoints' balances and degree usage.
  fn add_amount(&mut self, from: VertexId, to: VertexId, ty: usize, amount: u64, kind: EdgeKind) -> Result<(), GraphError> {
    let key = (from, to, edge_kind_tag(kind));
    let edge_id = if let Some(&existing) = self.edge_index.get(&key) {
      existing
    } else {
      // ZeroFiller edges draw against the separate zero-out budget; every other kind draws
      // against the ordinary out-degree. Keeping these independent is what lets a vertex that
      // has spent its `k` real out-slots still source zero-fillers for its sinks.
      if matches!(kind, EdgeKind::ZeroFiller) {
        if self.vertices[from.0].remaining_zero_out_slots(self.k) == 0 {
          return Err(GraphError::DegreeExceeded(from, self.vertices[from.0].kind));
        }
      } else if self.vertices[from.0].remaining_out_slots(self.k) == 0 {
        return Err(GraphError::DegreeExceeded(from, self.vertices[from.0].kind));
      }
      if self.vertices[to.0].remaining_in_slots(self.k) == 0 {
        return Err(GraphError::DegreeExceeded(to, self.vertices[to.0].kind));
      }
      let id = EdgeId(self.edges.len());
      self.edges.push(Edge { id, from, to, kind, amounts: vec![0; self.num_types] });
      self.vertices[from.0].out_edges.push(id);
      self.vertices[to.0].in_edges.push(id);
      if matches!(kind, EdgeKind::ZeroFiller) {
        self.vertices[from.0].zero_out_used += 1;
      } else {
        self.vertices[from.0].value_out_used += 1;
      }
      if matches!(kind, EdgeKind::Change) {
        self.vertices[from.0].change_reserved = true;
      }
      self.edge_index.insert(key, id);
      id
    };

    self.edges[edge_id.0].amounts[ty] += amount;
    self.vertices[from.0].balances[ty] -= amount as i64;
    self.vertices[to.0].balances[ty] += amount as i64;
    Ok(())
  }

  /// Runs the full resolution pipeline: for every credential type in order,
  /// `resolve_negative_balance_nodes` then `resolve_zero_credentials`, and exports the result.
  #[instrument(level = "debug", skip(self), fields(k = self.k, num_types = self.num_types, vertices = self.vertices.len()))]
  pub fn resolve(mut self) -> Result<ResolvedGraph, GraphError> {
    for ty in 0 .. self.num_types {
      resolve::resolve_negative_balance_nodes(&mut self, ty)?;
      resolve::resolve_zero_credentials(&mut self, ty)?;
    }
    for vertex in &self.vertices {
      for ty in 0 .. self.num_types {
        if vertex.balances[ty] != 0 {
          debug!(vertex = vertex.id.0, ty, balance = vertex.balances[ty], "balance left undischarged");
          return Err(GraphError::BalanceNotDischarged(vertex.id, vertex.balances[ty], ty));
        }
      }
    }
    debug!(edges = self.edges.len(), "resolved");
    Ok(ResolvedGraph { k: self.k, num_types: self.num_types, vertices: self.vertices, edges: self.edges })
  }
}

/// The immutable output of a successful `Graph::resolve`: a finished DAG ready for the execution
/// runtime (C8) to drive.
#[derive(Clone, Debug)]
pub struct ResolvedGraph {
  k: usize,
  num_types: usize,
  vertices: Vec<Vertex>,
  edges: Vec<Edge>,
}

impl ResolvedGraph {
  pub fn k(&self) -> usize {
    self.k
  }

  pub fn num_types(&self) -> usize {
    self.num_types
  }

  pub fn vertices(&self) -> &[Vertex] {
    &self.vertices
  }

  pub fn edges(&self) -> &[Edge] {
    &self.edges
  }

  pub fn vertex(&self, id: VertexId) -> &Vertex {
    &self.vertices[id.0]
  }

  pub fn edge(&self, id: EdgeId) -> &Edge {
    &self.edges[id.0]
  }

  pub fn out_edges(&self, id: VertexId) -> impl Iterator<Item = &Edge> {
    self.vertices[id.0].out_edges.iter().map(move |e| &self.edges[e.0])
  }

  pub fn in_edges(&self, id: VertexId) -> impl Iterator<Item = &Edge> {
    self.vertices[id.0].in_edges.iter().map(move |e| &self.edges[e.0])
  }
}
