//! Ordered directed graph of operators.
//!
//! Every vertex keeps its successors and predecessors as *ordered* lists; the
//! position of a neighbour in those lists is the edge's port. Operators with
//! several inputs (joins) rely on predecessor order to know which input is
//! which, so rewrites that splice nodes into an edge must put the new edges
//! back on the original ports (`disconnect` reports them, `connect_at`
//! restores them).
//!
//! The same container backs the outer logical plan and the nested scopes
//! owned by for-each operators.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::OpId;

/// An edge record: `from` feeds `to`, leaving `from` on `from_port` and
/// entering `to` on `to_port`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: OpId,
    pub to: OpId,
    pub from_port: usize,
    pub to_port: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorPlan<T> {
    nodes: BTreeMap<OpId, T>,
    successors: BTreeMap<OpId, Vec<OpId>>,
    predecessors: BTreeMap<OpId, Vec<OpId>>,
    next_id: OpId,
}

impl<T> Default for OperatorPlan<T> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            successors: BTreeMap::new(),
            predecessors: BTreeMap::new(),
            next_id: OpId::new(1),
        }
    }
}

impl<T> OperatorPlan<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unconnected vertex and return its id.
    pub fn add(&mut self, op: T) -> OpId {
        let id = self.next_id;
        self.next_id = id.next();
        self.nodes.insert(id, op);
        id
    }

    pub fn get(&self, id: OpId) -> Option<&T> {
        self.nodes.get(&id)
    }

    /// Like `get`, but an unknown id is a planning error.
    pub fn node(&self, id: OpId) -> Result<&T> {
        self.nodes
            .get(&id)
            .ok_or_else(|| Error::Plan(format!("unknown operator {id}")))
    }

    pub fn node_mut(&mut self, id: OpId) -> Result<&mut T> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| Error::Plan(format!("unknown operator {id}")))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Vertices in id (insertion) order.
    pub fn iter(&self) -> impl Iterator<Item = (OpId, &T)> + '_ {
        self.nodes.iter().map(|(id, op)| (*id, op))
    }

    pub fn ids(&self) -> Vec<OpId> {
        self.nodes.keys().copied().collect()
    }

    pub fn successors(&self, id: OpId) -> &[OpId] {
        self.successors.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn predecessors(&self, id: OpId) -> &[OpId] {
        self.predecessors.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Vertices without predecessors, in id order.
    pub fn sources(&self) -> Vec<OpId> {
        self.nodes
            .keys()
            .copied()
            .filter(|id| self.predecessors(*id).is_empty())
            .collect()
    }

    /// Vertices without successors, in id order.
    pub fn sinks(&self) -> Vec<OpId> {
        self.nodes
            .keys()
            .copied()
            .filter(|id| self.successors(*id).is_empty())
            .collect()
    }

    /// Append an edge: `from`'s next output port to `to`'s next input port.
    pub fn connect(&mut self, from: OpId, to: OpId) -> Result<()> {
        let from_port = self.successors(from).len();
        let to_port = self.predecessors(to).len();
        self.connect_at(from, from_port, to, to_port)
    }

    /// Insert an edge at explicit ports. Ports may not exceed the current
    /// number of edges on that side; existing edges at or after the port
    /// shift up by one.
    pub fn connect_at(&mut self, from: OpId, from_port: usize, to: OpId, to_port: usize) -> Result<()> {
        self.node(from)?;
        self.node(to)?;
        if from == to {
            return Err(Error::Plan(format!("self-loop on {from}")));
        }
        if self.successors(from).contains(&to) {
            return Err(Error::Plan(format!("{from} is already connected to {to}")));
        }

        let succ_len = self.successors(from).len();
        if from_port > succ_len {
            return Err(Error::Plan(format!(
                "output port {from_port} out of range for {from} ({succ_len} edges)"
            )));
        }
        let pred_len = self.predecessors(to).len();
        if to_port > pred_len {
            return Err(Error::Plan(format!(
                "input port {to_port} out of range for {to} ({pred_len} edges)"
            )));
        }

        self.successors.entry(from).or_default().insert(from_port, to);
        self.predecessors.entry(to).or_default().insert(to_port, from);
        Ok(())
    }

    /// Remove the edge `from -> to` and return its `(from_port, to_port)`.
    pub fn disconnect(&mut self, from: OpId, to: OpId) -> Result<(usize, usize)> {
        let missing = || Error::Plan(format!("no edge {from} -> {to}"));

        let from_port = self
            .successors(from)
            .iter()
            .position(|id| *id == to)
            .ok_or_else(missing)?;
        let to_port = self
            .predecessors(to)
            .iter()
            .position(|id| *id == from)
            .ok_or_else(missing)?;

        if let Some(succ) = self.successors.get_mut(&from) {
            succ.remove(from_port);
        }
        if let Some(pred) = self.predecessors.get_mut(&to) {
            pred.remove(to_port);
        }
        Ok((from_port, to_port))
    }

    /// All edges with their ports, ordered by source id then output port.
    pub fn edges(&self) -> Vec<Edge> {
        let mut out = Vec::new();
        for (from, succ) in &self.successors {
            for (from_port, to) in succ.iter().enumerate() {
                let to_port = self
                    .predecessors(*to)
                    .iter()
                    .position(|id| id == from)
                    .unwrap_or_default();
                out.push(Edge {
                    from: *from,
                    to: *to,
                    from_port,
                    to_port,
                });
            }
        }
        out
    }

    /// The single edge `from -> to`, if present.
    pub fn edge(&self, from: OpId, to: OpId) -> Option<Edge> {
        let from_port = self.successors(from).iter().position(|id| *id == to)?;
        let to_port = self.predecessors(to).iter().position(|id| *id == from)?;
        Some(Edge {
            from,
            to,
            from_port,
            to_port,
        })
    }
}
