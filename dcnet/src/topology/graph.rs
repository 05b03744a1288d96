// DcNet: Multi-Tenant Data Center Network Emulation
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Topology Graph
//!
//! Directed multigraph of all nodes in the network, keyed by their name.

use crate::topology::types::{DcGraph, DcNode, LinkPorts, NetworkError, NodeId, NodeRole};

use log::*;
use petgraph::algo::astar;
use petgraph::prelude::*;
use std::collections::HashMap;

/// # Topology Graph
///
/// Stores every node with its role, and every link as two directed edges carrying the port
/// metadata of the corresponding direction. Parallel edges are allowed, such that multiple
/// physical links between the same pair of nodes can be represented.
///
/// The graph is backed by a `StableGraph`, such that removing a node does not invalidate the ids
/// of the remaining nodes.
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    graph: DcGraph,
    names: HashMap<String, NodeId>,
}

impl TopologyGraph {
    /// Generate an empty topology
    pub fn new() -> Self {
        Self { graph: DcGraph::default(), names: HashMap::new() }
    }

    /// Add a node to the topology. If a node with the same name already exists, its id is
    /// returned and the graph is left untouched (the role of the existing node is kept).
    pub fn add_node(&mut self, name: impl Into<String>, role: NodeRole) -> NodeId {
        let name = name.into();
        if let Some(id) = self.names.get(&name) {
            debug!("Node {} is already part of the topology", name);
            return *id;
        }
        let id = self.graph.add_node(DcNode { name: name.clone(), role });
        self.names.insert(name, id);
        id
    }

    /// Add a node to the topology, failing with [`NetworkError::DuplicateNode`] if the name is
    /// already taken.
    pub fn add_node_unique(
        &mut self,
        name: impl Into<String>,
        role: NodeRole,
    ) -> Result<NodeId, NetworkError> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(NetworkError::DuplicateNode(name));
        }
        Ok(self.add_node(name, role))
    }

    /// Remove a node and all its incident edges.
    pub fn remove_node(&mut self, name: impl AsRef<str>) -> Result<DcNode, NetworkError> {
        let id = self.node_id(name.as_ref())?;
        self.names.remove(name.as_ref());
        self.graph.remove_node(id).ok_or(NetworkError::NodeIdNotFound(id))
    }

    /// Insert both directed edges of a link. `ports` describes the direction `a -> b`; the
    /// reverse edge receives the mirrored metadata.
    pub(crate) fn add_link_edges(
        &mut self,
        a: NodeId,
        b: NodeId,
        ports: LinkPorts,
    ) -> (EdgeIndex<u32>, EdgeIndex<u32>) {
        let reverse = ports.reversed();
        (self.graph.add_edge(a, b, ports), self.graph.add_edge(b, a, reverse))
    }

    /// Compute the path with the minimum number of hops from `src` to `dst`. The returned path
    /// starts with `src` and ends with `dst`. Ties are broken by the search order, which only
    /// depends on the order in which nodes and links were added.
    pub fn shortest_path(
        &self,
        src: impl AsRef<str>,
        dst: impl AsRef<str>,
    ) -> Result<Vec<NodeId>, NetworkError> {
        let src_id = self.node_id(src.as_ref())?;
        let dst_id = self.node_id(dst.as_ref())?;
        astar(&self.graph, src_id, |n| n == dst_id, |_| 1usize, |_| 0usize)
            .map(|(_, path)| path)
            .ok_or_else(|| {
                NetworkError::Unreachable(src.as_ref().to_string(), dst.as_ref().to_string())
            })
    }

    /// Returns the port metadata of the directed edge `a -> b`. If multiple links exist between
    /// the two nodes, the one declared first is returned.
    pub fn edge(&self, a: impl AsRef<str>, b: impl AsRef<str>) -> Result<&LinkPorts, NetworkError> {
        let a = self.node_id(a.as_ref())?;
        let b = self.node_id(b.as_ref())?;
        self.edge_by_id(a, b)
    }

    /// Returns the port metadata of the directed edge `a -> b`, referenced by the node ids.
    pub fn edge_by_id(&self, a: NodeId, b: NodeId) -> Result<&LinkPorts, NetworkError> {
        match self.edge_ids(a, b).first() {
            Some(e) => Ok(&self.graph[*e]),
            None => Err(NetworkError::EdgeNotFound(
                self.node_name(a).unwrap_or("?").to_string(),
                self.node_name(b).unwrap_or("?").to_string(),
            )),
        }
    }

    /// Returns the metadata of all directed edges `a -> b`, in the order they were declared.
    pub fn edges_between(
        &self,
        a: impl AsRef<str>,
        b: impl AsRef<str>,
    ) -> Result<Vec<&LinkPorts>, NetworkError> {
        let a = self.node_id(a.as_ref())?;
        let b = self.node_id(b.as_ref())?;
        Ok(self.edge_ids(a, b).into_iter().map(|e| &self.graph[e]).collect())
    }

    /// Returns all outgoing edges of a node as pairs of neighbor name and port metadata, in the
    /// order they were declared.
    pub fn edges_from(
        &self,
        name: impl AsRef<str>,
    ) -> Result<Vec<(&str, &LinkPorts)>, NetworkError> {
        let id = self.node_id(name.as_ref())?;
        let mut edges: Vec<(EdgeIndex<u32>, NodeId)> =
            self.graph.edges(id).map(|e| (e.id(), e.target())).collect();
        edges.sort_by_key(|(e, _)| *e);
        Ok(edges
            .into_iter()
            .map(|(e, target)| (self.graph[target].name.as_str(), &self.graph[e]))
            .collect())
    }

    /// Returns every directed edge as `(source, target, ports)`, in the order they were declared.
    pub fn edges(&self) -> Vec<(&str, &str, &LinkPorts)> {
        self.graph
            .edge_indices()
            .filter_map(|e| {
                let (a, b) = self.graph.edge_endpoints(e)?;
                Some((self.graph[a].name.as_str(), self.graph[b].name.as_str(), &self.graph[e]))
            })
            .collect()
    }

    /// ids of all edges `a -> b`, sorted by declaration order
    fn edge_ids(&self, a: NodeId, b: NodeId) -> Vec<EdgeIndex<u32>> {
        let mut edges: Vec<_> =
            self.graph.edges(a).filter(|e| e.target() == b).map(|e| e.id()).collect();
        edges.sort();
        edges
    }

    /// Get the id of the node with the given name.
    pub fn node_id(&self, name: impl AsRef<str>) -> Result<NodeId, NetworkError> {
        self.names
            .get(name.as_ref())
            .copied()
            .ok_or_else(|| NetworkError::NodeNotFound(name.as_ref().to_string()))
    }

    /// Returns the node with the given id.
    pub fn node(&self, id: NodeId) -> Result<&DcNode, NetworkError> {
        self.graph.node_weight(id).ok_or(NetworkError::NodeIdNotFound(id))
    }

    /// Returns the name of the node with the given id.
    pub fn node_name(&self, id: NodeId) -> Result<&str, NetworkError> {
        self.node(id).map(|n| n.name.as_str())
    }

    /// Returns the role of the node with the given name.
    pub fn role(&self, name: impl AsRef<str>) -> Result<NodeRole, NetworkError> {
        let id = self.node_id(name)?;
        Ok(self.graph[id].role)
    }

    /// Returns true if a node with this name exists.
    pub fn contains_node(&self, name: impl AsRef<str>) -> bool {
        self.names.contains_key(name.as_ref())
    }

    /// Returns an iterator over all nodes in the topology
    pub fn nodes(&self) -> impl Iterator<Item = &DcNode> {
        self.graph.node_indices().map(move |id| &self.graph[id])
    }

    /// Returns the number of nodes
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of directed edges (twice the number of links)
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }
}
