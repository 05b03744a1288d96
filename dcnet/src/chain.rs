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

//! # Chain Planner
//!
//! A chain connects a source node with a destination node along the shortest path in the
//! topology. Every switch in between receives one flow directive, which forwards the packets
//! received from the previous hop towards the next hop. The segment into the destination itself
//! is never programmed.

use crate::flow::{FlowCommand, FlowDirective, FlowProgrammer, SwitchControl};
use crate::topology::{NetworkError, NodeId, PortNumber, TopologyGraph};

use itertools::Itertools;
use log::*;
use serde::Serialize;
use std::fmt;

/// State of a walk along a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainState {
    /// The path is computed, but no hop was visited yet
    PathResolved,
    /// Visiting the hops one after the other
    Walking,
    /// The destination was reached
    Completed,
    /// An intermediate hop cannot be programmed
    Rejected,
    /// The destination cannot be reached
    Unreachable,
}

impl ChainState {
    /// Returns true if no further hop will be visited.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Unreachable)
    }
}

/// Intermediate switch of a chain, together with the ports facing the previous and the next hop
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowHop {
    /// Name of the switch
    pub switch: String,
    /// Port on which packets from the previous hop arrive
    pub in_port: PortNumber,
    /// Port towards the next hop
    pub out_port: PortNumber,
}

impl FlowHop {
    /// Directive that programs this hop.
    pub fn directive(&self, command: FlowCommand) -> FlowDirective {
        match command {
            FlowCommand::Install => {
                FlowDirective::install(&self.switch, self.in_port, self.out_port)
            }
            FlowCommand::Remove => FlowDirective::remove(&self.switch, self.in_port),
        }
    }
}

/// # Chain Walk
///
/// Iterator over the intermediate hops of a chain. Each item is either the next hop to be
/// programmed, or the error that terminates the walk. After the iterator is exhausted,
/// [`ChainWalk::state`] tells if the destination was reached.
#[derive(Debug, Clone)]
pub struct ChainWalk<'a> {
    graph: &'a TopologyGraph,
    path: Vec<NodeId>,
    dst: String,
    pos: usize,
    state: ChainState,
}

impl<'a> ChainWalk<'a> {
    /// Current state of the walk
    pub fn state(&self) -> ChainState {
        self.state
    }

    /// Names of all nodes on the path, starting with the source.
    pub fn path(&self) -> Vec<String> {
        self.path
            .iter()
            .map(|id| self.graph.node_name(*id).unwrap_or("?").to_string())
            .collect()
    }

    fn step(&mut self) -> Result<Option<FlowHop>, NetworkError> {
        let graph = self.graph;
        let current = self.path[self.pos];
        let next = match self.path.get(self.pos + 1) {
            Some(next) => *next,
            None => return Err(NetworkError::DestinationNotReached(self.dst.clone())),
        };

        let next_node = graph.node(next)?;
        if next_node.name == self.dst {
            return Ok(None);
        }
        if !next_node.role.is_switch() {
            info!("Next node: {} is not a switch", next_node.name);
            return Err(NetworkError::NonSwitchHop(next_node.name.clone()));
        }

        let next_next = match self.path.get(self.pos + 2) {
            Some(n) => *n,
            None => return Err(NetworkError::DestinationNotReached(self.dst.clone())),
        };

        let in_port = graph.edge_by_id(current, next)?.dst_port;
        let out_port = graph.edge_by_id(next, next_next)?.src_port;
        self.pos += 1;

        Ok(Some(FlowHop { switch: next_node.name.clone(), in_port, out_port }))
    }
}

impl<'a> Iterator for ChainWalk<'a> {
    type Item = Result<FlowHop, NetworkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state.is_terminal() {
            return None;
        }
        self.state = ChainState::Walking;
        match self.step() {
            Ok(Some(hop)) => Some(Ok(hop)),
            Ok(None) => {
                self.state = ChainState::Completed;
                None
            }
            Err(e) => {
                self.state = match e {
                    NetworkError::Unreachable(_, _) | NetworkError::DestinationNotReached(_) => {
                        ChainState::Unreachable
                    }
                    _ => ChainState::Rejected,
                };
                Some(Err(e))
            }
        }
    }
}

/// Result of a chain that reached its destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    /// Source node
    pub src: String,
    /// Destination node
    pub dst: String,
    /// Install or remove
    pub command: FlowCommand,
    /// All nodes on the path, starting with the source
    pub path: Vec<String>,
    /// Directives of all intermediate hops, in path order
    pub directives: Vec<FlowDirective>,
}

impl fmt::Display for ChainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.command {
            FlowCommand::Install => "added",
            FlowCommand::Remove => "removed",
        };
        write!(f, "path {} between {} and {}", verb, self.src, self.dst)
    }
}

/// # Chain Planner
///
/// Resolves the path of a chain on every request; nothing is cached between calls.
#[derive(Debug, Clone, Copy)]
pub struct ChainPlanner<'a> {
    graph: &'a TopologyGraph,
}

impl<'a> ChainPlanner<'a> {
    /// Create a planner on the given topology.
    pub fn new(graph: &'a TopologyGraph) -> Self {
        Self { graph }
    }

    /// Compute the shortest path from `src` to `dst`, and return a walk along it.
    pub fn walk(&self, src: &str, dst: &str) -> Result<ChainWalk<'a>, NetworkError> {
        let path = self.graph.shortest_path(src, dst)?;
        let walk = ChainWalk {
            graph: self.graph,
            path,
            dst: dst.to_string(),
            pos: 0,
            state: ChainState::PathResolved,
        };
        info!("Path between {} and {}: {}", src, dst, walk.path().iter().join(" -> "));
        Ok(walk)
    }

    /// Compute all directives of the chain without applying them.
    pub fn plan(
        &self,
        src: &str,
        dst: &str,
        command: FlowCommand,
    ) -> Result<ChainReport, NetworkError> {
        let walk = self.walk(src, dst)?;
        let path = walk.path();
        let directives: Vec<FlowDirective> =
            walk.map(|hop| hop.map(|h| h.directive(command))).collect::<Result<_, _>>()?;
        Ok(ChainReport { src: src.to_string(), dst: dst.to_string(), command, path, directives })
    }

    /// Walk the chain and program every intermediate switch through `control`. The walk stops at
    /// the first error; the directives applied up to this point are not reverted.
    pub fn execute<C: SwitchControl + ?Sized>(
        &self,
        control: &mut C,
        src: &str,
        dst: &str,
        command: FlowCommand,
    ) -> Result<ChainReport, NetworkError> {
        let mut walk = self.walk(src, dst)?;
        let path = walk.path();
        let mut programmer = FlowProgrammer::new(control);
        let mut directives = Vec::new();
        for hop in &mut walk {
            let hop = hop?;
            directives.push(programmer.program(&hop.switch, hop.in_port, hop.out_port, command)?);
        }
        let report =
            ChainReport { src: src.to_string(), dst: dst.to_string(), command, path, directives };
        info!("{}", report);
        Ok(report)
    }
}
