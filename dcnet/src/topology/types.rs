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

//! Module containing all type definitions

use crate::flow::DeviceError;
use crate::substrate::SubstrateError;

use petgraph::prelude::*;
use petgraph::stable_graph::StableGraph;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

type IndexType = u32;
/// Node Identification (and index into the graph)
pub type NodeId = NodeIndex<IndexType>;
/// Port number assigned by the emulation substrate
pub type PortNumber = u32;
/// Directed multigraph of the data center network. Nodes carry their name and role, edges carry
/// the port metadata of one direction of a physical link.
pub(crate) type DcGraph = StableGraph<DcNode, LinkPorts, Directed, IndexType>;

/// Role of a node in the topology, fixed when the node is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeRole {
    /// Programmable switch
    Switch,
    /// Compute endpoint (container or VNF)
    ComputeEndpoint,
    /// Switch through which all compute endpoints of a datacenter attach to the network
    DatacenterGateway,
}

impl NodeRole {
    /// Returns true if flow rules can be installed on the node. A datacenter gateway is backed by
    /// a switch, and thus counts as one.
    pub fn is_switch(&self) -> bool {
        matches!(self, Self::Switch | Self::DatacenterGateway)
    }

    /// Returns true if the node is a compute endpoint
    pub fn is_compute(&self) -> bool {
        matches!(self, Self::ComputeEndpoint)
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switch => write!(f, "switch"),
            Self::ComputeEndpoint => write!(f, "compute-endpoint"),
            Self::DatacenterGateway => write!(f, "datacenter-gateway"),
        }
    }
}

/// Node stored in the topology graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DcNode {
    /// Unique name of the node
    pub name: String,
    /// Role of the node
    pub role: NodeRole,
}

/// Port metadata of a single directed edge `a -> b`. The `src_*` fields describe the port on `a`
/// facing `b`, and the `dst_*` fields describe the port on `b` facing `a`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkPorts {
    /// Logical port id on the source node (given by the caller, or the port number)
    pub src_port_id: String,
    /// Port number on the source node, assigned by the emulation substrate
    pub src_port: PortNumber,
    /// Logical port id on the destination node
    pub dst_port_id: String,
    /// Port number on the destination node
    pub dst_port: PortNumber,
}

impl LinkPorts {
    /// Returns the metadata of the edge in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            src_port_id: self.dst_port_id.clone(),
            src_port: self.dst_port,
            dst_port_id: self.src_port_id.clone(),
            dst_port: self.src_port,
        }
    }
}

/// Network Errors
#[derive(Error, Debug, PartialEq)]
pub enum NetworkError {
    /// The name (or datacenter label) is already registered
    #[error("Node or datacenter already exists: {0}")]
    DuplicateNode(String),
    /// Node name is not present in the topology
    #[error("Network node was not found in topology: {0}")]
    NodeNotFound(String),
    /// Node id is not present in the topology
    #[error("Network node was not found in topology: {0:?}")]
    NodeIdNotFound(NodeId),
    /// No directed edge between the two nodes
    #[error("Network link does not exist: {0} -> {1}")]
    EdgeNotFound(String, String),
    /// There exists no path between the two nodes
    #[error("No path between {0} and {1}")]
    Unreachable(String, String),
    /// The walk along the path ended before reaching the destination
    #[error("destination node: {0} not reached")]
    DestinationNotReached(String),
    /// An intermediate hop of a chain is not a switch
    #[error("Next node: {0} is not a switch")]
    NonSwitchHop(String),
    /// The address pool has no addresses left
    #[error("Address pool exhausted after {0} addresses")]
    AddressPoolExhausted(u32),
    /// The switch could not apply a flow directive
    #[error("Device Error: {0}")]
    DeviceCommand(#[from] DeviceError),
    /// The emulation substrate failed
    #[error("Substrate Error: {0}")]
    Substrate(#[from] SubstrateError),
}
