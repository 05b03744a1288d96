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

//! # Topology
//!
//! The topology is a directed multigraph. Every node has a unique name and a fixed
//! [role](NodeRole). Every physical link is represented by two directed edges, each carrying the
//! [ports](LinkPorts) of its direction.

mod graph;
mod types;

pub use graph::TopologyGraph;
pub(crate) use types::DcGraph;
pub use types::{DcNode, LinkPorts, NetworkError, NodeId, NodeRole, PortNumber};
