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

#![deny(missing_docs)]

//! # DcNet: Multi-Tenant Data Center Network Emulation
//! This is a library for managing the topology of an emulated multi-tenant data center network,
//! and for setting up service chains between its compute endpoints.
//!
//! ## Structure
//!
//! - **[`Topology`](topology)**: Directed multigraph of all switches, datacenter gateways and
//!   compute endpoints. Every link is stored as two directed edges, carrying the ports assigned
//!   by the emulation substrate.
//!
//! - **[`Network`](network)**: The main structure [`DcNetwork`], which owns the topology, the
//!   [datacenters](datacenter::Datacenter), the [address pool](address::AddressPool), the
//!   [emulation substrate](substrate::Substrate) and the
//!   [switch command interface](flow::SwitchControl).
//!
//! - **[`Registrar`](registrar)**: Registers nodes and links in the substrate and in the
//!   topology at the same time.
//!
//! - **[`Chains`](chain)**: Computes the shortest path between two nodes, and walks along it to
//!   program every intermediate switch. The flows themselves are generated by the
//!   [`FlowProgrammer`](flow::FlowProgrammer).
//!
//! - **[`API`](api)**: Thread-safe wrapper around the network, as used by remote endpoints.
//!
//! - **[`Topology Files`](topology_file)**: Build a network from a JSON description.
//!
//! ## Usage
//!
//! ```
//! use dcnet::{DcNetwork, Error};
//! use dcnet::flow::{FlowLog, FlowDirective};
//! use dcnet::substrate::{LinkParams, MemorySubstrate, NodeParams};
//!
//! fn main() -> Result<(), Error> {
//!     let mut net = DcNetwork::new(MemorySubstrate::new(), FlowLog::new());
//!     net.add_compute("vnf1", &NodeParams::default())?;
//!     net.add_switch("s1", &NodeParams::default())?;
//!     net.add_compute("vnf2", &NodeParams::default())?;
//!     net.add_link("vnf1", "s1", LinkParams::default())?;
//!     net.add_link("s1", "vnf2", LinkParams::default())?;
//!
//!     let report = net.start_chain("vnf1", "vnf2")?;
//!     assert_eq!(report.to_string(), "path added between vnf1 and vnf2");
//!     assert_eq!(net.switch_control().directives(), &[FlowDirective::install("s1", 1, 2)]);
//!
//!     Ok(())
//! }
//! ```

pub mod address;
pub mod api;
pub mod chain;
pub mod datacenter;
mod error;
pub mod flow;
pub mod network;
pub mod registrar;
pub mod substrate;
pub mod topology;
pub mod topology_file;

// test modules
mod test;

pub use error::Error;
pub use network::DcNetwork;
