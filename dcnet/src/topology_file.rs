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

//! # Topology Description Files
//!
//! Describes a complete network in a JSON file, such that it can be built without writing any
//! code. A description looks like this:
//!
//! ```json
//! {
//!   "address_pool": { "base": "10.0.0.0", "prefix_len": 8 },
//!   "datacenters": [ { "label": "dc-a", "metadata": { "region": "eu" } }, { "label": "dc-b" } ],
//!   "switches": [ { "name": "s1" } ],
//!   "computes": [
//!     { "name": "vnf1", "datacenter": "dc-a" },
//!     { "name": "client", "template": "alpine" }
//!   ],
//!   "links": [
//!     { "node1": "dc-a", "node2": "s1", "bandwidth": 100.0, "delay": "5ms" },
//!     { "node1": "s1", "node2": "dc-b" },
//!     { "node1": "client", "node2": "s1", "params1": { "id": "eth0" } }
//!   ],
//!   "chains": [ { "src": "vnf1", "dst": "client" } ]
//! }
//! ```
//!
//! All sections are optional. The network is built in the order datacenters, switches, compute
//! endpoints, links. Chains are not started while building.

use crate::address::AddressPool;
use crate::flow::SwitchControl;
use crate::network::DcNetwork;
use crate::substrate::{LinkParams, NodeParams, Substrate};
use crate::topology::NetworkError;

use log::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::read_to_string;
use std::net::Ipv4Addr;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors while reading or building a topology description
#[derive(Debug, Error)]
pub enum TopologyFileError {
    /// Cannot read the file
    #[error("Cannot read the topology file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not a valid description
    #[error("Cannot parse the topology file: {0}")]
    Json(#[from] serde_json::Error),
    /// The network rejected the description
    #[error("Cannot build the topology: {0}")]
    Network(#[from] NetworkError),
}

/// Complete description of a network
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyDescription {
    /// Network from which compute endpoints receive their addresses
    pub address_pool: Option<AddressPoolDescription>,
    /// Logical datacenters
    pub datacenters: Vec<DatacenterDescription>,
    /// Switches outside of any datacenter
    pub switches: Vec<SwitchDescription>,
    /// Compute endpoints
    pub computes: Vec<ComputeDescription>,
    /// Links between nodes or datacenters
    pub links: Vec<LinkDescription>,
    /// Chains, which can be started once the network is built
    pub chains: Vec<ChainDescription>,
}

/// Network of the address pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressPoolDescription {
    /// Network address
    pub base: Ipv4Addr,
    /// Prefix length
    pub prefix_len: u8,
}

/// Logical datacenter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatacenterDescription {
    /// Unique label
    pub label: String,
    /// Metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Switch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchDescription {
    /// Name of the switch
    pub name: String,
    /// Parameters passed to the substrate
    #[serde(flatten)]
    pub params: NodeParams,
}

/// Compute endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeDescription {
    /// Name of the endpoint
    pub name: String,
    /// Label of the datacenter. If set, the endpoint is connected to the gateway of the
    /// datacenter.
    #[serde(default)]
    pub datacenter: Option<String>,
    /// Parameters passed to the substrate
    #[serde(flatten)]
    pub params: NodeParams,
    /// Parameters of the link towards the datacenter gateway
    #[serde(default)]
    pub link: LinkParams,
}

/// Link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDescription {
    /// First node, or datacenter label
    pub node1: String,
    /// Second node, or datacenter label
    pub node2: String,
    /// Parameters of the link
    #[serde(flatten)]
    pub params: LinkParams,
}

/// Chain between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescription {
    /// Source
    pub src: String,
    /// Destination
    pub dst: String,
}

impl FromStr for TopologyDescription {
    type Err = TopologyFileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

impl TopologyDescription {
    /// Read the description from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TopologyFileError> {
        debug!("Reading topology from {}", path.as_ref().display());
        read_to_string(path)?.parse()
    }

    /// Address pool of the description, or the default pool if none is given.
    pub fn address_pool(&self) -> AddressPool {
        match &self.address_pool {
            Some(pool) => AddressPool::new(pool.base, pool.prefix_len),
            None => AddressPool::default(),
        }
    }

    /// Create a new network on the given substrate and switch command interface, and build the
    /// description into it.
    pub fn into_network<S: Substrate, C: SwitchControl>(
        &self,
        substrate: S,
        switches: C,
    ) -> Result<DcNetwork<S, C>, TopologyFileError> {
        let mut net = DcNetwork::new(substrate, switches).with_address_pool(self.address_pool());
        self.build(&mut net)?;
        Ok(net)
    }

    /// Add all nodes and links of the description to an existing network.
    pub fn build<S: Substrate, C: SwitchControl>(
        &self,
        net: &mut DcNetwork<S, C>,
    ) -> Result<(), TopologyFileError> {
        for dc in self.datacenters.iter() {
            net.add_datacenter(dc.label.clone(), dc.metadata.clone())?;
        }
        for switch in self.switches.iter() {
            net.add_switch(&switch.name, &switch.params)?;
        }
        for compute in self.computes.iter() {
            match &compute.datacenter {
                Some(dc) => {
                    net.start_compute(dc, &compute.name, &compute.params, compute.link.clone())?;
                }
                None => {
                    net.add_compute(&compute.name, &compute.params)?;
                }
            }
        }
        for link in self.links.iter() {
            net.add_link(&link.node1, &link.node2, link.params.clone())?;
        }
        info!(
            "Built topology with {} datacenters, {} nodes and {} links",
            self.datacenters.len(),
            net.graph().num_nodes(),
            net.links().len()
        );
        Ok(())
    }
}
