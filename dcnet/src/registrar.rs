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

//! # Link Registrar
//!
//! Registers nodes and links both in the emulation substrate and in the topology graph, keeping
//! the two consistent.

use crate::address::{AddressPool, IpAddr};
use crate::datacenter::Datacenter;
use crate::substrate::{InterfaceParams, LinkParams, NodeParams, Substrate};
use crate::topology::{LinkPorts, NetworkError, NodeId, NodeRole, TopologyGraph};

use log::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Link registered in the topology
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    /// First node (after resolving datacenter labels)
    pub node1: String,
    /// Second node (after resolving datacenter labels)
    pub node2: String,
    /// Ports of the direction `node1 -> node2`
    pub ports: LinkPorts,
    /// Parameters passed to the substrate, including the allocated addresses
    pub params: LinkParams,
}

/// # Link Registrar
///
/// Short-lived view on the parts of the network that are touched when registering nodes and
/// links. Nodes are always added to the graph before they are created in the substrate, such
/// that a link declared right afterwards finds them. Compute endpoints are removed from the graph
/// before they are torn down in the substrate.
#[derive(Debug)]
pub struct LinkRegistrar<'a, S: Substrate + ?Sized> {
    graph: &'a mut TopologyGraph,
    datacenters: &'a BTreeMap<String, Datacenter>,
    addresses: &'a mut AddressPool,
    substrate: &'a mut S,
}

impl<'a, S: Substrate + ?Sized> LinkRegistrar<'a, S> {
    /// Create a new registrar.
    pub fn new(
        graph: &'a mut TopologyGraph,
        datacenters: &'a BTreeMap<String, Datacenter>,
        addresses: &'a mut AddressPool,
        substrate: &'a mut S,
    ) -> Self {
        Self { graph, datacenters, addresses, substrate }
    }

    /// Resolve the name of a link endpoint. A datacenter label is replaced by the name of its
    /// gateway switch. Any other name must already be part of the topology.
    pub fn resolve(&self, name: &str) -> Result<(String, NodeRole), NetworkError> {
        let name = match self.datacenters.get(name) {
            Some(dc) => dc.switch(),
            None => name,
        };
        let role = self.graph.role(name)?;
        Ok((name.to_string(), role))
    }

    /// Add a switch (or the gateway switch of a datacenter).
    pub fn add_switch(
        &mut self,
        name: &str,
        role: NodeRole,
        params: &NodeParams,
    ) -> Result<NodeId, NetworkError> {
        let id = self.graph.add_node(name, role);
        self.substrate.create_switch(name, params)?;
        Ok(id)
    }

    /// Add a compute endpoint.
    pub fn add_compute(&mut self, name: &str, params: &NodeParams) -> Result<NodeId, NetworkError> {
        let id = self.graph.add_node(name, NodeRole::ComputeEndpoint);
        self.substrate.create_compute(name, params)?;
        Ok(id)
    }

    /// Remove a compute endpoint, first from the graph, then from the substrate.
    pub fn remove_compute(&mut self, name: &str) -> Result<(), NetworkError> {
        if !self.graph.role(name)?.is_compute() {
            return Err(NetworkError::NodeNotFound(name.to_string()));
        }
        self.graph.remove_node(name)?;
        self.substrate.remove_compute(name)?;
        Ok(())
    }

    /// Create a link between two nodes, and insert it into the graph in both directions.
    ///
    /// Compute endpoints without an address in `params` get the next address of the pool. The
    /// logical port id of each side is the id given in `params`, or the port number assigned by
    /// the substrate. Errors of the substrate are returned as-is, and leave the graph untouched.
    pub fn add_link(
        &mut self,
        node1: &str,
        node2: &str,
        mut params: LinkParams,
    ) -> Result<Link, NetworkError> {
        debug!("add_link: n1={} n2={}", node1, node2);
        let (name1, role1) = self.resolve(node1)?;
        let (name2, role2) = self.resolve(node2)?;

        if role1.is_compute() {
            self.assign_default_ip(&mut params.params1)?;
        }
        if role2.is_compute() {
            self.assign_default_ip(&mut params.params2)?;
        }

        let (port1, port2) = self.substrate.create_link(&name1, &name2, &params)?;

        let ports = LinkPorts {
            src_port_id: params.params1.id.clone().unwrap_or_else(|| port1.to_string()),
            src_port: port1,
            dst_port_id: params.params2.id.clone().unwrap_or_else(|| port2.to_string()),
            dst_port: port2,
        };

        let id1 = self.graph.node_id(&name1)?;
        let id2 = self.graph.node_id(&name2)?;
        self.graph.add_link_edges(id1, id2, ports.clone());
        info!("added link: {}:{} <-> {}:{}", name1, port1, name2, port2);

        Ok(Link { node1: name1, node2: name2, ports, params })
    }

    fn assign_default_ip(&mut self, iface: &mut InterfaceParams) -> Result<(), NetworkError> {
        if iface.ip.is_none() {
            iface.ip = Some(self.next_address()?.to_string());
        }
        Ok(())
    }

    fn next_address(&mut self) -> Result<IpAddr, NetworkError> {
        let allocated = self.addresses.num_allocated();
        self.addresses.next_address().ok_or(NetworkError::AddressPoolExhausted(allocated))
    }
}
