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

//! # Data Center Network
//!
//! This module contains [`DcNetwork`], the owner of the topology graph, the datacenter registry,
//! the address pool, the emulation substrate and the switch command interface. All mutating
//! operations take `&mut self`; see [`DcNetworkApi`](crate::api::DcNetworkApi) for shared
//! access.

use crate::address::AddressPool;
use crate::chain::{ChainPlanner, ChainReport};
use crate::datacenter::{ComputeDescriptor, Datacenter, InterfaceDescriptor};
use crate::flow::{FlowCommand, FlowLog, SwitchControl};
use crate::registrar::{Link, LinkRegistrar};
use crate::substrate::{LinkParams, MemorySubstrate, NodeParams, Substrate};
use crate::topology::{NetworkError, NodeId, NodeRole, TopologyGraph};

use log::*;
use std::collections::{BTreeMap, HashMap};

/// # Data Center Network
///
/// Multi-tenant network of logical datacenters, switches and compute endpoints. Links are
/// created in the emulation substrate `S`, and chains are programmed through the switch command
/// interface `C`. By default, nothing is emulated: [`MemorySubstrate`] only assigns ports, and
/// [`FlowLog`] only records the flow directives.
#[derive(Debug)]
pub struct DcNetwork<S: Substrate = MemorySubstrate, C: SwitchControl = FlowLog> {
    graph: TopologyGraph,
    datacenters: BTreeMap<String, Datacenter>,
    dc_counter: usize,
    addresses: AddressPool,
    links: Vec<Link>,
    substrate: S,
    switches: C,
}

impl Default for DcNetwork {
    fn default() -> Self {
        Self::new(MemorySubstrate::new(), FlowLog::new())
    }
}

impl<S: Substrate, C: SwitchControl> DcNetwork<S, C> {
    /// Generate an empty network, using the default address pool `10.0.0.0/8`.
    pub fn new(substrate: S, switches: C) -> Self {
        Self {
            graph: TopologyGraph::new(),
            datacenters: BTreeMap::new(),
            dc_counter: 1,
            addresses: AddressPool::default(),
            links: Vec::new(),
            substrate,
            switches,
        }
    }

    /// Use a different address pool for compute endpoints.
    pub fn with_address_pool(mut self, pool: AddressPool) -> Self {
        self.addresses = pool;
        self
    }

    fn registrar(&mut self) -> LinkRegistrar<'_, S> {
        LinkRegistrar::new(
            &mut self.graph,
            &self.datacenters,
            &mut self.addresses,
            &mut self.substrate,
        )
    }

    // ********************
    // * Topology Changes *
    // ********************

    /// Create a logical datacenter together with its gateway switch. The datacenters are named
    /// `dc1`, `dc2`, ... in the order they are added, and their gateway is `dc<n>.s1`. If the
    /// label is already used, [`NetworkError::DuplicateNode`] is returned, and the network is
    /// left unchanged. If the gateway cannot be created, the datacenter is not added,
    /// but its name `dc<n>` is not handed out again.
    pub fn add_datacenter(
        &mut self,
        label: impl Into<String>,
        metadata: HashMap<String, String>,
    ) -> Result<&Datacenter, NetworkError> {
        let label = label.into();
        if self.datacenters.contains_key(&label) {
            return Err(NetworkError::DuplicateNode(label));
        }
        let dc = Datacenter::new(label.clone(), self.dc_counter, metadata);
        // the name is used up, even if the gateway cannot be created
        self.dc_counter += 1;
        if self.graph.contains_node(dc.switch()) {
            return Err(NetworkError::DuplicateNode(dc.switch().to_string()));
        }
        let result = self.registrar().add_switch(
            dc.switch(),
            NodeRole::DatacenterGateway,
            &NodeParams::default(),
        );
        if let Err(e) = result {
            warn!("Cannot create the gateway of data center {}: {}", label, e);
            self.graph.remove_node(dc.switch())?;
            return Err(e);
        }
        info!("added data center: {}", label);
        Ok(self.datacenters.entry(label).or_insert(dc))
    }

    /// Add a switch. Adding a switch with a name that already exists in the graph does not
    /// change the graph, but the substrate decides if it accepts the name twice.
    pub fn add_switch(&mut self, name: &str, params: &NodeParams) -> Result<NodeId, NetworkError> {
        self.registrar().add_switch(name, NodeRole::Switch, params)
    }

    /// Add a compute endpoint that is not part of any datacenter.
    pub fn add_compute(&mut self, name: &str, params: &NodeParams) -> Result<NodeId, NetworkError> {
        self.registrar().add_compute(name, params)
    }

    /// Remove a compute endpoint with all its links.
    pub fn remove_compute(&mut self, name: &str) -> Result<(), NetworkError> {
        self.registrar().remove_compute(name)?;
        for dc in self.datacenters.values_mut() {
            dc.remove_compute(name);
        }
        self.links.retain(|l| l.node1 != name && l.node2 != name);
        info!("removed compute endpoint: {}", name);
        Ok(())
    }

    /// Create a link between two nodes. Both nodes may be given by their name, or by the label of
    /// a datacenter, which refers to its gateway switch.
    pub fn add_link(
        &mut self,
        node1: &str,
        node2: &str,
        params: LinkParams,
    ) -> Result<&Link, NetworkError> {
        let link = self.registrar().add_link(node1, node2, params)?;
        self.links.push(link);
        Ok(&self.links[self.links.len() - 1])
    }

    /// Start a compute endpoint inside a datacenter, and connect it to the gateway of the
    /// datacenter. If the link cannot be created, the endpoint is removed again, such that the
    /// call can be retried with the same name.
    pub fn start_compute(
        &mut self,
        dc_label: &str,
        name: &str,
        params: &NodeParams,
        link_params: LinkParams,
    ) -> Result<ComputeDescriptor, NetworkError> {
        if !self.datacenters.contains_key(dc_label) {
            return Err(NetworkError::NodeNotFound(dc_label.to_string()));
        }
        if self.graph.contains_node(name) {
            return Err(NetworkError::DuplicateNode(name.to_string()));
        }
        self.add_compute(name, params)?;
        let linked = self.add_link(name, dc_label, link_params).map(|_| ());
        if let Err(e) = linked {
            warn!("Cannot connect {} to data center {}: {}", name, dc_label, e);
            self.registrar().remove_compute(name)?;
            return Err(e);
        }
        if let Some(dc) = self.datacenters.get_mut(dc_label) {
            dc.push_compute(name.to_string());
        }
        info!("started compute endpoint {} in data center {}", name, dc_label);
        self.describe_compute(dc_label, name)
    }

    /// Stop a compute endpoint running in a datacenter.
    pub fn stop_compute(&mut self, dc_label: &str, name: &str) -> Result<(), NetworkError> {
        match self.datacenters.get(dc_label) {
            Some(dc) if dc.contains_compute(name) => self.remove_compute(name),
            Some(_) => Err(NetworkError::NodeNotFound(name.to_string())),
            None => Err(NetworkError::NodeNotFound(dc_label.to_string())),
        }
    }

    /// Start all nodes in the substrate.
    pub fn start(&mut self) -> Result<(), NetworkError> {
        info!("Starting the network");
        Ok(self.substrate.start()?)
    }

    /// Stop all nodes in the substrate.
    pub fn stop(&mut self) -> Result<(), NetworkError> {
        info!("Stopping the network");
        Ok(self.substrate.stop()?)
    }

    // **********
    // * Chains *
    // **********

    /// Install the chain from `src` to `dst` on all switches along the shortest path.
    pub fn start_chain(&mut self, src: &str, dst: &str) -> Result<ChainReport, NetworkError> {
        self.set_chain(src, dst, FlowCommand::Install)
    }

    /// Remove the chain from `src` to `dst` from all switches along the shortest path.
    pub fn stop_chain(&mut self, src: &str, dst: &str) -> Result<ChainReport, NetworkError> {
        self.set_chain(src, dst, FlowCommand::Remove)
    }

    /// Install or remove the chain from `src` to `dst`. If the walk fails half way, the switches
    /// programmed so far keep their flows.
    pub fn set_chain(
        &mut self,
        src: &str,
        dst: &str,
        command: FlowCommand,
    ) -> Result<ChainReport, NetworkError> {
        ChainPlanner::new(&self.graph).execute(&mut self.switches, src, dst, command)
    }

    /// Compute the directives of a chain without sending them to any switch.
    pub fn plan_chain(
        &self,
        src: &str,
        dst: &str,
        command: FlowCommand,
    ) -> Result<ChainReport, NetworkError> {
        ChainPlanner::new(&self.graph).plan(src, dst, command)
    }

    // **************
    // * Inspection *
    // **************

    /// Returns a list of all compute endpoints of all datacenters, ordered by the datacenter
    /// label.
    pub fn list_all_compute(&self) -> Result<Vec<ComputeDescriptor>, NetworkError> {
        let mut result = Vec::new();
        for dc in self.datacenters.values() {
            for name in dc.list_compute() {
                result.push(self.describe_compute(dc.label(), name)?);
            }
        }
        Ok(result)
    }

    fn describe_compute(
        &self,
        dc_label: &str,
        name: &str,
    ) -> Result<ComputeDescriptor, NetworkError> {
        let interfaces = self
            .graph
            .edges_from(name)?
            .into_iter()
            .map(|(peer, ports)| InterfaceDescriptor {
                port_id: ports.src_port_id.clone(),
                port: ports.src_port,
                peer: peer.to_string(),
            })
            .collect();
        Ok(ComputeDescriptor {
            name: name.to_string(),
            datacenter: dc_label.to_string(),
            interfaces,
        })
    }

    /// Returns the datacenter with the given label
    pub fn datacenter(&self, label: &str) -> Option<&Datacenter> {
        self.datacenters.get(label)
    }

    /// Returns all datacenters, ordered by label
    pub fn get_all_datacenters(&self) -> impl Iterator<Item = &Datacenter> {
        self.datacenters.values()
    }

    /// Returns the role of a node
    pub fn node_role(&self, name: &str) -> Result<NodeRole, NetworkError> {
        self.graph.role(name)
    }

    /// Returns all links, in the order they were added. Each physical link is listed once.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Returns a reference to the topology graph
    pub fn graph(&self) -> &TopologyGraph {
        &self.graph
    }

    /// Returns a reference to the emulation substrate
    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    /// Returns a mutable reference to the emulation substrate
    pub fn substrate_mut(&mut self) -> &mut S {
        &mut self.substrate
    }

    /// Returns a reference to the switch command interface
    pub fn switch_control(&self) -> &C {
        &self.switches
    }

    /// Returns a mutable reference to the switch command interface
    pub fn switch_control_mut(&mut self) -> &mut C {
        &mut self.switches
    }
}
