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

//! # Emulation Substrate
//!
//! The substrate creates and runs the actual switches and compute endpoints, and wires them
//! together. The network only refers to the resources of the substrate by their name and by
//! the port numbers the substrate assigns.

use crate::topology::PortNumber;

use log::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors reported by the emulation substrate
#[derive(Error, Debug, PartialEq, Clone)]
pub enum SubstrateError {
    /// The node does not exist in the substrate
    #[error("Node {0} is not known to the emulation substrate")]
    UnknownNode(String),
    /// A node with the same name was already created
    #[error("Node {0} already exists in the emulation substrate")]
    NodeExists(String),
    /// All interfaces of the node are already connected
    #[error("Node {0} has no free interface left")]
    NoFreeInterface(String),
    /// No template or image is available for the node
    #[error("No template available for node {0}")]
    NoTemplate(String),
    /// Error of the emulation backend
    #[error("Emulation backend error: {0}")]
    Backend(String),
}

/// Parameters for creating a switch or a compute endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeParams {
    /// Name of the template (or image) to instantiate. If `None`, the substrate uses its default.
    pub template: Option<String>,
}

/// Parameters of one side of a link
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceParams {
    /// Logical port id, used instead of the port number to describe the interface
    pub id: Option<String>,
    /// Address of the interface, in the form `10.0.0.1/8`. Only used for compute endpoints.
    pub ip: Option<String>,
}

/// Class of the link created by the substrate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkClass {
    /// Plain link without any shaping
    Plain,
    /// Link that supports bandwidth and delay shaping
    TrafficControlled,
}

impl Default for LinkClass {
    fn default() -> Self {
        Self::TrafficControlled
    }
}

/// Parameters of a link
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkParams {
    /// Parameters of the interface on the first node
    pub params1: InterfaceParams,
    /// Parameters of the interface on the second node
    pub params2: InterfaceParams,
    /// Class of the link
    pub class: LinkClass,
    /// Bandwidth limit in Mbit/s
    pub bandwidth: Option<f64>,
    /// Delay of the link, e.g. `"10ms"`
    pub delay: Option<String>,
}

/// # Emulation Substrate
///
/// Interface to the system that creates and runs the emulated nodes. All calls are blocking.
pub trait Substrate {
    /// Create a new switch
    fn create_switch(&mut self, name: &str, params: &NodeParams) -> Result<(), SubstrateError>;

    /// Create a new compute endpoint
    fn create_compute(&mut self, name: &str, params: &NodeParams) -> Result<(), SubstrateError>;

    /// Tear down a compute endpoint
    fn remove_compute(&mut self, name: &str) -> Result<(), SubstrateError>;

    /// Connect two nodes, and return the port numbers assigned on `node_a` and `node_b`.
    fn create_link(
        &mut self,
        node_a: &str,
        node_b: &str,
        params: &LinkParams,
    ) -> Result<(PortNumber, PortNumber), SubstrateError>;

    /// Start all nodes
    fn start(&mut self) -> Result<(), SubstrateError> {
        Ok(())
    }

    /// Stop all nodes
    fn stop(&mut self) -> Result<(), SubstrateError> {
        Ok(())
    }
}

impl<T: Substrate + ?Sized> Substrate for Box<T> {
    fn create_switch(&mut self, name: &str, params: &NodeParams) -> Result<(), SubstrateError> {
        (**self).create_switch(name, params)
    }

    fn create_compute(&mut self, name: &str, params: &NodeParams) -> Result<(), SubstrateError> {
        (**self).create_compute(name, params)
    }

    fn remove_compute(&mut self, name: &str) -> Result<(), SubstrateError> {
        (**self).remove_compute(name)
    }

    fn create_link(
        &mut self,
        node_a: &str,
        node_b: &str,
        params: &LinkParams,
    ) -> Result<(PortNumber, PortNumber), SubstrateError> {
        (**self).create_link(node_a, node_b, params)
    }

    fn start(&mut self) -> Result<(), SubstrateError> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<(), SubstrateError> {
        (**self).stop()
    }
}

/// Kind of a node created in the [`MemorySubstrate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryNodeKind {
    /// Switch
    Switch,
    /// Compute endpoint
    Compute,
}

/// Link created in the [`MemorySubstrate`]
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryLink {
    /// First node
    pub node_a: String,
    /// Port on the first node
    pub port_a: PortNumber,
    /// Second node
    pub node_b: String,
    /// Port on the second node
    pub port_b: PortNumber,
    /// Parameters the link was created with
    pub params: LinkParams,
}

/// # In-Memory Substrate
///
/// Substrate that only keeps track of the nodes and links, without running anything. Ports are
/// numbered per node, starting at 1, in the order in which the links are created. Port numbers
/// are never reused. This substrate is used for planning chains offline.
#[derive(Debug, Clone, Default)]
pub struct MemorySubstrate {
    nodes: HashMap<String, MemoryNodeKind>,
    next_port: HashMap<String, PortNumber>,
    links: Vec<MemoryLink>,
    max_ports: Option<PortNumber>,
    running: bool,
}

impl MemorySubstrate {
    /// Create an empty substrate
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of ports on every node.
    pub fn with_max_ports(mut self, max_ports: PortNumber) -> Self {
        self.max_ports = Some(max_ports);
        self
    }

    /// Returns the kind of the node, if it exists
    pub fn node_kind(&self, name: &str) -> Option<MemoryNodeKind> {
        self.nodes.get(name).copied()
    }

    /// Returns all links in the order they were created
    pub fn links(&self) -> &[MemoryLink] {
        &self.links
    }

    /// Returns true if the substrate was started and not stopped since.
    pub fn is_running(&self) -> bool {
        self.running
    }

    fn create_node(&mut self, name: &str, kind: MemoryNodeKind) -> Result<(), SubstrateError> {
        if self.nodes.contains_key(name) {
            return Err(SubstrateError::NodeExists(name.to_string()));
        }
        self.nodes.insert(name.to_string(), kind);
        self.next_port.insert(name.to_string(), 1);
        Ok(())
    }

    fn allocate_port(&mut self, name: &str) -> Result<PortNumber, SubstrateError> {
        let next = self
            .next_port
            .get_mut(name)
            .ok_or_else(|| SubstrateError::UnknownNode(name.to_string()))?;
        if matches!(self.max_ports, Some(max) if *next > max) {
            return Err(SubstrateError::NoFreeInterface(name.to_string()));
        }
        let port = *next;
        *next += 1;
        Ok(port)
    }
}

impl Substrate for MemorySubstrate {
    fn create_switch(&mut self, name: &str, _params: &NodeParams) -> Result<(), SubstrateError> {
        self.create_node(name, MemoryNodeKind::Switch)
    }

    fn create_compute(&mut self, name: &str, _params: &NodeParams) -> Result<(), SubstrateError> {
        self.create_node(name, MemoryNodeKind::Compute)
    }

    fn remove_compute(&mut self, name: &str) -> Result<(), SubstrateError> {
        match self.nodes.get(name).copied() {
            Some(MemoryNodeKind::Compute) => {
                self.nodes.remove(name);
                self.next_port.remove(name);
                self.links.retain(|l| l.node_a != name && l.node_b != name);
                Ok(())
            }
            _ => Err(SubstrateError::UnknownNode(name.to_string())),
        }
    }

    fn create_link(
        &mut self,
        node_a: &str,
        node_b: &str,
        params: &LinkParams,
    ) -> Result<(PortNumber, PortNumber), SubstrateError> {
        for name in [node_a, node_b].iter() {
            if !self.nodes.contains_key(*name) {
                return Err(SubstrateError::UnknownNode(name.to_string()));
            }
        }
        let port_a = self.allocate_port(node_a)?;
        let port_b = self.allocate_port(node_b)?;
        trace!("link {}:{} <-> {}:{}", node_a, port_a, node_b, port_b);
        self.links.push(MemoryLink {
            node_a: node_a.to_string(),
            port_a,
            node_b: node_b.to_string(),
            port_b,
            params: params.clone(),
        });
        Ok((port_a, port_b))
    }

    fn start(&mut self) -> Result<(), SubstrateError> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SubstrateError> {
        self.running = false;
        Ok(())
    }
}
