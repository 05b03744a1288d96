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

//! # Logical Datacenters
//!
//! A datacenter groups compute endpoints behind a single gateway switch.

use crate::topology::PortNumber;

use serde::Serialize;
use std::collections::HashMap;

/// Logical datacenter
#[derive(Debug, Clone, PartialEq)]
pub struct Datacenter {
    label: String,
    name: String,
    switch: String,
    metadata: HashMap<String, String>,
    compute: Vec<String>,
}

impl Datacenter {
    /// Create a new datacenter. `index` is used for the internal name (`dc<index>`), and for the
    /// name of the gateway switch (`dc<index>.s1`).
    pub(crate) fn new(label: String, index: usize, metadata: HashMap<String, String>) -> Self {
        let name = format!("dc{}", index);
        let switch = format!("{}.s1", name);
        Self { label, name, switch, metadata, compute: Vec::new() }
    }

    /// Label given by the user
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Internal name of the datacenter
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the gateway switch
    pub fn switch(&self) -> &str {
        &self.switch
    }

    /// Metadata attached to the datacenter
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Names of all compute endpoints running in this datacenter
    pub fn list_compute(&self) -> &[String] {
        &self.compute
    }

    /// Returns true if the compute endpoint runs in this datacenter
    pub fn contains_compute(&self, name: &str) -> bool {
        self.compute.iter().any(|c| c == name)
    }

    pub(crate) fn push_compute(&mut self, name: String) {
        self.compute.push(name);
    }

    pub(crate) fn remove_compute(&mut self, name: &str) {
        self.compute.retain(|c| c != name);
    }
}

/// Description of a compute endpoint, as returned by
/// [`DcNetwork::list_all_compute`](crate::DcNetwork::list_all_compute)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputeDescriptor {
    /// Name of the compute endpoint
    pub name: String,
    /// Label of the datacenter it runs in
    pub datacenter: String,
    /// All interfaces of the endpoint, in the order the links were created
    pub interfaces: Vec<InterfaceDescriptor>,
}

/// Interface of a compute endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceDescriptor {
    /// Logical port id
    pub port_id: String,
    /// Port number
    pub port: PortNumber,
    /// Name of the node on the other end of the link
    pub peer: String,
}
