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

//! # GNS3 Types

use serde::{Deserialize, Serialize};

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, Clone)]
pub(crate) struct GNS3ResponseVersion {
    pub version: String,
}

/// Project Information
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GNS3Project {
    /// ID of the project
    #[serde(rename = "project_id")]
    pub id: String,
    /// Name of the project
    pub name: String,
    /// Status of the project
    pub status: GNS3ProjectStatus,
}

/// Project Status
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum GNS3ProjectStatus {
    /// The project is opened
    Opened,
    /// The project is closed
    Closed,
}

/// Node Information
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GNS3Node {
    /// ID of the node
    #[serde(rename = "node_id")]
    pub id: String,
    /// name of the node
    pub name: String,
    /// type of the node (e.g., docker or qemu)
    pub node_type: String,
    /// Telnet console port, if the node has a console
    #[serde(rename = "console")]
    pub console_port: Option<u16>,
    /// Host on which the console is reachable
    #[serde(default)]
    pub console_host: Option<String>,
    /// Status of the node
    pub status: GNS3NodeStatus,
    /// All interfaces of the node
    #[serde(rename = "ports")]
    pub interfaces: Vec<GNS3Interface>,
}

impl GNS3Node {
    /// Returns the interface with the given index, in the order reported by the server.
    pub fn interface(&self, index: usize) -> Option<&GNS3Interface> {
        self.interfaces.get(index)
    }
}

/// Node Status
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum GNS3NodeStatus {
    /// Node is stopped
    Stopped,
    /// Node is started
    Started,
    /// Node is suspended
    Suspended,
}

impl GNS3NodeStatus {
    /// Returns true if the node is started
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started)
    }
    /// Returns true if the node is stopped
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// Interface Information
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GNS3Interface {
    /// adapter number
    pub adapter_number: u32,
    /// port number
    pub port_number: u32,
    /// Name of the interface
    pub name: String,
}

/// GNS3 Template
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GNS3Template {
    /// ID of the template
    #[serde(rename = "template_id")]
    pub id: String,
    /// name of the template
    pub name: String,
    /// Type of the template (e.g. docker).
    pub template_type: String,
}

/// Link data
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GNS3Link {
    /// ID of the link
    #[serde(rename = "link_id")]
    pub id: String,
    /// nodes which the link connects
    pub nodes: [GNS3LinkEndpoint; 2],
}

/// Endpoint of a link
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GNS3LinkEndpoint {
    /// ID of the node for which the link is configured
    pub node_id: String,
    /// adapter number
    pub adapter_number: u32,
    /// port number
    pub port_number: u32,
}

impl GNS3LinkEndpoint {
    /// Create a link endpoint from a node, and the index of the interface. Returns `None` if the
    /// node has no such interface.
    pub fn from_node(node: &GNS3Node, iface_id: usize) -> Option<Self> {
        node.interface(iface_id).map(|iface| Self {
            node_id: node.id.clone(),
            adapter_number: iface.adapter_number,
            port_number: iface.port_number,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const NODE: &str = r#"{
        "node_id": "a5b0f2d4-9f3c-4bd1-8c55-3f1e2b7a9c01",
        "name": "dc1.s1",
        "node_type": "docker",
        "console": 5000,
        "console_host": "127.0.0.1",
        "status": "stopped",
        "ports": [
            { "adapter_number": 0, "port_number": 0, "name": "eth0", "short_name": "e0" },
            { "adapter_number": 1, "port_number": 0, "name": "eth1", "short_name": "e1" }
        ],
        "x": 0,
        "y": 0
    }"#;

    #[test]
    fn parse_node() {
        let node: GNS3Node = serde_json::from_str(NODE).unwrap();
        assert_eq!(node.name, "dc1.s1");
        assert_eq!(node.console_port, Some(5000));
        assert!(node.status.is_stopped());
        assert_eq!(node.interfaces.len(), 2);
    }

    #[test]
    fn link_endpoint() {
        let node: GNS3Node = serde_json::from_str(NODE).unwrap();
        let endpoint = GNS3LinkEndpoint::from_node(&node, 1).unwrap();
        assert_eq!(endpoint.adapter_number, 1);
        assert_eq!(endpoint.port_number, 0);
        assert_eq!(GNS3LinkEndpoint::from_node(&node, 2), None);
    }
}
