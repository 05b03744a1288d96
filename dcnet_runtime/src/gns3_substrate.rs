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

//! # GNS3 Emulation Substrate
//!
//! Creates the emulated network inside a GNS3 project. Switches are instances of the Open vSwitch
//! appliance, and compute endpoints are docker containers.

use crate::console::{console_of, ShellConnection};
use crate::ovs_conn::OvsSwitchControl;

use dcnet::substrate::{LinkClass, LinkParams, NodeParams, Substrate, SubstrateError};
use dcnet::topology::PortNumber;
use gns3::{GNS3Link, GNS3Node, GNS3Server};

use log::*;
use std::collections::HashMap;
use std::thread;

/// Template used for switches, if the node parameters do not name one
pub const SWITCH_TEMPLATE_NAME: &str = "Open vSwitch";
/// Docker image used for compute endpoints, if the node parameters do not name one
pub const COMPUTE_IMAGE: &str = "alpine:latest";
/// Number of network adapters of each compute endpoint
pub const COMPUTE_ADAPTERS: u32 = 8;

/// A node inside the GNS3 project
#[derive(Debug, Clone)]
struct PhysicalNode {
    gns_node: GNS3Node,
    is_compute: bool,
    next_iface: usize,
    /// Interface name and address, configured once the node is started
    addresses: Vec<(String, String)>,
}

impl PhysicalNode {
    fn new(gns_node: GNS3Node, is_compute: bool) -> Self {
        Self { gns_node, is_compute, next_iface: 0, addresses: Vec::new() }
    }

    fn free_interface(&self) -> Result<usize, SubstrateError> {
        if self.next_iface < self.gns_node.interfaces.len() {
            Ok(self.next_iface)
        } else {
            Err(SubstrateError::NoFreeInterface(self.gns_node.name.clone()))
        }
    }
}

/// # GNS3 Substrate
///
/// Holds the reference to the GNS3 server and owns the project. When creating a new instance, any
/// project with the same name is deleted first. Unless the project is marked as persistent, it is
/// deleted again when the substrate is dropped.
///
/// The port number of the interface `ethN` is `N + 1`, both on switches and on compute endpoints.
/// Addresses of compute endpoints are configured on their console during [`Substrate::start`].
#[derive(Debug)]
pub struct Gns3Substrate {
    server: GNS3Server,
    project_id: String,
    templates: HashMap<String, String>,
    nodes: HashMap<String, PhysicalNode>,
    links: Vec<GNS3Link>,
    persistent_gns_project: bool,
}

impl Gns3Substrate {
    /// Create a new project on the GNS3 server running on `localhost:3080`.
    pub fn new(
        project_name: impl AsRef<str>,
        persistent_gns_project: bool,
    ) -> Result<Self, SubstrateError> {
        Self::connect("localhost", 3080, project_name, persistent_gns_project)
    }

    /// Create a new project on the given GNS3 server.
    pub fn connect(
        address: impl AsRef<str>,
        port: u32,
        project_name: impl AsRef<str>,
        persistent_gns_project: bool,
    ) -> Result<Self, SubstrateError> {
        let name = project_name.as_ref();
        let mut server = GNS3Server::new(address, port).map_err(backend)?;

        // delete the project if it already exists
        if let Some(project) =
            server.get_projects().map_err(backend)?.into_iter().find(|p| p.name == name)
        {
            info!("Deleting the existing project {}", name);
            server.delete_project(project.id).map_err(backend)?;
        }

        let project_id = server.create_project(name).map_err(backend)?.id;
        info!("Created the GNS3 project {} ({})", name, project_id);

        Ok(Self {
            server,
            project_id,
            templates: HashMap::new(),
            nodes: HashMap::new(),
            links: Vec::new(),
            persistent_gns_project,
        })
    }

    /// Switch control for the switches of this project
    pub fn switch_control(&self) -> OvsSwitchControl {
        OvsSwitchControl::new(self.server.clone())
    }

    /// Handle to the GNS3 server, with the project opened
    pub fn server(&self) -> &GNS3Server {
        &self.server
    }

    /// ID of the GNS3 project
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// GNS3 representation of a node
    pub fn gns_node(&self, name: &str) -> Option<&GNS3Node> {
        self.nodes.get(name).map(|n| &n.gns_node)
    }

    /// All links created in the project
    pub fn gns_links(&self) -> &[GNS3Link] {
        &self.links
    }

    fn template_id(&mut self, name: &str) -> Result<String, SubstrateError> {
        if let Some(id) = self.templates.get(name) {
            return Ok(id.clone());
        }
        let template = self
            .server
            .find_template(name)
            .map_err(backend)?
            .ok_or_else(|| SubstrateError::NoTemplate(name.to_string()))?;
        self.templates.insert(name.to_string(), template.id.clone());
        Ok(template.id)
    }

    fn check_new(&self, name: &str) -> Result<(), SubstrateError> {
        if self.nodes.contains_key(name) {
            Err(SubstrateError::NodeExists(name.to_string()))
        } else {
            Ok(())
        }
    }

    fn node(&self, name: &str) -> Result<&PhysicalNode, SubstrateError> {
        self.nodes.get(name).ok_or_else(|| SubstrateError::UnknownNode(name.to_string()))
    }

    /// Remember the address of the compute endpoint, for configuring it once it runs.
    fn record_address(&mut self, name: &str, iface: usize, ip: Option<&String>) {
        if let (Some(node), Some(ip)) = (self.nodes.get_mut(name), ip) {
            if !node.is_compute {
                return;
            }
            if let Some(iface) = node.gns_node.interface(iface) {
                node.addresses.push((iface.name.clone(), ip.clone()));
            }
        }
    }

    fn configure_addresses(&self) -> Result<(), SubstrateError> {
        info!("configuring compute endpoints...");
        let jobs = self
            .nodes
            .values()
            .filter(|n| n.is_compute && !n.addresses.is_empty())
            .cloned()
            .map(|node| thread::spawn(move || configure_node(&node)))
            .collect::<Vec<_>>();

        for handle in jobs {
            match handle.join() {
                Ok(result) => result?,
                Err(_) => {
                    return Err(SubstrateError::Backend(
                        "address configuration thread panicked".to_string(),
                    ))
                }
            }
        }
        Ok(())
    }
}

impl Substrate for Gns3Substrate {
    fn create_switch(&mut self, name: &str, params: &NodeParams) -> Result<(), SubstrateError> {
        self.check_new(name)?;
        let template = params.template.as_deref().unwrap_or(SWITCH_TEMPLATE_NAME);
        let template_id = self.template_id(template)?;
        let node = self.server.create_node(name, template_id).map_err(backend)?;
        debug!("Created switch {} with {} interfaces", name, node.interfaces.len());
        self.nodes.insert(name.to_string(), PhysicalNode::new(node, false));
        Ok(())
    }

    fn create_compute(&mut self, name: &str, params: &NodeParams) -> Result<(), SubstrateError> {
        self.check_new(name)?;
        let image = params.template.as_deref().unwrap_or(COMPUTE_IMAGE);
        let node =
            self.server.create_docker_node(name, image, COMPUTE_ADAPTERS).map_err(backend)?;
        debug!("Created compute endpoint {} from image {}", name, image);
        self.nodes.insert(name.to_string(), PhysicalNode::new(node, true));
        Ok(())
    }

    fn remove_compute(&mut self, name: &str) -> Result<(), SubstrateError> {
        let node_id = self.node(name)?.gns_node.id.clone();
        self.server.delete_node(&node_id).map_err(backend)?;
        self.nodes.remove(name);
        self.links.retain(|l| l.nodes.iter().all(|e| e.node_id != node_id));
        Ok(())
    }

    fn create_link(
        &mut self,
        node_a: &str,
        node_b: &str,
        params: &LinkParams,
    ) -> Result<(PortNumber, PortNumber), SubstrateError> {
        let a = self.node(node_a)?;
        let b = self.node(node_b)?;
        let iface_a = a.free_interface()?;
        let iface_b = b.free_interface()?;

        let link = self
            .server
            .create_link(&a.gns_node, iface_a, &b.gns_node, iface_b)
            .map_err(backend)?;

        if params.class == LinkClass::TrafficControlled {
            if let Some(delay) = params.delay.as_deref() {
                match parse_delay_ms(delay) {
                    Some(ms) => {
                        self.server.set_link_delay(&link.id, ms).map_err(backend)?;
                    }
                    None => warn!("Cannot parse the delay {:?}, link is not delayed", delay),
                }
            }
            if let Some(bw) = params.bandwidth {
                warn!("GNS3 cannot limit the bandwidth, ignoring {} Mbit/s", bw);
            }
        }

        // both nodes exist, checked above
        for (name, iface) in [(node_a, iface_a), (node_b, iface_b)].iter() {
            if let Some(node) = self.nodes.get_mut(*name) {
                node.next_iface = iface + 1;
            }
        }
        self.record_address(node_a, iface_a, params.params1.ip.as_ref());
        self.record_address(node_b, iface_b, params.params2.ip.as_ref());
        self.links.push(link);

        Ok((iface_a as PortNumber + 1, iface_b as PortNumber + 1))
    }

    fn start(&mut self) -> Result<(), SubstrateError> {
        info!("Starting the network...");
        self.server.start_all_nodes().map_err(backend)?;
        self.configure_addresses()
    }

    fn stop(&mut self) -> Result<(), SubstrateError> {
        info!("Stopping the network...");
        self.server.stop_all_nodes().map_err(backend)
    }
}

impl Drop for Gns3Substrate {
    fn drop(&mut self) {
        if !self.persistent_gns_project {
            if let Err(e) = self.server.delete_project(&self.project_id) {
                error!("Cannot delete the GNS3 project {}: {}", self.project_id, e);
            }
        }
    }
}

fn configure_node(node: &PhysicalNode) -> Result<(), SubstrateError> {
    let name = &node.gns_node.name;
    let (host, port) = console_of(&node.gns_node)
        .ok_or_else(|| SubstrateError::Backend(format!("{} has no console", name)))?;
    let mut c = ShellConnection::new(&host, port)
        .map_err(|e| SubstrateError::Backend(format!("Cannot connect to {}: {}", name, e)))?;
    for (iface, ip) in node.addresses.iter() {
        debug!("{}: {} on {}", name, ip, iface);
        let commands =
            [format!("ip addr add {} dev {}", ip, iface), format!("ip link set {} up", iface)];
        for command in commands.iter() {
            c.execute(command).map_err(|e| SubstrateError::Backend(format!("{}: {}", name, e)))?;
        }
    }
    Ok(())
}

/// Parse a delay like `10ms`, `1.5s` or `200us` into milliseconds. A value without unit is
/// interpreted as milliseconds.
fn parse_delay_ms(delay: &str) -> Option<u32> {
    let delay = delay.trim();
    let (value, factor) = if let Some(v) = delay.strip_suffix("ms") {
        (v, 1.0)
    } else if let Some(v) = delay.strip_suffix("us") {
        (v, 0.001)
    } else if let Some(v) = delay.strip_suffix('s') {
        (v, 1000.0)
    } else {
        (delay, 1.0)
    };
    let value: f64 = value.trim().parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some((value * factor).round() as u32)
    } else {
        None
    }
}

fn backend(e: gns3::Error) -> SubstrateError {
    SubstrateError::Backend(e.to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_delay() {
        assert_eq!(parse_delay_ms("10ms"), Some(10));
        assert_eq!(parse_delay_ms("1.5s"), Some(1500));
        assert_eq!(parse_delay_ms("2000us"), Some(2));
        assert_eq!(parse_delay_ms(" 7 "), Some(7));
        assert_eq!(parse_delay_ms("fast"), None);
        assert_eq!(parse_delay_ms("-1ms"), None);
    }

    #[test]
    fn test_gns3_substrate() {
        let mut substrate = match Gns3Substrate::new("DcNetSubstrateTestProject", false) {
            Ok(s) => s,
            Err(_) => return, // skip the test
        };
        let params = NodeParams::default();
        if substrate.create_switch("s1", &params).is_err() {
            return; // appliance is not installed
        }
        assert_eq!(
            substrate.create_switch("s1", &params),
            Err(SubstrateError::NodeExists("s1".to_string()))
        );
        substrate.create_compute("vnf1", &params).unwrap();
        let ports = substrate.create_link("vnf1", "s1", &LinkParams::default()).unwrap();
        assert_eq!(ports, (1, 1));
        let ports = substrate.create_link("vnf1", "s1", &LinkParams::default()).unwrap();
        assert_eq!(ports, (2, 2));
        assert_eq!(substrate.gns_links().len(), 2);

        substrate.remove_compute("vnf1").unwrap();
        assert!(substrate.gns_node("vnf1").is_none());
        assert!(substrate.gns_links().is_empty());
        assert_eq!(
            substrate.remove_compute("vnf1"),
            Err(SubstrateError::UnknownNode("vnf1".to_string()))
        );
    }
}
