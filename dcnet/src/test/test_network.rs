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

//! Test datacenters, compute endpoints and the lifecycle of the network.

use crate::datacenter::InterfaceDescriptor;
use crate::flow::FlowLog;
use crate::substrate::{
    InterfaceParams, LinkParams, MemoryNodeKind, MemorySubstrate, NodeParams, Substrate,
    SubstrateError,
};
use crate::topology::{NetworkError, NodeRole};
use crate::DcNetwork;

use maplit::hashmap;

fn p() -> NodeParams {
    NodeParams::default()
}

/// # Test network
///
/// ```text
/// vnf1 --.                .-- vnf3
///         dc-a ---- dc-b
/// vnf2 --'
/// ```
fn get_test_net() -> DcNetwork {
    let mut net = DcNetwork::default();
    net.add_datacenter("dc-a", hashmap! {"region".to_string() => "eu".to_string()}).unwrap();
    net.add_datacenter("dc-b", hashmap! {}).unwrap();
    net.add_link("dc-a", "dc-b", LinkParams::default()).unwrap();
    net.start_compute("dc-a", "vnf1", &p(), LinkParams::default()).unwrap();
    net.start_compute("dc-a", "vnf2", &p(), LinkParams::default()).unwrap();
    net.start_compute("dc-b", "vnf3", &p(), LinkParams::default()).unwrap();
    net
}

#[test]
fn test_add_datacenter() {
    let mut net = DcNetwork::default();
    let dc = net.add_datacenter("dc-a", hashmap! {"region".to_string() => "eu".to_string()});
    let dc = dc.unwrap();
    assert_eq!(dc.label(), "dc-a");
    assert_eq!(dc.name(), "dc1");
    assert_eq!(dc.switch(), "dc1.s1");
    assert_eq!(dc.metadata().get("region").map(|s| s.as_str()), Some("eu"));

    assert_eq!(net.add_datacenter("dc-b", hashmap! {}).unwrap().switch(), "dc2.s1");
    assert_eq!(net.node_role("dc1.s1"), Ok(NodeRole::DatacenterGateway));
    assert_eq!(net.substrate().node_kind("dc2.s1"), Some(MemoryNodeKind::Switch));
}

#[test]
fn test_duplicate_datacenter() {
    let mut net = DcNetwork::default();
    net.add_datacenter("dc-a", hashmap! {"region".to_string() => "eu".to_string()}).unwrap();
    assert_eq!(
        net.add_datacenter("dc-a", hashmap! {}),
        Err(NetworkError::DuplicateNode("dc-a".to_string()))
    );
    assert_eq!(net.get_all_datacenters().count(), 1);
    assert_eq!(net.graph().num_nodes(), 1);
    assert_eq!(net.datacenter("dc-a").unwrap().metadata().len(), 1);

    // the next datacenter still gets the next name
    assert_eq!(net.add_datacenter("dc-b", hashmap! {}).unwrap().name(), "dc2");
}

#[test]
fn test_datacenter_gateway_rejected() {
    let mut net = DcNetwork::default();
    // the substrate already knows a node with the name of the first gateway
    net.substrate_mut().create_switch("dc1.s1", &p()).unwrap();

    assert_eq!(
        net.add_datacenter("dc-a", hashmap! {}),
        Err(NetworkError::Substrate(SubstrateError::NodeExists("dc1.s1".to_string())))
    );
    assert!(!net.graph().contains_node("dc1.s1"));
    assert!(net.datacenter("dc-a").is_none());

    // the next datacenter gets a fresh gateway
    let dc = net.add_datacenter("dc-b", hashmap! {}).unwrap();
    assert_eq!(dc.switch(), "dc2.s1");
    assert_eq!(net.node_role("dc2.s1"), Ok(NodeRole::DatacenterGateway));

    // and the failed label can be used again
    assert_eq!(net.add_datacenter("dc-a", hashmap! {}).unwrap().name(), "dc3");
    assert_eq!(net.get_all_datacenters().count(), 2);
}

#[test]
fn test_datacenter_gateway_name_taken() {
    let mut net = DcNetwork::default();
    net.add_switch("dc1.s1", &p()).unwrap();
    assert_eq!(
        net.add_datacenter("dc-a", hashmap! {}),
        Err(NetworkError::DuplicateNode("dc1.s1".to_string()))
    );
    assert_eq!(net.node_role("dc1.s1"), Ok(NodeRole::Switch));
    assert_eq!(net.add_datacenter("dc-a", hashmap! {}).unwrap().switch(), "dc2.s1");
}

#[test]
fn test_start_compute() {
    let mut net = DcNetwork::default();
    net.add_datacenter("dc-a", hashmap! {}).unwrap();
    let params = LinkParams {
        params1: InterfaceParams { id: Some("eth0".to_string()), ip: None },
        ..Default::default()
    };
    let desc = net.start_compute("dc-a", "vnf1", &p(), params).unwrap();
    assert_eq!(desc.name, "vnf1");
    assert_eq!(desc.datacenter, "dc-a");
    assert_eq!(
        desc.interfaces,
        vec![InterfaceDescriptor {
            port_id: "eth0".to_string(),
            port: 1,
            peer: "dc1.s1".to_string()
        }]
    );
    assert_eq!(net.datacenter("dc-a").unwrap().list_compute(), &["vnf1".to_string()]);
    assert_eq!(net.node_role("vnf1"), Ok(NodeRole::ComputeEndpoint));
}

#[test]
fn test_start_compute_errors() {
    let mut net = get_test_net();
    assert_eq!(
        net.start_compute("dc-x", "vnf4", &p(), LinkParams::default()),
        Err(NetworkError::NodeNotFound("dc-x".to_string()))
    );
    assert_eq!(
        net.start_compute("dc-b", "vnf1", &p(), LinkParams::default()),
        Err(NetworkError::DuplicateNode("vnf1".to_string()))
    );
    assert_eq!(net.datacenter("dc-b").unwrap().list_compute().len(), 1);
}

#[test]
fn test_start_compute_link_failure() {
    let mut net = DcNetwork::new(MemorySubstrate::new().with_max_ports(1), FlowLog::new());
    net.add_datacenter("dc-a", hashmap! {}).unwrap();
    net.start_compute("dc-a", "vnf1", &p(), LinkParams::default()).unwrap();

    // the gateway has no free port left
    assert_eq!(
        net.start_compute("dc-a", "vnf2", &p(), LinkParams::default()),
        Err(NetworkError::Substrate(SubstrateError::NoFreeInterface("dc1.s1".to_string())))
    );
    assert!(!net.graph().contains_node("vnf2"));
    assert_eq!(net.substrate().node_kind("vnf2"), None);
    assert_eq!(net.datacenter("dc-a").unwrap().list_compute(), &["vnf1".to_string()]);
    assert_eq!(net.links().len(), 1);

    // a retry fails for the same reason, not because of the name
    assert_eq!(
        net.start_compute("dc-a", "vnf2", &p(), LinkParams::default()),
        Err(NetworkError::Substrate(SubstrateError::NoFreeInterface("dc1.s1".to_string())))
    );
}

#[test]
fn test_list_all_compute() {
    let net = get_test_net();
    let all = net.list_all_compute().unwrap();
    let names: Vec<(&str, &str)> =
        all.iter().map(|c| (c.name.as_str(), c.datacenter.as_str())).collect();
    assert_eq!(names, vec![("vnf1", "dc-a"), ("vnf2", "dc-a"), ("vnf3", "dc-b")]);
    assert!(all.iter().all(|c| c.interfaces.len() == 1));
    assert_eq!(all[1].interfaces[0].peer, "dc1.s1");
    assert_eq!(all[1].interfaces[0].port, 1);
}

#[test]
fn test_stop_compute() {
    let mut net = get_test_net();
    assert_eq!(net.links().len(), 4);
    net.stop_compute("dc-a", "vnf1").unwrap();

    assert!(!net.graph().contains_node("vnf1"));
    assert_eq!(net.datacenter("dc-a").unwrap().list_compute(), &["vnf2".to_string()]);
    assert_eq!(net.links().len(), 3);
    assert_eq!(net.substrate().node_kind("vnf1"), None);
    assert_eq!(net.list_all_compute().unwrap().len(), 2);

    assert_eq!(
        net.stop_compute("dc-a", "vnf3"),
        Err(NetworkError::NodeNotFound("vnf3".to_string()))
    );
    assert_eq!(
        net.stop_compute("dc-x", "vnf3"),
        Err(NetworkError::NodeNotFound("dc-x".to_string()))
    );
    assert!(net.graph().contains_node("vnf3"));
}

#[test]
fn test_chain_after_stop_compute() {
    let mut net = get_test_net();
    net.start_chain("vnf1", "vnf3").unwrap();
    net.stop_compute("dc-b", "vnf3").unwrap();
    assert_eq!(
        net.start_chain("vnf1", "vnf3"),
        Err(NetworkError::NodeNotFound("vnf3".to_string()))
    );
}

#[test]
fn test_links() {
    let net = get_test_net();
    let links: Vec<(&str, &str)> =
        net.links().iter().map(|l| (l.node1.as_str(), l.node2.as_str())).collect();
    assert_eq!(
        links,
        vec![("dc1.s1", "dc2.s1"), ("vnf1", "dc1.s1"), ("vnf2", "dc1.s1"), ("vnf3", "dc2.s1")]
    );
    assert_eq!(net.graph().num_edges(), 2 * links.len());
}

#[test]
fn test_start_stop() {
    let mut net = get_test_net();
    assert!(!net.substrate().is_running());
    net.start().unwrap();
    assert!(net.substrate().is_running());
    net.stop().unwrap();
    assert!(!net.substrate().is_running());
}
