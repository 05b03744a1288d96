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

//! Test building networks from topology description files.

use crate::flow::{FlowDirective, FlowLog};
use crate::substrate::{LinkClass, MemorySubstrate};
use crate::topology::{NetworkError, NodeRole};
use crate::topology_file::{TopologyDescription, TopologyFileError};

use std::fs;

const TOPOLOGY: &str = r#"{
    "address_pool": { "base": "192.168.0.0", "prefix_len": 24 },
    "datacenters": [
        { "label": "dc-a", "metadata": { "region": "eu" } },
        { "label": "dc-b" }
    ],
    "switches": [ { "name": "s1" } ],
    "computes": [
        { "name": "vnf1", "datacenter": "dc-a" },
        { "name": "vnf2", "datacenter": "dc-b", "link": { "params1": { "id": "eth0" } } },
        { "name": "client", "template": "alpine" }
    ],
    "links": [
        { "node1": "dc-a", "node2": "s1", "bandwidth": 100.0, "delay": "5ms" },
        { "node1": "s1", "node2": "dc-b", "class": "plain" },
        { "node1": "client", "node2": "s1" }
    ],
    "chains": [ { "src": "vnf1", "dst": "vnf2" } ]
}"#;

#[test]
fn test_parse() {
    let desc: TopologyDescription = TOPOLOGY.parse().unwrap();
    assert_eq!(desc.datacenters.len(), 2);
    assert_eq!(desc.datacenters[0].metadata.get("region").map(|s| s.as_str()), Some("eu"));
    assert!(desc.datacenters[1].metadata.is_empty());
    assert_eq!(desc.computes[1].link.params1.id.as_deref(), Some("eth0"));
    assert_eq!(desc.computes[2].datacenter, None);
    assert_eq!(desc.computes[2].params.template.as_deref(), Some("alpine"));
    assert_eq!(desc.links[0].params.bandwidth, Some(100.0));
    assert_eq!(desc.links[0].params.class, LinkClass::TrafficControlled);
    assert_eq!(desc.links[1].params.class, LinkClass::Plain);
    assert_eq!(desc.chains[0].src, "vnf1");
}

#[test]
fn test_empty_description() {
    let desc: TopologyDescription = "{}".parse().unwrap();
    assert_eq!(desc, TopologyDescription::default());
    let net = desc.into_network(MemorySubstrate::new(), FlowLog::new()).unwrap();
    assert_eq!(net.graph().num_nodes(), 0);
}

#[test]
fn test_build() {
    let desc: TopologyDescription = TOPOLOGY.parse().unwrap();
    let mut net = desc.into_network(MemorySubstrate::new(), FlowLog::new()).unwrap();

    assert_eq!(net.graph().num_nodes(), 6);
    assert_eq!(net.links().len(), 5);
    assert_eq!(net.node_role("dc2.s1"), Ok(NodeRole::DatacenterGateway));
    assert_eq!(net.node_role("client"), Ok(NodeRole::ComputeEndpoint));

    let all = net.list_all_compute().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].interfaces[0].port_id, "eth0");

    let links = net.substrate().links();
    assert_eq!(links[0].params.params1.ip.as_deref(), Some("192.168.0.1/24"));
    assert_eq!(links[1].params.params1.ip.as_deref(), Some("192.168.0.2/24"));
    assert_eq!(links[2].params.bandwidth, Some(100.0));
    assert_eq!(links[2].params.delay.as_deref(), Some("5ms"));
    assert_eq!(links[3].params.class, LinkClass::Plain);
    assert_eq!(links[4].params.params1.ip.as_deref(), Some("192.168.0.3/24"));

    let chain = &desc.chains[0];
    let report = net.start_chain(&chain.src, &chain.dst).unwrap();
    assert_eq!(report.path, vec!["vnf1", "dc1.s1", "s1", "dc2.s1", "vnf2"]);
    assert_eq!(
        report.directives,
        vec![
            FlowDirective::install("dc1.s1", 1, 2),
            FlowDirective::install("s1", 1, 2),
            FlowDirective::install("dc2.s1", 2, 1),
        ]
    );
}

#[test]
fn test_from_file() {
    let path = std::env::temp_dir().join(format!("dcnet-topology-{}.json", std::process::id()));
    fs::write(&path, TOPOLOGY).unwrap();
    let desc = TopologyDescription::from_file(&path).unwrap();
    fs::remove_file(&path).unwrap();
    assert_eq!(desc.switches[0].name, "s1");

    let missing = std::env::temp_dir().join("dcnet-topology-does-not-exist.json");
    assert!(matches!(TopologyDescription::from_file(&missing), Err(TopologyFileError::Io(_))));
}

#[test]
fn test_invalid_json() {
    let result = r#"{ "switches": [ { "nme": "s1" } ] }"#.parse::<TopologyDescription>();
    assert!(matches!(result, Err(TopologyFileError::Json(_))));
}

#[test]
fn test_unknown_link_endpoint() {
    let desc: TopologyDescription =
        r#"{ "switches": [ { "name": "s1" } ], "links": [ { "node1": "s1", "node2": "s2" } ] }"#
            .parse()
            .unwrap();
    match desc.into_network(MemorySubstrate::new(), FlowLog::new()) {
        Err(TopologyFileError::Network(e)) => {
            assert_eq!(e, NetworkError::NodeNotFound("s2".to_string()))
        }
        _ => panic!("expected a network error"),
    }
}
