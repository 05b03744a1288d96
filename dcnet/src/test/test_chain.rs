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

//! Test setting up and tearing down chains.

use crate::chain::{ChainPlanner, ChainState, FlowHop};
use crate::flow::{DeviceError, FlowAction, FlowCommand, FlowDirective, FlowEntry, FlowMatch};
use crate::substrate::{LinkParams, NodeParams};
use crate::topology::NetworkError;
use crate::DcNetwork;

use maplit::hashmap;

fn p() -> NodeParams {
    NodeParams::default()
}

/// # Test network
///
/// ```text
/// vnf1 ---- s1 ---- vnf2
///      1  1    2  1
/// ```
fn get_test_net() -> DcNetwork {
    let mut net = DcNetwork::default();
    net.add_compute("vnf1", &p()).unwrap();
    net.add_switch("s1", &p()).unwrap();
    net.add_compute("vnf2", &p()).unwrap();
    net.add_link("vnf1", "s1", LinkParams::default()).unwrap();
    net.add_link("s1", "vnf2", LinkParams::default()).unwrap();
    net
}

/// # Test network with two switches
///
/// ```text
/// vnf1 ---- s1 ---- s2 ---- vnf2
///      1  1    2  1    2  1
/// ```
fn get_test_net_long() -> DcNetwork {
    let mut net = DcNetwork::default();
    net.add_compute("vnf1", &p()).unwrap();
    net.add_switch("s1", &p()).unwrap();
    net.add_switch("s2", &p()).unwrap();
    net.add_compute("vnf2", &p()).unwrap();
    net.add_link("vnf1", "s1", LinkParams::default()).unwrap();
    net.add_link("s1", "s2", LinkParams::default()).unwrap();
    net.add_link("s2", "vnf2", LinkParams::default()).unwrap();
    net
}

#[test]
fn test_start_chain() {
    let mut net = get_test_net();
    let report = net.start_chain("vnf1", "vnf2").unwrap();
    assert_eq!(report.to_string(), "path added between vnf1 and vnf2");
    assert_eq!(report.path, vec!["vnf1", "s1", "vnf2"]);
    assert_eq!(report.directives, vec![FlowDirective::install("s1", 1, 2)]);

    let log = net.switch_control();
    assert_eq!(log.directives(), &[FlowDirective::install("s1", 1, 2)]);
    assert_eq!(log.directives()[0].to_string(), "add-flow s1 in_port=1,actions=output:2");
    assert_eq!(
        log.flow_table("s1"),
        &[FlowEntry { flow_match: FlowMatch { in_port: 1 }, action: FlowAction::Output(2) }]
    );
}

#[test]
fn test_stop_chain() {
    let mut net = get_test_net();
    net.start_chain("vnf1", "vnf2").unwrap();
    let report = net.stop_chain("vnf1", "vnf2").unwrap();
    assert_eq!(report.to_string(), "path removed between vnf1 and vnf2");
    assert_eq!(report.directives, vec![FlowDirective::remove("s1", 1)]);
    assert_eq!(report.directives[0].to_string(), "del-flows s1 in_port=1");

    let log = net.switch_control();
    assert_eq!(log.directives().len(), 2);
    assert!(log.flow_table("s1").is_empty());
}

#[test]
fn test_reverse_chain() {
    let mut net = get_test_net();
    let report = net.start_chain("vnf2", "vnf1").unwrap();
    assert_eq!(report.directives, vec![FlowDirective::install("s1", 2, 1)]);
    assert_eq!(net.switch_control().flow_table("s1").len(), 1);
}

#[test]
fn test_chain_two_switches() {
    let mut net = get_test_net_long();
    let report = net.start_chain("vnf1", "vnf2").unwrap();
    assert_eq!(
        report.directives,
        vec![FlowDirective::install("s1", 1, 2), FlowDirective::install("s2", 1, 2)]
    );
}

#[test]
fn test_chain_between_datacenters() {
    let mut net = DcNetwork::default();
    net.add_datacenter("dc-a", hashmap! {}).unwrap();
    net.add_datacenter("dc-b", hashmap! {}).unwrap();
    net.start_compute("dc-a", "vnf1", &p(), LinkParams::default()).unwrap();
    net.start_compute("dc-b", "vnf2", &p(), LinkParams::default()).unwrap();
    net.add_link("dc-a", "dc-b", LinkParams::default()).unwrap();

    let report = net.start_chain("vnf1", "vnf2").unwrap();
    assert_eq!(report.path, vec!["vnf1", "dc1.s1", "dc2.s1", "vnf2"]);
    assert_eq!(
        report.directives,
        vec![FlowDirective::install("dc1.s1", 1, 2), FlowDirective::install("dc2.s1", 2, 1)]
    );
}

#[test]
fn test_direct_neighbors() {
    let mut net = get_test_net();
    let report = net.start_chain("vnf1", "s1").unwrap();
    assert_eq!(report.to_string(), "path added between vnf1 and s1");
    assert!(report.directives.is_empty());
    assert!(net.switch_control().directives().is_empty());
}

#[test]
fn test_non_switch_hop() {
    let mut net = DcNetwork::default();
    net.add_compute("a", &p()).unwrap();
    net.add_compute("b", &p()).unwrap();
    net.add_compute("c", &p()).unwrap();
    net.add_link("a", "b", LinkParams::default()).unwrap();
    net.add_link("b", "c", LinkParams::default()).unwrap();

    let err = net.start_chain("a", "c").unwrap_err();
    assert_eq!(err, NetworkError::NonSwitchHop("b".to_string()));
    assert_eq!(err.to_string(), "Next node: b is not a switch");
    assert!(net.switch_control().directives().is_empty());
}

#[test]
fn test_unreachable() {
    let mut net = get_test_net();
    net.add_compute("vnf3", &p()).unwrap();
    assert_eq!(
        net.start_chain("vnf1", "vnf3"),
        Err(NetworkError::Unreachable("vnf1".to_string(), "vnf3".to_string()))
    );
    assert_eq!(
        net.start_chain("vnf1", "vnf9"),
        Err(NetworkError::NodeNotFound("vnf9".to_string()))
    );
}

#[test]
fn test_same_source_and_destination() {
    let mut net = get_test_net();
    let err = net.start_chain("vnf1", "vnf1").unwrap_err();
    assert_eq!(err, NetworkError::DestinationNotReached("vnf1".to_string()));
    assert_eq!(err.to_string(), "destination node: vnf1 not reached");
}

#[test]
fn test_partial_install() {
    let mut net = get_test_net_long();
    net.switch_control_mut().fail_on("s2");
    match net.start_chain("vnf1", "vnf2") {
        Err(NetworkError::DeviceCommand(DeviceError::Rejected { switch, .. })) => {
            assert_eq!(switch, "s2")
        }
        r => panic!("unexpected result: {:?}", r),
    }
    // the first switch keeps its flow
    let log = net.switch_control();
    assert_eq!(log.directives(), &[FlowDirective::install("s1", 1, 2)]);
    assert_eq!(log.flow_table("s1").len(), 1);
    assert!(log.flow_table("s2").is_empty());
}

#[test]
fn test_plan_chain() {
    let net = get_test_net_long();
    let report = net.plan_chain("vnf1", "vnf2", FlowCommand::Remove).unwrap();
    assert_eq!(
        report.directives,
        vec![FlowDirective::remove("s1", 1), FlowDirective::remove("s2", 1)]
    );
    assert!(net.switch_control().directives().is_empty());
}

#[test]
fn test_walk_states() {
    let net = get_test_net_long();
    let planner = ChainPlanner::new(net.graph());

    let mut walk = planner.walk("vnf1", "vnf2").unwrap();
    assert_eq!(walk.state(), ChainState::PathResolved);
    assert_eq!(
        walk.next(),
        Some(Ok(FlowHop { switch: "s1".to_string(), in_port: 1, out_port: 2 }))
    );
    assert_eq!(walk.state(), ChainState::Walking);
    assert_eq!(
        walk.next(),
        Some(Ok(FlowHop { switch: "s2".to_string(), in_port: 1, out_port: 2 }))
    );
    assert_eq!(walk.next(), None);
    assert_eq!(walk.state(), ChainState::Completed);
    assert_eq!(walk.next(), None);

    let mut walk = planner.walk("vnf1", "vnf1").unwrap();
    assert_eq!(
        walk.next(),
        Some(Err(NetworkError::DestinationNotReached("vnf1".to_string())))
    );
    assert_eq!(walk.state(), ChainState::Unreachable);
    assert_eq!(walk.next(), None);
}

#[test]
fn test_walk_rejected() {
    let mut net = get_test_net();
    net.add_compute("vnf3", &p()).unwrap();
    net.add_link("vnf2", "vnf3", LinkParams::default()).unwrap();
    let planner = ChainPlanner::new(net.graph());

    let mut walk = planner.walk("vnf1", "vnf3").unwrap();
    assert_eq!(walk.path(), vec!["vnf1", "s1", "vnf2", "vnf3"]);
    assert!(walk.next().unwrap().is_ok());
    assert_eq!(walk.next(), Some(Err(NetworkError::NonSwitchHop("vnf2".to_string()))));
    assert_eq!(walk.state(), ChainState::Rejected);
    assert_eq!(walk.next(), None);
}
