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

//! Test the thread-safe network API.

use crate::api::{DcNetworkApi, Direction, MonitorError, RateMonitor};
use crate::flow::FlowLog;
use crate::substrate::{LinkParams, MemorySubstrate, NodeParams};
use crate::DcNetwork;

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

/// Monitor returning a fixed rate per node and direction
struct StaticMonitor {
    rates: HashMap<(String, Direction), f64>,
}

impl RateMonitor for StaticMonitor {
    fn get_rate(&self, name: &str, direction: Direction) -> Result<f64, MonitorError> {
        self.rates
            .get(&(name.to_string(), direction))
            .copied()
            .ok_or_else(|| MonitorError::NoData(name.to_string()))
    }
}

fn get_test_api() -> DcNetworkApi<MemorySubstrate, FlowLog> {
    let p = NodeParams::default();
    let mut net = DcNetwork::default();
    net.add_compute("vnf1", &p).unwrap();
    net.add_switch("s1", &p).unwrap();
    net.add_compute("vnf2", &p).unwrap();
    net.add_compute("vnf3", &p).unwrap();
    net.add_link("vnf1", "s1", LinkParams::default()).unwrap();
    net.add_link("s1", "vnf2", LinkParams::default()).unwrap();
    net.add_link("vnf2", "vnf3", LinkParams::default()).unwrap();
    DcNetworkApi::new(net)
}

fn get_test_monitor() -> Arc<StaticMonitor> {
    let mut rates = HashMap::new();
    rates.insert(("vnf1".to_string(), Direction::Egress), 1000.0);
    rates.insert(("vnf1".to_string(), Direction::Ingress), 250.0);
    Arc::new(StaticMonitor { rates })
}

#[test]
fn test_network_action_start_stop() {
    let api = get_test_api();
    assert_eq!(
        api.network_action_start("vnf1", "vnf2"),
        Ok("path added between vnf1 and vnf2".to_string())
    );
    assert_eq!(
        api.network_action_stop("vnf1", "vnf2"),
        Ok("path removed between vnf1 and vnf2".to_string())
    );
    let net = api.network();
    let net = net.lock().unwrap();
    assert_eq!(net.switch_control().directives().len(), 2);
    assert!(net.switch_control().flow_table("s1").is_empty());
}

#[test]
fn test_network_action_errors() {
    let api = get_test_api();
    assert_eq!(
        api.network_action_start("vnf1", "vnf3"),
        Err("Next node: vnf2 is not a switch".to_string())
    );
    assert_eq!(
        api.network_action_stop("vnf1", "vnf1"),
        Err("destination node: vnf1 not reached".to_string())
    );
    assert!(api.network_action_start("vnf1", "vnf9").is_err());
}

#[test]
fn test_concurrent_calls() {
    let api = get_test_api();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let api = api.clone();
            thread::spawn(move || {
                if i % 2 == 0 {
                    api.network_action_start("vnf1", "vnf2")
                } else {
                    api.network_action_start("vnf2", "vnf1")
                }
            })
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap().is_ok());
    }
    let net = api.network();
    let net = net.lock().unwrap();
    assert_eq!(net.switch_control().directives().len(), 8);
    // both directions end up with exactly one flow each
    assert_eq!(net.switch_control().flow_table("s1").len(), 2);
}

#[test]
fn test_monitor_get_rate() {
    let api = get_test_api().with_monitor(get_test_monitor());
    assert_eq!(api.monitor_get_rate("vnf1", None), Ok(1000.0));
    assert_eq!(api.monitor_get_rate("vnf1", Some("egress")), Ok(1000.0));
    assert_eq!(api.monitor_get_rate("vnf1", Some("ingress")), Ok(250.0));
    assert_eq!(
        api.monitor_get_rate("vnf1", Some("sideways")),
        Err("Invalid direction: sideways".to_string())
    );
    assert_eq!(api.monitor_get_rate("vnf2", None), Err("No rate available for vnf2".to_string()));
    assert!(api.monitor_get_rate("vnf9", None).is_err());
}

#[test]
fn test_monitor_not_connected() {
    let api = get_test_api();
    assert_eq!(api.monitor_get_rate("vnf1", None), Err("No rate monitor connected".to_string()));
}

#[test]
fn test_direction_parse() {
    assert_eq!("Ingress".parse::<Direction>(), Ok(Direction::Ingress));
    assert_eq!("egress".parse::<Direction>(), Ok(Direction::Egress));
    assert_eq!("".parse::<Direction>(), Ok(Direction::Egress));
    assert_eq!(Direction::default(), Direction::Egress);
    assert_eq!(Direction::Ingress.to_string(), "ingress");
}
