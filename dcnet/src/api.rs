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

//! # Network API
//!
//! Thread-safe entry point used by remote control endpoints. Every call locks the whole network,
//! such that changes to the topology and chain setup never interleave. Errors are logged, and
//! returned as their message.

use crate::flow::SwitchControl;
use crate::network::DcNetwork;
use crate::substrate::Substrate;

use log::*;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Direction of the traffic of a node, as seen from the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Traffic received by the node
    Ingress,
    /// Traffic sent by the node
    Egress,
}

impl Default for Direction {
    fn default() -> Self {
        Self::Egress
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingress => write!(f, "ingress"),
            Self::Egress => write!(f, "egress"),
        }
    }
}

impl FromStr for Direction {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ingress" | "rx" => Ok(Self::Ingress),
            "egress" | "tx" | "" => Ok(Self::Egress),
            _ => Err(MonitorError::InvalidDirection(s.to_string())),
        }
    }
}

/// Errors of the rate monitor
#[derive(Error, Debug, PartialEq, Clone)]
pub enum MonitorError {
    /// The direction is neither ingress nor egress
    #[error("Invalid direction: {0}")]
    InvalidDirection(String),
    /// The monitor has no data for the node
    #[error("No rate available for {0}")]
    NoData(String),
    /// No monitor is connected to the API
    #[error("No rate monitor connected")]
    NotConnected,
}

/// # Rate Monitor
///
/// Collects the rate of the traffic sent or received by the nodes of the network.
pub trait RateMonitor {
    /// Get the current rate of a node, in bytes per second.
    fn get_rate(&self, name: &str, direction: Direction) -> Result<f64, MonitorError>;
}

/// # Network API
///
/// Cheap to clone; all clones share the same network.
pub struct DcNetworkApi<S: Substrate, C: SwitchControl> {
    net: Arc<Mutex<DcNetwork<S, C>>>,
    monitor: Option<Arc<dyn RateMonitor + Send + Sync>>,
}

impl<S: Substrate, C: SwitchControl> Clone for DcNetworkApi<S, C> {
    fn clone(&self) -> Self {
        Self { net: self.net.clone(), monitor: self.monitor.clone() }
    }
}

impl<S: Substrate, C: SwitchControl> DcNetworkApi<S, C> {
    /// Take ownership of the network, and expose it through the API.
    pub fn new(net: DcNetwork<S, C>) -> Self {
        Self::from_shared(Arc::new(Mutex::new(net)))
    }

    /// Expose a network that is already shared.
    pub fn from_shared(net: Arc<Mutex<DcNetwork<S, C>>>) -> Self {
        debug!("Created network API endpoint");
        Self { net, monitor: None }
    }

    /// Connect a rate monitor, used by [`DcNetworkApi::monitor_get_rate`].
    pub fn with_monitor(mut self, monitor: Arc<dyn RateMonitor + Send + Sync>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// Returns the shared network
    pub fn network(&self) -> Arc<Mutex<DcNetwork<S, C>>> {
        self.net.clone()
    }

    fn lock(&self) -> Result<MutexGuard<'_, DcNetwork<S, C>>, String> {
        self.net.lock().map_err(|_| {
            error!("API error: network lock is poisoned");
            String::from("network lock is poisoned")
        })
    }

    /// Install the chain from `src` to `dst`, and return the confirmation.
    pub fn network_action_start(&self, src: &str, dst: &str) -> Result<String, String> {
        debug!("API call: network chain start");
        let mut net = self.lock()?;
        net.start_chain(src, dst).map(|report| report.to_string()).map_err(log_error)
    }

    /// Remove the chain from `src` to `dst`, and return the confirmation.
    pub fn network_action_stop(&self, src: &str, dst: &str) -> Result<String, String> {
        debug!("API call: network chain stop");
        let mut net = self.lock()?;
        net.stop_chain(src, dst).map(|report| report.to_string()).map_err(log_error)
    }

    /// Get the rate of a node. If `direction` is `None`, the egress rate is returned.
    pub fn monitor_get_rate(&self, name: &str, direction: Option<&str>) -> Result<f64, String> {
        debug!("API call: get rate");
        let direction = match direction {
            Some(d) => d.parse::<Direction>().map_err(log_error)?,
            None => Direction::default(),
        };
        self.lock()?.node_role(name).map_err(log_error)?;
        match self.monitor.as_ref() {
            Some(monitor) => monitor.get_rate(name, direction).map_err(log_error),
            None => Err(log_error(MonitorError::NotConnected)),
        }
    }
}

fn log_error<E: std::error::Error>(e: E) -> String {
    error!("API error: {}", e);
    e.to_string()
}
