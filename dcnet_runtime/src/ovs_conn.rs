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

//! # Open vSwitch Command Interface
//!
//! Issues flow directives on Open vSwitch instances running inside GNS3, by executing
//! `ovs-ofctl` on the console of each switch.

use crate::console::{console_of, ConsoleError, ShellConnection};

use dcnet::flow::{DeviceError, FlowDirective, SwitchControl};
use gns3::GNS3Server;

use log::*;
use std::collections::HashMap;

/// Name of the bridge on which all interfaces of the appliance are attached
pub const DEFAULT_BRIDGE: &str = "br0";

/// # Open vSwitch Switch Control
///
/// Keeps one console session per switch. Sessions are opened lazily, the first time a directive
/// is sent to the switch, by looking up the console port of the node on the GNS3 server.
#[derive(Debug)]
pub struct OvsSwitchControl {
    server: GNS3Server,
    bridge: String,
    connections: HashMap<String, ShellConnection>,
}

impl OvsSwitchControl {
    /// Create a new switch control, using the server (with the project already opened) to look
    /// up the console of each switch.
    pub fn new(server: GNS3Server) -> Self {
        Self { server, bridge: DEFAULT_BRIDGE.to_string(), connections: HashMap::new() }
    }

    /// Use a different bridge than [`DEFAULT_BRIDGE`]
    pub fn with_bridge(mut self, bridge: impl Into<String>) -> Self {
        self.bridge = bridge.into();
        self
    }

    /// Return the current flow table of the switch, as printed by `ovs-ofctl dump-flows`.
    pub fn dump_flows(&mut self, switch: &str) -> Result<String, DeviceError> {
        let command = format!("ovs-ofctl dump-flows {}", self.bridge);
        self.run(switch, &command)
    }

    /// Number of open console sessions
    pub fn num_connections(&self) -> usize {
        self.connections.len()
    }

    fn run(&mut self, switch: &str, command: &str) -> Result<String, DeviceError> {
        let result = self.connection(switch)?.execute(command);
        match result {
            Ok(output) => Ok(output),
            Err(e) => {
                if !matches!(e, ConsoleError::CommandFailed { .. }) {
                    // the session is in an unknown state
                    self.connections.remove(switch);
                }
                Err(device_error(switch, e))
            }
        }
    }

    fn connection(&mut self, switch: &str) -> Result<&mut ShellConnection, DeviceError> {
        if !self.connections.contains_key(switch) {
            let nodes = self.server.get_nodes().map_err(|e| DeviceError::ConnectionFailed {
                switch: switch.to_string(),
                message: e.to_string(),
            })?;
            let node = nodes
                .into_iter()
                .find(|n| n.name == switch)
                .ok_or_else(|| DeviceError::UnknownSwitch(switch.to_string()))?;
            let (host, port) = console_of(&node).ok_or_else(|| DeviceError::ConnectionFailed {
                switch: switch.to_string(),
                message: "node has no console".to_string(),
            })?;
            debug!("Opening the console of {} at {}:{}", switch, host, port);
            let conn = ShellConnection::new(&host, port).map_err(|e| device_error(switch, e))?;
            self.connections.insert(switch.to_string(), conn);
        }
        self.connections
            .get_mut(switch)
            .ok_or_else(|| DeviceError::UnknownSwitch(switch.to_string()))
    }
}

impl SwitchControl for OvsSwitchControl {
    fn apply(&mut self, directive: &FlowDirective) -> Result<(), DeviceError> {
        let command = ofctl_command_line(&self.bridge, directive);
        debug!("{}: {}", directive.switch, command);
        self.run(&directive.switch, &command).map(|_| ())
    }
}

/// Shell command that applies the directive on the given bridge.
///
/// ```
/// # use dcnet::flow::FlowDirective;
/// # use dcnet_runtime::ovs_conn::ofctl_command_line;
/// let directive = FlowDirective::install("s1", 1, 2);
/// assert_eq!(
///     ofctl_command_line("br0", &directive),
///     "ovs-ofctl add-flow br0 'in_port=1,actions=output:2'"
/// );
/// ```
pub fn ofctl_command_line(bridge: &str, directive: &FlowDirective) -> String {
    let command = directive.command.ofctl_command();
    format!("ovs-ofctl {} {} '{}'", command, bridge, directive.flow_spec())
}

fn device_error(switch: &str, e: ConsoleError) -> DeviceError {
    match e {
        ConsoleError::Timeout(_) => DeviceError::Timeout(switch.to_string()),
        ConsoleError::CommandFailed { output, .. } => {
            DeviceError::Rejected { switch: switch.to_string(), message: output }
        }
        e => DeviceError::ConnectionFailed { switch: switch.to_string(), message: e.to_string() },
    }
}
