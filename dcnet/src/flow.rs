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

//! # Flow Programming
//!
//! Translates a single hop of a chain into a flow directive, and issues it to the switch.

use crate::topology::PortNumber;

use log::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Errors reported by the command interface of a switch
#[derive(Error, Debug, PartialEq, Clone)]
pub enum DeviceError {
    /// The switch is not known to the command interface
    #[error("Switch {0} is not known to the command interface")]
    UnknownSwitch(String),
    /// Cannot connect to the switch
    #[error("Cannot connect to switch {switch}: {message}")]
    ConnectionFailed {
        /// Name of the switch
        switch: String,
        /// Reason
        message: String,
    },
    /// The switch rejected the flow directive
    #[error("Switch {switch} rejected the flow directive: {message}")]
    Rejected {
        /// Name of the switch
        switch: String,
        /// Output of the switch
        message: String,
    },
    /// The switch did not answer in time
    #[error("Switch {0} did not answer in time")]
    Timeout(String),
}

/// Install or remove flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FlowCommand {
    /// Add a flow which forwards the matched packets
    Install,
    /// Delete all flows with the given match
    Remove,
}

impl FlowCommand {
    /// Name of the command, as used by `ovs-ofctl`
    pub fn ofctl_command(&self) -> &'static str {
        match self {
            Self::Install => "add-flow",
            Self::Remove => "del-flows",
        }
    }
}

impl fmt::Display for FlowCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ofctl_command())
    }
}

/// Match of a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FlowMatch {
    /// Port on which the packet was received
    pub in_port: PortNumber,
}

impl fmt::Display for FlowMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "in_port={}", self.in_port)
    }
}

/// Action of a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FlowAction {
    /// Send the packet out on the given port
    Output(PortNumber),
}

impl fmt::Display for FlowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output(port) => write!(f, "output:{}", port),
        }
    }
}

/// Directive sent to the command interface of exactly one switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowDirective {
    /// Name of the switch
    pub switch: String,
    /// Install or remove
    pub command: FlowCommand,
    /// Match of the flow
    pub flow_match: FlowMatch,
    /// Action, only present when installing a flow
    pub action: Option<FlowAction>,
}

impl FlowDirective {
    /// Directive that forwards everything received on `in_port` to `out_port`.
    pub fn install(switch: impl Into<String>, in_port: PortNumber, out_port: PortNumber) -> Self {
        Self {
            switch: switch.into(),
            command: FlowCommand::Install,
            flow_match: FlowMatch { in_port },
            action: Some(FlowAction::Output(out_port)),
        }
    }

    /// Directive that deletes all flows matching on `in_port`.
    pub fn remove(switch: impl Into<String>, in_port: PortNumber) -> Self {
        Self {
            switch: switch.into(),
            command: FlowCommand::Remove,
            flow_match: FlowMatch { in_port },
            action: None,
        }
    }

    /// Flow specification in the `ovs-ofctl` syntax, e.g. `in_port=1,actions=output:2`.
    pub fn flow_spec(&self) -> String {
        match self.action {
            Some(action) => format!("{},actions={}", self.flow_match, action),
            None => self.flow_match.to_string(),
        }
    }
}

impl fmt::Display for FlowDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.command, self.switch, self.flow_spec())
    }
}

/// # Switch Command Interface
///
/// Applies flow directives on the switches. Calls are synchronous, and are expected to either
/// apply the directive completely, or to return an error.
pub trait SwitchControl {
    /// Apply the directive on the switch named in the directive.
    fn apply(&mut self, directive: &FlowDirective) -> Result<(), DeviceError>;
}

impl<T: SwitchControl + ?Sized> SwitchControl for Box<T> {
    fn apply(&mut self, directive: &FlowDirective) -> Result<(), DeviceError> {
        (**self).apply(directive)
    }
}

/// # Flow Programmer
///
/// Turns a hop into a flow directive and sends it to the switch. There is no retry, and no
/// rollback.
#[derive(Debug)]
pub struct FlowProgrammer<'a, C: SwitchControl + ?Sized> {
    control: &'a mut C,
}

impl<'a, C: SwitchControl + ?Sized> FlowProgrammer<'a, C> {
    /// Create a programmer issuing its directives to `control`.
    pub fn new(control: &'a mut C) -> Self {
        Self { control }
    }

    /// Program a single hop on `switch`. When installing, all packets received on `in_port` are
    /// forwarded to `out_port`. When removing, all flows matching on `in_port` are deleted,
    /// regardless of their action. Returns the directive that was applied.
    pub fn program(
        &mut self,
        switch: &str,
        in_port: PortNumber,
        out_port: PortNumber,
        command: FlowCommand,
    ) -> Result<FlowDirective, DeviceError> {
        let directive = match command {
            FlowCommand::Install => FlowDirective::install(switch, in_port, out_port),
            FlowCommand::Remove => FlowDirective::remove(switch, in_port),
        };
        info!(
            "{} in switch: {} in_port: {} out_port: {}",
            command, switch, in_port, out_port
        );
        self.control.apply(&directive)?;
        Ok(directive)
    }
}

/// Flow installed on a switch of a [`FlowLog`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowEntry {
    /// Match
    pub flow_match: FlowMatch,
    /// Action
    pub action: FlowAction,
}

/// # Flow Log
///
/// Switch command interface that does not talk to any device. It records every directive, and
/// keeps a flow table per switch with the same semantics as Open vSwitch: adding a flow replaces
/// the flow with the identical match, and deleting removes all flows with the given match.
#[derive(Debug, Clone, Default)]
pub struct FlowLog {
    directives: Vec<FlowDirective>,
    tables: HashMap<String, Vec<FlowEntry>>,
    failing: HashSet<String>,
}

impl FlowLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every future directive for the given switch.
    pub fn fail_on(&mut self, switch: impl Into<String>) {
        self.failing.insert(switch.into());
    }

    /// All directives applied so far, in order
    pub fn directives(&self) -> &[FlowDirective] {
        &self.directives
    }

    /// The flows currently installed on a switch
    pub fn flow_table(&self, switch: &str) -> &[FlowEntry] {
        self.tables.get(switch).map(|t| t.as_slice()).unwrap_or(&[])
    }

    /// Forget all recorded directives and flow tables.
    pub fn clear(&mut self) {
        self.directives.clear();
        self.tables.clear();
    }
}

impl SwitchControl for FlowLog {
    fn apply(&mut self, directive: &FlowDirective) -> Result<(), DeviceError> {
        if self.failing.contains(&directive.switch) {
            return Err(DeviceError::Rejected {
                switch: directive.switch.clone(),
                message: format!("cannot apply {}", directive.flow_spec()),
            });
        }
        let table = self.tables.entry(directive.switch.clone()).or_default();
        table.retain(|e| e.flow_match != directive.flow_match);
        if let Some(action) = directive.action {
            table.push(FlowEntry { flow_match: directive.flow_match, action });
        }
        self.directives.push(directive.clone());
        Ok(())
    }
}
