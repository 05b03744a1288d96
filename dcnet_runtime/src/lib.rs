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

//! # Runtime System
//!
//! This system builds the emulated network inside GNS3, and programs the flows of the chains on
//! Open vSwitch instances. For simplified usage, check the function [`emulate`].

#![deny(missing_docs, missing_debug_implementations)]

pub mod console;
pub mod gns3_substrate;
pub mod ovs_conn;

use gns3_substrate::Gns3Substrate;
use ovs_conn::OvsSwitchControl;

use dcnet::topology_file::TopologyDescription;
use dcnet::{DcNetwork, Error};

use log::*;

/// Network running inside GNS3
pub type Gns3Network = DcNetwork<Gns3Substrate, OvsSwitchControl>;

/// # Emulate a topology
///
/// This function does the following:
///
/// 1. Create the GNS3 project, and set up all switches, compute endpoints and links
/// 2. Start all nodes, and configure the addresses of the compute endpoints
/// 3. Set up all chains of the description
///
/// The project is deleted when the returned network is dropped, unless `persistent_gns_project`
/// is set.
pub fn emulate(
    desc: &TopologyDescription,
    project_name: impl AsRef<str>,
    persistent_gns_project: bool,
) -> Result<Gns3Network, Error> {
    info!("Generating the network...");
    let substrate = Gns3Substrate::new(project_name, persistent_gns_project)?;
    let switches = substrate.switch_control();
    let mut net = desc.into_network(substrate, switches)?;

    net.start()?;

    for chain in desc.chains.iter() {
        let report = net.start_chain(&chain.src, &chain.dst)?;
        info!("{} ({} flows)", report, report.directives.len());
    }

    Ok(net)
}
