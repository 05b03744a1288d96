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

use dcnet::api::DcNetworkApi;
use dcnet::flow::{FlowCommand, FlowLog, SwitchControl};
use dcnet::substrate::{MemorySubstrate, Substrate};
use dcnet::topology_file::TopologyDescription;
use dcnet_runtime::emulate;

use clap::{Parser, Subcommand};
use log::*;
use std::error::Error;
use std::io::{self, BufRead, Write};

fn main() -> Result<(), Box<dyn Error>> {
    // initialize the env logger
    pretty_env_logger::init();

    // run clap
    let args = CommandLineArguments::parse();

    match args.cmd {
        MainCommand::Plan { topology, remove } => {
            let desc = TopologyDescription::from_file(&topology)?;
            let net = desc.into_network(MemorySubstrate::new(), FlowLog::new())?;
            let command = if remove { FlowCommand::Remove } else { FlowCommand::Install };
            for chain in desc.chains.iter() {
                let report = net.plan_chain(&chain.src, &chain.dst, command)?;
                println!("{}: {}", report, report.path.join(" -> "));
                for directive in report.directives.iter() {
                    println!("    {}", directive);
                }
            }
        }
        MainCommand::List { topology } => {
            let desc = TopologyDescription::from_file(&topology)?;
            let net = desc.into_network(MemorySubstrate::new(), FlowLog::new())?;
            println!("{}", serde_json::to_string_pretty(&net.list_all_compute()?)?);
            println!("{}", serde_json::to_string_pretty(net.links())?);
        }
        MainCommand::Run { topology, project, persistent_gns_project } => {
            let desc = TopologyDescription::from_file(&topology)?;
            let net = emulate(&desc, &project, persistent_gns_project)?;
            info!("Network is running. Commands: start <src> <dst>, stop <src> <dst>, list, quit");
            let api = DcNetworkApi::new(net);
            interact(&api)?;
            api.network().lock().map_err(|_| "network lock poisoned")?.stop()?;
        }
    }
    Ok(())
}

/// Read chain commands from stdin, until `quit` or the end of the input.
fn interact<S, C>(api: &DcNetworkApi<S, C>) -> Result<(), Box<dyn Error>>
where
    S: Substrate,
    C: SwitchControl,
{
    let stdin = io::stdin();
    print_prompt()?;
    for line in stdin.lock().lines() {
        let line = line?;
        let words = line.split_whitespace().collect::<Vec<_>>();
        let result = match words.as_slice() {
            [] => Ok(String::new()),
            ["start", src, dst] => api.network_action_start(src, dst),
            ["stop", src, dst] => api.network_action_stop(src, dst),
            ["list"] => list_compute(api),
            ["quit"] | ["exit"] => break,
            _ => Err(format!("Unknown command: {}", line)),
        };
        match result {
            Ok(s) if s.is_empty() => {}
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("Error: {}", e),
        }
        print_prompt()?;
    }
    Ok(())
}

fn list_compute<S, C>(api: &DcNetworkApi<S, C>) -> Result<String, String>
where
    S: Substrate,
    C: SwitchControl,
{
    let net = api.network();
    let guard = net.lock().map_err(|_| "network lock poisoned".to_string())?;
    let all = guard.list_all_compute().map_err(|e| e.to_string())?;
    serde_json::to_string_pretty(&all).map_err(|e| e.to_string())
}

fn print_prompt() -> io::Result<()> {
    print!("dcnet> ");
    io::stdout().flush()
}

/// Emulate multi-tenant data center networks, and set up chains between compute endpoints by
/// programming the flows of the switches on the path.
#[derive(Parser, Debug)]
#[command(name = "DcNet", author = "Tibor Schneider")]
struct CommandLineArguments {
    /// Action to perform
    #[command(subcommand)]
    cmd: MainCommand,
}

#[derive(Subcommand, Debug)]
enum MainCommand {
    /// Print the flow directives of all chains in the topology, without emulating anything
    #[command(name = "plan")]
    Plan {
        /// Topology description (JSON)
        topology: String,
        /// Print the directives tearing the chains down instead of setting them up
        #[arg(short = 'r', long)]
        remove: bool,
    },
    /// Print all compute endpoints and links of the topology
    #[command(name = "list")]
    List {
        /// Topology description (JSON)
        topology: String,
    },
    /// Emulate the topology in GNS3, and set up all chains
    #[command(name = "run")]
    Run {
        /// Topology description (JSON)
        topology: String,
        /// Name of the GNS3 project
        #[arg(long, default_value = "DcNet")]
        project: String,
        /// Leave the gns3 project open after quitting this program
        #[arg(short = 'p', long)]
        persistent_gns_project: bool,
    },
}
