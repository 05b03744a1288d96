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

//! Utilities for telnet interactions with the shell of a node running inside GNS3

use gns3::GNS3Node;
use log::*;
use regex::Regex;
use telnet::{Telnet, TelnetEvent};
use thiserror::Error;

use std::thread::sleep;
use std::time::{Duration, Instant};

/// Time to wait for the first prompt, after the node was started
pub const BOOT_WAIT: Duration = Duration::from_secs(60);
/// Time to wait for the answer of a single command
pub const CMD_WAIT: Duration = Duration::from_secs(10);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Errors of a console session
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Error of the underlying telnet stream
    #[error("Telnet error: {0}")]
    Telnet(#[from] std::io::Error),
    /// No prompt appeared in time
    #[error("Took longer than {0:?} to receive an answer!")]
    Timeout(Duration),
    /// The command terminated with a non-zero exit code
    #[error("Command `{command}` failed: {output}")]
    CommandFailed {
        /// The command that was executed
        command: String,
        /// Everything the command printed
        output: String,
    },
}

/// Connection to the shell of a node (docker container or Open vSwitch appliance), to which we
/// can connect via telnet.
///
/// All commands are synchronous and blocking. The blocking wait is implemented with a busy loop
/// and a sleep in between.
pub struct ShellConnection {
    c: Telnet,
    prompt_re: Regex,
    exit_code_re: Regex,
    logging: bool,
}

impl std::fmt::Debug for ShellConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ShellConnection")
    }
}

impl ShellConnection {
    /// Create a new connection to the console at `host:port`, and wait until the shell shows its
    /// prompt.
    pub fn new(host: &str, port: u16) -> Result<Self, ConsoleError> {
        let prompt_re = Regex::new(r"(?m)[#$] \z").unwrap();
        let exit_code_re = Regex::new(r"(?m)^EXIT=(\d+)\r?$").unwrap();

        let mut c = Telnet::connect((host, port), 2048)?;
        // receive all initial events
        while let Ok(event) = c.read_timeout(Duration::from_millis(1)) {
            if matches!(event, TelnetEvent::TimedOut) {
                break;
            }
        }

        let mut s = Self { c, prompt_re, exit_code_re, logging: false };
        s.c.write(b"\n")?;
        if let Err(e) = s.receive_until_prompt(BOOT_WAIT) {
            error!("Shell at {}:{} did not show a prompt: {}", host, port, e);
            return Err(e);
        }
        Ok(s)
    }

    /// Print everything received from the console to stderr
    pub fn set_logging(&mut self, logging: bool) {
        self.logging = logging;
    }

    /// Execute a command, and return its output. If the command exits with a non-zero exit code,
    /// [`ConsoleError::CommandFailed`] is returned.
    pub fn execute(&mut self, command: impl AsRef<str>) -> Result<String, ConsoleError> {
        let command = command.as_ref();
        let output = self.send_wait(format!("{}; echo EXIT=$?\n", command), CMD_WAIT)?;
        let code = self
            .exit_code_re
            .captures(&output)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok());
        let output = clean_output(&output, command);
        match code {
            Some(0) => Ok(output),
            _ => Err(ConsoleError::CommandFailed { command: command.to_string(), output }),
        }
    }

    fn send_wait(&mut self, data: impl AsRef<str>, wait: Duration) -> Result<String, ConsoleError> {
        self.c.write(data.as_ref().as_bytes())?;
        self.receive_until_prompt(wait)
    }

    fn receive_until_prompt(&mut self, wait: Duration) -> Result<String, ConsoleError> {
        let mut received = Received::default();
        let now = Instant::now();
        loop {
            match self.c.read_nonblocking()? {
                TelnetEvent::NoData => {
                    if now.elapsed() > wait {
                        return Err(ConsoleError::Timeout(wait));
                    }
                    sleep(POLL_INTERVAL);
                }
                TelnetEvent::Data(d) => {
                    if self.logging {
                        eprint!("{}", String::from_utf8_lossy(&d));
                    }
                    received.push(&d);
                    let text = received.text();
                    if self.prompt_re.is_match(&text) {
                        return Ok(text);
                    }
                }
                _ => {}
            }
        }
    }
}

/// Bytes received from the console. A multibyte character may be split between two reads, so the
/// text is always decoded from the whole buffer.
#[derive(Debug, Default)]
struct Received(Vec<u8>);

impl Received {
    fn push(&mut self, data: &[u8]) {
        self.0.extend_from_slice(data);
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0).replace("\r\n", "\n")
    }
}

/// Address of the telnet console of a node. A wildcard bind address is replaced by `localhost`.
pub fn console_of(node: &GNS3Node) -> Option<(String, u16)> {
    let port = node.console_port?;
    let host = match node.console_host.as_deref() {
        None | Some("") | Some("0.0.0.0") | Some("::") => "localhost",
        Some(host) => host,
    };
    Some((host.to_string(), port))
}

/// Remove the echoed command (first line), the exit code marker and the final prompt (last lines)
/// from the raw output. Everything in between is kept as is.
fn clean_output(raw: &str, command: &str) -> String {
    let mut lines = raw.lines().collect::<Vec<_>>();
    if lines.last().map_or(false, |l| l.trim_end().ends_with(|c| c == '#' || c == '$')) {
        lines.pop();
    }
    if lines.last().map_or(false, |l| l.trim().starts_with("EXIT=")) {
        lines.pop();
    }
    if lines.first().map_or(false, |l| l.contains(command)) {
        lines.remove(0);
    }
    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clean_output() {
        let raw = "ovs-ofctl dump-flows br0; echo EXIT=$?\n \
                   cookie=0x0, in_port=1 actions=output:2\nEXIT=0\n/ # ";
        assert_eq!(
            clean_output(raw, "ovs-ofctl dump-flows br0"),
            "cookie=0x0, in_port=1 actions=output:2"
        );
    }

    #[test]
    fn test_clean_output_keeps_body() {
        let command = "grep br0 /etc/ovs.conf";
        let raw = "grep br0 /etc/ovs.conf; echo EXIT=$?\n\
                   # grep br0 /etc/ovs.conf\nbridge br0 #\nprice: 5$\nEXIT=0\n/ # ";
        assert_eq!(
            clean_output(raw, command),
            "# grep br0 /etc/ovs.conf\nbridge br0 #\nprice: 5$"
        );
    }

    #[test]
    fn test_received_split_character() {
        let text = "flow: n\u{e9}ant\r\n/ # ";
        let bytes = text.as_bytes();
        // split in the middle of the two-byte character
        let split = text.find('\u{e9}').unwrap() + 1;
        let mut received = Received::default();
        received.push(&bytes[..split]);
        received.push(&bytes[split..]);
        assert_eq!(received.text(), "flow: n\u{e9}ant\n/ # ");
    }

    #[test]
    fn test_clean_output_empty() {
        let raw = "ip link set eth1 up; echo EXIT=$?\nEXIT=0\nroot@vnf1:/# ";
        assert_eq!(clean_output(raw, "ip link set eth1 up"), "");
    }
}
