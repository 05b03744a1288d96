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

//! Address allocation for compute endpoints

use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;

/// IPv4 address together with its prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct IpAddr {
    /// Address
    pub addr: Ipv4Addr,
    /// Prefix length of the network
    pub prefix_len: u8,
}

impl fmt::Display for IpAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

/// # Address Pool
///
/// Hands out the host addresses of a network, one after the other, starting at the first host
/// address. The counter only ever increases: addresses of removed endpoints are not handed out
/// again.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressPool {
    base: u32,
    prefix_len: u8,
    next: u32,
}

impl Default for AddressPool {
    /// `10.0.0.0/8`
    fn default() -> Self {
        Self::new(Ipv4Addr::new(10, 0, 0, 0), 8)
    }
}

impl AddressPool {
    /// Create a new pool for the network `base/prefix_len`. `prefix_len` is clamped to 30.
    pub fn new(base: Ipv4Addr, prefix_len: u8) -> Self {
        let prefix_len = prefix_len.min(30);
        let mask = if prefix_len == 0 { 0 } else { u32::MAX << (32 - prefix_len) };
        Self { base: u32::from(base) & mask, prefix_len, next: 1 }
    }

    /// Return the next free address, or `None` if the pool is exhausted.
    pub fn next_address(&mut self) -> Option<IpAddr> {
        // the last address of the network is the broadcast address
        let num_hosts: u64 = (1u64 << (32 - self.prefix_len as u64)) - 2;
        if self.next as u64 > num_hosts {
            return None;
        }
        let addr = Ipv4Addr::from(self.base + self.next);
        self.next += 1;
        Some(IpAddr { addr, prefix_len: self.prefix_len })
    }

    /// Number of addresses handed out so far
    pub fn num_allocated(&self) -> u32 {
        self.next - 1
    }
}
