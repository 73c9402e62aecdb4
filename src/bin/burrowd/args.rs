// Copyright 2025 the burrow developers.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implements command-line argument parsing.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// The burrow recursive DNS resolver
#[derive(Debug, Parser)]
#[command(author, version)]
pub struct Args {
    /// Port for the UDP wire-format listener
    #[arg(long, env = "UDP_PORT", value_name = "PORT")]
    pub udp_port: u16,

    /// Port for the HTTP JSON listener
    #[arg(long, env = "TCP_PORT", value_name = "PORT")]
    pub tcp_port: u16,

    /// IP address both listeners bind to
    #[arg(long, value_name = "IP", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Seed zone file the root store is loaded from
    #[arg(long, value_name = "FILE", default_value = "root.zone.txt")]
    pub zone_file: PathBuf,

    /// Deadline for each upstream exchange, in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 5)]
    pub upstream_timeout: u64,
}
