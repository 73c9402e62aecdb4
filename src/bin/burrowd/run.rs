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

//! Implements running the resolver daemon.

use std::fmt::Write;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use env_logger::Env;
use log::{error, info};
use tokio::net::{TcpListener, UdpSocket};
use tokio_util::sync::CancellationToken;

use burrow::resolver::UdpUpstream;
use burrow::server::{http, udp, Server};
use burrow::zone::Root;

use crate::args::Args;

/// Runs the daemon.
pub async fn run(args: Args) {
    env_logger::init_from_env(Env::new().default_filter_or("info"));

    if let Err(e) = try_running(args).await {
        let mut message = String::from("Failed to run:");
        for (i, cause) in e.chain().enumerate() {
            write!(message, "\n[{}] {}", i + 1, cause).unwrap();
        }
        message.push_str("\nExiting with failure.");
        error!("{}", message);
        process::exit(1);
    }
    info!("Exiting with success.");
}

async fn try_running(args: Args) -> Result<()> {
    info!("burrow daemon v{} starting.", env!("CARGO_PKG_VERSION"));

    // Load the root store before binding anything: with no seed there
    // is nothing to serve.
    let root = Root::from_path(&args.zone_file).with_context(|| {
        format!(
            "failed to load the seed zone file {}",
            args.zone_file.display()
        )
    })?;
    info!("Loaded the root store from {}.", args.zone_file.display());

    let upstream = UdpUpstream::new(Duration::from_secs(args.upstream_timeout));
    let server = Arc::new(Server::new(Arc::new(root), upstream));

    let udp_addr = SocketAddr::new(args.bind, args.udp_port);
    let udp_socket = UdpSocket::bind(udp_addr)
        .await
        .with_context(|| format!("failed to bind the UDP listener to {}", udp_addr))?;
    let http_addr = SocketAddr::new(args.bind, args.tcp_port);
    let http_listener = TcpListener::bind(http_addr)
        .await
        .with_context(|| format!("failed to bind the HTTP listener to {}", http_addr))?;
    info!(
        "Listening on {} (UDP wire format) and {} (HTTP).",
        udp_addr, http_addr
    );

    let shutdown = CancellationToken::new();
    let mut udp_task = tokio::spawn(udp::serve(udp_socket, server.clone(), shutdown.clone()));
    let http_shutdown = shutdown.clone();
    let mut http_task = tokio::spawn(async move {
        axum::serve(http_listener, http::router(server))
            .with_graceful_shutdown(async move { http_shutdown.cancelled().await })
            .await
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt; shutting down.");
            shutdown.cancel();
        }
        joined = &mut udp_task => {
            shutdown.cancel();
            return joined
                .context("the UDP listener task died")?
                .context("the UDP listener failed");
        }
        joined = &mut http_task => {
            shutdown.cancel();
            return joined
                .context("the HTTP listener task died")?
                .context("the HTTP listener failed");
        }
    }

    let _ = udp_task.await;
    let _ = http_task.await;
    info!("Shutdown complete.");
    Ok(())
}
