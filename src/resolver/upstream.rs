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

//! The upstream query client.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// The port upstream servers are queried on.
const DNS_PORT: u16 = 53;

/// The receive buffer for upstream responses. This matches the payload
/// size the resolver advertises in its queries' OPT records.
pub const MAX_RESPONSE_SIZE: usize = 4096;

/// How an upstream server is asked one question.
///
/// The resolver engine is generic over this seam so that tests can
/// script upstream behavior without sockets. The one real
/// implementation is [`UdpUpstream`].
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Sends `payload` to the server at `addr` and returns the octets
    /// of the first response datagram.
    async fn exchange(&self, addr: IpAddr, payload: &[u8]) -> io::Result<Vec<u8>>;
}

/// The production [`Upstream`]: a one-shot UDP exchange.
///
/// Each request gets its own ephemeral socket, released when the
/// exchange ends however it ends. There are no retries — the first
/// response wins — and the whole exchange runs under one deadline,
/// surfaced as [`io::ErrorKind::TimedOut`].
pub struct UdpUpstream {
    timeout: Duration,
}

impl UdpUpstream {
    /// Creates a client whose exchanges are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for UdpUpstream {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl Upstream for UdpUpstream {
    async fn exchange(&self, addr: IpAddr, payload: &[u8]) -> io::Result<Vec<u8>> {
        let bind_addr: SocketAddr = if addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect((addr, DNS_PORT)).await?;

        timeout(self.timeout, async {
            socket.send(payload).await?;
            let mut buf = vec![0; MAX_RESPONSE_SIZE];
            let len = socket.recv(&mut buf).await?;
            buf.truncate(len);
            Ok(buf)
        })
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "upstream query timed out"))?
    }
}
