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

//! The UDP listener.

use std::io;
use std::sync::Arc;

use log::{debug, warn};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use super::Server;
use crate::message::parse_message;
use crate::resolver::Upstream;

/// The largest datagram the listener will accept. Matches the payload
/// size advertised upstream.
pub const MAX_DATAGRAM_SIZE: usize = 4096;

/// Runs the datagram loop on `socket` until `shutdown` is cancelled.
///
/// Each received datagram is handed to its own task, which parses it,
/// resolves it through `server`, and replies on the listening socket to
/// the sender's address. Datagrams that do not parse are dropped
/// without a reply. Cancellation is observed between datagrams;
/// in-flight handler tasks are left to finish on their own.
pub async fn serve<U>(
    socket: UdpSocket,
    server: Arc<Server<U>>,
    shutdown: CancellationToken,
) -> io::Result<()>
where
    U: Upstream + 'static,
{
    let socket = Arc::new(socket);
    loop {
        let mut buf = vec![0; MAX_DATAGRAM_SIZE];
        let (len, peer) = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            received = socket.recv_from(&mut buf) => received?,
        };
        buf.truncate(len);

        let server = server.clone();
        let socket = socket.clone();
        tokio::spawn(async move {
            let request = match parse_message(&buf) {
                Ok((message, _)) => message,
                Err(err) => {
                    debug!("dropping malformed datagram from {}: {}", peer, err);
                    return;
                }
            };
            let reply = server.handle_message(request).await;
            if let Err(err) = socket.send_to(&reply.encode(), peer).await {
                warn!("failed to reply to {}: {}", peer, err);
            }
        });
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::net::Ipv4Addr;

    use super::*;
    use crate::class::Class;
    use crate::message::{Message, Question};
    use crate::name::Name;
    use crate::rr::{Rdata, Type};
    use crate::server::testing::FailingUpstream;
    use crate::zone::Root;

    const SEED: &str = "\
. 86400 IN SOA a.root-servers.net. nstld.example. 1 1800 900 604800 86400
com. 172800 IN NS a.gtld-servers.net.
a.gtld-servers.net. 172800 IN A 192.5.6.30
";

    #[tokio::test]
    async fn answers_a_datagram_on_the_listening_socket() {
        let root = Arc::new(Root::from_reader(Cursor::new(SEED)).unwrap());
        let server = Arc::new(Server::new(root, FailingUpstream));

        let listener = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let listen_addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(serve(listener, server, shutdown.clone()));

        let mut query = Message::new();
        query.header.id = 0x1ace;
        query.header.set_rd(true);
        query.questions.push(Question {
            name: Name::new("com."),
            rr_type: Type::NS,
            class: Class::IN,
        });

        let client = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        client.send_to(&query.encode(), listen_addr).await.unwrap();
        let mut buf = vec![0; MAX_DATAGRAM_SIZE];
        let (len, from) = client.recv_from(&mut buf).await.unwrap();
        assert_eq!(from, listen_addr);

        let (reply, _) = parse_message(&buf[..len]).unwrap();
        assert_eq!(reply.header.id, 0x1ace);
        assert!(reply.header.qr());
        assert!(reply.header.ra());
        assert!(reply.header.rd());
        assert_eq!(reply.questions, query.questions);
        assert_eq!(
            reply.authority[0].rdata,
            Rdata::Ns(Name::new("a.gtld-servers.net."))
        );

        shutdown.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn cancellation_stops_the_loop() {
        let root = Arc::new(Root::from_reader(Cursor::new(SEED)).unwrap());
        let server = Arc::new(Server::new(root, FailingUpstream));

        let listener = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(serve(listener, server, shutdown.clone()));

        shutdown.cancel();
        task.await.unwrap().unwrap();
    }
}
