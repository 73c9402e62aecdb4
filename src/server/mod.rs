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

//! The request-serving logic, abstracted from any transport.
//!
//! [`Server`] turns a request [`Message`] into a reply; the transport
//! adapters in [`udp`] and [`http`] only move octets. Both listeners
//! share one `Server` (and through it one root store and one answer
//! cache) behind an [`Arc`](std::sync::Arc).

use std::sync::Arc;

use log::warn;

use crate::message::Message;
use crate::resolver::{Resolver, Upstream};
use crate::zone::Root;

pub mod http;
pub mod udp;

/// The transport-independent DNS server.
pub struct Server<U> {
    resolver: Resolver<U>,
}

impl<U: Upstream> Server<U> {
    /// Creates a server resolving against the given root store and
    /// upstream client.
    pub fn new(root: Arc<Root>, upstream: U) -> Self {
        Self {
            resolver: Resolver::new(root, upstream),
        }
    }

    /// Returns the resolution engine.
    pub fn resolver(&self) -> &Resolver<U> {
        &self.resolver
    }

    /// Turns a request into a reply.
    ///
    /// The reply keeps the request's ID, questions, and RD bit, sets QR
    /// and RA, and accumulates each question's resolution into the
    /// answer sections. A question that fails to resolve contributes
    /// nothing — the failure is logged and the reply keeps RCODE 0, so
    /// such a client sees an empty answer rather than an error code.
    pub async fn handle_message(&self, request: Message) -> Message {
        let mut reply = request;
        reply.header.set_qr(true);
        reply.header.set_ra(true);

        for question in reply.questions.clone() {
            match self.resolver.resolve(&question, reply.header.rd()).await {
                Ok(resolved) => {
                    reply.answers.extend(resolved.answers);
                    reply.authority.extend(resolved.authority);
                    reply.additional.extend(resolved.additional);
                }
                Err(err) => warn!("failed to resolve {}: {}", question.name, err),
            }
        }
        reply
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::class::Class;
    use crate::message::Question;
    use crate::name::Name;
    use crate::rr::{Rdata, Record, Type};
    use crate::server::testing::FailingUpstream;

    fn server() -> Server<FailingUpstream> {
        const SEED: &str = "\
. 86400 IN SOA a.root-servers.net. nstld.example. 1 1800 900 604800 86400
com. 172800 IN NS a.gtld-servers.net.
a.gtld-servers.net. 172800 IN A 192.5.6.30
";
        let root = Arc::new(Root::from_reader(Cursor::new(SEED)).unwrap());
        Server::new(root, FailingUpstream)
    }

    fn request(name: &str, rr_type: Type, rd: bool) -> Message {
        let mut message = Message::new();
        message.header.id = 0x77aa;
        message.header.set_rd(rd);
        message.questions.push(Question {
            name: Name::new(name),
            rr_type,
            class: Class::IN,
        });
        message
    }

    #[tokio::test]
    async fn replies_preserve_the_request_envelope() {
        let server = server();
        let reply = server.handle_message(request("com.", Type::NS, true)).await;

        assert_eq!(reply.header.id, 0x77aa);
        assert!(reply.header.qr());
        assert!(reply.header.ra());
        assert!(reply.header.rd());
        assert_eq!(reply.header.rcode(), 0);
        assert_eq!(reply.questions.len(), 1);
        assert_eq!(reply.questions[0].name, Name::new("com."));
        assert_eq!(
            reply.authority[0].rdata,
            Rdata::Ns(Name::new("a.gtld-servers.net."))
        );
    }

    #[tokio::test]
    async fn a_failed_resolution_leaves_the_reply_empty() {
        let server = server();
        // org. is not seeded, so resolution fails; the reply must still
        // come back well-formed with RCODE 0 and empty sections.
        let reply = server.handle_message(request("org.", Type::A, true)).await;

        assert!(reply.header.qr());
        assert_eq!(reply.header.rcode(), 0);
        assert!(reply.answers.is_empty());
        assert!(reply.authority.is_empty());
        assert!(reply.additional.is_empty());
    }

    #[tokio::test]
    async fn cached_answers_are_served_without_upstream_traffic() {
        let server = server();
        server.resolver().cache().insert(
            &Name::new("example.com."),
            &[Record::new(
                Name::new("example.com."),
                Class::IN,
                3600,
                Rdata::A("93.184.216.34".parse().unwrap()),
            )],
        );

        let reply = server
            .handle_message(request("example.com.", Type::A, true))
            .await;
        assert_eq!(reply.answers.len(), 1);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io;
    use std::net::IpAddr;

    use async_trait::async_trait;

    use crate::resolver::Upstream;

    /// An [`Upstream`] for transport tests: any exchange fails.
    pub(crate) struct FailingUpstream;

    #[async_trait]
    impl Upstream for FailingUpstream {
        async fn exchange(&self, _addr: IpAddr, _payload: &[u8]) -> io::Result<Vec<u8>> {
            Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "no upstream in tests",
            ))
        }
    }
}
