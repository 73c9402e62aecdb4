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

//! The iterative resolution engine.
//!
//! Resolution starts from the seeded [`Root`]: the question's parent
//! label group selects the bootstrap zone, whose NS records (and their
//! glue, if seeded) form a first referral. From there the engine walks
//! the delegation chain, asking one upstream server per hop, following
//! referrals — using glue addresses from the Additional section when
//! present and resolving the nameserver's own address when not — until
//! a server answers or the hop budget runs out. Answers are written
//! back to the [`AnswerCache`] keyed by the question name.

use std::fmt;
use std::future::Future;
use std::io;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::Arc;

use log::debug;
use rand::seq::SliceRandom;

use crate::cache::AnswerCache;
use crate::class::Class;
use crate::message::{parse_message, reader, Message, Question};
use crate::name::Name;
use crate::rr::{Rdata, Record, Type};
use crate::zone::Root;

mod upstream;

pub use upstream::{UdpUpstream, Upstream, MAX_RESPONSE_SIZE};

/// How many referrals one query may chase before the walk is abandoned.
/// Real delegation chains are a handful of hops deep; anything
/// approaching this bound is a loop or a deliberately hostile zone.
pub const MAX_REFERRALS: usize = 69;

/// The UDP payload size advertised in the OPT record of every query
/// the engine sends (RFC 6891). Matches the receive buffer in
/// [`upstream`].
pub const ADVERTISED_PAYLOAD_SIZE: u16 = MAX_RESPONSE_SIZE as u16;

/// A boxed resolution future. `ask` re-enters `resolve` when a
/// referral arrives without glue; the type erasure here is what keeps
/// that mutual recursion finitely-sized for the compiler.
type ResolveFuture<'a> = Pin<Box<dyn Future<Output = Result<Message>> + Send + 'a>>;

////////////////////////////////////////////////////////////////////////
// RESOLVER                                                           //
////////////////////////////////////////////////////////////////////////

/// The resolution engine shared by every listener.
///
/// Holds the frozen [`Root`], the [`AnswerCache`], and the upstream
/// client. The engine itself is stateless beyond those three, so one
/// instance serves all concurrent requests.
pub struct Resolver<U> {
    root: Arc<Root>,
    cache: AnswerCache,
    upstream: U,
}

impl<U: Upstream> Resolver<U> {
    /// Creates a resolver over the given root store and upstream
    /// client, with an empty cache.
    pub fn new(root: Arc<Root>, upstream: U) -> Self {
        Self {
            root,
            cache: AnswerCache::new(),
            upstream,
        }
    }

    /// Returns the answer cache.
    pub fn cache(&self) -> &AnswerCache {
        &self.cache
    }

    /// Resolves one question. This is the entry point the listeners
    /// call.
    ///
    /// The cache is consulted first. On a miss, the question's parent
    /// label group is looked up in the root store; if the question was
    /// for that label group itself, or recursion was not requested, the
    /// resulting referral is the answer. Otherwise the engine picks a
    /// seeded nameserver address and chases the delegation chain with
    /// [`ask`](Self::ask), caching whatever answers come back.
    pub async fn resolve(&self, question: &Question, rd: bool) -> Result<Message> {
        if let Some(message) = self.cache.get(&question.name) {
            debug!("cache hit for {}", question.name);
            return Ok(message);
        }

        let (apex, is_apex) = match question.name.parent() {
            Some(parent) => (parent, false),
            None => (question.name.clone(), true),
        };
        let message = self.referral_from_root(&apex)?;
        if is_apex || !rd {
            return Ok(message);
        }

        // Pick one of the apex's nameservers, then one of its seeded
        // addresses, as the first server to ask.
        let ns = message
            .authority
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| Error::AuthorityUnresolvable(apex.clone()))?;
        let ns_name = ns
            .rdata
            .ns()
            .ok_or_else(|| Error::AuthorityUnresolvable(apex.clone()))?;
        let ns_zone = self
            .root
            .zone(ns_name)
            .ok_or_else(|| Error::ZoneNotFound(ns_name.clone()))?;
        let owner = ns_zone
            .records(question.rr_type)
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| Error::TypeNotServed(ns_name.clone(), question.rr_type))?;
        let addr = owner
            .rdata
            .ip()
            .ok_or_else(|| Error::InvalidAddress(owner.name.clone()))?;

        let message = self.ask(addr, question, true, 0).await?;
        self.cache.insert(&question.name, &message.answers);
        Ok(message)
    }

    /// Builds the bootstrap referral for a label group out of the root
    /// store: the zone's NS set in Authority, and the seeded A/AAAA
    /// records of every one of those nameservers in Additional.
    fn referral_from_root(&self, apex: &Name) -> Result<Message> {
        let zone = self
            .root
            .zone(apex)
            .ok_or_else(|| Error::ZoneNotFound(apex.clone()))?;

        let mut message = Message::new();
        message.authority.extend_from_slice(zone.records(Type::NS));
        for ns in zone.records(Type::NS) {
            let target = match ns.rdata.ns() {
                Some(target) => target,
                None => continue,
            };
            if let Some(glue) = self.root.zone(target) {
                message.additional.extend_from_slice(glue.records(Type::A));
                message
                    .additional
                    .extend_from_slice(glue.records(Type::AAAA));
            }
        }
        Ok(message)
    }

    /// The delegation-chasing loop: queries `addr`, and as long as the
    /// response is a referral, hops to the referred-to server.
    ///
    /// A response is terminal when recursion was not requested, when it
    /// carries at least one answer, or when it carries no authority
    /// records at all. Otherwise a random authority NS is chosen; its
    /// address comes from glue in the Additional section when present,
    /// and from a fresh sub-resolution of the nameserver's name when
    /// not. Only referral hops count against [`MAX_REFERRALS`] — a
    /// glue-miss sub-resolution starts its own walk at depth zero.
    fn ask<'a>(
        &'a self,
        addr: IpAddr,
        question: &'a Question,
        rd: bool,
        depth: usize,
    ) -> ResolveFuture<'a> {
        Box::pin(async move {
            let mut addr = addr;
            let mut depth = depth;
            loop {
                if depth >= MAX_REFERRALS {
                    return Err(Error::RecursionLimitExceeded(question.name.clone()));
                }

                let query = build_query(question, rd);
                debug!("asking {} about {} (hop {})", addr, question.name, depth);
                let response = self
                    .upstream
                    .exchange(addr, &query.encode())
                    .await
                    .map_err(Error::Upstream)?;
                let (message, _) = parse_message(&response)?;

                let referral = match message.authority.choose(&mut rand::thread_rng()) {
                    Some(rr) if rd && message.answers.is_empty() => rr,
                    _ => return Ok(message),
                };
                let auth_name = referral
                    .rdata
                    .ns()
                    .ok_or_else(|| Error::AuthorityUnresolvable(referral.name.clone()))?
                    .clone();

                let glue = message
                    .additional
                    .iter()
                    .find(|rr| rr.rr_type() == Type::A && rr.name == auth_name)
                    .and_then(|rr| rr.rdata.ip());
                addr = match glue {
                    Some(glue) => glue,
                    None => {
                        debug!("no glue for {}; resolving it first", auth_name);
                        let sub_question = Question {
                            name: auth_name.clone(),
                            rr_type: Type::A,
                            class: Class::IN,
                        };
                        let sub: ResolveFuture<'_> = Box::pin(self.resolve(&sub_question, true));
                        let resolved = sub.await?;
                        let first = resolved
                            .answers
                            .first()
                            .ok_or_else(|| Error::AuthorityUnresolvable(auth_name.clone()))?;
                        first
                            .rdata
                            .ip()
                            .ok_or_else(|| Error::InvalidAddress(first.name.clone()))?
                    }
                };
                depth += 1;
            }
        })
    }
}

/// Builds the query message for one hop: a random ID, the RD bit as
/// requested, the single question, and an OPT record advertising our
/// receive buffer.
fn build_query(question: &Question, rd: bool) -> Message {
    let mut message = Message::new();
    message.header.id = rand::random();
    message.header.set_rd(rd);
    message.questions.push(question.clone());
    message.additional.push(Record::new(
        Name::root(),
        Class::from(ADVERTISED_PAYLOAD_SIZE),
        0,
        Rdata::Opt,
    ));
    message
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error produced by the resolution engine. Listeners log these and
/// reply with empty sections; nothing is translated to a DNS RCODE.
#[derive(Debug)]
pub enum Error {
    /// The bootstrap label group is not in the root store.
    ZoneNotFound(Name),

    /// The seeded zone has no records of the queried type.
    TypeNotServed(Name, Type),

    /// The one-shot upstream exchange failed (including timeouts).
    Upstream(io::Error),

    /// An upstream response did not parse.
    Malformed(reader::Error),

    /// The delegation walk exceeded [`MAX_REFERRALS`] hops.
    RecursionLimitExceeded(Name),

    /// A referral's nameserver could not be reduced to an address.
    AuthorityUnresolvable(Name),

    /// A record that should carry an address did not.
    InvalidAddress(Name),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ZoneNotFound(name) => write!(f, "{}: no such zone in the root store", name),
            Self::TypeNotServed(name, rr_type) => {
                write!(f, "{}: no records of type {}", name, rr_type)
            }
            Self::Upstream(err) => write!(f, "upstream exchange failed: {}", err),
            Self::Malformed(err) => write!(f, "malformed upstream response: {}", err),
            Self::RecursionLimitExceeded(name) => {
                write!(f, "{}: referral chain exceeded {} hops", name, MAX_REFERRALS)
            }
            Self::AuthorityUnresolvable(name) => {
                write!(f, "{}: authority cannot be resolved", name)
            }
            Self::InvalidAddress(name) => write!(f, "{}: record carries no address", name),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Upstream(err) => Some(err),
            Self::Malformed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reader::Error> for Error {
    fn from(err: reader::Error) -> Self {
        Self::Malformed(err)
    }
}

/// The type returned by fallible resolver functions.
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
