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

//! A recursive DNS resolver.
//!
//! `burrow` answers questions by walking the delegation chain itself:
//! starting from a statically seeded root store, it follows NS
//! referrals from label group to label group, asking one upstream
//! server at a time over UDP, until some server answers. Answers are
//! cached per domain name with per-record TTL accounting.
//!
//! The crate is organized around that walk:
//!
//! * [`message`] — the wire codec: parsing and serializing RFC 1035
//!   messages, compression pointers included;
//! * [`zone`] — the frozen root store seeded from a zone file at
//!   startup;
//! * [`cache`] — the answer cache;
//! * [`resolver`] — the engine that ties them together, and the
//!   one-shot UDP upstream client behind its
//!   [`Upstream`](resolver::Upstream) seam;
//! * [`server`] — the transports: a UDP datagram listener and an HTTP
//!   `GET /dns-query` JSON adapter.
//!
//! The `burrowd` binary wires the pieces to real sockets.

pub mod cache;
pub mod class;
pub mod message;
pub mod name;
pub mod resolver;
pub mod rr;
pub mod server;
mod util;
pub mod zone;
