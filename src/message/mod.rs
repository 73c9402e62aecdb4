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

//! Implementation of reading and writing of DNS messages.

use crate::class::Class;
use crate::name::Name;
use crate::rr::{Record, Type};

pub mod constants;
pub mod reader;
pub mod writer;

pub use reader::parse_message;

use self::constants::*;

////////////////////////////////////////////////////////////////////////
// HEADER                                                             //
////////////////////////////////////////////////////////////////////////

/// The 12-octet DNS message header ([RFC 1035 § 4.1.1]).
///
/// The flags word is kept raw; the individual flag fields are reached
/// through accessors. Section counts are stored as received — when a
/// [`Message`] is encoded they are recomputed from the section vectors,
/// so callers building messages need not maintain them.
///
/// [RFC 1035 § 4.1.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Header {
    pub id: u16,
    pub flags: u16,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl Header {
    /// Returns whether the QR (query response) bit is set.
    pub fn qr(&self) -> bool {
        (self.flags >> QR_SHIFT) & 1 == 1
    }

    /// Sets or clears the QR (query response) bit.
    pub fn set_qr(&mut self, value: bool) {
        self.set_bit(QR_SHIFT, value);
    }

    /// Returns the message's opcode.
    pub fn opcode(&self) -> u8 {
        ((self.flags >> OPCODE_SHIFT) & OPCODE_MASK) as u8
    }

    /// Returns whether the AA (authoritative answer) bit is set.
    pub fn aa(&self) -> bool {
        (self.flags >> AA_SHIFT) & 1 == 1
    }

    /// Returns whether the TC (truncation) bit is set.
    pub fn tc(&self) -> bool {
        (self.flags >> TC_SHIFT) & 1 == 1
    }

    /// Returns whether the RD (recursion desired) bit is set.
    pub fn rd(&self) -> bool {
        (self.flags >> RD_SHIFT) & 1 == 1
    }

    /// Sets or clears the RD (recursion desired) bit.
    pub fn set_rd(&mut self, value: bool) {
        self.set_bit(RD_SHIFT, value);
    }

    /// Returns whether the RA (recursion available) bit is set.
    pub fn ra(&self) -> bool {
        (self.flags >> RA_SHIFT) & 1 == 1
    }

    /// Sets or clears the RA (recursion available) bit.
    pub fn set_ra(&mut self, value: bool) {
        self.set_bit(RA_SHIFT, value);
    }

    /// Returns the Z (reserved) field.
    pub fn z(&self) -> u8 {
        ((self.flags >> Z_SHIFT) & Z_MASK) as u8
    }

    /// Returns the RCODE of the message.
    pub fn rcode(&self) -> u8 {
        (self.flags & RCODE_MASK) as u8
    }

    /// Sets the RCODE of the message. Values above 15 do not fit the
    /// field and are ignored.
    pub fn set_rcode(&mut self, value: u8) {
        if u16::from(value) <= RCODE_MASK {
            self.flags = (self.flags & !RCODE_MASK) | u16::from(value);
        }
    }

    fn set_bit(&mut self, shift: u16, value: bool) {
        if value {
            self.flags |= 1 << shift;
        } else {
            self.flags &= !(1 << shift);
        }
    }
}

////////////////////////////////////////////////////////////////////////
// QUESTIONS                                                          //
////////////////////////////////////////////////////////////////////////

/// The question of a DNS query ([RFC 1035 § 4.1.2]): the domain name
/// whose records are wanted, the record type, and the class. Only one
/// class is in real use ([`Class::IN`]), and while multiple questions
/// per message are theoretically possible, in practice one is sent.
///
/// [RFC 1035 § 4.1.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.2
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Question {
    pub name: Name,
    pub rr_type: Type,
    pub class: Class,
}

////////////////////////////////////////////////////////////////////////
// MESSAGES                                                           //
////////////////////////////////////////////////////////////////////////

/// A DNS message: a [`Header`] followed by the four sections in wire
/// order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<Record>,
    pub authority: Vec<Record>,
    pub additional: Vec<Record>,
}

impl Message {
    /// Creates an empty message with a zeroed header.
    pub fn new() -> Self {
        Self::default()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
