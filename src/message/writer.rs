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

//! Serialization of on-the-wire DNS messages.

use std::collections::HashMap;

use super::constants::*;
use super::{Header, Message, Question};
use crate::rr::{Rdata, Record};

impl Message {
    /// Serializes the message.
    ///
    /// The four count fields of the emitted header are taken from the
    /// section vectors, not from [`Header`]; everything else in the
    /// header is emitted as-is. Names are compressed against a table
    /// scoped to this one call.
    pub fn encode(&self) -> Vec<u8> {
        let mut header = self.header;
        header.qdcount = self.questions.len() as u16;
        header.ancount = self.answers.len() as u16;
        header.nscount = self.authority.len() as u16;
        header.arcount = self.additional.len() as u16;

        let mut writer = Writer::new(&header);
        for question in &self.questions {
            writer.write_question(question);
        }
        for rr in self
            .answers
            .iter()
            .chain(&self.authority)
            .chain(&self.additional)
        {
            writer.write_rr(rr);
        }
        writer.finish()
    }
}

////////////////////////////////////////////////////////////////////////
// WRITER                                                             //
////////////////////////////////////////////////////////////////////////

/// Serializes one DNS message into a growing buffer, compressing names
/// as it goes.
///
/// The compression table maps every name *suffix* already emitted to
/// the pointer word (offset with the two tag bits set) that refers back
/// to it. Suffixes are recorded for each name written — including
/// question names, which are recorded but, matching common practice,
/// never themselves emitted as pointers — so later owners and NS
/// targets compress against anything that came before. Only offsets
/// past the header and within pointer range are recorded.
struct Writer {
    octets: Vec<u8>,
    compressed: HashMap<String, u16>,
}

impl Writer {
    /// Creates a `Writer` and emits the header.
    fn new(header: &Header) -> Self {
        let mut octets = Vec::with_capacity(512);
        octets.extend_from_slice(&header.id.to_be_bytes());
        octets.extend_from_slice(&header.flags.to_be_bytes());
        octets.extend_from_slice(&header.qdcount.to_be_bytes());
        octets.extend_from_slice(&header.ancount.to_be_bytes());
        octets.extend_from_slice(&header.nscount.to_be_bytes());
        octets.extend_from_slice(&header.arcount.to_be_bytes());
        Self {
            octets,
            compressed: HashMap::new(),
        }
    }

    /// Serializes a question.
    fn write_question(&mut self, question: &Question) {
        let name = self.name_bytes(question.name.as_str(), false, self.octets.len());
        self.octets.extend_from_slice(&name);
        self.octets
            .extend_from_slice(&u16::from(question.rr_type).to_be_bytes());
        self.octets
            .extend_from_slice(&u16::from(question.class).to_be_bytes());
    }

    /// Serializes a resource record: owner, type, class, TTL, then the
    /// 2-octet RDLENGTH and the rdata itself.
    fn write_rr(&mut self, rr: &Record) {
        let owner = self.name_bytes(rr.name.as_str(), true, self.octets.len());
        self.octets.extend_from_slice(&owner);
        self.octets
            .extend_from_slice(&u16::from(rr.rr_type()).to_be_bytes());
        self.octets
            .extend_from_slice(&u16::from(rr.class).to_be_bytes());
        self.octets.extend_from_slice(&rr.ttl.to_be_bytes());

        match &rr.rdata {
            Rdata::A(addr) => {
                self.octets.extend_from_slice(&4u16.to_be_bytes());
                self.octets.extend_from_slice(&addr.octets());
            }
            Rdata::Aaaa(addr) => {
                self.octets.extend_from_slice(&16u16.to_be_bytes());
                self.octets.extend_from_slice(&addr.octets());
            }
            Rdata::Ns(target) => {
                // The name starts after the RDLENGTH field, so suffix
                // offsets are measured from two octets past the cursor.
                let rdata = self.name_bytes(target.as_str(), true, self.octets.len() + 2);
                self.octets
                    .extend_from_slice(&(rdata.len() as u16).to_be_bytes());
                self.octets.extend_from_slice(&rdata);
            }
            Rdata::Opt => {
                self.octets.extend_from_slice(&0u16.to_be_bytes());
            }
        }
    }

    /// Consumes the `Writer`, returning the message octets.
    fn finish(self) -> Vec<u8> {
        self.octets
    }

    /// Produces the wire form of `name` as though it were written at
    /// message offset `offset`, recording each new suffix in the
    /// compression table along the way.
    ///
    /// When `compress` is set and the whole name (or, mid-walk, the
    /// remaining suffix) is already in the table, a 2-octet pointer is
    /// emitted in its place and the walk stops. The empty part after a
    /// name's trailing dot emits the terminating null label.
    fn name_bytes(&mut self, name: &str, compress: bool, offset: usize) -> Vec<u8> {
        if name.is_empty() {
            return vec![0];
        }
        if compress {
            if let Some(&pointer) = self.compressed.get(name) {
                return pointer.to_be_bytes().to_vec();
            }
        }
        self.record_suffix(name, offset);

        let mut octets = Vec::with_capacity(name.len() + 1);
        let mut consumed = 0;
        for part in name.split('.') {
            if part.is_empty() {
                octets.push(0);
                break;
            }
            debug_assert!(part.len() <= MAX_LABEL_LEN);
            octets.push(part.len() as u8);
            octets.extend_from_slice(part.as_bytes());
            consumed += part.len() + 1;
            // A name missing its trailing dot runs out of text after
            // the last label; there is no suffix left to record.
            let suffix = name.get(consumed..).unwrap_or("");
            if compress {
                if let Some(&pointer) = self.compressed.get(suffix) {
                    octets.extend_from_slice(&pointer.to_be_bytes());
                    break;
                }
            }
            self.record_suffix(suffix, offset + consumed);
        }
        octets
    }

    /// Records a suffix as available for compression at `offset`. Only
    /// offsets past the header can be pointer targets, and a 14-bit
    /// pointer cannot reach past [`POINTER_MAX`].
    fn record_suffix(&mut self, suffix: &str, offset: usize) {
        if suffix.is_empty() || offset < HEADER_SIZE || offset > POINTER_MAX {
            return;
        }
        if !self.compressed.contains_key(suffix) {
            self.compressed
                .insert(suffix.to_owned(), offset as u16 | u16::from(POINTER_TAG) << 8);
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::Class;
    use crate::message::parse_message;
    use crate::name::Name;
    use crate::rr::Type;

    fn question(name: &str, rr_type: Type) -> Question {
        Question {
            name: Name::new(name),
            rr_type,
            class: Class::IN,
        }
    }

    fn a_record(name: &str, ttl: i32, addr: &str) -> Record {
        Record::new(
            Name::new(name),
            Class::IN,
            ttl,
            Rdata::A(addr.parse().unwrap()),
        )
    }

    #[test]
    fn encodes_a_plain_query() {
        let mut message = Message::new();
        message.header.id = 0x1234;
        message.header.set_rd(true);
        message.questions.push(question("example.com.", Type::A));

        assert_eq!(
            message.encode(),
            b"\x12\x34\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\
              \x07example\x03com\x00\x00\x01\x00\x01"
        );
    }

    #[test]
    fn encodes_the_root_name_as_a_single_null_label() {
        let mut message = Message::new();
        message
            .additional
            .push(Record::new(Name::root(), Class::from(4096), 0, Rdata::Opt));

        assert_eq!(
            message.encode(),
            b"\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x01\
              \x00\x00\x29\x10\x00\x00\x00\x00\x00\x00\x00"
        );
    }

    #[test]
    fn compresses_repeated_owner_names() {
        let mut message = Message::new();
        message.questions.push(question("example.com.", Type::A));
        message.answers.push(a_record("example.com.", 60, "192.0.2.1"));
        message.answers.push(a_record("example.com.", 60, "192.0.2.2"));

        let octets = message.encode();
        // Both answer owners collapse to a pointer to the question name
        // at offset 12.
        assert_eq!(&octets[29..31], b"\xc0\x0c");
        assert_eq!(&octets[45..47], b"\xc0\x0c");

        let (parsed, _) = parse_message(&octets).unwrap();
        assert_eq!(parsed.answers.len(), 2);
        assert_eq!(parsed.answers[0].name, Name::new("example.com."));
        assert_eq!(parsed.answers[1].name, Name::new("example.com."));
    }

    #[test]
    fn compresses_shared_suffixes_in_ns_rdata() {
        let mut message = Message::new();
        message.questions.push(question("example.com.", Type::NS));
        message.authority.push(Record::new(
            Name::new("example.com."),
            Class::IN,
            86400,
            Rdata::Ns(Name::new("ns.example.com.")),
        ));

        let octets = message.encode();
        let (parsed, consumed) = parse_message(&octets).unwrap();
        assert_eq!(consumed, octets.len());
        assert_eq!(
            parsed.authority[0].rdata,
            Rdata::Ns(Name::new("ns.example.com."))
        );
        // The NS target ends in a pointer to the question name, so its
        // rdata is the "ns" label plus a 2-octet pointer.
        let rdlength = u16::from_be_bytes([octets[octets.len() - 7], octets[octets.len() - 6]]);
        assert_eq!(rdlength, 5);
        assert_eq!(&octets[octets.len() - 2..], b"\xc0\x0c");
    }

    #[test]
    fn round_trips_a_full_message() {
        let mut message = Message::new();
        message.header.id = 0xbeef;
        message.header.set_qr(true);
        message.header.set_rd(true);
        message.header.set_ra(true);
        message.questions.push(question("example.com.", Type::A));
        message.answers.push(a_record("example.com.", 3600, "93.184.216.34"));
        message.authority.push(Record::new(
            Name::new("example.com."),
            Class::IN,
            86400,
            Rdata::Ns(Name::new("ns.example.net.")),
        ));
        message.additional.push(Record::new(
            Name::new("ns.example.net."),
            Class::IN,
            86400,
            Rdata::Aaaa("2001:db8::53".parse().unwrap()),
        ));
        message
            .additional
            .push(Record::new(Name::root(), Class::from(4096), 0, Rdata::Opt));

        let octets = message.encode();
        let (parsed, consumed) = parse_message(&octets).unwrap();
        assert_eq!(consumed, octets.len());

        // The counts were filled in during encoding; mirror them before
        // comparing whole messages.
        let mut expected = message.clone();
        expected.header.qdcount = 1;
        expected.header.ancount = 1;
        expected.header.nscount = 1;
        expected.header.arcount = 2;
        assert_eq!(parsed, expected);
    }

    #[test]
    fn compressed_and_uncompressed_forms_decode_alike() {
        let mut message = Message::new();
        message.questions.push(question("a.b.example.com.", Type::A));
        message
            .answers
            .push(a_record("a.b.example.com.", 30, "192.0.2.7"));
        message
            .authority
            .push(Record::new(
                Name::new("b.example.com."),
                Class::IN,
                30,
                Rdata::Ns(Name::new("ns.example.com.")),
            ));

        let compressed = message.encode();
        let (from_compressed, _) = parse_message(&compressed).unwrap();

        // Expand every name by hand into an equivalent pointer-free
        // message and check both decode to the same sections.
        let mut flat = Vec::new();
        flat.extend_from_slice(&compressed[..12]);
        let names: [&str; 4] = [
            "a.b.example.com.",
            "a.b.example.com.",
            "b.example.com.",
            "ns.example.com.",
        ];
        let encode_flat = |name: &str, out: &mut Vec<u8>| {
            for label in name.split('.').filter(|l| !l.is_empty()) {
                out.push(label.len() as u8);
                out.extend_from_slice(label.as_bytes());
            }
            out.push(0);
        };
        encode_flat(names[0], &mut flat);
        flat.extend_from_slice(b"\x00\x01\x00\x01");
        encode_flat(names[1], &mut flat);
        flat.extend_from_slice(b"\x00\x01\x00\x01\x00\x00\x00\x1e\x00\x04\xc0\x00\x02\x07");
        encode_flat(names[2], &mut flat);
        flat.extend_from_slice(b"\x00\x02\x00\x01\x00\x00\x00\x1e\x00\x10");
        encode_flat(names[3], &mut flat);

        let (from_flat, _) = parse_message(&flat).unwrap();
        assert!(compressed.len() < flat.len());
        assert_eq!(from_compressed.questions, from_flat.questions);
        assert_eq!(from_compressed.answers, from_flat.answers);
        assert_eq!(from_compressed.authority, from_flat.authority);
    }
}
