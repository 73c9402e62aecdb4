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

//! Parsing of on-the-wire DNS messages.

use std::convert::TryFrom;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use super::constants::*;
use super::{Header, Message, Question};
use crate::class::Class;
use crate::name::Name;
use crate::rr::{Rdata, Record, Type};

////////////////////////////////////////////////////////////////////////
// MESSAGE PARSING                                                    //
////////////////////////////////////////////////////////////////////////

/// Parses a full DNS message from the beginning of `octets`.
///
/// The section counts in the header drive how many questions and
/// records are read. Records of unsupported types are parsed past and
/// dropped, so the section vectors of the returned [`Message`] may be
/// shorter than the received counts claim. The number of octets
/// consumed is returned alongside the message; trailing data (UDP
/// padding, for instance) is left untouched.
pub fn parse_message(octets: &[u8]) -> Result<(Message, usize)> {
    let mut reader = Reader::try_from(octets)?;
    let header = reader.header();

    let mut message = Message {
        header,
        ..Message::default()
    };
    for _ in 0..header.qdcount {
        message.questions.push(reader.read_question()?);
    }
    for _ in 0..header.ancount {
        if let Some(rr) = reader.read_rr()? {
            message.answers.push(rr);
        }
    }
    for _ in 0..header.nscount {
        if let Some(rr) = reader.read_rr()? {
            message.authority.push(rr);
        }
    }
    for _ in 0..header.arcount {
        if let Some(rr) = reader.read_rr()? {
            message.additional.push(rr);
        }
    }
    Ok((message, reader.cursor))
}

////////////////////////////////////////////////////////////////////////
// READER                                                             //
////////////////////////////////////////////////////////////////////////

/// A "frame" around a buffer containing a DNS message that enables
/// reading the message data.
///
/// A `Reader` is constructed using its [`TryFrom`] implementation. Any
/// underlying buffer must contain at least a full DNS message header of
/// 12 octets; otherwise the construction fails. Questions and records
/// are read sequentially through a cursor, which starts at the first
/// octet after the header; compression pointers may send the name
/// decoder anywhere in the buffer, but the cursor only ever advances
/// past the octets a field occupies at its own position.
struct Reader<'a> {
    octets: &'a [u8],
    cursor: usize,
}

impl<'a> Reader<'a> {
    /// Reads the message header. Header fields sit at fixed positions,
    /// so this does not involve the cursor.
    fn header(&self) -> Header {
        Header {
            id: u16::from_be_bytes(self.octets[0..2].try_into().unwrap()),
            flags: u16::from_be_bytes(self.octets[2..4].try_into().unwrap()),
            qdcount: u16::from_be_bytes(self.octets[4..6].try_into().unwrap()),
            ancount: u16::from_be_bytes(self.octets[6..8].try_into().unwrap()),
            nscount: u16::from_be_bytes(self.octets[8..10].try_into().unwrap()),
            arcount: u16::from_be_bytes(self.octets[10..12].try_into().unwrap()),
        }
    }

    /// Reads a [`Question`] starting at the current cursor.
    fn read_question(&mut self) -> Result<Question> {
        let (name, name_len) = read_name(self.octets, self.cursor, 0)?;
        let name_end = self.cursor + name_len;
        let rr_type = read_u16(self.octets, name_end)?.into();
        let class = read_u16(self.octets, name_end + 2)?.into();
        self.cursor = name_end + 4;
        Ok(Question {
            name,
            rr_type,
            class,
        })
    }

    /// Reads a resource record at the current cursor. Records of
    /// unsupported types are consumed but yield [`None`].
    fn read_rr(&mut self) -> Result<Option<Record>> {
        let (name, name_len) = read_name(self.octets, self.cursor, 0)?;
        let name_end = self.cursor + name_len;
        let rr_type = Type::from(read_u16(self.octets, name_end)?);
        let class = Class::from(read_u16(self.octets, name_end + 2)?);
        let ttl = read_u32(self.octets, name_end + 4)? as i32;
        let rdlength = read_u16(self.octets, name_end + 8)? as usize;
        let rdata_start = name_end + 10;
        if self.octets.len() < rdata_start + rdlength {
            return Err(Error::UnexpectedEom);
        }
        self.cursor = rdata_start + rdlength;

        let rdata = match rr_type {
            Type::A => {
                let octets: [u8; 4] = self.octets[rdata_start..rdata_start + rdlength]
                    .try_into()
                    .map_err(|_| Error::BadRdataLength(rr_type, rdlength))?;
                Rdata::A(Ipv4Addr::from(octets))
            }
            Type::AAAA => {
                let octets: [u8; 16] = self.octets[rdata_start..rdata_start + rdlength]
                    .try_into()
                    .map_err(|_| Error::BadRdataLength(rr_type, rdlength))?;
                Rdata::Aaaa(Ipv6Addr::from(octets))
            }
            Type::NS => {
                let (target, _) = read_name(self.octets, rdata_start, 0)?;
                Rdata::Ns(target)
            }
            Type::OPT => Rdata::Opt,
            _ => return Ok(None), // unsupported type, skipped
        };
        Ok(Some(Record {
            name,
            class,
            ttl,
            rdata,
        }))
    }
}

impl<'a> TryFrom<&'a [u8]> for Reader<'a> {
    type Error = Error;

    fn try_from(octets: &'a [u8]) -> Result<Self> {
        if octets.len() >= HEADER_SIZE {
            Ok(Self {
                octets,
                cursor: HEADER_SIZE,
            })
        } else {
            Err(Error::HeaderTooShort)
        }
    }
}

////////////////////////////////////////////////////////////////////////
// NAME DECODING                                                      //
////////////////////////////////////////////////////////////////////////

/// Decodes a (possibly compressed) name starting at index `start` of
/// `octets`, per [RFC 1035 § 4.1.4]. Pointer targets are indices into
/// `octets`, so the whole message must be passed in.
///
/// Returns the name and the number of octets it occupies *at `start`*
/// (a pointer label occupies two octets and ends the name, however much
/// of the message its target spans). `chased` counts the pointers
/// followed so far; exceeding [`MAX_POINTER_CHASE`] fails, which both
/// bounds the work a hostile message can demand and breaks pointer
/// loops.
///
/// [RFC 1035 § 4.1.4]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.4
fn read_name(octets: &[u8], start: usize, chased: usize) -> Result<(Name, usize)> {
    if chased > MAX_POINTER_CHASE {
        return Err(Error::TooManyPointers);
    }

    let mut text = String::new();
    let mut cursor = start;
    loop {
        let len = *octets.get(cursor).ok_or(Error::UnexpectedEom)? as usize;
        cursor += 1;
        if len == 0 {
            break;
        }
        if len as u8 & POINTER_TAG == POINTER_TAG {
            let low = *octets.get(cursor).ok_or(Error::UnexpectedEom)?;
            cursor += 1;
            let target = usize::from(u16::from_be_bytes([len as u8, low]) & 0x3fff);
            let (tail, _) = read_name(octets, target, chased + 1)?;
            text.push_str(tail.as_str());
            break;
        }
        if len > MAX_LABEL_LEN {
            return Err(Error::LabelTooLong);
        }
        let label = octets
            .get(cursor..cursor + len)
            .ok_or(Error::UnexpectedEom)?;
        text.push_str(std::str::from_utf8(label).map_err(|_| Error::InvalidLabel)?);
        text.push('.');
        cursor += len;
    }
    Ok((Name::new(&text), cursor - start))
}

////////////////////////////////////////////////////////////////////////
// HELPERS FOR READING MULTI-BYTE INTEGERS                            //
////////////////////////////////////////////////////////////////////////

/// Reads a network-byte-order `u16` at index `at` of `octets`.
fn read_u16(octets: &[u8], at: usize) -> Result<u16> {
    let array = octets
        .get(at..at + 2)
        .ok_or(Error::UnexpectedEom)?
        .try_into()
        .unwrap();
    Ok(u16::from_be_bytes(array))
}

/// Reads a network-byte-order `u32` at index `at` of `octets`.
fn read_u32(octets: &[u8], at: usize) -> Result<u32> {
    let array = octets
        .get(at..at + 4)
        .ok_or(Error::UnexpectedEom)?
        .try_into()
        .unwrap();
    Ok(u32::from_be_bytes(array))
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a received buffer does not hold a
/// well-formed DNS message.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    HeaderTooShort,
    UnexpectedEom,
    TooManyPointers,
    LabelTooLong,
    InvalidLabel,
    BadRdataLength(Type, usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::HeaderTooShort => f.write_str("header too short"),
            Self::UnexpectedEom => f.write_str("unexpected end of message"),
            Self::TooManyPointers => f.write_str("compression pointer chain too long"),
            Self::LabelTooLong => f.write_str("label exceeds 63 octets"),
            Self::InvalidLabel => f.write_str("label is not valid text"),
            Self::BadRdataLength(rr_type, len) => {
                write!(f, "bad rdata length {} for type {}", len, rr_type)
            }
        }
    }
}

impl std::error::Error for Error {}

/// The type returned by fallible parsing functions.
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
