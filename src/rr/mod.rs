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

//! Resource records and their types.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::class::Class;
use crate::name::Name;

mod rr_type;

pub use rr_type::Type;

////////////////////////////////////////////////////////////////////////
// RDATA                                                              //
////////////////////////////////////////////////////////////////////////

/// The typed payload of a resource record.
///
/// Only the record types the resolver works with are representable;
/// records of any other type are dropped during wire parsing and zone
/// loading, so an `Rdata` (and therefore a [`Record`]) of an unsupported
/// type cannot be constructed.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Rdata {
    /// An IPv4 host address.
    A(Ipv4Addr),

    /// An IPv6 host address.
    Aaaa(Ipv6Addr),

    /// The name of an authoritative nameserver.
    Ns(Name),

    /// An EDNS pseudo-record payload. No options are carried; the
    /// interesting datum of an OPT record (the advertised payload size)
    /// lives in its CLASS field.
    Opt,
}

impl Rdata {
    /// Returns the RR type this payload belongs to.
    pub fn rr_type(&self) -> Type {
        match *self {
            Self::A(_) => Type::A,
            Self::Aaaa(_) => Type::AAAA,
            Self::Ns(_) => Type::NS,
            Self::Opt => Type::OPT,
        }
    }

    /// Returns the address carried by an A or AAAA payload.
    pub fn ip(&self) -> Option<IpAddr> {
        match *self {
            Self::A(addr) => Some(IpAddr::V4(addr)),
            Self::Aaaa(addr) => Some(IpAddr::V6(addr)),
            _ => None,
        }
    }

    /// Returns the nameserver name carried by an NS payload.
    pub fn ns(&self) -> Option<&Name> {
        match self {
            Self::Ns(name) => Some(name),
            _ => None,
        }
    }

    /// Parses a zone-file DATA field for the given record type.
    pub fn from_fields(rr_type: Type, data: &str) -> Result<Self, RdataParseError> {
        match rr_type {
            Type::A => data
                .parse::<Ipv4Addr>()
                .map(Self::A)
                .map_err(|_| RdataParseError::BadAddress),
            Type::AAAA => data
                .parse::<Ipv6Addr>()
                .map(Self::Aaaa)
                .map_err(|_| RdataParseError::BadAddress),
            Type::NS => Ok(Self::Ns(Name::new(data))),
            _ => Err(RdataParseError::UnsupportedType(rr_type)),
        }
    }
}

/// The textual form of the payload, as it appears in zone-file DATA
/// fields and in JSON `data` members. OPT payloads render empty.
impl fmt::Display for Rdata {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::A(addr) => addr.fmt(f),
            Self::Aaaa(addr) => addr.fmt(f),
            Self::Ns(name) => f.write_str(name.as_str()),
            Self::Opt => Ok(()),
        }
    }
}

/// An error signaling that a textual rdata field could not be parsed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RdataParseError {
    BadAddress,
    UnsupportedType(Type),
}

impl fmt::Display for RdataParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::BadAddress => f.write_str("invalid address literal"),
            Self::UnsupportedType(rr_type) => {
                write!(f, "no rdata format known for type {}", rr_type)
            }
        }
    }
}

impl std::error::Error for RdataParseError {}

////////////////////////////////////////////////////////////////////////
// RESOURCE RECORDS                                                   //
////////////////////////////////////////////////////////////////////////

/// A DNS resource record.
///
/// The type of the record is carried by its [`Rdata`]; see
/// [`Record::rr_type`]. The TTL is signed ([RFC 2181 § 8] caps real
/// TTLs at 2³¹ − 1, and the answer cache counts them down), and records
/// with non-positive TTLs are rejected at the cache boundary.
///
/// [RFC 2181 § 8]: https://datatracker.ietf.org/doc/html/rfc2181#section-8
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    pub name: Name,
    pub class: Class,
    pub ttl: i32,
    pub rdata: Rdata,
}

impl Record {
    /// Creates a new record.
    pub fn new(name: Name, class: Class, ttl: i32, rdata: Rdata) -> Self {
        Self {
            name,
            class,
            ttl,
            rdata,
        }
    }

    /// Returns the RR type of this record.
    pub fn rr_type(&self) -> Type {
        self.rdata.rr_type()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rdata_knows_its_type() {
        assert_eq!(Rdata::A("127.0.0.1".parse().unwrap()).rr_type(), Type::A);
        assert_eq!(Rdata::Aaaa("::1".parse().unwrap()).rr_type(), Type::AAAA);
        assert_eq!(Rdata::Ns(Name::new("ns.test.")).rr_type(), Type::NS);
        assert_eq!(Rdata::Opt.rr_type(), Type::OPT);
    }

    #[test]
    fn rdata_from_fields_parses_addresses() {
        assert_eq!(
            Rdata::from_fields(Type::A, "192.0.2.1"),
            Ok(Rdata::A("192.0.2.1".parse().unwrap()))
        );
        assert_eq!(
            Rdata::from_fields(Type::AAAA, "2001:db8::1"),
            Ok(Rdata::Aaaa("2001:db8::1".parse().unwrap()))
        );
        assert_eq!(
            Rdata::from_fields(Type::A, "not-an-address"),
            Err(RdataParseError::BadAddress)
        );
    }

    #[test]
    fn rdata_displays_its_zone_file_form() {
        assert_eq!(Rdata::A("192.0.2.1".parse().unwrap()).to_string(), "192.0.2.1");
        assert_eq!(Rdata::Ns(Name::new("NS.Test.")).to_string(), "ns.test.");
        assert_eq!(Rdata::Opt.to_string(), "");
    }
}
