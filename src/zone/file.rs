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

//! Parsing of the seed zone file.
//!
//! The format is line-oriented: whitespace-separated fields
//! `NAME TTL CLASS TYPE DATA`, with `;` starting a comment that runs to
//! the end of the line. The first non-empty line must be the SOA (11
//! fields). Lines whose TYPE is not one of the supported record types
//! are dropped; integer fields that fail to parse are stored as −1
//! rather than rejected.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, BufRead};

use super::{Root, Soa, Zone};
use crate::class::Class;
use crate::name::Name;
use crate::rr::{Rdata, RdataParseError, Type};

/// The number of fields in an SOA line: name, TTL, class, `SOA`, mname,
/// rname, serial, refresh, retry, expire, minimum.
const SOA_FIELDS: usize = 11;

/// The fewest fields a record line can have (one DATA field).
const RECORD_FIELDS: usize = 5;

////////////////////////////////////////////////////////////////////////
// PARSING                                                            //
////////////////////////////////////////////////////////////////////////

/// Parses the seed file into a [`Root`]. This runs once, at startup,
/// before any listener exists.
pub(super) fn parse(reader: impl BufRead) -> Result<Root> {
    let mut soa = None;
    let mut zones: HashMap<Name, Zone> = HashMap::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(Error::Io)?;
        let fields: Vec<&str> = match sanitize(&line) {
            Some(fields) => fields,
            None => continue,
        };
        let number = index + 1;

        if soa.is_none() {
            soa = Some(parse_soa(&fields, number)?);
            continue;
        }

        if fields.len() < RECORD_FIELDS {
            return Err(Error::ShortRecordLine(number));
        }
        let rr_type = match fields[3].parse::<Type>() {
            Ok(rr_type) => rr_type,
            Err(_) => continue, // unsupported type, dropped
        };
        let rdata = Rdata::from_fields(rr_type, fields[4])
            .map_err(|source| Error::BadRdata(number, source))?;
        let name = Name::new(fields[0]);
        let record = crate::rr::Record {
            name: name.clone(),
            class: fields[2].parse().unwrap_or_else(|_| Class::from(0)),
            ttl: parse_i32(fields[1]),
            rdata,
        };
        zones
            .entry(name.clone())
            .or_insert_with(|| Zone::new(name))
            .push(record);
    }

    match soa {
        Some(soa) => Ok(Root { soa, zones }),
        None => Err(Error::MissingSoa),
    }
}

/// Normalizes one line into its fields: left-trim, strip the `;`
/// comment, right-trim, and split on runs of spaces and tabs. Empty
/// and comment-only lines yield [`None`].
fn sanitize(line: &str) -> Option<Vec<&str>> {
    let line = line.trim_start();
    if line.is_empty() || line.starts_with(';') {
        return None;
    }
    let line = line.split(';').next().unwrap_or("").trim_end();
    if line.is_empty() {
        return None;
    }
    Some(line.split_whitespace().collect())
}

fn parse_soa(fields: &[&str], number: usize) -> Result<Soa> {
    if fields.len() != SOA_FIELDS {
        return Err(Error::BadSoaLine(number));
    }
    Ok(Soa {
        name: Name::new(fields[0]),
        ttl: parse_i32(fields[1]),
        class: fields[2].parse().unwrap_or_else(|_| Class::from(0)),
        mname: Name::new(fields[4]),
        rname: Name::new(fields[5]),
        serial: parse_i32(fields[6]),
        refresh: parse_i32(fields[7]),
        retry: parse_i32(fields[8]),
        expire: parse_i32(fields[9]),
        minimum: parse_i32(fields[10]),
    })
}

/// Parses an integer field, yielding −1 for anything unparseable. Seed
/// files in the wild carry oddities in these fields, and a bad number
/// is not worth refusing to start over.
fn parse_i32(field: &str) -> i32 {
    field.parse().unwrap_or(-1)
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error encountered while loading the seed zone file.
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    MissingSoa,
    BadSoaLine(usize),
    ShortRecordLine(usize),
    BadRdata(usize, RdataParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {}", err),
            Self::MissingSoa => f.write_str("seed file has no SOA line"),
            Self::BadSoaLine(number) => {
                write!(f, "line {}: SOA line does not have 11 fields", number)
            }
            Self::ShortRecordLine(number) => {
                write!(f, "line {}: record line has fewer than 5 fields", number)
            }
            Self::BadRdata(number, source) => write!(f, "line {}: {}", number, source),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::BadRdata(_, source) => Some(source),
            _ => None,
        }
    }
}

/// The type returned by fallible seed-file functions.
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const SEED: &str = "\
.\t86400\tIN\tSOA\ta.root-servers.net. nstld.verisign-grs.com. 2024010101 1800 900 604800 86400
; delegation for com.
com.\t\t172800\tIN\tNS\ta.gtld-servers.net.
com.\t\t172800 IN NS b.gtld-servers.net.   ; second of the pair
a.gtld-servers.net.\t172800\tIN\tA\t192.5.6.30
a.gtld-servers.net.\t172800\tIN\tAAAA\t2001:503:a83e::2:30
b.gtld-servers.net.\t172800\tIN\tA\t192.33.14.30

example.com.\toops\tIN\tNS\tns.example.com.
example.com.\t3600\tIN\tMX\t10 mail.example.com.
";

    #[test]
    fn parses_the_soa_line() {
        let root = Root::from_reader(Cursor::new(SEED)).unwrap();
        let soa = root.soa();
        assert_eq!(soa.name, Name::new("."));
        assert_eq!(soa.class, Class::IN);
        assert_eq!(soa.mname, Name::new("a.root-servers.net."));
        assert_eq!(soa.rname, Name::new("nstld.verisign-grs.com."));
        assert_eq!(soa.ttl, 86400);
        assert_eq!(soa.serial, 2024010101);
        assert_eq!(soa.refresh, 1800);
        assert_eq!(soa.retry, 900);
        assert_eq!(soa.expire, 604800);
        assert_eq!(soa.minimum, 86400);
    }

    #[test]
    fn groups_records_into_zones_by_owner_and_type() {
        let root = Root::from_reader(Cursor::new(SEED)).unwrap();
        let com = root.zone(&Name::new("com.")).unwrap();
        assert_eq!(com.records(Type::NS).len(), 2);
        assert!(com.records(Type::A).is_empty());

        let glue = root.zone(&Name::new("a.gtld-servers.net.")).unwrap();
        assert_eq!(glue.records(Type::A).len(), 1);
        assert_eq!(glue.records(Type::AAAA).len(), 1);
        assert_eq!(
            glue.records(Type::A)[0].rdata,
            Rdata::A("192.5.6.30".parse().unwrap())
        );
    }

    #[test]
    fn drops_unsupported_types_and_tolerates_bad_integers() {
        let root = Root::from_reader(Cursor::new(SEED)).unwrap();
        let example = root.zone(&Name::new("example.com.")).unwrap();
        // The MX line is gone; the NS line with the unparseable TTL
        // survives with TTL −1.
        assert!(example.records(Type::A).is_empty());
        let ns = example.records(Type::NS);
        assert_eq!(ns.len(), 1);
        assert_eq!(ns[0].ttl, -1);
    }

    #[test]
    fn rejects_a_file_with_no_soa() {
        let err = Root::from_reader(Cursor::new("; nothing here\n")).unwrap_err();
        assert!(matches!(err, Error::MissingSoa));
    }

    #[test]
    fn rejects_a_short_record_line() {
        let seed = format!(
            "{}\n{}\n",
            ". 1 IN SOA m. r. 1 2 3 4 5", "com. 172800 IN NS"
        );
        let err = Root::from_reader(Cursor::new(seed)).unwrap_err();
        assert!(matches!(err, Error::ShortRecordLine(2)));
    }
}
