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

//! The root zone store.
//!
//! Every resolution starts from the [`Root`]: the bootstrap set of
//! zones loaded from a seed file before the listeners start. The store
//! is built once and never mutated afterwards, so handlers share it
//! behind an [`Arc`](std::sync::Arc) with no further synchronization.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::class::Class;
use crate::name::Name;
use crate::rr::{Record, Type};

mod file;

pub use file::{Error, Result};

////////////////////////////////////////////////////////////////////////
// ZONES                                                              //
////////////////////////////////////////////////////////////////////////

/// The records sharing one owner name, grouped by type.
///
/// Two records with the same (name, type) coexist as siblings in their
/// vector; the resolver selects among them at random.
#[derive(Clone, Debug)]
pub struct Zone {
    name: Name,
    rrs: HashMap<Type, Vec<Record>>,
}

impl Zone {
    fn new(name: Name) -> Self {
        Self {
            name,
            rrs: HashMap::new(),
        }
    }

    /// Returns the owner name of this zone.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Returns the records of the given type, oldest first. Types with
    /// no records yield an empty slice.
    pub fn records(&self, rr_type: Type) -> &[Record] {
        self.rrs.get(&rr_type).map_or(&[], Vec::as_slice)
    }

    fn push(&mut self, record: Record) {
        self.rrs.entry(record.rr_type()).or_default().push(record);
    }
}

////////////////////////////////////////////////////////////////////////
// THE START OF AUTHORITY                                             //
////////////////////////////////////////////////////////////////////////

/// The fields of the seed file's SOA line. Stored for reference; never
/// re-emitted on the wire.
#[derive(Clone, Debug)]
pub struct Soa {
    pub name: Name,
    pub class: Class,
    pub mname: Name,
    pub rname: Name,
    pub ttl: i32,
    pub serial: i32,
    pub refresh: i32,
    pub retry: i32,
    pub expire: i32,
    pub minimum: i32,
}

////////////////////////////////////////////////////////////////////////
// THE ROOT STORE                                                     //
////////////////////////////////////////////////////////////////////////

/// The process-wide root zone store: the SOA plus the seeded zones,
/// keyed by owner name.
#[derive(Clone, Debug)]
pub struct Root {
    soa: Soa,
    zones: HashMap<Name, Zone>,
}

impl Root {
    /// Loads the root store from a seed zone file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(Error::Io)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Loads the root store from any line-oriented source.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        file::parse(reader)
    }

    /// Returns the SOA of the seed file.
    pub fn soa(&self) -> &Soa {
        &self.soa
    }

    /// Looks up a zone by owner name.
    pub fn zone(&self, name: &Name) -> Option<&Zone> {
        self.zones.get(name)
    }
}
