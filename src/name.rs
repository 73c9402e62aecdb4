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

//! Implementation of the [`Name`] type for domain names.

use std::fmt;

/// A domain name, held in its textual dotted form.
///
/// `Name`s are stored lowercase (DNS names are case-insensitive, and
/// every ingest path normalizes) and dot-terminated: `example.com.` is
/// the name of the usual example host, and the empty string is the root.
/// The trailing dot is significant — zone lookups and the answer cache
/// key on the exact textual form.
#[derive(Clone, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Name(Box<str>);

impl Name {
    /// Returns the root name (the empty label sequence).
    pub fn root() -> Self {
        Self("".into())
    }

    /// Creates a `Name` from its textual form, lowercasing it.
    pub fn new(text: &str) -> Self {
        Self(text.to_ascii_lowercase().into())
    }

    /// Returns the textual form of the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether this is the root name.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the name with its leftmost label removed, or [`None`]
    /// when there is no label to remove — i.e. when the name consists
    /// of a single label group and is itself as high as the delegation
    /// walk can start.
    ///
    /// The scan starts at the second-to-last byte, so the trailing dot
    /// of a well-formed name is not taken for a label separator:
    /// `a.b.c.` yields `b.c.`, while `com.` (and a bare `x` with no
    /// dots at all) yields `None`.
    pub fn parent(&self) -> Option<Name> {
        let bytes = self.0.as_bytes();
        for i in (0..bytes.len().saturating_sub(1)).rev() {
            if bytes[i] == b'.' {
                return Some(Self(self.0[i + 1..].into()));
            }
        }
        None
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            f.write_str(".")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
