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

//! Constants related to DNS messages.

/// The size of a DNS message header.
pub const HEADER_SIZE: usize = 12;

// Positions of the flag fields within the 16-bit flags word
// (RFC 1035 § 4.1.1, MSB first).
pub const QR_SHIFT: u16 = 15;
pub const OPCODE_SHIFT: u16 = 11;
pub const OPCODE_MASK: u16 = 0xf;
pub const AA_SHIFT: u16 = 10;
pub const TC_SHIFT: u16 = 9;
pub const RD_SHIFT: u16 = 8;
pub const RA_SHIFT: u16 = 7;
pub const Z_SHIFT: u16 = 4;
pub const Z_MASK: u16 = 0x7;
pub const RCODE_MASK: u16 = 0xf;

/// The two high bits that mark a label-length octet as a compression
/// pointer (RFC 1035 § 4.1.4).
pub const POINTER_TAG: u8 = 0xc0;

/// The largest message offset a 14-bit compression pointer can encode.
pub const POINTER_MAX: usize = 16383;

/// The longest permitted label (RFC 1035 § 2.3.4).
pub const MAX_LABEL_LEN: usize = 63;

/// How many compression pointers the name decoder will follow within
/// one name before declaring the message malformed. Pointers may point
/// forward here (the wild holds messages that do), so loops cannot be
/// ruled out by direction alone; the chase bound rules them out.
pub const MAX_POINTER_CHASE: usize = 128;
