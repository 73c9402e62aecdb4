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

//! The answer cache.
//!
//! Successful resolutions are cached per domain name, whole record
//! sets at a time. Entries age by the smallest TTL in the set and are
//! evicted lazily, on the first lookup past expiry; there is no
//! size-based eviction. A single mutex guards the mapping, and no
//! lookup or store ever holds it across I/O.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use crate::message::Message;
use crate::name::Name;
use crate::rr::{Record, Type};

/// A cached record and the moment its batch was stored.
#[derive(Clone, Debug)]
struct CachedRecord {
    record: Record,
    stored_at: Instant,
}

/// A concurrent mapping from domain name to the records last answered
/// for it.
#[derive(Debug, Default)]
pub struct AnswerCache {
    entries: Mutex<HashMap<Name, Vec<CachedRecord>>>,
}

impl AnswerCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `domain`, returning a message whose answer section
    /// holds the cached A/AAAA records with their TTLs aged by the time
    /// since the entry was stored. Returns [`None`] — after evicting
    /// the entry — once the smallest TTL in the set has run out.
    ///
    /// The lock is released between the snapshot read and the eviction;
    /// a store racing in between simply lands fresher data, which the
    /// eviction then discards at worst.
    pub fn get(&self, domain: &Name) -> Option<Message> {
        let snapshot = self.entries.lock().unwrap().get(domain).cloned()?;

        let soonest = match snapshot.iter().min_by_key(|cached| cached.record.ttl) {
            Some(min) => min,
            None => {
                // Everything offered to insert() had run out already.
                self.remove(domain);
                return None;
            }
        };
        let age = soonest.stored_at.elapsed().as_secs_f64();
        if age > f64::from(soonest.record.ttl) {
            self.remove(domain);
            return None;
        }
        let age = age as i32;

        let mut message = Message::new();
        for cached in &snapshot {
            // Only address records travel back out; anything else that
            // entered the cache stays there until the entry expires.
            if matches!(cached.record.rr_type(), Type::A | Type::AAAA) {
                let mut record = cached.record.clone();
                record.ttl -= age;
                message.answers.push(record);
            }
        }
        Some(message)
    }

    /// Replaces the entry for `domain` with `records`, dropping any
    /// record whose TTL is not positive. The whole batch shares one
    /// insertion instant. Prior contents are discarded, not merged.
    pub fn insert(&self, domain: &Name, records: &[Record]) {
        let now = Instant::now();
        let fresh: Vec<CachedRecord> = records
            .iter()
            .filter(|record| record.ttl > 0)
            .map(|record| CachedRecord {
                record: record.clone(),
                stored_at: now,
            })
            .collect();
        self.entries.lock().unwrap().insert(domain.clone(), fresh);
    }

    fn remove(&self, domain: &Name) {
        self.entries.lock().unwrap().remove(domain);
    }

    /// Ages the entry for `domain` by rewinding its insertion instants.
    #[cfg(test)]
    fn backdate(&self, domain: &Name, by: std::time::Duration) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(cached) = entries.get_mut(domain) {
            for record in cached {
                record.stored_at -= by;
            }
        }
    }

    /// Returns whether an entry (expired or not) exists for `domain`.
    #[cfg(test)]
    fn contains(&self, domain: &Name) -> bool {
        self.entries.lock().unwrap().contains_key(domain)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::class::Class;
    use crate::rr::Rdata;

    fn a_record(name: &str, ttl: i32, addr: &str) -> Record {
        Record::new(
            Name::new(name),
            Class::IN,
            ttl,
            Rdata::A(addr.parse().unwrap()),
        )
    }

    fn ns_record(name: &str, ttl: i32, target: &str) -> Record {
        Record::new(
            Name::new(name),
            Class::IN,
            ttl,
            Rdata::Ns(Name::new(target)),
        )
    }

    #[test]
    fn a_fresh_entry_hits_with_original_ttls() {
        let cache = AnswerCache::new();
        let domain = Name::new("example.com.");
        cache.insert(
            &domain,
            &[
                a_record("example.com.", 3600, "93.184.216.34"),
                ns_record("example.com.", 86400, "ns.example.com."),
            ],
        );

        let message = cache.get(&domain).expect("fresh entry must hit");
        // The NS record entered the cache but address records are all
        // that come back out.
        assert_eq!(message.answers.len(), 1);
        assert_eq!(message.answers[0].rr_type(), Type::A);
        assert!((3599..=3600).contains(&message.answers[0].ttl));
    }

    #[test]
    fn ttls_age_with_the_entry() {
        let cache = AnswerCache::new();
        let domain = Name::new("example.com.");
        cache.insert(&domain, &[a_record("example.com.", 3600, "93.184.216.34")]);
        cache.backdate(&domain, Duration::from_secs(5));

        let message = cache.get(&domain).unwrap();
        assert!((3594..=3595).contains(&message.answers[0].ttl));
    }

    #[test]
    fn the_smallest_ttl_expires_the_whole_entry() {
        let cache = AnswerCache::new();
        let domain = Name::new("example.com.");
        cache.insert(
            &domain,
            &[
                a_record("example.com.", 2, "93.184.216.34"),
                a_record("example.com.", 3600, "93.184.216.35"),
            ],
        );
        cache.backdate(&domain, Duration::from_secs(10));

        assert!(cache.get(&domain).is_none());
        assert!(!cache.contains(&domain));
    }

    #[test]
    fn records_without_positive_ttls_are_not_accepted() {
        let cache = AnswerCache::new();
        let domain = Name::new("example.com.");
        cache.insert(
            &domain,
            &[
                a_record("example.com.", 0, "93.184.216.34"),
                a_record("example.com.", -30, "93.184.216.35"),
            ],
        );

        assert!(cache.get(&domain).is_none());
        assert!(!cache.contains(&domain));
    }

    #[test]
    fn insert_replaces_rather_than_merges() {
        let cache = AnswerCache::new();
        let domain = Name::new("example.com.");
        cache.insert(&domain, &[a_record("example.com.", 3600, "93.184.216.34")]);
        cache.insert(&domain, &[a_record("example.com.", 60, "198.51.100.1")]);

        let message = cache.get(&domain).unwrap();
        assert_eq!(message.answers.len(), 1);
        assert_eq!(
            message.answers[0].rdata,
            Rdata::A("198.51.100.1".parse().unwrap())
        );
    }
}
