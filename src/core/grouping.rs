// Seed-and-sweep grouping of fingerprints.
//
// Every candidate is compared with the seed of the open group only, never
// with the other members. A group can therefore hold members that are more
// than `threshold` apart from each other, and items are never chained
// through intermediate members. Keep it that way: switching to full
// single-link clustering changes which logos end up together.

use crate::config::DEFAULT_THRESHOLD;
use crate::core::distance::hamming;
use crate::core::fingerprint::Fingerprint;
use serde::{Deserialize, Serialize};

/// A set of item indices that were judged near-identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: usize,
    /// Seed first, then the matches in scan order.
    pub members: Vec<usize>,
}

impl Group {
    /// First member. `None` only for a hand-built or deserialized empty group.
    pub fn seed(&self) -> Option<usize> {
        self.members.first().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Disjoint groups covering every fingerprinted item exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    groups: Vec<Group>,
    item_count: usize,
}

impl Partition {
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<Group> {
        self.groups
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of items that were partitioned.
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Group id of every item, indexed by item position.
    pub fn assignments(&self) -> Vec<usize> {
        let mut assignments = vec![0; self.item_count];
        for group in &self.groups {
            for &member in &group.members {
                assignments[member] = group.id;
            }
        }
        assignments
    }

    pub fn group_of(&self, item: usize) -> Option<&Group> {
        self.groups.iter().find(|g| g.members.contains(&item))
    }
}

/// Greedy grouping against a fixed Hamming threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedGrouper {
    threshold: u32,
}

impl SeedGrouper {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Partition `fingerprints` into groups.
    ///
    /// Items are scanned in order. The first unused item seeds a group and
    /// every later unused item within `threshold` (inclusive) of that seed
    /// joins it. Group ids follow discovery order. The result depends on
    /// the order of `fingerprints`: an item close to two seeds joins
    /// whichever seed is swept first.
    pub fn group(&self, fingerprints: &[Fingerprint]) -> Partition {
        let n = fingerprints.len();
        let mut used = vec![false; n];
        let mut groups: Vec<Group> = Vec::new();

        for i in 0..n {
            if used[i] {
                continue;
            }
            used[i] = true;
            let seed = &fingerprints[i];
            let mut members = vec![i];

            for j in (i + 1)..n {
                if !used[j] && hamming(seed, &fingerprints[j]) <= self.threshold {
                    used[j] = true;
                    members.push(j);
                }
            }

            groups.push(Group {
                id: groups.len(),
                members,
            });
        }

        log::debug!(
            "grouped {} fingerprints into {} group(s) at threshold {}",
            n,
            groups.len(),
            self.threshold
        );

        Partition {
            groups,
            item_count: n,
        }
    }
}

impl Default for SeedGrouper {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}
