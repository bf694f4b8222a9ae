//! Exact frame matches between two videos.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::{hash::FrameHash, sampler::Sample};

/// A frame that appears in both videos.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMatch {
    /// Time of the sample in the first video, in seconds.
    pub first_time: f64,
    /// Earliest time the same frame appears in the second video, in seconds.
    pub second_time: f64,
    /// The shared digest.
    pub hash: FrameHash,
}

/// Pair every sample of `first` with the earliest identical sample of
/// `second`.
///
/// The second sequence is indexed once, so each sample of the first resolves
/// in constant time. Unresolved samples on either side are ignored. Matches
/// come out in the order of `first`.
pub fn find_matches(first: &[Sample], second: &[Sample]) -> Vec<FrameMatch> {
    let mut earliest: HashMap<FrameHash, f64> = HashMap::with_capacity(second.len());
    for sample in second {
        let Some(hash) = sample.hash else {
            continue;
        };
        match earliest.entry(hash) {
            Entry::Occupied(mut entry) => {
                if sample.time < *entry.get() {
                    entry.insert(sample.time);
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(sample.time);
            }
        }
    }

    first
        .iter()
        .filter_map(|sample| {
            let hash = sample.hash?;
            earliest.get(&hash).map(|&second_time| FrameMatch {
                first_time: sample.time,
                second_time,
                hash,
            })
        })
        .collect()
}
