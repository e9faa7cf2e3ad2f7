//! Batch-level failure statistics

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::classifier::MessageClass;
use crate::enrichment::EnrichedFailure;
use crate::failure::ErrorType;

/// Failure counts and shares for one batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStatistics {
    pub total_errors: usize,
    /// Number of failing documents
    pub total_files: usize,
    pub error_type_counts: BTreeMap<ErrorType, usize>,
    pub error_type_percentages: BTreeMap<ErrorType, f64>,
    pub message_class_counts: BTreeMap<MessageClass, usize>,
    pub message_class_percentages: BTreeMap<MessageClass, f64>,
}

impl BatchStatistics {
    /// Most frequent error type, ties resolved by declaration order
    pub fn dominant_error_type(&self) -> Option<ErrorType> {
        self.error_type_counts
            .iter()
            .max_by(|(a_type, a), (b_type, b)| a.cmp(b).then(b_type.cmp(a_type)))
            .map(|(error_type, _)| *error_type)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn count_by<K, I>(keys: I) -> BTreeMap<K, usize>
where
    K: Ord + Copy,
    I: IntoIterator<Item = K>,
{
    keys.into_iter().fold(BTreeMap::new(), |mut counts, key| {
        *counts.entry(key).or_insert(0) += 1;
        counts
    })
}

fn percentages<K: Ord + Copy>(counts: &BTreeMap<K, usize>, total: usize) -> BTreeMap<K, f64> {
    if total == 0 {
        return BTreeMap::new();
    }

    counts
        .iter()
        .map(|(key, count)| (*key, round2(100.0 * *count as f64 / total as f64)))
        .collect()
}

/// Aggregate the failures of one batch
///
/// Every failing document contributes exactly one failure, so
/// `total_errors == total_files`. The result does not depend on input order.
pub fn aggregate<'a, I>(failures: I) -> BatchStatistics
where
    I: IntoIterator<Item = &'a EnrichedFailure>,
{
    let failures: Vec<&EnrichedFailure> = failures.into_iter().collect();
    let total_errors = failures.len();

    let error_type_counts = count_by(failures.iter().map(|failure| failure.error_type));
    let message_class_counts = count_by(failures.iter().map(|failure| failure.message_class));

    BatchStatistics {
        total_errors,
        total_files: failures.len(),
        error_type_percentages: percentages(&error_type_counts, total_errors),
        message_class_percentages: percentages(&message_class_counts, total_errors),
        error_type_counts,
        message_class_counts,
    }
}
