//! Centralized validation and helper functions.

use crate::core::sequence::base_set;

/// Maximum number of records allowed in a single input file (DOS protection)
pub const MAX_RECORDS: usize = 5_000_000;

/// Content hash of a sequence, used as its stable identifier.
///
/// Computed on the uppercase sequence so case never changes an id.
///
/// # Examples
///
/// ```
/// use smurf_solver::utils::validation::sequence_hash;
///
/// assert_eq!(sequence_hash("acgt"), "f1f8f4bf413b16ad135722aa4591043e");
/// ```
#[must_use]
pub fn sequence_hash(sequence: &str) -> String {
    let uppercase: Vec<u8> = sequence.bytes().map(|b| b.to_ascii_uppercase()).collect();
    format!("{:x}", md5::compute(&uppercase))
}

/// Position of the first symbol outside the IUPAC nucleotide alphabet.
///
/// Expects a normalized (uppercase) sequence.
#[must_use]
pub fn first_invalid_base(sequence: &str) -> Option<usize> {
    sequence.bytes().position(|b| base_set(b).is_none())
}

/// Check whether a value lies in the closed unit interval
#[must_use]
pub fn is_unit_fraction(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Check if adding another record would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new record.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_record_limit(count: usize) -> Option<String> {
    if count >= MAX_RECORDS {
        Some(format!(
            "Too many records: adding another would exceed maximum of {MAX_RECORDS}"
        ))
    } else {
        None
    }
}
