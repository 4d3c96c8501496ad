//! Degenerate base expansion.
//!
//! A sequence with `d` degenerate positions of branching factors `b_1..b_d`
//! expands into exactly `b_1 * ... * b_d` concrete sequences. The expansion
//! count doubles as the multiplicity weight of each concrete kmer.

use thiserror::Error;

use crate::core::sequence::{base_set, is_degenerate, normalize};

/// Default maximum number of degenerate positions tolerated in a sequence
pub const DEFAULT_MAX_DEGEN: usize = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpandError {
    #[error("Sequence has {found} degenerate positions, exceeding maximum of {max}")]
    ExcessDegeneracy { found: usize, max: usize },

    #[error("Invalid nucleotide '{symbol}' at position {position}")]
    InvalidBase { symbol: char, position: usize },
}

/// Number of degenerate positions in a sequence (case insensitive)
#[must_use]
pub fn degenerate_positions(seq: &str) -> usize {
    seq.bytes()
        .filter(|b| is_degenerate(b.to_ascii_uppercase()))
        .count()
}

/// Number of concrete sequences a sequence expands into.
///
/// # Errors
///
/// Returns `ExpandError::InvalidBase` for symbols outside the IUPAC alphabet.
pub fn expansion_count(seq: &str) -> Result<u64, ExpandError> {
    let normalized = normalize(seq);
    let mut count: u64 = 1;
    for (position, code) in normalized.bytes().enumerate() {
        let bases = base_set(code).ok_or(ExpandError::InvalidBase {
            symbol: char::from(code),
            position,
        })?;
        count = count.saturating_mul(bases.len() as u64);
    }
    Ok(count)
}

/// Expand every degenerate code into its concrete bases.
///
/// Output order is deterministic: positions vary right-most fastest and bases
/// follow alphabetical order, so `"AR"` yields `["AA", "AG"]`.
///
/// # Errors
///
/// Returns `ExpandError::InvalidBase` for symbols outside the IUPAC alphabet
/// and `ExpandError::ExcessDegeneracy` when more than `max_degen` positions
/// are degenerate.
pub fn expand_degenerate(seq: &str, max_degen: usize) -> Result<Vec<String>, ExpandError> {
    let normalized = normalize(seq);

    let mut choices: Vec<&'static [u8]> = Vec::with_capacity(normalized.len());
    let mut degenerate = 0;
    for (position, code) in normalized.bytes().enumerate() {
        let bases = base_set(code).ok_or(ExpandError::InvalidBase {
            symbol: char::from(code),
            position,
        })?;
        if bases.len() > 1 {
            degenerate += 1;
        }
        choices.push(bases);
    }

    if degenerate > max_degen {
        return Err(ExpandError::ExcessDegeneracy {
            found: degenerate,
            max: max_degen,
        });
    }

    if degenerate == 0 {
        return Ok(vec![normalized]);
    }

    let mut expanded: Vec<Vec<u8>> = vec![Vec::with_capacity(choices.len())];
    for bases in choices {
        if let [base] = bases {
            for prefix in &mut expanded {
                prefix.push(*base);
            }
            continue;
        }
        expanded = expanded
            .into_iter()
            .flat_map(|prefix| {
                bases.iter().map(move |&base| {
                    let mut next = prefix.clone();
                    next.push(base);
                    next
                })
            })
            .collect();
    }

    Ok(expanded
        .into_iter()
        .map(|bytes| bytes.into_iter().map(char::from).collect())
        .collect())
}
