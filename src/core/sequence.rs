use serde::{Deserialize, Serialize};

/// An identified nucleotide sequence (full-length reference or ASV)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRecord {
    pub id: String,
    pub sequence: String,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Concrete bases represented by an IUPAC nucleotide code.
///
/// Input must already be uppercase; returns `None` for symbols outside the alphabet.
#[must_use]
pub fn base_set(code: u8) -> Option<&'static [u8]> {
    let bases: &'static [u8] = match code {
        b'A' => b"A",
        b'C' => b"C",
        b'G' => b"G",
        b'T' | b'U' => b"T",
        b'R' => b"AG",
        b'Y' => b"CT",
        b'S' => b"CG",
        b'W' => b"AT",
        b'K' => b"GT",
        b'M' => b"AC",
        b'B' => b"CGT",
        b'D' => b"AGT",
        b'H' => b"ACT",
        b'V' => b"ACG",
        b'N' => b"ACGT",
        _ => return None,
    };
    Some(bases)
}

/// Whether an uppercase code stands for more than one base
#[must_use]
pub fn is_degenerate(code: u8) -> bool {
    base_set(code).is_some_and(|bases| bases.len() > 1)
}

/// IUPAC-aware complement of a single uppercase code
#[must_use]
pub fn complement(code: u8) -> u8 {
    match code {
        b'A' => b'T',
        b'T' | b'U' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        // S, W and N are their own complements
        other => other,
    }
}

/// Uppercase a sequence and read `U` as `T`.
///
/// Only ASCII letters change; any other character is kept as is, so the
/// result has the same byte length as the input.
#[must_use]
pub fn normalize(seq: &str) -> String {
    seq.chars()
        .map(|c| match c.to_ascii_uppercase() {
            'U' => 'T',
            upper => upper,
        })
        .collect()
}

/// Reverse complement of a normalized sequence, preserving degenerate codes
#[must_use]
pub fn reverse_complement(seq: &str) -> String {
    seq.bytes().rev().map(|b| char::from(complement(b))).collect()
}

/// Whether two uppercase codes can denote the same base
#[must_use]
pub fn codes_compatible(a: u8, b: u8) -> bool {
    if a == b {
        return true;
    }
    match (base_set(a), base_set(b)) {
        (Some(x), Some(y)) => x.iter().any(|base| y.contains(base)),
        _ => false,
    }
}
