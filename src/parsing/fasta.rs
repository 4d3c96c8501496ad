//! FASTA reading with noodles and plain FASTA writing.
//!
//! Supported extensions:
//! - `.fa`, `.fasta`, `.fna` (uncompressed)
//! - `.fa.gz`, `.fasta.gz`, `.fna.gz` (gzip compressed)

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use noodles::fasta;

use crate::core::sequence::SequenceRecord;
use crate::parsing::ParseError;
use crate::utils::validation::check_record_limit;

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Read every record of a FASTA file, in file order.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` if
/// parsing fails, `ParseError::InvalidFormat` if no records are found, or
/// `ParseError::TooManyRecords` if the limit is exceeded. A repeated record id
/// is an `InvalidFormat` error.
pub fn read_fasta(path: &Path) -> Result<Vec<SequenceRecord>, ParseError> {
    let file = File::open(path)?;
    if is_gzipped(path) {
        let mut reader = fasta::io::Reader::new(BufReader::new(GzDecoder::new(file)));
        read_records(&mut reader)
    } else {
        let mut reader = fasta::io::Reader::new(BufReader::new(file));
        read_records(&mut reader)
    }
}

/// Parse FASTA text
///
/// # Errors
///
/// Same as [`read_fasta`], minus I/O failures.
pub fn parse_fasta_text(text: &str) -> Result<Vec<SequenceRecord>, ParseError> {
    let mut reader = fasta::io::Reader::new(text.as_bytes());
    read_records(&mut reader)
}

fn read_records<R: BufRead>(
    reader: &mut fasta::io::Reader<R>,
) -> Result<Vec<SequenceRecord>, ParseError> {
    let mut records = Vec::new();
    let mut ids = HashSet::new();

    for result in reader.records() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

        if check_record_limit(records.len()).is_some() {
            return Err(ParseError::TooManyRecords(records.len()));
        }

        let id = String::from_utf8_lossy(record.name()).to_string();
        if !ids.insert(id.clone()) {
            return Err(ParseError::InvalidFormat(format!(
                "Duplicate FASTA record id '{id}'"
            )));
        }
        let sequence = String::from_utf8_lossy(record.sequence().as_ref()).to_string();
        records.push(SequenceRecord::new(id, sequence));
    }

    if records.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No sequences found in FASTA file".to_string(),
        ));
    }

    Ok(records)
}

/// Write records as unwrapped FASTA
///
/// # Errors
///
/// Returns `ParseError::Io` on write failure.
pub fn write_fasta_to<W: Write>(writer: &mut W, records: &[SequenceRecord]) -> Result<(), ParseError> {
    for record in records {
        writeln!(writer, ">{}", record.id)?;
        writeln!(writer, "{}", record.sequence)?;
    }
    Ok(())
}

/// Write records to a FASTA file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be created or written.
pub fn write_fasta(path: &Path, records: &[SequenceRecord]) -> Result<(), ParseError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_fasta_to(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}
