//! Command-line tests driving the `smurf-solver` binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const P1: &str = "ACGTTGCA";
const P2: &str = "GATCCTAG";
const P3: &str = "TTGGCCAA";

/// P2 and P3 as written on the antisense strand
const P2_RC: &str = "CTAGGATC";
const P3_RC: &str = "TTGGCCAA";

fn smurf() -> Command {
    Command::cargo_bin("smurf-solver").unwrap()
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn write_references(dir: &Path) -> PathBuf {
    let fasta = format!(
        ">REF1\n{P1}AAAACCCC{P2}GGGGTTTT{P3}\n>REF2\n{P1}AAAACCCC{P2}GTGTGTGT{P3}\n>REF3\n{P1}TTTTGGGG{P2}CCCCAAAA{P3}\n"
    );
    write(dir, "refs.fasta", &fasta)
}

fn extract(dir: &Path, refs: &Path, region: &str, fwd: &str, rev: &str) -> PathBuf {
    let output = dir.join(format!("{region}-kmers.json"));
    smurf()
        .args(["extract"])
        .arg(refs)
        .args(["--region", region, "--fwd-primer", fwd, "--rev-primer", rev])
        .args(["--trim-length", "8", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("kmer-groups"));
    output
}

fn align(dir: &Path, region: &str, kmers: &Path, asvs: &str) -> PathBuf {
    let rep_seqs = write(dir, &format!("{region}-asvs.fasta"), asvs);
    let output = dir.join(format!("{region}-aln.json"));
    smurf()
        .arg("align")
        .arg("--kmer-map")
        .arg(kmers)
        .arg("--rep-seqs")
        .arg(&rep_seqs)
        .arg("--output")
        .arg(&output)
        .args(["--chunk-size", "1", "--n-workers", "2"])
        .assert()
        .success();
    output
}

/// Run extract and align for both regions and write the manifest
fn prepare_run(dir: &Path) -> PathBuf {
    let refs = write_references(dir);
    let v3_kmers = extract(dir, &refs, "v3", P1, P2_RC);
    let v4_kmers = extract(dir, &refs, "v4", P2, P3_RC);

    align(dir, "v3", &v3_kmers, ">asvA1\nAAAACCCC\n");
    align(dir, "v4", &v4_kmers, ">asvB1\nGGGGTTTT\n>asvB2\nGTGTGTGT\n>asvB3\nCCCCAAAA\n");

    write(dir, "v3-table.tsv", "#OTU ID\tS1\tS2\nasvA1\t10\t4\n");
    write(
        dir,
        "v4-table.tsv",
        "#OTU ID\tS1\tS2\nasvB1\t6\t0\nasvB2\t4\t0\nasvB3\t0\t8\n",
    );
    write(
        dir,
        "manifest.tsv",
        "id\tkmer-map\talignment-map\tfrequency-table\n\
         v3\tv3-kmers.json\tv3-aln.json\tv3-table.tsv\n\
         v4\tv4-kmers.json\tv4-aln.json\tv4-table.tsv\n",
    )
}

#[test]
fn test_help_lists_subcommands() {
    smurf()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("filter-degenerate"))
        .stdout(predicate::str::contains("trim-posthoc"))
        .stdout(predicate::str::contains("reconstruct"));
}

#[test]
fn test_full_pipeline() {
    let dir = TempDir::new().unwrap();
    let manifest = prepare_run(dir.path());
    let out = dir.path().join("results");

    smurf()
        .arg("reconstruct")
        .arg(&manifest)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("features"));

    let table = fs::read_to_string(out.join("feature-table.tsv")).unwrap();
    assert!(table.starts_with("#OTU ID\tS1\tS2\n"));
    assert!(table.contains("REF1|REF2\t20\t4\n"));
    assert!(table.contains("REF3\t0\t8\n"));

    let summary = fs::read_to_string(out.join("reconstruction-summary.tsv")).unwrap();
    assert!(summary.contains("v3:asvA1,v4:asvB1,v4:asvB2"));

    let taxonomy = write(
        dir.path(),
        "taxonomy.tsv",
        "Feature ID\tTaxon\n\
         REF1\tk__Bacteria; p__Firmicutes; g__Blautia\n\
         REF2\tk__Bacteria; p__Firmicutes; g__Roseburia\n\
         REF3\tk__Bacteria; p__Proteobacteria; g__\n",
    );
    let consensus = dir.path().join("feature-taxonomy.tsv");
    smurf()
        .arg("taxonomy")
        .arg("--map")
        .arg(out.join("reconstruction-map.json"))
        .arg("--taxonomy")
        .arg(&taxonomy)
        .arg("--output")
        .arg(&consensus)
        .assert()
        .success();

    let consensus = fs::read_to_string(&consensus).unwrap();
    assert!(consensus.contains("REF1|REF2\tk__Bacteria; p__Firmicutes\n"));
    assert!(consensus.contains("REF3\tk__Bacteria; p__Proteobacteria; g__\n"));
}

#[test]
fn test_reconstruct_json_report() {
    let dir = TempDir::new().unwrap();
    let manifest = prepare_run(dir.path());

    let output = smurf()
        .args(["--format", "json", "reconstruct"])
        .arg(&manifest)
        .arg("--output-dir")
        .arg(dir.path().join("results"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["command"], "reconstruct");
    assert_eq!(report["counts"]["features"], 2);
    assert_eq!(report["counts"]["regions"], 2);
}

#[test]
fn test_undeclared_reference_is_rejected() {
    let dir = TempDir::new().unwrap();
    let manifest = prepare_run(dir.path());
    let declared = write(
        dir.path(),
        "declared.fasta",
        &format!(">REF1\n{P1}\n>REF2\n{P1}\n"),
    );

    smurf()
        .arg("reconstruct")
        .arg(&manifest)
        .arg("--output-dir")
        .arg(dir.path().join("results"))
        .arg("--references")
        .arg(&declared)
        .assert()
        .failure()
        .stderr(predicate::str::contains("REF3"));
}

#[test]
fn test_extract_requires_forward_primer() {
    let dir = TempDir::new().unwrap();
    let refs = write_references(dir.path());

    smurf()
        .arg("extract")
        .arg(&refs)
        .arg("--output")
        .arg(dir.path().join("kmers.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("forward primer"));
}

#[test]
fn test_prepare_with_discards() {
    let dir = TempDir::new().unwrap();
    let refs = write(
        dir.path(),
        "regions.fasta",
        ">r1\nACGTACGT\n>r2\nNNNNACGT\n>r3\nACG\n",
    );
    let discards = dir.path().join("discards.tsv");

    smurf()
        .args(["--format", "tsv", "prepare"])
        .arg(&refs)
        .args(["--region", "v4", "--trim-length", "8", "--output"])
        .arg(dir.path().join("kmers.json"))
        .arg("--discards")
        .arg(&discards)
        .assert()
        .success()
        .stdout(predicate::str::contains("count\tkmer-groups\t1"));

    let discards = fs::read_to_string(&discards).unwrap();
    assert!(discards.contains("r2\texcess-degeneracy"));
    assert!(discards.contains("r3\tlength-mismatch"));
}

#[test]
fn test_filter_degenerate() {
    let dir = TempDir::new().unwrap();
    let refs = write(dir.path(), "refs.fasta", ">keep\nACGTRACGT\n>drop\nNNNNACGT\n");
    let output = dir.path().join("filtered.fasta");

    smurf()
        .arg("filter-degenerate")
        .arg(&refs)
        .arg("--output")
        .arg(&output)
        .args(["--max-degen", "1"])
        .assert()
        .success();

    let filtered = fs::read_to_string(&output).unwrap();
    assert!(filtered.contains(">keep\n"));
    assert!(!filtered.contains(">drop"));
}

#[test]
fn test_trim_posthoc_collapses_asvs() {
    let dir = TempDir::new().unwrap();
    let table = write(
        dir.path(),
        "table.tsv",
        "#OTU ID\tS1\nasv1\t3\nasv2\t5\nasv3\t1\n",
    );
    let seqs = write(
        dir.path(),
        "asvs.fasta",
        ">asv1\nACGTAA\n>asv2\nACGTAAC\n>asv3\nTTTT\n",
    );
    let out_table = dir.path().join("trimmed.tsv");
    let out_seqs = dir.path().join("trimmed.fasta");

    smurf()
        .arg("trim-posthoc")
        .arg("--table")
        .arg(&table)
        .arg("--rep-seqs")
        .arg(&seqs)
        .arg("--output-table")
        .arg(&out_table)
        .arg("--output-seqs")
        .arg(&out_seqs)
        .args(["--trim-length", "6"])
        .assert()
        .success();

    let trimmed = fs::read_to_string(&out_table).unwrap();
    assert!(trimmed.contains("asv1\t8\n"));
    assert!(!trimmed.contains("asv3"));
}
