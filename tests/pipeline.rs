use anyhow::Result;
use std::io::{self, Write};

use radigest::collect::{OrderedCollector, ResultMessage};
use radigest::digest::{DigestOptions, DigestPlan, Fragment, LengthRange};
use radigest::enzyme::EnzymeCatalog;
use radigest::io::fasta::{FastaReader, FastaRecord};
use radigest::pipeline::{self, RunOptions};
use radigest::sim;
use radigest::DigestError;

fn plan(list: &str, allow_same: bool) -> DigestPlan {
    let enzymes = EnzymeCatalog::builtin().resolve_list(list).unwrap();
    let opts = DigestOptions { allow_same_adjacency: allow_same, ..Default::default() };
    DigestPlan::new(&enzymes, opts).unwrap()
}

fn genome(n_chrom: usize) -> Vec<FastaRecord> {
    (0..n_chrom)
        .map(|i| FastaRecord {
            id: format!("chr{}", i + 1),
            desc: None,
            seq: sim::make(2_000 + 3_000 * (n_chrom - i), 0.45, i as u64 + 1),
        })
        .collect()
}

fn run_gff(records: &[FastaRecord], plan: &DigestPlan, range: LengthRange, threads: usize) -> (String, radigest::collect::RunStats) {
    let mut out = Vec::new();
    let input = records.iter().cloned().map(Ok::<_, anyhow::Error>);
    let stats = pipeline::run(input, plan, RunOptions::new(range, threads), &mut out).unwrap();
    (String::from_utf8(out).unwrap(), stats)
}

/// (chrom, start1, end, length) of every fragment line.
fn parse_lines(gff: &str) -> Vec<(String, usize, usize, usize)> {
    gff.lines()
        .skip(1)
        .map(|l| {
            let cols: Vec<&str> = l.split('\t').collect();
            assert_eq!(cols.len(), 9, "bad line {l:?}");
            let len = cols[8].rsplit("Length=").next().unwrap().parse().unwrap();
            (cols[0].to_string(), cols[3].parse().unwrap(), cols[4].parse().unwrap(), len)
        })
        .collect()
}

#[test]
fn output_is_independent_of_thread_count() {
    let recs = genome(12);
    let plan = plan("EcoRI,MseI", false);
    let range = LengthRange::new(50, 2_000).unwrap();
    let (one, stats_one) = run_gff(&recs, &plan, range, 1);
    for threads in [2, 4, 7] {
        let (many, stats_many) = run_gff(&recs, &plan, range, threads);
        assert_eq!(one, many, "threads={threads}");
        assert_eq!(stats_one, stats_many);
    }
}

#[test]
fn summary_totals_match_written_records() {
    let recs = genome(6);
    let plan = plan("MluCI", false);
    let (gff, stats) = run_gff(&recs, &plan, LengthRange::new(1, 500).unwrap(), 3);
    assert!(gff.starts_with("##gff-version 3\n"));

    let lines = parse_lines(&gff);
    assert_eq!(stats.total_fragments, lines.len() as u64);
    let bases: usize = lines.iter().map(|&(_, s, e, _)| e + 1 - s).sum();
    assert_eq!(stats.total_bases, bases as u64);
    assert!(lines.iter().all(|&(_, s, e, len)| e + 1 - s == len));

    for (chrom, cs) in &stats.per_chromosome {
        let n = lines.iter().filter(|l| &l.0 == chrom).count() as u64;
        assert_eq!(cs.fragments, n, "{chrom}");
    }
}

#[test]
fn chromosomes_appear_in_input_order() {
    let recs = genome(9);
    let plan = plan("HpaII,MseI", false);
    let (gff, _) = run_gff(&recs, &plan, LengthRange::unbounded(), 4);
    let mut seen: Vec<String> = Vec::new();
    for (chrom, ..) in parse_lines(&gff) {
        if seen.last() != Some(&chrom) {
            assert!(!seen.contains(&chrom), "{chrom} split in output");
            seen.push(chrom);
        }
    }
    let want: Vec<String> = recs.iter().map(|r| r.id.clone()).collect();
    assert_eq!(seen, want);
}

#[test]
fn allow_same_only_adds_fragments() {
    let recs = genome(4);
    let range = LengthRange::new(0, 10_000).unwrap();
    let (strict, _) = run_gff(&recs, &plan("MseI,CviAII", false), range, 2);
    let (loose, _) = run_gff(&recs, &plan("MseI,CviAII", true), range, 2);
    let strict: Vec<_> = parse_lines(&strict).into_iter().map(|(c, s, e, _)| (c, s, e)).collect();
    let loose: Vec<_> = parse_lines(&loose).into_iter().map(|(c, s, e, _)| (c, s, e)).collect();
    assert!(loose.len() > strict.len());
    assert!(strict.iter().all(|f| loose.contains(f)));
}

#[test]
fn collector_is_arrival_order_invariant() {
    let msgs: Vec<ResultMessage> = (0..6u64)
        .map(|i| ResultMessage {
            order_index: i,
            chromosome_id: format!("c{}", i % 3),
            fragments: (0..i as usize).map(|k| Fragment { start: k * 10, end: k * 10 + i as usize }).collect(),
        })
        .collect();

    let run = |order: &[usize]| {
        let mut c = OrderedCollector::new(Vec::new()).unwrap();
        for &i in order {
            c.accept(msgs[i].clone()).unwrap();
        }
        c.finish_with_sink().unwrap()
    };
    let (want_stats, want_out) = run(&[0, 1, 2, 3, 4, 5]);
    for order in [[5, 4, 3, 2, 1, 0], [1, 0, 3, 2, 5, 4], [2, 5, 0, 4, 1, 3]] {
        let (stats, out) = run(&order);
        assert_eq!(out, want_out);
        assert_eq!(stats, want_stats);
    }
}

#[test]
fn reads_fasta_through_the_pipeline() -> Result<()> {
    let data = b">chrA test\nAAAAGAATTC\nTTAAAGAATTC\n>chrB\nNNNNGAATTCNNNN\n";
    let reader = FastaReader::new(&data[..]);
    let mut out = Vec::new();
    let stats = pipeline::run(reader, &plan("EcoRI,MseI", false), RunOptions::new(LengthRange::unbounded(), 2), &mut out)?;
    let text = String::from_utf8(out)?;
    assert_eq!(stats.total_fragments, 2);
    assert!(text.contains("chrA\tradigest\tfragment\t6\t11\t.\t+\t.\tID=chrA_1;Length=6"));
    assert_eq!(stats.per_chromosome["chrB"].fragments, 0);
    Ok(())
}

/// Accepts `budget` bytes, then fails every write.
struct FullDisk {
    budget: usize,
}

impl Write for FullDisk {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() > self.budget {
            return Err(io::Error::other("no space left on device"));
        }
        self.budget -= buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn sink_failure_aborts_the_whole_run() {
    let plan = plan("EcoRI,MseI", false);
    let seq = b"GAATTCAATTAAGG".repeat(20);
    let total: usize = plan.digest(&seq, LengthRange::unbounded()).len() * 200;
    let input = (0..200).map(|i| Ok::<_, anyhow::Error>(FastaRecord { id: format!("chr{i}"), desc: None, seq: seq.clone() }));

    let err = pipeline::run(input, &plan, RunOptions::new(LengthRange::unbounded(), 4), FullDisk { budget: 200 })
        .unwrap_err();
    match err.downcast_ref::<DigestError>() {
        Some(DigestError::SinkWriteFailure { unwritten_fragments, source }) => {
            assert!(*unwritten_fragments > 0);
            assert!(*unwritten_fragments < total);
            assert_eq!(source.to_string(), "no space left on device");
        }
        _ => panic!("expected a sink failure, got {err:#}"),
    }
}
