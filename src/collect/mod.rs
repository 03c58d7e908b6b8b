//! Ordered collection of per-record digest results.
//!
//! Workers finish in any order; the collector is the single owner of the
//! output sink and the run statistics, and restores input order by index.

use std::collections::BTreeMap;
use std::io::Write;

use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::digest::Fragment;
use crate::error::DigestError;
use crate::io::gff::GffWriter;

/// Fragments of one input record, tagged with its input-order index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMessage {
    pub order_index: u64,
    pub chromosome_id: String,
    pub fragments: Vec<Fragment>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChromosomeStats {
    pub fragments: u64,
    pub bases: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_fragments: u64,
    pub total_bases: u64,
    pub per_chromosome: BTreeMap<String, ChromosomeStats>,
}

impl RunStats {
    /// 1-based ordinal the next fragment of `chrom` will get.
    fn next_ordinal(&self, chrom: &str) -> u64 {
        self.per_chromosome.get(chrom).map_or(1, |cs| cs.fragments + 1)
    }

    fn record(&mut self, chrom: &str, frag: &Fragment) {
        let len = frag.len() as u64;
        self.total_fragments += 1;
        self.total_bases += len;
        self.touch(chrom);
        if let Some(cs) = self.per_chromosome.get_mut(chrom) {
            cs.fragments += 1;
            cs.bases += len;
        }
    }

    /// Registers a chromosome with no kept fragments.
    fn touch(&mut self, chrom: &str) {
        if !self.per_chromosome.contains_key(chrom) {
            self.per_chromosome.insert(chrom.to_string(), ChromosomeStats::default());
        }
    }
}

pub struct OrderedCollector<W: Write> {
    out: GffWriter<W>,
    next_index: u64,
    pending: BTreeMap<u64, ResultMessage>,
    stats: RunStats,
    /// Fragments handed to the sink since its last successful flush.
    unflushed: usize,
}

impl<W: Write> OrderedCollector<W> {
    /// Takes ownership of the sink and writes the GFF header.
    pub fn new(sink: W) -> Result<Self, DigestError> {
        let mut out = GffWriter::new(sink);
        out.write_header()
            .map_err(|source| DigestError::SinkWriteFailure { unwritten_fragments: 0, source })?;
        Ok(Self {
            out,
            next_index: 0,
            pending: BTreeMap::new(),
            stats: RunStats::default(),
            unflushed: 0,
        })
    }

    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Number of results waiting for a predecessor.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Buffers `msg` and writes every result that is now in order.
    pub fn accept(&mut self, msg: ResultMessage) -> Result<(), DigestError> {
        if msg.order_index < self.next_index || self.pending.contains_key(&msg.order_index) {
            // a producer never reuses an index; keep the first result
            warn!(index = msg.order_index, chromosome = %msg.chromosome_id, "duplicate result index ignored");
            return Ok(());
        }
        self.pending.insert(msg.order_index, msg);
        self.drain()?;
        if !self.pending.is_empty() {
            debug!(next = self.next_index, buffered = self.pending.len(), "waiting for earlier record");
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<(), DigestError> {
        while let Some(msg) = self.pending.remove(&self.next_index) {
            self.write_message(&msg)?;
            self.next_index += 1;
        }
        Ok(())
    }

    fn write_message(&mut self, msg: &ResultMessage) -> Result<(), DigestError> {
        self.stats.touch(&msg.chromosome_id);
        for (k, frag) in msg.fragments.iter().enumerate() {
            let ordinal = self.stats.next_ordinal(&msg.chromosome_id);
            if let Err(source) = self.out.write_fragment(&msg.chromosome_id, ordinal, frag) {
                let unwritten = self.unflushed + msg.fragments.len() - k + self.pending_fragments();
                return Err(self.fail(unwritten, source));
            }
            self.stats.record(&msg.chromosome_id, frag);
            self.unflushed += 1;
        }
        if self.unflushed > 0 {
            self.flush_sink()?;
        }
        Ok(())
    }

    /// A fragment only counts as delivered once the sink flushes.
    fn flush_sink(&mut self) -> Result<(), DigestError> {
        if let Err(source) = self.out.flush() {
            let unwritten = self.unflushed + self.pending_fragments();
            return Err(self.fail(unwritten, source));
        }
        self.unflushed = 0;
        Ok(())
    }

    fn pending_fragments(&self) -> usize {
        self.pending.values().map(|m| m.fragments.len()).sum()
    }

    fn fail(&mut self, unwritten_fragments: usize, source: std::io::Error) -> DigestError {
        // keep whatever already reached the sink
        let _ = self.out.flush();
        error!(
            unwritten_fragments,
            written_fragments = self.stats.total_fragments,
            "fragment sink write failed: {}",
            source
        );
        DigestError::SinkWriteFailure { unwritten_fragments, source }
    }

    /// Final drain and flush; hands the statistics to the caller.
    pub fn finish(self) -> Result<RunStats, DigestError> {
        self.finish_with_sink().map(|(stats, _)| stats)
    }

    /// Like [`finish`](Self::finish), also returning the sink.
    pub fn finish_with_sink(mut self) -> Result<(RunStats, W), DigestError> {
        self.drain()?;
        if let Some(&first) = self.pending.keys().next() {
            warn!(
                missing_from = self.next_index,
                next_available = first,
                buffered = self.pending.len(),
                "input indices missing at end of stream; writing remaining results in index order"
            );
        }
        while let Some(&idx) = self.pending.keys().next() {
            self.next_index = idx;
            self.drain()?;
        }
        self.flush_sink()?;
        Ok((self.stats, self.out.into_inner()))
    }

    /// Consumes results until every sender is dropped, then finishes.
    pub fn run(mut self, rx: Receiver<ResultMessage>) -> Result<RunStats, DigestError> {
        for msg in rx.iter() {
            if let Err(err) = self.accept(msg) {
                return Err(add_queued(err, &rx));
            }
        }
        self.finish()
    }
}

/// Results still queued when the collector aborts are lost too.
fn add_queued(err: DigestError, rx: &Receiver<ResultMessage>) -> DigestError {
    match err {
        DigestError::SinkWriteFailure { unwritten_fragments, source } => {
            let queued: usize = rx.try_iter().map(|m| m.fragments.len()).sum();
            if queued > 0 {
                error!(queued_fragments = queued, "dropping queued results after sink failure");
            }
            DigestError::SinkWriteFailure { unwritten_fragments: unwritten_fragments + queued, source }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, BufWriter};

    fn msg(idx: u64, chr: &str, frags: &[(usize, usize)]) -> ResultMessage {
        ResultMessage {
            order_index: idx,
            chromosome_id: chr.to_string(),
            fragments: frags.iter().map(|&(start, end)| Fragment { start, end }).collect(),
        }
    }

    fn collect_all(msgs: Vec<ResultMessage>) -> (String, RunStats) {
        let mut c = OrderedCollector::new(Vec::new()).unwrap();
        for m in msgs {
            c.accept(m).unwrap();
        }
        let (stats, out) = c.finish_with_sink().unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    #[test]
    fn stats_for_two_chromosomes() {
        let (_, stats) = collect_all(vec![
            msg(0, "chr1", &[(0, 5)]),
            msg(1, "chr2", &[(10, 15), (20, 26)]),
        ]);
        assert_eq!(stats.total_fragments, 3);
        assert_eq!(stats.total_bases, 16);
        assert_eq!(stats.per_chromosome["chr2"].fragments, 2);
        assert_eq!(stats.per_chromosome["chr2"].bases, 11);
    }

    #[test]
    fn out_of_order_written_in_order() {
        let (text, _) = collect_all(vec![msg(1, "chr2", &[(10, 12)]), msg(0, "chr1", &[(0, 5)])]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "##gff-version 3");
        assert!(lines[1].starts_with("chr1\t"));
        assert!(lines[2].starts_with("chr2\t"));
    }

    #[test]
    fn arrival_order_does_not_change_output() {
        let base = vec![
            msg(0, "a", &[(0, 4), (4, 9)]),
            msg(1, "b", &[]),
            msg(2, "c", &[(1, 2)]),
            msg(3, "d", &[(0, 100)]),
        ];
        let (want_text, want_stats) = collect_all(base.clone());
        for perm in [[3, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1], [0, 2, 1, 3]] {
            let msgs = perm.iter().map(|&i| base[i].clone()).collect();
            let (text, stats) = collect_all(msgs);
            assert_eq!(text, want_text, "perm={perm:?}");
            assert_eq!(stats, want_stats);
        }
    }

    #[test]
    fn empty_result_still_advances() {
        let mut c = OrderedCollector::new(Vec::new()).unwrap();
        c.accept(msg(1, "chrX", &[(1, 4)])).unwrap();
        assert_eq!(c.pending_len(), 1);
        c.accept(msg(0, "empty", &[])).unwrap();
        assert_eq!(c.pending_len(), 0);
        assert_eq!(c.next_index(), 2);
        let stats = c.finish().unwrap();
        assert_eq!(stats.total_fragments, 1);
        assert_eq!(stats.per_chromosome["chrX"].fragments, 1);
        assert_eq!(stats.per_chromosome["empty"], ChromosomeStats::default());
    }

    #[test]
    fn ordinals_continue_per_chromosome() {
        let (text, _) = collect_all(vec![msg(0, "c", &[(0, 1)]), msg(1, "c", &[(1, 2)])]);
        assert!(text.contains("ID=c_1;"));
        assert!(text.contains("ID=c_2;"));
    }

    #[test]
    fn gap_at_end_is_flushed_in_index_order() {
        let (text, stats) = collect_all(vec![msg(3, "d", &[(0, 1)]), msg(2, "c", &[(0, 2)])]);
        let lines: Vec<&str> = text.lines().skip(1).collect();
        assert!(lines[0].starts_with("c\t"));
        assert!(lines[1].starts_with("d\t"));
        assert_eq!(stats.total_bases, 3);
    }

    #[test]
    fn duplicate_index_is_ignored() {
        let (text, stats) = collect_all(vec![msg(0, "a", &[(0, 1)]), msg(0, "a", &[(0, 1)])]);
        assert_eq!(text.lines().count(), 2);
        assert_eq!(stats.total_fragments, 1);
    }

    #[test]
    fn run_over_channel() {
        let (tx, rx) = crossbeam_channel::bounded(2);
        let handle = std::thread::spawn(move || {
            let c = OrderedCollector::new(Vec::new()).unwrap();
            c.run(rx)
        });
        tx.send(msg(1, "b", &[(0, 3)])).unwrap();
        tx.send(msg(0, "a", &[(0, 2)])).unwrap();
        drop(tx);
        let stats = handle.join().unwrap().unwrap();
        assert_eq!(stats.total_fragments, 2);
        assert_eq!(stats.total_bases, 5);
    }

    /// Accepts `budget` bytes, then fails every write.
    struct FailingSink {
        budget: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if buf.len() > self.budget {
                return Err(io::Error::other("disk full"));
            }
            self.budget -= buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn sink_failure_reports_lost_fragments() {
        let sink = FailingSink { budget: 16 };
        let mut c = OrderedCollector::new(sink).unwrap();
        c.accept(msg(1, "b", &[(0, 1), (1, 2)])).unwrap();
        let err = c.accept(msg(0, "a", &[(0, 1)])).unwrap_err();
        match err {
            DigestError::SinkWriteFailure { unwritten_fragments, .. } => assert_eq!(unwritten_fragments, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn buffered_fragments_count_as_lost_when_flush_fails() {
        let sink = BufWriter::new(FailingSink { budget: 16 });
        let mut c = OrderedCollector::new(sink).unwrap();
        c.accept(msg(1, "b", &[(0, 4)])).unwrap();
        let err = c.accept(msg(0, "a", &[(0, 1), (1, 2)])).unwrap_err();
        match err {
            // both lines of "a" sat in the buffer, "b" was still pending
            DigestError::SinkWriteFailure { unwritten_fragments, .. } => assert_eq!(unwritten_fragments, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn flush_failure_at_finish_is_reported() {
        let sink = BufWriter::new(FailingSink { budget: 16 });
        let mut c = OrderedCollector::new(sink).unwrap();
        c.accept(msg(1, "b", &[(0, 1), (1, 2)])).unwrap();
        // index 0 never arrives; "b" is written and flushed by finish
        let err = c.finish().unwrap_err();
        assert!(matches!(err, DigestError::SinkWriteFailure { unwritten_fragments: 2, .. }), "{err}");
    }

    #[test]
    fn header_failure_is_sink_failure() {
        let sink = FailingSink { budget: 0 };
        assert!(matches!(
            OrderedCollector::new(sink),
            Err(DigestError::SinkWriteFailure { unwritten_fragments: 0, .. })
        ));
    }
}
