//! 并行酶切流水线
//!
//! 读入线程按输入顺序编号，工作线程池并行酶切，收集线程按编号恢复顺序写出。
//! 线程间只通过有界通道通信。

use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use tracing::{debug, info};

use crate::collect::{OrderedCollector, ResultMessage, RunStats};
use crate::digest::{CutBuffer, DigestPlan, LengthRange};
use crate::io::fasta::FastaRecord;

/// 一条待酶切的序列；order_index 是下游唯一的排序键
#[derive(Debug, Clone)]
pub struct SequenceRecord {
    pub order_index: u64,
    pub id: String,
    pub sequence: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub range: LengthRange,
    pub threads: usize,
}

impl RunOptions {
    pub fn new(range: LengthRange, threads: usize) -> Self {
        Self { range, threads: threads.max(1) }
    }
}

/// 对 `records` 中每条序列酶切，按输入顺序写入 `sink`（GFF3），返回统计。
///
/// 输入错误原样向上传递；已写出的部分结果会被 flush。
pub fn run<I, W>(records: I, plan: &DigestPlan, opt: RunOptions, sink: W) -> Result<RunStats>
where
    I: Iterator<Item = Result<FastaRecord>> + Send,
    W: Write + Send,
{
    let threads = opt.threads.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("radigest-worker-{}", i))
        .build()
        .context("cannot start worker pool")?;
    let collector = OrderedCollector::new(sink)?;

    let (job_tx, job_rx) = bounded::<SequenceRecord>(threads);
    let (res_tx, res_rx) = bounded::<ResultMessage>(threads);
    let range = opt.range;

    thread::scope(|s| {
        let collector = s.spawn(move || collector.run(res_rx));
        let producer = s.spawn(move || produce(records, job_tx));

        let workers = panic::catch_unwind(AssertUnwindSafe(|| {
            pool.scope(move |ps| {
                for _ in 0..threads {
                    let jobs = job_rx.clone();
                    let results = res_tx.clone();
                    ps.spawn(move |_| work(plan, range, jobs, results));
                }
                // workers hold the only remaining ends
                drop(job_rx);
                drop(res_tx);
            });
        }));

        let collected = collector.join().map_err(|_| anyhow!("collector thread panicked"))?;
        let produced = producer.join().map_err(|_| anyhow!("input reader thread panicked"))?;
        let stats = collected?;
        let n_records = produced?;
        if workers.is_err() {
            bail!("a digest worker panicked; output is incomplete");
        }
        info!(
            records = n_records,
            fragments = stats.total_fragments,
            bases = stats.total_bases,
            "digest finished"
        );
        Ok(stats)
    })
}

/// 依次编号并入队；工作线程全部退出时提前结束
fn produce<I>(records: I, jobs: Sender<SequenceRecord>) -> Result<u64>
where
    I: Iterator<Item = Result<FastaRecord>>,
{
    let mut order_index = 0u64;
    for rec in records {
        let rec = rec?;
        let job = SequenceRecord {
            order_index,
            id: rec.id,
            sequence: rec.seq,
        };
        if jobs.send(job).is_err() {
            debug!(order_index, "workers stopped; ending input early");
            break;
        }
        order_index += 1;
    }
    Ok(order_index)
}

fn work(plan: &DigestPlan, range: LengthRange, jobs: Receiver<SequenceRecord>, results: Sender<ResultMessage>) {
    let mut buf = CutBuffer::new();
    for rec in jobs.iter() {
        let fragments = plan.digest_with_buf(&rec.sequence, range, &mut buf);
        debug!(
            chromosome = %rec.id,
            length = rec.sequence.len(),
            fragments = fragments.len(),
            "digested"
        );
        let msg = ResultMessage {
            order_index: rec.order_index,
            chromosome_id: rec.id,
            fragments,
        };
        if results.send(msg).is_err() {
            // collector aborted
            break;
        }
    }
}
