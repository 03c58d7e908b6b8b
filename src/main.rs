use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use radigest::digest::{DigestOptions, DigestPlan, LengthRange};
use radigest::enzyme::{self, EnzymeCatalog};
use radigest::io::fasta::{self, FastaRecord};
use radigest::io::gff;
use radigest::io::summary::RunSummary;
use radigest::pipeline::{self, RunOptions};
use radigest::sim;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(
    name = "radigest",
    author,
    version,
    about = "In-silico single/double restriction digest and GFF3 fragment export",
    arg_required_else_help = true
)]
struct Cli {
    /// Verbose progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Digest every sequence of a reference FASTA
    Digest {
        /// Reference FASTA file, plain or gzip ('-' for stdin)
        #[arg(short = 'f', long)]
        fasta: String,
        #[command(flatten)]
        digest: DigestArgs,
    },
    /// Digest a synthetic single-chromosome genome (named chr1)
    Simulate {
        /// Genome length (bp)
        #[arg(short = 'l', long)]
        length: usize,
        /// Target GC fraction in [0,1]
        #[arg(long, default_value_t = 0.5)]
        gc: f64,
        /// PRNG seed (0 = random)
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[command(flatten)]
        digest: DigestArgs,
    },
    /// List available enzymes and their recognition sites
    Enzymes,
}

#[derive(Args, Debug)]
struct DigestArgs {
    /// Comma-separated enzyme names (first two form the AB pair)
    #[arg(short, long)]
    enzymes: String,
    /// Minimum fragment length (bp, inclusive)
    #[arg(long, default_value_t = 1)]
    min: usize,
    /// Maximum fragment length (bp, inclusive)
    #[arg(long, default_value_t = 1 << 30)]
    max: usize,
    /// Output GFF3 path ('-' for stdout)
    #[arg(long, default_value = "fragments.gff3")]
    gff: String,
    /// Write a JSON run summary here
    #[arg(long)]
    json: Option<String>,
    /// Worker threads (default: available cores)
    #[arg(short = 't', long)]
    threads: Option<usize>,
    /// Double digest: also keep AA/BB neighbours (default AB/BA only)
    #[arg(long)]
    allow_same: bool,
    /// Fail if an enzyme has no cut marker and no cut index (no mid-site fallback)
    #[arg(long)]
    strict_cuts: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "radigest=debug" } else { "radigest=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Digest { fasta, digest } => {
            // validate before touching input or output
            let setup = Setup::new(&digest)?;
            let reader = fasta::open_fasta(&fasta)?;
            run_digest(reader, setup, &digest)
        }
        Commands::Simulate { length, gc, seed, digest } => {
            if length == 0 {
                bail!("--length must be > 0");
            }
            let setup = Setup::new(&digest)?;
            let seq = sim::make(length, gc, seed);
            let rec = FastaRecord { id: "chr1".to_string(), desc: None, seq };
            run_digest(std::iter::once(Ok(rec)), setup, &digest)
        }
        Commands::Enzymes => {
            for e in EnzymeCatalog::builtin().iter() {
                println!("{}\t{}", e.name, e.recognition);
            }
            Ok(())
        }
    }
}

/// Validated configuration; built before any work starts.
struct Setup {
    plan: DigestPlan,
    enzyme_names: Vec<String>,
    range: LengthRange,
    threads: usize,
}

impl Setup {
    fn new(args: &DigestArgs) -> Result<Self> {
        let range = LengthRange::new(args.min, args.max)?;
        let catalog = EnzymeCatalog::builtin();
        let mut enzymes = catalog.resolve_list(&args.enzymes)?;
        if enzymes.is_empty() {
            bail!("--enzymes must name at least one enzyme");
        }
        enzyme::validate_pair(&enzymes)?;
        if enzymes.len() > 2 {
            let ignored: Vec<&str> = enzymes[2..].iter().map(|e| e.name.as_str()).collect();
            warn!(?ignored, "only the first two enzymes are used");
            enzymes.truncate(2);
        }
        let plan = DigestPlan::new(
            &enzymes,
            DigestOptions {
                allow_same_adjacency: args.allow_same,
                strict_cut_validation: args.strict_cuts,
            },
        )?;
        let threads = match args.threads {
            Some(0) => bail!("--threads must be >= 1"),
            Some(n) => n,
            None => std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
        };
        Ok(Self {
            plan,
            enzyme_names: enzymes.into_iter().map(|e| e.name).collect(),
            range,
            threads,
        })
    }
}

fn run_digest<I>(records: I, setup: Setup, args: &DigestArgs) -> Result<()>
where
    I: Iterator<Item = Result<FastaRecord>> + Send,
{
    let sink = gff::create_sink(&args.gff)?;
    let opt = RunOptions::new(setup.range, setup.threads);
    let stats = pipeline::run(records, &setup.plan, opt, sink)?;

    eprintln!(
        "Fragments kept: {}\nBases covered: {}\nChromosomes: {}",
        stats.total_fragments,
        stats.total_bases,
        stats.per_chromosome.len()
    );

    if let Some(path) = &args.json {
        RunSummary::new(setup.enzyme_names, args.min, args.max, stats).save_to_file(path)?;
    }
    Ok(())
}
