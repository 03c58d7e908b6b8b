use anyhow::{Context, Result};
use std::io::{self, Write};

use crate::digest::Fragment;

pub const GFF_HEADER: &str = "##gff-version 3";
pub const SOURCE: &str = "radigest";

/// Line-oriented GFF3 writer for digest fragments.
///
/// Coordinates are converted from 0-based half-open to GFF's 1-based closed.
pub struct GffWriter<W: Write> {
    inner: W,
}

impl<W: Write> GffWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.inner, "{}", GFF_HEADER)
    }

    /// `ordinal` is the 1-based number of the fragment within its chromosome.
    pub fn write_fragment(&mut self, chrom: &str, ordinal: u64, frag: &Fragment) -> io::Result<()> {
        writeln!(
            self.inner,
            "{}\t{}\tfragment\t{}\t{}\t.\t+\t.\tID={}_{};Length={}",
            chrom,
            SOURCE,
            frag.start + 1,
            frag.end,
            chrom,
            ordinal,
            frag.len(),
        )
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Opens the fragment sink: a file path, or `-` for stdout. Always buffered.
pub fn create_sink(path: &str) -> Result<Box<dyn Write + Send>> {
    if path == "-" {
        return Ok(Box::new(io::BufWriter::new(io::stdout())));
    }
    let fh = std::fs::File::create(path)
        .with_context(|| format!("cannot create GFF output '{}'", path))?;
    Ok(Box::new(io::BufWriter::new(fh)))
}
