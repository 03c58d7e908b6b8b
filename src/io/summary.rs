use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::collect::RunStats;

/// JSON companion to the GFF output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub enzymes: Vec<String>,
    pub min_length: usize,
    pub max_length: usize,
    #[serde(flatten)]
    pub stats: RunStats,
    pub version: String,
    pub generated_at: String,
}

impl RunSummary {
    pub fn new(enzymes: Vec<String>, min_length: usize, max_length: usize, stats: RunStats) -> Self {
        Self {
            enzymes,
            min_length,
            max_length,
            stats,
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn write_to<W: Write>(&self, w: W) -> Result<()> {
        serde_json::to_writer_pretty(w, self)?;
        Ok(())
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let fh = std::fs::File::create(path)
            .with_context(|| format!("cannot write summary JSON '{}'", path))?;
        let mut w = std::io::BufWriter::new(fh);
        self.write_to(&mut w)?;
        writeln!(w)?;
        w.flush()?;
        Ok(())
    }
}
