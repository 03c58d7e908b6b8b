use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use std::io::{BufRead, BufReader, Read};

const BUF_SIZE: usize = 4 << 20;
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone)]
pub struct FastaRecord {
    pub id: String,
    pub desc: Option<String>,
    /// Upper-case, line breaks and blanks removed.
    pub seq: Vec<u8>,
}

pub struct FastaReader<R: BufRead> {
    reader: R,
    buf: String,
    done: bool,
    peek_header: Option<String>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            done: false,
            peek_header: None,
        }
    }

    pub fn next_record(&mut self) -> Result<Option<FastaRecord>> {
        if self.done {
            return Ok(None);
        }

        // Find header line
        let header = if let Some(h) = self.peek_header.take() {
            h
        } else {
            loop {
                self.buf.clear();
                let n = self.reader.read_line(&mut self.buf)?;
                if n == 0 {
                    self.done = true;
                    return Ok(None);
                }
                if let Some(h) = self.buf.strip_prefix('>') {
                    break h.trim().to_string();
                }
            }
        };

        let mut parts = header.splitn(2, char::is_whitespace);
        let id = parts.next().unwrap_or("").to_string();
        let desc = parts
            .next()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let mut seq: Vec<u8> = Vec::new();
        loop {
            self.buf.clear();
            let n = self.reader.read_line(&mut self.buf)?;
            if n == 0 {
                self.done = true;
                break;
            }
            if let Some(h) = self.buf.strip_prefix('>') {
                self.peek_header = Some(h.trim().to_string());
                break;
            }
            seq.extend(
                self.buf
                    .bytes()
                    .filter(|b| !matches!(b, b'\n' | b'\r' | b' ' | b'\t'))
                    .map(|b| b.to_ascii_uppercase()),
            );
        }

        Ok(Some(FastaRecord { id, desc, seq }))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Wraps `reader`, decoding gzip when the stream starts with the gzip magic.
pub fn maybe_gunzip<R: Read + Send + 'static>(reader: R) -> Result<Box<dyn BufRead + Send>> {
    let mut br = BufReader::with_capacity(BUF_SIZE, reader);
    let gz = br.fill_buf().context("cannot read FASTA input")?.starts_with(&GZIP_MAGIC);
    if gz {
        Ok(Box::new(BufReader::with_capacity(BUF_SIZE, MultiGzDecoder::new(br))))
    } else {
        Ok(Box::new(br))
    }
}

/// Opens a FASTA file (plain or gzip) or stdin when `path` is `-`.
pub fn open_fasta(path: &str) -> Result<FastaReader<Box<dyn BufRead + Send>>> {
    let inner = if path == "-" {
        maybe_gunzip(std::io::stdin())?
    } else {
        let fh = std::fs::File::open(path)
            .with_context(|| format!("cannot open reference FASTA '{}'", path))?;
        maybe_gunzip(fh)?
    };
    Ok(FastaReader::new(inner))
}
