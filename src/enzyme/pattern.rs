use super::iupac;
use super::Enzyme;
use crate::error::DigestError;

/// Marks the cut position inside a recognition string, e.g. `G^AATTC`.
pub const CUT_MARKER: u8 = b'^';

/// Where a matcher's cut offset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutSource {
    /// Position of the `^` marker in the recognition string.
    Marker,
    /// The enzyme's declared non-zero cut index.
    Declared,
    /// Mid-site fallback (`len / 2`) for enzymes with neither.
    Midpoint,
}

/// Strips a single cut marker, returning the bare site and the marker index.
///
/// Only the first marker is removed; a second one is left in place and
/// rejected later as an invalid symbol.
pub fn strip_cut_marker(recognition: &str) -> (Vec<u8>, Option<usize>) {
    let bytes = recognition.as_bytes();
    match bytes.iter().position(|&b| b == CUT_MARKER) {
        Some(i) => {
            let mut site = Vec::with_capacity(bytes.len() - 1);
            site.extend_from_slice(&bytes[..i]);
            site.extend_from_slice(&bytes[i + 1..]);
            (site, Some(i))
        }
        None => (bytes.to_vec(), None),
    }
}

/// A recognition site compiled to per-position base sets plus a cut offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledMatcher {
    mask: Vec<u8>,
    offset: usize,
}

impl CompiledMatcher {
    /// Compiles an enzyme's recognition string.
    ///
    /// Offset resolution: cut marker if present, else the declared
    /// `cut_index` if non-zero, else `len / 2`.
    pub fn compile(enzyme: &Enzyme) -> Result<(Self, CutSource), DigestError> {
        let (site, marker) = strip_cut_marker(&enzyme.recognition);
        if site.is_empty() {
            return Err(DigestError::EmptyPattern { enzyme: enzyme.name.clone() });
        }
        let mask = iupac::encode_site(&site).map_err(|e| DigestError::InvalidPatternSymbol {
            enzyme: enzyme.name.clone(),
            symbol: e.symbol as char,
            // report against the string as written, marker included
            position: match marker {
                Some(m) if e.position >= m => e.position + 1,
                _ => e.position,
            },
        })?;

        let (offset, source) = match marker {
            Some(i) => (i, CutSource::Marker),
            None if enzyme.cut_index > site.len() => {
                return Err(DigestError::InvalidCutIndex {
                    enzyme: enzyme.name.clone(),
                    cut_index: enzyme.cut_index,
                    width: site.len(),
                });
            }
            None if enzyme.cut_index != 0 => (enzyme.cut_index, CutSource::Declared),
            None => (site.len() / 2, CutSource::Midpoint),
        };
        Ok((Self { mask, offset }, source))
    }

    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn width(&self) -> usize {
        self.mask.len()
    }

    #[inline]
    pub fn matches(&self, window: &[u8]) -> bool {
        iupac::matches(&self.mask, window)
    }

    /// Appends the cut position of every site in `seq` to `out`, ascending.
    pub fn scan_into(&self, seq: &[u8], out: &mut Vec<usize>) {
        let n = self.mask.len();
        if n == 0 || seq.len() < n {
            return;
        }
        for (pos, window) in seq.windows(n).enumerate() {
            if iupac::matches(&self.mask, window) {
                out.push(pos + self.offset);
            }
        }
    }
}
