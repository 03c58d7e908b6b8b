//! IUPAC nucleotide codes as 4-bit base sets.
//!
//! Bit layout: A=0001, C=0010, G=0100, T=1000. Ambiguity codes are unions.

pub const A: u8 = 1 << 0;
pub const C: u8 = 1 << 1;
pub const G: u8 = 1 << 2;
pub const T: u8 = 1 << 3;
pub const ANY: u8 = A | C | G | T;

/// Base set for a pattern symbol, or `None` outside the IUPAC alphabet.
#[inline]
pub const fn pattern_code(b: u8) -> Option<u8> {
    let code = match b.to_ascii_uppercase() {
        b'A' => A,
        b'C' => C,
        b'G' => G,
        b'T' => T,
        b'R' => A | G,
        b'Y' => C | T,
        b'S' => C | G,
        b'W' => A | T,
        b'K' => G | T,
        b'M' => A | C,
        b'B' => C | G | T,
        b'D' => A | G | T,
        b'H' => A | C | T,
        b'V' => A | C | G,
        b'N' => ANY,
        _ => return None,
    };
    Some(code)
}

const fn reference_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = match (i as u8).to_ascii_uppercase() {
            b'U' => T,
            b => match pattern_code(b) {
                // a gap in the reference must never satisfy a site position
                Some(ANY) | None => 0,
                Some(code) => code,
            },
        };
        i += 1;
    }
    table
}

static REFERENCE_CODES: [u8; 256] = reference_table();

/// Base set for a reference (sequence) byte. `N` and anything unknown map to 0.
#[inline]
pub fn reference_code(b: u8) -> u8 {
    REFERENCE_CODES[b as usize]
}

/// A symbol outside the IUPAC alphabet, at `position` of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSymbol {
    pub symbol: u8,
    pub position: usize,
}

/// Encodes a site (without cut marker) into per-position base sets.
pub fn encode_site(site: &[u8]) -> Result<Vec<u8>, InvalidSymbol> {
    site.iter()
        .enumerate()
        .map(|(position, &symbol)| pattern_code(symbol).ok_or(InvalidSymbol { symbol, position }))
        .collect()
}

/// True iff every window base intersects the corresponding mask position.
///
/// Callers slice the window to `mask.len()`; a length mismatch never matches.
#[inline]
pub fn matches(mask: &[u8], window: &[u8]) -> bool {
    let n = mask.len();
    if n == 0 || window.len() != n {
        return false;
    }
    // fast reject on last position
    if reference_code(window[n - 1]) & mask[n - 1] == 0 {
        return false;
    }
    mask[..n - 1]
        .iter()
        .zip(&window[..n - 1])
        .all(|(&m, &b)| reference_code(b) & m != 0)
}
