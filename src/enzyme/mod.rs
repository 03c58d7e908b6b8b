//! Restriction enzymes and their recognition patterns.

pub mod iupac;
pub mod pattern;

use std::collections::BTreeMap;

use crate::error::DigestError;

pub use pattern::{CompiledMatcher, CutSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enzyme {
    pub name: String,
    /// IUPAC site, optionally with one `^` cut marker.
    pub recognition: String,
    /// 0-based cut offset from site start; used only when no marker is present.
    pub cut_index: usize,
}

impl Enzyme {
    pub fn new(name: impl Into<String>, recognition: impl Into<String>, cut_index: usize) -> Self {
        Self {
            name: name.into(),
            recognition: recognition.into(),
            cut_index,
        }
    }
}

// (name, recognition site with cut marker)
const BUILTIN: &[(&str, &str)] = &[
    ("AluI", "AG^CT"),
    ("ApeKI", "G^CWGC"),
    ("ApoI", "R^AATTY"),
    ("AseI", "AT^TAAT"),
    ("AvaII", "G^GWCC"),
    ("BamHI", "G^GATCC"),
    ("BglII", "A^GATCT"),
    ("BstYI", "R^GATCY"),
    ("ClaI", "AT^CGAT"),
    ("Csp6I", "G^TAC"),
    ("CviAII", "C^ATG"),
    ("DdeI", "C^TNAG"),
    ("DpnII", "^GATC"),
    ("EcoRI", "G^AATTC"),
    ("EcoRV", "GAT^ATC"),
    ("EcoT22I", "ATGCA^T"),
    ("FatI", "^CATG"),
    ("HaeIII", "GG^CC"),
    ("HhaI", "GCG^C"),
    ("HindIII", "A^AGCTT"),
    ("HinfI", "G^ANTC"),
    ("HpaII", "C^CGG"),
    ("KpnI", "GGTAC^C"),
    ("MboI", "^GATC"),
    ("MfeI", "C^AATTG"),
    ("MluCI", "^AATT"),
    ("MseI", "T^TAA"),
    ("MspI", "C^CGG"),
    ("NcoI", "C^CATGG"),
    ("NdeI", "CA^TATG"),
    ("NheI", "G^CTAGC"),
    ("NlaIII", "CATG^"),
    ("NotI", "GC^GGCCGC"),
    ("NsiI", "ATGCA^T"),
    ("PstI", "CTGCA^G"),
    ("RsaI", "GT^AC"),
    ("SacI", "GAGCT^C"),
    ("SalI", "G^TCGAC"),
    ("Sau3AI", "^GATC"),
    ("SbfI", "CCTGCA^GG"),
    ("ScaI", "AGT^ACT"),
    ("SmaI", "CCC^GGG"),
    ("SpeI", "A^CTAGT"),
    ("SphI", "GCATG^C"),
    ("TaqI", "T^CGA"),
    ("XbaI", "T^CTAGA"),
    ("XhoI", "C^TCGAG"),
];

/// Immutable name → enzyme lookup, built once at startup and passed explicitly.
#[derive(Debug, Clone)]
pub struct EnzymeCatalog {
    enzymes: BTreeMap<String, Enzyme>,
}

impl EnzymeCatalog {
    pub fn builtin() -> Self {
        Self::from_enzymes(BUILTIN.iter().map(|&(name, site)| Enzyme::new(name, site, 0)))
    }

    pub fn from_enzymes(enzymes: impl IntoIterator<Item = Enzyme>) -> Self {
        Self {
            enzymes: enzymes.into_iter().map(|e| (e.name.clone(), e)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Enzyme> {
        self.enzymes.get(name)
    }

    /// Resolves a name, failing with `UnknownEnzyme`.
    pub fn lookup(&self, name: &str) -> Result<&Enzyme, DigestError> {
        self.get(name).ok_or_else(|| DigestError::UnknownEnzyme { name: name.to_string() })
    }

    /// Resolves a comma-separated list such as `EcoRI, MseI`.
    pub fn resolve_list(&self, list: &str) -> Result<Vec<Enzyme>, DigestError> {
        list.split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| self.lookup(n).cloned())
            .collect()
    }

    /// Enzymes sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Enzyme> {
        self.enzymes.values()
    }
}

/// The two enzymes of a double digest must not be the same enzyme.
pub fn validate_pair(enzymes: &[Enzyme]) -> Result<(), DigestError> {
    if let [a, b, ..] = enzymes {
        if a.name == b.name {
            return Err(DigestError::DuplicateEnzymePair { name: a.name.clone() });
        }
    }
    Ok(())
}
