use thiserror::Error;

/// Errors raised while configuring a digest or writing its results.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("enzyme {enzyme}: invalid IUPAC symbol {symbol:?} at position {position} of recognition site")]
    InvalidPatternSymbol {
        enzyme: String,
        symbol: char,
        position: usize,
    },

    #[error("enzyme {enzyme}: empty recognition site")]
    EmptyPattern { enzyme: String },

    #[error("enzyme {enzyme}: no cut marker and no declared cut index (mid-site fallback disabled by --strict-cuts)")]
    StrictValidationFailed { enzyme: String },

    #[error("enzyme {enzyme}: cut index {cut_index} lies outside the {width} bp recognition site")]
    InvalidCutIndex {
        enzyme: String,
        cut_index: usize,
        width: usize,
    },

    #[error("first two enzymes must differ (got {name},{name})")]
    DuplicateEnzymePair { name: String },

    #[error("unknown enzyme {name:?} (see `radigest enzymes`)")]
    UnknownEnzyme { name: String },

    #[error("invalid length range: min ({min}) > max ({max})")]
    InvalidLengthRange { min: usize, max: usize },

    #[error("failed to write fragment output ({unwritten_fragments} buffered fragments lost)")]
    SinkWriteFailure {
        unwritten_fragments: usize,
        #[source]
        source: std::io::Error,
    },
}
