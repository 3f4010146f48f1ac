use thiserror::Error;

/// Load failures are terminal for the attempt and never clear a previously
/// rendered character. Missing fields inside a parsed document are not
/// errors; section extractors degrade to empty values instead.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("failed to parse XML: {0}")]
    Parse(String),

    #[error("no character record found in document")]
    MissingRecord,

    #[error("error reading file: {0}")]
    Read(#[source] std::io::Error),
}
