use thiserror::Error;

/// Structural dataset-load failures.
///
/// These are fatal: the dashboard cannot start (or swap datasets) without a
/// well-formed input file. Degenerate but valid states (empty filter results,
/// empty files with a correct header) are not errors.
#[derive(Error, Debug)]
pub enum DataError {
    /// File extension is not one of the supported formats
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    /// A required column is absent from the input
    #[error("input is missing required column '{0}'")]
    MissingColumn(&'static str),

    /// Timestamp cell could not be parsed
    #[error("row {row}: cannot parse '{value}' as a date")]
    BadTimestamp { row: usize, value: String },

    /// Coordinate cell could not be parsed
    #[error("row {row}: cannot parse '{value}' as coordinate '{column}'")]
    BadCoordinate {
        row: usize,
        column: &'static str,
        value: String,
    },
}
