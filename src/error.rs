use thiserror::Error;

/// Errors raised by the pipeline that callers may want to tell apart.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid date {value:?} on row {row}")]
    InvalidDate { value: String, row: usize },

    #[error("GET {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("--input requires --source")]
    InputWithoutSource,
}
