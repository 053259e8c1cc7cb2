use thiserror::Error;

/// Core error type for column-chunk operations
#[derive(Error, Debug)]
pub enum ParquetError {
    /// IO errors from the underlying byte source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed page headers, level streams or encoded runs
    #[error("Format error: {0}")]
    Format(String),

    /// Recognized but unimplemented page types or encodings
    #[error("Unsupported format: {0}")]
    Unsupported(String),

    /// A declared value count exceeded the available bytes
    #[error("Short read: decoded {decoded} of {expected} values")]
    ShortRead { decoded: usize, expected: usize },

    /// Clean termination signal, not a failure
    #[error("End of stream")]
    EndOfStream,
}

/// Result type alias for column-chunk operations
pub type Result<T> = std::result::Result<T, ParquetError>;

impl ParquetError {
    /// Create a new format error
    pub fn format<S: Into<String>>(msg: S) -> Self {
        ParquetError::Format(msg.into())
    }

    /// Create a new unsupported-format error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        ParquetError::Unsupported(msg.into())
    }

    /// Whether this is the clean end-of-stream signal
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, ParquetError::EndOfStream)
    }
}

/// Extension trait to add context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, ctx: S) -> Result<T>;

    /// Add context with a closure that's only called on error
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<ParquetError>,
{
    fn context<S: Into<String>>(self, ctx: S) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            ParquetError::Format(format!("{}: {}", ctx.into(), base_error))
        })
    }

    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            ParquetError::Format(format!("{}: {}", f().into(), base_error))
        })
    }
}
