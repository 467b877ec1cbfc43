use thiserror::Error;

/// Failures raised by the editing core: model access, compositing and codecs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A tile/chunk/palette reference or pixel coordinate outside its collection.
    #[error("{what} {index} out of range (0..{len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
    /// Assembly operand that doesn't parse in the base its prefix declares.
    #[error("malformed base-{base} literal '{token}'")]
    MalformedLiteral { token: String, base: u32 },
    /// Project file with missing keys or the wrong shape.
    #[error("project schema mismatch: {0}")]
    SchemaMismatch(String),
    /// Binary input whose length doesn't divide into whole units.
    #[error("{what} data is {len} bytes, not a multiple of {unit}")]
    SizeMismatch {
        what: &'static str,
        unit: usize,
        len: usize,
    },
    #[error("image uses {0} colors, at most 16 are supported")]
    TooManyColors(usize),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Bounds check shared by every positional dereference.
pub(crate) fn check_index(what: &'static str, index: usize, len: usize) -> Result<usize> {
    if index < len {
        Ok(index)
    } else {
        Err(Error::IndexOutOfRange { what, index, len })
    }
}
