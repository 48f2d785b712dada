use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds {
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors fall into three groups. Format-validation errors ([`Error::InvalidMagic`],
/// [`Error::Malformed`], [`Error::OutOfBounds`], [`Error::Empty`]) abort the open or load call
/// that produced them. Contract errors ([`Error::ContractViolation`], [`Error::LayoutOverflow`])
/// abort a save because continuing would desynchronise section offsets. Everything else
/// reports a caller mistake or an I/O failure.
///
/// Missing or unreadable section sources, unknown extra headers and implausible feature counts
/// are *not* errors; they are handled by fallback and recorded in
/// [`crate::diagnostics::Diagnostics`].
///
/// # Examples
///
/// ```rust,no_run
/// use smfkit::{Error, MapDocument};
///
/// match MapDocument::open("maps/duel.smf") {
///     Ok(document) => println!("{document}"),
///     Err(Error::InvalidMagic) => eprintln!("not a valid container"),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed file: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The file is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    #[error("Out of Bound read would have occurred! - {file}:{line}")]
    OutOfBounds {
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The input does not start with the map container magic string.
    #[error("Not a valid map container")]
    InvalidMagic,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// Map dimensions must be at least one unit in each direction.
    #[error("Invalid map dimensions {width}x{length}")]
    InvalidDimensions {
        /// Requested width in map units
        width: u32,
        /// Requested length in map units
        length: u32,
    },

    /// A computed section offset does not fit into the 32-bit header field.
    #[error("Section layout exceeds the addressable size of the container")]
    LayoutOverflow,

    /// A feature references a type name that does not exist.
    #[error("Feature type index {index} is out of range ({types} types defined)")]
    InvalidFeatureType {
        /// The offending type index
        index: u32,
        /// Number of type names available
        types: usize,
    },

    /// A tile atlas reference could not be added.
    #[error("Invalid tile file reference - {0}")]
    InvalidTileReference(String),

    /// An external service or section encoder broke its size contract.
    ///
    /// Writing such a section would shift every section that follows it, so the save is
    /// aborted.
    #[error("Contract violation - {0}")]
    ContractViolation(String),

    /// Extraction needs a container on disk, but the document was created in memory.
    #[error("Document has no origin container to read sections from")]
    NoOrigin,

    /// A raster cannot be expressed in the sample format the codec supports.
    #[error("Unrepresentable raster - {0}")]
    Unrepresentable(String),

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Error reported by the raster codec backend.
    #[error("{0}")]
    ImageError(#[from] image::ImageError),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
