use crate::prelude::*;

/// Represents an error while decoding or encoding an SMF file.
///
/// This type wraps the [`ErrorKind`](enum.ErrorKind.html) that was originally raised, along with
/// a chain of short context messages describing what was being done when it happened, and the
/// index of the track that failed, if any.
///
/// For more information about the error policy used by `smfio`, see
/// [`ErrorKind`](enum.ErrorKind.html).
#[derive(Clone)]
pub struct Error {
    inner: Box<Chained>,
}

#[derive(Clone, Debug)]
struct Chained {
    kind: ErrorKind,
    /// Context messages, innermost first.
    context: Vec<&'static str>,
    track: Option<usize>,
}

impl Error {
    /// Create a new error with the given `ErrorKind`.
    #[inline]
    pub fn new(kind: ErrorKind) -> Error {
        Error {
            inner: Box::new(Chained {
                kind,
                context: Vec::new(),
                track: None,
            }),
        }
    }

    /// The kind of failure that was originally raised.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.inner.kind
    }

    /// The context messages attached while the error propagated, innermost first.
    #[inline]
    pub fn context(&self) -> &[&'static str] {
        &self.inner.context
    }

    /// The index of the track that was being decoded or encoded, if any.
    #[inline]
    pub fn track(&self) -> Option<usize> {
        self.inner.track
    }

    pub(crate) fn chain_ctx(mut self, ctx: &'static str) -> Error {
        self.inner.context.push(ctx);
        self
    }

    pub(crate) fn at_track(mut self, index: usize) -> Error {
        self.inner.track.get_or_insert(index);
        self
    }
}
impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Error {
        Error::new(kind)
    }
}
impl From<io::Error> for Error {
    #[inline]
    fn from(err: io::Error) -> Error {
        Error::new(ErrorKind::Io(err.kind()))
    }
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(track) = self.track() {
            write!(f, "track {}: ", track)?;
        }
        for ctx in self.context().iter().rev() {
            write!(f, "{}: ", ctx)?;
        }
        fmt::Display::fmt(&self.kind(), f)
    }
}
impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.kind())?;
        if let Some(track) = self.track() {
            write!(f, " in track {}", track)?;
        }
        for ctx in self.context() {
            writeln!(f)?;
            write!(f, "  while: {}", ctx)?;
        }
        Ok(())
    }
}
impl std::error::Error for Error {
    #[inline]
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.inner.kind)
    }
}

/// The type of error that occurred.
///
/// None of these are recoverable: a corrupted file does not become valid by retrying, so the
/// parser stops at the first problem and no partial `Pattern` is ever returned.
#[derive(Copy, Clone, PartialEq, Eq, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The file does not start with a valid `MThd` header chunk.
    #[error("bad file header")]
    BadFileHeader,
    /// A track chunk does not start with the `MTrk` magic.
    #[error("bad track header")]
    BadTrackHeader,
    /// The input ended in the middle of a value.
    #[error("truncated stream")]
    TruncatedStream,
    /// A meta event with a metacommand byte that is not registered.
    #[error("unknown meta event 0x{0:02X}")]
    UnknownMetaEvent(u8),
    /// A channel data byte appeared where a status byte was expected, and no running status was
    /// active.
    #[error("data byte with no running status active")]
    MissingRunningStatus,
    /// A byte with its top bit set in status position that no registered event type claims.
    #[error("unknown status byte 0x{0:02X}")]
    UnknownStatus(u8),
    /// Two catalogue entries claim the same identity key.
    /// The payload is the name of the second entry.
    #[error("duplicate registration of event type {0:?}")]
    DuplicateRegistration(&'static str),
    /// A variable-length integer does not fit in 28 bits.
    #[error("varlen integer exceeds 28 bits")]
    VarlenOverflow,
    /// An event payload breaks the rules of its event type.
    #[error("invalid payload: {0}")]
    InvalidPayload(&'static str),
    /// The writer was handed an event it cannot represent in a file.
    #[error("unencodable event: {0}")]
    UnencodableEvent(&'static str),
    /// A pattern exceeds one of the hard size limits of the file format.
    #[error("pattern too large: {0}")]
    Oversized(&'static str),
    /// The underlying byte source or sink failed.
    #[error("i/o error: {0}")]
    Io(io::ErrorKind),
}

pub(crate) trait ResultExt<T> {
    fn context(self, ctx: &'static str) -> Result<T>;
}
impl<T> ResultExt<T> for StdResult<T, Error> {
    #[inline]
    fn context(self, ctx: &'static str) -> Result<T> {
        self.map_err(|err| err.chain_ctx(ctx))
    }
}
impl<T> ResultExt<T> for StdResult<T, ErrorKind> {
    #[inline]
    fn context(self, ctx: &'static str) -> Result<T> {
        self.map_err(|kind| Error::from(kind).chain_ctx(ctx))
    }
}
impl<T> ResultExt<T> for StdResult<T, io::Error> {
    #[inline]
    fn context(self, ctx: &'static str) -> Result<T> {
        self.map_err(|err| Error::from(err).chain_ctx(ctx))
    }
}

/// The result type used by the MIDI codec.
pub type Result<T> = StdResult<T, Error>;
pub(crate) use core::result::Result as StdResult;
