use core::fmt;

use uefi::Status;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No graphics output device; the only absence that aborts startup.
    NoGraphicsDevice,
    Firmware(Status),
    DisplayClosed,
    /// The back buffer was requested while a flush had not been acknowledged.
    FlushPending,
    /// A second exit dialog was requested while one is still open.
    AlreadyStarted,
    NotInitialized,
    UnknownWidget,
    UnknownGroup,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoGraphicsDevice => write!(f, "no graphics output device"),
            Error::Firmware(status) => write!(f, "firmware error: {:?}", status),
            Error::DisplayClosed => write!(f, "display port is closed"),
            Error::FlushPending => write!(f, "flush still in flight"),
            Error::AlreadyStarted => write!(f, "already started"),
            Error::NotInitialized => write!(f, "session not initialized"),
            Error::UnknownWidget => write!(f, "unknown widget"),
            Error::UnknownGroup => write!(f, "unknown focus group"),
        }
    }
}

impl From<uefi::Error> for Error {
    fn from(value: uefi::Error) -> Self {
        Self::Firmware(value.status())
    }
}

impl From<Status> for Error {
    fn from(value: Status) -> Self {
        Self::Firmware(value)
    }
}
