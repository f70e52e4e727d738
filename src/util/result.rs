//! Standard error and result types for the library.
use base58::FromBase58Error;
use base64::DecodeError as Base64Error;
use hex::FromHexError;
use secp256k1::Error as Secp256k1Error;
use std::io;
use std::num::ParseIntError;

/// Standard error type used in the library
#[derive(Debug)]
pub enum Error {
    /// An argument provided is invalid
    BadArgument(String),
    /// The data given is not valid
    BadData(String),
    /// Base58 string could not be decoded
    FromBase58Error(FromBase58Error),
    /// Base64 string could not be decoded
    FromBase64Error(Base64Error),
    /// Hex string could not be decoded
    FromHexError(FromHexError),
    /// The remote service answered with a non-success status
    HttpStatus(u16, String),
    /// Transport-level failure talking to a remote service
    HttpError(reqwest::Error),
    /// Standard library IO error
    IOError(io::Error),
    /// JSON could not be encoded or decoded
    JsonError(serde_json::Error),
    /// Error parsing an integer
    ParseIntError(ParseIntError),
    /// A configured pattern is not a valid regular expression
    RegexError(regex::Error),
    /// Error in the Secp256k1 library
    Secp256k1Error(Secp256k1Error),
    /// The operation timed out
    Timeout,
    /// The data or functionality is not supported by this library
    Unsupported(String),
}

impl Error {
    /// Whether the failure came from a collaborator and the call may be retried by the caller.
    ///
    /// Nothing in this crate retries on its own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout => true,
            Error::HttpError(e) => e.is_connect() || e.is_request() || e.is_body(),
            Error::HttpStatus(status, _) => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadArgument(s) => write!(f, "Bad argument: {}", s),
            Error::BadData(s) => write!(f, "Bad data: {}", s),
            Error::FromBase58Error(e) => write!(f, "Base58 decoding error: {:?}", e),
            Error::FromBase64Error(e) => write!(f, "Base64 decoding error: {}", e),
            Error::FromHexError(e) => write!(f, "Hex decoding error: {}", e),
            Error::HttpStatus(status, body) => write!(f, "HTTP status {}: {}", status, body),
            Error::HttpError(e) => write!(f, "HTTP error: {}", e),
            Error::IOError(e) => write!(f, "IO error: {}", e),
            Error::JsonError(e) => write!(f, "JSON error: {}", e),
            Error::ParseIntError(e) => write!(f, "ParseIntError: {}", e),
            Error::RegexError(e) => write!(f, "Regex error: {}", e),
            Error::Secp256k1Error(e) => write!(f, "Secp256k1 error: {}", e),
            Error::Timeout => write!(f, "Timeout"),
            Error::Unsupported(s) => write!(f, "Unsupported: {}", s),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FromBase64Error(e) => Some(e),
            Error::FromHexError(e) => Some(e),
            Error::HttpError(e) => Some(e),
            Error::IOError(e) => Some(e),
            Error::JsonError(e) => Some(e),
            Error::ParseIntError(e) => Some(e),
            Error::RegexError(e) => Some(e),
            Error::Secp256k1Error(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FromBase58Error> for Error {
    fn from(e: FromBase58Error) -> Self {
        Error::FromBase58Error(e)
    }
}

impl From<Base64Error> for Error {
    fn from(e: Base64Error) -> Self {
        Error::FromBase64Error(e)
    }
}

impl From<FromHexError> for Error {
    fn from(e: FromHexError) -> Self {
        Error::FromHexError(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout
        } else {
            Error::HttpError(e)
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IOError(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::JsonError(e)
    }
}

impl From<ParseIntError> for Error {
    fn from(e: ParseIntError) -> Self {
        Error::ParseIntError(e)
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Error::RegexError(e)
    }
}

impl From<Secp256k1Error> for Error {
    fn from(e: Secp256k1Error) -> Self {
        Error::Secp256k1Error(e)
    }
}

/// Standard Result used in the library
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn retryable_taxonomy() {
        assert!(Error::Timeout.is_retryable());
        assert!(Error::HttpStatus(503, "busy".to_string()).is_retryable());
        assert!(Error::HttpStatus(429, "slow down".to_string()).is_retryable());
        assert!(!Error::HttpStatus(400, "bad".to_string()).is_retryable());
        assert!(!Error::BadData("parents".to_string()).is_retryable());
    }

    #[test]
    fn display() {
        assert_eq!(Error::BadArgument("x".to_string()).to_string(), "Bad argument: x");
        assert_eq!(Error::HttpStatus(404, "missing".to_string()).to_string(), "HTTP status 404: missing");
    }
}
