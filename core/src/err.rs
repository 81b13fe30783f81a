// Types

pub type Result<VALUE = ()> = std::result::Result<VALUE, Error>;

// Error

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed encoded hash: {0}")]
    FormatParse(
        #[from]
        #[source]
        FormatError,
    ),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("primitive error: {0}")]
    Primitive(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("random source error: {0}")]
    RandomSource(
        #[from]
        #[source]
        rand::Error,
    ),
}

impl From<argon2::Error> for Error {
    fn from(err: argon2::Error) -> Self {
        Self::Primitive(Box::new(err))
    }
}

impl From<bcrypt::BcryptError> for Error {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::Primitive(Box::new(err))
    }
}

impl From<hkdf::InvalidLength> for Error {
    fn from(err: hkdf::InvalidLength) -> Self {
        Self::Primitive(Box::new(err))
    }
}

impl From<hmac::digest::InvalidLength> for Error {
    fn from(err: hmac::digest::InvalidLength) -> Self {
        Self::Primitive(Box::new(err))
    }
}

impl From<scrypt::errors::InvalidOutputLen> for Error {
    fn from(err: scrypt::errors::InvalidOutputLen) -> Self {
        Self::Primitive(Box::new(err))
    }
}

// FormatError

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("unexpected algorithm identifier `{0}`")]
    Algorithm(String),
    #[error("base64 error: {0}")]
    Base64(
        #[from]
        #[source]
        base64::DecodeError,
    ),
    #[error("segment {0} is empty")]
    EmptySegment(usize),
    #[error("hex error: {0}")]
    Hex(
        #[from]
        #[source]
        hex::FromHexError,
    ),
    #[error("encoded value out of range: {0}")]
    OutOfRange(String),
    #[error("parameters `{0}` don't match `m=<int>,t=<int>,p=<int>`")]
    Params(String),
    #[error("encoded hash must start with `$`")]
    Prefix,
    #[error("expected 6 `$`-delimited segments, found {0}")]
    SegmentCount(usize),
    #[error("version `{0}` isn't supported")]
    Version(String),
}
