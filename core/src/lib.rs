use std::{fmt, str::FromStr};

use enum_display::EnumDisplay;

pub use self::{
    encoder::{create, new_encoder, EncoderConfig, EncoderOption, PasswordEncoder},
    err::{Error, FormatError, Result},
};

#[cfg(any(test, feature = "mock"))]
pub use self::encoder::MockPasswordEncoder;

// Macros

/// Expands `$body` with `$digest` aliased to the hash type selected by `$func`.
macro_rules! with_hash_function {
    ($func:expr, $digest:ident => $body:expr) => {
        match $func {
            $crate::HashFunction::Sha1 => {
                type $digest = ::sha1::Sha1;
                $body
            }
            $crate::HashFunction::Sha224 => {
                type $digest = ::sha2::Sha224;
                $body
            }
            $crate::HashFunction::Sha256 => {
                type $digest = ::sha2::Sha256;
                $body
            }
            $crate::HashFunction::Sha384 => {
                type $digest = ::sha2::Sha384;
                $body
            }
            $crate::HashFunction::Sha512 => {
                type $digest = ::sha2::Sha512;
                $body
            }
        }
    };
}

// Mods

pub mod encoder;
pub mod err;
pub mod salt;
pub mod tracer;

// Algorithm

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Algorithm {
    Argon2id,
    Bcrypt,
    Hkdf,
    Hmac,
    Pbkdf2,
    Scrypt,
}

impl Algorithm {
    pub const ALL: [Self; 6] = [
        Self::Argon2id,
        Self::Bcrypt,
        Self::Hkdf,
        Self::Hmac,
        Self::Pbkdf2,
        Self::Scrypt,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Self::Argon2id => "argon2id",
            Self::Bcrypt => "bcrypt",
            Self::Hkdf => "hkdf",
            Self::Hmac => "hmac",
            Self::Pbkdf2 => "pbkdf2",
            Self::Scrypt => "scrypt",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Algorithm {
    type Err = UnknownTagError;

    fn from_str(tag: &str) -> std::result::Result<Self, Self::Err> {
        match tag {
            "argon2" | "argon2id" => Ok(Self::Argon2id),
            "bcrypt" => Ok(Self::Bcrypt),
            "hkdf" => Ok(Self::Hkdf),
            "hmac" => Ok(Self::Hmac),
            "pbkdf2" => Ok(Self::Pbkdf2),
            "scrypt" => Ok(Self::Scrypt),
            _ => Err(UnknownTagError(tag.into())),
        }
    }
}

// HashFunction

#[derive(Clone, Copy, Debug, Default, EnumDisplay, Eq, Hash, PartialEq)]
pub enum HashFunction {
    Sha1,
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl FromStr for HashFunction {
    type Err = UnknownTagError;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        match name.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha224" => Ok(Self::Sha224),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => Err(UnknownTagError(name.into())),
        }
    }
}

// UnknownTagError

#[derive(Debug, thiserror::Error)]
#[error("unknown tag `{0}`")]
pub struct UnknownTagError(pub String);

// Tests
