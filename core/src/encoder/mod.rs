use tracing::{debug, instrument};

use crate::{
    err::{Error, Result},
    Algorithm, HashFunction,
};

use self::{
    argon2::{Argon2idConfig, Argon2idEncoder},
    bcrypt::{BcryptConfig, BcryptEncoder},
    hkdf::{HkdfConfig, HkdfEncoder},
    hmac::{HmacConfig, HmacEncoder},
    pbkdf2::{Pbkdf2Config, Pbkdf2Encoder},
    scrypt::{ScryptConfig, ScryptEncoder},
};

// Mods

pub mod argon2;
pub mod bcrypt;
pub mod hkdf;
pub mod hmac;
pub mod pbkdf2;
pub mod scrypt;

// Consts

pub const DEFAULT_KEY_LEN: usize = 32;
pub const DEFAULT_SALT_LEN: usize = 16;

// Traits

/// Hashes secrets and verifies candidates against previously encoded hashes.
///
/// Instances lazily materialize their salt, so every operation borrows the
/// encoder mutably. Salt-bearing hex algorithms (pbkdf2, scrypt, hkdf) only
/// verify hashes produced with the same salt and configuration.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait PasswordEncoder: Send {
    fn encode(&mut self, secret: &str) -> Result<String>;

    /// `Ok(false)` on mismatch; errors are reserved for malformed input and
    /// primitive failures.
    fn verify(&mut self, hash: &str, secret: &str) -> Result<bool>;

    /// Empty when the algorithm doesn't expose its salt.
    fn salt(&mut self) -> Result<Vec<u8>>;
}

pub trait EncoderConfig: Default {
    const ALGORITHM: Algorithm;

    fn apply(&mut self, opt: EncoderOption) -> Result;
}

// EncoderOption

/// Named configuration mutation, applied in order before an encoder is built.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EncoderOption {
    Cost(u32),
    HashFunc(HashFunction),
    /// hkdf output length, same as `KeyLen`.
    HashLen(usize),
    Info(String),
    Iterations(u32),
    Key(String),
    KeyLen(usize),
    Memory(u32),
    N(u64),
    P(u32),
    R(u32),
    Salt(Vec<u8>),
    SaltLen(usize),
    Threads(u32),
    Time(u32),
}

impl EncoderOption {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cost(_) => "cost",
            Self::HashFunc(_) => "hashFunc",
            Self::HashLen(_) => "hashLen",
            Self::Info(_) => "info",
            Self::Iterations(_) => "iterations",
            Self::Key(_) => "key",
            Self::KeyLen(_) => "keyLen",
            Self::Memory(_) => "memory",
            Self::N(_) => "N",
            Self::P(_) => "P",
            Self::R(_) => "R",
            Self::Salt(_) => "salt",
            Self::SaltLen(_) => "saltLen",
            Self::Threads(_) => "threads",
            Self::Time(_) => "time",
        }
    }

    pub(crate) fn unsupported(self, alg: Algorithm) -> Error {
        Error::InvalidConfig(format!("option `{}` isn't supported by {alg}", self.name()))
    }
}

// Functions

/// Builds the encoder registered under `tag`, `None` if the tag is unknown.
#[instrument(skip(opts))]
pub fn create<OPTIONS: IntoIterator<Item = EncoderOption>>(
    tag: &str,
    opts: OPTIONS,
) -> Result<Option<Box<dyn PasswordEncoder>>> {
    match tag.parse::<Algorithm>() {
        Ok(alg) => new_encoder(alg, opts).map(Some),
        Err(_) => {
            debug!("unknown algorithm tag");
            Ok(None)
        }
    }
}

pub fn new_encoder<OPTIONS: IntoIterator<Item = EncoderOption>>(
    alg: Algorithm,
    opts: OPTIONS,
) -> Result<Box<dyn PasswordEncoder>> {
    debug!(%alg, "building encoder");
    let encoder: Box<dyn PasswordEncoder> = match alg {
        Algorithm::Argon2id => Box::new(Argon2idEncoder::new(configure::<Argon2idConfig, _>(
            opts,
        )?)?),
        Algorithm::Bcrypt => Box::new(BcryptEncoder::new(configure::<BcryptConfig, _>(opts)?)?),
        Algorithm::Hkdf => Box::new(HkdfEncoder::new(configure::<HkdfConfig, _>(opts)?)?),
        Algorithm::Hmac => Box::new(HmacEncoder::new(configure::<HmacConfig, _>(opts)?)),
        Algorithm::Pbkdf2 => Box::new(Pbkdf2Encoder::new(configure::<Pbkdf2Config, _>(opts)?)?),
        Algorithm::Scrypt => Box::new(ScryptEncoder::new(configure::<ScryptConfig, _>(opts)?)?),
    };
    Ok(encoder)
}

pub fn configure<CONFIG: EncoderConfig, OPTIONS: IntoIterator<Item = EncoderOption>>(
    opts: OPTIONS,
) -> Result<CONFIG> {
    let mut cfg = CONFIG::default();
    for opt in opts {
        debug!(alg = %CONFIG::ALGORITHM, opt = opt.name(), "applying option");
        cfg.apply(opt)?;
    }
    Ok(cfg)
}

pub(crate) fn require_positive(name: &str, value: usize) -> Result {
    if value == 0 {
        Err(Error::InvalidConfig(format!("{name} must be positive")))
    } else {
        Ok(())
    }
}

// Tests
