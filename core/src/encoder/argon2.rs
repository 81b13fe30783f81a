//! Argon2id encoder producing self-describing hashes:
//! `$argon2id$v=<version>$m=<memory>,t=<time>,p=<threads>$<salt>$<digest>`.
//!
//! Salt and digest are base64 (standard alphabet, no padding). Verification only
//! needs the encoded string: parameters, version and salt are parsed back out of
//! it, and the digest length drives the recomputed output length.

use std::{fmt, str::FromStr, sync::LazyLock};

use argon2::{Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use regex::Regex;
use subtle::ConstantTimeEq;
use tracing::{debug, instrument};

use crate::{
    err::{Error, FormatError, Result},
    salt::{LazySalt, OsSaltGenerator, SaltGenerator},
    Algorithm,
};

use super::{EncoderConfig, EncoderOption, PasswordEncoder, DEFAULT_KEY_LEN, DEFAULT_SALT_LEN};

// Consts

pub const DEFAULT_MEMORY: u32 = 64 * 1024;
pub const DEFAULT_THREADS: u32 = 4;
pub const DEFAULT_TIME: u32 = 1;
pub const IDENTIFIER: &str = "argon2id";

static PARAMS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^m=(\d+),t=(\d+),p=(\d+)$").expect("argon2 parameters regex is valid")
});

static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v=(\d+)$").expect("argon2 version regex is valid"));

// Argon2idConfig

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Argon2idConfig {
    pub key_len: usize,
    /// KiB.
    pub memory: u32,
    pub salt: Option<Vec<u8>>,
    pub salt_len: usize,
    pub threads: u32,
    pub time: u32,
}

impl Default for Argon2idConfig {
    fn default() -> Self {
        Self {
            key_len: DEFAULT_KEY_LEN,
            memory: DEFAULT_MEMORY,
            salt: None,
            salt_len: DEFAULT_SALT_LEN,
            threads: DEFAULT_THREADS,
            time: DEFAULT_TIME,
        }
    }
}

impl EncoderConfig for Argon2idConfig {
    const ALGORITHM: Algorithm = Algorithm::Argon2id;

    fn apply(&mut self, opt: EncoderOption) -> Result {
        match opt {
            EncoderOption::KeyLen(len) => self.key_len = len,
            EncoderOption::Memory(memory) => self.memory = memory,
            EncoderOption::Salt(salt) => self.salt = Some(salt),
            EncoderOption::SaltLen(len) => self.salt_len = len,
            EncoderOption::Threads(threads) => self.threads = threads,
            EncoderOption::Time(time) => self.time = time,
            opt => return Err(opt.unsupported(Self::ALGORITHM)),
        }
        Ok(())
    }
}

// Argon2idHash

/// Parsed form of an encoded argon2id hash.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Argon2idHash {
    pub digest: Vec<u8>,
    pub memory: u32,
    pub salt: Vec<u8>,
    pub threads: u32,
    pub time: u32,
    pub version: Version,
}

impl fmt::Display for Argon2idHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${IDENTIFIER}$v={}$m={},t={},p={}${}${}",
            self.version as u32,
            self.memory,
            self.time,
            self.threads,
            STANDARD_NO_PAD.encode(&self.salt),
            STANDARD_NO_PAD.encode(&self.digest),
        )
    }
}

impl FromStr for Argon2idHash {
    type Err = FormatError;

    fn from_str(hash: &str) -> std::result::Result<Self, Self::Err> {
        let segments: Vec<&str> = hash.split('$').collect();
        let &[prefix, id, version, params, salt, digest] = segments.as_slice() else {
            return Err(FormatError::SegmentCount(segments.len()));
        };
        if !prefix.is_empty() {
            return Err(FormatError::Prefix);
        }
        if let Some(idx) = segments[1..].iter().position(|segment| segment.is_empty()) {
            return Err(FormatError::EmptySegment(idx + 1));
        }
        if id != IDENTIFIER {
            return Err(FormatError::Algorithm(id.into()));
        }
        let version = VERSION_REGEX
            .captures(version)
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .and_then(|version| Version::try_from(version).ok())
            .ok_or_else(|| FormatError::Version(version.into()))?;
        let caps = PARAMS_REGEX
            .captures(params)
            .ok_or_else(|| FormatError::Params(params.into()))?;
        let param = |idx: usize| {
            caps[idx]
                .parse::<u32>()
                .map_err(|_| FormatError::Params(params.into()))
        };
        Ok(Self {
            memory: param(1)?,
            time: param(2)?,
            threads: param(3)?,
            salt: STANDARD_NO_PAD.decode(salt)?,
            digest: STANDARD_NO_PAD.decode(digest)?,
            version,
        })
    }
}

// Argon2idEncoder

pub struct Argon2idEncoder<SALTGENERATOR: SaltGenerator = OsSaltGenerator> {
    params: Params,
    salt: LazySalt<SALTGENERATOR>,
}

impl Argon2idEncoder {
    pub fn new(cfg: Argon2idConfig) -> Result<Self> {
        Self::with_salt_generator(cfg, OsSaltGenerator)
    }
}

impl<SALTGENERATOR: SaltGenerator> Argon2idEncoder<SALTGENERATOR> {
    pub fn with_salt_generator(cfg: Argon2idConfig, generator: SALTGENERATOR) -> Result<Self> {
        let salt_len = cfg.salt.as_ref().map_or(cfg.salt_len, Vec::len);
        if salt_len < argon2::MIN_SALT_LEN {
            return Err(Error::InvalidConfig(format!(
                "argon2id salt length {salt_len} is below {}",
                argon2::MIN_SALT_LEN
            )));
        }
        let params = Params::new(cfg.memory, cfg.time, cfg.threads, Some(cfg.key_len))
            .map_err(|err| Error::InvalidConfig(format!("argon2id: {err}")))?;
        Ok(Self {
            params,
            salt: LazySalt::new(generator, cfg.salt_len, cfg.salt),
        })
    }
}

impl<SALTGENERATOR: SaltGenerator> PasswordEncoder for Argon2idEncoder<SALTGENERATOR> {
    #[instrument("encode_argon2id", skip(self, secret))]
    fn encode(&mut self, secret: &str) -> Result<String> {
        let salt = self.salt.get()?.to_vec();
        let version = Version::default();
        let digest = derive(secret, &salt, &self.params, version)?;
        let hash = Argon2idHash {
            digest,
            memory: self.params.m_cost(),
            salt,
            threads: self.params.p_cost(),
            time: self.params.t_cost(),
            version,
        };
        Ok(hash.to_string())
    }

    #[instrument("verify_argon2id", skip(self, hash, secret))]
    fn verify(&mut self, hash: &str, secret: &str) -> Result<bool> {
        debug!("parsing encoded hash");
        let hash: Argon2idHash = hash.parse()?;
        debug!(
            hash.memory,
            hash.time,
            hash.threads,
            "recomputing digest with parsed parameters"
        );
        if hash.salt.len() < argon2::MIN_SALT_LEN {
            return Err(FormatError::OutOfRange(format!(
                "salt length {} is below {}",
                hash.salt.len(),
                argon2::MIN_SALT_LEN
            ))
            .into());
        }
        let params = Params::new(hash.memory, hash.time, hash.threads, Some(hash.digest.len()))
            .map_err(|err| FormatError::OutOfRange(err.to_string()))?;
        let digest = derive(secret, &hash.salt, &params, hash.version)?;
        Ok(digest.ct_eq(&hash.digest).into())
    }

    fn salt(&mut self) -> Result<Vec<u8>> {
        self.salt.get().map(<[u8]>::to_vec)
    }
}

// Functions

fn derive(secret: &str, salt: &[u8], params: &Params, version: Version) -> Result<Vec<u8>> {
    debug!("deriving argon2id digest");
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, version, params.clone());
    let mut digest = vec![0; params.output_len().unwrap_or(Params::DEFAULT_OUTPUT_LEN)];
    argon2.hash_password_into(secret.as_bytes(), salt, &mut digest)?;
    Ok(digest)
}

// Tests
