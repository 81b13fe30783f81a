use subtle::ConstantTimeEq;
use tracing::{debug, instrument};

use crate::{
    err::{Error, Result},
    salt::{AlphabetSaltGenerator, LazySalt, SaltGenerator},
    Algorithm, HashFunction,
};

use super::{
    require_positive, EncoderConfig, EncoderOption, PasswordEncoder, DEFAULT_KEY_LEN,
    DEFAULT_SALT_LEN,
};

// Consts

pub const DEFAULT_ITERATIONS: u32 = 10_000;

// Pbkdf2Config

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pbkdf2Config {
    pub hash_func: HashFunction,
    pub iterations: u32,
    pub key_len: usize,
    pub salt: Option<Vec<u8>>,
    pub salt_len: usize,
}

impl Default for Pbkdf2Config {
    fn default() -> Self {
        Self {
            hash_func: HashFunction::default(),
            iterations: DEFAULT_ITERATIONS,
            key_len: DEFAULT_KEY_LEN,
            salt: None,
            salt_len: DEFAULT_SALT_LEN,
        }
    }
}

impl EncoderConfig for Pbkdf2Config {
    const ALGORITHM: Algorithm = Algorithm::Pbkdf2;

    fn apply(&mut self, opt: EncoderOption) -> Result {
        match opt {
            EncoderOption::HashFunc(func) => self.hash_func = func,
            EncoderOption::Iterations(iterations) => self.iterations = iterations,
            EncoderOption::KeyLen(len) => self.key_len = len,
            EncoderOption::Salt(salt) => self.salt = Some(salt),
            EncoderOption::SaltLen(len) => self.salt_len = len,
            opt => return Err(opt.unsupported(Self::ALGORITHM)),
        }
        Ok(())
    }
}

// Pbkdf2Encoder

/// HMAC-based PBKDF2 with hex output.
///
/// The hex digest carries no parameters: verification re-derives with this
/// instance's salt and configuration. Generated salts are drawn from
/// [`crate::salt::PBKDF2_SALT_ALPHABET`].
pub struct Pbkdf2Encoder<SALTGENERATOR: SaltGenerator = AlphabetSaltGenerator> {
    hash_func: HashFunction,
    iterations: u32,
    key_len: usize,
    salt: LazySalt<SALTGENERATOR>,
}

impl Pbkdf2Encoder {
    pub fn new(cfg: Pbkdf2Config) -> Result<Self> {
        Self::with_salt_generator(cfg, AlphabetSaltGenerator::default())
    }
}

impl<SALTGENERATOR: SaltGenerator> Pbkdf2Encoder<SALTGENERATOR> {
    pub fn with_salt_generator(cfg: Pbkdf2Config, generator: SALTGENERATOR) -> Result<Self> {
        require_positive("key length", cfg.key_len)?;
        if cfg.iterations == 0 {
            return Err(Error::InvalidConfig(
                "pbkdf2 iterations must be positive".into(),
            ));
        }
        Ok(Self {
            hash_func: cfg.hash_func,
            iterations: cfg.iterations,
            key_len: cfg.key_len,
            salt: LazySalt::new(generator, cfg.salt_len, cfg.salt),
        })
    }

    fn derive(&mut self, secret: &str) -> Result<String> {
        let salt = self.salt.get()?;
        debug!(hash_func = %self.hash_func, "deriving pbkdf2 key");
        let mut key = vec![0; self.key_len];
        with_hash_function!(self.hash_func, DIGEST => {
            ::pbkdf2::pbkdf2_hmac::<DIGEST>(secret.as_bytes(), salt, self.iterations, &mut key)
        });
        Ok(hex::encode(key))
    }
}

impl<SALTGENERATOR: SaltGenerator> PasswordEncoder for Pbkdf2Encoder<SALTGENERATOR> {
    #[instrument("encode_pbkdf2", skip(self, secret))]
    fn encode(&mut self, secret: &str) -> Result<String> {
        self.derive(secret)
    }

    #[instrument("verify_pbkdf2", skip(self, hash, secret))]
    fn verify(&mut self, hash: &str, secret: &str) -> Result<bool> {
        let encoded = self.derive(secret)?;
        Ok(encoded.as_bytes().ct_eq(hash.as_bytes()).into())
    }

    fn salt(&mut self) -> Result<Vec<u8>> {
        self.salt.get().map(<[u8]>::to_vec)
    }
}

// Tests
