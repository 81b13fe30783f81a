use ::hkdf::Hkdf;
use subtle::ConstantTimeEq;
use tracing::{debug, instrument};

use crate::{
    err::Result,
    salt::{LazySalt, OsSaltGenerator, SaltGenerator},
    Algorithm, HashFunction,
};

use super::{
    require_positive, EncoderConfig, EncoderOption, PasswordEncoder, DEFAULT_KEY_LEN,
    DEFAULT_SALT_LEN,
};

// HkdfConfig

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HkdfConfig {
    pub hash_func: HashFunction,
    /// Context folded into the expand step.
    pub info: String,
    /// Output length of the expand step.
    pub key_len: usize,
    pub salt: Option<Vec<u8>>,
    pub salt_len: usize,
}

impl Default for HkdfConfig {
    fn default() -> Self {
        Self {
            hash_func: HashFunction::default(),
            info: String::new(),
            key_len: DEFAULT_KEY_LEN,
            salt: None,
            salt_len: DEFAULT_SALT_LEN,
        }
    }
}

impl EncoderConfig for HkdfConfig {
    const ALGORITHM: Algorithm = Algorithm::Hkdf;

    fn apply(&mut self, opt: EncoderOption) -> Result {
        match opt {
            EncoderOption::HashFunc(func) => self.hash_func = func,
            EncoderOption::Info(info) => self.info = info,
            EncoderOption::HashLen(len) | EncoderOption::KeyLen(len) => self.key_len = len,
            EncoderOption::Salt(salt) => self.salt = Some(salt),
            EncoderOption::SaltLen(len) => self.salt_len = len,
            opt => return Err(opt.unsupported(Self::ALGORITHM)),
        }
        Ok(())
    }
}

// HkdfEncoder

pub struct HkdfEncoder<SALTGENERATOR: SaltGenerator = OsSaltGenerator> {
    hash_func: HashFunction,
    info: String,
    key_len: usize,
    salt: LazySalt<SALTGENERATOR>,
}

impl HkdfEncoder {
    pub fn new(cfg: HkdfConfig) -> Result<Self> {
        Self::with_salt_generator(cfg, OsSaltGenerator)
    }
}

impl<SALTGENERATOR: SaltGenerator> HkdfEncoder<SALTGENERATOR> {
    pub fn with_salt_generator(cfg: HkdfConfig, generator: SALTGENERATOR) -> Result<Self> {
        require_positive("hash length", cfg.key_len)?;
        Ok(Self {
            hash_func: cfg.hash_func,
            info: cfg.info,
            key_len: cfg.key_len,
            salt: LazySalt::new(generator, cfg.salt_len, cfg.salt),
        })
    }

    fn derive(&mut self, secret: &str) -> Result<String> {
        let salt = self.salt.get()?;
        debug!(hash_func = %self.hash_func, "expanding hkdf key");
        let mut key = vec![0; self.key_len];
        with_hash_function!(self.hash_func, DIGEST => {
            Hkdf::<DIGEST>::new(Some(salt), secret.as_bytes()).expand(self.info.as_bytes(), &mut key)
        })?;
        Ok(hex::encode(key))
    }
}

impl<SALTGENERATOR: SaltGenerator> PasswordEncoder for HkdfEncoder<SALTGENERATOR> {
    #[instrument("encode_hkdf", skip(self, secret))]
    fn encode(&mut self, secret: &str) -> Result<String> {
        self.derive(secret)
    }

    #[instrument("verify_hkdf", skip(self, hash, secret))]
    fn verify(&mut self, hash: &str, secret: &str) -> Result<bool> {
        let encoded = self.derive(secret)?;
        Ok(encoded.as_bytes().ct_eq(hash.as_bytes()).into())
    }

    fn salt(&mut self) -> Result<Vec<u8>> {
        self.salt.get().map(<[u8]>::to_vec)
    }
}

// Tests
