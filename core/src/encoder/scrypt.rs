use scrypt::Params;
use subtle::ConstantTimeEq;
use tracing::{debug, instrument};

use crate::{
    err::{Error, Result},
    salt::{LazySalt, OsSaltGenerator, SaltGenerator},
    Algorithm,
};

use super::{require_positive, EncoderConfig, EncoderOption, PasswordEncoder};

// Consts

pub const DEFAULT_N: u64 = 1 << 15;
pub const DEFAULT_P: u32 = 1;
pub const DEFAULT_R: u32 = 8;
pub const DEFAULT_SALT_LEN: usize = super::DEFAULT_SALT_LEN * 2;

// ScryptConfig

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScryptConfig {
    /// Defaults to `salt_len`.
    pub key_len: Option<usize>,
    pub n: u64,
    pub p: u32,
    pub r: u32,
    pub salt: Option<Vec<u8>>,
    pub salt_len: usize,
}

impl Default for ScryptConfig {
    fn default() -> Self {
        Self {
            key_len: None,
            n: DEFAULT_N,
            p: DEFAULT_P,
            r: DEFAULT_R,
            salt: None,
            salt_len: DEFAULT_SALT_LEN,
        }
    }
}

impl EncoderConfig for ScryptConfig {
    const ALGORITHM: Algorithm = Algorithm::Scrypt;

    fn apply(&mut self, opt: EncoderOption) -> Result {
        match opt {
            EncoderOption::KeyLen(len) => self.key_len = Some(len),
            EncoderOption::N(n) => self.n = n,
            EncoderOption::P(p) => self.p = p,
            EncoderOption::R(r) => self.r = r,
            EncoderOption::Salt(salt) => self.salt = Some(salt),
            EncoderOption::SaltLen(len) => self.salt_len = len,
            opt => return Err(opt.unsupported(Self::ALGORITHM)),
        }
        Ok(())
    }
}

// ScryptEncoder

/// Scrypt with hex output; verification needs this instance's salt and parameters.
pub struct ScryptEncoder<SALTGENERATOR: SaltGenerator = OsSaltGenerator> {
    key_len: usize,
    params: Params,
    salt: LazySalt<SALTGENERATOR>,
}

impl ScryptEncoder {
    pub fn new(cfg: ScryptConfig) -> Result<Self> {
        Self::with_salt_generator(cfg, OsSaltGenerator)
    }
}

impl<SALTGENERATOR: SaltGenerator> ScryptEncoder<SALTGENERATOR> {
    pub fn with_salt_generator(cfg: ScryptConfig, generator: SALTGENERATOR) -> Result<Self> {
        let key_len = cfg.key_len.unwrap_or(cfg.salt_len);
        require_positive("key length", key_len)?;
        if cfg.n < 2 || !cfg.n.is_power_of_two() {
            return Err(Error::InvalidConfig(format!(
                "scrypt N {} must be a power of two greater than 1",
                cfg.n
            )));
        }
        let log_n = cfg.n.trailing_zeros() as u8;
        let params = Params::new(log_n, cfg.r, cfg.p, Params::RECOMMENDED_LEN)
            .map_err(|err| Error::InvalidConfig(format!("scrypt: {err}")))?;
        Ok(Self {
            key_len,
            params,
            salt: LazySalt::new(generator, cfg.salt_len, cfg.salt),
        })
    }

    fn derive(&mut self, secret: &str) -> Result<String> {
        let salt = self.salt.get()?;
        debug!(
            log_n = self.params.log_n(),
            r = self.params.r(),
            p = self.params.p(),
            "deriving scrypt key"
        );
        let mut key = vec![0; self.key_len];
        scrypt::scrypt(secret.as_bytes(), salt, &self.params, &mut key)?;
        Ok(hex::encode(key))
    }
}

impl<SALTGENERATOR: SaltGenerator> PasswordEncoder for ScryptEncoder<SALTGENERATOR> {
    #[instrument("encode_scrypt", skip(self, secret))]
    fn encode(&mut self, secret: &str) -> Result<String> {
        self.derive(secret)
    }

    #[instrument("verify_scrypt", skip(self, hash, secret))]
    fn verify(&mut self, hash: &str, secret: &str) -> Result<bool> {
        let encoded = self.derive(secret)?;
        Ok(encoded.as_bytes().ct_eq(hash.as_bytes()).into())
    }

    fn salt(&mut self) -> Result<Vec<u8>> {
        self.salt.get().map(<[u8]>::to_vec)
    }
}

// Tests
