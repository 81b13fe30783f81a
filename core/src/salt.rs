use rand::{rngs::OsRng, RngCore};
use tracing::{debug, instrument};

use crate::err::Result;

// Consts

pub const PBKDF2_SALT_ALPHABET: &[u8; 64] =
    b"./ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

// Traits

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait SaltGenerator: Send {
    fn generate(&self, len: usize) -> Result<Vec<u8>>;
}

// OsSaltGenerator

/// Raw random bytes read from the operating system entropy source.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsSaltGenerator;

impl SaltGenerator for OsSaltGenerator {
    #[instrument(skip(self))]
    fn generate(&self, len: usize) -> Result<Vec<u8>> {
        debug!("generating random salt");
        let mut salt = vec![0; len];
        OsRng.try_fill_bytes(&mut salt)?;
        Ok(salt)
    }
}

// AlphabetSaltGenerator

/// Maps random bytes onto [`PBKDF2_SALT_ALPHABET`] with `byte % 64`.
///
/// The modulo reduction is kept as is so that salts stay byte-compatible with
/// hashes stored by earlier pbkdf2 deployments.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlphabetSaltGenerator<SALTGENERATOR: SaltGenerator = OsSaltGenerator>(
    pub SALTGENERATOR,
);

impl<SALTGENERATOR: SaltGenerator> SaltGenerator for AlphabetSaltGenerator<SALTGENERATOR> {
    #[instrument(skip(self))]
    fn generate(&self, len: usize) -> Result<Vec<u8>> {
        let raw = self.0.generate(len)?;
        debug!("mapping salt onto pbkdf2 alphabet");
        let salt = raw
            .into_iter()
            .map(|byte| PBKDF2_SALT_ALPHABET[(byte % 64) as usize])
            .collect();
        Ok(salt)
    }
}

// LazySalt

/// Salt materialized on first use and kept for the lifetime of its owner.
pub struct LazySalt<SALTGENERATOR: SaltGenerator> {
    generator: SALTGENERATOR,
    len: usize,
    salt: Option<Vec<u8>>,
}

impl<SALTGENERATOR: SaltGenerator> LazySalt<SALTGENERATOR> {
    pub fn new(generator: SALTGENERATOR, len: usize, salt: Option<Vec<u8>>) -> Self {
        Self {
            generator,
            len,
            salt,
        }
    }

    pub fn get(&mut self) -> Result<&[u8]> {
        let salt = match self.salt.take() {
            Some(salt) => salt,
            None => {
                debug!(salt.len = self.len, "materializing salt");
                self.generator.generate(self.len)?
            }
        };
        Ok(self.salt.insert(salt))
    }
}

// Tests
