use tracing::{debug, instrument};

use crate::{
    err::{Error, Result},
    Algorithm,
};

use super::{EncoderConfig, EncoderOption, PasswordEncoder};

// Consts

pub const DEFAULT_COST: u32 = 10;
pub const MAX_COST: u32 = 31;
pub const MIN_COST: u32 = 4;

// BcryptConfig

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BcryptConfig {
    pub cost: u32,
}

impl BcryptConfig {
    pub fn validate(&self) -> Result {
        if (MIN_COST..=MAX_COST).contains(&self.cost) {
            Ok(())
        } else {
            Err(Error::InvalidConfig(format!(
                "bcrypt cost {} is outside {MIN_COST}..={MAX_COST}",
                self.cost
            )))
        }
    }
}

impl Default for BcryptConfig {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl EncoderConfig for BcryptConfig {
    const ALGORITHM: Algorithm = Algorithm::Bcrypt;

    fn apply(&mut self, opt: EncoderOption) -> Result {
        match opt {
            EncoderOption::Cost(cost) => self.cost = cost,
            opt => return Err(opt.unsupported(Self::ALGORITHM)),
        }
        Ok(())
    }
}

// BcryptEncoder

/// Cost, salt and digest all live in the bcrypt string, so no salt is exposed.
///
/// Secrets that don't fit bcrypt's 72 bytes input are rejected, never truncated.
pub struct BcryptEncoder {
    cost: u32,
}

impl BcryptEncoder {
    pub fn new(cfg: BcryptConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self { cost: cfg.cost })
    }
}

impl PasswordEncoder for BcryptEncoder {
    #[instrument("encode_bcrypt", skip(self, secret), fields(cost = self.cost))]
    fn encode(&mut self, secret: &str) -> Result<String> {
        debug!("hashing secret");
        bcrypt::non_truncating_hash(secret, self.cost).map_err(Error::from)
    }

    #[instrument("verify_bcrypt", skip(self, hash, secret))]
    fn verify(&mut self, hash: &str, secret: &str) -> Result<bool> {
        debug!("verifying secret");
        bcrypt::non_truncating_verify(secret, hash).map_err(Error::from)
    }

    fn salt(&mut self) -> Result<Vec<u8>> {
        Ok(vec![])
    }
}

// Tests
