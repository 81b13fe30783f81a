use ::hmac::{Hmac, Mac};
use tracing::{debug, instrument};

use crate::{
    err::{FormatError, Result},
    Algorithm, HashFunction,
};

use super::{EncoderConfig, EncoderOption, PasswordEncoder};

// HmacConfig

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HmacConfig {
    pub hash_func: HashFunction,
    pub key: String,
}

impl EncoderConfig for HmacConfig {
    const ALGORITHM: Algorithm = Algorithm::Hmac;

    fn apply(&mut self, opt: EncoderOption) -> Result {
        match opt {
            EncoderOption::HashFunc(func) => self.hash_func = func,
            EncoderOption::Key(key) => self.key = key,
            opt => return Err(opt.unsupported(Self::ALGORITHM)),
        }
        Ok(())
    }
}

// HmacEncoder

/// Keyed hash over the secret. The key is shared, not a salt, so no salt is exposed.
pub struct HmacEncoder {
    hash_func: HashFunction,
    key: String,
}

impl HmacEncoder {
    pub fn new(cfg: HmacConfig) -> Self {
        Self {
            hash_func: cfg.hash_func,
            key: cfg.key,
        }
    }
}

impl PasswordEncoder for HmacEncoder {
    #[instrument("encode_hmac", skip(self, secret), fields(hash_func = %self.hash_func))]
    fn encode(&mut self, secret: &str) -> Result<String> {
        debug!("computing mac");
        let tag = with_hash_function!(self.hash_func, DIGEST => {
            let mut mac = Hmac::<DIGEST>::new_from_slice(self.key.as_bytes())?;
            mac.update(secret.as_bytes());
            mac.finalize().into_bytes().to_vec()
        });
        Ok(hex::encode(tag))
    }

    #[instrument("verify_hmac", skip(self, hash, secret), fields(hash_func = %self.hash_func))]
    fn verify(&mut self, hash: &str, secret: &str) -> Result<bool> {
        let expected = hex::decode(hash).map_err(FormatError::from)?;
        debug!("verifying mac");
        let matches = with_hash_function!(self.hash_func, DIGEST => {
            let mut mac = Hmac::<DIGEST>::new_from_slice(self.key.as_bytes())?;
            mac.update(secret.as_bytes());
            mac.verify_slice(&expected).is_ok()
        });
        Ok(matches)
    }

    fn salt(&mut self) -> Result<Vec<u8>> {
        Ok(vec![])
    }
}

// Tests

#[cfg(test)]
mod test {
    use crate::{err::Error, test::*};

    use super::*;

    // Mods

    mod hmac_encoder {
        use super::*;

        // Mods

        mod encode {
            use super::*;

            // Data

            struct Data {
                expected: &'static str,
                hash_func: HashFunction,
                key: &'static str,
                secret: &'static str,
            }

            // Tests

            fn test(data: Data) {
                init_tracer();
                let mut encoder = HmacEncoder::new(HmacConfig {
                    hash_func: data.hash_func,
                    key: data.key.into(),
                });
                let hash = encoder.encode(data.secret).unwrap();
                assert_eq!(hash, data.expected);
                assert!(encoder.verify(&hash, data.secret).unwrap());
                assert!(encoder.salt().unwrap().is_empty());
            }

            #[test]
            fn rfc4231_case_2_sha256() {
                test(Data {
                    expected: "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843",
                    hash_func: HashFunction::Sha256,
                    key: "Jefe",
                    secret: "what do ya want for nothing?",
                });
            }

            #[test]
            fn rfc2202_case_2_sha1() {
                test(Data {
                    expected: "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79",
                    hash_func: HashFunction::Sha1,
                    key: "Jefe",
                    secret: "what do ya want for nothing?",
                });
            }

            #[test]
            fn does_not_cache_digest() {
                init_tracer();
                let mut encoder = HmacEncoder::new(HmacConfig::default());
                let first = encoder.encode("hello world").unwrap();
                let second = encoder.encode("Hello World").unwrap();
                assert_ne!(first, second);
            }
        }

        mod verify {
            use super::*;

            // Tests

            #[test]
            fn mismatch() {
                init_tracer();
                let mut encoder = HmacEncoder::new(HmacConfig {
                    key: "key".into(),
                    ..Default::default()
                });
                let hash = encoder.encode("hello world").unwrap();
                assert!(!encoder.verify(&hash, "Hello World").unwrap());
            }

            #[test]
            fn other_key() {
                init_tracer();
                let hash = HmacEncoder::new(HmacConfig {
                    key: "key".into(),
                    ..Default::default()
                })
                .encode("hello world")
                .unwrap();
                let mut encoder = HmacEncoder::new(HmacConfig {
                    key: "other".into(),
                    ..Default::default()
                });
                assert!(!encoder.verify(&hash, "hello world").unwrap());
            }

            #[test]
            fn truncated() {
                init_tracer();
                let mut encoder = HmacEncoder::new(HmacConfig::default());
                let hash = encoder.encode("hello world").unwrap();
                assert!(!encoder.verify(&hash[..32], "hello world").unwrap());
            }

            #[test]
            fn odd_length() {
                init_tracer();
                let mut encoder = HmacEncoder::new(HmacConfig::default());
                let res = encoder.verify("abc", "hello world");
                assert!(matches!(
                    res,
                    Err(Error::FormatParse(FormatError::Hex(_)))
                ));
            }

            #[test]
            fn invalid_char() {
                init_tracer();
                let mut encoder = HmacEncoder::new(HmacConfig::default());
                let res = encoder.verify("zz", "hello world");
                assert!(matches!(
                    res,
                    Err(Error::FormatParse(FormatError::Hex(_)))
                ));
            }
        }
    }
}
