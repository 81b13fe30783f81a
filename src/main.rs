use std::{
    io::{stdout, Write},
    process::ExitCode,
};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use hashkit_core::{
    create,
    salt::{OsSaltGenerator, SaltGenerator},
    tracer::{init_tracer, DEFAULT_LOG_FILTER},
    EncoderOption, HashFunction, PasswordEncoder,
};
use serde::Serialize;
use tracing::{debug, info};

// Main

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_tracer(&args.log_filter)?;
    let mut out = stdout().lock();
    match args.cmd {
        Command::Encode(args) => {
            let mut encoder = args.encoder.build()?;
            encode(
                encoder.as_mut(),
                &args.encoder.algorithm,
                &args.secret,
                args.json,
                &mut out,
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Salt { len } => {
            salt(&OsSaltGenerator, len, &mut out)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify(args) => {
            let mut encoder = args.encoder.build()?;
            if verify(encoder.as_mut(), &args.hash, &args.secret, &mut out)? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(1))
            }
        }
    }
}

// Args

#[derive(Clone, Debug, Eq, Parser, PartialEq)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    cmd: Command,
    #[arg(
        long,
        env,
        global = true,
        default_value = DEFAULT_LOG_FILTER,
        long_help = "Log filter (https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html#directives)"
    )]
    log_filter: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Subcommand)]
enum Command {
    #[command(about = "Hash a secret")]
    Encode(EncodeArgs),
    #[command(about = "Print a random hex salt")]
    Salt {
        #[arg(
            long,
            env = "HASHKIT_SALT_LEN",
            default_value_t = 16,
            long_help = "Number of random bytes"
        )]
        len: usize,
    },
    #[command(about = "Verify a secret against an encoded hash")]
    Verify(VerifyArgs),
}

#[derive(clap::Args, Clone, Debug, Eq, PartialEq)]
struct EncodeArgs {
    #[command(flatten)]
    encoder: EncoderArgs,
    #[arg(long, long_help = "Print algorithm, hash and hex salt as JSON")]
    json: bool,
    #[arg(env = "HASHKIT_SECRET", long_help = "Secret to hash")]
    secret: String,
}

#[derive(clap::Args, Clone, Debug, Eq, PartialEq)]
struct VerifyArgs {
    #[command(flatten)]
    encoder: EncoderArgs,
    #[arg(long_help = "Encoded hash")]
    hash: String,
    #[arg(env = "HASHKIT_SECRET", long_help = "Candidate secret")]
    secret: String,
}

#[derive(clap::Args, Clone, Debug, Eq, PartialEq)]
struct EncoderArgs {
    #[arg(
        short,
        long,
        env = "HASHKIT_ALGORITHM",
        default_value = "argon2id",
        long_help = "Algorithm tag: argon2id, bcrypt, hkdf, hmac, pbkdf2 or scrypt"
    )]
    algorithm: String,
    #[arg(long, env = "HASHKIT_COST", long_help = "bcrypt cost (4 to 31)")]
    cost: Option<u32>,
    #[arg(
        long,
        env = "HASHKIT_HASH_FUNC",
        long_help = "Hash function of pbkdf2, hkdf and hmac: sha1, sha224, sha256, sha384 or sha512"
    )]
    hash_func: Option<HashFunction>,
    #[arg(long, env = "HASHKIT_KEY", long_help = "hmac shared key")]
    key: Option<String>,
    #[arg(long, env = "HASHKIT_INFO", long_help = "hkdf context info")]
    info: Option<String>,
    #[arg(long, env = "HASHKIT_ITERATIONS", long_help = "pbkdf2 iteration count")]
    iterations: Option<u32>,
    #[arg(
        long,
        env = "HASHKIT_KEY_LEN",
        long_help = "Digest length in bytes (argon2id, hkdf, pbkdf2, scrypt)"
    )]
    key_len: Option<usize>,
    #[arg(long, env = "HASHKIT_MEMORY", long_help = "argon2id memory cost in KiB")]
    memory: Option<u32>,
    #[arg(
        long,
        env = "HASHKIT_SALT",
        long_help = "Hex salt to reuse instead of generating one"
    )]
    salt: Option<String>,
    #[arg(
        long,
        env = "HASHKIT_SALT_LEN",
        long_help = "Length in bytes of generated salts"
    )]
    salt_len: Option<usize>,
    #[arg(long, env = "HASHKIT_N", long_help = "scrypt CPU/memory cost (power of two)")]
    n: Option<u64>,
    #[arg(long, env = "HASHKIT_P", long_help = "scrypt parallelization")]
    p: Option<u32>,
    #[arg(long, env = "HASHKIT_R", long_help = "scrypt block size")]
    r: Option<u32>,
    #[arg(long, env = "HASHKIT_THREADS", long_help = "argon2id parallelism")]
    threads: Option<u32>,
    #[arg(long, env = "HASHKIT_TIME", long_help = "argon2id iterations")]
    time: Option<u32>,
}

impl EncoderArgs {
    fn build(&self) -> anyhow::Result<Box<dyn PasswordEncoder>> {
        let opts = self.options()?;
        create(&self.algorithm, opts)?.ok_or_else(|| anyhow!("unknown algorithm `{}`", self.algorithm))
    }

    fn options(&self) -> anyhow::Result<Vec<EncoderOption>> {
        let salt = self
            .salt
            .as_deref()
            .map(hex::decode)
            .transpose()
            .context("salt isn't valid hex")?;
        let opts = [
            self.cost.map(EncoderOption::Cost),
            self.hash_func.map(EncoderOption::HashFunc),
            self.info.clone().map(EncoderOption::Info),
            self.iterations.map(EncoderOption::Iterations),
            self.key.clone().map(EncoderOption::Key),
            self.key_len.map(EncoderOption::KeyLen),
            self.memory.map(EncoderOption::Memory),
            self.n.map(EncoderOption::N),
            self.p.map(EncoderOption::P),
            self.r.map(EncoderOption::R),
            salt.map(EncoderOption::Salt),
            self.salt_len.map(EncoderOption::SaltLen),
            self.threads.map(EncoderOption::Threads),
            self.time.map(EncoderOption::Time),
        ];
        Ok(opts.into_iter().flatten().collect())
    }
}

// Outputs

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
struct EncodeOutput<'a> {
    algorithm: &'a str,
    hash: String,
    salt: Option<String>,
}

// Functions

fn encode<ENCODER: PasswordEncoder + ?Sized, OUT: Write>(
    encoder: &mut ENCODER,
    alg: &str,
    secret: &str,
    json: bool,
    out: &mut OUT,
) -> anyhow::Result<()> {
    debug!("encoding secret");
    let hash = encoder.encode(secret)?;
    if json {
        let salt = encoder.salt()?;
        let output = EncodeOutput {
            algorithm: alg,
            hash,
            salt: (!salt.is_empty()).then(|| hex::encode(salt)),
        };
        serde_json::to_writer(&mut *out, &output)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{hash}")?;
    }
    Ok(())
}

fn salt<SALTGENERATOR: SaltGenerator, OUT: Write>(
    generator: &SALTGENERATOR,
    len: usize,
    out: &mut OUT,
) -> anyhow::Result<()> {
    let salt = generator.generate(len)?;
    writeln!(out, "{}", hex::encode(salt))?;
    Ok(())
}

fn verify<ENCODER: PasswordEncoder + ?Sized, OUT: Write>(
    encoder: &mut ENCODER,
    hash: &str,
    secret: &str,
    out: &mut OUT,
) -> anyhow::Result<bool> {
    debug!("verifying secret");
    let matches = encoder.verify(hash, secret)?;
    if matches {
        info!("secret matches");
    } else {
        info!("secret doesn't match");
    }
    writeln!(out, "{matches}")?;
    Ok(matches)
}

// Tests

#[cfg(test)]
mod test {
    use hashkit_core::{salt::MockSaltGenerator, Error, MockPasswordEncoder};
    use mockall::predicate::*;

    use super::*;

    // Functions

    fn init_tracer() {
        hashkit_core::tracer::init_tracer("hashkit=debug,hashkit_core=debug,warn").ok();
    }

    // Mods

    mod args {
        use super::*;

        // Tests

        #[test]
        fn encode_defaults() {
            let args = Args::try_parse_from(["hashkit", "encode", "hello world"]).unwrap();
            let Command::Encode(args) = args.cmd else {
                panic!("expected encode command");
            };
            assert_eq!(args.encoder.algorithm, "argon2id");
            assert_eq!(args.secret, "hello world");
            assert!(!args.json);
            assert!(args.encoder.options().unwrap().is_empty());
        }

        #[test]
        fn verify_options() {
            let args = Args::try_parse_from([
                "hashkit",
                "verify",
                "--algorithm",
                "pbkdf2",
                "--iterations",
                "5",
                "--hash-func",
                "sha512",
                "--salt",
                "73616c74",
                "deadbeef",
                "hello world",
            ])
            .unwrap();
            let Command::Verify(args) = args.cmd else {
                panic!("expected verify command");
            };
            assert_eq!(args.hash, "deadbeef");
            let opts = args.encoder.options().unwrap();
            assert_eq!(
                opts,
                vec![
                    EncoderOption::HashFunc(HashFunction::Sha512),
                    EncoderOption::Iterations(5),
                    EncoderOption::Salt(b"salt".to_vec()),
                ]
            );
        }

        #[test]
        fn invalid_salt() {
            let args = Args::try_parse_from(["hashkit", "encode", "--salt", "xyz", "secret"])
                .unwrap();
            let Command::Encode(args) = args.cmd else {
                panic!("expected encode command");
            };
            assert!(args.encoder.options().is_err());
        }

        #[test]
        fn unknown_algorithm() {
            let args =
                Args::try_parse_from(["hashkit", "encode", "--algorithm", "md5", "secret"])
                    .unwrap();
            let Command::Encode(args) = args.cmd else {
                panic!("expected encode command");
            };
            assert!(args.encoder.build().is_err());
        }
    }

    mod encode {
        use super::*;

        // Data

        struct Data {
            hash: &'static str,
            salt: Vec<u8>,
            secret: &'static str,
        }

        impl Default for Data {
            fn default() -> Self {
                Self {
                    hash: "hash",
                    salt: vec![0xab, 0xcd],
                    secret: "secret",
                }
            }
        }

        // Tests

        fn test(data: Data, json: bool) -> String {
            init_tracer();
            let mut encoder = MockPasswordEncoder::new();
            encoder
                .expect_encode()
                .with(eq(data.secret))
                .times(1)
                .returning(move |_| Ok(data.hash.into()));
            encoder
                .expect_salt()
                .times(usize::from(json))
                .returning(move || Ok(data.salt.clone()));
            let mut out = vec![];
            encode(&mut encoder, "pbkdf2", data.secret, json, &mut out).unwrap();
            String::from_utf8(out).unwrap()
        }

        #[test]
        fn plain() {
            let out = test(Data::default(), false);
            assert_eq!(out, "hash\n");
        }

        #[test]
        fn json() {
            let out = test(Data::default(), true);
            assert_eq!(
                out,
                "{\"algorithm\":\"pbkdf2\",\"hash\":\"hash\",\"salt\":\"abcd\"}\n"
            );
        }

        #[test]
        fn json_without_salt() {
            let data = Data {
                salt: vec![],
                ..Default::default()
            };
            let out = test(data, true);
            assert_eq!(
                out,
                "{\"algorithm\":\"pbkdf2\",\"hash\":\"hash\",\"salt\":null}\n"
            );
        }

        #[test]
        fn error() {
            init_tracer();
            let mut encoder = MockPasswordEncoder::new();
            encoder
                .expect_encode()
                .times(1)
                .returning(|_| Err(Error::InvalidConfig("cost".into())));
            let mut out = vec![];
            assert!(encode(&mut encoder, "bcrypt", "secret", false, &mut out).is_err());
            assert!(out.is_empty());
        }
    }

    mod salt {
        use super::*;

        // Tests

        #[test]
        fn hex_output() {
            init_tracer();
            let mut generator = MockSaltGenerator::new();
            generator
                .expect_generate()
                .with(eq(3))
                .times(1)
                .returning(|_| Ok(vec![0x01, 0x02, 0xff]));
            let mut out = vec![];
            salt(&generator, 3, &mut out).unwrap();
            assert_eq!(String::from_utf8(out).unwrap(), "0102ff\n");
        }
    }

    mod verify {
        use super::*;

        // Tests

        fn test(matches: bool) -> (bool, String) {
            init_tracer();
            let mut encoder = MockPasswordEncoder::new();
            encoder
                .expect_verify()
                .with(eq("hash"), eq("secret"))
                .times(1)
                .returning(move |_, _| Ok(matches));
            let mut out = vec![];
            let res = verify(&mut encoder, "hash", "secret", &mut out).unwrap();
            (res, String::from_utf8(out).unwrap())
        }

        #[test]
        fn matching() {
            assert_eq!(test(true), (true, "true\n".into()));
        }

        #[test]
        fn mismatching() {
            assert_eq!(test(false), (false, "false\n".into()));
        }
    }

    mod end_to_end {
        use super::*;

        // Tests

        #[test]
        fn argon2id_round_trip() {
            init_tracer();
            let args = Args::try_parse_from([
                "hashkit",
                "encode",
                "--memory",
                "64",
                "--threads",
                "1",
                "hello world",
            ])
            .unwrap();
            let Command::Encode(args) = args.cmd else {
                panic!("expected encode command");
            };
            let mut encoder = args.encoder.build().unwrap();
            let mut out = vec![];
            encode(encoder.as_mut(), "argon2id", &args.secret, false, &mut out).unwrap();
            let hash = String::from_utf8(out).unwrap();
            let hash = hash.trim_end();
            assert!(hash.starts_with("$argon2id$v=19$m=64,t=1,p=1$"));
            let mut encoder = EncoderArgs {
                memory: None,
                threads: None,
                ..args.encoder
            }
            .build()
            .unwrap();
            let mut out = vec![];
            assert!(verify(encoder.as_mut(), hash, "hello world", &mut out).unwrap());
        }
    }
}
