//! k25519: Ed25519 wallet key CLI
//!
//! Commands:
//!   mnemonic                 - generate a BIP-39 phrase
//!   derive                   - derive a keypair from a phrase or seed and print its public key
//!   keygen                   - derive (or randomly generate) a keypair and write an encrypted keystore
//!   inspect <keystore>       - decrypt a keystore and print its public keys
//!   sign <keystore> <msg>    - sign a message
//!   verify <pubkey> <msg> <sig>
//!   ecdh <keystore> <peer>   - hashed X25519 shared secret with a peer
//!   config show              - display current configuration
//!
//! Keys, signatures and secrets are printed in base58.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use tracing::info;
use zeroize::Zeroizing;

use k25519_core::config::{expand_tilde, K25519Config};
use k25519_crypto::{
    generate_mnemonic, mnemonic_to_seed, verify_message, DerivationPath, KdfAlgorithm, KdfProfile,
    Keypair, KeystoreOptions, MnemonicLanguage, MnemonicLength, PublicKey, Signature,
};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "k25519",
    version,
    about = "Ed25519 wallet keys: HD derivation, keystores, signing, ECDH"
)]
struct Cli {
    /// Path to k25519.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "K25519_CONFIG",
        default_value = "~/.config/k25519/config.toml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "K25519_LOG")]
    log: Option<String>,

    /// Log format; overrides the config file
    #[arg(long, env = "K25519_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new BIP-39 mnemonic phrase
    Mnemonic {
        /// Number of words (12, 15, 18, 21 or 24)
        #[arg(long, short = 'w', default_value_t = 24)]
        words: usize,
        /// Wordlist: english, chinese-simplified, chinese-traditional
        #[arg(long, short = 'l', default_value = "english")]
        language: String,
    },

    /// Derive a keypair and print its public key
    Derive {
        #[command(flatten)]
        seed: SeedArgs,
        /// Derivation path (default: derivation.default_path from config)
        #[arg(long, short = 'p')]
        path: Option<String>,
    },

    /// Create a keypair and write it to an encrypted keystore file
    ///
    /// Without --mnemonic or --seed-hex a fresh random key is generated.
    Keygen {
        #[command(flatten)]
        seed: SeedArgs,
        /// Derivation path (default: derivation.default_path from config)
        #[arg(long, short = 'p')]
        path: Option<String>,
        /// Output file (default: <keystore.dir>/<pubkey>.keystore)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
        /// KDF: scrypt or pbkdf2 (overrides config)
        #[arg(long)]
        kdf: Option<String>,
        /// KDF cost profile: standard or light (overrides config)
        #[arg(long)]
        profile: Option<String>,
        #[command(flatten)]
        password: PasswordArgs,
    },

    /// Decrypt a keystore and print its Ed25519 and X25519 public keys
    Inspect {
        keystore: PathBuf,
        #[command(flatten)]
        password: PasswordArgs,
    },

    /// Sign a message with the key in a keystore
    Sign {
        keystore: PathBuf,
        message: String,
        /// Treat MESSAGE as hex-encoded bytes
        #[arg(long)]
        hex: bool,
        #[command(flatten)]
        password: PasswordArgs,
    },

    /// Verify a base58 signature against a base58 public key
    Verify {
        public_key: String,
        message: String,
        signature: String,
        /// Treat MESSAGE as hex-encoded bytes
        #[arg(long)]
        hex: bool,
    },

    /// Compute the hashed X25519 shared secret with a peer's X25519 public key
    Ecdh {
        keystore: PathBuf,
        /// Peer X25519 public key (base58)
        peer: String,
        #[command(flatten)]
        password: PasswordArgs,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[derive(Args, Debug)]
struct SeedArgs {
    /// BIP-39 mnemonic phrase
    #[arg(long, short = 'm', env = "K25519_MNEMONIC", hide_env_values = true)]
    mnemonic: Option<String>,
    /// Optional BIP-39 passphrase applied to the mnemonic
    #[arg(long, default_value = "", hide_default_value = true)]
    passphrase: String,
    /// Raw seed as hex (at least 16 bytes), instead of a mnemonic
    #[arg(long, conflicts_with = "mnemonic")]
    seed_hex: Option<String>,
}

#[derive(Args, Debug)]
struct PasswordArgs {
    /// Keystore password (prompted for when unset)
    #[arg(long, env = "K25519_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = expand_tilde(&cli.config);
    let config = K25519Config::load(&config_path)
        .with_context(|| format!("loading config: {}", config_path.display()))?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = match cli.log_format {
        Some(format) => format,
        None => LogFormat::from_str(&config.log.format, true)
            .map_err(|e| anyhow::anyhow!("log.format: {e}"))?,
    };
    init_logging(&level, format);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "k25519 starting"
    );

    match cli.command {
        Commands::Mnemonic { words, language } => cmd_mnemonic(words, &language),
        Commands::Derive { seed, path } => cmd_derive(&config, &seed, path.as_deref()),
        Commands::Keygen {
            seed,
            path,
            out,
            kdf,
            profile,
            password,
        } => cmd_keygen(
            &config,
            &seed,
            path.as_deref(),
            out.as_deref(),
            kdf.as_deref(),
            profile.as_deref(),
            &password,
        ),
        Commands::Inspect { keystore, password } => cmd_inspect(&keystore, &password),
        Commands::Sign {
            keystore,
            message,
            hex,
            password,
        } => cmd_sign(&keystore, &message, hex, &password),
        Commands::Verify {
            public_key,
            message,
            signature,
            hex,
        } => cmd_verify(&public_key, &message, &signature, hex),
        Commands::Ecdh {
            keystore,
            peer,
            password,
        } => cmd_ecdh(&keystore, &peer, &password),
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &config_path),
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output; logs go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Seed bytes from --mnemonic or --seed-hex; `None` when neither is given.
fn resolve_seed(args: &SeedArgs) -> Result<Option<Zeroizing<Vec<u8>>>> {
    if let Some(phrase) = &args.mnemonic {
        let seed = mnemonic_to_seed(phrase.trim(), &args.passphrase)
            .context("reading mnemonic")?;
        return Ok(Some(Zeroizing::new(seed.to_vec())));
    }
    if let Some(seed_hex) = &args.seed_hex {
        let seed = hex::decode(seed_hex.trim_start_matches("0x")).context("decoding --seed-hex")?;
        return Ok(Some(Zeroizing::new(seed)));
    }
    Ok(None)
}

fn resolve_path(config: &K25519Config, path: Option<&str>) -> Result<DerivationPath> {
    let text = path.unwrap_or(&config.derivation.default_path);
    DerivationPath::parse(text).with_context(|| format!("parsing derivation path {text:?}"))
}

fn read_password(args: &PasswordArgs, confirm: bool) -> Result<SecretString> {
    if let Some(password) = &args.password {
        return Ok(SecretString::from(password.clone()));
    }
    let password = rpassword::prompt_password("Keystore password: ")
        .context("reading password from terminal")?;
    if confirm {
        let again = rpassword::prompt_password("Repeat password: ")
            .context("reading password from terminal")?;
        if again != password {
            anyhow::bail!("passwords do not match");
        }
    }
    Ok(SecretString::from(password))
}

fn open_keystore(path: &Path, password: &PasswordArgs) -> Result<Keypair> {
    let password = read_password(password, false)?;
    Keypair::from_keystore(path, password.expose_secret().as_bytes())
        .with_context(|| format!("opening keystore: {}", path.display()))
}

fn message_bytes(message: &str, is_hex: bool) -> Result<Vec<u8>> {
    if is_hex {
        hex::decode(message.trim_start_matches("0x")).context("decoding hex message")
    } else {
        Ok(message.as_bytes().to_vec())
    }
}

fn decode_base58<const N: usize>(what: &str, text: &str) -> Result<[u8; N]> {
    let bytes = bs58::decode(text)
        .into_vec()
        .with_context(|| format!("decoding {what} as base58"))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow::anyhow!("{what} must be {N} bytes, got {}", bytes.len()))
}

fn keystore_options(
    config: &K25519Config,
    kdf: Option<&str>,
    profile: Option<&str>,
) -> Result<KeystoreOptions> {
    let algorithm: KdfAlgorithm = kdf
        .unwrap_or(&config.keystore.kdf)
        .parse()
        .context("selecting KDF")?;
    let profile: KdfProfile = profile
        .unwrap_or(&config.keystore.profile)
        .parse()
        .context("selecting KDF profile")?;
    Ok(KeystoreOptions::new(algorithm, profile))
}

/// Default keystore file for a public key: `<dir>/<base58 pubkey>.keystore`
fn default_keystore_path(dir: &Path, public_key: &PublicKey) -> PathBuf {
    dir.join(format!(
        "{}.keystore",
        bs58::encode(public_key.as_bytes()).into_string()
    ))
}

// ── `k25519 mnemonic` ─────────────────────────────────────────────────────────

fn cmd_mnemonic(words: usize, language: &str) -> Result<()> {
    let length = MnemonicLength::from_word_count(words)?;
    let language: MnemonicLanguage = language.parse()?;
    let phrase = Zeroizing::new(generate_mnemonic(length, language)?);
    println!("{}", phrase.as_str());
    Ok(())
}

// ── `k25519 derive` ───────────────────────────────────────────────────────────

fn cmd_derive(config: &K25519Config, seed: &SeedArgs, path: Option<&str>) -> Result<()> {
    let seed = resolve_seed(seed)?.context("derive needs --mnemonic or --seed-hex")?;
    let path = resolve_path(config, path)?;
    let keypair = Keypair::derive(&seed, &path).context("deriving keypair")?;

    let public_key = keypair.public_key();
    println!("path:        {path}");
    println!("public key:  {}", bs58::encode(public_key.as_bytes()).into_string());
    println!("public hex:  {}", public_key.to_hex());
    Ok(())
}

// ── `k25519 keygen` ───────────────────────────────────────────────────────────

fn cmd_keygen(
    config: &K25519Config,
    seed: &SeedArgs,
    path: Option<&str>,
    out: Option<&Path>,
    kdf: Option<&str>,
    profile: Option<&str>,
    password: &PasswordArgs,
) -> Result<()> {
    let options = keystore_options(config, kdf, profile)?;

    let keypair = match resolve_seed(seed)? {
        Some(seed) => {
            let path = resolve_path(config, path)?;
            info!(path = %path, "deriving keypair from seed");
            Keypair::derive(&seed, &path).context("deriving keypair")?
        }
        None => Keypair::generate().context("generating random keypair")?,
    };

    let public_key = keypair.public_key();
    let out = match out {
        Some(path) => path.to_path_buf(),
        None => default_keystore_path(&config.keystore_dir(), &public_key),
    };

    let password = read_password(password, true)?;
    keypair
        .export_keystore(&out, password.expose_secret().as_bytes(), options)
        .with_context(|| format!("writing keystore: {}", out.display()))?;

    println!("keystore:    {}", out.display());
    println!("public key:  {}", bs58::encode(public_key.as_bytes()).into_string());
    println!("kdf:         {} ({})", options.algorithm, options.profile);
    Ok(())
}

// ── `k25519 inspect` ──────────────────────────────────────────────────────────

fn cmd_inspect(keystore: &Path, password: &PasswordArgs) -> Result<()> {
    let keypair = open_keystore(keystore, password)?;
    let public_key = keypair.public_key();
    let x25519 = keypair.export_ecdh_keypair().public_key();

    println!("public key:  {}", bs58::encode(public_key.as_bytes()).into_string());
    println!("public hex:  {}", public_key.to_hex());
    println!("x25519 key:  {}", bs58::encode(x25519).into_string());
    Ok(())
}

// ── `k25519 sign` / `k25519 verify` ───────────────────────────────────────────

fn cmd_sign(keystore: &Path, message: &str, is_hex: bool, password: &PasswordArgs) -> Result<()> {
    let keypair = open_keystore(keystore, password)?;
    let msg = message_bytes(message, is_hex)?;
    let signature = keypair.sign(&msg);
    println!("{}", bs58::encode(signature.to_bytes()).into_string());
    Ok(())
}

fn cmd_verify(public_key: &str, message: &str, signature: &str, is_hex: bool) -> Result<()> {
    let public_key = PublicKey::from_bytes(decode_base58::<32>("public key", public_key)?);
    let signature = Signature::from_bytes(&decode_base58::<64>("signature", signature)?);
    let msg = message_bytes(message, is_hex)?;

    if verify_message(&public_key, &msg, &signature) {
        println!("valid");
        Ok(())
    } else {
        anyhow::bail!("signature is not valid for this key and message")
    }
}

// ── `k25519 ecdh` ─────────────────────────────────────────────────────────────

fn cmd_ecdh(keystore: &Path, peer: &str, password: &PasswordArgs) -> Result<()> {
    let keypair = open_keystore(keystore, password)?;
    let peer = decode_base58::<32>("peer key", peer)?;
    let shared = Zeroizing::new(keypair.ecdh(&peer).context("computing shared secret")?);
    println!("{}", bs58::encode(shared.as_slice()).into_string());
    Ok(())
}

// ── `k25519 config show` ──────────────────────────────────────────────────────

fn cmd_config_show(config: &K25519Config, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!(
            "# Configuration: defaults (no file at {})",
            config_path.display()
        );
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}
