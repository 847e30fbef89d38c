//! pdrop: anonymous passphrase file drops
//!
//! Commands:
//!   upload <files...>      - encrypt and store files, print the 24-word passphrase
//!   download [--out DIR]   - fetch and decrypt the files for a passphrase
//!   check [words...]       - report whether a passphrase is complete
//!   config show            - display current configuration
//!   health                 - check that the storage backend is reachable

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use pdrop_core::config::{PdropConfig, StorageBackend};
use pdrop_core::File;
use pdrop_crypto::{KdfParams, Passphrase, WORD_COUNT};
use pdrop_storage::BundleStore;
use pdrop_transfer::{validate_password, ProgressFn, Transfer, TransferError};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "pdrop",
    version,
    about = "Anonymous encrypted file drops, retrieved with a 24-word passphrase",
    long_about = "pdrop: encrypt files client-side, store them under an address derived \
                  from a random secret, and hand out the secret as 24 words"
)]
struct Cli {
    /// Path to pdrop.toml configuration file
    #[arg(long, short = 'c', env = "PDROP_CONFIG", default_value = "~/.config/pdrop/config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "PDROP_LOG")]
    log: Option<String>,

    /// Log format; overrides the config file
    #[arg(long, env = "PDROP_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt and upload files, then print the passphrase that retrieves them
    ///
    /// S3 credentials are read from AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY.
    Upload {
        /// Files to upload, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Store names wrapped as ||name|| so viewers hide them by default
        #[arg(long)]
        spoiler: bool,
    },

    /// Download and decrypt the files for a passphrase
    Download {
        /// The 24 words (prompted for if omitted)
        #[arg(long, env = "PDROP_PASSPHRASE", hide_env_values = true)]
        passphrase: Option<String>,
        /// Directory to write files into
        #[arg(long, short = 'o', default_value = ".")]
        out: PathBuf,
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Check a passphrase for unset or misspelled words without downloading
    Check {
        /// Words to check (prompted for if omitted)
        words: Vec<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Check that the storage backend is reachable
    Health,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);
    let config = PdropConfig::load(&config_path)
        .with_context(|| format!("loading config: {}", config_path.display()))?;

    init_logging(&cli, &config);
    config.warn_if_world_readable(&config_path);
    debug!(config = %config_path.display(), "pdrop starting");

    match cli.command {
        Commands::Upload { files, spoiler } => cmd_upload(&config, &files, spoiler).await,
        Commands::Download { passphrase, out, force } => {
            let passphrase = passphrase.map(SecretString::from);
            cmd_download(&config, passphrase, &out, force).await
        }
        Commands::Check { words } => cmd_check(&words),
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &config_path),
        Commands::Health => cmd_health(&config).await,
    }
}

fn init_logging(cli: &Cli, config: &PdropConfig) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = cli.log.as_deref().unwrap_or(&config.log.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let json = match &cli.log_format {
        Some(LogFormat::Json) => true,
        Some(LogFormat::Text) => false,
        None => config.log.format.eq_ignore_ascii_case("json"),
    };

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

// ── Storage from config + environment credentials ─────────────────────────────

/// Build the bundle store for the configured backend.
///
/// For S3, reads AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY (or the PDROP_
/// equivalents).
fn build_store(config: &PdropConfig) -> Result<BundleStore> {
    let mut storage = config.storage.clone();
    storage.root = expand_tilde(&storage.root);

    let op = if storage.backend == StorageBackend::S3 {
        let access_key = std::env::var("AWS_ACCESS_KEY_ID")
            .or_else(|_| std::env::var("PDROP_ACCESS_KEY_ID"))
            .context(
                "S3 credentials not set\n\
                 Set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY environment variables.\n\
                 Example:\n\
                 \texport AWS_ACCESS_KEY_ID=your-key\n\
                 \texport AWS_SECRET_ACCESS_KEY=your-secret",
            )?;
        let secret_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .or_else(|_| std::env::var("PDROP_SECRET_ACCESS_KEY"))
            .context("AWS_SECRET_ACCESS_KEY environment variable not set")?;
        pdrop_storage::build_from_core_config(&storage, Some((&access_key, &secret_key)))
    } else {
        pdrop_storage::build_from_core_config(&storage, None)
    }
    .context("building storage operator")?;

    Ok(BundleStore::new(op, &storage.prefix))
}

fn kdf_params(config: &PdropConfig) -> KdfParams {
    KdfParams {
        mem_cost_kib: config.crypto.argon2_mem_cost_kib,
        time_cost: config.crypto.argon2_time_cost,
        parallelism: config.crypto.argon2_parallelism,
    }
}

/// Expand `~` in path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(home).join(rest)
    } else {
        path.to_path_buf()
    }
}

// ── Progress helpers ──────────────────────────────────────────────────────────

fn make_progress_bar(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} {spinner} [{bar:20.cyan/blue}] {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn progress_callback(pb: &ProgressBar) -> ProgressFn {
    let pb = pb.clone();
    Box::new(move |done, total, msg| {
        pb.set_length(total);
        pb.set_position(done);
        pb.set_message(msg.to_string());
    })
}

// ── `pdrop upload` ────────────────────────────────────────────────────────────

async fn cmd_upload(config: &PdropConfig, paths: &[PathBuf], spoiler: bool) -> Result<()> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = read_local_file(path).await?;
        files.push(if spoiler && !file.has_spoiler() {
            file.toggle_spoiler()
        } else {
            file
        });
    }

    let total: u64 = files.iter().map(|f| f.content.len() as u64).sum();
    println!("Uploading {} file(s), {}", files.len(), fmt_bytes(total));

    let mut transfer = Transfer::new(build_store(config)?, kdf_params(config));
    let pb = make_progress_bar("upload");
    let progress = progress_callback(&pb);

    let result = transfer.upload(&files, Some(&progress)).await;
    pb.finish_and_clear();
    let passphrase = result.context("upload failed")?;

    info!(state = ?transfer.state(), files = files.len(), "upload finished");

    println!();
    println!("Passphrase (write it down; it is the only way to get these files back):");
    println!();
    print!("{}", format_passphrase_grid(&passphrase));
    println!();
    println!("{passphrase}");
    Ok(())
}

async fn read_local_file(path: &Path) -> Result<File> {
    if !path.is_file() {
        anyhow::bail!("not a file: {}", path.display());
    }
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("no file name: {}", path.display()))?;
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();

    Ok(File::new(name, mime_type, content))
}

/// Four rows of six numbered words
fn format_passphrase_grid(passphrase: &Passphrase) -> String {
    let mut out = String::new();
    for row in 0..WORD_COUNT / 6 {
        for col in 0..6 {
            let slot = row * 6 + col;
            let word = passphrase.get(slot).unwrap_or("_");
            out.push_str(&format!("{:>4}. {:<10}", slot + 1, word));
        }
        out.push('\n');
    }
    out
}

// ── `pdrop download` ──────────────────────────────────────────────────────────

async fn cmd_download(
    config: &PdropConfig,
    passphrase: Option<SecretString>,
    out_dir: &Path,
    force: bool,
) -> Result<()> {
    let secret_text = match passphrase {
        Some(p) => p,
        None => prompt_passphrase()?,
    };
    let passphrase = parse_checked(secret_text.expose_secret())?;

    let mut transfer = Transfer::new(build_store(config)?, kdf_params(config));
    let pb = make_progress_bar("download");
    let progress = progress_callback(&pb);

    let result = transfer.download(&passphrase, Some(&progress)).await;
    pb.finish_and_clear();

    let files = match result {
        Ok(files) => files,
        Err(e) if e.is_wrong_passphrase() => {
            debug!(error = %e, "download rejected");
            anyhow::bail!("nothing found for this passphrase; check the words and try again")
        }
        Err(e) => return Err(e).context("download failed"),
    };

    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("creating dir: {}", out_dir.display()))?;

    let destinations = plan_destinations(out_dir, &files, force)?;

    println!("Downloaded {} file(s):", files.len());
    for (file, dest) in files.iter().zip(&destinations) {
        write_atomic(dest, &file.content, force).await?;
        println!(
            "  {:<40} {:>10}  {}",
            dest.display(),
            fmt_bytes(file.content.len() as u64),
            file.mime_type
        );
    }

    Ok(())
}

/// One unique destination per file, checked up front so an existing file
/// stops the download before anything is written.
fn plan_destinations(out_dir: &Path, files: &[File], force: bool) -> Result<Vec<PathBuf>> {
    let mut used = HashSet::new();
    let mut destinations = Vec::with_capacity(files.len());
    for (i, file) in files.iter().enumerate() {
        let base = safe_file_name(&file.name, i);
        let mut name = base.clone();
        let mut n = i;
        while !used.insert(name.clone()) {
            name = format!("{n}-{base}");
            n += 1;
        }
        destinations.push(out_dir.join(name));
    }

    if !force {
        let existing: Vec<String> = destinations
            .iter()
            .filter(|d| d.exists())
            .map(|d| d.display().to_string())
            .collect();
        if !existing.is_empty() {
            anyhow::bail!(
                "refusing to overwrite {} (use --force)",
                existing.join(", ")
            );
        }
    }

    Ok(destinations)
}

fn prompt_passphrase() -> Result<SecretString> {
    let text = rpassword::prompt_password("Passphrase (24 words): ")
        .context("reading passphrase")?;
    Ok(SecretString::from(text))
}

/// Parse a passphrase and refuse incomplete ones before any network access.
fn parse_checked(text: &str) -> Result<Passphrase> {
    let passphrase = Passphrase::parse(text).map_err(TransferError::InvalidPassphrase)?;
    if !validate_password(&passphrase) {
        anyhow::bail!("{}", describe_problems(&passphrase));
    }
    Ok(passphrase)
}

fn describe_problems(passphrase: &Passphrase) -> String {
    let mut problems = Vec::new();
    let unset = passphrase.unset_slots();
    if !unset.is_empty() {
        problems.push(format!("missing word(s) {}", slot_list(&unset)));
    }
    let invalid = passphrase.invalid_slots();
    if !invalid.is_empty() {
        problems.push(format!("unknown word(s) at {}", slot_list(&invalid)));
    }
    format!("invalid passphrase: {}", problems.join("; "))
}

/// 1-based, comma-separated
fn slot_list(slots: &[usize]) -> String {
    slots
        .iter()
        .map(|s| (s + 1).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reduce an untrusted name to a single path component.
fn safe_file_name(name: &str, index: usize) -> String {
    match Path::new(name).file_name().map(|n| n.to_string_lossy()) {
        Some(n) if !n.is_empty() && n != "." && n != ".." => n.to_string(),
        _ => format!("file-{index}"),
    }
}

async fn write_atomic(dest: &Path, data: &[u8], force: bool) -> Result<()> {
    if dest.exists() && !force {
        anyhow::bail!(
            "refusing to overwrite {} (use --force)",
            dest.display()
        );
    }

    let tmp = dest.with_extension("pdrop_tmp");
    tokio::fs::write(&tmp, data)
        .await
        .with_context(|| format!("writing tmp: {}", tmp.display()))?;
    tokio::fs::rename(&tmp, dest)
        .await
        .with_context(|| format!("renaming to: {}", dest.display()))?;
    Ok(())
}

// ── `pdrop check` ─────────────────────────────────────────────────────────────

fn cmd_check(words: &[String]) -> Result<()> {
    let text = if words.is_empty() {
        prompt_passphrase()?
    } else {
        SecretString::from(words.join(" "))
    };

    let passphrase = Passphrase::parse(text.expose_secret())?;
    if validate_password(&passphrase) {
        println!("ok: all {WORD_COUNT} words are valid");
        Ok(())
    } else {
        anyhow::bail!("{}", describe_problems(&passphrase))
    }
}

// ── `pdrop config show` ───────────────────────────────────────────────────────

fn cmd_config_show(config: &PdropConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

// ── `pdrop health` ────────────────────────────────────────────────────────────

async fn cmd_health(config: &PdropConfig) -> Result<()> {
    let store = build_store(config)?;
    store.check_health().await.context("storage health check failed")?;
    println!("storage ok ({:?}: {})", config.storage.backend, config.storage.bucket);
    Ok(())
}

fn fmt_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
