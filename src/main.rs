//! Command line front end for the ACME v01 client.

use std::{
    ffi::OsString,
    io::{self, BufRead as _, Write as _},
    path::{Path, PathBuf},
};

use clap::{CommandFactory as _, Parser, ValueEnum};
use eyre::{eyre, WrapErr as _};

use acme_v01::{safe_name, AcmeClient, Config, KeyGenerator as _, OpensslKeyGen};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Cmd {
    /// Authorize the domain and obtain a certificate
    Add,
    /// Generate a key pair and certificate signing request only
    Csr,
    /// Show the account profile held by the server
    Info,
    /// Register a new account
    Reg,
    /// Show this help text
    Help,
}

#[derive(Debug, Parser)]
#[command(name = "acme-v01")]
#[command(version, about = "Obtain TLS certificates from an ACME v01 (draft) provider")]
struct Cli {
    /// Operation to run
    #[arg(short = 'c', long = "cmd", value_enum, default_value_t = Cmd::Help)]
    cmd: Cmd,

    /// Domain name to operate on
    #[arg(short, long)]
    domain: Option<String>,

    /// Contact email; overrides any address found on the profile
    #[arg(short, long)]
    email: Option<String>,

    /// Account key PEM file; generated when missing
    #[arg(short, long, default_value = "account.pem")]
    key_file: PathBuf,

    /// Path fragment under the webroot where challenge files are published
    #[arg(short = 'l', long, default_value = "/.well-known/acme-challenge/")]
    well_known_path: String,

    /// Requested certificate validity in days
    #[arg(short = 'n', long, default_value_t = 1)]
    days: i64,

    /// Organization name for the certificate request
    #[arg(short, long, default_value = "")]
    organization: String,

    /// Country code for the certificate request
    #[arg(long, default_value = "")]
    country: String,

    /// RSA key size for generated keys
    #[arg(short = 'r', long, default_value_t = 2048)]
    rsa_bits: u32,

    /// ACME directory URL
    #[arg(
        short = 'u',
        long,
        default_value = "https://acme-v01.api.letsencrypt.org/directory"
    )]
    url: String,

    /// Echo sent payloads and received headers and bodies
    #[arg(short, long)]
    verbose: bool,

    /// Directory under which the challenge path lives
    #[arg(short, long, default_value = ".")]
    webroot: PathBuf,

    /// Never pause for confirmation
    #[arg(short = 'y', long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "trace" } else { "info" };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));

    match cli.cmd {
        Cmd::Help => {
            Cli::command().print_long_help()?;
            Ok(())
        }
        Cmd::Csr => generate_csr(&cli),
        Cmd::Info => show_profile(cli).await,
        Cmd::Reg => register_account(cli).await,
        Cmd::Add => add_certificate(cli).await,
    }
}

fn build_client(cli: &Cli) -> eyre::Result<AcmeClient> {
    let config = Config {
        directory_url: cli.url.clone(),
        days_valid: cli.days,
        default_rsa_key_size: cli.rsa_bits,
        email_override: cli.email.clone(),
        webroot: cli.webroot.clone(),
        well_known_path: cli.well_known_path.clone(),
        with_interaction: !cli.yes,
        ..Config::default()
    };

    if !cli.key_file.exists() {
        log::info!("Generating account key at {}", cli.key_file.display());
        OpensslKeyGen.account_key(cli.rsa_bits, &cli.key_file)?;
    }

    let pem = std::fs::read_to_string(&cli.key_file)
        .wrap_err_with(|| format!("failed to read {}", cli.key_file.display()))?;

    let mut client = AcmeClient::from_pem(config, &pem)?;

    if !cli.yes {
        client.set_pause(|| {
            print!("Challenge file is in place; press enter to continue... ");
            io::stdout().flush().ok();

            let mut line = String::new();
            io::stdin().lock().read_line(&mut line).ok();
        });
    }

    Ok(client)
}

fn generate_csr(cli: &Cli) -> eyre::Result<()> {
    let domain = required_domain(cli)?;
    let name = safe_name(&domain, false);
    let email = cli
        .email
        .clone()
        .unwrap_or_else(|| format!("hostmaster@{domain}"));

    OpensslKeyGen.domain_key_and_csr(
        Path::new("."),
        cli.rsa_bits,
        &cli.country,
        &cli.organization,
        &name,
        &email,
    )?;

    log::info!("Wrote {name}.key and {name}.csr");
    Ok(())
}

async fn show_profile(cli: Cli) -> eyre::Result<()> {
    let mut client = build_client(&cli)?;

    let profile = client.get_profile().await?;
    println!("{}", serde_json::to_string_pretty(&profile)?);

    Ok(())
}

async fn register_account(cli: Cli) -> eyre::Result<()> {
    let email = cli
        .email
        .clone()
        .ok_or_else(|| eyre!("--email is required to register an account"))?;

    let mut client = build_client(&cli)?;

    let reg_url = client.create_account(&email).await?;
    log::info!("Account registered at {reg_url}");

    Ok(())
}

async fn add_certificate(cli: Cli) -> eyre::Result<()> {
    let domain = required_domain(&cli)?;
    let mut client = build_client(&cli)?;

    ensure_well_known(&cli.webroot, &cli.well_known_path)?;

    log::info!("Authorizing {domain}");
    client.authorize_domain(&domain).await?;
    log::info!("Domain {domain} authorized");

    log::info!("Requesting certificate for {domain}");
    let certificate = client
        .request_certificate(&domain, &cli.organization, &cli.country)
        .await?;

    match certificate.valid_days_left() {
        Ok(days) => log::info!(
            "Certificate for {domain} issued; valid for {days} more days"
        ),
        Err(_) => log::info!("Certificate for {domain} issued"),
    }

    Ok(())
}

fn required_domain(cli: &Cli) -> eyre::Result<String> {
    cli.domain
        .clone()
        .ok_or_else(|| eyre!("--domain is required for this command"))
}

/// The collaborator contract: the challenge directory exists before authorization runs.
fn ensure_well_known(webroot: &Path, well_known_path: &str) -> eyre::Result<()> {
    let mut dir = OsString::from(webroot);
    dir.push(well_known_path);
    let dir = PathBuf::from(dir);

    std::fs::create_dir_all(&dir)
        .wrap_err_with(|| format!("failed to create {}", dir.display()))?;

    Ok(())
}
