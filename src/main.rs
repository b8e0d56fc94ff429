use crate::data::ArgumentModel;
use crate::engine::process::ProcessEngine;
use crate::utils::path::normalize;
use clap::Parser;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

mod cli;
pub(crate) mod data;
pub(crate) mod engine;
pub(crate) mod signer;
mod utils;

/// Re-sign an iOS application bundle or archive.
#[derive(Parser, Debug)]
#[command(name = "isign", version)]
struct Cli {
    /// The app bundle or archive to re-sign
    #[arg(value_name = "APP_PATH")]
    app_path: String,

    /// Add a provisioning profile
    #[arg(short = 'p', long = "provisioning-profile", value_name = "PATH")]
    provisioning_profile: Vec<String>,

    /// Apple certificate path override
    #[arg(short = 'a', long = "apple-cert", value_name = "PATH")]
    apple_cert: Option<String>,

    /// Organization key path
    #[arg(short = 'k', long = "key", value_name = "PATH")]
    key: Option<String>,

    /// Organization certificate path
    #[arg(short = 'c', long = "certificate", value_name = "PATH")]
    certificate: Option<String>,

    /// Directory holding key, certificate and profiles under conventional
    /// names (incompatible with -k, -c and -p)
    #[arg(short = 'n', long = "credentials", value_name = "DIR")]
    credentials: Option<String>,

    /// Output path
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: Option<String>,

    /// Debug-level logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Comma-separated key=value Info.plist overrides
    #[arg(short = 'i', long = "info", value_name = "PROPS")]
    info: Option<String>,

    /// Describe the bundle only, do not sign
    #[arg(short = 'd', long = "display")]
    display: bool,

    /// Entitlements plist path, matched by bundle identifier
    #[arg(short = 'e', long = "entitlements", value_name = "PATH")]
    entitlements: Vec<String>,

    /// Sign only the outer bundle, not nested sub-bundles
    #[arg(long)]
    shallow: bool,

    /// Write the signed output over the input path
    #[arg(long)]
    inplace: bool,

    /// Dotted name of an alternate signer implementation
    #[arg(long = "signer", value_name = "NAME")]
    signer: Option<String>,

    /// key=value argument for the alternate signer
    #[arg(long = "signerArg", value_name = "KEY=VALUE")]
    signer_arg: Vec<String>,

    /// Sign with an empty ad hoc signature, no credential files
    #[arg(long)]
    adhoc: bool,
}

/// Resolve the raw command line into the argument model, normalizing every
/// path-typed option.
fn build_model(cli: Cli) -> ArgumentModel {
    ArgumentModel {
        app_path: normalize(&cli.app_path),
        provisioning_profiles: cli
            .provisioning_profile
            .iter()
            .map(|p| normalize(p))
            .collect(),
        entitlements_paths: cli.entitlements.iter().map(|p| normalize(p)).collect(),
        key: cli.key.as_deref().map(normalize),
        certificate: cli.certificate.as_deref().map(normalize),
        apple_cert: cli.apple_cert.as_deref().map(normalize),
        credentials_dir: cli.credentials.as_deref().map(normalize),
        output_path: cli.output.as_deref().map(normalize),
        info: cli.info,
        verbose: cli.verbose,
        display_only: cli.display,
        deep: !cli.shallow,
        inplace: cli.inplace,
        adhoc: cli.adhoc,
        signer: cli.signer,
        signer_args: cli.signer_arg,
        signer_class: None,
        signer_arguments: None,
    }
}

fn setup_logger(model: &ArgumentModel) {
    let log_level = match model.verbose {
        true => LevelFilter::Debug,
        false => LevelFilter::Info,
    };

    TermLogger::init(
        log_level,
        ConfigBuilder::new()
            .set_time_level(LevelFilter::Debug)
            .set_max_level(LevelFilter::Debug)
            .build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .expect("Unable to setup logging");

    log::debug!("Log Level: {log_level}");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let model = build_model(Cli::parse());

    setup_logger(&model);

    let engine = ProcessEngine::from_env();

    cli::run(model, &engine).await
}
