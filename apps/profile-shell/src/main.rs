use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use modkit::{ClientHub, TracedClient};
use profile_view::client::{AccountApi, AuthApi};
use profile_view::domain::avatar::AvatarResolver;
use profile_view::domain::preview::PreviewRegistry;
use profile_view::domain::session::SessionContext;
use profile_view::gateways::InMemoryProfileService;
use profile_view::infra::http::HttpProfileClient;
use profile_view::model::Credential;
use profile_view::{ProfileDeps, ProfileViewConfig, ProfileViewModel, SubmitOutcome};
use runtime::{AppConfig, CliArgs};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use url::Url;

mod shell;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MODULE_NAME: &str = "profile_view";

/// Profile Shell - account, profile and bookings screen in the terminal
#[derive(Parser)]
#[command(name = "profile-shell")]
#[command(about = "Profile Shell - account, profile and bookings screen in the terminal")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the auth/profile service (overrides config)
    #[arg(short, long)]
    base_url: Option<String>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory service with a demo account instead of HTTP
    #[arg(long)]
    mock: bool,

    /// Restore a session from a previously issued token
    #[arg(long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive shell
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI args passed down to config/app
    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        base_url: cli.base_url.clone(),
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;

    // Apply CLI overrides (base url / verbosity)
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.client.home_dir));
    tracing::info!("Profile Shell starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_shell(config, args, cli.token).await,
        Commands::Check => check_config(config),
    }
}

/// Register the service ports in a hub: HTTP by default, in-memory with `--mock`.
fn register_clients(hub: &ClientHub, config: &AppConfig, module: &ProfileViewConfig, mock: bool) -> Result<()> {
    if mock {
        tracing::warn!("--mock: using the in-memory service (demo@example.com / password123)");
        let svc = Arc::new(InMemoryProfileService::with_demo_account());
        hub.register::<dyn AuthApi>(svc.clone());
        hub.register::<dyn AccountApi>(svc);
        return Ok(());
    }

    let base = Url::parse(&config.client.base_url)
        .with_context(|| format!("Invalid client.base_url '{}'", config.client.base_url))?;
    let timeout = (config.client.timeout_sec > 0).then(|| Duration::from_secs(config.client.timeout_sec));
    let http = TracedClient::with_timeout(timeout).context("Failed to build HTTP client")?;
    let client = Arc::new(HttpProfileClient::new(http, base, module.endpoints.clone()));
    tracing::info!(base_url = %client.base_url(), "using HTTP service");

    hub.register::<dyn AuthApi>(client.clone());
    hub.register::<dyn AccountApi>(client);
    Ok(())
}

fn avatar_resolver(config: &AppConfig, module: &ProfileViewConfig) -> Result<AvatarResolver> {
    let mut base = Url::parse(&config.client.base_url)
        .with_context(|| format!("Invalid client.base_url '{}'", config.client.base_url))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let storage = base
        .join(module.storage_path.trim_start_matches('/'))
        .with_context(|| format!("Invalid storage_path '{}'", module.storage_path))?;
    Ok(AvatarResolver::new(storage, module.placeholder_avatar_base.clone()))
}

async fn run_shell(config: AppConfig, args: CliArgs, token: Option<String>) -> Result<()> {
    let module: ProfileViewConfig = config.module_config(MODULE_NAME)?;

    let hub = ClientHub::new();
    register_clients(&hub, &config, &module, args.mock)?;
    tracing::debug!(clients = ?hub.registered(), "clients registered");

    let deps = ProfileDeps::from_hub(&hub, PreviewRegistry::new(), avatar_resolver(&config, &module)?)?;
    let vm = ProfileViewModel::mount(deps, SessionContext::new());

    let mut stdout = tokio::io::stdout();
    if let Some(token) = token {
        if vm.restore(Credential::new(token)).await == SubmitOutcome::Succeeded {
            tracing::info!("session restored from token");
        }
    }
    let banner = format!("{}type 'help' for commands\n", shell::render(&vm.snapshot()));
    stdout.write_all(banner.as_bytes()).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read input")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        let mut out = String::new();
        match shell::parse(&line) {
            Ok(None) => continue,
            Ok(Some(cmd)) => match shell::execute(&vm, cmd, &mut out).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => out.push_str(&format!("error: {e:#}\n")),
            },
            Err(msg) => {
                out.push_str(&msg);
                out.push('\n');
            }
        }
        stdout.write_all(out.as_bytes()).await?;
    }

    vm.unmount();
    tracing::info!("Profile Shell stopped");
    Ok(())
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let module: ProfileViewConfig = config.module_config(MODULE_NAME)?;
    Url::parse(&config.client.base_url)
        .with_context(|| format!("Invalid client.base_url '{}'", config.client.base_url))?;
    avatar_resolver(&config, &module)?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
