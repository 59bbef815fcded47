//! CLI entrypoint for tool-onboard
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result};
use clap::Parser;
use onboard_application::{
    DeploymentGateway, OnboardingEngine, OnboardingService, OrchestrationDriver,
    ProcessorRegistry, RepositoryValidator, SubmitToolInput, ToolDiscoveryClient, TransitionBus,
};
use onboard_domain::{ToolId, ToolRecordStore};
use onboard_infrastructure::{
    ConfigLoader, FileConfig, JsonFileToolRecordStore, JsonlTransitionLogger,
    UnconfiguredCollaborator,
};
use onboard_presentation::{
    Cli, Command, ConsoleFormatter, OutputFormat, ProgressReporter, SpecSource, SubmitArgs,
    formatter_for,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const EVENT_BUS_CAPACITY: usize = 1024;
const OBSERVER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

type Store = dyn ToolRecordStore;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The guard flushes the file appender when dropped
    let _log_guard = init_tracing(cli.verbose, cli.log_dir.as_deref());

    info!("Starting tool-onboard");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())?
    };

    if let Command::Config = cli.command {
        return show_config(&cli, &config);
    }

    for issue in config.check()? {
        warn!("{}", issue.message);
    }

    // === Dependency Injection ===
    let store: Arc<Store> = Arc::new(
        JsonFileToolRecordStore::open(&config.store.dir)
            .await
            .with_context(|| format!("opening record store {}", config.store.dir.display()))?,
    );
    let collaborators = Collaborators::from_config(&config)?;
    let params = config.to_engine_params();
    let registry = ProcessorRegistry::standard(
        collaborators.validator,
        collaborators.gateway,
        collaborators.discovery,
        &params,
    )?;
    let bus = TransitionBus::new(EVENT_BUS_CAPACITY);
    let engine = OnboardingEngine::new(store, Arc::new(registry), bus, params);
    let driver = OrchestrationDriver::new(Arc::new(engine), config.to_driver_params());
    let service = OnboardingService::new(Arc::new(driver));

    // === Observers ===
    let mut observers: Vec<JoinHandle<()>> = Vec::new();
    if let Some(path) = &config.events.log_path {
        match JsonlTransitionLogger::new(path) {
            Some(logger) => observers.push(Arc::new(logger).spawn(service.subscribe())),
            None => warn!("Transition log disabled; could not open {}", path.display()),
        }
    }
    let progress = Arc::new(if cli.quiet || cli.output == OutputFormat::Json {
        ProgressReporter::hidden(formatter_for(cli.output))
    } else {
        ProgressReporter::new(formatter_for(cli.output))
    });
    observers.push(Arc::clone(&progress).spawn(service.subscribe()));

    let result = dispatch(&cli, &service).await;

    // Dropping the service closes the bus so observers drain and exit
    drop(service);
    for handle in observers {
        if tokio::time::timeout(OBSERVER_DRAIN_TIMEOUT, handle).await.is_err() {
            warn!("Transition observer did not finish in time");
        }
    }
    let summary = progress.finish();

    let output = result?;
    if !cli.quiet && cli.output == OutputFormat::Text && progress.counts().0 > 0 {
        eprintln!("{}", summary);
    }
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

/// Execute one command, returning what to print on stdout.
async fn dispatch(cli: &Cli, service: &OnboardingService<Store>) -> Result<String> {
    let formatter = formatter_for(cli.output);

    let record = match &cli.command {
        Command::Submit(args) => {
            let input = submission(args).await?;
            if args.review {
                service.submit_for_review(input).await?
            } else {
                let record = service.submit(input).await?;
                service.driver().run_until_idle().await?;
                service.status(record.id()).await?
            }
        }
        Command::Status { id } => service.status(&ToolId::new(id.as_str())).await?,
        Command::List { status } => {
            let records = service.list(*status).await?;
            return Ok(formatter.records(&records));
        }
        Command::Approve { id } => service.admin_complete(&ToolId::new(id.as_str()), true, None).await?,
        Command::Reject { id, reason } => {
            service
                .admin_complete(&ToolId::new(id.as_str()), false, reason.as_deref())
                .await?
        }
        Command::Force { id, status, reason } => {
            let id = ToolId::new(id.as_str());
            service.admin_force(&id, *status, reason).await?;
            service.driver().run_until_idle().await?;
            service.status(&id).await?
        }
        Command::Resubmit { id } => {
            let id = ToolId::new(id.as_str());
            service.admin_resubmit(&id).await?;
            service.driver().run_until_idle().await?;
            service.status(&id).await?
        }
        Command::Run => {
            let recovered = service.driver().recover_until_idle().await?;
            info!("Recovered {} records", recovered);
            return Ok(match cli.output {
                OutputFormat::Json => serde_json::json!({ "recovered": recovered }).to_string(),
                OutputFormat::Text => format!("Recovered {} records", recovered),
            });
        }
        // Rendered before the pipeline is wired
        Command::Config => return Ok(String::new()),
    };

    Ok(formatter.record(&record))
}

async fn submission(args: &SubmitArgs) -> Result<SubmitToolInput> {
    let raw = match args.spec_source() {
        SpecSource::Inline(json) => json.to_string(),
        SpecSource::File(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading deployment spec {}", path.display()))?,
    };
    let spec: serde_json::Value =
        serde_json::from_str(&raw).context("deployment spec is not valid JSON")?;

    let input = SubmitToolInput::new(args.owner.as_str(), args.source_url.as_str(), spec);
    Ok(match &args.id {
        Some(id) => input.with_id(id.as_str()),
        None => input,
    })
}

fn show_config(cli: &Cli, config: &FileConfig) -> Result<()> {
    let issues = config.validate();

    if cli.output == OutputFormat::Json {
        let report = serde_json::json!({
            "config": config,
            "issues": issues.iter().map(|i| i.message.as_str()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Configuration sources (highest priority first):");
    if cli.no_config {
        print!("{}", ConsoleFormatter::format_source("Default", "built-in defaults", true));
    } else {
        for source in ConfigLoader::config_sources(cli.config.as_deref()) {
            print!(
                "{}",
                ConsoleFormatter::format_source(source.label, &source.location, source.found)
            );
        }
    }

    println!("\nEffective configuration:\n");
    println!("{}", toml::to_string_pretty(config)?);

    if !issues.is_empty() {
        print!("{}", ConsoleFormatter::format_issues(&issues));
    }
    Ok(())
}

/// The three remote collaborators, HTTP-backed where an endpoint is set.
struct Collaborators {
    validator: Arc<dyn RepositoryValidator>,
    gateway: Arc<dyn DeploymentGateway>,
    discovery: Arc<dyn ToolDiscoveryClient>,
}

impl Collaborators {
    #[cfg(feature = "http-adapters")]
    fn from_config(config: &FileConfig) -> Result<Self> {
        use onboard_infrastructure::{
            FileDiscoveryConfig, FileGatewayConfig, FileValidatorConfig, HttpDeploymentGateway,
            HttpRepositoryValidator, HttpToolDiscoveryClient,
        };

        let validator: Arc<dyn RepositoryValidator> = match config.validator.endpoint() {
            Some(endpoint) => Arc::new(HttpRepositoryValidator::new(endpoint, config.validator.timeout())?),
            None => Arc::new(UnconfiguredCollaborator::new(FileValidatorConfig::SECTION)),
        };
        let gateway: Arc<dyn DeploymentGateway> = match config.gateway.endpoint() {
            Some(endpoint) => Arc::new(HttpDeploymentGateway::new(endpoint, config.gateway.timeout())?),
            None => Arc::new(UnconfiguredCollaborator::new(FileGatewayConfig::SECTION)),
        };
        let discovery: Arc<dyn ToolDiscoveryClient> = match config.discovery.endpoint() {
            Some(endpoint) => Arc::new(HttpToolDiscoveryClient::new(endpoint, config.discovery.timeout())?),
            None => Arc::new(UnconfiguredCollaborator::new(FileDiscoveryConfig::SECTION)),
        };
        Ok(Self { validator, gateway, discovery })
    }

    #[cfg(not(feature = "http-adapters"))]
    fn from_config(config: &FileConfig) -> Result<Self> {
        use onboard_infrastructure::{FileDiscoveryConfig, FileGatewayConfig, FileValidatorConfig};

        if config.validator.endpoint().is_some()
            || config.gateway.endpoint().is_some()
            || config.discovery.endpoint().is_some()
        {
            warn!("Built without http-adapters; configured endpoints are ignored");
        }
        Ok(Self {
            validator: Arc::new(UnconfiguredCollaborator::new(FileValidatorConfig::SECTION)),
            gateway: Arc::new(UnconfiguredCollaborator::new(FileGatewayConfig::SECTION)),
            discovery: Arc::new(UnconfiguredCollaborator::new(FileDiscoveryConfig::SECTION)),
        })
    }
}

/// Console logging by verbosity, plus a daily file when `log_dir` is set.
fn init_tracing(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(level));

    let (file, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "tool-onboard.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(console).with(file).init();
    guard
}
