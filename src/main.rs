use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use pagecheck_engine::api::simple::init_tracing;
use pagecheck_engine::config::{
    EngineConfig, OrchestratorConfig, DEFAULT_ATTEMPT_TIMEOUT_MS, DEFAULT_BACKOFF_UNIT_MS,
    DEFAULT_BIND_ADDR, DEFAULT_CACHE_TTL_MS, DEFAULT_MAX_ATTEMPTS, GATE_POLL_INTERVAL_MS,
};
use pagecheck_engine::server::handler::AuditServer;
use pagecheck_engine::source::lighthouse::LighthouseEngine;
use pagecheck_engine::Orchestrator;

/// Page audit server.
#[derive(Debug, Parser)]
#[command(name = "pagecheck-server", version, about)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "PAGECHECK_BIND", default_value = DEFAULT_BIND_ADDR)]
    bind: String,

    /// Cache entry lifetime in milliseconds.
    #[arg(long, env = "PAGECHECK_CACHE_TTL_MS", default_value_t = DEFAULT_CACHE_TTL_MS)]
    cache_ttl_ms: u64,

    /// Maximum cached entries; unbounded when omitted.
    #[arg(long, env = "PAGECHECK_CACHE_CAPACITY")]
    cache_capacity: Option<usize>,

    /// Engine attempts per audit run.
    #[arg(long, env = "PAGECHECK_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Linear backoff unit in milliseconds.
    #[arg(long, env = "PAGECHECK_BACKOFF_UNIT_MS", default_value_t = DEFAULT_BACKOFF_UNIT_MS)]
    backoff_unit_ms: u64,

    /// Sample this many runs per audit and keep the median one.
    #[arg(long, env = "PAGECHECK_MEDIAN_RUNS")]
    median_runs: Option<usize>,

    /// Deadline for a single engine attempt in milliseconds; 0 disables it.
    #[arg(long, env = "PAGECHECK_ATTEMPT_TIMEOUT_MS", default_value_t = DEFAULT_ATTEMPT_TIMEOUT_MS)]
    attempt_timeout_ms: u64,

    /// Lighthouse executable.
    #[arg(long, env = "PAGECHECK_LIGHTHOUSE_BIN", default_value = "lighthouse")]
    lighthouse_bin: String,

    /// Extra argument placed before the audit arguments (repeatable),
    /// e.g. `--lighthouse-bin npx --lighthouse-arg lighthouse`.
    #[arg(long = "lighthouse-arg")]
    lighthouse_args: Vec<String>,

    /// Flags passed to headless Chrome.
    #[arg(long, env = "PAGECHECK_CHROME_FLAGS")]
    chrome_flags: Option<String>,
}

impl Args {
    fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            cache_ttl_ms: self.cache_ttl_ms,
            cache_capacity: self.cache_capacity,
            max_attempts: self.max_attempts,
            backoff_unit_ms: self.backoff_unit_ms,
            median_runs: self.median_runs,
            attempt_timeout_ms: (self.attempt_timeout_ms > 0).then_some(self.attempt_timeout_ms),
            gate_poll_interval_ms: GATE_POLL_INTERVAL_MS,
        }
    }

    fn engine_config(&self) -> EngineConfig {
        let mut cfg = EngineConfig {
            binary: self.lighthouse_bin.clone(),
            base_args: self.lighthouse_args.clone(),
            ..EngineConfig::default()
        };
        if let Some(flags) = &self.chrome_flags {
            cfg.chrome_flags = flags.clone();
        }
        cfg
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let engine = Arc::new(LighthouseEngine::new(args.engine_config()));
    let orchestrator = Arc::new(
        Orchestrator::new(engine, &args.orchestrator_config())
            .context("invalid orchestrator configuration")?,
    );

    let server = AuditServer::start(orchestrator, &args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    server.shutdown().await;
    Ok(())
}
