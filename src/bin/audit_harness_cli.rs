use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use audit_harness::config::HarnessConfig;
use audit_harness::message::kinds::REGISTRY;
use audit_harness::{AuditorRun, Bridge, CheckRequest, FixtureServer, Harness, RunRequest};
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "audit_harness_cli",
    about = "Local fixture server and HTTP auditor checks"
)]
struct Cli {
    /// JSON config file (defaults to $AUDIT_HARNESS_CONFIG or audit_harness.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the directory served under /static
    #[arg(long)]
    static_root: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the fixture server until Ctrl-C
    Serve {
        #[arg(long)]
        bind: Option<std::net::SocketAddr>,
    },
    /// Start a fixture, audit one path on it and evaluate the result
    Check {
        #[arg(long, default_value = "/hello")]
        path: String,
        #[arg(long, default_value = "GET")]
        method: String,
        /// Request body
        #[arg(long)]
        data: Option<String>,
        /// Request header as "Name: value"; repeatable, order kept
        #[arg(long = "header")]
        headers: Vec<String>,
        #[arg(long, default_value_t = 200)]
        expect_status: u16,
        /// Warning kind to allow; repeatable
        #[arg(long = "allow")]
        allowed: Vec<String>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Audit any http URL and print the terminal run state
    Audit {
        #[arg(long)]
        url: String,
        #[arg(long, default_value = "GET")]
        method: String,
        #[arg(long)]
        data: Option<String>,
        #[arg(long = "header")]
        headers: Vec<String>,
    },
    /// List the message kinds the auditor can emit
    Kinds,
}

fn main() -> ExitCode {
    audit_harness::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => HarnessConfig::load_from_file(path),
        None => HarnessConfig::load(),
    };
    if let Some(root) = cli.static_root {
        config.fixture = config.fixture.with_static_root(root);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building CLI runtime")?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(addr) = bind {
                config.fixture.bind_addr = addr;
            }
            runtime.block_on(run_serve(config))
        }
        Commands::Check {
            path,
            method,
            data,
            headers,
            expect_status,
            allowed,
            output,
        } => {
            let mut request = CheckRequest::new(path)
                .method(method)
                .expect_status(expect_status);
            if let Some(body) = data {
                request = request.body(body);
            }
            for (name, value) in parse_headers(&headers)? {
                request = request.header(name, value);
            }
            for kind in allowed {
                request = request.allow(kind);
            }
            runtime.block_on(run_check(config, request, output))
        }
        Commands::Audit {
            url,
            method,
            data,
            headers,
        } => {
            let mut request = RunRequest::new(url).method(method);
            if let Some(body) = data {
                request = request.body(body);
            }
            request.headers = parse_headers(&headers)?;
            runtime.block_on(run_audit(config, request))
        }
        Commands::Kinds => run_kinds(),
    }
}

fn parse_headers(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|line| match line.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.trim().to_string()))
            }
            _ => bail!("header '{line}' is not in 'Name: value' form"),
        })
        .collect()
}

async fn run_serve(config: HarnessConfig) -> Result<ExitCode> {
    let server = FixtureServer::start(&config.fixture).await?;
    println!("{}", server.base_url());
    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    server.shutdown().await?;
    Ok(ExitCode::from(0))
}

async fn run_check(
    config: HarnessConfig,
    request: CheckRequest,
    output_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let harness = Harness::start(config).await?;
    let outcome = harness.check_url(request).await;
    harness.shutdown().await?;

    match outcome {
        Ok(report) => {
            let json = serde_json::to_string_pretty(&report)?;
            if let Some(path) = output_path {
                fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            } else {
                println!("{json}");
            }
            Ok(ExitCode::from(0))
        }
        Err(failure) => {
            eprintln!("{}", serde_json::to_string_pretty(&failure.to_json())?);
            Ok(ExitCode::from(2))
        }
    }
}

async fn run_audit(config: HarnessConfig, request: RunRequest) -> Result<ExitCode> {
    let bridge = Bridge::new();
    let state = bridge
        .run(AuditorRun::new(request, config.auditor))
        .await;
    println!("{}", serde_json::to_string_pretty(&state)?);
    if state.is_completed() {
        Ok(ExitCode::from(0))
    } else {
        Ok(ExitCode::from(2))
    }
}

#[derive(Serialize)]
struct KindEntry<'a> {
    kind: &'a str,
    level: &'a str,
    category: &'a str,
}

fn run_kinds() -> Result<ExitCode> {
    for (kind, level, category) in REGISTRY {
        let entry = KindEntry {
            kind: kind.as_str(),
            level: level.as_str(),
            category: *category,
        };
        println!("{}", serde_json::to_string(&entry)?);
    }
    Ok(ExitCode::from(0))
}
