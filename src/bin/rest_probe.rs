//! rest-probe — send one request through the full pipeline and print the outcome.
//!
//! Usage:
//!   rest-probe <METHOD> <URL> [OPTIONS]
//!
//! Exits 0 on success, 1 on a request failure, 2 on usage or configuration errors.

use anyhow::{anyhow, bail, Context};
use rest_pipeline::{
    AuthInterceptor, CallOptions, LoggingInterceptor, Method, PipelineConfig, RestClientBuilder,
};
use tracing_subscriber::EnvFilter;

struct Args {
    method: Method,
    url: String,
    config_path: Option<String>,
    base_url: Option<String>,
    timeout_ms: Option<u64>,
    retries: Option<u32>,
    api_key: Option<String>,
    headers: Vec<(String, String)>,
    data: Option<serde_json::Value>,
}

fn print_usage() {
    println!(
        r#"rest-probe — send one request through the rest-pipeline stack

USAGE:
    rest-probe <METHOD> <URL> [OPTIONS]

OPTIONS:
    --config <path>         Load a YAML pipeline config
    --base <url>            Base URL for relative request URLs
    --timeout-ms <n>        Per-call timeout in milliseconds
    --retries <n>           Enable retries with at most n re-dispatches
    --api-key <key>         Add ?api_key=<key> to the request
    -H, --header <k:v>      Extra request header (repeatable)
    -d, --data <json>       JSON request body
    -h, --help              Show this help message

ENVIRONMENT:
    REST_PIPELINE_BASE_URL, REST_PIPELINE_TIMEOUT_MS, REST_PIPELINE_MAX_RETRIES
    RUST_LOG                Log filter (default: rest_pipeline=info)"#
    );
}

fn parse_args(raw: &[String]) -> anyhow::Result<Args> {
    if raw.len() < 2 {
        bail!("expected <METHOD> <URL>");
    }
    let method: Method = raw[0].parse().map_err(|e| anyhow!("{}", e))?;
    let mut args = Args {
        method,
        url: raw[1].clone(),
        config_path: None,
        base_url: None,
        timeout_ms: None,
        retries: None,
        api_key: None,
        headers: Vec::new(),
        data: None,
    };

    let mut rest = raw[2..].iter();
    while let Some(flag) = rest.next() {
        let mut value = || {
            rest.next()
                .cloned()
                .ok_or_else(|| anyhow!("missing value for {}", flag))
        };
        match flag.as_str() {
            "--config" => args.config_path = Some(value()?),
            "--base" => args.base_url = Some(value()?),
            "--timeout-ms" => {
                args.timeout_ms = Some(value()?.parse::<u64>().context("--timeout-ms expects a number")?)
            }
            "--retries" => {
                args.retries = Some(value()?.parse::<u32>().context("--retries expects a number")?)
            }
            "--api-key" => args.api_key = Some(value()?),
            "-H" | "--header" => {
                let raw = value()?;
                let (k, v) = raw
                    .split_once(':')
                    .ok_or_else(|| anyhow!("header must be <name>:<value>, got {}", raw))?;
                args.headers.push((k.trim().to_string(), v.trim().to_string()));
            }
            "-d" | "--data" => {
                args.data = Some(serde_json::from_str(&value()?).context("--data must be JSON")?)
            }
            other => bail!("unknown option: {}", other),
        }
    }
    Ok(args)
}

async fn run(args: Args) -> anyhow::Result<bool> {
    let mut config = match &args.config_path {
        Some(path) => PipelineConfig::from_yaml_file(path)?,
        None => PipelineConfig::default(),
    }
    .with_env_overrides()?;
    if let Some(base) = args.base_url {
        config.base_url = Some(base);
    }
    if let Some(ms) = args.timeout_ms {
        config.timeout_ms = ms;
    }
    if let Some(n) = args.retries {
        config.retry = Some(config.retry.take().unwrap_or_default().with_max_retries(n));
    }

    let mut builder = RestClientBuilder::from_config(config);
    if let Some(key) = args.api_key {
        builder = builder.interceptor(AuthInterceptor::new(key));
    }
    let client = builder
        .interceptor(LoggingInterceptor::new().with_level(tracing::Level::INFO))
        .build()?;

    let mut options = CallOptions::new();
    for (k, v) in args.headers {
        options = options.header(k, v);
    }
    if let Some(body) = args.data {
        options = options.body(body);
    }

    match client.execute(args.method, &args.url, options).await {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response.data)?);
            Ok(true)
        }
        Err(failure) => {
            eprintln!("{} [{} {}]", failure, failure.kind().code(), failure.kind().name());
            if let Some(code) = failure.code() {
                eprintln!("server code: {}", code);
            }
            Ok(false)
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rest_pipeline=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    if raw.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return;
    }

    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {:#}", e);
            eprintln!();
            print_usage();
            std::process::exit(2);
        }
    };

    match run(args).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(2);
        }
    }
}
