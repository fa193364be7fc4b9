/// CLI argument parsing and command execution.
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{Provider, SamplingParams, TestConfig};
use crate::error::AppError;
use crate::http::client::ChatClientEnum;
use crate::loadgen::generator::LoadGenerator;
use crate::loadgen::prompts::variable_length_prompts;
use crate::loadgen::report::{AggregateReport, StatSummary};

/// Llmload - Load-test LLM chat-completion endpoints.
#[derive(Parser, Debug)]
#[command(name = "llmload")]
#[command(about = "Load-testing harness for LLM chat-completion endpoints")]
#[command(
    long_about = r#"Llmload - Load-testing harness for LLM chat-completion endpoints

Drives prompt traffic against OpenAI, Anthropic, or any OpenAI-compatible
endpoint under two traffic shapes, and aggregates latency and throughput
statistics (mean, p50, p95, p99, min, max over successful requests).

TRAFFIC SHAPES:
  • batch:     a fixed list of prompts issued in concurrency-bounded chunks
  • sustained: one prompt repeated at a target rate for a fixed duration

Output token counts are approximated from response length (characters / 4),
so throughput numbers are directional, not exact.

EXAMPLES:
  # 20 copies of one prompt, 5 at a time
  llmload batch --model gpt-4o-mini --prompt "Summarize exercise benefits." \
      --repeat 20 --concurrency 5

  # Variable-length prompt sweep against a self-hosted endpoint
  llmload batch --provider generic --endpoint http://localhost:8000/v1/chat/completions \
      --model my-model --base-prompt "Explain quantum computing" \
      --n-prompts 15 --min-length 100 --max-length 2000 --concurrency 3

  # 2 requests/second for 30 seconds
  llmload sustained --model claude-3-sonnet --provider anthropic \
      --prompt "What are the benefits of meditation?" --rps 2 --duration-secs 30"#
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Batched latency test: issue prompts in concurrency-bounded chunks
    Batch {
        #[command(flatten)]
        backend: BackendArgs,

        #[command(flatten)]
        prompt: PromptArgs,

        /// Repeat the (single) prompt this many times
        #[arg(long, default_value = "1")]
        repeat: usize,

        /// Number of concurrent requests per chunk
        #[arg(short, long, default_value = "1")]
        concurrency: usize,

        /// Generate variable-length prompts from this base prompt
        #[arg(long, conflicts_with_all = ["prompt", "prompt_file"])]
        base_prompt: Option<String>,

        /// Number of generated prompts (with --base-prompt)
        #[arg(long, default_value = "10", requires = "base_prompt")]
        n_prompts: usize,

        /// Minimum generated prompt length in characters
        #[arg(long, default_value = "100", requires = "base_prompt")]
        min_length: usize,

        /// Maximum generated prompt length in characters
        #[arg(long, default_value = "1000", requires = "base_prompt")]
        max_length: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output_format: OutputFormat,
    },

    /// Sustained-rate test: repeat one prompt at a target rate for a duration
    Sustained {
        #[command(flatten)]
        backend: BackendArgs,

        #[command(flatten)]
        prompt: PromptArgs,

        /// Target request rate in requests per second
        #[arg(long)]
        rps: f64,

        /// Test duration in seconds
        #[arg(long)]
        duration_secs: u64,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output_format: OutputFormat,
    },
}

/// Backend selection and connection options shared by both test shapes.
#[derive(Args, Debug)]
pub struct BackendArgs {
    /// Model to use (e.g., gpt-4o-mini, claude-3-sonnet)
    #[arg(short, long)]
    pub model: String,

    /// Target provider
    #[arg(long, value_enum, default_value = "openai")]
    pub provider: Provider,

    /// API endpoint URL (uses the provider default if not specified;
    /// required for the generic provider)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// API key (or use OPENAI_API_KEY / ANTHROPIC_API_KEY / API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// System prompt sent with every request
    #[arg(long)]
    pub system_prompt: Option<String>,

    /// Sampling temperature
    #[arg(long, default_value = "0.7")]
    pub temperature: f64,

    /// Nucleus sampling parameter
    #[arg(long, default_value = "1.0")]
    pub top_p: f64,

    /// Maximum output tokens per completion
    #[arg(long, default_value = "1000")]
    pub max_tokens: u32,

    /// Skip TLS certificate validation (self-signed test endpoints)
    #[arg(long)]
    pub insecure: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "60")]
    pub timeout_secs: u64,

    /// Directory to persist the aggregate report into
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

/// Prompt source options.
#[derive(Args, Debug)]
pub struct PromptArgs {
    /// Prompt text
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// File with prompts, one per line (batch) or a single prompt (sustained);
    /// stdin is read when neither --prompt nor --prompt-file is given
    #[arg(long)]
    pub prompt_file: Option<PathBuf>,
}

/// Output format for the aggregate report.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    pub fn run(&self) -> Result<(), AppError> {
        match &self.command {
            Command::Batch {
                backend,
                prompt,
                repeat,
                concurrency,
                base_prompt,
                n_prompts,
                min_length,
                max_length,
                output_format,
            } => {
                let prompts = if let Some(base) = base_prompt {
                    variable_length_prompts(base, *n_prompts, *min_length, *max_length)?
                } else {
                    let mut prompts = prompt.read_lines()?;
                    if *repeat > 1 {
                        if prompts.len() != 1 {
                            return Err(AppError::Config(
                                "--repeat requires exactly one prompt".to_string(),
                            ));
                        }
                        prompts = vec![prompts[0].clone(); *repeat];
                    }
                    prompts
                };

                let config = backend.to_config()?;
                let generator = build_generator(config)?;

                eprintln!(
                    "Starting batch test: {} prompts at concurrency {} against '{}'",
                    prompts.len(),
                    concurrency,
                    generator.config().provider.as_str()
                );

                let rt = runtime()?;
                let progress_bar = Some(Arc::new(progress_bar(prompts.len() as u64)));
                let report = rt.block_on(generator.run_batched_with_progress(
                    &prompts,
                    *concurrency,
                    progress_bar,
                ))?;

                display_report(&report, *output_format)?;
                if let Some(path) = generator.persist(&report, "batch")? {
                    eprintln!("Report saved to {}", path.display());
                }
                Ok(())
            }
            Command::Sustained {
                backend,
                prompt,
                rps,
                duration_secs,
                output_format,
            } => {
                let prompt = prompt.read_single()?;
                let config = backend.to_config()?;
                let generator = build_generator(config)?;

                eprintln!(
                    "Starting sustained test: {:.2} req/s for {}s against '{}'",
                    rps,
                    duration_secs,
                    generator.config().provider.as_str()
                );

                let rt = runtime()?;
                let report = rt.block_on(generator.run_sustained(
                    &prompt,
                    *rps,
                    Duration::from_secs(*duration_secs),
                ))?;

                display_report(&report, *output_format)?;
                if let Some(path) = generator.persist(&report, "sustained")? {
                    eprintln!("Report saved to {}", path.display());
                }
                Ok(())
            }
        }
    }
}

impl BackendArgs {
    fn to_config(&self) -> Result<TestConfig, AppError> {
        let api_key = self.resolve_api_key()?;

        if self.provider == Provider::Generic && self.endpoint.is_none() {
            return Err(AppError::Config(
                "Generic provider requires --endpoint to be specified".to_string(),
            ));
        }

        let mut config = TestConfig::new(self.provider, self.model.clone(), api_key)
            .with_sampling(SamplingParams {
                temperature: self.temperature,
                top_p: self.top_p,
                max_tokens: self.max_tokens,
            })
            .with_request_timeout(Duration::from_secs(self.timeout_secs));
        config.insecure = self.insecure;
        config.endpoint = self.endpoint.clone();
        config.system_prompt = self.system_prompt.clone();
        config.output_dir = self.output_dir.clone();
        Ok(config)
    }

    fn resolve_api_key(&self) -> Result<String, AppError> {
        let key = match self.provider {
            Provider::Openai => self
                .api_key
                .clone()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .or_else(|| std::env::var("API_KEY").ok()),
            Provider::Anthropic => self
                .api_key
                .clone()
                .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
                .or_else(|| std::env::var("API_KEY").ok()),
            Provider::Generic => self
                .api_key
                .clone()
                .or_else(|| std::env::var("API_KEY").ok()),
        };

        match (self.provider, key) {
            (Provider::Generic, Some(key)) => Ok(key),
            (Provider::Generic, None) => Ok(String::new()),
            (_, Some(key)) => Ok(key),
            (Provider::Openai, None) => Err(AppError::Config(
                "API key required for OpenAI. Use --api-key or set OPENAI_API_KEY/API_KEY."
                    .to_string(),
            )),
            (Provider::Anthropic, None) => Err(AppError::Config(
                "API key required for Anthropic. Use --api-key or set ANTHROPIC_API_KEY/API_KEY."
                    .to_string(),
            )),
        }
    }
}

impl PromptArgs {
    /// One prompt per non-empty line (batch mode).
    fn read_lines(&self) -> Result<Vec<String>, AppError> {
        let text = self.read_raw()?;
        let prompts: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        if prompts.is_empty() {
            return Err(AppError::Config("Prompt cannot be empty".to_string()));
        }
        Ok(prompts)
    }

    /// The whole input as one prompt (sustained mode).
    fn read_single(&self) -> Result<String, AppError> {
        let text = self.read_raw()?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AppError::Config("Prompt cannot be empty".to_string()));
        }
        Ok(trimmed.to_string())
    }

    fn read_raw(&self) -> Result<String, AppError> {
        if let Some(prompt) = &self.prompt {
            return Ok(prompt.clone());
        }
        if let Some(path) = &self.prompt_file {
            return std::fs::read_to_string(path).map_err(|e| {
                AppError::Io(std::io::Error::other(format!(
                    "Failed to read prompt file: {}",
                    e
                )))
            });
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}

fn build_generator(config: TestConfig) -> Result<LoadGenerator<ChatClientEnum>, AppError> {
    let client = Arc::new(ChatClientEnum::from_config(&config)?);
    Ok(LoadGenerator::new(config, client))
}

fn runtime() -> Result<tokio::runtime::Runtime, AppError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AppError::Config(format!("Failed to create async runtime: {}", e)))
}

fn progress_bar(len: u64) -> indicatif::ProgressBar {
    let pb = indicatif::ProgressBar::new(len);
    pb.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid progress bar template")
            .progress_chars("#>-"),
    );
    pb.set_message("Starting load test...");
    pb
}

fn display_report(report: &AggregateReport, format: OutputFormat) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Text => {
            println!("\n=== Load Test Results ===");
            println!("Total Requests: {}", report.total_requests);
            println!("Successful: {}", report.successful_requests);
            println!("Failed: {}", report.failed_requests);

            if let Some(error) = &report.error {
                println!("Error: {}", error);
                return Ok(());
            }

            if let Some(latency) = &report.latency_secs {
                println!("\nLatency (s):");
                print_summary(latency, 3);
            }
            if let Some(throughput) = &report.tokens_per_second {
                println!("\nThroughput (approx tokens/s):");
                print_summary(throughput, 1);
            }
            if let Some(tokens) = &report.output_tokens {
                println!("\nOutput tokens (approx):");
                print_summary(tokens, 0);
            }
        }
    }
    Ok(())
}

fn print_summary(stats: &StatSummary, decimals: usize) {
    println!("  Mean: {:.*}", decimals, stats.mean);
    println!("  p50:  {:.*}", decimals, stats.p50);
    println!("  p95:  {:.*}", decimals, stats.p95);
    println!("  p99:  {:.*}", decimals, stats.p99);
    println!("  Min:  {:.*}", decimals, stats.min);
    println!("  Max:  {:.*}", decimals, stats.max);
}
