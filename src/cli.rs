//! CLI argument definitions using clap.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gateway_config::GatewayConfig;
use gateway_core::{ChatMessage, EnvCredentials, GenerationRequest, LogContext};
use gateway_engine::Gateway;
use gateway_providers::ImageRequest;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Roleplay LLM gateway
#[derive(Parser, Debug)]
#[command(name = "rp-gateway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (TOML or YAML)
    #[arg(short, long, env = "RP_GATEWAY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one chat completion through the gateway
    Chat(ChatArgs),

    /// Generate an image through the Stable Diffusion backend
    Image(ImageArgs),

    /// List configured providers and their queue limits
    Providers,

    /// Validate the configuration and exit
    Validate,
}

/// Arguments for the chat command
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Message to send
    pub message: String,

    /// Provider id; the configured default when omitted
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Model to use
    #[arg(short = 'M', long, default_value = "anthropic/claude-3.5-sonnet")]
    pub model: String,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Temperature
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Ask the provider for reasoning, when it supports it
    #[arg(long)]
    pub reasoning: bool,

    /// Tag for the prompt/response logs
    #[arg(long, default_value = "cli")]
    pub tag: String,
}

/// Arguments for the image command
#[derive(Args, Debug)]
pub struct ImageArgs {
    /// Prompt
    pub prompt: String,

    /// Where to write the decoded image
    #[arg(short, long, default_value = "image.png")]
    pub output: PathBuf,

    /// Fixed seed
    #[arg(long)]
    pub seed: Option<i64>,

    /// Negative prompt
    #[arg(long)]
    pub negative: Option<String>,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self, config: GatewayConfig) -> Result<()> {
        match self.command {
            Commands::Validate => {
                info!("Configuration is valid");
                print_value(
                    self.json,
                    &json!({"valid": true, "providers": config.providers.len()}),
                    "Configuration is valid",
                );
                Ok(())
            }
            Commands::Providers => {
                let limits = config.concurrency_limits();
                let providers: Vec<_> = config
                    .providers
                    .iter()
                    .map(|p| {
                        json!({
                            "id": p.id.as_str(),
                            "name": p.display_name,
                            "base_url": p.base_url,
                            "max_concurrent": limits
                                .get(p.id.as_str())
                                .copied()
                                .unwrap_or(config.queue.default_max_concurrent),
                            "default": p.id == config.default_provider,
                        })
                    })
                    .collect();
                let text = config
                    .providers
                    .iter()
                    .map(|p| format!("{} ({}) {}", p.id, p.display_name, p.base_url))
                    .collect::<Vec<_>>()
                    .join("\n");
                print_value(self.json, &json!(providers), &text);
                Ok(())
            }
            Commands::Chat(args) => {
                let gateway = Gateway::from_config(&config, Arc::new(EnvCredentials))?;
                chat(&gateway, args, self.json).await
            }
            Commands::Image(args) => {
                let gateway = Gateway::from_config(&config, Arc::new(EnvCredentials))?;
                image(&gateway, args, self.json).await
            }
        }
    }
}

async fn chat(gateway: &Gateway, args: ChatArgs, json_output: bool) -> Result<()> {
    let mut builder = GenerationRequest::builder()
        .model(args.model)
        .reasoning(args.reasoning)
        .log_context(LogContext::new(args.tag));
    if let Some(provider) = args.provider {
        builder = builder.provider(provider);
    }
    if let Some(system) = args.system {
        builder = builder.message(ChatMessage::system(system));
    }
    if let Some(temperature) = args.temperature {
        builder = builder.temperature(temperature);
    }
    if let Some(max_tokens) = args.max_tokens {
        builder = builder.max_tokens(max_tokens);
    }
    let request = builder.message(ChatMessage::user(args.message)).build();

    let result = gateway.generate(&request).await?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if let Some(reasoning) = result.reasoning.as_deref() {
            println!("[reasoning]\n{reasoning}\n");
        }
        println!("{}", result.content);
    }
    Ok(())
}

async fn image(gateway: &Gateway, args: ImageArgs, json_output: bool) -> Result<()> {
    let mut request = ImageRequest::new(args.prompt);
    if let Some(seed) = args.seed {
        request = request.with_seed(seed);
    }
    if let Some(negative) = args.negative {
        request = request.with_negative_prompt(negative);
    }

    let result = gateway.generate_image(&request).await?;
    tokio::fs::write(&args.output, &result.image)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    print_value(
        json_output,
        &json!({
            "output": args.output.display().to_string(),
            "seed": result.seed,
            "bytes": result.image.len(),
            "generation_time_ms": result.generation_time.as_millis() as u64,
        }),
        &format!(
            "Wrote {} (seed {}, {}ms)",
            args.output.display(),
            result.seed,
            result.generation_time.as_millis()
        ),
    );
    Ok(())
}

fn print_value(json_output: bool, value: &serde_json::Value, text: &str) {
    if json_output {
        println!("{value:#}");
    } else {
        println!("{text}");
    }
}
