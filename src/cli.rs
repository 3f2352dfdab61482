//! CLI glue for the `blog-auto-review` binary: argument parsing and the async [`run`] entrypoint.
//!
//! All stack logic lives in the library modules; this module only maps subcommands onto
//! [`run_stack`] with the matching [`ProvisionAction`].
use crate::config::StackPaths;
use crate::contract::ProvisionAction;
use crate::deploy::run_stack;
use crate::load_config::load_or_builtin;
use crate::provisioner::TerraformCli;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// CLI for blog-auto-review: synthesize and deploy the review pipeline's infrastructure.
#[derive(Parser)]
#[clap(
    name = "blog-auto-review",
    version,
    about = "Synthesize and deploy the blog auto-review pipeline infrastructure"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Package function sources and write the Terraform JSON configuration
    Synth(StackArgs),
    /// Synthesize, then show the changes terraform would make
    Diff(StackArgs),
    /// Synthesize, then apply the configuration with terraform
    Deploy(StackArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StackArgs {
    /// YAML file with project_id, location and slack_channel_id (built-in values when omitted)
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Directory containing the check-feed and auto-review sources
    #[clap(long, default_value = "functions")]
    pub functions_dir: PathBuf,
    /// Output directory for archives and synthesized stacks
    #[clap(long, default_value = "cdktf.out")]
    pub out: PathBuf,
}

impl Commands {
    fn split(self) -> (ProvisionAction, StackArgs) {
        match self {
            Commands::Synth(args) => (ProvisionAction::Synth, args),
            Commands::Diff(args) => (ProvisionAction::Diff, args),
            Commands::Deploy(args) => (ProvisionAction::Deploy, args),
        }
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let (action, args) = cli.command.split();
    let config = load_or_builtin(args.config.as_deref())?;
    let paths = StackPaths::new(args.functions_dir, args.out);
    let provisioner = TerraformCli::from_env();

    match run_stack(&config, &paths, &provisioner, action).await {
        Ok(report) => {
            tracing::info!(?action, ?report, "Stack run complete");
            println!(
                "Synthesized {} ({} resources) to {}",
                report.stack_name,
                report.resource_count,
                report.manifest_path.display()
            );
            for artifact in &report.artifacts {
                println!(
                    "  {} -> {} (sha256 {})",
                    artifact.function_name,
                    artifact.object_key,
                    artifact.archive_sha256
                );
            }
            if let Some(outcome) = &report.provision {
                println!("{}", outcome.output);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(?action, error = %e, "Stack run failed");
            Err(anyhow::Error::new(e))
        }
    }
}
