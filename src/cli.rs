//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, OutputFlags, TargetOverrides};
use crate::commands;

/// Start platform applications and follow them until they run
#[derive(Parser)]
#[command(
    name = "cf-start",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Cloud Controller API endpoint (overrides the config file)
    #[arg(long, global = true, env = "CF_API", value_name = "URL")]
    pub api: Option<String>,

    /// OAuth bearer token (overrides the config file)
    #[arg(long, global = true, env = "CF_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// GUID of the targeted space (overrides the config file)
    #[arg(long, global = true, env = "CF_SPACE_GUID", value_name = "GUID")]
    pub space_guid: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start an app and wait for its first running instance
    Start(commands::start::StartArgs),
}

impl Cli {
    /// Run the parsed command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            quiet,
            no_color,
            api,
            token,
            space_guid,
            command,
        } = self;
        let flags = AppFlags {
            output: OutputFlags { no_color, quiet },
            target: TargetOverrides {
                api,
                token,
                space_guid,
            },
        };
        match command {
            Command::Start(args) => {
                let app = AppContext::new(flags)?;
                commands::start::run(&args, &app).await
            }
        }
    }
}
