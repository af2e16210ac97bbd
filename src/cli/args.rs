// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! CLI argument definitions using Clap
//!
//! Defines all command-line arguments and subcommands for EvalHub.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::recommender::{Priority, TaskType};

/// EvalHub - AI model management for evaluation workflows
#[derive(Parser, Debug)]
#[command(name = "evalhub")]
#[command(version, about = "AI model management for evaluation workflows")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file path (defaults to ~/.evalhub/settings.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Use scripted mock providers instead of HTTP backends
    #[arg(long, global = true)]
    pub mock: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Model registry management
    Models(ModelsArgs),

    /// Template catalog operations
    Templates(TemplatesArgs),

    /// Probe a model's connection and report health
    Test(TestArgs),

    /// Run one prompt across several models side by side
    Compare(CompareArgs),

    /// Rank models for a request profile
    Recommend(RecommendArgs),

    /// Show observed performance metrics for a model
    Metrics(MetricsArgs),
}

/// Arguments for the models subcommand
#[derive(clap::Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Registry operations
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// List registered models
    List {
        /// Only models from this provider (openai, anthropic, novita, ollama)
        #[arg(short, long)]
        provider: Option<String>,

        /// Only active models
        #[arg(long)]
        active: bool,
    },

    /// Show one model's full configuration
    Show {
        /// Model ID
        model_id: String,
    },

    /// Register a model from a JSON definition file
    Create {
        /// Path to a JSON file describing the model
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Remove a model from the registry
    Delete {
        /// Model ID
        model_id: String,
    },

    /// Mark a model as the system default
    SetDefault {
        /// Model ID
        model_id: String,
    },
}

/// Arguments for the templates subcommand
#[derive(clap::Args, Debug)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    pub command: TemplatesCommand,
}

/// Template catalog operations
#[derive(Subcommand, Debug)]
pub enum TemplatesCommand {
    /// List available templates
    List,

    /// Register a model from a template
    Instantiate {
        /// Template name
        name: String,

        /// Model ID for the new entry (defaults to the template name)
        #[arg(long)]
        model_id: Option<String>,

        /// Make the new model the system default
        #[arg(long)]
        default: bool,
    },
}

/// Arguments for the test subcommand
#[derive(clap::Args, Debug)]
pub struct TestArgs {
    /// Model ID to probe
    pub model_id: String,
}

/// Arguments for the compare subcommand
#[derive(clap::Args, Debug)]
pub struct CompareArgs {
    /// Prompt sent to every model
    pub prompt: String,

    /// Models to compare (at least two)
    #[arg(short, long, num_args = 1.., required = true)]
    pub model: Vec<String>,
}

/// Arguments for the recommend subcommand
#[derive(clap::Args, Debug)]
pub struct RecommendArgs {
    /// Task the model will be used for
    #[arg(short, long, value_enum, default_value = "evaluation")]
    pub task: TaskType,

    /// Quality requirement
    #[arg(long, value_enum, default_value = "medium")]
    pub quality: Priority,

    /// Speed requirement
    #[arg(long, value_enum, default_value = "medium")]
    pub speed: Priority,

    /// Budget sensitivity
    #[arg(long, value_enum, default_value = "medium")]
    pub budget: Priority,

    /// Tokens one request is expected to need
    #[arg(long, default_value_t = 1000)]
    pub expected_tokens: u32,

    /// Expected monthly request volume
    #[arg(long, default_value_t = 10_000)]
    pub monthly_requests: u32,
}

/// Arguments for the metrics subcommand
#[derive(clap::Args, Debug)]
pub struct MetricsArgs {
    /// Model ID
    pub model_id: String,

    /// Timeframe: 1d, 7d or 30d
    #[arg(short, long, default_value = "7d")]
    pub timeframe: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_recommend_defaults() {
        let cli = Cli::try_parse_from(["evalhub", "recommend"]).unwrap();
        match cli.command {
            Commands::Recommend(args) => {
                assert_eq!(args.task, TaskType::Evaluation);
                assert_eq!(args.quality, Priority::Medium);
                assert_eq!(args.expected_tokens, 1000);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_compare_models() {
        let cli = Cli::try_parse_from([
            "evalhub", "compare", "hello", "--model", "gpt-4", "claude-3",
        ])
        .unwrap();
        match cli.command {
            Commands::Compare(args) => {
                assert_eq!(args.prompt, "hello");
                assert_eq!(args.model, vec!["gpt-4", "claude-3"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["evalhub"]).is_err());
    }

    #[test]
    fn test_global_mock_flag() {
        let cli = Cli::try_parse_from(["evalhub", "--mock", "templates", "list"]).unwrap();
        assert!(cli.mock);
    }
}
