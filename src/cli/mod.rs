// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! CLI module for EvalHub
//!
//! Handles command-line argument parsing and command dispatch.

pub mod args;

pub use args::*;

use std::str::FromStr;

use crate::config::settings::Settings;
use crate::error::{EvalError, Result};
use crate::monitor::Timeframe;
use crate::provider::ProviderKind;
use crate::recommender::RecommendationRequest;
use crate::registry::model::{ModelFilter, ModelStatus, NewModel};
use crate::service::EvalService;
use crate::templates::TemplateOverrides;

/// Load settings, build the service and dispatch the parsed command
pub async fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load(&Settings::default_path()?)?,
    };

    let service = if cli.mock {
        EvalService::with_mock_providers(settings)
    } else {
        EvalService::new(settings)
    };

    dispatch(&service, cli.command, cli.format).await
}

async fn dispatch(service: &EvalService, command: Commands, format: OutputFormat) -> Result<()> {
    match command {
        Commands::Models(args) => run_models(service, args.command, format).await,
        Commands::Templates(args) => run_templates(service, args.command, format).await,
        Commands::Test(args) => {
            let result = service.test_connection(&args.model_id).await?;
            match format {
                OutputFormat::Json => print_json(&result)?,
                OutputFormat::Text => {
                    println!(
                        "{}: {}/{} probes succeeded, avg {} ms, health {:.2} ({})",
                        result.model_id,
                        result.successful_tests,
                        result.total_tests,
                        result.avg_response_time.as_millis(),
                        result.health_score,
                        if result.is_healthy { "healthy" } else { "unhealthy" }
                    );
                }
            }
            Ok(())
        }
        Commands::Compare(args) => {
            let result = service.compare(&args.model, &args.prompt).await?;
            match format {
                OutputFormat::Json => print_json(&result)?,
                OutputFormat::Text => {
                    for entry in &result.entries {
                        let status = if entry.is_success() { "ok" } else { "error" };
                        println!(
                            "[{}] {} ({} ms, {} tokens, ${:.6})",
                            status,
                            entry.model_id,
                            entry.latency.as_millis(),
                            entry.tokens,
                            entry.cost
                        );
                    }
                }
            }
            Ok(())
        }
        Commands::Recommend(args) => {
            let request = RecommendationRequest {
                budget_level: args.budget,
                quality_requirement: args.quality,
                speed_requirement: args.speed,
                task_type: args.task,
                expected_tokens: args.expected_tokens,
                monthly_requests: args.monthly_requests,
            };
            let result = service.recommend(&request).await?;
            match format {
                OutputFormat::Json => print_json(&result)?,
                OutputFormat::Text => {
                    if let Some(reason) = &result.reason {
                        println!("no recommendation: {}", reason);
                    }
                    for (rank, entry) in result.rankings.iter().enumerate() {
                        println!(
                            "{}. {} (score {:.3}, est. ${:.2}/month)",
                            rank + 1,
                            entry.model_id,
                            entry.composite_score,
                            entry.breakdown.estimated_monthly_cost
                        );
                    }
                }
            }
            Ok(())
        }
        Commands::Metrics(args) => {
            let timeframe = Timeframe::from_str(&args.timeframe)?;
            let metrics = service.get_metrics(&args.model_id, timeframe);
            match format {
                OutputFormat::Json => print_json(&metrics)?,
                OutputFormat::Text => {
                    println!(
                        "{} over {}: {} samples, {:.0}% success, avg {:.0} ms, total ${:.4}",
                        args.model_id,
                        args.timeframe,
                        metrics.sample_count,
                        metrics.success_rate * 100.0,
                        metrics.avg_latency_ms,
                        metrics.total_cost
                    );
                }
            }
            Ok(())
        }
    }
}

async fn run_models(
    service: &EvalService,
    command: ModelsCommand,
    format: OutputFormat,
) -> Result<()> {
    match command {
        ModelsCommand::List { provider, active } => {
            let filter = ModelFilter {
                provider: provider.as_deref().map(ProviderKind::from_str).transpose()?,
                status: active.then_some(ModelStatus::Active),
                ..Default::default()
            };
            let models = service.list_models(Some(&filter)).await?;
            match format {
                OutputFormat::Json => print_json(&models)?,
                OutputFormat::Text => {
                    for m in &models {
                        let default_marker = if m.is_default { " (default)" } else { "" };
                        println!(
                            "{} [{}] {:?}{}",
                            m.model_id,
                            m.provider.as_str(),
                            m.status,
                            default_marker
                        );
                    }
                }
            }
        }
        ModelsCommand::Show { model_id } => {
            let model = service.get_model(&model_id).await?;
            print_json(&model)?;
        }
        ModelsCommand::Create { file } => {
            let contents = std::fs::read_to_string(&file)?;
            let new_model: NewModel = serde_json::from_str(&contents)
                .map_err(|e| EvalError::Validation(format!("invalid model definition: {}", e)))?;
            let model = service.create_model(new_model).await?;
            println!("registered {}", model.model_id);
        }
        ModelsCommand::Delete { model_id } => {
            service.delete_model(&model_id).await?;
            println!("deleted {}", model_id);
        }
        ModelsCommand::SetDefault { model_id } => {
            let model = service.set_default_model(&model_id).await?;
            println!("default model is now {}", model.model_id);
        }
    }
    Ok(())
}

async fn run_templates(
    service: &EvalService,
    command: TemplatesCommand,
    format: OutputFormat,
) -> Result<()> {
    match command {
        TemplatesCommand::List => {
            let templates = service.list_templates();
            match format {
                OutputFormat::Json => print_json(&templates)?,
                OutputFormat::Text => {
                    for t in templates {
                        println!("{} [{}] - {}", t.name, t.provider.as_str(), t.description);
                    }
                }
            }
        }
        TemplatesCommand::Instantiate {
            name,
            model_id,
            default,
        } => {
            let overrides = TemplateOverrides {
                model_id,
                is_default: default.then_some(true),
                ..Default::default()
            };
            let model = service.create_from_template(&name, overrides).await?;
            println!("registered {} from template {}", model.model_id, name);
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
