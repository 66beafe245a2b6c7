//! flowplan CLI: validate, explain and optimize YAML pipelines.

use clap::{Parser, Subcommand};
use flowplan_core::config::OptimizerConfig;
use flowplan_planner::{explain, parse_yaml_pipeline, Optimizer, PipelineConfig};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flowplan", version = flowplan_core::VERSION)]
#[command(about = "Logical-plan rewriter for dataflow pipelines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a pipeline YAML file (syntax and wiring check)
    Validate {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Print the logical plan before and after the rewrite rules run
    Explain {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Run the rewrite rules to a fixed point and print the result
    Optimize {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        /// Emit the rewritten plan and the application log as JSON
        #[arg(long)]
        json: bool,

        /// Driver iteration cap (overrides config)
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Rule to skip; may be repeated (overrides config)
        #[arg(long = "disable")]
        disable: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flowplan=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { pipeline } => {
            if let Err(e) = validate_pipeline(&pipeline) {
                eprintln!("Validation failed: {}", e);
                std::process::exit(1);
            }
            println!("✓ Pipeline is valid");
        }
        Commands::Explain { pipeline } => {
            if let Err(e) = explain_pipeline(&pipeline) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Optimize {
            pipeline,
            json,
            max_iterations,
            disable,
        } => {
            if let Err(e) = optimize_pipeline(&pipeline, json, max_iterations, disable) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn validate_pipeline(pipeline_path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    let _ = parse_yaml_pipeline(&yaml_content)?;
    Ok(())
}

fn explain_pipeline(pipeline_path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    let parsed = parse_yaml_pipeline(&yaml_content)?;
    let mut plan = parsed.plan.clone();

    println!("Logical Plan");
    println!("============");
    print!("{}", explain(&parsed.plan));
    println!();

    let config = resolve_config(OptimizerConfig::from_env(), &parsed.config, None, Vec::new());
    Optimizer::with_default_rules(config).optimize(&mut plan)?;

    println!("Optimized Plan");
    println!("==============");
    print!("{}", explain(&plan));
    Ok(())
}

fn optimize_pipeline(
    pipeline_path: &PathBuf,
    json: bool,
    max_iterations: Option<usize>,
    disable: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    let parsed = parse_yaml_pipeline(&yaml_content)?;
    let mut plan = parsed.plan;

    let config = resolve_config(
        OptimizerConfig::from_env(),
        &parsed.config,
        max_iterations,
        disable,
    );
    tracing::info!(
        pipeline = %pipeline_path.display(),
        max_iterations = config.max_iterations,
        disabled = ?config.disabled_rules,
        "optimizing pipeline"
    );

    let optimizer = Optimizer::with_default_rules(config);
    let summary = optimizer.optimize(&mut plan)?;

    if json {
        let out = serde_json::json!({
            "summary": summary,
            "plan": plan,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Optimized Plan");
    println!("==============");
    print!("{}", explain(&plan));
    println!();
    println!(
        "Rules applied: {} in {} iteration(s){}",
        summary.applications.len(),
        summary.iterations,
        if summary.reached_fixed_point {
            ""
        } else {
            " (iteration cap reached)"
        }
    );
    for app in &summary.applications {
        println!("  {} on {}", app.rule, app.node);
    }
    Ok(())
}

/// Layer settings: environment < pipeline file < command line.
fn resolve_config(
    mut cfg: OptimizerConfig,
    doc: &PipelineConfig,
    max_iterations: Option<usize>,
    disable: Vec<String>,
) -> OptimizerConfig {
    doc.apply_to(&mut cfg);
    if let Some(max) = max_iterations {
        cfg.max_iterations = max;
    }
    if !disable.is_empty() {
        cfg.disabled_rules = disable;
    }
    cfg
}
