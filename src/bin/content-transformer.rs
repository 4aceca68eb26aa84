//! content-transformer CLI - run YAML-defined transformer pipelines over content
//!
//! Loads a pipeline file, registers its transformers and pushes content from a
//! file or stdin through the chain for one content type.

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use content_transformer::logging::{self, LogFormat};
use content_transformer::{ContentType, PipelineConfig, TransformationEngine};

#[derive(Parser)]
#[command(name = "content-transformer")]
#[command(version, about = "Run content through per-content-type transformer chains", long_about = None)]
struct Cli {
    /// Log output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform content with the pipeline for a content type
    Transform {
        /// Path to pipeline YAML file
        #[arg(short, long, default_value = "pipelines.yaml")]
        config: PathBuf,

        /// Content type key selecting the pipeline
        #[arg(short = 't', long)]
        content_type: String,

        /// Input file (reads stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print a JSON report of every step instead of the bare content
        #[arg(short, long)]
        report: bool,
    },

    /// Validate a pipeline file without transforming anything
    Validate {
        /// Path to pipeline YAML file
        #[arg(short, long, default_value = "pipelines.yaml")]
        config: PathBuf,
    },

    /// List pipelines and their transformers in execution order
    List {
        /// Path to pipeline YAML file
        #[arg(short, long, default_value = "pipelines.yaml")]
        config: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_format) {
        eprintln!("Warning: logging not initialized: {}", e);
    }

    let result = match cli.command {
        Commands::Transform {
            config,
            content_type,
            input,
            report,
        } => transform(config, content_type, input, report),
        Commands::Validate { config } => validate(config),
        Commands::List { config } => list(config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn transform(config: PathBuf, content_type: String, input: Option<PathBuf>, report: bool) -> Result<(), String> {
    let pipeline = PipelineConfig::load_from_file(&config).map_err(|e| e.to_string())?;
    let registry = pipeline.build_registry().map_err(|e| e.to_string())?;
    let engine = TransformationEngine::new(Arc::new(registry)).with_config(pipeline.engine.clone());

    let content = read_input(input.as_ref())?;
    let content_type = ContentType::new(content_type);

    let mut stdout = io::stdout().lock();
    if report {
        let report = engine.transform_with_report(&content_type, content);
        let json = serde_json::to_string_pretty(&report).map_err(|e| format!("Failed to serialize report: {}", e))?;
        writeln!(stdout, "{}", json).map_err(|e| e.to_string())?;
    } else {
        let output = engine.transform(&content_type, content);
        stdout.write_all(output.as_bytes()).map_err(|e| e.to_string())?;
    }
    stdout.flush().map_err(|e| e.to_string())
}

fn validate(config: PathBuf) -> Result<(), String> {
    let pipeline = PipelineConfig::load_from_file(&config).map_err(|e| e.to_string())?;

    println!("✓ {} is valid", config.display());
    println!(
        "  {} pipeline(s), {} transformer(s)",
        pipeline.pipelines.len(),
        pipeline.transformer_count()
    );
    Ok(())
}

fn list(config: PathBuf) -> Result<(), String> {
    let pipeline = PipelineConfig::load_from_file(&config).map_err(|e| e.to_string())?;

    for (content_type, defs) in &pipeline.pipelines {
        println!("{}", content_type);
        for (i, def) in defs.iter().enumerate() {
            println!("  {}. {}", i + 1, def.name());
        }
    }
    Ok(())
}

fn read_input(input: Option<&PathBuf>) -> Result<String, String> {
    match input {
        Some(path) => {
            fs::read_to_string(path).map_err(|e| format!("Failed to read input {}: {}", path.display(), e))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            Ok(buf)
        }
    }
}
