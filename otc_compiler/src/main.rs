//! # OTC Compiler CLI
//!
//! Compiles one mapping script, or every script under a directory, against
//! a type schema and reports the outcome per chain.

use clap::Parser;
use otc_compiler::introspection::SchemaRegistry;
use otc_compiler::registry::{CompilationReport, MappingDeployment};
use otc_compiler::{batch, logging, pipeline};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Compile object-to-object mapping scripts into command trees
#[derive(Parser, Debug)]
#[command(name = "otc_compiler", version, about)]
struct Cli {
    /// Mapping script (.otc.toml) or a directory of scripts
    input: PathBuf,

    /// Type schema (.toml or .json)
    #[arg(long)]
    schema: PathBuf,

    /// Compile a directory on the calling thread only
    #[arg(long, conflicts_with = "threads")]
    sequential: bool,

    /// Worker threads for directory compilation (default: available cores)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    threads: Option<u16>,

    /// Only compile scripts directly inside the directory
    #[arg(long)]
    no_recursive: bool,

    /// Stop compiling after this many scripts
    #[arg(long)]
    max_files: Option<usize>,

    /// Stop at the first script that fails
    #[arg(long)]
    fail_fast: bool,

    /// Print each script as it is compiled
    #[arg(long)]
    progress: bool,

    /// Print deployments and reports as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn batch_config(&self) -> batch::BatchConfig {
        let mut config = if self.sequential {
            batch::BatchConfig::sequential()
        } else {
            batch::BatchConfig::default()
        };
        if let Some(threads) = self.threads {
            config.max_threads = usize::from(threads);
        }
        config.recursive = !self.no_recursive;
        config.max_files = self.max_files;
        config.fail_fast = self.fail_fast;
        config.report_progress = self.progress;
        config
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    logging::init_global_logging()?;
    let cli = Cli::parse();

    let schema = match SchemaRegistry::load(&cli.schema) {
        Ok(schema) => schema,
        Err(error) => {
            eprintln!("error: could not load schema {}: {}", cli.schema.display(), error);
            return Ok(ExitCode::FAILURE);
        }
    };

    let succeeded = if cli.input.is_dir() {
        compile_directory(&cli, &schema)?
    } else if pipeline::is_script_file(&cli.input) {
        compile_script(&cli.input, &schema, cli.json)?
    } else {
        eprintln!(
            "error: {} is neither a mapping script (*{}) nor a directory",
            cli.input.display(),
            pipeline::SCRIPT_EXTENSION
        );
        false
    };

    Ok(if succeeded { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn compile_script(
    path: &Path,
    schema: &SchemaRegistry,
    json: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let outcome = pipeline::process_file(path, schema);
    match &outcome {
        Ok(result) if json => {
            println!("{}", MappingDeployment::from_compiled(&result.mapping).to_json()?);
        }
        Ok(result) => {
            println!(
                "Compiled {} ({} commands, {} nodes)",
                result.mapping.id,
                result.mapping.commands.len(),
                result.node_count()
            );
            print_failed_reports(&result.reports);
        }
        Err(error) if json => println!("{}", serde_json::to_string_pretty(error.reports())?),
        Err(error) => {
            eprintln!("FAILED: {}", error);
            print_failed_reports(error.reports());
        }
    }
    if !json {
        logging::print_cargo_style_summary();
    }
    Ok(outcome.is_ok())
}

fn compile_directory(cli: &Cli, schema: &SchemaRegistry) -> Result<bool, Box<dyn std::error::Error>> {
    let config = cli.batch_config();
    let results = match batch::process_directory_with_config(&cli.input, schema, &config) {
        Ok(results) => results,
        Err(error) => {
            eprintln!("error[{}]: {}", error.error_code(), error);
            return Ok(false);
        }
    };

    if cli.json {
        let reports: Vec<&CompilationReport> = results
            .compiled
            .iter()
            .flat_map(|(_, result)| result.reports.iter())
            .chain(results.failed.iter().flat_map(|(_, error)| error.reports().iter()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_batch_results(&results);
        logging::print_cargo_style_summary();
    }

    Ok(results.failed_count() == 0)
}

fn print_failed_reports(reports: &[CompilationReport]) {
    for report in reports.iter().filter(|r| !r.success) {
        eprintln!("  {}", report.format());
        if let Some(cause) = &report.cause {
            eprintln!("    cause: {}", cause);
        }
    }
}

fn print_batch_results(results: &batch::BatchResults) {
    println!("{}", results.summary());

    for (path, error) in &results.failed {
        println!("  FAILED {}: [{}] {}", path.display(), error.error_code(), error);
        print_failed_reports(error.reports());
    }

    const SHOWN: usize = 10;
    for (path, result) in results.compiled.iter().take(SHOWN) {
        println!(
            "  ok     {}: {} ({} commands, {} nodes)",
            path.display(),
            result.mapping.id,
            result.mapping.commands.len(),
            result.node_count()
        );
    }
    if results.compiled_count() > SHOWN {
        println!("  ... and {} more", results.compiled_count() - SHOWN);
    }
}
