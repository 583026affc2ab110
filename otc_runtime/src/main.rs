//! # OTC Index CLI
//!
//! Compiles one mapping script, loads source (and optionally target) objects
//! from JSON, and prints the collection index built for them.

use clap::Parser;
use otc_compiler::command::Side;
use otc_compiler::introspection::{SchemaRegistry, TypeRef};
use otc_compiler::registry::{MappingRegistry, RegistryBuilder};
use otc_compiler::{log_info, logging, pipeline};
use otc_runtime::{IndexedNode, MappingExecution, MappingExecutor, SchemaObjectIntrospector, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Index live objects along the chains of a compiled mapping
#[derive(Parser, Debug)]
#[command(name = "otc_index", version, about = "Index objects along compiled OTC chains")]
struct Cli {
    /// Mapping script (.otc.toml)
    script: PathBuf,

    /// Type schema (.toml or .json)
    #[arg(long)]
    schema: PathBuf,

    /// Source object as JSON
    #[arg(long)]
    source: PathBuf,

    /// Existing target object as JSON
    #[arg(long)]
    target: Option<PathBuf>,

    /// Print the execution as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_global_logging()?;
    let cli = Cli::parse();

    let schema = SchemaRegistry::load(&cli.schema)?;
    let introspector = SchemaObjectIntrospector::new(schema);

    let compiled = match pipeline::process_file(&cli.script, &introspector) {
        Ok(result) => result,
        Err(error) => {
            eprintln!("FAILED: {}", error);
            for report in error.reports().iter().filter(|r| !r.success) {
                eprintln!("  {}", report.format());
            }
            logging::print_cargo_style_summary();
            std::process::exit(1);
        }
    };

    let mapping_id = compiled.mapping.id.clone();
    let source_type = compiled.mapping.tree(Side::Source).root_type().clone();
    let target_type = compiled.mapping.tree(Side::Target).root_type().clone();

    let mut builder = RegistryBuilder::new(&introspector);
    builder.add_compiled(compiled.mapping)?;
    let registry = MappingRegistry::from_builder(builder);

    let source = load_object(&cli.source, &source_type, introspector.schema())?;
    let target = cli
        .target
        .as_deref()
        .map(|path| load_object(path, &target_type, introspector.schema()))
        .transpose()?;

    let executor = MappingExecutor::new(&registry, &introspector);
    let execution = match executor.execute(&mapping_id, &source, target.as_ref()) {
        Ok(execution) => execution,
        Err(error) => {
            eprintln!("FAILED [{}]: {}", error.error_code(), error);
            logging::print_cargo_style_summary();
            std::process::exit(1);
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&execution.to_json())?);
    } else {
        print_execution(&execution);
        logging::print_cargo_style_summary();
    }

    Ok(())
}

fn load_object(
    path: &Path,
    declared: &TypeRef,
    schema: &SchemaRegistry,
) -> Result<Value, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let json: serde_json::Value = serde_json::from_str(&content)?;
    let value = Value::from_json(&json, declared, schema)?;
    log_info!("Object loaded", "file" => path.display(), "type" => declared);
    Ok(value)
}

fn print_execution(execution: &MappingExecution) {
    println!(
        "Mapping {} (execution {})",
        execution.mapping_id(),
        execution.execution_id
    );

    for (label, side) in [("source", Side::Source), ("target", Side::Target)] {
        match execution.index(side) {
            Some(root) => {
                println!("\n{} index ({} nodes):", label, root.node_count());
                print_node(root, 1);
            }
            None => println!("\n{} index: nothing to index", label),
        }
    }

    println!("\nCommands:");
    for plan in &execution.commands {
        let size = plan
            .collection_size_type
            .map_or("-", |size| size.as_str());
        println!("  {} -> {} [{}]", plan.command_id, plan.generated_type, size);
    }
}

fn print_node(node: &IndexedNode, depth: usize) {
    println!("{}{} = {}", "  ".repeat(depth), node.id(), node.value().summary());
    if let Some(children) = node.children() {
        for child in children.values() {
            print_node(child, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::try_parse_from([
            "otc_index",
            "orders.otc.toml",
            "--schema",
            "types.toml",
            "--source",
            "customer.json",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.script, PathBuf::from("orders.otc.toml"));
        assert_eq!(cli.source, PathBuf::from("customer.json"));
        assert!(cli.target.is_none());
        assert!(cli.json);
    }

    #[test]
    fn test_cli_requires_schema() {
        assert!(Cli::try_parse_from(["otc_index", "orders.otc.toml", "--source", "c.json"]).is_err());
    }
}
