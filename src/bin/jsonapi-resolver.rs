//! JSON:API Resolver CLI
//!
//! Command-line interface for decoding, normalizing and checking JSON:API
//! documents against a set of resource type definitions.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use jsonapi_resolver::{
    decode_many_value, decode_one_value, encode_many_value, encode_one_value, load_document_auto,
    load_registry, DecodeError, Registry,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsonapi-resolver")]
#[command(about = "Decode, normalize and check JSON:API documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a document and print the resolved resource graph
    Decode {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Decode a document and re-encode it in canonical form
    Normalize {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Check that a document decodes cleanly
    Check {
        #[command(flatten)]
        input: InputArgs,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Document source: file path or URL (http:// or https://)
    document: String,

    /// Type definitions file
    #[arg(long)]
    types: PathBuf,

    /// Wire type name of the primary data
    #[arg(long = "type", short = 't')]
    type_name: String,

    /// Expect `data` to be an array of resources
    #[arg(long)]
    many: bool,
}

#[derive(Args)]
struct OutputArgs {
    /// Output file (stdout if not specified)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decode { input, output } => run_decode(&input, &output),
        Commands::Normalize { input, output } => run_normalize(&input, &output),
        Commands::Check { input, json } => run_check(&input, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_decode(input: &InputArgs, output: &OutputArgs) -> Result<(), u8> {
    let (registry, document) = load_inputs(input, false)?;

    let graph = if input.many {
        decode_many_value(&registry, &document, &input.type_name)
            .map_err(|e| report_decode_error(false, &e))
            .and_then(|decoded| to_json(&decoded))
    } else {
        decode_one_value(&registry, &document, &input.type_name)
            .map_err(|e| report_decode_error(false, &e))
            .and_then(|decoded| to_json(&decoded))
    }?;

    write_output(&graph, output)
}

fn run_normalize(input: &InputArgs, output: &OutputArgs) -> Result<(), u8> {
    let (registry, document) = load_inputs(input, false)?;

    let encoded = if input.many {
        let decoded = decode_many_value(&registry, &document, &input.type_name)
            .map_err(|e| report_decode_error(false, &e))?;
        encode_many_value(&registry, &decoded.graph, &decoded.data)
    } else {
        let decoded = decode_one_value(&registry, &document, &input.type_name)
            .map_err(|e| report_decode_error(false, &e))?;
        encode_one_value(&registry, &decoded.graph, decoded.data)
    }
    .map_err(|e| {
        eprintln!("Error encoding document: {}", e);
        2u8
    })?;

    write_output(&encoded, output)
}

fn run_check(input: &InputArgs, json_output: bool) -> Result<(), u8> {
    let (registry, document) = load_inputs(input, json_output)?;

    let resources = if input.many {
        decode_many_value(&registry, &document, &input.type_name).map(|d| d.graph.len())
    } else {
        decode_one_value(&registry, &document, &input.type_name).map(|d| d.graph.len())
    }
    .map_err(|e| report_decode_error(json_output, &e))?;

    if json_output {
        println!(
            "{}",
            serde_json::json!({ "valid": true, "resources": resources })
        );
    } else {
        println!("Valid ({} resources)", resources);
    }
    Ok(())
}

fn load_inputs(input: &InputArgs, json_output: bool) -> Result<(Registry, Value), u8> {
    let registry = load_registry(&input.types).map_err(|e| {
        report_error(json_output, &format!("loading types: {}", e));
        e.exit_code() as u8
    })?;

    let document = load_document_auto(&input.document).map_err(|e| {
        report_error(json_output, &format!("loading document: {}", e));
        e.exit_code() as u8
    })?;

    Ok((registry, document))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, u8> {
    serde_json::to_value(value).map_err(|e| {
        eprintln!("Error serializing decoded graph: {}", e);
        2u8
    })
}

fn write_output(value: &Value, output: &OutputArgs) -> Result<(), u8> {
    let json_output = if output.pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match &output.output {
        Some(path) => {
            std::fs::write(path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

/// Report a decode failure and return its exit code.
///
/// Error documents list every error object they carry.
fn report_decode_error(json_output: bool, error: &DecodeError) -> u8 {
    match error {
        DecodeError::ErrorDocument { errors } => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Error document:");
                for entry in errors {
                    eprintln!("  {}", entry);
                }
            }
        }
        other => report_error(json_output, &other.to_string()),
    }
    error.exit_code() as u8
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn serialization_failure_is_not_reported_as_invalid_input() {
        // Non-string map keys cannot become a JSON object.
        let unrepresentable: BTreeMap<(u8, u8), u8> = [((1, 2), 3)].into_iter().collect();
        assert_eq!(to_json(&unrepresentable), Err(2));
    }
}
