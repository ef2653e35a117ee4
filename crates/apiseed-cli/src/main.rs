//! apiseed CLI - baseline example payloads from OpenAPI contracts

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use apiseed_core::registry::operations_with_body;
use apiseed_core::{
    ComponentRegistry, GeneratorConfig, config_schema, request_body_example, request_body_schema,
};
use apiseed_engine::{EMPTY_PAYLOAD, Generator};

#[derive(Parser)]
#[command(name = "apiseed")]
#[command(about = "Generate baseline example payloads from OpenAPI contracts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate example payloads
    ///
    /// Without --schema or --operation, every operation with a JSON request
    /// body is generated.
    Generate {
        /// OpenAPI document (JSON or YAML)
        #[arg(short, long)]
        spec: PathBuf,

        /// Component schema name or `$ref`
        #[arg(long, conflicts_with = "operation")]
        schema: Option<String>,

        /// Operation whose request body to generate, e.g. "POST /pets"
        #[arg(long)]
        operation: Option<String>,

        /// Config file (default: .apiseed.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// RNG seed (overrides the config)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Initialize config file
    Init,

    /// Export JSON Schema for the config file
    Schema,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
}

/// What to generate: a label for output plus either a schema ref or a
/// ready-made request body example.
struct Target {
    label: String,
    reference: String,
    example: Option<Value>,
}

/// Payloads and diagnostics for one target.
struct Generated {
    label: String,
    payloads: Vec<String>,
    diagnostics: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Generate {
            spec,
            schema,
            operation,
            config,
            seed,
        } => {
            let mut cfg = match config {
                Some(path) => GeneratorConfig::load(&path)?,
                None => GeneratorConfig::load_default()?,
            };
            if seed.is_some() {
                cfg.seed = seed;
            }

            let registry = ComponentRegistry::from_path(&spec)
                .with_context(|| format!("loading {}", spec.display()))?;
            let targets = targets(&registry, schema, operation.as_deref(), &cfg)?;
            if targets.is_empty() {
                eprintln!(
                    "Nothing to generate: no operation in {} has a JSON request body.",
                    spec.display()
                );
                return Ok(1);
            }
            tracing::debug!(spec = %spec.display(), targets = targets.len(), "generating");

            let mut generator = Generator::from_config(registry, cfg);
            let mut results = Vec::with_capacity(targets.len());
            for target in targets {
                let before = generator.diagnostics().len();
                let payloads = match target.example {
                    Some(example) => vec![generator.serialize(&target.label, &example)],
                    None => generator.generate(&target.reference)?,
                };
                let diagnostics = generator.diagnostics().split_off(before);
                results.push(Generated {
                    label: target.label,
                    payloads,
                    diagnostics,
                });
            }

            print_results(&results, cli.output)?;

            let all_empty = results
                .iter()
                .flat_map(|r| &r.payloads)
                .all(|p| p == EMPTY_PAYLOAD);
            Ok(i32::from(all_empty))
        }

        Commands::Init => {
            let config_path = ".apiseed.toml";
            if Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, GeneratorConfig::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - self_reference_depth: how often a schema may recurse into itself");
            println!("  - array_size / max_examples: payload size and count");
            println!("  - composition: multiple or flatten for anyOf/oneOf");
            Ok(0)
        }

        Commands::Schema => {
            println!("{}", config_schema());
            Ok(0)
        }
    }
}

fn targets(
    registry: &ComponentRegistry,
    schema: Option<String>,
    operation: Option<&str>,
    cfg: &GeneratorConfig,
) -> Result<Vec<Target>> {
    if let Some(name) = schema {
        return Ok(vec![Target {
            label: name.clone(),
            reference: name,
            example: None,
        }]);
    }

    let operations = match operation {
        Some(op) => vec![parse_operation(op)?],
        None => operations_with_body(registry.document()),
    };

    let document = registry.document();
    let mut out = Vec::new();
    for (method, path) in operations {
        let label = format!("{method} {path}");
        let Some(reference) = request_body_schema(document, &path, &method) else {
            if operation.is_some() {
                bail!("{label} has no JSON request body");
            }
            continue;
        };
        let example = if cfg.use_request_body_examples {
            request_body_example(document, &path, &method)
        } else {
            None
        };
        out.push(Target {
            label,
            reference,
            example,
        });
    }
    Ok(out)
}

/// `"POST /pets"` → `("POST", "/pets")`.
fn parse_operation(operation: &str) -> Result<(String, String)> {
    let Some((method, path)) = operation.trim().split_once(char::is_whitespace) else {
        bail!("invalid operation '{operation}', expected e.g. \"POST /pets\"");
    };
    let path = path.trim();
    if !path.starts_with('/') {
        bail!("invalid operation path '{path}', expected it to start with '/'");
    }
    Ok((method.to_ascii_uppercase(), path.to_string()))
}

fn print_results(results: &[Generated], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Terminal => {
            for result in results {
                println!("{} ({} payloads)", result.label, result.payloads.len());
                for payload in &result.payloads {
                    println!("  {payload}");
                }
                if !result.diagnostics.is_empty() {
                    eprintln!("Diagnostics for {}:", result.label);
                    for d in &result.diagnostics {
                        eprintln!("  - {d}");
                    }
                }
            }
        }
        OutputFormat::Json => {
            let mut entries = Vec::with_capacity(results.len());
            for result in results {
                let payloads = result
                    .payloads
                    .iter()
                    .map(|p| serde_json::from_str(p))
                    .collect::<Result<Vec<Value>, _>>()?;
                entries.push(serde_json::json!({
                    "target": result.label,
                    "payloads": payloads,
                    "diagnostics": result.diagnostics,
                }));
            }
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> ComponentRegistry {
        ComponentRegistry::from_document(json!({
            "paths": {
                "/pets": {
                    "post": {
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/Pet"},
                                    "example": {"name": "Rex"}
                                }
                            }
                        }
                    },
                    "get": {}
                },
                "/owners": {
                    "put": {
                        "requestBody": {
                            "content": {"application/json": {"schema": {"type": "object"}}}
                        }
                    }
                }
            },
            "components": {
                "schemas": {"Pet": {"type": "object", "properties": {"name": {"type": "string"}}}}
            }
        }))
        .unwrap()
    }

    #[test]
    fn parses_operations() {
        assert_eq!(
            parse_operation("post /pets").unwrap(),
            ("POST".to_string(), "/pets".to_string())
        );
        assert!(parse_operation("POST").is_err());
        assert!(parse_operation("POST pets").is_err());
    }

    #[test]
    fn schema_target_is_used_verbatim() {
        let targets = targets(&registry(), Some("Pet".into()), None, &GeneratorConfig::default()).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].reference, "Pet");
        assert!(targets[0].example.is_none());
    }

    #[test]
    fn operation_targets_follow_body_examples_flag() {
        let registry = registry();
        let mut cfg = GeneratorConfig::default();
        let with_example = targets(&registry, None, Some("POST /pets"), &cfg).unwrap();
        assert_eq!(with_example[0].reference, "#/components/schemas/Pet");
        assert_eq!(with_example[0].example, Some(json!({"name": "Rex"})));

        cfg.use_request_body_examples = false;
        let without = targets(&registry, None, Some("POST /pets"), &cfg).unwrap();
        assert!(without[0].example.is_none());

        assert!(targets(&registry, None, Some("GET /pets"), &cfg).is_err());
    }

    #[test]
    fn all_operations_with_bodies_are_targets() {
        let targets = targets(&registry(), None, None, &GeneratorConfig::default()).unwrap();
        let mut labels: Vec<&str> = targets.iter().map(|t| t.label.as_str()).collect();
        labels.sort_unstable();
        assert_eq!(labels, vec!["POST /pets", "PUT /owners"]);
        let owners = targets.iter().find(|t| t.label == "PUT /owners").unwrap();
        assert!(owners.reference.ends_with("application~1json/schema"));
    }

    #[test]
    fn inline_body_schema_generates() {
        let registry = registry();
        let targets = targets(&registry, None, Some("PUT /owners"), &GeneratorConfig::default()).unwrap();
        let mut generator = Generator::from_config(registry, GeneratorConfig::default());
        let payloads = generator.generate(&targets[0].reference).unwrap();
        assert_eq!(payloads, vec![EMPTY_PAYLOAD.to_string()]);
    }
}
