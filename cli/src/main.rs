use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use gbin::{json, Config, Gbin, GbinError, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gbin")]
#[command(about = "Inspect, convert and validate gbin files", long_about = None)]
struct Cli {
    /// Maximum container nesting accepted while encoding or decoding
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Largest payload, in bytes, a single frame may declare
    #[arg(long, global = true)]
    max_payload: Option<u64>,

    /// Log each top-level call at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the decoded value tree of a `.gbin` file
    Inspect {
        /// Input `.gbin` file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Decode a `.gbin` file to JSON (printed to stdout)
    ToJson {
        /// Input `.gbin` file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Encode a JSON document as gbin
    FromJson {
        /// Input `.json` file
        #[arg(short, long)]
        input: PathBuf,

        /// Output `.gbin` file (defaults to same name + `.gbin`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode a `.gbin` file and report frame statistics
    Check {
        /// Input `.gbin` file
        #[arg(short, long)]
        input: PathBuf,
    },
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::new();
        if let Some(depth) = self.max_depth {
            config = config.max_depth(depth);
        }
        if let Some(len) = self.max_payload {
            config = config.max_payload_len(len);
        }
        config
    }
}

fn init_logging(verbose: bool) {
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

#[derive(Debug, Default)]
struct Stats {
    frames:    usize,
    max_depth: usize,
}

impl Stats {
    fn visit(&mut self, value: &Value, depth: usize) {
        self.frames += 1;
        self.max_depth = self.max_depth.max(depth);
        match *value {
            Value::List(ref items) => items.iter().for_each(|item| self.visit(item, depth + 1)),
            Value::Map(ref entries) => {
                for (key, entry) in entries {
                    self.visit(key, depth + 1);
                    self.visit(entry, depth + 1);
                }
            }
            Value::Record(ref fields) => {
                for (_, field) in fields {
                    // The field name is a frame of its own.
                    self.frames += 1;
                    self.visit(field, depth + 1);
                }
            }
            Value::Reference(ref inner) | Value::Dynamic(ref inner) => self.visit(inner, depth + 1),
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_) => {}
        }
    }
}

fn run(cli: &Cli) -> Result<(), GbinError> {
    let gbin = Gbin::with_config(cli.config());

    match &cli.command {
        Commands::Inspect { input } => {
            let data = fs::read(input)?;
            let value = gbin.decode_value(&data)?;
            println!("{:?}", value);
            Ok(())
        }

        Commands::ToJson { input } => {
            let data = fs::read(input)?;
            println!("{}", gbin.decode_to_json(&data)?);
            Ok(())
        }

        Commands::FromJson { input, output } => {
            let text = fs::read_to_string(input)?;
            let document: serde_json::Value = serde_json::from_str(&text)?;
            let value = json::json_to_value(&document)?;
            let bin = gbin.encode(&value)?;
            let out_path = if let Some(o) = output {
                o.clone()
            } else {
                let mut p = input.clone();
                p.set_extension("gbin");
                p
            };
            fs::write(&out_path, &bin)?;
            info!(bytes = bin.len(), "wrote {}", out_path.display());
            println!("Encoded {} → {}", input.display(), out_path.display());
            Ok(())
        }

        Commands::Check { input } => {
            let data = fs::read(input)?;
            let value = gbin.decode_value(&data)?;
            let mut stats = Stats::default();
            stats.visit(&value, 1);
            println!("{}: ok", input.display());
            println!("  root kind: {}", value.kind());
            println!("  bytes:     {}", data.len());
            println!("  frames:    {}", stats.frames);
            println!("  depth:     {}", stats.max_depth);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error[{}]: {}", err.kind_name(), err);
            ExitCode::FAILURE
        }
    }
}
