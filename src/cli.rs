//! Minimal CLI: introspect a sample shape → (describe | zero)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing::info;

use crate::registry::{AggregateZero, DescriptorId, Registry, RegistryConfig};
use crate::sample::{Person, Thing};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// build canonical type descriptors for a sample shape and print the graph or a zero instance
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// log level for stderr output (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the indented debug view of the descriptor graph
    Describe(DescribeOut),
    /// print the zero instance of one field of the root aggregate as JSON
    Zero(ZeroOut),
}

#[derive(Args, Debug, Clone)]
struct RegistrySettings {
    /// which built-in shape to introspect
    #[arg(long, value_enum, default_value_t = SampleKind::Thing)]
    sample: SampleKind,

    /// how aggregate zero instances are derived
    #[arg(long, value_enum)]
    aggregate_zero: Option<AggregateZeroArg>,

    /// JSON registry config; `--aggregate-zero` wins over the file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct DescribeOut {
    #[command(flatten)]
    registry_settings: RegistrySettings,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ZeroOut {
    #[command(flatten)]
    registry_settings: RegistrySettings,

    /// field of the root aggregate
    #[arg(long)]
    field: String,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum SampleKind {
    /// `Option<Thing>`: self pointers, maps, nested anonymous structs
    Thing,
    /// `Person`: a flat named record
    Person,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum AggregateZeroArg {
    OwnShape,
    OutermostRoot,
}

impl From<AggregateZeroArg> for AggregateZero {
    fn from(arg: AggregateZeroArg) -> Self {
        match arg {
            AggregateZeroArg::OwnShape => Self::OwnShape,
            AggregateZeroArg::OutermostRoot => Self::OutermostRoot,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl RegistrySettings {
    fn load_config(&self) -> Result<RegistryConfig> {
        let mut config = match self.config.as_ref() {
            Some(path) => {
                let source = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                serde_json::from_str::<RegistryConfig>(&source)
                    .with_context(|| format!("failed to parse config file {}", path.display()))?
            }
            None => RegistryConfig::default(),
        };
        if let Some(policy) = self.aggregate_zero {
            config.aggregate_zero = policy.into();
        }
        Ok(config)
    }

    fn build(&self) -> Result<(Registry, DescriptorId)> {
        let mut registry = Registry::with_config(self.load_config()?);
        let root = match self.sample {
            SampleKind::Thing => registry.introspect(&Some(Thing::default())),
            SampleKind::Person => registry.introspect(&Person::default()),
        }
        .with_context(|| format!("failed to introspect sample {:?}", self.sample))?;
        info!(descriptors = registry.len(), "registry built");
        Ok((registry, root))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Describe(target) => {
                let (registry, root) = target.registry_settings.build()?;
                let root = registry
                    .descriptor(root)
                    .ok_or_else(|| anyhow!("root descriptor {root} missing"))?;
                let dump = root.debug_format();
                match target.out.as_ref() {
                    Some(out) => write_output(out, &dump)?,
                    None => print!("{}", highlight_recursion(&dump)),
                }
            }
            Command::Zero(target) => {
                let (registry, root) = target.registry_settings.build()?;
                let root = registry
                    .descriptor(root)
                    .ok_or_else(|| anyhow!("root descriptor {root} missing"))?;
                // Walk through a pointer root to the aggregate it points at.
                let record = root.pointer_target().unwrap_or(root);
                let field = record
                    .field(&target.field)
                    .ok_or_else(|| anyhow!("{} has no field {:?}", record.name(), target.field))?;
                let zero = field
                    .zero()
                    .ok_or_else(|| anyhow!("field {:?} has no zero instance", target.field))?;
                info!(field = %target.field, zero = %zero, "resolved zero");
                let json_src = serde_json::to_string_pretty(zero)?;
                match target.out.as_ref() {
                    Some(out) => write_output(out, &json_src)?,
                    None => println!("{json_src}"),
                }
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
}

fn highlight_recursion(dump: &str) -> String {
    let mut out = String::with_capacity(dump.len());
    for line in dump.lines() {
        match line.strip_suffix(" // recursion") {
            Some(head) => {
                out.push_str(head);
                out.push_str(&" // recursion".yellow().to_string());
            }
            None => out.push_str(line),
        }
        out.push('\n');
    }
    out
}
