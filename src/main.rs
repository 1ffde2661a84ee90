use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;
use relgraph::config::{self, MappingStrategy, NamingConvention};
use relgraph::relational::metadata::SnapshotSource;
use relgraph::relational::vendor::Vendor;
use relgraph::SchemaMapper;
use std::path::PathBuf;
use validator::Validate;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

/// relgraph - map a relational catalog onto a property-graph schema
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Mapper configuration file (YAML). Without it, RELGRAPH_* variables are used
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog snapshot to map (YAML, or JSON with a .json extension)
    #[arg(long)]
    snapshot: PathBuf,

    /// Report output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    format: OutputFormat,

    /// Source database vendor
    #[arg(long)]
    vendor: Option<Vendor>,

    /// Schema to introspect
    #[arg(long)]
    schema: Option<String>,

    /// Naming convention: java or original
    #[arg(long)]
    naming: Option<NamingConvention>,

    /// Mapping strategy: naive or naive-aggregate
    #[arg(long)]
    strategy: Option<MappingStrategy>,

    /// Only map these tables
    #[arg(long = "include", num_args = 1..)]
    include: Vec<String>,

    /// Skip these tables (ignored when --include is given)
    #[arg(long = "exclude", num_args = 1..)]
    exclude: Vec<String>,

    /// Hibernate mapping file describing inheritance hierarchies
    #[arg(long)]
    descriptor: Option<PathBuf>,
}

impl From<&Cli> for config::CliConfig {
    fn from(cli: &Cli) -> Self {
        config::CliConfig {
            vendor: cli.vendor,
            data_source: Some(cli.snapshot.display().to_string()),
            schema: cli.schema.clone(),
            naming_convention: cli.naming,
            strategy: cli.strategy,
            include_tables: cli.include.clone(),
            exclude_tables: cli.exclude.clone(),
            inheritance_descriptor: cli.descriptor.clone(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logger - defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::MapperConfig::from_yaml_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => config::MapperConfig::from_env().context("reading RELGRAPH_* environment")?,
    };
    config.merge_cli(config::CliConfig::from(&cli));
    config.validate().context("invalid configuration")?;

    let source = SnapshotSource::from_file(&cli.snapshot)
        .with_context(|| format!("loading catalog snapshot {}", cli.snapshot.display()))?;

    let mut mapper = SchemaMapper::with_default_types(config, Box::new(source));
    mapper.run()?;
    info!("\n{}", mapper.statistics().summary());

    let report = mapper.report();
    let output = match cli.format {
        OutputFormat::Yaml => report.to_yaml()?,
        OutputFormat::Json => report.to_json()?,
    };
    println!("{}", output);

    Ok(())
}
