use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use content_blocks_core::{CompiledResult, FieldTypeCatalog, SchemaCompiler};
use content_blocks_loader::{
    DEFAULT_CONFIG_FILE, DocumentSet, LoaderError, OutputFormat, ProjectConfig, load_base_schema,
};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "content-blocks")]
#[command(about = "Compile content block schema documents", version)]
struct Cli {
    /// Project configuration file (default: ./content-blocks.yaml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile all content blocks and print the merged result.
    Compile(CompileArgs),
    /// Compile all content blocks and report the first error.
    Validate(SourceArgs),
    /// Print the translation keys collected while compiling.
    LanguageKeys(LanguageKeysArgs),
    /// List the registered field types.
    Types(TypesArgs),
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Content block roots; overrides the configured sources.
    sources: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct CompileArgs {
    #[command(flatten)]
    sources: SourceArgs,
    /// Output format (json or yaml); overrides the configured format.
    #[arg(long)]
    format: Option<OutputFormat>,
    /// Write to a file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct LanguageKeysArgs {
    #[command(flatten)]
    sources: SourceArgs,
    /// Output format (json or yaml); overrides the configured format.
    #[arg(long)]
    format: Option<OutputFormat>,
    /// Print key/default pairs per content block instead of full references.
    #[arg(long)]
    scaffold: bool,
}

#[derive(Debug, Args)]
struct TypesArgs {
    /// Print full type descriptors in this format instead of names.
    #[arg(long)]
    format: Option<OutputFormat>,
}

/// Configuration plus the directory its relative paths resolve against.
struct Project {
    config: ProjectConfig,
    base_dir: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Compile(args) => run_compile(cli.config.as_deref(), args),
        Command::Validate(args) => run_validate(cli.config.as_deref(), args),
        Command::LanguageKeys(args) => run_language_keys(cli.config.as_deref(), args),
        Command::Types(args) => run_types(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
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
        .with_target(false)
        .init();
}

fn run_compile(config: Option<&Path>, args: CompileArgs) -> Result<(), String> {
    let project = load_project(config)?;
    let result = compile_project(&project, &args.sources)?;
    let format = args.format.unwrap_or(project.config.output.format);
    let rendered = render(&result, format)?;

    match args.output {
        Some(path) => {
            fs::write(&path, rendered)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            eprintln!("Wrote {} table(s) to {}", result.tables.len(), path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn run_validate(config: Option<&Path>, args: SourceArgs) -> Result<(), String> {
    let project = load_project(config)?;
    let result = compile_project(&project, &args)?;

    let content_types: usize = result.tables.values().map(|t| t.content_types.len()).sum();
    println!(
        "Validated {} content type(s) across {} table(s).",
        content_types,
        result.tables.len()
    );
    for (name, table) in &result.tables {
        println!(
            "  {name}: {} field(s), {} content type(s)",
            table.fields.len(),
            table.content_types.len()
        );
    }
    Ok(())
}

fn run_language_keys(config: Option<&Path>, args: LanguageKeysArgs) -> Result<(), String> {
    let project = load_project(config)?;
    let result = compile_project(&project, &args.sources)?;
    let format = args.format.unwrap_or(project.config.output.format);

    let rendered = if args.scaffold {
        render(&result.language_keys.to_source_map(), format)?
    } else {
        render(&result.language_keys, format)?
    };
    println!("{rendered}");
    Ok(())
}

fn run_types(args: TypesArgs) -> Result<(), String> {
    let catalog = FieldTypeCatalog::standard();
    match args.format {
        Some(format) => {
            let descriptors: Vec<_> = catalog.iter().collect();
            println!("{}", render(&descriptors, format)?);
        }
        None => {
            for name in catalog.names() {
                println!("{name}");
            }
        }
    }
    Ok(())
}

fn load_project(config: Option<&Path>) -> Result<Project, String> {
    let path = match config {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        }
    };

    match path {
        Some(path) => {
            let config = ProjectConfig::load(&path)
                .map_err(|e| format!("failed to load {}: {e}", path.display()))?;
            let base_dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            debug!(config = %path.display(), "loaded project configuration");
            Ok(Project { config, base_dir })
        }
        None => Ok(Project {
            config: ProjectConfig::default(),
            base_dir: PathBuf::from("."),
        }),
    }
}

fn compile_project(project: &Project, args: &SourceArgs) -> Result<CompiledResult, String> {
    let loaded = if args.sources.is_empty() {
        DocumentSet::from_config(&project.config, &project.base_dir)
    } else {
        args.sources
            .iter()
            .fold(
                DocumentSet::builder().exclude(project.config.exclude.iter().cloned()),
                |builder, root| builder.from_dir(root),
            )
            .build()
    };
    let set = loaded.map_err(describe)?;

    let catalog = FieldTypeCatalog::standard();
    let mut compiler = match project.config.base_schema_path(&project.base_dir) {
        Some(path) => {
            let base = load_base_schema(&path, &catalog).map_err(describe)?;
            SchemaCompiler::with_parts(catalog, base)
        }
        None => SchemaCompiler::new(),
    };

    set.compile(&mut compiler).map_err(describe)
}

/// Compile errors carry their stable code so scripts can match on it.
fn describe(err: LoaderError) -> String {
    match err {
        LoaderError::Compile(inner) => format!("[{}] {inner}", inner.code()),
        other => other.to_string(),
    }
}

fn render<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
        OutputFormat::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
    }
}
