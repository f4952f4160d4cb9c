use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use file_sorter_core::{
    collect_doctor_info, delete_paths, extension_of, file_details, format_megabytes,
    group_thousands, load_config, normalize_extension, render_deletion_summary,
    render_statistics_line, run_pipeline, summarize_selection, Category, Classifier, DeletionMode, DeletionRequest,
    PipelineOutput, PipelineStage, ScanOptions, SorterConfig,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "file-sorter",
    version,
    about = "Inventory a directory tree by file category and clean it up in batches."
)]
struct Cli {
    /// JSON configuration file (extension sets, chunk capacity).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan a directory and print category statistics.
    Scan(ScanArgs),
    /// Delete files, to the trash or permanently.
    Delete(DeleteArgs),
    /// Print the category for extensions or file names.
    Classify(ClassifyArgs),
    /// Summarize a selection of files.
    Select(SelectArgs),
    /// Show environment and effective configuration.
    Doctor,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum CliDeletionMode {
    Trash,
    #[value(alias = "perm")]
    Permanent,
}

impl From<CliDeletionMode> for DeletionMode {
    fn from(value: CliDeletionMode) -> Self {
        match value {
            CliDeletionMode::Trash => DeletionMode::Trash,
            CliDeletionMode::Permanent => DeletionMode::Permanent,
        }
    }
}

#[derive(Debug, Args)]
struct ScanArgs {
    /// Directory to inventory.
    root: PathBuf,

    /// Records sorted together per chunk (overrides the config file).
    #[arg(long, value_name = "N")]
    chunk_size: Option<usize>,

    /// Log each progress step.
    #[arg(long)]
    progress: bool,

    /// Print the full inventory and buckets as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    /// Files to delete.
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// `trash` is recoverable, `permanent` is not.
    #[arg(long, default_value = "trash")]
    mode: CliDeletionMode,

    /// Confirm the deletion.
    #[arg(long)]
    yes: bool,

    /// Directory to scan again after the batch.
    #[arg(long, value_name = "DIR")]
    rescan: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ClassifyArgs {
    /// Extensions (`jpg`, `.PDF`) or file names.
    #[arg(required = true)]
    items: Vec<String>,
}

#[derive(Debug, Args)]
struct SelectArgs {
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ScanReport<'a> {
    generated_at: String,
    root: &'a Path,
    chunk_capacity: usize,
    #[serde(flatten)]
    output: &'a PipelineOutput,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan(args) => run_scan_command(args, config),
        Commands::Delete(args) => run_delete_command(args, &config),
        Commands::Classify(args) => {
            run_classify_command(args, &config);
            Ok(())
        }
        Commands::Select(args) => {
            run_select_command(args, &config);
            Ok(())
        }
        Commands::Doctor => {
            run_doctor_command(&config);
            Ok(())
        }
    }
}

fn resolve_config(path: Option<&Path>) -> Result<SorterConfig> {
    match path {
        Some(path) => load_config(path),
        None => SorterConfig::default().validate(),
    }
}

fn run_scan_command(args: ScanArgs, mut config: SorterConfig) -> Result<()> {
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_capacity = chunk_size;
        config = config.validate()?;
    }
    let output = scan_and_distribute(&args.root, &config, args.progress)?;

    if args.json {
        let report = ScanReport {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            root: &args.root,
            chunk_capacity: config.chunk_capacity,
            output: &output,
        };
        let payload =
            serde_json::to_string_pretty(&report).context("failed to serialize scan report")?;
        println!("{payload}");
        return Ok(());
    }

    println!("{}", render_statistics_line(&output.result));
    Ok(())
}

fn scan_and_distribute(
    root: &Path,
    config: &SorterConfig,
    progress: bool,
) -> Result<PipelineOutput> {
    let options = ScanOptions::from_config(root, config);
    let output = run_pipeline(&options, |event| {
        if progress {
            let label = match event.stage {
                PipelineStage::Scanning => "scanning",
                PipelineStage::Distributing => "updating tables",
            };
            info!("{label}: {}% ({}/{})", event.percent, event.processed, event.total);
        }
    })
    .with_context(|| format!("failed to scan {}", root.display()))?;
    Ok(output)
}

fn run_delete_command(args: DeleteArgs, config: &SorterConfig) -> Result<()> {
    let request = DeletionRequest::from_selection(args.paths, args.mode.into());
    if request.paths.is_empty() {
        println!("Nothing to delete: none of the given paths exist.");
        return Ok(());
    }
    if !args.yes {
        anyhow::bail!(
            "refusing to delete {} file(s) ({:?}) without --yes",
            request.paths.len(),
            request.mode
        );
    }

    let outcome = delete_paths(&request);
    print!("{}", render_deletion_summary(&outcome));
    if outcome.is_complete_success() {
        println!();
    }

    if let Some(root) = args.rescan.filter(|root| root.is_dir()) {
        let output = scan_and_distribute(&root, config, false)?;
        println!("{}", render_statistics_line(&output.result));
    }

    if !outcome.is_complete_success() {
        anyhow::bail!("{} deletion(s) failed", outcome.failures.len());
    }
    Ok(())
}

fn run_classify_command(args: ClassifyArgs, config: &SorterConfig) {
    let classifier = Classifier::new(&config.classifier);
    for item in args.items {
        let path = Path::new(&item);
        let extension = if path.extension().is_some() {
            extension_of(path)
        } else {
            normalize_extension(&item).unwrap_or_default()
        };
        println!("{item}: {}", classifier.classify(&extension).as_str());
    }
}

fn run_select_command(args: SelectArgs, config: &SorterConfig) {
    let classifier = Classifier::new(&config.classifier);
    if let [path] = args.paths.as_slice() {
        match file_details(path, &classifier) {
            Some(details) => {
                println!("Name: {}", details.name);
                if let Some(modified) = details.modified {
                    println!("Modified: {modified}");
                }
                println!("Size: {}", details.size_text);
                println!("Type: {}", details.extension);
            }
            None => println!("Not found: {}", path.display()),
        }
        return;
    }

    let summary = summarize_selection(args.paths, &classifier);

    println!("Selected: {} files", summary.selected);
    println!("Total Size: {}", format_megabytes(summary.total_size_bytes));
    let types = Category::ALL
        .iter()
        .map(|category| {
            format!(
                "{} {}",
                group_thousands(summary.counts.get(category).copied().unwrap_or(0)),
                category.label().to_lowercase()
            )
        })
        .collect::<Vec<_>>();
    println!("Types: {}", types.join(", "));
    if let Some(category) = summary.uniform_category {
        println!("All selected files are {}.", category.label().to_lowercase());
    }
}

fn run_doctor_command(config: &SorterConfig) {
    let info = collect_doctor_info(config);
    println!("OS: {} ({})", info.os, info.arch);
    if let Some(current_dir) = info.current_dir {
        println!("Current directory: {}", current_dir);
    }
    println!("Trash supported: {}", info.trash_supported);
    println!("Chunk capacity: {}", info.chunk_capacity);
    println!("Images: {}", info.image_extensions.join(" "));
    println!("Videos: {}", info.video_extensions.join(" "));
    println!("Documents: {}", info.document_extensions.join(" "));
    for note in info.notes {
        println!("Note: {}", note);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
