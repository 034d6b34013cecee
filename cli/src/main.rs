//! shipdoc CLI - shipping-document records and template merging

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use shipdoc::merge::{scan_with, TokenPattern};
use shipdoc::record::FieldKind;
use shipdoc::{
    load_records, load_template, print_record, render_bytes, render_document, save_document,
    Config, DataRecord, DocumentFamily, JsonFileStore, MergeEngine, MergeOptions, MergeReport,
    OutputFormat, RecordStore, RowBinding, ScanReport,
};

#[derive(Parser)]
#[command(name = "shipdoc")]
#[command(version)]
#[command(about = "Capture shipping-document records and merge them into templates", long_about = None)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(long, global = true, env = "SHIPDOC_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Record store directory (overrides the config file)
    #[arg(long, global = true, env = "SHIPDOC_STORE", value_name = "DIR")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the placeholders of a template
    Scan {
        /// Template file
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        /// Record data to check against the template
        #[arg(short, long, value_name = "FILE")]
        data: Option<PathBuf>,
    },

    /// Merge JSON record data into a template
    Merge {
        /// Template file
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        /// Record data (one object, or an array for a batch)
        #[arg(value_name = "DATA")]
        data: PathBuf,

        /// Output file, or directory for a batch (stdout if not specified)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Output format for stdout and batch files
        #[arg(short, long, value_name = "FORMAT")]
        format: Option<OutputFormat>,

        #[command(flatten)]
        merge: MergeArgs,
    },

    /// Manage stored records
    Record {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// Merge a stored record into its family template and save it
    Print {
        /// Document family
        #[arg(value_name = "FAMILY")]
        family: DocumentFamily,

        /// Record id
        #[arg(value_name = "ID")]
        id: String,

        #[command(flatten)]
        merge: MergeArgs,
    },

    /// Show the fields of a document family
    Schema {
        /// Document family
        #[arg(value_name = "FAMILY")]
        family: DocumentFamily,
    },

    /// Render a template or saved document as Markdown, text, JSON, or docx
    Render {
        /// Document file
        #[arg(value_name = "DOC")]
        input: PathBuf,

        /// Output format (md, txt, json, docx)
        #[arg(short, long, default_value = "md")]
        format: OutputFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum RecordAction {
    /// Validate and store a record from a JSON file
    Add {
        #[arg(value_name = "FAMILY")]
        family: DocumentFamily,
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List stored records
    #[command(alias = "ls")]
    List {
        #[arg(value_name = "FAMILY")]
        family: DocumentFamily,
    },

    /// Print a stored record as JSON
    Show {
        #[arg(value_name = "FAMILY")]
        family: DocumentFamily,
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Replace a stored record with the contents of a JSON file
    Edit {
        #[arg(value_name = "FAMILY")]
        family: DocumentFamily,
        #[arg(value_name = "ID")]
        id: String,
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Delete a stored record
    #[command(alias = "rm")]
    Delete {
        #[arg(value_name = "FAMILY")]
        family: DocumentFamily,
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(clap::Args)]
struct MergeArgs {
    /// Join text runs before substituting so split placeholders resolve
    #[arg(long)]
    coalesce: bool,

    /// Pin a group's template row, e.g. items=0:1
    #[arg(long = "bind", value_name = "GROUP=TABLE:ROW", value_parser = parse_binding)]
    bindings: Vec<(String, RowBinding)>,

    /// Merge batches on a single thread
    #[arg(long)]
    sequential: bool,
}

impl MergeArgs {
    fn options(&self, config: &Config) -> MergeOptions {
        let mut options = MergeOptions::new()
            .with_markers(config.markers.clone())
            .with_parallel(!self.sequential);
        if self.coalesce {
            options = options.coalesce();
        }
        for (group, binding) in &self.bindings {
            options = options.bind(group.clone(), *binding);
        }
        options
    }
}

fn parse_binding(s: &str) -> Result<(String, RowBinding), String> {
    let (group, at) = s
        .split_once('=')
        .ok_or_else(|| format!("expected GROUP=TABLE:ROW, got '{}'", s))?;
    let binding = at.parse::<RowBinding>().map_err(|e| e.to_string())?;
    Ok((group.trim().to_string(), binding))
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let config = || load_config(cli.config.as_deref(), cli.store.clone());

    let result = match cli.command {
        Some(Commands::Scan { template, data }) => {
            config().and_then(|c| cmd_scan(&c, &template, data.as_deref()))
        }
        Some(Commands::Merge {
            template,
            data,
            output,
            format,
            merge,
        }) => config().and_then(|c| {
            cmd_merge(&template, &data, output.as_deref(), format, &merge.options(&c))
        }),
        Some(Commands::Record { action }) => config().and_then(|c| cmd_record(&c, action)),
        Some(Commands::Print { family, id, merge }) => {
            config().and_then(|c| cmd_print(&c, family, &id, &merge.options(&c)))
        }
        Some(Commands::Schema { family }) => {
            cmd_schema(family);
            Ok(())
        }
        Some(Commands::Render {
            input,
            format,
            output,
        }) => cmd_render(&input, format, output.as_deref()),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!("{}", "Usage: shipdoc <COMMAND>".yellow());
            println!("       shipdoc --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_config(
    path: Option<&Path>,
    store: Option<PathBuf>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::load_or_default(path)?;
    if let Some(dir) = store {
        config = config.with_store_dir(dir);
    }
    Ok(config)
}

fn cmd_scan(
    config: &Config,
    template: &Path,
    data: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_template(template)?;
    let pattern = token_pattern(config)?;

    let Some(data) = data else {
        let keys = scan_with(&doc, &pattern);
        println!("{} ({})", "Placeholders".cyan().bold(), keys.len());
        println!("{}", "─".repeat(40).dimmed());
        for key in keys {
            println!("  {}", key);
        }
        return Ok(());
    };

    let record = first_record(data)?;
    let report = ScanReport::with_pattern(&doc, &record, &pattern);

    print_key_list("Found", &report.found, |s| s.green());
    print_key_list("Missing", &report.missing, |s| s.red());
    print_key_list("Unused", &report.unused, |s| s.yellow());

    if report.is_complete() {
        println!("\n{}", "Every placeholder has a value.".green().bold());
    }
    Ok(())
}

fn token_pattern(config: &Config) -> shipdoc::Result<TokenPattern> {
    TokenPattern::new(config.markers.clone())
}

fn print_key_list<'a>(
    title: &str,
    keys: impl IntoIterator<Item = &'a String>,
    paint: impl Fn(&str) -> colored::ColoredString,
) {
    let keys: Vec<&String> = keys.into_iter().collect();
    println!("{} ({})", title.bold(), keys.len());
    for key in keys {
        println!("  {}", paint(key));
    }
}

fn first_record(path: &Path) -> Result<DataRecord, Box<dyn std::error::Error>> {
    load_records(path)?
        .into_iter()
        .next()
        .ok_or_else(|| format!("{} holds no records", path.display()).into())
}

fn cmd_merge(
    template: &Path,
    data: &Path,
    output: Option<&Path>,
    format: Option<OutputFormat>,
    options: &MergeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_template(template)?;
    let engine = MergeEngine::new(options.clone())?;

    let records = match serde_json::from_str(&fs::read_to_string(data)?)? {
        serde_json::Value::Array(values) => values
            .into_iter()
            .map(DataRecord::from_json)
            .collect::<shipdoc::Result<Vec<_>>>()?,
        value => {
            let (merged, report) = engine.merge(doc, &DataRecord::from_json(value)?)?;

            if let Some(path) = output {
                save_document(&merged, path)?;
                println!("{} {}", "Saved to".green(), path.display());
            } else {
                println!(
                    "{}",
                    render_document(&merged, format.unwrap_or(OutputFormat::Markdown))?
                );
            }
            print_report(&report);
            return Ok(());
        }
    };

    let format = format.unwrap_or_default();
    let stem = template.file_stem().unwrap_or_default().to_string_lossy();
    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(format!("{}_merged", stem)));
    fs::create_dir_all(&output_dir)?;

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    pb.set_message("Merging...");
    let results = engine.merge_batch(&doc, &records);

    pb.set_message("Writing...");
    let mut failed = 0;
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok((merged, _)) => {
                let path = output_dir.join(format!("{}-{}.{}", stem, i + 1, format.extension()));
                save_document(&merged, &path)?;
            }
            Err(e) => {
                pb.println(format!("{} record {}: {}", "Skipped".yellow(), i + 1, e));
                failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Done!");

    println!(
        "\n{} {} documents written to {}",
        "Done!".green().bold(),
        records.len() - failed,
        output_dir.display()
    );
    Ok(())
}

fn print_report(report: &MergeReport) {
    eprintln!(
        "{} {} substitutions, {} rows inserted",
        "Merged:".cyan().bold(),
        report.total_substitutions(),
        report.rows_inserted()
    );
    for group in &report.groups {
        eprintln!(
            "  {} {} at table {}, row {} ({} rows)",
            "├─".dimmed(),
            group.group,
            group.at.table,
            group.at.row,
            group.rows_inserted
        );
    }
    if !report.unresolved.is_empty() {
        let keys: Vec<&str> = report.unresolved.iter().map(String::as_str).collect();
        eprintln!("{} {}", "Unresolved:".yellow().bold(), keys.join(", "));
    }
}

fn cmd_record(config: &Config, action: RecordAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = JsonFileStore::open(&config.store_dir)?;

    match action {
        RecordAction::Add { family, file } => {
            let record = family.prepare(first_record(&file)?)?;
            let stored = store.insert(family, record)?;
            println!("{} {} {}", "Added".green(), family, stored.id.bold());
        }
        RecordAction::List { family } => {
            let records = store.list(family)?;
            println!("{} ({})", family.title().cyan().bold(), records.len());
            println!("{}", "─".repeat(60).dimmed());
            for stored in records {
                println!(
                    "{}  {}  {}",
                    stored.id,
                    stored.created.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                    stored.headline()
                );
            }
        }
        RecordAction::Show { family, id } => {
            let stored = store.get(family, &id)?;
            println!("{}", serde_json::to_string_pretty(&stored.data.to_json())?);
        }
        RecordAction::Edit { family, id, file } => {
            let record = family.prepare(first_record(&file)?)?;
            let stored = store.update(family, &id, record)?;
            println!("{} {} {}", "Updated".green(), family, stored.id.bold());
        }
        RecordAction::Delete { family, id } => {
            store.delete(family, &id)?;
            println!("{} {} {}", "Deleted".green(), family, id.bold());
        }
    }
    Ok(())
}

fn cmd_print(
    config: &Config,
    family: DocumentFamily,
    id: &str,
    options: &MergeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = JsonFileStore::open(&config.store_dir)?;
    let path = print_record(&store, config, family, id, options)?;
    println!("{} {}", "Saved to".green(), path.display());
    Ok(())
}

fn cmd_schema(family: DocumentFamily) {
    let schema = family.schema();

    println!("{} ({})", family.title().cyan().bold(), family);
    println!("{}", "─".repeat(60).dimmed());
    for field in &schema.fields {
        print_field(field, "");
    }

    for group in &schema.groups {
        println!();
        let required = if group.required { " (required)" } else { "" };
        println!("{} {}{}", group.name.bold(), group.label.dimmed(), required);
        for field in &group.fields {
            print_field(field, "  ");
        }
    }
}

fn print_field(field: &shipdoc::record::FieldSpec, indent: &str) {
    let kind = match &field.kind {
        FieldKind::Text => "text".to_string(),
        FieldKind::Date => "date".to_string(),
        FieldKind::Number => "number".to_string(),
        FieldKind::Choice(options) => format!("one of {}", options.join(" | ")),
    };
    let marker = if field.required { "*".red().to_string() } else { " ".to_string() };
    println!(
        "{}{}{:<28} {:<12} {}",
        indent,
        marker,
        field.name,
        kind,
        field.label.dimmed()
    );
}

fn cmd_render(
    input: &Path,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_template(input)?;

    if let Some(path) = output {
        fs::write(path, render_bytes(&doc, format)?)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", render_document(&doc, format)?);
    }
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "shipdoc".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Shipping-document records and template merging");
    println!();
    println!("License: MIT");
}
