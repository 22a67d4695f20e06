//! docforge CLI - Markdown to Word document compiler

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docforge::pipeline::{CONTENT_TEMPLATE, SIGNATURE_TEMPLATE};
use docforge::{
    inspect_file, Docx, GenerateOptions, Generator, JsonFormat, PandocConverter, Step,
    StyleOptions, StyleReport,
};

#[derive(Parser)]
#[command(name = "docforge")]
#[command(version)]
#[command(about = "Compile Markdown with YAML front matter into styled Word documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a Word document from a Markdown source
    Build {
        /// Markdown source with YAML front matter
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output .docx file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Signature page template
        #[arg(long, value_name = "FILE", env = "DOCFORGE_SIGNATURE_TEMPLATE")]
        signature_template: Option<PathBuf>,

        /// Title page template
        #[arg(long, value_name = "FILE", env = "DOCFORGE_CONTENT_TEMPLATE")]
        content_template: Option<PathBuf>,

        /// Reference document for body styles (defaults to the signature template)
        #[arg(long, value_name = "FILE", env = "DOCFORGE_REFERENCE_DOC")]
        reference_doc: Option<PathBuf>,

        /// Pandoc executable
        #[arg(long, value_name = "PROGRAM", env = "DOCFORGE_PANDOC", default_value = "pandoc")]
        pandoc: PathBuf,

        /// Omit the table of contents
        #[arg(long, env = "DOCFORGE_NO_TOC")]
        no_toc: bool,

        /// Table of contents depth (1-9)
        #[arg(long, env = "DOCFORGE_TOC_DEPTH", default_value = "6")]
        toc_depth: u8,

        /// Print the generation report as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Apply style markers to a converted body fragment
    Style {
        /// Body fragment (.docx)
        #[arg(value_name = "FRAGMENT")]
        fragment: PathBuf,

        /// Output file (fragment is rewritten in place if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Show document statistics
    Inspect {
        /// Word document
        #[arg(value_name = "DOCX")]
        input: PathBuf,

        /// Dump the document body as JSON
        #[arg(long)]
        json: bool,

        /// Output compact JSON
        #[arg(long, requires = "json")]
        compact: bool,

        /// Output file for JSON (stdout if not specified)
        #[arg(short, long, value_name = "FILE", requires = "json")]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct StyleArgs {
    /// Table style for chart markers
    #[arg(long, value_name = "NAME", env = "DOCFORGE_CHART_STYLE", default_value = "Chart")]
    chart_style: String,

    /// Table style for list markers
    #[arg(long, value_name = "NAME", env = "DOCFORGE_LIST_STYLE", default_value = "List")]
    list_style: String,

    /// Style for tables without a marker (defaults to the list style)
    #[arg(long, value_name = "NAME", env = "DOCFORGE_DEFAULT_TABLE_STYLE")]
    default_table_style: Option<String>,

    /// Keep existing styles on tables without a marker
    #[arg(long, env = "DOCFORGE_KEEP_TABLE_STYLES")]
    keep_table_styles: bool,
}

impl From<StyleArgs> for StyleOptions {
    fn from(args: StyleArgs) -> Self {
        let options = StyleOptions::new()
            .with_chart_style(args.chart_style)
            .with_list_style(args.list_style)
            .with_keep_table_styles(args.keep_table_styles);
        match args.default_table_style {
            Some(name) => options.with_default_table_style(name),
            None => options,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build {
            input,
            output,
            signature_template,
            content_template,
            reference_doc,
            pandoc,
            no_toc,
            toc_depth,
            json,
            style,
        } => {
            let converter = PandocConverter::new()
                .with_program(pandoc)
                .with_toc(!no_toc)
                .with_toc_depth(toc_depth);
            build_options(signature_template, content_template, reference_doc, style.into())
                .and_then(|options| cmd_build(&input, &output, options, converter, json))
        }
        Commands::Style {
            fragment,
            output,
            style,
        } => cmd_style(&fragment, output.as_deref(), style.into()),
        Commands::Inspect {
            input,
            json,
            compact,
            output,
        } => cmd_inspect(&input, json, compact, output.as_deref()),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Directory holding the default templates: the executable's directory.
fn default_template_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let exe = std::env::current_exe()?;
    let dir = exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    log::debug!("Default template directory: {}", dir.display());
    Ok(dir)
}

fn build_options(
    signature_template: Option<PathBuf>,
    content_template: Option<PathBuf>,
    reference_doc: Option<PathBuf>,
    style: StyleOptions,
) -> Result<GenerateOptions, Box<dyn std::error::Error>> {
    let (signature, content) = match (signature_template, content_template) {
        (Some(signature), Some(content)) => (signature, content),
        (signature, content) => {
            let dir = default_template_dir()?;
            (
                signature.unwrap_or_else(|| dir.join(SIGNATURE_TEMPLATE)),
                content.unwrap_or_else(|| dir.join(CONTENT_TEMPLATE)),
            )
        }
    };

    log::info!(
        "Templates: signature={}, content={}",
        signature.display(),
        content.display()
    );
    let mut options = GenerateOptions::new(signature, content).with_style_options(style);
    if let Some(reference) = reference_doc {
        options = options.with_reference_doc(reference);
    }
    Ok(options)
}

fn cmd_build(
    input: &Path,
    output: &Path,
    options: GenerateOptions,
    converter: PandocConverter,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let generator = Generator::new(options).with_converter(converter);

    let pb = ProgressBar::new(Step::ALL.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let result = generator.generate_with_progress(input, output, |step| {
        let position = Step::ALL.iter().position(|s| *s == step).unwrap_or(0);
        pb.set_position(position as u64);
        pb.set_message(format!("{}...", step));
    });
    let report = match result {
        Ok(report) => {
            pb.finish_with_message("Done!");
            report
        }
        Err(e) => {
            pb.abandon();
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for warning in &report.warnings {
        println!("{} {}", "warning:".yellow().bold(), warning.yellow());
    }
    print_style_report(&report.style);

    println!();
    println!("{} {}", "Saved to".green(), report.output.display());
    println!(
        "  {} {} metadata keys, {} revisions, {} placeholders",
        "├─".dimmed(),
        report.metadata_keys.len(),
        report.revisions,
        report.placeholders
    );
    println!(
        "  {} {} tables styled, {} paragraphs styled",
        "└─".dimmed(),
        report.style.styled_tables(),
        report.style.styled_paragraphs
    );

    Ok(())
}

fn cmd_style(
    fragment: &Path,
    output: Option<&Path>,
    options: StyleOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut docx = Docx::open(fragment)?;
    let report = docforge::style::process(&mut docx, &options);
    let target = output.unwrap_or(fragment);
    docx.save(target)?;
    log::info!("Styled {} -> {}", fragment.display(), target.display());

    print_style_report(&report);
    println!(
        "{} {} ({} tables, {} paragraphs styled; {} marker paragraphs removed)",
        "Saved to".green(),
        target.display(),
        report.styled_tables(),
        report.styled_paragraphs,
        report.deleted_paragraphs
    );
    Ok(())
}

fn print_style_report(report: &StyleReport) {
    for warning in &report.warnings {
        println!("{} {}", "warning:".yellow().bold(), warning.to_string().yellow());
    }
}

fn cmd_inspect(
    input: &Path,
    json: bool,
    compact: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        let format = if compact {
            JsonFormat::Compact
        } else {
            JsonFormat::Pretty
        };
        let json = docforge::to_json(input, format)?;

        if let Some(path) = output {
            fs::write(path, &json)?;
            println!("{} {}", "Saved to".green(), path.display());
        } else {
            println!("{}", json);
        }
        return Ok(());
    }

    let inspection = inspect_file(input)?;
    let stats = &inspection.stats;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Main part".bold(), inspection.main_part);
    println!("{}: {}", "Parts".bold(), inspection.part_count);
    println!("{}: {}", "Styles".bold(), inspection.style_count);
    println!("{}: {}", "Headers/footers".bold(), inspection.header_footer_parts);

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Paragraphs".bold(), stats.paragraphs);
    println!("{}: {}", "Words".bold(), stats.words);
    println!(
        "{}: {} ({} styled, {} unstyled)",
        "Tables".bold(),
        stats.tables,
        stats.styled_tables,
        stats.unstyled_tables
    );
    println!("{}: {}", "Raw blocks".bold(), stats.raw_blocks);

    for (style, count) in &stats.table_styles {
        let name = if style.is_empty() { "(none)" } else { style };
        println!("  {} {}: {}", "├─".dimmed(), name, count);
    }

    if stats.has_residual_markers() {
        println!();
        println!(
            "{} {} paragraphs still hold style markers: {:?}",
            "warning:".yellow().bold(),
            stats.residual_markers.len(),
            stats.residual_markers
        );
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docforge".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Markdown to Word document compiler");
    println!();
    println!("Templates: {} / {}", SIGNATURE_TEMPLATE, CONTENT_TEMPLATE);
    println!("License: MIT");
}
