use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use docguard_core::{
    EngineConfig, ExtractionError, Outcome, ReviewSession, ReviewStep, StepProfiler, SuggestionId,
};

#[derive(Parser)]
#[command(name = "docguard")]
#[command(about = "Review a document for known typos, grammar slips and style suggestions")]
struct Args {
    /// Path to the .txt, .docx or .pdf file to review
    #[arg(short, long, required_unless_present = "show_config")]
    input: Option<String>,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Output file path (if not specified, auto-generated based on input)
    #[arg(short, long)]
    output: Option<String>,

    /// Output format: html, text, json or report
    #[arg(short = 'f', long, default_value = "report")]
    output_format: String,

    /// Adopt a suggestion by id (repeatable)
    #[arg(long = "adopt", value_name = "ID")]
    adopt: Vec<u32>,

    /// Adopt every suggestion
    #[arg(long)]
    adopt_all: bool,

    /// Enable detailed profiling of all pipeline steps
    #[arg(long)]
    profile: bool,

    /// Print the effective config as YAML and exit
    #[arg(long)]
    show_config: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    println!("🦀 DocGuard Document Review");

    let config = EngineConfig::load_with_fallback(args.config.as_deref());
    if let Some(config_path) = &args.config {
        println!("📋 Loaded config from: {}", config_path);
    } else {
        println!("📋 Using default config");
    }

    if args.show_config {
        println!("\n{}", config.to_yaml()?);
        return Ok(());
    }

    let Some(input) = args.input.as_deref() else {
        return Ok(());
    };
    if !Path::new(input).exists() {
        println!("⚠️  Input file not found at: {}", input);
        println!("   Please check the file path.");
        std::process::exit(1);
    }

    println!("📄 Reviewing: {}", input);

    let mut profiler = StepProfiler::new(args.profile);
    let mut session = match ReviewSession::open_file(Path::new(input), config, &mut profiler) {
        Ok(session) => session,
        Err(e) => {
            if e.downcast_ref::<ExtractionError>().is_some() {
                eprintln!("❌ Extraction failed: {e}");
            } else {
                eprintln!("❌ Review failed: {e}");
            }
            std::process::exit(1);
        }
    };

    print_suggestions(&session);

    if args.adopt_all {
        let results = profiler.time_step(ReviewStep::Adoption, || session.adopt_all())?;
        println!("✅ Adopted {} suggestions", results.len());
    } else {
        for id in &args.adopt {
            let result =
                profiler.time_step(ReviewStep::Adoption, || session.adopt(SuggestionId(*id)))?;
            let verb = match result.outcome {
                Outcome::Replaced => "replaced in place",
                Outcome::Inserted => "inserted as a new paragraph",
                Outcome::Withdrawn => "withdrawn",
            };
            println!("✅ Suggestion {}: {}", result.suggestion_id, verb);
        }
    }

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input, &args.output_format));
    save_output(&session, &profiler, &output_path, &args.output_format)?;

    profiler.print_summary();
    Ok(())
}

fn print_suggestions(session: &ReviewSession) {
    let suggestions = session.engine().suggestions();
    println!("📊 Found {} suggestions:", suggestions.len());
    for suggestion in suggestions {
        println!(
            "   {} [{}] {} → {}",
            suggestion.id,
            suggestion.category.label(),
            suggestion.original_text,
            suggestion.corrected_text
        );
    }
}

fn default_output_path(input: &str, format: &str) -> String {
    let input_name = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let extension = match format {
        "text" => "txt",
        "html" => "html",
        _ => "json",
    };
    format!("{input_name}_docguard.{extension}")
}

fn save_output(
    session: &ReviewSession,
    profiler: &StepProfiler,
    output_path: &str,
    format: &str,
) -> Result<()> {
    match format {
        "report" => {
            session.report().with_timings(profiler.timings()).save(output_path)?;
            println!("💾 Review report saved to: {}", output_path);
        }
        "html" | "text" | "json" => {
            session.engine().document().save_with_format(output_path, format)?;
            println!("💾 Document ({}) saved to: {}", format, output_path);
        }
        _ => {
            println!("⚠️  Unknown output format '{}', using default report format", format);
            session.report().with_timings(profiler.timings()).save(output_path)?;
            println!("💾 Review report saved to: {}", output_path);
        }
    }
    Ok(())
}
