use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use ops_prep_lib::io::{read_records, write_records};
use ops_prep_lib::review::slim::export_slim;
use ops_prep_lib::review::workflow::{apply_review, generate_review};
use ops_prep_lib::utils::env::load_env;
use ops_prep_lib::utils::run_folder::{
    default_run_id, make_unique_run_dir, write_run_info, RunInfo,
};

#[derive(Parser)]
#[command(name = "ops-prep", about = "Ops prep pipeline: review + apply.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a manual review file (with dedupe recommendations).
    GenerateReview {
        /// Input stitched CSV path.
        #[arg(short, long)]
        input: PathBuf,
        /// Ops output ROOT folder; each run gets its own subfolder.
        #[arg(long, default_value = "ops_output")]
        out_dir: PathBuf,
        /// Optional run id for the run folder (default: timestamp).
        #[arg(long)]
        run_id: Option<String>,
        /// Review CSV output path. Default: <run-dir>/<input>_ops_review.csv
        #[arg(long)]
        review_out: Option<PathBuf>,
        /// Auto-suggested output path. Default: <run-dir>/<input>_ops_suggested.csv
        #[arg(long)]
        suggested_out: Option<PathBuf>,
    },
    /// Apply a reviewed file and write the final output.
    ApplyReview {
        /// Reviewed CSV path (generated by generate-review).
        #[arg(long)]
        review: PathBuf,
        /// Ops output ROOT folder (used only with --run-id).
        #[arg(long, default_value = "ops_output")]
        out_dir: PathBuf,
        /// Force outputs into <out-dir>/<run-id>/ instead of next to the
        /// review file.
        #[arg(long)]
        run_id: Option<String>,
        /// Final output path. Default: <review sans _ops_review>_ops_final.csv
        #[arg(long)]
        final_out: Option<PathBuf>,
    },
    /// Create a slim hand-off CSV from a suggested/final output.
    ExportSlim {
        /// Path to an *_ops_suggested.csv or *_ops_final.csv file.
        #[arg(long)]
        input: PathBuf,
        /// Output path. Default: <input>_SLIM.csv
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    load_env();

    let cli = Cli::parse();
    match cli.command {
        Command::GenerateReview {
            input,
            out_dir,
            run_id,
            review_out,
            suggested_out,
        } => cmd_generate_review(input, out_dir, run_id, review_out, suggested_out),
        Command::ApplyReview {
            review,
            out_dir,
            run_id,
            final_out,
        } => cmd_apply_review(review, out_dir, run_id, final_out),
        Command::ExportSlim { input, output } => cmd_export_slim(input, output),
    }
}

fn cmd_generate_review(
    input: PathBuf,
    out_dir: PathBuf,
    run_id: Option<String>,
    review_out: Option<PathBuf>,
    suggested_out: Option<PathBuf>,
) -> Result<()> {
    let records = read_records(&input)?;
    info!("Loaded {} records from {}", records.len(), input.display());

    let run_id = run_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(default_run_id);
    let run_dir = make_unique_run_dir(&out_dir, &run_id);
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create run folder {}", run_dir.display()))?;

    let stem = file_stem(&input);
    let review_out =
        review_out.unwrap_or_else(|| run_dir.join(format!("{}_ops_review.csv", stem)));
    let suggested_out =
        suggested_out.unwrap_or_else(|| run_dir.join(format!("{}_ops_suggested.csv", stem)));

    let outcome = generate_review(records);

    write_records(&review_out, &outcome.review)?;
    write_records(&suggested_out, &outcome.suggested)?;
    if !outcome.dropped.is_empty() {
        let dropped_out = path_with_stem_suffix(&suggested_out, "_dropped_no_usable_phone");
        write_records(&dropped_out, &outcome.dropped)?;
        info!("Wrote dropped rows: {}", dropped_out.display());
    }

    let summary_path = path_with_stem_suffix(&review_out, "_summary").with_extension("json");
    write_summary(&summary_path, &outcome.summary)?;

    let mut run_info = RunInfo::new(&run_dir);
    run_info.input = Some(input.display().to_string());
    run_info.review_csv = Some(review_out.display().to_string());
    run_info.suggested_csv = Some(suggested_out.display().to_string());
    let run_info_path = write_run_info(&run_dir, &run_info)?;

    info!("Run folder: {}", run_dir.display());
    info!("Wrote review: {}", review_out.display());
    info!("Wrote suggested: {}", suggested_out.display());
    info!("Wrote summary: {}", summary_path.display());
    info!("Wrote run info: {}", run_info_path.display());
    Ok(())
}

fn cmd_apply_review(
    review: PathBuf,
    out_dir: PathBuf,
    run_id: Option<String>,
    final_out: Option<PathBuf>,
) -> Result<()> {
    let records = read_records(&review)?;
    info!("Loaded {} records from {}", records.len(), review.display());

    // Default: outputs land next to the review file (same run folder); an
    // explicit --run-id forces them into <out-dir>/<run-id>/.
    let run_dir = match run_id.map(|id| id.trim().to_string()).filter(|id| !id.is_empty()) {
        Some(id) => out_dir.join(id),
        None => review
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create run folder {}", run_dir.display()))?;

    let final_out = final_out.unwrap_or_else(|| {
        let base = file_stem(&review);
        let base = base.strip_suffix("_ops_review").unwrap_or(&base).to_string();
        run_dir.join(format!("{}_ops_final.csv", base))
    });

    let outcome = apply_review(records);

    write_records(&final_out, &outcome.final_records)?;
    if !outcome.dropped.is_empty() {
        let dropped_out = path_with_stem_suffix(&final_out, "_dropped_no_usable_phone");
        write_records(&dropped_out, &outcome.dropped)?;
        info!("Wrote dropped rows: {}", dropped_out.display());
    }

    let summary_path = path_with_stem_suffix(&final_out, "_summary").with_extension("json");
    write_summary(&summary_path, &outcome.summary)?;

    let mut run_info = RunInfo::new(&run_dir);
    run_info.review_csv = Some(review.display().to_string());
    run_info.final_csv = Some(final_out.display().to_string());
    let run_info_path = write_run_info(&run_dir, &run_info)?;

    info!("Run folder: {}", run_dir.display());
    info!("Wrote final: {}", final_out.display());
    info!("Wrote summary: {}", summary_path.display());
    info!("Wrote run info: {}", run_info_path.display());
    Ok(())
}

fn cmd_export_slim(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let records = read_records(&input)?;
    info!("Loaded {} records from {}", records.len(), input.display());

    let slim = export_slim(&records);
    let output = output.unwrap_or_else(|| path_with_stem_suffix(&input, "_SLIM"));
    write_records(&output, &slim)?;
    info!("Wrote slim: {}", output.display());
    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `<dir>/<stem><suffix>.<ext>` next to the original file.
fn path_with_stem_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = file_stem(path);
    let mut name = format!("{}{}", stem, suffix);
    if let Some(ext) = path.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    } else {
        name.push_str(".csv");
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
        _ => PathBuf::from(name),
    }
}

fn write_summary<T: Serialize>(path: &Path, summary: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
