mod config;
mod db;
mod input;
mod parser;
mod taxonomy;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::config::Settings;
use crate::input::DocumentInput;

#[derive(Parser)]
#[command(name = "dref_excerpts", about = "Challenges and lessons learnt from DREF final reports")]
struct Cli {
    /// Settings file (default: ./dref.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract excerpts from converted report JSON files and store them
    Extract {
        /// JSON files holding one report or an array of reports
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the stored excerpts of one report
    Show {
        /// Report identifier, e.g. MDRBO014
        #[arg(short, long)]
        lead: String,
    },
    /// Dump every stored excerpt as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Show extraction statistics
    Stats,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;

    let result = match cli.command {
        Commands::Extract { files } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;

            let mut docs = Vec::new();
            for path in &files {
                match input::load_documents(path) {
                    Ok(loaded) => docs.extend(loaded),
                    Err(e) => warn!(path = %path.display(), "skipping: {e:#}"),
                }
            }
            if docs.is_empty() {
                println!("No reports to process.");
                return Ok(());
            }

            println!("Processing {} reports...", docs.len());
            let counts = process_documents(&conn, &docs, &settings)?;
            counts.print();
            Ok(())
        }
        Commands::Show { lead } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let Some(doc) = db::fetch_document(&conn, &lead)? else {
                println!("No report {lead} stored. Run 'extract' first.");
                return Ok(());
            };
            println!(
                "{} | {} | {} | {} | {} sections",
                doc.lead,
                doc.hazard.as_deref().unwrap_or("-"),
                doc.country.as_deref().unwrap_or("-"),
                doc.date.as_deref().unwrap_or("-"),
                doc.sections,
            );
            println!("{}", "-".repeat(100));

            let rows = db::fetch_excerpts(&conn, &lead)?;
            for (i, e) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<14} | {:<10} | {}",
                    i + 1,
                    e.kind.label(),
                    truncate(&e.sector_id, 10),
                    truncate(&e.text, 64)
                );
            }
            println!("\n{} excerpts", rows.len());
            Ok(())
        }
        Commands::Export { out } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let rows = db::fetch_all_excerpts(&conn)?;
            let json = serde_json::to_string_pretty(&rows)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Exported {} excerpts to {}", rows.len(), path.display());
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Documents: {}", s.documents);
            println!("Excerpts:  {}", s.excerpts);
            for (kind, n) in &s.by_kind {
                println!("  {:<28} {:>6}", kind, n);
            }
            if !s.by_sector.is_empty() {
                println!("\n--- Sectors ---");
                for (sector, n) in &s.by_sector {
                    println!("  {:<28} {:>6}", truncate(sector, 28), n);
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

struct ProcessCounts {
    reports: usize,
    challenges: usize,
    lessons: usize,
    empty: usize,
}

impl ProcessCounts {
    fn print(&self) {
        println!(
            "Saved {} reports: {} challenges, {} lessons learnt ({} reports without excerpts).",
            self.reports, self.challenges, self.lessons, self.empty,
        );
    }
}

fn process_documents(
    conn: &rusqlite::Connection,
    docs: &[DocumentInput],
    settings: &Settings,
) -> anyhow::Result<ProcessCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(docs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut counts = ProcessCounts {
        reports: 0,
        challenges: 0,
        lessons: 0,
        empty: 0,
    };

    for chunk in docs.chunks(500) {
        let reports: Vec<_> = chunk
            .par_iter()
            .map(|doc| parser::process_document(doc, settings))
            .collect();

        for r in &reports {
            if r.excerpts.is_empty() {
                counts.empty += 1;
            }
            for e in &r.excerpts {
                match e.kind {
                    parser::ExcerptKind::Challenge => counts.challenges += 1,
                    parser::ExcerptKind::LessonLearnt => counts.lessons += 1,
                }
            }
        }

        counts.reports += reports.len();
        db::save_reports(conn, &reports)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    info!(reports = counts.reports, "extraction finished");
    Ok(counts)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
