mod cli;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use coursecut_core::{plan_segments, run_with_progress, Config, Course, OutputFormat, ProgressEvent};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::cli::build_cli;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = build_cli().get_matches();

    let label_dir = matches
        .get_one::<PathBuf>("labels")
        .expect("defaulted argument");
    let output_dir = matches
        .get_one::<PathBuf>("output")
        .expect("defaulted argument");
    let format = *matches
        .get_one::<OutputFormat>("format")
        .expect("defaulted argument");
    let sections = *matches
        .get_one::<u32>("sections")
        .expect("defaulted argument");
    let tracks = *matches
        .get_one::<u32>("tracks")
        .expect("defaulted argument");
    let encoder = matches
        .get_one::<PathBuf>("encoder")
        .expect("defaulted argument");
    let overwrite = matches.get_flag("overwrite");
    let dry_run = matches.get_flag("dry-run");
    let sources: Vec<PathBuf> = matches
        .get_many::<PathBuf>("sources")
        .expect("required argument")
        .cloned()
        .collect();

    for source in &sources {
        if !source.is_file() {
            return Err(anyhow!("source file does not exist: {}", source.display()));
        }
    }
    if !label_dir.is_dir() {
        return Err(anyhow!(
            "label directory does not exist: {}",
            label_dir.display()
        ));
    }
    fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "failed to create output directory '{}'",
            output_dir.display()
        )
    })?;

    let course = Course { sections, tracks };
    let config = Config::builder(course, label_dir, output_dir, format)
        .sources(sources)
        .overwrite(overwrite)
        .encoder(encoder)
        .build()
        .with_context(|| {
            format!(
                "failed to create configuration for labels in '{}'",
                label_dir.display()
            )
        })?;

    if dry_run {
        let plan = plan_segments(&config)
            .with_context(|| format!("failed to plan tracks from '{}'", label_dir.display()))?;

        if plan.is_empty() {
            println!("Dry run: no tracks would be encoded.");
        } else {
            println!("Dry run: would encode {} track(s):", plan.len());
            for spec in plan {
                println!("  {}", config.output_dir.join(spec.output_name).display());
            }
        }

        return Ok(());
    }

    let progress = ProgressBar::new(0);
    progress.set_draw_target(ProgressDrawTarget::stderr());

    let bar_style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());

    let progress_handle = progress.clone();
    let result = run_with_progress(config, move |event| match event {
        ProgressEvent::Start { total_segments } => {
            progress_handle.set_style(bar_style.clone());
            progress_handle.set_length(total_segments as u64);
            progress_handle.enable_steady_tick(Duration::from_millis(100));
        }
        ProgressEvent::Advance {
            completed,
            output_name,
        } => {
            progress_handle.set_position(completed as u64);
            progress_handle.set_message(output_name);
        }
        ProgressEvent::Finish => {
            progress_handle.set_message(String::from("Completed"));
        }
    })
    .context("failed to split the course recordings");

    progress.finish_and_clear();

    let report = result?;

    if report.segments_encoded == 0 {
        println!("No tracks were encoded: none of the supplied sources matched a section.");
    } else {
        println!("Encoded {} track(s).", report.segments_encoded);
    }
    for section in report.sections_without_source {
        eprintln!("warning: no source supplied for section {section}; its tracks were skipped");
    }

    Ok(())
}
