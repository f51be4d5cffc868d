//! Command implementations

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::app::{
    AppContainer, CutOptions, DefaultAppContainer, DetectOptions, FetchModelOptions, InspectRequest,
    PreviewOptions, TrackOptions,
};
use crate::cli::args::{
    CutArgs, DetectArgs, FetchModelArgs, InspectArgs, ListArgs, PreviewArgs, RevealArgs, TrackArgs,
};
use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::domain::model::VideoEntry;
use crate::engine::progress::ConsoleProgressCallback;
use crate::engine::{CancelFlag, CutOutcome, ProgressTracker, TrackingParams};
use crate::utils::path::PathUtils;

/// Build the container and run the parsed command
pub async fn run(cli: Cli, config: AppConfig, cancel: CancelFlag) -> Result<()> {
    let container = DefaultAppContainer::new(&config);
    match cli.command {
        Commands::Inspect(args) => inspect(&container, args).await,
        Commands::List(args) => list(&container, &config, args).await,
        Commands::Cut(args) => cut(&container, &config, args, cancel).await,
        Commands::Preview(args) => preview(&container, args, cancel).await,
        Commands::Track(args) => track(&container, &config, args, cancel).await,
        Commands::Detect(args) => detect(&container, args).await,
        Commands::FetchModel(args) => fetch_model(&container, &config, args).await,
        Commands::Reveal(args) => reveal(&container, args),
    }
}

fn progress_tracker(operation: &str, cancel: CancelFlag, quiet: bool) -> ProgressTracker {
    let progress = ProgressTracker::with_cancel_flag(operation, cancel);
    if !quiet {
        progress.add_callback(Arc::new(ConsoleProgressCallback::new(false)));
    }
    progress
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Execute the inspect command
pub async fn inspect(container: &dyn AppContainer, args: InspectArgs) -> Result<()> {
    let response = container
        .inspect_interactor()
        .execute(InspectRequest::new(&args.input))
        .await
        .with_context(|| format!("Failed to inspect {}", args.input.display()))?;

    if args.json {
        println!("{}", response.format_as_json()?);
    } else {
        print!("{}", response.format_as_text());
    }
    Ok(())
}

fn format_entry(entry: &VideoEntry) -> String {
    let modified = entry
        .modified
        .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<40} {:>10}  {}",
        entry.name,
        PathUtils::format_file_size(entry.size),
        modified
    )
}

/// Execute the list command
pub async fn list(container: &dyn AppContainer, config: &AppConfig, args: ListArgs) -> Result<()> {
    let folder = config
        .library
        .folder
        .clone()
        .context("No folder given; pass --folder or set library.folder in the config")?;
    let library = container.library_interactor();

    let entries = if args.generated {
        library.list_generated(&folder).await?
    } else {
        library.list_sources(&folder).await?
    };

    if args.json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        let what = if args.generated { "generated clips" } else { "videos" };
        println!("No {} in {}", what, folder.display());
        return Ok(());
    }
    for entry in &entries {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

/// Execute the cut command
pub async fn cut(
    container: &dyn AppContainer,
    config: &AppConfig,
    args: CutArgs,
    cancel: CancelFlag,
) -> Result<()> {
    let options = CutOptions {
        input: args.input,
        start: args.start,
        end: args.end,
        duration: args.duration,
        crop: args.crop,
        aspect: config.cut.aspect,
        output: args.output,
        output_dir: config.cut.output_dir.clone(),
    };
    let progress = progress_tracker("Exporting clip", cancel, args.json);

    let outcome = container
        .cut_interactor()
        .execute(options, progress)
        .await
        .context("Clip export failed")?;

    match outcome {
        CutOutcome::Completed(report) => {
            if args.json {
                return print_json(&report);
            }
            println!(
                "Saved {} ({}, {}x{}, {} frames)",
                report.output.display(),
                report.duration,
                report.crop.width,
                report.crop.height,
                report.frames_written
            );
            if report.frames_written < report.frames_requested {
                warn!(
                    written = report.frames_written,
                    requested = report.frames_requested,
                    "Source ended early; clip is shorter than requested"
                );
            }
        }
        CutOutcome::Cancelled { frames_written } => {
            info!(frames_written, "Export cancelled");
            eprintln!("Export cancelled; partial file removed");
        }
    }
    Ok(())
}

/// Execute the preview command
pub async fn preview(
    container: &dyn AppContainer,
    args: PreviewArgs,
    cancel: CancelFlag,
) -> Result<()> {
    let options = PreviewOptions {
        input: args.input,
        at: args.at,
        play: args.play,
        range: args.range,
        start: args.start,
        end: args.end,
        speed: args.speed,
        max_frames: args.frames,
        out_dir: args.out_dir,
    };

    let report = container
        .preview_interactor()
        .execute(options, cancel)
        .await
        .context("Preview failed")?;

    if args.json {
        return print_json(&report);
    }
    println!("Selection: {}", report.selection);
    for frame in &report.frames {
        println!("{}", frame.display());
    }
    Ok(())
}

/// Execute the track command
pub async fn track(
    container: &dyn AppContainer,
    config: &AppConfig,
    args: TrackArgs,
    cancel: CancelFlag,
) -> Result<()> {
    let options = TrackOptions {
        input: args.input,
        output: args.output,
        params: TrackingParams {
            kind: config.tracker.kind,
            redetect_interval: config.tracker.redetect_interval,
            match_iou_threshold: config.tracker.match_iou_threshold,
            max_lost_frames: config.tracker.max_lost_frames,
        },
        skip_frames: config.tracker.skip_frames,
    };
    let tracker = options.params.kind;
    let progress = progress_tracker("Tracking persons", cancel, args.json);

    let report = container
        .track_interactor()
        .execute(options, progress)
        .await
        .context("Tracking failed")?;

    if args.json {
        return print_json(&report);
    }
    let stats = &report.stats;
    println!("Output:         {}", report.output.display());
    println!("Tracker:        {}", tracker.description());
    println!("Frames:         {}", stats.total_frames);
    println!("YOLO frames:    {}", stats.yolo_frames);
    println!("Tracker frames: {}", stats.tracker_frames);
    println!("Persons:        {}", stats.total_persons);
    println!("Average FPS:    {:.1}", stats.avg_fps);
    if stats.stopped {
        println!("Stopped early; frames processed so far were kept");
    }
    Ok(())
}

/// Execute the detect command
pub async fn detect(container: &dyn AppContainer, args: DetectArgs) -> Result<()> {
    let report = container
        .detect_interactor()
        .execute(DetectOptions {
            image: args.image,
            output: args.output,
        })
        .await
        .context("Detection failed")?;

    if args.json {
        return print_json(&report);
    }
    println!("{} person(s) found", report.detections.len());
    for (i, detection) in report.detections.iter().enumerate() {
        let b = &detection.bbox;
        println!(
            "  {}: ({:.0}, {:.0}) - ({:.0}, {:.0})  conf {:.2}",
            i + 1,
            b.x1,
            b.y1,
            b.x2,
            b.y2,
            detection.confidence
        );
    }
    println!("Annotated image: {}", report.output.display());
    Ok(())
}

/// Execute the fetch-model command
pub async fn fetch_model(
    container: &dyn AppContainer,
    config: &AppConfig,
    args: FetchModelArgs,
) -> Result<()> {
    let report = container
        .fetch_model_interactor()
        .execute(FetchModelOptions {
            dest: config.detector.model_path.clone(),
            force: args.force,
        })
        .await
        .context("Model download failed")?;

    let size = PathUtils::format_file_size(report.size);
    match &report.source {
        Some(source) => println!("Downloaded {} ({}) from {}", report.path.display(), size, source),
        None => println!(
            "Model already present at {} ({}); use --force to download again",
            report.path.display(),
            size
        ),
    }
    Ok(())
}

/// Execute the reveal command
pub fn reveal(container: &dyn AppContainer, args: RevealArgs) -> Result<()> {
    container
        .library_interactor()
        .reveal(&args.path)
        .with_context(|| format!("Failed to reveal {}", args.path.display()))
}
