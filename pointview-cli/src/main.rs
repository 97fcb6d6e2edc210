mod args;

use anyhow::Result;
use args::Args;
use clap::Parser;
use pointview_core::{BoundingBox, ErrorSignal};
use pointview_io::{FileSummary, SourceFile};
use pointview_pipeline::{
    CameraPose, ColorMode, EmptyPointSet, LoadEvent, Metadata, ViewerConfig, ViewerSession,
};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

/// What gets printed for a file that loaded
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoadReport<'a> {
    file: &'a FileSummary,
    size_label: String,
    metadata: &'a Metadata,
    point_count_label: String,
    bounding_box: BoundingBox,
    camera: CameraPose,
    color_mode: ColorMode,
    point_size: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    empty: Option<EmptyPointSet>,
}

/// What gets printed for a file that did not
#[derive(Debug, Serialize)]
struct FailureReport<'a> {
    path: String,
    error: &'a ErrorSignal,
}

fn init_tracing(debug: bool) -> Result<()> {
    let mut filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env()?;

    if debug {
        filter = filter.add_directive("pointview=debug".parse()?);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()?;
    Ok(())
}

fn print_loaded(session: &ViewerSession<SourceFile>, json: bool) -> Result<()> {
    let Some(view) = session.view() else {
        return Ok(());
    };
    let bundle = &view.bundle;
    let report = LoadReport {
        file: view.resource.summary(),
        size_label: view.resource.summary().size_label(),
        metadata: &bundle.metadata,
        point_count_label: bundle.metadata.point_count_label(),
        bounding_box: bundle.bounding_box,
        camera: bundle.camera,
        color_mode: bundle.color_mode,
        point_size: bundle.point_size,
        empty: bundle.empty,
    };

    if json {
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    println!("{}", report.file.name);
    println!("  Type:       {}", report.file.format);
    println!("  Size:       {}", report.size_label);
    println!("  Points:     {}", report.point_count_label);
    println!("  Dimensions: {}", report.metadata.bounding_box_label);
    if let Some(empty) = report.empty {
        println!("  Note:       {}", empty.message());
    }
    Ok(())
}

fn print_failure(path: &Path, signal: &ErrorSignal, json: bool) -> Result<()> {
    if json {
        let report = FailureReport {
            path: path.display().to_string(),
            error: signal,
        };
        println!("{}", serde_json::to_string(&report)?);
    } else {
        eprintln!("{}: {} ({})", path.display(), signal.message, signal.kind);
    }
    Ok(())
}

fn run(args: &Args, config: ViewerConfig) -> Result<usize> {
    let mut session = ViewerSession::new(config)?;
    let mut failures = 0;

    for path in &args.files {
        match session.load_path(path) {
            LoadEvent::Installed { .. } | LoadEvent::Empty { .. } => {
                print_loaded(&session, args.json)?;
            }
            LoadEvent::Failed { signal, .. } | LoadEvent::Rejected { signal } => {
                failures += 1;
                print_failure(path, &signal, args.json)?;
            }
            LoadEvent::Discarded { generation, latest } => {
                warn!(%generation, %latest, path = %path.display(), "load was superseded");
            }
        }
    }
    Ok(failures)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug)?;

    let config = args.viewer_config()?;
    info!(
        color_mode = %config.color_mode,
        point_size = config.point_size,
        files = args.files.len(),
        "starting pointview"
    );

    let failures = run(&args, config)?;
    if failures > 0 {
        anyhow::bail!("{failures} of {} files failed to load", args.files.len());
    }
    Ok(())
}
