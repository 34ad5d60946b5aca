use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use folioprep::{ColorMode, DocumentReport, ProcessingParams, process_document_to_path};

use super::args::CliArgs;
use super::errors::AppError;

/// Defaults, then the JSON config file, then command-line overrides.
fn effective_params(args: &CliArgs) -> Result<ProcessingParams, AppError> {
    let mut params = match &args.config {
        Some(path) => {
            info!("Loading parameters from {:?}", path);
            ProcessingParams::from_json_file(path)?
        }
        None => ProcessingParams::default(),
    };

    if let Some(dpi) = args.dpi {
        params.output.dpi = dpi;
    }
    if let Some(output_dpi) = args.output_dpi {
        params.output.output_dpi = Some(output_dpi);
    }
    if let Some(quality) = args.quality {
        params.output.jpeg_quality = quality;
    }
    if args.no_crop {
        params.crop.enabled = false;
    }
    match (args.color_mode, args.black_white) {
        (Some(ColorMode::Grayscale), true) => {
            return Err(AppError::ConflictingArguments {
                first: "--color-mode grayscale".to_string(),
                second: "--black-white".to_string(),
            });
        }
        (_, true) => params.output.color_mode = ColorMode::BlackWhite,
        (Some(mode), false) => params.output.color_mode = mode,
        (None, false) => {}
    }
    if args.dark_mode {
        params.output.dark_mode = true;
    }

    params.validate()?;
    Ok(params)
}

fn report_path(output: &Path, enabled: bool) -> Option<PathBuf> {
    enabled.then(|| output.with_extension("json"))
}

fn process_single_document(
    input: &Path,
    output: &Path,
    params: &ProcessingParams,
    report: bool,
) -> Result<DocumentReport, AppError> {
    let report = report_path(output, report);
    let summary = process_document_to_path(input, output, params, report.as_deref())?;
    Ok(summary)
}

/// Book entries of a batch directory: page directories and TIFF files.
fn is_book_entry(path: &Path) -> bool {
    path.is_dir()
        || path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_ascii_lowercase().as_str(), "tif" | "tiff"))
            .unwrap_or(false)
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let params = effective_params(&args)?;
    if args.print_config {
        println!("{}", params.to_json_pretty()?);
        return Ok(());
    }

    let batch_mode = args.batch || args.input_dir.is_some();

    if batch_mode {
        let input_dir = args.input_dir.ok_or(AppError::MissingArgument {
            arg: "--input-dir".to_string(),
        })?;
        let output_dir = args.output_dir.ok_or(AppError::MissingArgument {
            arg: "--output-dir".to_string(),
        })?;

        fs::create_dir_all(&output_dir)?;

        info!("Starting batch processing from directory: {:?}", input_dir);
        info!("Output directory: {:?}", output_dir);

        let mut entries: Vec<PathBuf> = fs::read_dir(&input_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        entries.sort();

        let mut processed = 0;
        let mut skipped = 0;
        let mut errors = 0;

        for path in entries {
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                skipped += 1;
                continue;
            };
            if !is_book_entry(&path) {
                info!("Skipping: {:?}", path);
                skipped += 1;
                continue;
            }
            let output_path = output_dir.join(format!("{}.pdf", stem));
            info!("Processing: {:?} -> {:?}", path, output_path);

            match process_single_document(&path, &output_path, &params, args.report) {
                Ok(summary) => {
                    info!(
                        "Successfully processed: {:?} ({} pages, {} flagged)\n",
                        path,
                        summary.page_count,
                        summary.blank_candidates.len()
                    );
                    processed += 1;
                }
                Err(AppError::Folioprep(e)) if e.is_fatal_configuration() => {
                    // Configuration errors stop the whole batch.
                    return Err(e.into());
                }
                Err(e) => {
                    warn!("Error processing {:?}: {}", path, e);
                    errors += 1;
                }
            }
        }

        info!("Batch processing complete!");
        info!("Processed: {}", processed);
        info!("Skipped: {}", skipped);
        info!("Errors: {}", errors);
    } else {
        let input = args.input.ok_or(AppError::MissingArgument {
            arg: "--input".to_string(),
        })?;
        let output = args.output.ok_or(AppError::MissingArgument {
            arg: "--output".to_string(),
        })?;

        let summary = process_single_document(&input, &output, &params, args.report)?;
        if !summary.blank_candidates.is_empty() {
            println!(
                "Pages that may be blank (check manually): {:?}",
                summary.blank_candidates
            );
        }
        info!("Successfully processed: {:?} -> {:?}\n", input, output);
    }

    Ok(())
}
