mod logger;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use pdf_bleed::{BleedOptions, OverlapPolicy, PagePlan};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pdfb", about = "Add mirrored bleed and crop marks to PDFs", version)]
struct Cli {
    /// Log progress (-v) or geometry detail (-vv) to stderr
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate bleed and crop marks for every page
    Bleed {
        /// Input PDF file
        #[arg(short, long)]
        input: PathBuf,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        settings: Settings,

        /// Directory containing the pdfium library
        #[arg(long)]
        pdfium_lib: Option<PathBuf>,
    },

    /// Show the output geometry of a PDF without writing anything
    Inspect {
        /// Input PDF file
        #[arg(short, long)]
        input: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Also probe rendering and run the preflight checks
        #[arg(long)]
        preflight: bool,

        #[command(flatten)]
        settings: Settings,

        /// Directory containing the pdfium library
        #[arg(long)]
        pdfium_lib: Option<PathBuf>,
    },

    /// Manage option files
    Config {
        /// Write the default options as JSON to this file
        #[arg(long)]
        write: PathBuf,
    },
}

/// Option overrides shared by the processing commands
#[derive(clap::Args)]
struct Settings {
    /// JSON options file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Render resolution of the bleed raster
    #[arg(long)]
    dpi: Option<u32>,

    /// Bleed width in inches
    #[arg(long)]
    bleed_in: Option<f32>,

    /// Crop mark margin in inches
    #[arg(long)]
    crop_margin_in: Option<f32>,

    /// Fail instead of reflecting a bleed wider than half the page
    #[arg(long)]
    reject_overlap: bool,
}

impl Settings {
    async fn resolve(&self) -> Result<BleedOptions> {
        let mut options = match &self.config {
            Some(path) => BleedOptions::load(path).await?,
            None => BleedOptions::default(),
        };
        if let Some(dpi) = self.dpi {
            options.dpi = dpi;
        }
        if let Some(bleed_in) = self.bleed_in {
            options.bleed_in = bleed_in;
        }
        if let Some(crop_margin_in) = self.crop_margin_in {
            options.crop_margin_in = crop_margin_in;
        }
        if self.reject_overlap {
            options.overlap_policy = OverlapPolicy::Reject;
        }
        options.validate()?;
        Ok(options)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::StderrLogger::from_verbosity(cli.verbose).init()?;

    match cli.command {
        Commands::Bleed {
            input,
            output,
            settings,
            pdfium_lib,
        } => {
            let options = settings.resolve().await?;
            let bytes = pdf_bleed::load_pdf_bytes(&input).await?;
            let bleed_px = options.bleed_px();

            let started = chrono::Local::now();
            let (corrected, report) = tokio::task::spawn_blocking(move || {
                render::bleed_with_report(&bytes, &options, pdfium_lib.as_deref())
            })
            .await??;
            let elapsed = chrono::Local::now() - started;

            pdf_bleed::save_pdf_bytes(&corrected, &output).await?;

            println!("Bleed Report:");
            for page in &report.pages {
                println!(
                    "  Page {}: {:.2} x {:.2} pt trim ({:?}) → {:.2} x {:.2} pt",
                    page.index + 1,
                    page.trim_width_pt,
                    page.trim_height_pt,
                    page.trim_source,
                    page.output_width_pt,
                    page.output_height_pt
                );
            }
            println!("  Pages: {}", report.page_count());
            println!("  Bleed: {} px at {} DPI", bleed_px, report.dpi);
            println!("  Time: {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0);
            println!("Bleed added → {}", output.display());
        }

        Commands::Inspect {
            input,
            json,
            preflight,
            settings,
            pdfium_lib,
        } => {
            let options = settings.resolve().await?;
            let bytes = pdf_bleed::load_pdf_bytes(&input).await?;
            let plans = pdf_bleed::plan_output(&bytes, &options)?;

            let preflight_report = if preflight {
                let options = options.clone();
                Some(
                    tokio::task::spawn_blocking(move || {
                        render::preflight(&bytes, &options, pdfium_lib.as_deref())
                    })
                    .await??,
                )
            } else {
                None
            };

            if json {
                let value = serde_json::json!({
                    "options": options,
                    "pages": plans,
                    "preflight": preflight_report,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                print_plans(&input, &plans);
                if let Some(report) = preflight_report {
                    println!("Preflight:");
                    for check in &report.checks {
                        println!("  [{:?}] {}: {}", check.status, check.name, check.details);
                    }
                }
            }
        }

        Commands::Config { write } => {
            BleedOptions::default().save(&write).await?;
            println!("Default options → {}", write.display());
        }
    }

    Ok(())
}

fn print_plans(input: &Path, plans: &[PagePlan]) {
    println!("{}: {} pages", input.display(), plans.len());
    for plan in plans {
        let (trim_w, trim_h) = plan.trim.display_size();
        println!(
            "  Page {}: trim {:.2} x {:.2} pt from {:?}, rotated {}°",
            plan.index + 1,
            trim_w,
            trim_h,
            plan.trim.source,
            plan.trim.rotation.degrees()
        );
        println!(
            "    output {:.2} x {:.2} pt, raster {} x {} px",
            plan.output_width_pt,
            plan.output_height_pt,
            plan.raster_width_px,
            plan.raster_height_px
        );
        for strip in &plan.strips {
            println!(
                "    {:?} strip {} x {} px",
                strip.side, strip.width_px, strip.height_px
            );
        }
    }
}

/// Entry points that need a rendering engine
#[cfg(feature = "pdfium")]
mod render {
    use anyhow::Result;
    use pdf_bleed::raster::PdfiumBackend;
    use pdf_bleed::{BleedOptions, BleedReport, PreflightReport};
    use std::path::Path;

    pub fn bleed_with_report(
        bytes: &[u8],
        options: &BleedOptions,
        lib_dir: Option<&Path>,
    ) -> Result<(Vec<u8>, BleedReport)> {
        let backend = PdfiumBackend::bind(lib_dir)?;
        Ok(pdf_bleed::generate_bleed_with_report(bytes, &backend, options)?)
    }

    pub fn preflight(
        bytes: &[u8],
        options: &BleedOptions,
        lib_dir: Option<&Path>,
    ) -> Result<PreflightReport> {
        let backend = PdfiumBackend::bind(lib_dir)?;
        Ok(pdf_bleed::preflight(bytes, &backend, options)?)
    }
}

#[cfg(not(feature = "pdfium"))]
mod render {
    use anyhow::{Result, bail};
    use pdf_bleed::{BleedOptions, BleedReport, PreflightReport};
    use std::path::Path;

    pub fn bleed_with_report(
        _bytes: &[u8],
        _options: &BleedOptions,
        _lib_dir: Option<&Path>,
    ) -> Result<(Vec<u8>, BleedReport)> {
        bail!("pdfb was built without the pdfium feature; rendering is unavailable")
    }

    pub fn preflight(
        _bytes: &[u8],
        _options: &BleedOptions,
        _lib_dir: Option<&Path>,
    ) -> Result<PreflightReport> {
        bail!("pdfb was built without the pdfium feature; rendering is unavailable")
    }
}
