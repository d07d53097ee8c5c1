mod config;

use anyhow::Context;
use clap::Parser;
use image::DynamicImage;
use luckprinter::{
    BleTransport, DryRunTransport, LuckPrinter, LuckPrinterError, SerialTransport, Transport,
};
use tracing_subscriber::EnvFilter;

use config::{Args, PrintConfig, TransportKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    load_dotenv();

    let args = Args::parse();
    let mut config = PrintConfig::load()?;
    config.apply_args(&args);

    let profile = config.profile();
    let kind = config.transport_kind()?;

    // Decode before connecting so a bad file never reaches the printer.
    let img = image::open(&args.image)
        .with_context(|| format!("failed to decode {}", args.image.display()))?;

    tracing::info!(
        image = %args.image.display(),
        width = img.width(),
        height = img.height(),
        density = %profile.density,
        "Starting print job"
    );

    match kind {
        TransportKind::DryRun => {
            let mut printer = LuckPrinter::new(DryRunTransport::new(), profile)?;
            run_job(&mut printer, &img).await?;

            let t = printer.transport();
            tracing::info!(
                writes = t.writes().len(),
                bytes = t.bytes().len(),
                "Dry run complete"
            );
            if let Some(path) = &args.dump {
                std::fs::write(path, t.bytes())
                    .with_context(|| format!("failed to write {}", path.display()))?;
                tracing::info!(path = %path.display(), "Wrote command stream");
            }
        }
        TransportKind::Serial(path) => {
            let mut printer = LuckPrinter::new(SerialTransport::new(path), profile)?;
            run_job(&mut printer, &img).await?;
        }
        TransportKind::Ble(address) => {
            let mut printer = LuckPrinter::new(BleTransport::new(address), profile)?;
            run_job(&mut printer, &img).await?;
        }
    }

    tracing::info!("Print job finished");
    Ok(())
}

/// Load .env from the working directory or its parent.
fn load_dotenv() {
    let candidates = [".env", "../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::debug!("No .env file found, using system environment variables");
}

/// Initialize, print and feed out one image, then always close the
/// transport.
async fn run_job<T: Transport>(
    printer: &mut LuckPrinter<T>,
    img: &DynamicImage,
) -> anyhow::Result<()> {
    let job_result = async {
        printer.initialize().await?;
        printer.print_image(img).await?;
        printer.print_end().await
    }
    .await;
    let close_result = printer.close().await;

    finalize_job_results(job_result, close_result)
}

/// The job error wins over a close error; both are reported if both fail.
fn finalize_job_results(
    job_result: Result<(), LuckPrinterError>,
    close_result: Result<(), LuckPrinterError>,
) -> anyhow::Result<()> {
    match (job_result, close_result) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(job_err), Ok(())) => Err(job_err.into()),
        (Ok(()), Err(close_err)) => Err(close_err.into()),
        (Err(job_err), Err(close_err)) => Err(anyhow::Error::new(job_err)
            .context(format!("closing the transport also failed: {close_err}"))),
    }
}
