mod corrector;
mod date;
mod metadata;
#[cfg(test)]
mod testutil;

use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(
    name = "photo-date-fix",
    version,
    about = "Batch-correct photo timestamps from EXIF dates and filename dates"
)]
struct Cli {
    /// Directory of photos to correct (subdirectories are not entered)
    dir: PathBuf,

    /// Metadata backend: "exif-rs" or "little-exif"
    #[arg(long, default_value = "exif-rs")]
    backend: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let t_total = std::time::Instant::now();

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40}] {pos}/{len} correcting dates")
            .unwrap(),
    );

    let summary = corrector::process_directory(&cli.dir, &cli.backend, &|current, total, message| {
        pb.set_length(total);
        pb.set_position(current + 1);
        pb.println(message);
    })?;
    pb.finish_and_clear();

    eprintln!(
        "Done! {} corrected into {}/, {} moved to {}/ ({:.2}s)",
        summary.corrected,
        corrector::EDIT_DIR,
        summary.failed,
        corrector::ERROR_DIR,
        t_total.elapsed().as_secs_f64()
    );
    Ok(())
}
