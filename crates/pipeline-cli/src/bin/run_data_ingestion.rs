//! Data ingestion stage entry point

use pipeline_cli::{print_banner, run_ingestion, StageContext};

fn main() -> anyhow::Result<()> {
    let ctx = StageContext::init()?;
    let ingestion = &ctx.config.data_ingestion;

    print_banner(
        "Hotel Reservation Prediction - Data Ingestion",
        &[
            ("Project Root", ctx.paths.root().display().to_string()),
            ("Source Dataset", ctx.paths.source_dataset().display().to_string()),
            ("Output Directory", ctx.paths.raw_dir().display().to_string()),
            ("Train/Test Split", format!("{}/{}", ingestion.train_ratio, ingestion.test_ratio)),
        ],
    );

    let report = run_ingestion(&ctx.paths, &ctx.config)?;

    print_banner(
        "Data Ingestion Complete!",
        &[
            ("Train Rows", report.train_rows.to_string()),
            ("Test Rows", report.test_rows.to_string()),
        ],
    );
    Ok(())
}
