//! Data preprocessing stage entry point

use pipeline_cli::{print_banner, run_preprocessing, StageContext};

fn main() -> anyhow::Result<()> {
    let ctx = StageContext::init()?;

    print_banner(
        "Hotel Reservation Prediction - Data Preprocessing",
        &[
            ("Project Root", ctx.paths.root().display().to_string()),
            ("Train Data", ctx.paths.train_file().display().to_string()),
            ("Test Data", ctx.paths.test_file().display().to_string()),
        ],
    );

    let report = run_preprocessing(&ctx.paths, &ctx.config)?;

    print_banner(
        "Data Preprocessing Complete!",
        &[("Selected Features", report.selected_features.join(", "))],
    );
    Ok(())
}
