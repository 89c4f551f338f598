//! Model training stage entry point

use pipeline_cli::{print_banner, run_training, StageContext};

fn main() -> anyhow::Result<()> {
    let ctx = StageContext::init()?;

    print_banner(
        "Hotel Reservation Prediction - Model Training",
        &[
            ("Project Root", ctx.paths.root().display().to_string()),
            ("Train Data", ctx.paths.processed_train_file().display().to_string()),
            ("Test Data", ctx.paths.processed_test_file().display().to_string()),
            ("Model Output", ctx.paths.model_output().display().to_string()),
        ],
    );

    let report = run_training(&ctx.paths, &ctx.config)?;

    print_banner(
        "Model Training Complete!",
        &[
            ("Accuracy", format!("{:.4}", report.metrics.accuracy)),
            ("F1", format!("{:.4}", report.metrics.f1)),
        ],
    );
    Ok(())
}
