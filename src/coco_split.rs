use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use labelme2coco::{split_coco_file, SplitArgs};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = SplitArgs::parse();

    info!(
        "Splitting {} with test_ratio={} seed={}",
        args.input.display(),
        args.test_ratio,
        args.seed
    );

    match split_coco_file(&args.input, &args.to_split_config()) {
        Ok(report) => {
            info!(
                "Train: {} images, {} annotations",
                report.train_images, report.train_annotations
            );
            info!(
                "Test: {} images, {} annotations",
                report.test_images, report.test_annotations
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to split dataset: {}", e);
            ExitCode::FAILURE
        }
    }
}
