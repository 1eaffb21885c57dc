use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use labelme2coco::{convert, ConvertArgs};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = ConvertArgs::parse();

    if !args.label_dir.is_dir() {
        error!(
            "The specified label_dir does not exist: {}",
            args.label_dir.display()
        );
        return ExitCode::FAILURE;
    }
    if !args.image_dir.is_dir() {
        error!(
            "The specified image_dir does not exist: {}",
            args.image_dir.display()
        );
        return ExitCode::FAILURE;
    }

    info!("Starting LabelMe to COCO conversion process...");

    match convert(&args.to_convert_config()) {
        Ok(report) => {
            report.stats.print_summary();
            let names: Vec<&str> = report
                .coco
                .categories
                .iter()
                .map(|c| c.name.as_str())
                .collect();
            info!("Categories: {:?}", names);
            info!("COCO conversion process completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to convert dataset: {}", e);
            ExitCode::FAILURE
        }
    }
}
