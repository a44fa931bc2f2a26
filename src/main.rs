mod chart;
mod cli;
mod dataset;
mod error;
mod output;
mod query;
mod types;

use std::path::PathBuf;

use clap::Parser;
use cli::{Cli, Commands};
use error::Error;
use types::Result;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Query {
            input,
            age_range,
            column,
            out,
        }) => {
            let dataset = dataset::load_dataset(&input)?;
            let summary = query::run(&dataset, &age_range, &column)?;

            if let Some(out_path) = out {
                output::write_json_file(&summary, &out_path)?;
                eprintln!("Summary written to: {}", out_path.display());
            } else {
                output::write_json_stdout(&summary)?;
            }
        }
        Some(Commands::Columns { input }) => {
            let dataset = dataset::load_dataset(&input)?;

            println!("Questions:");
            for column in dataset.column_names() {
                println!("  {}", column);
            }
            println!("Age ranges:");
            for option in dataset.age_options() {
                println!("  {}", option);
            }
        }
        Some(Commands::Gui { input }) => run_gui(input)?,
        None => run_gui(cli::default_input())?,
    }

    Ok(())
}

fn run_gui(input: PathBuf) -> Result<()> {
    use crate::cli::GuiApp;

    // A missing or malformed survey file is fatal here; reloads from inside
    // the GUI degrade to a status message instead
    let dataset = dataset::load_dataset(&input)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Cookie Survey Explorer",
        options,
        Box::new(move |_cc| Box::new(GuiApp::new(dataset))),
    )
    .map_err(|e| Error::InvalidInput(format!("GUI error: {}", e)))?;

    Ok(())
}
