use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::chart;
use crate::dataset;
use crate::query;
use crate::types::{Dataset, QuerySummary, DEFAULT_DATA_PATH};

/// Interactive frequency dashboard for the cookie-consumption survey
#[derive(Parser, Debug)]
#[command(name = "survey-explorer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one frequency query and print the result as JSON
    Query {
        /// Survey export to load (CSV, TSV or Excel)
        #[arg(short, long, env = "SURVEY_DATA", default_value = DEFAULT_DATA_PATH)]
        input: PathBuf,

        /// Age range to filter by (must match an observed value)
        #[arg(short, long)]
        age_range: String,

        /// Survey question whose answers are counted
        #[arg(short, long)]
        column: String,

        /// Output JSON file path (stdout if not specified)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List the selectable questions and the observed age ranges
    Columns {
        /// Survey export to load (CSV, TSV or Excel)
        #[arg(short, long, env = "SURVEY_DATA", default_value = DEFAULT_DATA_PATH)]
        input: PathBuf,
    },

    /// Launch the interactive dashboard (the default)
    Gui {
        /// Survey export to load (CSV, TSV or Excel)
        #[arg(short, long, env = "SURVEY_DATA", default_value = DEFAULT_DATA_PATH)]
        input: PathBuf,
    },
}

/// Input path used when no subcommand is given
pub fn default_input() -> PathBuf {
    std::env::var_os("SURVEY_DATA")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH))
}

/// Dashboard application state.
///
/// The dataset is immutable between loads; every dropdown change re-runs the
/// query engine against it and caches the summary for the current selection.
pub struct GuiApp {
    dataset: Dataset,
    selected_age: String,
    selected_column: String,
    summary: Option<QuerySummary>,
    summary_key: Option<(String, String)>,
    status: Option<String>,
}

impl GuiApp {
    pub fn new(dataset: Dataset) -> Self {
        let mut app = Self {
            dataset,
            selected_age: String::new(),
            selected_column: String::new(),
            summary: None,
            summary_key: None,
            status: None,
        };
        app.reset_selections();
        app
    }

    /// Default selections: first observed age range, and the first question
    /// after the age range
    fn reset_selections(&mut self) {
        self.selected_age = self
            .dataset
            .age_options()
            .first()
            .cloned()
            .unwrap_or_default();

        let columns = self.dataset.column_names();
        self.selected_column = columns
            .get(1)
            .or_else(|| columns.first())
            .cloned()
            .unwrap_or_default();

        self.summary = None;
        self.summary_key = None;
    }

    /// Load another survey export; on failure the current dataset stays
    fn replace_dataset(&mut self, path: &Path) {
        match dataset::load_dataset(path) {
            Ok(loaded) => {
                self.dataset = loaded;
                self.reset_selections();
                self.status = None;
            }
            Err(err) => {
                log::warn!("reload failed: {}", err);
                self.status = Some(format!("Could not load {}: {}", path.display(), err));
            }
        }
    }

    /// Recompute the summary only when the selection pair changed
    fn refresh_summary(&mut self) {
        let key = (self.selected_age.clone(), self.selected_column.clone());
        if self.summary_key.as_ref() != Some(&key) {
            self.summary = Some(query::run_or_empty(&self.dataset, &key.0, &key.1));
            self.summary_key = Some(key);
        }
    }

    fn show_controls(&mut self, ui: &mut egui::Ui) {
        let age_options: Vec<String> = self.dataset.age_options().to_vec();
        let columns: Vec<String> = self.dataset.column_names().to_vec();

        ui.horizontal(|ui| {
            ui.label("Age range:");
            egui::ComboBox::from_id_source("age_range")
                .selected_text(&self.selected_age)
                .show_ui(ui, |ui| {
                    for option in &age_options {
                        ui.selectable_value(&mut self.selected_age, option.clone(), option);
                    }
                });
        });

        ui.horizontal(|ui| {
            ui.label("Question:");
            egui::ComboBox::from_id_source("question")
                .selected_text(&self.selected_column)
                .width(ui.available_width() - 8.0)
                .show_ui(ui, |ui| {
                    for column in &columns {
                        ui.selectable_value(&mut self.selected_column, column.clone(), column);
                    }
                });
        });
    }
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // A dropped survey file replaces the dataset
        let dropped: Option<PathBuf> =
            ctx.input(|i| i.raw.dropped_files.first().and_then(|f| f.path.clone()));
        if let Some(path) = dropped {
            self.replace_dataset(&path);
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open…").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Survey exports", &["csv", "tsv", "xlsx", "xls"])
                        .pick_file()
                    {
                        self.replace_dataset(&path);
                    }
                }
                ui.separator();
                ui.label(format!(
                    "{} ({} respondents)",
                    self.dataset.source,
                    self.dataset.len()
                ));
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Cookie Survey Explorer");
            ui.add_space(10.0);

            if let Some(status) = &self.status {
                let status = status.clone();
                ui.colored_label(egui::Color32::RED, status);
                ui.add_space(10.0);
            }

            self.show_controls(ui);
            self.refresh_summary();

            if let Some(summary) = &self.summary {
                ui.add_space(12.0);
                ui.label(
                    egui::RichText::new(format!("Total responses: {}", summary.total))
                        .size(18.0)
                        .strong(),
                );
                ui.label(format!(
                    "Frequency of {} for {}",
                    summary.column, summary.age_range
                ));
                ui.add_space(8.0);
                chart::frequency_chart(ui, summary);
            }
        });
    }
}
