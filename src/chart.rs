use std::ops::RangeInclusive;

use egui::{Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, GridMark, Plot, PlotPoint, Text};

use crate::types::QuerySummary;

/// Bar fill shared by every chart
const BAR_COLOR: Color32 = Color32::from_rgb(0x66, 0x33, 0x99);

/// Longest category label drawn on the x axis
const LABEL_MAX_CHARS: usize = 24;

/// Render the frequency table as a bar chart: one bar per distinct value,
/// category labels on the x axis, the count drawn above each bar.
pub fn frequency_chart(ui: &mut Ui, summary: &QuerySummary) {
    if summary.frequencies.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No responses for this selection");
        });
        return;
    }

    let bars: Vec<Bar> = summary
        .frequencies
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            Bar::new(i as f64, entry.count as f64)
                .width(0.6)
                .name(&entry.value)
        })
        .collect();

    let max_count = summary
        .frequencies
        .iter()
        .map(|e| e.count)
        .max()
        .unwrap_or(0) as f64;
    let label_offset = (max_count * 0.03).max(0.25);

    let labels: Vec<String> = summary
        .frequencies
        .iter()
        .map(|e| truncate_label(&e.value, LABEL_MAX_CHARS))
        .collect();
    let bar_count = labels.len();

    let chart = BarChart::new(bars).color(BAR_COLOR);

    Plot::new("frequency_chart")
        .x_axis_formatter(move |mark: GridMark, _max_chars: usize, _range: &RangeInclusive<f64>| {
            // Only the integer marks correspond to bars
            let index = mark.value.round();
            if (mark.value - index).abs() > 0.05 || index < 0.0 {
                return String::new();
            }
            labels.get(index as usize).cloned().unwrap_or_default()
        })
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .include_x(-0.5)
        .include_x(bar_count as f64 - 0.5)
        .include_y(0.0)
        .include_y(max_count * 1.15)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(chart);
            for (i, entry) in summary.frequencies.iter().enumerate() {
                plot_ui.text(Text::new(
                    PlotPoint::new(i as f64, entry.count as f64 + label_offset),
                    RichText::new(entry.count.to_string()).size(12.0),
                ));
            }
        });
}

/// Shorten a category label for axis display without splitting a character
fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let mut truncated: String = label.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_label_short() {
        assert_eq!(truncate_label("Chocolate", 24), "Chocolate");
    }

    #[test]
    fn test_truncate_label_long() {
        let label = "Galletas integrales con harina de cáscara de papa";
        let truncated = truncate_label(label, 24);
        assert_eq!(truncated.chars().count(), 24);
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn test_truncate_label_multibyte_boundary() {
        // Must count characters, not bytes
        let label = "¿Cuántas veces a la semana realiza actividad física?";
        let truncated = truncate_label(label, 10);
        assert_eq!(truncated.chars().count(), 10);
        assert!(truncated.starts_with("¿Cuántas"));
    }
}
