use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::Error;
use crate::types::{is_missing, Dataset, FrequencyEntry, QuerySummary, Result};

/// Run one frequency query over the prepared dataset.
///
/// Keeps the respondents whose age-range answer contains `age_range`, explodes
/// the chosen column into one value per selected option, and counts every
/// non-missing value. The frequency table is ordered by descending count; tied
/// values keep the order in which they were first encountered. Pure: the same
/// inputs always produce the same summary.
///
/// Fails with `InvalidSelection` if `age_range` was never observed in the data
/// or `column` is not one of the prepared columns, so callers that bypass the
/// dropdowns are caught.
pub fn run(dataset: &Dataset, age_range: &str, column: &str) -> Result<QuerySummary> {
    if !dataset.age_options().iter().any(|o| o == age_range) {
        return Err(Error::InvalidSelection(format!(
            "age range not observed in the data: {}",
            age_range
        )));
    }

    let column_index = dataset
        .column_index(column)
        .ok_or_else(|| Error::InvalidSelection(format!("unknown column: {}", column)))?;

    let age_index = dataset.age_index();

    let mut total = 0u64;
    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    let exploded = dataset
        .rows()
        .iter()
        .filter(|row| row.cells[age_index].contains(age_range))
        .flat_map(|row| row.cells[column_index].iter());

    for value in exploded {
        if is_missing(value) {
            continue;
        }
        total += 1;
        match counts.entry(value.to_string()) {
            Entry::Occupied(mut entry) => *entry.get_mut() += 1,
            Entry::Vacant(entry) => {
                order.push(value.to_string());
                entry.insert(1);
            }
        }
    }

    let mut frequencies: Vec<FrequencyEntry> = order
        .into_iter()
        .map(|value| {
            let count = counts[&value];
            FrequencyEntry { value, count }
        })
        .collect();
    // Stable sort: tied counts keep first-encounter order
    frequencies.sort_by(|a, b| b.count.cmp(&a.count));

    Ok(QuerySummary {
        age_range: age_range.to_string(),
        column: column.to_string(),
        total,
        frequencies,
    })
}

/// Query for the UI: an invalid selection degrades to an empty summary instead
/// of an error, so the dashboard can render "no data".
pub fn run_or_empty(dataset: &Dataset, age_range: &str, column: &str) -> QuerySummary {
    match run(dataset, age_range, column) {
        Ok(summary) => summary,
        Err(err) => {
            log::warn!("query degraded to empty result: {}", err);
            QuerySummary::empty(age_range, column)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::prepare;
    use crate::types::{AGE_RANGE_COLUMN, MULTI_SELECT_COLUMNS, TIMESTAMP_COLUMN};

    const KIND_COLUMN: &str = "¿Qué tipo de galletas consume?";
    const COMMENT_COLUMN: &str = "Comentarios";

    fn raw_headers() -> Vec<String> {
        let mut headers = vec![TIMESTAMP_COLUMN.to_string()];
        headers.extend(MULTI_SELECT_COLUMNS.iter().map(|c| c.to_string()));
        headers.push(COMMENT_COLUMN.to_string());
        headers
    }

    fn raw_row(age: &str, kind: &str, comment: &str) -> Vec<String> {
        let mut row = vec!["2024/05/12 10:30:00".to_string()];
        for &col in MULTI_SELECT_COLUMNS {
            if col == AGE_RANGE_COLUMN {
                row.push(age.to_string());
            } else if col == KIND_COLUMN {
                row.push(kind.to_string());
            } else {
                row.push("x".to_string());
            }
        }
        row.push(comment.to_string());
        row
    }

    fn dataset(rows: Vec<Vec<String>>) -> Dataset {
        prepare("test.csv".to_string(), raw_headers(), rows).unwrap()
    }

    #[test]
    fn test_filter_explode_count_scenario() {
        // row1 belongs to two age brackets; "A;B" explodes into two values
        let ds = dataset(vec![
            raw_row("18-25;26-35", "A;B", ""),
            raw_row("18-25", "A", ""),
            raw_row("36-45", "C", ""),
        ]);

        let summary = run(&ds, "18-25", KIND_COLUMN).unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(
            summary.frequencies,
            vec![
                FrequencyEntry {
                    value: "A".to_string(),
                    count: 2
                },
                FrequencyEntry {
                    value: "B".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_total_equals_sum_of_counts() {
        let ds = dataset(vec![
            raw_row("18-25", "A;B;C", ""),
            raw_row("18-25;36-45", "A", ""),
            raw_row("18-25", "", ""),
        ]);

        for column in [KIND_COLUMN, AGE_RANGE_COLUMN] {
            let summary = run(&ds, "18-25", column).unwrap();
            let sum: u64 = summary.frequencies.iter().map(|e| e.count).sum();
            assert_eq!(summary.total, sum);
        }
    }

    #[test]
    fn test_unobserved_age_range_is_invalid_selection() {
        let ds = dataset(vec![raw_row("18-25", "A", "")]);

        let result = run(&ds, "99-120", KIND_COLUMN);
        assert!(matches!(result, Err(Error::InvalidSelection(_))));
    }

    #[test]
    fn test_unknown_column_is_invalid_selection() {
        let ds = dataset(vec![raw_row("18-25", "A", "")]);

        let result = run(&ds, "18-25", "No existe");
        assert!(matches!(result, Err(Error::InvalidSelection(_))));
    }

    #[test]
    fn test_run_or_empty_degrades_gracefully() {
        let ds = dataset(vec![raw_row("18-25", "A", "")]);

        let summary = run_or_empty(&ds, "99-120", KIND_COLUMN);
        assert_eq!(summary.total, 0);
        assert!(summary.frequencies.is_empty());
        assert_eq!(summary.age_range, "99-120");
    }

    #[test]
    fn test_sentinel_and_empty_cells_excluded() {
        let ds = dataset(vec![
            raw_row("18-25", "", ""),
            raw_row("18-25", "A", ""),
        ]);

        let summary = run(&ds, "18-25", KIND_COLUMN).unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.frequencies.len(), 1);
        assert!(summary.frequencies.iter().all(|e| e.value != "nan"));
    }

    #[test]
    fn test_empty_scalar_excluded() {
        let ds = dataset(vec![
            raw_row("18-25", "A", ""),
            raw_row("18-25", "A", "rica"),
        ]);

        let summary = run(&ds, "18-25", COMMENT_COLUMN).unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.frequencies[0].value, "rica");
    }

    #[test]
    fn test_age_column_explodes_uniformly() {
        let ds = dataset(vec![
            raw_row("18-25;26-35", "A", ""),
            raw_row("18-25", "B", ""),
        ]);

        // No special-casing when the filter column is also the counted column
        let summary = run(&ds, "18-25", AGE_RANGE_COLUMN).unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(
            summary.frequencies,
            vec![
                FrequencyEntry {
                    value: "18-25".to_string(),
                    count: 2
                },
                FrequencyEntry {
                    value: "26-35".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_descending_order_with_stable_ties() {
        let ds = dataset(vec![
            raw_row("18-25", "B;C", ""),
            raw_row("18-25", "A;B", ""),
            raw_row("18-25", "A;C", ""),
            raw_row("18-25", "A", ""),
        ]);

        let summary = run(&ds, "18-25", KIND_COLUMN).unwrap();
        let values: Vec<&str> = summary.frequencies.iter().map(|e| e.value.as_str()).collect();
        // A=3; B and C tie at 2 and keep encounter order (B seen first)
        assert_eq!(values, ["A", "B", "C"]);
    }

    #[test]
    fn test_query_is_idempotent() {
        let ds = dataset(vec![
            raw_row("18-25;26-35", "A;B", ""),
            raw_row("18-25", "A", "rica"),
        ]);

        let first = run(&ds, "18-25", KIND_COLUMN).unwrap();
        let second = run(&ds, "18-25", KIND_COLUMN).unwrap();
        assert_eq!(first, second);
    }
}
