use serde::{Deserialize, Serialize};

/// Header of the export timestamp column, removed during preparation
pub const TIMESTAMP_COLUMN: &str = "Marca temporal";

/// Header of the age-range question, the column every query filters on
pub const AGE_RANGE_COLUMN: &str = "Seleccione el rango etario al cual pertenece";

/// Sentinel stored for an empty or missing multi-select cell
pub const MISSING_SENTINEL: &str = "nan";

/// Default location of the survey export
pub const DEFAULT_DATA_PATH: &str = "raw_data/datosEncuestaGalleta.csv";

/// The survey questions whose answers arrive as `;`-joined multi-select text.
/// These headers must exist in the raw table; the list is configuration, not
/// inferred from the data.
pub const MULTI_SELECT_COLUMNS: &[&str] = &[
    AGE_RANGE_COLUMN,
    "Seleccione nacionalidad a la que pertenece",
    "¿Cuántas veces a la semana realiza actividad física de al menos 30 minutos al día?",
    "¿Con cuánta frecuencia consume galletas?",
    "¿En qué tiempo de comida suele consumir galletas?",
    "¿Qué tipo de galletas consume?",
    "¿Cuántas unidades suele consumir de galletas?",
    "¿En qué se fija al momento de comprar una galleta?",
    "Considerando su respuesta anterior, ¿cuál es el factor más importante para usted al momento de comprar una galleta?",
    "¿Suele leer los ingredientes de estas galletas?",
    "¿Consume galletas con alguno de estos ingredientes que aportan fibra dietética, enfocados en mejorar la salud intestinal?",
    "¿Se siente satisfecho luego del consumo de galletas?",
    "¿Ha notado diferencias en la sensación de plenitud (sentirse satisfecho) cuando consume galletas azucaradas en comparación a las integrales?",
    "¿Cuánto dinero está dispuesto a pagar al momento de comprar un paquete de galletas?",
    "¿Estaría dispuesto a pagar más por una galleta de mejor composición nutricional que presente beneficios para su salud digestiva?",
    "¿Usted consumiría galletas preparadas con harina de cáscara de papa?",
    "¿Cuál de estos factores consideraría más importante al momento de comprar una galleta elaborada con cáscara de papa?",
    "¿Cuál de las siguientes afirmaciones refleja mejor su opinión sobre galletas con cáscara de papas?",
];

/// Whether a value counts as missing for frequency purposes
pub fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed == MISSING_SENTINEL
}

/// One cell of a prepared respondent record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    /// A plain single-answer cell
    Scalar(String),
    /// A multi-select answer split on `;`, in the order the respondent picked
    Multi(Vec<String>),
}

impl CellValue {
    /// View the cell as a sequence; a scalar is a one-element sequence
    pub fn as_slice(&self) -> &[String] {
        match self {
            CellValue::Scalar(v) => std::slice::from_ref(v),
            CellValue::Multi(vs) => vs.as_slice(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.as_slice().iter().map(String::as_str)
    }

    /// Membership test used by the age-range filter
    pub fn contains(&self, needle: &str) -> bool {
        self.iter().any(|v| v == needle)
    }
}

/// One survey answer row after preparation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Respondent {
    /// Cells indexed by the dataset's column order
    pub cells: Vec<CellValue>,
}

/// The prepared survey table. Built once at startup, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Display name of the source file
    pub source: String,

    /// Cleaned column names, timestamp removed, original order
    columns: Vec<String>,

    /// All respondent rows
    rows: Vec<Respondent>,

    /// Index of [`AGE_RANGE_COLUMN`] within `columns`
    age_index: usize,

    /// Distinct exploded age-range values, first-encounter order
    age_options: Vec<String>,
}

impl Dataset {
    /// Assemble a dataset from prepared columns and rows.
    ///
    /// Fails with `ColumnMissing` if the age-range column is absent, and caches
    /// the age-range option list the dropdowns and the query validator share.
    pub fn new(source: String, columns: Vec<String>, rows: Vec<Respondent>) -> Result<Self> {
        let age_index = columns
            .iter()
            .position(|c| c == AGE_RANGE_COLUMN)
            .ok_or_else(|| crate::error::Error::ColumnMissing(AGE_RANGE_COLUMN.to_string()))?;

        let mut age_options: Vec<String> = Vec::new();
        for row in &rows {
            for value in row.cells[age_index].iter() {
                if !age_options.iter().any(|o| o == value) {
                    age_options.push(value.to_string());
                }
            }
        }

        Ok(Self {
            source,
            columns,
            rows,
            age_index,
            age_options,
        })
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn age_index(&self) -> usize {
        self.age_index
    }

    /// The age-range values the UI offers, in first-encounter order
    pub fn age_options(&self) -> &[String] {
        &self.age_options
    }

    pub fn rows(&self) -> &[Respondent] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One bar of the frequency table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: u64,
}

/// Result of one query: total answer count plus the ordered frequency table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySummary {
    /// Age range the rows were filtered by
    pub age_range: String,

    /// Column whose values were counted
    pub column: String,

    /// Number of non-missing exploded values
    pub total: u64,

    /// Per-value counts, descending, ties in first-encounter order
    pub frequencies: Vec<FrequencyEntry>,
}

impl QuerySummary {
    /// Empty result for a selection that matches nothing
    pub fn empty(age_range: &str, column: &str) -> Self {
        Self {
            age_range: age_range.to_string(),
            column: column.to_string(),
            total: 0,
            frequencies: Vec::new(),
        }
    }
}

/// Supported survey export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    Excel,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(FileFormat::Csv),
            "tsv" | "tab" => Some(FileFormat::Tsv),
            "xlsx" | "xls" | "xlsm" | "xlsb" => Some(FileFormat::Excel),
            _ => None,
        }
    }
}

/// Result type for the application
pub type Result<T> = std::result::Result<T, crate::error::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_missing() {
        assert!(is_missing(""));
        assert!(is_missing("   "));
        assert!(is_missing("nan"));
        assert!(is_missing(" nan "));
        assert!(!is_missing("No"));
        assert!(!is_missing("0"));
    }

    #[test]
    fn test_cell_value_uniform_iteration() {
        let scalar = CellValue::Scalar("A".to_string());
        let multi = CellValue::Multi(vec!["A".to_string(), "B".to_string()]);

        assert_eq!(scalar.as_slice().len(), 1);
        assert_eq!(multi.as_slice().len(), 2);
        assert!(scalar.contains("A"));
        assert!(multi.contains("B"));
        assert!(!multi.contains("C"));
    }

    #[test]
    fn test_file_format_from_extension() {
        assert_eq!(FileFormat::from_extension("csv"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_extension("CSV"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_extension("tab"), Some(FileFormat::Tsv));
        assert_eq!(FileFormat::from_extension("xlsx"), Some(FileFormat::Excel));
        assert_eq!(FileFormat::from_extension("pdf"), None);
    }

    #[test]
    fn test_age_options_encounter_order() {
        let columns = vec![AGE_RANGE_COLUMN.to_string()];
        let rows = vec![
            Respondent {
                cells: vec![CellValue::Multi(vec![
                    "26-35".to_string(),
                    "18-25".to_string(),
                ])],
            },
            Respondent {
                cells: vec![CellValue::Multi(vec!["18-25".to_string()])],
            },
            Respondent {
                cells: vec![CellValue::Multi(vec!["36-45".to_string()])],
            },
        ];

        let dataset = Dataset::new("test.csv".to_string(), columns, rows).unwrap();
        assert_eq!(dataset.age_options(), &["26-35", "18-25", "36-45"]);
    }

    #[test]
    fn test_dataset_requires_age_column() {
        let columns = vec!["Otra pregunta".to_string()];
        let rows = Vec::new();

        let result = Dataset::new("test.csv".to_string(), columns, rows);
        assert!(matches!(result, Err(crate::error::Error::ColumnMissing(_))));
    }
}
