//! Labelled text datasets loaded from CSV.
//!
//! The first row is treated as the header. Two columns are extracted: one
//! holding the free text and one holding its category label:
//! ```csv
//! tweet,campaign
//! "feeling low again today",depression
//! "cannot stop worrying",anxiety
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::seq::index;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SolaceError};

/// Default text column.
pub const DEFAULT_TEXT_COLUMN: &str = "tweet";

/// Default label column.
pub const DEFAULT_LABEL_COLUMN: &str = "campaign";

/// One record: free text plus its category label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub text: String,
    pub label: String,
}

impl DatasetRow {
    pub fn new<T: Into<String>, L: Into<String>>(text: T, label: L) -> Self {
        DatasetRow {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// An ordered collection of [`DatasetRow`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
}

/// A dataset split into disjoint training and test parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Dataset,
    pub test: Dataset,
}

impl Dataset {
    pub fn new(rows: Vec<DatasetRow>) -> Self {
        Dataset { rows }
    }

    /// Load a CSV file with the default `tweet` / `campaign` columns.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        DatasetReader::new().read_path(path)
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Texts in row order.
    pub fn texts(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.text.as_str()).collect()
    }

    /// Labels in row order.
    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }

    /// Draw exactly `n` rows uniformly at random without replacement.
    ///
    /// The result is a new dataset in sampled order. The same seed always
    /// draws the same rows.
    pub fn sample(&self, n: usize, seed: u64) -> Result<Dataset> {
        if n > self.len() {
            return Err(SolaceError::missing_input(format!(
                "dataset has {} rows, cannot sample {n}",
                self.len()
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let rows = index::sample(&mut rng, self.len(), n)
            .into_iter()
            .map(|i| self.rows[i].clone())
            .collect();

        Ok(Dataset { rows })
    }

    /// Randomly split into train and test parts (not stratified).
    ///
    /// The test part receives `ceil(test_fraction * n)` rows. Both parts
    /// must end up non-empty.
    pub fn train_test_split(&self, test_fraction: f64, seed: u64) -> Result<TrainTestSplit> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(SolaceError::invalid_config(format!(
                "test_fraction must be in (0, 1), got {test_fraction}"
            )));
        }

        let n = self.len();
        let n_test = (test_fraction * n as f64).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(SolaceError::invalid_config(format!(
                "splitting {n} rows with test_fraction {test_fraction} leaves an empty part"
            )));
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));

        let (test_idx, train_idx) = order.split_at(n_test);
        let pick = |indices: &[usize]| Dataset {
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        };

        Ok(TrainTestSplit {
            train: pick(train_idx),
            test: pick(test_idx),
        })
    }
}

impl FromIterator<DatasetRow> for Dataset {
    fn from_iter<I: IntoIterator<Item = DatasetRow>>(iter: I) -> Self {
        Dataset {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Reads a [`Dataset`] from CSV input.
#[derive(Debug, Clone)]
pub struct DatasetReader {
    text_column: String,
    label_column: String,
    /// CSV delimiter byte (default: b',')
    delimiter: u8,
    /// Whether to allow flexible field counts
    flexible: bool,
}

impl Default for DatasetReader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetReader {
    /// Create a reader for the default columns with comma delimiter.
    pub fn new() -> Self {
        DatasetReader {
            text_column: DEFAULT_TEXT_COLUMN.to_string(),
            label_column: DEFAULT_LABEL_COLUMN.to_string(),
            delimiter: b',',
            flexible: true,
        }
    }

    /// Set the text and label column names.
    pub fn with_columns<T: Into<String>, L: Into<String>>(mut self, text: T, label: L) -> Self {
        self.text_column = text.into();
        self.label_column = label.into();
        self
    }

    /// Set the field delimiter. CSV delimiters are single bytes.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether to allow flexible field counts.
    pub fn with_flexible(mut self, flexible: bool) -> Self {
        self.flexible = flexible;
        self
    }

    /// Read a dataset file. A missing or unreadable file is a missing input.
    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            SolaceError::missing_input(format!("cannot open dataset {}: {e}", path.display()))
        })?;

        let dataset = self.read(file)?;
        log::info!("loaded {} rows from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Read a dataset from any CSV source.
    pub fn read<R: Read>(&self, input: R) -> Result<Dataset> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(self.flexible)
            .from_reader(input);

        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| SolaceError::missing_input(format!("dataset has no {name:?} column")))
        };
        let text_idx = column(self.text_column.as_str())?;
        let label_idx = column(self.label_column.as_str())?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            // short rows read as empty cells
            let text = record.get(text_idx).unwrap_or_default();
            let label = record.get(label_idx).unwrap_or_default();
            rows.push(DatasetRow::new(text, label));
        }

        Ok(Dataset { rows })
    }
}
