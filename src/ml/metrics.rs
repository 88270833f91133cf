//! Evaluation metrics for classifiers.
//!
//! [`ClassificationReport`] renders in the familiar tabular layout:
//!
//! ```text
//!               precision    recall  f1-score   support
//!
//!      anxiety       1.00      0.50      0.67         2
//!   depression       0.67      1.00      0.80         2
//!
//!     accuracy                           0.75         4
//!    macro avg       0.83      0.75      0.73         4
//! weighted avg       0.83      0.75      0.73         4
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolaceError};

/// Precision, recall and F1 for a single class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Averaged precision, recall and F1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class and aggregate metrics for a set of predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
}

/// Counts `matrix[true][predicted]` over `n_classes` class ids.
pub fn confusion_matrix(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Result<Vec<Vec<usize>>> {
    if y_true.len() != y_pred.len() {
        return Err(SolaceError::invalid_argument(format!(
            "{} true labels but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }

    let mut matrix = vec![vec![0; n_classes]; n_classes];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        if t >= n_classes || p >= n_classes {
            return Err(SolaceError::invalid_argument(format!(
                "class id out of range for {n_classes} classes"
            )));
        }
        matrix[t][p] += 1;
    }
    Ok(matrix)
}

/// `numerator / denominator`, or 0.0 when the denominator is zero.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

impl ClassificationReport {
    /// Compare predictions against ground truth.
    ///
    /// `class_names[i]` names class id `i`; every class appears in the report,
    /// including classes with zero support. Undefined ratios are reported as 0.
    pub fn compute<S: AsRef<str>>(y_true: &[usize], y_pred: &[usize], class_names: &[S]) -> Result<Self> {
        let n_classes = class_names.len();
        let matrix = confusion_matrix(y_true, y_pred, n_classes)?;

        let classes: Vec<ClassMetrics> = class_names
            .iter()
            .enumerate()
            .map(|(c, name)| {
                let tp = matrix[c][c] as f64;
                let predicted: usize = (0..n_classes).map(|t| matrix[t][c]).sum();
                let support: usize = matrix[c].iter().sum();

                let precision = ratio(tp, predicted as f64);
                let recall = ratio(tp, support as f64);
                let f1_score = ratio(2.0 * precision * recall, precision + recall);

                ClassMetrics {
                    label: name.as_ref().to_string(),
                    precision,
                    recall,
                    f1_score,
                    support,
                }
            })
            .collect();

        let total = y_true.len();
        let correct: usize = (0..n_classes).map(|c| matrix[c][c]).sum();
        let accuracy = ratio(correct as f64, total as f64);

        let k = n_classes as f64;
        let macro_avg = AverageMetrics {
            precision: ratio(classes.iter().map(|m| m.precision).sum(), k),
            recall: ratio(classes.iter().map(|m| m.recall).sum(), k),
            f1_score: ratio(classes.iter().map(|m| m.f1_score).sum(), k),
            support: total,
        };

        let weighted = |value: fn(&ClassMetrics) -> f64| {
            ratio(
                classes.iter().map(|m| value(m) * m.support as f64).sum(),
                total as f64,
            )
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1_score: weighted(|m| m.f1_score),
            support: total,
        };

        Ok(ClassificationReport {
            classes,
            accuracy,
            macro_avg,
            weighted_avg,
        })
    }

    /// Metrics for one class by label.
    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.classes.iter().find(|m| m.label == label)
    }

    /// Number of evaluated samples.
    pub fn support(&self) -> usize {
        self.macro_avg.support
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const LAST_LINE: &str = "weighted avg";
        let width = self
            .classes
            .iter()
            .map(|m| m.label.chars().count())
            .max()
            .unwrap_or(0)
            .max(LAST_LINE.len());

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;

        for m in &self.classes {
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.label, m.precision, m.recall, m.f1_score, m.support
            )?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.support()
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), (LAST_LINE, &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1_score, avg.support
            )?;
        }
        Ok(())
    }
}
