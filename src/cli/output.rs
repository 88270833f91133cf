//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::agent::{Prediction, Reply};
use crate::cli::args::{OutputFormat, SolaceArgs};
use crate::error::Result;
use crate::ml::metrics::ClassificationReport;

/// Result structure for feature building.
#[derive(Debug, Serialize, Deserialize)]
pub struct PreprocessResult {
    pub artifacts: String,
    pub train_rows: usize,
    pub test_rows: usize,
    pub vocabulary_size: usize,
    pub duration_ms: u64,
}

/// Result structure for classifier training.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainResult {
    pub artifacts: String,
    pub classes: Vec<String>,
    pub iterations: usize,
    pub converged: bool,
    pub report: ClassificationReport,
    pub duration_ms: u64,
    pub trained_at: String,
}

/// Result structure for a single reply.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplyResult {
    #[serde(flatten)]
    pub reply: Reply,
}

/// Result structure for classifier inspection.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResult {
    pub text: String,
    #[serde(flatten)]
    pub prediction: Prediction,
}

/// Output a result in the selected format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &SolaceArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &SolaceArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;

    match result {
        _ if std::any::type_name::<T>().contains("TrainResult") => {
            output_train_result_human(&value, args)
        }
        _ if std::any::type_name::<T>().contains("ReplyResult") => output_reply_human(&value),
        _ => output_generic_human(&value, args),
    }
}

/// Output a training run in human format, with the classification report.
fn output_train_result_human(value: &serde_json::Value, _args: &SolaceArgs) -> Result<()> {
    if let Some(obj) = value.as_object() {
        if let Some(classes) = obj.get("classes").and_then(|c| c.as_array()) {
            println!("Classes: {}", classes.len());
        }
        if let Some(iterations) = obj.get("iterations").and_then(|i| i.as_u64()) {
            println!("Iterations: {iterations}");
        }
        if let Some(converged) = obj.get("converged").and_then(|c| c.as_bool()) {
            println!("Converged: {}", if converged { "yes" } else { "no" });
        }
        if let Some(duration) = obj.get("duration_ms").and_then(|d| d.as_u64()) {
            println!("Training time: {duration}ms");
        }

        if let Some(report) = obj.get("report") {
            let report: ClassificationReport = serde_json::from_value(report.clone())?;
            println!();
            println!("Classification Report:");
            println!("══════════════════════");
            print!("{report}");
        }
    }
    Ok(())
}

/// Print only the reply text.
fn output_reply_human(value: &serde_json::Value) -> Result<()> {
    if let Some(text) = value.get("text").and_then(|t| t.as_str()) {
        println!("{text}");
    }
    Ok(())
}

/// Output generic data in human format.
fn output_generic_human(value: &serde_json::Value, _args: &SolaceArgs) -> Result<()> {
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                let formatted_val = format_value(val);
                println!("{key}: {formatted_val}");
            }
        }
        _ => {
            let formatted_value = format_value(value);
            println!("{formatted_value}");
        }
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &SolaceArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for human output.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{f:.4}"),
            _ => n.to_string(),
        },
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(obj) => {
            let formatted_values = obj
                .iter()
                .map(|(k, v)| format!("{k}={}", format_value(v)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{{formatted_values}}}")
        }
        serde_json::Value::Null => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!("campaign")), "campaign");
        assert_eq!(format_value(&json!(42)), "42");
        assert_eq!(format_value(&json!(0.5)), "0.5000");
        assert_eq!(format_value(&json!(true)), "true");
        assert_eq!(format_value(&json!(null)), "null");
        assert_eq!(format_value(&json!(["a", 1])), "[a, 1]");
        assert_eq!(format_value(&json!({"joy": 1})), "{joy=1}");
    }

    #[test]
    fn test_predict_result_flattens_prediction() {
        let result = PredictResult {
            text: "hello".to_string(),
            prediction: Prediction {
                label: "a".to_string(),
                confidence: 0.75,
                probabilities: vec![("a".to_string(), 0.75), ("b".to_string(), 0.25)],
            },
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["text"], "hello");
        assert_eq!(value["label"], "a");
        assert_eq!(value["confidence"], 0.75);
    }
}
