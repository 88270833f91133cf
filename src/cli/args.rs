//! Command line argument parsing for the Solace CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ml::logistic::Solver;

/// Solace - a supportive conversational agent and its training pipeline
#[derive(Parser, Debug, Clone)]
#[command(name = "solace")]
#[command(about = "Train a campaign classifier and reply to feelings with supportive messages")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct SolaceArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// JSON configuration file
    #[arg(short, long, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl SolaceArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build TF-IDF features from the labelled dataset
    Preprocess(PreprocessArgs),

    /// Train the campaign classifier on stored features
    Train(TrainArgs),

    /// Pick a reply for a JSON map of emotion scores
    Respond(RespondArgs),

    /// Reply to a single message
    Ask(AskArgs),

    /// Talk to the agent interactively
    Chat(ChatArgs),

    /// Classify a text with the trained model
    Predict(PredictArgs),
}

/// Arguments for feature building
#[derive(Parser, Debug, Clone)]
pub struct PreprocessArgs {
    /// Path to the CSV dataset
    #[arg(short, long, value_name = "PATH")]
    pub dataset: Option<PathBuf>,

    /// Artifact directory
    #[arg(short, long, value_name = "DIR")]
    pub artifacts: Option<PathBuf>,

    /// Number of rows to sample
    #[arg(long)]
    pub sample_size: Option<usize>,

    /// Fraction of the sample held out for evaluation
    #[arg(long)]
    pub test_fraction: Option<f64>,

    /// Seed for sampling and splitting
    #[arg(long)]
    pub seed: Option<u64>,

    /// Maximum vocabulary size
    #[arg(long)]
    pub max_features: Option<usize>,

    /// Smallest n-gram length
    #[arg(long)]
    pub ngram_min: Option<usize>,

    /// Largest n-gram length
    #[arg(long)]
    pub ngram_max: Option<usize>,
}

/// Arguments for classifier training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Artifact directory
    #[arg(short, long, value_name = "DIR")]
    pub artifacts: Option<PathBuf>,

    /// Optimizer
    #[arg(long)]
    pub solver: Option<SolverArg>,

    /// Inverse regularization strength
    #[arg(long = "c", value_name = "C")]
    pub c: Option<f64>,

    /// Maximum optimizer iterations
    #[arg(long)]
    pub max_iter: Option<usize>,
}

/// Solver choices on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverArg {
    /// Full-batch gradient descent
    Gd,
    /// Mini-batch stochastic gradient descent
    Sgd,
}

impl From<SolverArg> for Solver {
    fn from(arg: SolverArg) -> Self {
        match arg {
            SolverArg::Gd => Solver::GradientDescent,
            SolverArg::Sgd => Solver::Sgd,
        }
    }
}

/// Arguments for score-based reply selection
#[derive(Parser, Debug, Clone)]
pub struct RespondArgs {
    /// Emotion scores, e.g. '{"sadness": 0.7, "joy": 0.1}'
    #[arg(value_name = "SCORES_JSON")]
    pub scores: String,

    /// Seed for the fallback reply
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for a single reply
#[derive(Parser, Debug, Clone)]
pub struct AskArgs {
    /// Message to reply to
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Artifact directory
    #[arg(short, long, value_name = "DIR")]
    pub artifacts: Option<PathBuf>,

    /// Seed for fallback replies
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for an interactive session
#[derive(Parser, Debug, Clone)]
pub struct ChatArgs {
    /// Artifact directory
    #[arg(short, long, value_name = "DIR")]
    pub artifacts: Option<PathBuf>,

    /// Seed for fallback replies
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for classifier inspection
#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    /// Text to classify
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Artifact directory
    #[arg(short, long, value_name = "DIR")]
    pub artifacts: Option<PathBuf>,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_args() {
        let args = SolaceArgs::try_parse_from([
            "solace",
            "preprocess",
            "--dataset",
            "data/tweets.csv",
            "--sample-size",
            "500",
            "--ngram-max",
            "1",
        ])
        .unwrap();

        if let Command::Preprocess(preprocess_args) = args.command {
            assert_eq!(preprocess_args.dataset, Some(PathBuf::from("data/tweets.csv")));
            assert_eq!(preprocess_args.sample_size, Some(500));
            assert_eq!(preprocess_args.ngram_min, None);
            assert_eq!(preprocess_args.ngram_max, Some(1));
        } else {
            panic!("Expected Preprocess command");
        }
    }

    #[test]
    fn test_train_args() {
        let args = SolaceArgs::try_parse_from([
            "solace", "train", "--solver", "sgd", "--c", "0.5", "--max-iter", "30",
        ])
        .unwrap();

        if let Command::Train(train_args) = args.command {
            assert_eq!(train_args.solver, Some(SolverArg::Sgd));
            assert_eq!(train_args.c, Some(0.5));
            assert_eq!(train_args.max_iter, Some(30));
            assert_eq!(Solver::from(SolverArg::Gd), Solver::GradientDescent);
        } else {
            panic!("Expected Train command");
        }
    }

    #[test]
    fn test_respond_and_ask_args() {
        let args =
            SolaceArgs::try_parse_from(["solace", "respond", r#"{"joy": 0.9}"#, "--seed", "4"])
                .unwrap();
        if let Command::Respond(respond_args) = args.command {
            assert_eq!(respond_args.scores, r#"{"joy": 0.9}"#);
            assert_eq!(respond_args.seed, Some(4));
        } else {
            panic!("Expected Respond command");
        }

        let args = SolaceArgs::try_parse_from(["solace", "ask", "I feel alone", "-a", "out"]).unwrap();
        if let Command::Ask(ask_args) = args.command {
            assert_eq!(ask_args.text, "I feel alone");
            assert_eq!(ask_args.artifacts, Some(PathBuf::from("out")));
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_verbosity_levels() {
        let args = SolaceArgs::try_parse_from(["solace", "chat"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args = SolaceArgs::try_parse_from(["solace", "-vv", "chat"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        let args = SolaceArgs::try_parse_from(["solace", "-vvv", "--quiet", "chat"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_global_options() {
        let args = SolaceArgs::try_parse_from([
            "solace", "--format", "json", "--pretty", "-c", "solace.json", "predict", "hello",
        ])
        .unwrap();
        assert!(matches!(args.output_format, OutputFormat::Json));
        assert!(args.pretty);
        assert_eq!(args.config, Some(PathBuf::from("solace.json")));
    }

    #[test]
    fn test_missing_text_is_rejected() {
        assert!(SolaceArgs::try_parse_from(["solace", "ask"]).is_err());
        assert!(SolaceArgs::try_parse_from(["solace", "train", "--solver", "lbfgs"]).is_err());
    }
}
