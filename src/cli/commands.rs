//! Command implementations for the Solace CLI.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::agent::{Agent, AgentContext};
use crate::artifact::ArtifactStore;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::SolaceConfig;
use crate::error::Result;
use crate::pipeline::{ClassifierTrainer, FeatureBuilder};
use crate::responder::{
    EmotionScores, EmotionService, LexiconEmotionService, TimeoutEmotionService, select_response,
};

/// Word that ends a chat session.
pub const QUIT_COMMAND: &str = "quit";

/// Execute a CLI command.
pub fn execute_command(args: SolaceArgs) -> Result<()> {
    let config = load_config(&args)?;

    match args.command.clone() {
        Command::Preprocess(preprocess_args) => preprocess(preprocess_args, config, &args),
        Command::Train(train_args) => train(train_args, config, &args),
        Command::Respond(respond_args) => respond(respond_args, &args),
        Command::Ask(ask_args) => ask(ask_args, config, &args),
        Command::Chat(chat_args) => chat(chat_args, config, &args),
        Command::Predict(predict_args) => predict(predict_args, config, &args),
    }
}

/// Read the `--config` file, or fall back to defaults.
fn load_config(args: &SolaceArgs) -> Result<SolaceConfig> {
    match &args.config {
        Some(path) => SolaceConfig::load(path),
        None => Ok(SolaceConfig::default()),
    }
}

/// Build TF-IDF features and persist them.
fn preprocess(args: PreprocessArgs, mut config: SolaceConfig, cli_args: &SolaceArgs) -> Result<()> {
    if let Some(dataset) = args.dataset {
        config.dataset.path = dataset;
    }
    if let Some(artifacts) = args.artifacts {
        config.artifacts.directory = artifacts;
    }
    if let Some(sample_size) = args.sample_size {
        config.features.sample_size = sample_size;
    }
    if let Some(test_fraction) = args.test_fraction {
        config.features.test_fraction = test_fraction;
    }
    if let Some(seed) = args.seed {
        config.features.seed = seed;
    }
    if let Some(max_features) = args.max_features {
        config.features.max_features = max_features;
    }
    if let Some(ngram_min) = args.ngram_min {
        config.features.ngram_range.0 = ngram_min;
    }
    if let Some(ngram_max) = args.ngram_max {
        config.features.ngram_range.1 = ngram_max;
    }
    config.validate()?;

    let start = Instant::now();
    let store = ArtifactStore::create_dir(&config.artifacts.directory)?;
    let features = FeatureBuilder::new(config.feature_config())
        .build_and_persist(&config.dataset.path, &store)?;

    let result = PreprocessResult {
        artifacts: config.artifacts.directory.display().to_string(),
        train_rows: features.train_matrix.n_rows(),
        test_rows: features.test_matrix.n_rows(),
        vocabulary_size: features.vectorizer.vocabulary_size(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    output_result("Preprocessing complete", &result, cli_args)
}

/// Train the classifier from stored features.
fn train(args: TrainArgs, mut config: SolaceConfig, cli_args: &SolaceArgs) -> Result<()> {
    if let Some(artifacts) = args.artifacts {
        config.artifacts.directory = artifacts;
    }
    if let Some(solver) = args.solver {
        config.trainer.solver = solver.into();
    }
    if let Some(c) = args.c {
        config.trainer.c = c;
    }
    if let Some(max_iter) = args.max_iter {
        config.trainer.max_iter = max_iter;
    }
    config.validate()?;

    let start = Instant::now();
    let store = ArtifactStore::open_dir(&config.artifacts.directory)?;
    let outcome = ClassifierTrainer::new(config.trainer.clone()).train_from_store(&store)?;

    let result = TrainResult {
        artifacts: config.artifacts.directory.display().to_string(),
        classes: outcome.encoder.classes().to_vec(),
        iterations: outcome.classifier.n_iter().into_iter().max().unwrap_or(0),
        converged: outcome.classifier.converged().into_iter().all(|c| c),
        report: outcome.report,
        duration_ms: start.elapsed().as_millis() as u64,
        trained_at: chrono::Utc::now().to_rfc3339(),
    };

    output_result("Training complete", &result, cli_args)
}

/// Select a reply for scores given on the command line.
fn respond(args: RespondArgs, cli_args: &SolaceArgs) -> Result<()> {
    let scores = EmotionScores::from_json(&args.scores)?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let reply = select_response(&scores, &mut rng);
    output_result("Reply", &reply, cli_args)
}

/// Reply to one message.
fn ask(args: AskArgs, mut config: SolaceConfig, cli_args: &SolaceArgs) -> Result<()> {
    if let Some(artifacts) = args.artifacts {
        config.artifacts.directory = artifacts;
    }
    if args.seed.is_some() {
        config.agent.seed = args.seed;
    }
    config.validate()?;

    let agent = build_agent(&config)?;
    let reply = agent.respond(&args.text);
    output_result("Reply", &ReplyResult { reply }, cli_args)
}

/// Interactive session over stdin until "quit" or end of input.
fn chat(args: ChatArgs, mut config: SolaceConfig, cli_args: &SolaceArgs) -> Result<()> {
    if let Some(artifacts) = args.artifacts {
        config.artifacts.directory = artifacts;
    }
    if args.seed.is_some() {
        config.agent.seed = args.seed;
    }
    config.validate()?;

    let agent = build_agent(&config)?;
    let interactive = matches!(cli_args.output_format, OutputFormat::Human) && cli_args.verbosity() > 0;
    if interactive {
        println!("Solace is listening. Type '{QUIT_COMMAND}' to leave.");
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            print!("> ");
            stdout.flush()?;
        }

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        if line.trim().eq_ignore_ascii_case(QUIT_COMMAND) {
            break;
        }

        let reply = agent.respond(&line);
        match cli_args.output_format {
            OutputFormat::Human => println!("{}", reply.text),
            OutputFormat::Json => output_result("Reply", &ReplyResult { reply }, cli_args)?,
        }
    }

    if interactive {
        println!("Take care.");
    }
    Ok(())
}

/// Classify a text with the trained model.
fn predict(args: PredictArgs, mut config: SolaceConfig, cli_args: &SolaceArgs) -> Result<()> {
    if let Some(artifacts) = args.artifacts {
        config.artifacts.directory = artifacts;
    }

    let context = load_context(&config.artifacts.directory)?;
    let prediction = context.predict(&args.text)?;

    let result = PredictResult {
        text: args.text,
        prediction,
    };
    output_result("Prediction", &result, cli_args)
}

fn load_context(directory: &Path) -> Result<AgentContext> {
    let store = ArtifactStore::open_dir(directory)?;
    AgentContext::load(&store)
}

/// Load the models and wire the lexicon service behind a deadline.
fn build_agent(config: &SolaceConfig) -> Result<Agent> {
    let context = Arc::new(load_context(&config.artifacts.directory)?);
    let service: Arc<dyn EmotionService> = Arc::new(TimeoutEmotionService::new(
        Arc::new(LexiconEmotionService::new()?),
        config.agent.service_timeout(),
    ));

    Ok(match config.agent.seed {
        Some(seed) => Agent::with_seed(context, service, seed),
        None => Agent::new(context, service),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_load_config_defaults_without_flag() {
        let args = SolaceArgs::try_parse_from(["solace", "respond", "{}"]).unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config, SolaceConfig::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"agent": {{"seed": 9}}}}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = SolaceArgs::try_parse_from(["solace", "-c", path.as_str(), "respond", "{}"]).unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.agent.seed, Some(9));
    }

    #[test]
    fn test_respond_rejects_malformed_scores() {
        let args = SolaceArgs::try_parse_from(["solace", "-q", "respond", "not json"]).unwrap();
        assert!(execute_command(args).is_err());
    }

    #[test]
    fn test_ask_without_artifacts_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("models");
        let args = SolaceArgs::try_parse_from([
            "solace",
            "-q",
            "ask",
            "hello",
            "--artifacts",
            missing.to_str().unwrap(),
        ])
        .unwrap();

        assert!(execute_command(args).unwrap_err().is_missing());
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = SolaceArgs::try_parse_from([
            "solace",
            "-q",
            "preprocess",
            "--test-fraction",
            "1.5",
        ])
        .unwrap();
        assert!(execute_command(args).is_err());
    }
}
