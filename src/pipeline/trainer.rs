//! Classifier training: feature artifacts → label encoding → logistic
//! regression → evaluation report.

use crate::artifact::{ArtifactKey, ArtifactStore};
use crate::error::{Result, SolaceError};
use crate::ml::label_encoder::LabelEncoder;
use crate::ml::logistic::{LogisticConfig, LogisticRegression};
use crate::ml::metrics::ClassificationReport;
use crate::ml::sparse::SparseMatrix;
use crate::ml::tfidf::TfIdfVectorizer;

/// Trainer hyperparameters.
pub type TrainerConfig = LogisticConfig;

/// Artifacts the trainer reads.
pub const TRAINING_INPUTS: [ArtifactKey; 4] = [
    ArtifactKey::TrainMatrix,
    ArtifactKey::TrainLabels,
    ArtifactKey::TestMatrix,
    ArtifactKey::TestLabels,
];

/// Result of a training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub report: ClassificationReport,
    pub encoder: LabelEncoder,
    pub classifier: LogisticRegression,
}

/// Fits a label encoder and a logistic regression classifier.
#[derive(Debug, Clone, Default)]
pub struct ClassifierTrainer {
    config: TrainerConfig,
}

impl ClassifierTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        ClassifierTrainer { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train on the training split and evaluate on the test split.
    ///
    /// The encoder is fit on `train_labels` only, so a test label that never
    /// occurs in training is an [`SolaceError::UnseenLabel`] error.
    pub fn train<S: AsRef<str>>(
        &self,
        train_matrix: &SparseMatrix,
        train_labels: &[S],
        test_matrix: &SparseMatrix,
        test_labels: &[S],
    ) -> Result<TrainingOutcome> {
        if train_matrix.n_cols() != test_matrix.n_cols() {
            return Err(SolaceError::schema_mismatch(format!(
                "train matrix has {} features, test matrix has {}",
                train_matrix.n_cols(),
                test_matrix.n_cols()
            )));
        }
        if test_matrix.n_rows() != test_labels.len() {
            return Err(SolaceError::invalid_argument(format!(
                "test matrix has {} rows but {} labels were given",
                test_matrix.n_rows(),
                test_labels.len()
            )));
        }

        let encoder = LabelEncoder::fitted(train_labels)?;
        let y_train = encoder.encode(train_labels)?;
        let y_test = encoder.encode(test_labels)?;
        log::info!(
            "training {} solver on {} rows, {} features, {} classes",
            self.config.solver,
            train_matrix.n_rows(),
            train_matrix.n_cols(),
            encoder.n_classes()
        );

        let classifier =
            LogisticRegression::fit(self.config.clone(), train_matrix, &y_train, encoder.n_classes())?;

        let predictions = classifier.predict_batch(test_matrix)?;
        let report = ClassificationReport::compute(&y_test, &predictions, encoder.classes())?;
        log::info!("model accuracy: {:.2}", report.accuracy);

        Ok(TrainingOutcome {
            report,
            encoder,
            classifier,
        })
    }

    /// Load the feature artifacts from `store`, train, and save
    /// `label_encoder` and `classifier` back.
    ///
    /// When the store also holds the vectorizer, the classifier is stamped
    /// with its vocabulary fingerprint. The classifier is saved whatever the
    /// evaluation scores are.
    pub fn train_from_store(&self, store: &ArtifactStore) -> Result<TrainingOutcome> {
        store.require(&TRAINING_INPUTS)?;

        let train_matrix: SparseMatrix = store.load(ArtifactKey::TrainMatrix)?;
        let train_labels: Vec<String> = store.load(ArtifactKey::TrainLabels)?;
        let test_matrix: SparseMatrix = store.load(ArtifactKey::TestMatrix)?;
        let test_labels: Vec<String> = store.load(ArtifactKey::TestLabels)?;

        let mut outcome = self.train(&train_matrix, &train_labels, &test_matrix, &test_labels)?;

        if store.contains(ArtifactKey::Vectorizer) {
            let vectorizer: TfIdfVectorizer = store.load(ArtifactKey::Vectorizer)?;
            if vectorizer.vocabulary_size() != train_matrix.n_cols() {
                return Err(SolaceError::schema_mismatch(format!(
                    "vectorizer has {} terms but the training matrix has {} columns",
                    vectorizer.vocabulary_size(),
                    train_matrix.n_cols()
                )));
            }
            outcome.classifier = outcome
                .classifier
                .with_feature_fingerprint(vectorizer.fingerprint());
        } else {
            log::warn!("no vectorizer artifact found; classifier will not record a vocabulary fingerprint");
        }

        store.save(ArtifactKey::LabelEncoder, &outcome.encoder)?;
        store.save(ArtifactKey::Classifier, &outcome.classifier)?;
        log::info!("label encoder and classifier saved");

        Ok(outcome)
    }
}

/// Train with default hyperparameters.
pub fn train_classifier<S: AsRef<str>>(
    train_matrix: &SparseMatrix,
    train_labels: &[S],
    test_matrix: &SparseMatrix,
    test_labels: &[S],
) -> Result<TrainingOutcome> {
    ClassifierTrainer::default().train(train_matrix, train_labels, test_matrix, test_labels)
}
