use rand::SeedableRng;
use rand::rngs::StdRng;
use solace::agent::{Agent, AgentContext, ReplyKind, SERVICE_UNAVAILABLE_REPLY};
use solace::ml::label_encoder::LabelEncoder;
use solace::ml::logistic::{LogisticConfig, LogisticRegression};
use solace::ml::tfidf::{TfIdfVectorizer, VectorizerConfig};
use solace::responder::selector::{ANGER_REPLY, FALLBACK_REPLIES, JOY_REPLY, SADNESS_REPLY};
use solace::responder::{
    AnalysisResponse, EmotionScores, EmotionService, LexiconEmotionService, ServiceError,
    ServiceResult, TimeoutEmotionService, select_response,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// Replays a canned provider response.
struct ScriptedService {
    response: AnalysisResponse,
    calls: AtomicUsize,
}

impl ScriptedService {
    fn from_json(json: &str) -> Arc<Self> {
        Arc::new(ScriptedService {
            response: serde_json::from_str(json).unwrap(),
            calls: AtomicUsize::new(0),
        })
    }
}

impl EmotionService for ScriptedService {
    fn analyze(&self, _text: &str) -> ServiceResult<EmotionScores> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone().into_result()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct StalledService;

impl EmotionService for StalledService {
    fn analyze(&self, _text: &str) -> ServiceResult<EmotionScores> {
        thread::sleep(Duration::from_millis(500));
        Err(ServiceError::Failed("too late".to_string()))
    }

    fn name(&self) -> &str {
        "stalled"
    }
}

fn context() -> Arc<AgentContext> {
    let texts = [
        "so sad and lonely",
        "anxious and worried",
        "sad tears again",
        "worried sick",
    ];
    let labels = ["depression", "anxiety", "depression", "anxiety"];

    let mut vectorizer = TfIdfVectorizer::new(VectorizerConfig::default()).unwrap();
    let x = vectorizer.fit_transform(&texts).unwrap();
    let encoder = LabelEncoder::fitted(&labels).unwrap();
    let y = encoder.encode(&labels).unwrap();
    let classifier = LogisticRegression::fit(LogisticConfig::default(), &x, &y, encoder.n_classes())
        .unwrap()
        .with_feature_fingerprint(vectorizer.fingerprint());

    Arc::new(AgentContext::from_parts(vectorizer, encoder, classifier).unwrap())
}

#[test]
fn test_sadness_has_priority_over_joy() {
    let service = ScriptedService::from_json(
        r#"{"success": true, "emotions": {"sadness": 0.6, "joy": 0.9}}"#,
    );
    let agent = Agent::with_seed(context(), service, 1);

    let reply = agent.respond("mixed feelings today");
    assert_eq!(reply.kind, ReplyKind::Emotional);
    assert_eq!(reply.text, SADNESS_REPLY);
}

#[test]
fn test_anger_just_above_threshold() {
    let scores = EmotionScores::from_json(r#"{"anger": 0.41}"#).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    assert_eq!(select_response(&scores, &mut rng), ANGER_REPLY);
}

#[test]
fn test_joy_at_threshold_falls_back() {
    let scores = EmotionScores::from_json(r#"{"joy": 0.5}"#).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    for _ in 0..10 {
        let reply = select_response(&scores, &mut rng);
        assert_ne!(reply, JOY_REPLY);
        assert!(FALLBACK_REPLIES.contains(&reply));
    }
}

#[test]
fn test_service_failure_gives_fixed_reply() {
    let service = ScriptedService::from_json(r#"{"success": false, "error": "quota exceeded"}"#);
    let agent = Agent::with_seed(context(), service.clone(), 1);

    let reply = agent.respond("hello there");
    assert_eq!(reply.kind, ReplyKind::ServiceUnavailable);
    assert_eq!(reply.text, SERVICE_UNAVAILABLE_REPLY);
    assert_eq!(reply.emotion, None);
    assert_eq!(reply.scores, None);
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_empty_input_skips_service() {
    let service = ScriptedService::from_json(r#"{"success": true, "emotions": {"joy": 0.9}}"#);
    let agent = Agent::with_seed(context(), service.clone(), 1);

    let reply = agent.respond("   \n");
    assert_eq!(reply.kind, ReplyKind::PromptForInput);
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_timeout_counts_as_unavailable() {
    let service = Arc::new(TimeoutEmotionService::new(
        Arc::new(StalledService),
        Duration::from_millis(20),
    ));
    let agent = Agent::with_seed(context(), service, 1);

    let reply = agent.respond("is anyone there");
    assert_eq!(reply.kind, ReplyKind::ServiceUnavailable);
}

#[test]
fn test_lexicon_service_drives_replies() {
    let service = Arc::new(LexiconEmotionService::new().unwrap());
    let agent = Agent::with_seed(context(), service, 1);

    assert_eq!(agent.respond("Today was a great, happy day").text, JOY_REPLY);
    assert_eq!(agent.respond("I am so angry and frustrated").text, ANGER_REPLY);

    let neutral = agent.respond("the bus was on time");
    assert_eq!(neutral.kind, ReplyKind::Emotional);
    assert_eq!(neutral.emotion, None);
    assert!(FALLBACK_REPLIES.contains(&neutral.text.as_str()));
}

#[test]
fn test_seeded_agents_agree() {
    let service = ScriptedService::from_json(r#"{"success": true, "emotions": {}}"#);
    let first = Agent::with_seed(context(), service.clone(), 99);
    let second = Agent::with_seed(context(), service, 99);

    for _ in 0..5 {
        assert_eq!(first.respond("hm").text, second.respond("hm").text);
    }
}
