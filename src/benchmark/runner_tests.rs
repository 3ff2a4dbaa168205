use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::*;
use crate::chat::ChatMessage;
use crate::config::parse_yaml;

const TOOL_CALL: &str =
    "<tool_call>{'name': 'weather', 'arguments': {'city': 'Paris'}}</tool_call>";

fn config(dir: &Path, models: &[&str], scorer: &str) -> BenchConfig {
    let yaml = format!(
        r#"
config:
  test_iterations: 2
  models: [{models}]
  results_file: {results}
  diagnostics_file: {diagnostics}
  test_suites:
    - tools:
        scorer:
{scorer}
        setup_prompts:
          - system: "You can call functions."
        tests:
          - input: "weather in Paris?"
            expected_response: "{TOOL_CALL}"
          - input: "hello"
            expected_response: "Hi! How can I help?"
"#,
        models = models.join(", "),
        results = dir.join("results.csv").display(),
        diagnostics = dir.join("responses.txt").display(),
    );
    parse_yaml(&yaml).unwrap()
}

const TOOL_SCORER: &str = "          type: FunctionCallingScorer";

struct StubModel {
    name: String,
    fail_load: bool,
    calls: Arc<AtomicUsize>,
    events: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ModelProvider for StubModel {
    async fn load(&self) -> Result<(), BenchError> {
        self.events.lock().unwrap().push(format!("load {}", self.name));
        if self.fail_load {
            return Err(BenchError::ModelLifecycle("not downloaded".into()));
        }
        Ok(())
    }

    async fn unload(&self) -> Result<(), BenchError> {
        self.events.lock().unwrap().push(format!("unload {}", self.name));
        Ok(())
    }

    async fn call_with_messages(
        &self,
        conversation: &[ChatMessage],
    ) -> Result<String, BenchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(conversation.len(), 2);
        let question = &conversation[1].content;
        match (self.name.as_str(), question.as_str()) {
            ("good", "weather in Paris?") => Ok(concat!(
                "<think>the user wants weather</think>```json\n",
                "{\"name\": \"weather\", \"arguments\": {\"city\": \"Paris\"}}\n```"
            )
            .to_string()),
            ("good", _) => Ok("Hello there!".to_string()),
            // The flaky model fails its very first call and otherwise never calls tools.
            ("flaky", _) if call == 0 => Err(BenchError::HttpError("connection reset".into())),
            ("flaky", _) => Ok("I cannot check the weather.".to_string()),
            _ => Ok(String::new()),
        }
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

fn factory(events: Arc<Mutex<Vec<String>>>) -> ModelFactory {
    Box::new(move |name: &str| {
        Ok(Box::new(StubModel {
            name: name.to_string(),
            fail_load: name == "missing",
            calls: Arc::new(AtomicUsize::new(0)),
            events: events.clone(),
        }) as Box<dyn ModelProvider>)
    })
}

fn no_env() -> EnvLookup {
    Box::new(|_: &str| None)
}

#[test]
fn thinking_preamble_is_dropped() {
    assert_eq!(strip_thinking("<think>hmm</think>answer"), "answer");
    assert_eq!(strip_thinking("a</think>b</think>c"), "b</think>c");
    assert_eq!(strip_thinking("plain"), "plain");
}

#[tokio::test]
async fn runs_every_model_and_writes_results() {
    let dir = tempfile::tempdir().unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let cfg = config(dir.path(), &["good", "missing", "flaky"], TOOL_SCORER);
    let bench = Benchmark::new(cfg)
        .with_model_factory(factory(events.clone()))
        .with_env(no_env())
        .show_progress(false);

    let results = bench.run().await.unwrap();

    assert_eq!(results.len(), 2);
    let good = &results[0];
    assert_eq!(good.model, "good");
    assert_eq!(good.cases, 4);
    assert_eq!(good.summary.min, 1.0);
    assert_eq!(good.summary.average, 1.0);

    // First call failed and was skipped; the tool-call test fails once.
    let flaky = &results[1];
    assert_eq!(flaky.cases, 3);
    assert_eq!(flaky.summary.min, 0.0);
    assert_eq!(flaky.summary.max, 1.0);

    assert_eq!(
        *events.lock().unwrap(),
        vec!["load good", "unload good", "load missing", "load flaky", "unload flaky"]
    );

    let csv = std::fs::read_to_string(dir.path().join("results.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Model,Test,Min,Max,Average,Average Inference Time");
    assert!(lines[1].starts_with("good,tools,1,1,1,"));
    assert!(lines[2].starts_with("flaky,tools,0,1,"));
    assert_eq!(lines.len(), 3);

    let responses = std::fs::read_to_string(dir.path().join("responses.txt")).unwrap();
    assert!(responses.contains("Model: flaky"));
    assert!(responses.contains("Candidate: I cannot check the weather."));
    assert!(!responses.contains("Model: good"));
}

#[tokio::test]
async fn each_failing_case_is_recorded_once() {
    let dir = tempfile::tempdir().unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let bench = Benchmark::new(config(dir.path(), &["flaky"], TOOL_SCORER))
        .with_model_factory(factory(events))
        .with_env(no_env())
        .show_progress(false);

    let results = bench.run().await.unwrap();
    assert_eq!(results[0].cases, 3);

    // One of the three answers misses its tool call.
    let responses = std::fs::read_to_string(dir.path().join("responses.txt")).unwrap();
    assert_eq!(responses.matches("Model: flaky").count(), 1);
    assert_eq!(responses.matches(" = Score: 0").count(), 1);
}

#[tokio::test]
async fn missing_judge_key_stops_before_any_model_runs() {
    let dir = tempfile::tempdir().unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let scorer = concat!(
        "          type: OpenRouterScorer\n",
        "          model: openai/gpt-4o\n",
        "          api_key_env: BENCH_TEST_JUDGE_KEY"
    );
    let bench = Benchmark::new(config(dir.path(), &["good"], scorer))
        .with_model_factory(factory(events.clone()))
        .with_env(no_env())
        .show_progress(false);

    let err = bench.run().await.unwrap_err();

    assert!(matches!(err, BenchError::AuthError(_)));
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cancelled_run_stops_early() {
    let dir = tempfile::tempdir().unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let cancel = CancellationToken::new();
    cancel.cancel();
    let bench = Benchmark::new(config(dir.path(), &["good"], TOOL_SCORER))
        .with_model_factory(factory(events.clone()))
        .with_env(no_env())
        .with_cancellation(cancel)
        .show_progress(false);

    assert!(matches!(bench.run().await, Err(BenchError::Cancelled)));
    assert!(events.lock().unwrap().is_empty());

    let csv = std::fs::read_to_string(dir.path().join("results.csv")).unwrap();
    assert_eq!(csv.lines().count(), 1);
}
