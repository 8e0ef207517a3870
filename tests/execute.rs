//! Execution-engine behavior: ordering, skip semantics, retry, dry-run,
//! data-driven rows and argument binding.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use cornichon::{
    Bundle, ExecError, FixtureResolver, ParamSource, Parser, Registry,
    Runner, StepListener, StepStatus, StepTracker, TestData, Value, location,
};

type Log = Arc<Mutex<Vec<String>>>;

fn fixture_set() -> (Parser, Arc<Registry>, Arc<Bundle>) {
    let registry = Arc::new(Registry::new());
    let bundle = Arc::new(Bundle::new());
    (Parser::new(Arc::clone(&registry), Arc::clone(&bundle)), registry, bundle)
}

fn log_step(registry: &Registry, pattern: &str, log: &Log) {
    let log = Arc::clone(log);
    let pattern_owned = pattern.to_owned();
    let _ = registry
        .step(pattern)
        .handler(move |_| {
            log.lock().unwrap().push(pattern_owned.clone());
            Ok(())
        })
        .unwrap();
}

struct Recorder(Log);

impl StepListener for Recorder {
    fn after_step(&mut self, tracker: &StepTracker) {
        self.0
            .lock()
            .unwrap()
            .push(format!("after {} [{}]", tracker.display_name, tracker.status));
    }

    fn step_skipped(&mut self, step: &str) {
        self.0.lock().unwrap().push(format!("skipped {step}"));
    }

    fn step_not_found(&mut self, step: &str) {
        self.0.lock().unwrap().push(format!("not-found {step}"));
    }
}

#[test]
fn failing_first_step_skips_but_walks_the_rest() {
    let (parser, registry, bundle) = fixture_set();
    let invoked = Arc::new(AtomicUsize::new(0));
    let _ = registry
        .given("a failing step")
        .handler(|_| Err("boom".into()))
        .unwrap();
    let counter = Arc::clone(&invoked);
    let _ = registry
        .given("a passing step")
        .handler(move |_| {
            let _ = counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

    let mut feature = parser
        .parse_str(
            "Feature: F\n\
             Scenario: S\n\
             Given a failing step\n\
             Given a passing step\n\
             Given a passing step\n",
            "skip.feature",
        )
        .unwrap();

    let log: Log = Log::default();
    let mut runner = Runner::new(registry, bundle)
        .with_listener(Recorder(Arc::clone(&log)));
    let outcomes = runner.run_feature(&mut feature, &TestData::new());

    let err = outcomes[0].result.as_ref().unwrap_err();
    assert!(
        matches!(err, ExecError::StepFailed { step, .. } if step == "a failing step")
    );
    assert!(err.to_string().contains("boom"));
    // Skipped steps were never invoked.
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
    // ... but they were walked and recorded.
    let events = log.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "after Given a failing step [failed]",
            "skipped a passing step",
            "skipped a passing step",
        ]
    );
    // The exception slot holds the surfaced failure.
    assert!(feature.scenarios[0].exception.is_some());
}

#[test]
fn missing_step_is_fatal_outside_dry_run() {
    let (_parser, registry, bundle) = fixture_set();
    let mut runner = Runner::new(registry, bundle);
    let err = runner
        .execute_text("an unregistered step", &TestData::new())
        .unwrap_err();
    assert!(
        matches!(err, ExecError::StepNotFound { step } if step == "an unregistered step")
    );
}

#[test]
fn dry_run_turns_missing_steps_into_events() {
    let (parser, registry, bundle) = fixture_set();
    let mut feature = parser
        .parse_str(
            "Feature: F\nScenario: S\nGiven nobody implemented this\n",
            "dry.feature",
        )
        .unwrap();

    let log: Log = Log::default();
    let mut runner = Runner::new(registry, bundle)
        .dry_run(true)
        .with_listener(Recorder(Arc::clone(&log)));
    let outcomes = runner.run_feature(&mut feature, &TestData::new());
    assert!(outcomes[0].passed());
    assert_eq!(
        log.lock().unwrap().clone(),
        vec!["not-found nobody implemented this"]
    );
}

#[test]
fn dry_run_resolves_but_never_invokes_implementations() {
    let (_parser, registry, bundle) = fixture_set();
    let invoked = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&invoked);
    let _ = registry
        .given("a real step")
        .handler(move |_| {
            let _ = counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

    let mut runner = Runner::new(registry, bundle).dry_run(true);
    runner.execute_text("a real step", &TestData::new()).unwrap();
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
}

#[test]
fn implementation_requested_retry_reinvokes_without_rebinding() {
    let (_parser, registry, bundle) = fixture_set();
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let _ = registry
        .when("a flaky step")
        .handler(move |tracker| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                tracker.request_retry();
                Err("still warming up".into())
            } else {
                tracker.set_result("warm");
                Ok(())
            }
        })
        .unwrap();

    let mut runner = Runner::new(registry, bundle);
    let result =
        runner.execute_text("a flaky step", &TestData::new()).unwrap();
    assert_eq!(result.as_deref(), Some("warm"));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[test]
fn retry_that_keeps_failing_surfaces_the_last_failure() {
    let (_parser, registry, bundle) = fixture_set();
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let _ = registry
        .when("a doomed step")
        .handler(move |tracker| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 2 {
                tracker.request_retry();
            }
            Err(format!("attempt {n} failed").into())
        })
        .unwrap();

    let mut runner = Runner::new(registry, bundle);
    let err =
        runner.execute_text("a doomed step", &TestData::new()).unwrap_err();
    assert!(err.to_string().contains("attempt 2 failed"));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn background_steps_run_before_every_scenario() {
    let (parser, registry, bundle) = fixture_set();
    let log: Log = Log::default();
    log_step(&registry, "ground state", &log);
    log_step(&registry, "first scenario step", &log);
    log_step(&registry, "second scenario step", &log);

    let mut feature = parser
        .parse_str(
            "Feature: F\n\
             Background: B\n\
             Given ground state\n\
             Scenario: one\n\
             Given first scenario step\n\
             Scenario: two\n\
             Given second scenario step\n",
            "bg.feature",
        )
        .unwrap();

    let mut runner = Runner::new(registry, bundle);
    let outcomes = runner.run_feature(&mut feature, &TestData::new());
    assert!(outcomes.iter().all(|o| o.passed()));
    assert_eq!(
        log.lock().unwrap().clone(),
        vec![
            "ground state",
            "first scenario step",
            "ground state",
            "second scenario step",
        ]
    );
}

#[test]
fn examples_rows_feed_angle_placeholders() {
    let (parser, registry, bundle) = fixture_set();
    let log: Log = Log::default();
    let seen = Arc::clone(&log);
    let _ = registry
        .given("greeting '{name}'")
        .handler(move |tracker| {
            seen.lock()
                .unwrap()
                .push(tracker.str_kwarg("name").unwrap_or_default().to_owned());
            Ok(())
        })
        .unwrap();

    let mut feature = parser
        .parse_str(
            "Feature: F\n\
             Scenario Outline: greet everyone\n\
             Given greeting '<user>'\n\
             Examples:\n\
             |user|\n\
             |alice|\n\
             |bob|\n",
            "rows.feature",
        )
        .unwrap();

    let mut runner = Runner::new(registry, bundle);
    let outcomes = runner.run_feature(&mut feature, &TestData::new());
    assert!(outcomes[0].passed());
    assert_eq!(log.lock().unwrap().clone(), vec!["alice", "bob"]);
}

#[test]
fn every_examples_row_runs_even_after_an_earlier_row_fails() {
    let (parser, registry, bundle) = fixture_set();
    let log: Log = Log::default();
    let seen = Arc::clone(&log);
    let _ = registry
        .given("checking '{user}'")
        .handler(move |tracker| {
            let user =
                tracker.str_kwarg("user").unwrap_or_default().to_owned();
            seen.lock().unwrap().push(user.clone());
            if user == "bad" {
                Err("rejected".into())
            } else {
                Ok(())
            }
        })
        .unwrap();

    let mut feature = parser
        .parse_str(
            "Feature: F\n\
             Scenario: rows\n\
             Given checking '<user>'\n\
             Examples:\n\
             |user|\n\
             |bad|\n\
             |good|\n",
            "rowfail.feature",
        )
        .unwrap();

    let mut runner = Runner::new(registry, bundle);
    let outcomes = runner.run_feature(&mut feature, &TestData::new());
    let err = outcomes[0].result.as_ref().unwrap_err();
    assert!(err.to_string().contains("rejected"));
    assert_eq!(log.lock().unwrap().clone(), vec!["bad", "good"]);
}

#[test]
fn exception_slot_clears_between_runs() {
    let (parser, registry, bundle) = fixture_set();
    let gate = Arc::clone(&bundle);
    let _ = registry
        .given("a gated step")
        .handler(move |_| {
            if gate.contains("open") {
                Ok(())
            } else {
                Err("gate closed".into())
            }
        })
        .unwrap();

    let mut feature = parser
        .parse_str(
            "Feature: F\nScenario: S\nGiven a gated step\n",
            "gate.feature",
        )
        .unwrap();

    let mut runner = Runner::new(registry, Arc::clone(&bundle));
    let outcomes = runner.run_feature(&mut feature, &TestData::new());
    assert!(!outcomes[0].passed());
    assert!(feature.scenarios[0].exception.is_some());

    bundle.set("open", "yes");
    let outcomes = runner.run_feature(&mut feature, &TestData::new());
    assert!(outcomes[0].passed());
    assert!(feature.scenarios[0].exception.is_none());
}

#[test]
fn attached_data_table_binds_as_a_trailing_positional() {
    let (parser, registry, bundle) = fixture_set();
    let rows_seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&rows_seen);
    let _ = registry
        .given("users exist")
        .handler(move |tracker| {
            let Some(Value::Table(rows)) = tracker.args.first() else {
                return Err("expected a data table".into());
            };
            sink.lock().unwrap().extend(rows.clone());
            Ok(())
        })
        .unwrap();

    let mut feature = parser
        .parse_str(
            "Feature: F\n\
             Scenario: S\n\
             Given users exist\n\
             |name|role|\n\
             |alice|admin|\n",
            "table.feature",
        )
        .unwrap();

    let mut runner = Runner::new(registry, bundle);
    let outcomes = runner.run_feature(&mut feature, &TestData::new());
    assert!(outcomes[0].passed());
    let rows = rows_seen.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name").map(String::as_str), Some("alice"));
    assert_eq!(rows[0].get("role").map(String::as_str), Some("admin"));
}

struct TestFixtures;

impl FixtureResolver for TestFixtures {
    fn fixture(&self, name: &str) -> Option<Value> {
        (name == "session_id").then(|| Value::Str("session-42".into()))
    }
}

#[test]
fn declared_parameters_bind_by_source() {
    let (_parser, registry, bundle) = fixture_set();
    let _ = registry
        .given("an injected step")
        .location(location!())
        .inject("context", ParamSource::Context)
        .inject("session_id", ParamSource::Fixture)
        .inject("absent", ParamSource::Fixture)
        .handler(|tracker| {
            assert_eq!(tracker.kwarg("context"), Some(&Value::Context));
            assert_eq!(tracker.str_kwarg("session_id"), Some("session-42"));
            assert_eq!(tracker.kwarg("absent"), Some(&Value::None));
            Ok(())
        })
        .unwrap();

    let mut runner =
        Runner::new(registry, bundle).with_fixtures(TestFixtures);
    runner.execute_text("an injected step", &TestData::new()).unwrap();
}

#[test]
fn test_data_resolves_placeholders_before_lookup() {
    let (_parser, registry, bundle) = fixture_set();
    bundle.set("city", "Paris");
    let _ = registry
        .given("travel to 'Paris' from 'Lyon'")
        .handler(|_| Ok(()))
        .unwrap();

    let mut runner = Runner::new(registry, bundle);
    let mut data = TestData::new();
    let _ = data.insert("origin".to_owned(), "Lyon".to_owned());
    // `${city}` resolves from the bundle, `${origin}` from test data.
    runner
        .execute_text("travel to '${city}' from '${origin}'", &data)
        .unwrap();
}

#[test]
fn explicit_execute_flags_override_runner_state() {
    let (_parser, registry, bundle) = fixture_set();
    let invoked = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&invoked);
    let _ = registry
        .given("a counted step")
        .handler(move |_| {
            let _ = counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

    let mut runner = Runner::new(registry, bundle);
    // Skipped: resolved and looked up, never invoked.
    let result = runner
        .execute("a counted step", &TestData::new(), false, true)
        .unwrap();
    assert!(result.is_none());
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
    // Per-call dry-run tolerates a missing implementation.
    runner
        .execute("never implemented", &TestData::new(), true, false)
        .unwrap();
    // Outside dry-run the same call is fatal.
    assert!(runner
        .execute("never implemented", &TestData::new(), false, false)
        .is_err());
}

#[test]
fn tracker_reports_status_transitions_to_listeners() {
    let (_parser, registry, bundle) = fixture_set();
    let statuses: Arc<Mutex<Vec<StepStatus>>> = Arc::default();
    let _ = registry.given("a watched step").handler(|_| Ok(())).unwrap();

    struct StatusListener(Arc<Mutex<Vec<StepStatus>>>);
    impl StepListener for StatusListener {
        fn before_step(&mut self, tracker: &StepTracker) {
            self.0.lock().unwrap().push(tracker.status);
        }
        fn after_step(&mut self, tracker: &StepTracker) {
            self.0.lock().unwrap().push(tracker.status);
        }
    }

    let mut runner = Runner::new(registry, bundle)
        .with_listener(StatusListener(Arc::clone(&statuses)));
    runner.execute_text("a watched step", &TestData::new()).unwrap();
    assert_eq!(
        statuses.lock().unwrap().clone(),
        vec![StepStatus::Pending, StepStatus::Passed]
    );
}
