/// Sync engine scenarios against a scripted in-process store.
///
/// Backoff runs on tokio's paused clock, so the full 3s/6s/9s schedule costs nothing.
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use paramsync_core::error::SyncError;
use paramsync_core::keys::ParameterPath;
use paramsync_core::progress::{SilentReporter, SyncEvent, SyncReporter};
use paramsync_core::retry::RetryPolicy;
use paramsync_core::store::ParameterStore;
use paramsync_core::sync::{SyncEngine, SyncOptions, SyncPlan, SyncReport};
use paramsync_core::types::{EnvEntry, LocalSnapshot, ParameterKind};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    List(String),
    Put(String),
    Delete(Vec<String>),
}

#[derive(Default)]
struct ScriptedStore {
    params: Mutex<BTreeMap<String, String>>,
    ops: Mutex<Vec<Op>>,
    /// name → number of put failures still to inject
    put_failures: Mutex<HashMap<String, usize>>,
    put_attempts: Mutex<HashMap<String, usize>>,
    fail_delete: bool,
}

impl ScriptedStore {
    fn with(params: &[(&str, &str)]) -> Self {
        let store = Self::default();
        {
            let mut map = store.params.lock().unwrap();
            for (k, v) in params {
                map.insert(k.to_string(), v.to_string());
            }
        }
        store
    }

    fn fail_puts(&self, name: &str, times: usize) {
        self.put_failures
            .lock()
            .unwrap()
            .insert(name.to_string(), times);
    }

    fn params(&self) -> BTreeMap<String, String> {
        self.params.lock().unwrap().clone()
    }

    fn ops(&self) -> Vec<Op> {
        self.ops.lock().unwrap().clone()
    }

    fn attempts(&self, name: &str) -> usize {
        self.put_attempts
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl ParameterStore for ScriptedStore {
    async fn list(&self, prefix: &str) -> anyhow::Result<BTreeMap<String, String>> {
        self.ops.lock().unwrap().push(Op::List(prefix.to_string()));
        let prefix_slash = format!("{prefix}/");
        Ok(self
            .params
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix_slash))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn put(&self, name: &str, value: &str, _kind: ParameterKind) -> anyhow::Result<()> {
        self.ops.lock().unwrap().push(Op::Put(name.to_string()));
        let attempt = {
            let mut attempts = self.put_attempts.lock().unwrap();
            let n = attempts.entry(name.to_string()).or_insert(0);
            *n += 1;
            *n
        };
        {
            let mut failures = self.put_failures.lock().unwrap();
            if let Some(left) = failures.get_mut(name) {
                if *left > 0 {
                    *left -= 1;
                    anyhow::bail!("throttled {name} attempt {attempt}");
                }
            }
        }
        self.params
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_many(&self, names: &[String]) -> anyhow::Result<()> {
        self.ops.lock().unwrap().push(Op::Delete(names.to_vec()));
        if self.fail_delete {
            anyhow::bail!("access denied");
        }
        let mut params = self.params.lock().unwrap();
        for name in names {
            params.remove(name);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct RecordingReporter {
    events: Mutex<Vec<SyncEvent>>,
    prompts: Mutex<Vec<String>>,
    answer: bool,
}

impl RecordingReporter {
    fn new(answer: bool) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            answer,
        }
    }

    fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().unwrap().clone()
    }

    fn ticks(&self) -> usize {
        self.events().iter().filter(|e| e.is_tick()).count()
    }

    fn prompts(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl SyncReporter for RecordingReporter {
    fn event(&self, event: SyncEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
    }
}

fn path() -> ParameterPath {
    ParameterPath::new("app", "production").unwrap()
}

fn local(pairs: &[(&str, &str)]) -> LocalSnapshot {
    let entries = pairs.iter().map(|(k, v)| EnvEntry::new(*k, *v));
    LocalSnapshot::from_entries(entries, 4096, &SilentReporter).unwrap()
}

fn engine(store: &ScriptedStore) -> SyncEngine<'_> {
    SyncEngine::new(store, path(), SyncOptions::default())
}

// ── Scenarios ──────────────────────────────────────────────

#[tokio::test]
async fn scenario_a_single_write_into_empty_remote() {
    let store = ScriptedStore::default();
    let reporter = RecordingReporter::new(false);

    let report = engine(&store)
        .push(&local(&[("A", "x")]), &reporter)
        .await
        .unwrap();

    assert_eq!(report.deleted, 0);
    assert_eq!(report.written, 1);
    assert_eq!(
        store.params(),
        BTreeMap::from([("/app/production/A".to_string(), "x".to_string())])
    );
    assert_eq!(
        store.ops(),
        vec![
            Op::List("/app/production".to_string()),
            Op::Put("/app/production/A".to_string()),
        ]
    );
    assert_eq!(reporter.ticks(), 2);
    assert_eq!(reporter.events()[0], SyncEvent::Started { total: 2 });
    assert_eq!(reporter.prompts(), 0);
}

#[tokio::test]
async fn scenario_b_oversized_value_written_as_parts() {
    let store = ScriptedStore::default();
    let value = "a".repeat(4096) + &"b".repeat(904);
    let reporter = RecordingReporter::new(false);
    let local = LocalSnapshot::from_entries([EnvEntry::new("A", value)], 4096, &reporter).unwrap();

    engine(&store).push(&local, &reporter).await.unwrap();

    let params = store.params();
    assert_eq!(params.len(), 2);
    assert!(!params.contains_key("/app/production/A"));
    assert_eq!(params["/app/production/A.part0"], "a".repeat(4096));
    assert_eq!(params["/app/production/A.part1"], "b".repeat(904));
    assert_eq!(
        reporter.events()[0],
        SyncEvent::ValueSplit {
            key: "A".to_string(),
            parts: 2
        }
    );
}

#[tokio::test]
async fn scenario_c_stale_key_deleted_before_write() {
    let store = ScriptedStore::with(&[
        ("/app/production/A", "x"),
        ("/app/production/B", "y"),
    ]);
    let reporter = RecordingReporter::new(false);

    let report = engine(&store)
        .push(&local(&[("A", "x")]), &reporter)
        .await
        .unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(
        store.ops(),
        vec![
            Op::List("/app/production".to_string()),
            Op::Delete(vec!["/app/production/B".to_string()]),
            Op::Put("/app/production/A".to_string()),
        ]
    );
    assert_eq!(
        store.params(),
        BTreeMap::from([("/app/production/A".to_string(), "x".to_string())])
    );
    assert_eq!(reporter.prompts(), 0);
    assert!(reporter.events().contains(&SyncEvent::StaleFound { count: 1 }));
}

#[tokio::test]
async fn scenario_d_empty_local_declined_aborts_without_changes() {
    let store = ScriptedStore::with(&[("/app/production/A", "x")]);
    let reporter = RecordingReporter::new(false);

    let err = engine(&store)
        .push(&local(&[]), &reporter)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Aborted));
    assert_eq!(reporter.prompts(), 1);
    assert!(reporter.events().contains(&SyncEvent::EmptyLocal));
    assert_eq!(store.ops(), vec![Op::List("/app/production".to_string())]);
    assert_eq!(store.params().len(), 1);
}

#[tokio::test]
async fn scenario_d_empty_local_confirmed_wipes_stage() {
    let store = ScriptedStore::with(&[
        ("/app/production/A", "x"),
        ("/app/staging/A", "keep"),
    ]);
    let reporter = RecordingReporter::new(true);

    let report = engine(&store).push(&local(&[]), &reporter).await.unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(report.written, 0);
    assert_eq!(
        store.params(),
        BTreeMap::from([("/app/staging/A".to_string(), "keep".to_string())])
    );
}

#[tokio::test]
async fn empty_local_and_empty_remote_needs_no_confirmation() {
    let store = ScriptedStore::default();
    let reporter = RecordingReporter::new(false);

    let report = engine(&store).push(&local(&[]), &reporter).await.unwrap();
    assert_eq!(report, SyncReport::default());
    assert_eq!(reporter.prompts(), 0);
}

// ── Properties ─────────────────────────────────────────────

#[tokio::test]
async fn second_run_is_idempotent() {
    let store = ScriptedStore::with(&[("/app/production/OLD", "gone")]);
    let local = local(&[("A", "x"), ("B", "y")]);

    engine(&store).push(&local, &SilentReporter).await.unwrap();
    let after_first = store.params();

    let report = engine(&store).push(&local, &SilentReporter).await.unwrap();
    assert_eq!(report.deleted, 0);
    assert_eq!(report.written, 2);
    assert_eq!(store.params(), after_first);
}

#[tokio::test(start_paused = true)]
async fn write_recovering_on_fourth_attempt_succeeds() {
    let store = ScriptedStore::default();
    store.fail_puts("/app/production/A", 3);
    let reporter = RecordingReporter::new(false);
    let start = tokio::time::Instant::now();

    let report = engine(&store)
        .push(&local(&[("A", "x"), ("B", "y")]), &reporter)
        .await
        .unwrap();

    assert_eq!(report.written, 2);
    assert_eq!(report.retried, 1);
    assert_eq!(store.attempts("/app/production/A"), 4);
    assert_eq!(store.attempts("/app/production/B"), 1);
    assert!(start.elapsed() >= Duration::from_secs(18));

    let delays: Vec<Duration> = reporter
        .events()
        .into_iter()
        .filter_map(|e| match e {
            SyncEvent::Retrying { delay, .. } => Some(delay),
            _ => None,
        })
        .collect();
    assert_eq!(
        delays,
        vec![
            Duration::from_secs(3),
            Duration::from_secs(6),
            Duration::from_secs(9)
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn write_failing_every_attempt_halts_run() {
    let store = ScriptedStore::default();
    store.fail_puts("/app/production/A", 4);

    let err = engine(&store)
        .push(&local(&[("A", "x"), ("B", "y")]), &SilentReporter)
        .await
        .unwrap_err();

    match err {
        SyncError::Write {
            key,
            attempts,
            source,
        } => {
            assert_eq!(key, "A");
            assert_eq!(attempts, 4);
            assert_eq!(source.to_string(), "throttled /app/production/A attempt 4");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.attempts("/app/production/B"), 0);
    assert!(store.params().is_empty());
}

#[tokio::test]
async fn delete_failure_is_not_retried_and_stops_writes() {
    let store = ScriptedStore {
        fail_delete: true,
        ..ScriptedStore::with(&[("/app/production/B", "y")])
    };

    let err = engine(&store)
        .push(&local(&[("A", "x")]), &SilentReporter)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Delete { count: 1, .. }));
    assert_eq!(
        store.ops(),
        vec![
            Op::List("/app/production".to_string()),
            Op::Delete(vec!["/app/production/B".to_string()]),
        ]
    );
}

#[tokio::test]
async fn custom_retry_policy_is_honoured() {
    let store = ScriptedStore::default();
    store.fail_puts("/app/production/A", 1);
    let options = SyncOptions {
        kind: ParameterKind::String,
        retry: RetryPolicy::none(),
    };

    let err = SyncEngine::new(&store, path(), options)
        .push(&local(&[("A", "x")]), &SilentReporter)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Write { attempts: 1, .. }));
}

// ── Plan / pull ────────────────────────────────────────────

#[tokio::test]
async fn plan_reports_changes_without_writing() {
    let store = ScriptedStore::with(&[
        ("/app/production/SAME", "1"),
        ("/app/production/CHANGED", "old"),
        ("/app/production/STALE", "z"),
    ]);
    let local = local(&[("SAME", "1"), ("CHANGED", "new"), ("NEW", "n")]);

    let plan = engine(&store).plan(&local).await.unwrap();

    assert_eq!(
        plan,
        SyncPlan {
            stale: ["STALE".to_string()].into(),
            created: vec!["NEW".to_string()],
            updated: vec!["CHANGED".to_string()],
            unchanged: vec!["SAME".to_string()],
        }
    );
    assert_eq!(plan.writes(), 3);
    assert_eq!(store.ops().len(), 1);
}

#[tokio::test]
async fn pull_reassembles_pushed_parts() {
    let store = ScriptedStore::default();
    let cert = "c".repeat(9000);
    let local = LocalSnapshot::from_entries(
        [EnvEntry::new("CERT", cert.clone()), EnvEntry::new("A", "x")],
        4096,
        &SilentReporter,
    )
    .unwrap();

    let engine = engine(&store);
    engine.push(&local, &SilentReporter).await.unwrap();
    assert_eq!(store.params().len(), 4);

    let pulled = engine.pull().await.unwrap();
    assert_eq!(
        pulled,
        BTreeMap::from([("A".to_string(), "x".to_string()), ("CERT".to_string(), cert)])
    );
}
