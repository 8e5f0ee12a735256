//! End-to-end reconciliation tests against the in-memory service.

mod common;

use common::{remote_detector, write_file, yaml_detector, Call, FakeService};
use detsync_core::constants::OWNERSHIP_MARKER_TAG;
use detsync_core::errors::{ErrorCode, SyncError};
use detsync_engine::{SyncOptions, SyncReport, Syncer};

fn tempdir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

fn options(scope: Option<&str>, dry_run: bool) -> SyncOptions {
    SyncOptions {
        scope: scope.map(str::to_string),
        dry_run,
        ..Default::default()
    }
}

#[test]
fn single_file_against_empty_service_creates_one_detector() {
    let dir = tempdir();
    write_file(
        dir.path(),
        "svc/a.yaml",
        "---\nname: \"A\"\ndescription: \"d\"\n---\ndata('x').publish()\n",
    );
    let service = FakeService::new();

    let report = Syncer::new(&service, options(None, false))
        .sync(dir.path())
        .unwrap();

    let creates: Vec<_> = service
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Create(d) => Some(d),
            _ => None,
        })
        .collect();
    assert_eq!(creates.len(), 1);
    let created = &creates[0];
    assert_eq!(created.identity, "svc/a.yaml");
    assert_eq!(created.name, "A");
    assert_eq!(created.program_text, "data('x').publish()");
    assert!(created.rules.is_empty());
    assert!(created.has_tag(OWNERSHIP_MARKER_TAG));
    assert!(created.has_tag("from:svc/a.yaml"));
    assert_eq!(created.scopes(), Vec::<&str>::new());

    assert_eq!(
        report,
        SyncReport {
            dry_run: false,
            new: 1,
            mutations: 1,
            ..Default::default()
        }
    );
}

#[test]
fn new_updated_and_removed_are_applied_in_order() {
    let dir = tempdir();
    write_file(dir.path(), "a.yaml", &yaml_detector("A"));
    write_file(dir.path(), "b.yaml", &yaml_detector("B"));

    let service = FakeService::new();
    // B was synced long ago, C's file is gone.
    service.seed(remote_detector(
        "id-b",
        "old B",
        &[OWNERSHIP_MARKER_TAG, "from:b.yaml"],
        0,
    ));
    service.seed(remote_detector(
        "id-c",
        "C",
        &[OWNERSHIP_MARKER_TAG, "from:c.yaml"],
        0,
    ));

    let report = Syncer::new(&service, options(None, false))
        .sync(dir.path())
        .unwrap();
    assert_eq!((report.new, report.common, report.updated, report.removed), (1, 1, 1, 1));
    assert_eq!(report.mutations, 3);

    let mutations = service.mutations();
    assert_eq!(mutations.len(), 4);
    assert!(matches!(&mutations[0], Call::Create(d) if d.identity == "a.yaml"));
    assert!(matches!(&mutations[1], Call::Update(id, d) if id == "id-b" && d.name == "B"));
    assert_eq!(mutations[2], Call::Delete("id-c".to_string(), true));
    assert_eq!(mutations[3], Call::DeleteTag("from:c.yaml".to_string(), true));

    let names: Vec<_> = service.stored().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["B", "A"]);
}

#[test]
fn remote_newer_than_file_is_left_alone() {
    let dir = tempdir();
    write_file(dir.path(), "b.yaml", &yaml_detector("B"));

    let service = FakeService::new();
    service.seed(remote_detector(
        "id-b",
        "B",
        &[OWNERSHIP_MARKER_TAG, "from:b.yaml"],
        i64::MAX,
    ));

    let report = Syncer::new(&service, options(None, false))
        .sync(dir.path())
        .unwrap();
    assert_eq!(report.common, 1);
    assert_eq!(report.updated, 0);
    assert!(service.mutations().is_empty());
}

#[test]
fn second_run_without_changes_does_nothing() {
    let dir = tempdir();
    write_file(dir.path(), "a.yaml", &yaml_detector("A"));
    write_file(dir.path(), "team/b.json", r#"{"name": "B", "description": "d", "programText": "p"}"#);

    let service = FakeService::new();
    service.seed(remote_detector(
        "id-c",
        "C",
        &[OWNERSHIP_MARKER_TAG, "from:c.yaml"],
        0,
    ));
    let syncer = Syncer::new(&service, options(None, false));

    let first = syncer.sync(dir.path()).unwrap();
    assert_eq!(first.mutations, 3);

    service.clear_calls();
    let second = syncer.sync(dir.path()).unwrap();
    assert_eq!(second.new + second.updated + second.removed, 0);
    assert_eq!(second.common, 2);
    assert_eq!(second.mutations, 0);
    assert!(service.mutations().is_empty());
}

#[test]
fn dry_run_validates_the_same_payloads_and_never_mutates() {
    let dir = tempdir();
    write_file(dir.path(), "a.yaml", &yaml_detector("A"));
    write_file(dir.path(), "b.yaml", &yaml_detector("B"));

    let seed = |service: &FakeService| {
        service.seed(remote_detector(
            "id-b",
            "old B",
            &[OWNERSHIP_MARKER_TAG, "from:b.yaml"],
            0,
        ));
        service.seed(remote_detector(
            "id-c",
            "C",
            &[OWNERSHIP_MARKER_TAG, "from:c.yaml"],
            0,
        ));
    };

    let dry = FakeService::new();
    seed(&dry);
    let report = Syncer::new(&dry, options(None, true))
        .sync(dir.path())
        .unwrap();
    assert!(report.dry_run);
    assert_eq!(report.mutations, 0);
    assert_eq!(report.validations, 2);
    assert!(dry.mutations().is_empty());
    assert_eq!(dry.stored().len(), 2);

    let wet = FakeService::new();
    seed(&wet);
    Syncer::new(&wet, options(None, false))
        .sync(dir.path())
        .unwrap();

    let validated: Vec<_> = dry
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Validate(d) => Some(d),
            _ => None,
        })
        .collect();
    let sent: Vec<_> = wet
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Create(d) | Call::Update(_, d) => Some(d),
            _ => None,
        })
        .collect();
    assert_eq!(validated, sent);

    // Removal in dry-run mode makes no call at all: only the list and the
    // two validations went out.
    assert_eq!(dry.calls().len(), 3);
}

#[test]
fn unscoped_run_ignores_scoped_detectors() {
    let dir = tempdir();
    let service = FakeService::new();
    service.seed(remote_detector(
        "id-scoped",
        "S",
        &[OWNERSHIP_MARKER_TAG, "scope:teamA", "from:s.yaml"],
        0,
    ));

    let report = Syncer::new(&service, options(None, false))
        .sync(dir.path())
        .unwrap();
    assert_eq!(report.removed, 0);
    assert!(service.mutations().is_empty());
}

#[test]
fn scoped_run_ignores_unscoped_and_other_scopes() {
    let dir = tempdir();
    write_file(dir.path(), "mine.yaml", &yaml_detector("Mine"));

    let service = FakeService::new();
    service.seed(remote_detector(
        "id-unscoped",
        "U",
        &[OWNERSHIP_MARKER_TAG, "from:u.yaml"],
        0,
    ));
    service.seed(remote_detector(
        "id-other",
        "O",
        &[OWNERSHIP_MARKER_TAG, "scope:teamB", "from:o.yaml"],
        0,
    ));
    service.seed(remote_detector(
        "id-stale",
        "Stale",
        &[OWNERSHIP_MARKER_TAG, "scope:teamA", "from:stale.yaml"],
        0,
    ));

    let report = Syncer::new(&service, options(Some("teamA"), false))
        .sync(dir.path())
        .unwrap();
    assert_eq!((report.new, report.removed), (1, 1));

    let mutations = service.mutations();
    assert!(matches!(
        &mutations[0],
        Call::Create(d) if d.has_tag("scope:teamA") && d.has_tag("from:mine.yaml")
    ));
    assert_eq!(mutations[1], Call::Delete("id-stale".to_string(), true));
    assert_eq!(mutations[2], Call::DeleteTag("from:stale.yaml".to_string(), true));
    assert_eq!(mutations.len(), 3);

    assert_eq!(
        service.calls()[0],
        Call::List(vec![OWNERSHIP_MARKER_TAG.to_string(), "scope:teamA".to_string()])
    );
}

#[test]
fn remote_failure_aborts_and_rerun_converges() {
    let dir = tempdir();
    write_file(dir.path(), "a.yaml", &yaml_detector("A"));
    write_file(dir.path(), "b.yaml", &yaml_detector("B"));

    let service = FakeService::new();
    service.seed(remote_detector(
        "id-c",
        "C",
        &[OWNERSHIP_MARKER_TAG, "from:c.yaml"],
        0,
    ));
    *service.fail_create_named.borrow_mut() = Some("B".to_string());
    let syncer = Syncer::new(&service, options(None, false));

    let err = syncer.sync(dir.path()).unwrap_err();
    assert!(matches!(err, SyncError::Remote(_)));
    assert_eq!(err.error_code(), "REMOTE_ERROR");
    // A was created before the failure and stays; C was never removed.
    let names: Vec<_> = service.stored().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["C", "A"]);

    *service.fail_create_named.borrow_mut() = None;
    service.clear_calls();
    let report = syncer.sync(dir.path()).unwrap();
    assert_eq!((report.new, report.removed), (1, 1));
    let names: Vec<_> = service.stored().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn invalid_file_aborts_before_any_remote_call() {
    let dir = tempdir();
    write_file(dir.path(), "a.yaml", &yaml_detector("A"));
    write_file(dir.path(), "broken.yaml", "---\nname: \"\"\ndescription: d\n---\np\n");

    let service = FakeService::new();
    let err = Syncer::new(&service, options(None, false))
        .sync(dir.path())
        .unwrap_err();

    assert_eq!(err.error_code(), "VALIDATION_ERROR");
    assert!(err.to_string().contains("broken.yaml"));
    assert!(service.calls().is_empty());
}

#[test]
fn custom_predicate_limits_the_scan() {
    let dir = tempdir();
    write_file(dir.path(), "a.yaml", &yaml_detector("A"));
    write_file(dir.path(), "skip.yaml", "not a detector");

    let service = FakeService::new();
    let report = Syncer::new(&service, options(None, false))
        .sync_with(dir.path(), |name| name == "a.yaml")
        .unwrap();
    assert_eq!(report.new, 1);
}

/// `Write` handle over a shared buffer, for capturing log output.
#[derive(Clone, Default)]
struct SharedBuf(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for SharedBuf {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn dry_run_logs_skipped_removals_with_scope() {
    let dir = tempdir();
    let service = FakeService::new();
    service.seed(remote_detector(
        "id-stale",
        "Stale",
        &[OWNERSHIP_MARKER_TAG, "scope:teamA", "from:stale.yaml"],
        0,
    ));

    let buf = SharedBuf::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .finish();

    let report = tracing::subscriber::with_default(subscriber, || {
        Syncer::new(&service, options(Some("teamA"), true))
            .sync(dir.path())
            .unwrap()
    });
    assert_eq!(report.removed, 1);
    assert!(service.mutations().is_empty());

    let logs = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
    assert!(
        logs.contains("skipped removal of detector stale.yaml (in scope teamA)"),
        "{logs}"
    );
}

#[test]
fn ownership_tags_declared_in_files_do_not_cause_duplicates() {
    let dir = tempdir();
    write_file(
        dir.path(),
        "a.yaml",
        "---\nname: A\ndescription: d\ntags: [\"scope:teamB\", \"from:other.yaml\"]\n---\np\n",
    );

    for scope in [None, Some("teamA")] {
        let service = FakeService::new();
        let syncer = Syncer::new(&service, options(scope, false));

        let first = syncer.sync(dir.path()).unwrap();
        assert_eq!(first.new, 1);

        service.clear_calls();
        let second = syncer.sync(dir.path()).unwrap();
        assert_eq!((second.new, second.common), (0, 1), "scope {scope:?}");
        assert!(service.mutations().is_empty(), "scope {scope:?}");
        assert_eq!(service.stored().len(), 1);
    }
}

#[test]
fn run_without_changes_reports_up_to_date() {
    let dir = tempdir();
    write_file(dir.path(), "a.yaml", &yaml_detector("A"));
    let service = FakeService::new();
    let syncer = Syncer::new(&service, options(None, false));
    syncer.sync(dir.path()).unwrap();

    let buf = SharedBuf::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .finish();
    let report = tracing::subscriber::with_default(subscriber, || syncer.sync(dir.path()).unwrap());
    assert_eq!(report.mutations, 0);

    let logs = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("changes=0"), "{logs}");
    assert!(logs.contains("everything is up to date"), "{logs}");
}
