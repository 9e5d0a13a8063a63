use super::*;
use crate::{
    db::Database,
    dialect::GenericDialect,
    driver::{
        DriverErrorKind, Statement,
        mock::{MockDriver, MockLog},
    },
    error::DataAccessError,
    obs::{CacheOutcome, MetricsEvent, MetricsSink, with_metrics_sink},
    value::SqlValue,
};
use std::{
    cell::RefCell,
    rc::Rc,
    sync::{
        Arc, Barrier, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

fn database() -> (Arc<Database<MockDriver>>, Arc<MockLog>) {
    let (driver, log) = MockDriver::new();
    let db = Database::builder("test", driver).build_shared().unwrap();

    (db, log)
}

///
/// RecordingSink
///

#[derive(Default)]
struct RecordingSink {
    events: RefCell<Vec<MetricsEvent>>,
}

impl MetricsSink for RecordingSink {
    fn record(&self, event: MetricsEvent) {
        self.events.borrow_mut().push(event);
    }
}

//
// SharedSlot
//

#[test]
fn first_acquire_initializes_then_reuses() {
    let slot = SharedSlot::new();
    let created = AtomicUsize::new(0);
    let create = || -> Result<usize, ()> { Ok(created.fetch_add(1, Ordering::SeqCst)) };

    {
        let lease = slot.acquire(create).unwrap();
        assert!(lease.is_cached());
        assert!(slot.is_in_use());
    }
    assert!(!slot.is_in_use());

    let lease = slot.acquire(create).unwrap();
    assert!(lease.is_cached());
    assert_eq!(*lease, 0);
    assert_eq!(created.load(Ordering::SeqCst), 1);
}

#[test]
fn contended_acquire_falls_back_to_ephemeral() {
    let slot = SharedSlot::new();
    let created = AtomicUsize::new(0);
    let create = || -> Result<usize, ()> { Ok(created.fetch_add(1, Ordering::SeqCst)) };

    let held = slot.acquire(create).unwrap();
    let other = slot.acquire(create).unwrap();

    assert!(held.is_cached());
    assert!(!other.is_cached());
    assert_eq!(*other, 1);

    slot.release(other);
    assert!(slot.is_in_use(), "ephemeral release must not clear the flag");

    slot.release(held);
    assert!(!slot.is_in_use());
}

#[test]
fn failed_creation_leaves_slot_idle() {
    let slot: SharedSlot<u8> = SharedSlot::new();

    assert!(slot.acquire(|| Err::<u8, _>("boom")).is_err());
    assert!(!slot.is_in_use());
    assert!(!slot.is_initialized());

    assert!(slot.acquire(|| Ok::<_, ()>(7)).unwrap().is_cached());
}

#[test]
fn concurrent_acquire_initializes_cached_resource_once() {
    const THREADS: usize = 8;

    let slot = SharedSlot::new();
    let created = AtomicUsize::new(0);
    let cached_ids = Mutex::new(Vec::new());
    let barrier = Barrier::new(THREADS);

    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                barrier.wait();
                let lease = slot
                    .acquire(|| Ok::<_, ()>(created.fetch_add(1, Ordering::SeqCst)))
                    .unwrap();
                if lease.is_cached() {
                    cached_ids.lock().unwrap().push(*lease);
                }
                thread::sleep(Duration::from_millis(5));
            });
        }
    });

    let total = created.load(Ordering::SeqCst);
    assert!((1..=THREADS).contains(&total), "created {total}");

    let cached_ids = cached_ids.into_inner().unwrap();
    assert!(!cached_ids.is_empty());
    assert!(cached_ids.iter().all(|id| *id == cached_ids[0]));
    assert!(!slot.is_in_use());
}

#[test]
fn acquire_outcomes_are_reported_to_the_sink() {
    let sink = Rc::new(RecordingSink::default());
    let slot = SharedSlot::new();

    with_metrics_sink(sink.clone(), || {
        let first = slot.acquire(|| Ok::<_, ()>(1)).unwrap();
        let second = slot.acquire(|| Ok::<_, ()>(2)).unwrap();
        drop(second);
        drop(first);
        drop(slot.acquire(|| Ok::<_, ()>(3)).unwrap());
    });

    let outcomes: Vec<_> = sink
        .events
        .borrow()
        .iter()
        .filter_map(|e| match e {
            MetricsEvent::Acquire { outcome } => Some(*outcome),
            _ => None,
        })
        .collect();
    assert_eq!(
        outcomes,
        vec![CacheOutcome::Init, CacheOutcome::Ephemeral, CacheOutcome::Hit]
    );
}

//
// SharedStatement
//

#[test]
fn statement_is_prepared_once_and_connection_kept() {
    let (db, log) = database();
    let handler = SharedStatement::new(Arc::clone(&db), "INSERT INTO t VALUES (?)");

    for i in 0..3 {
        handler
            .run(false, |stmt| {
                stmt.bind(1, SqlValue::Integer(i))?;
                stmt.execute_update()?;
                Ok(())
            })
            .unwrap();
    }

    assert_eq!(log.connects(), 1);
    assert_eq!(log.prepared().len(), 1);
    assert_eq!(log.closes(), 0);
    assert_eq!(log.executions().len(), 3);
}

#[test]
fn stale_bindings_are_cleared_between_runs() {
    let (db, log) = database();
    let handler = SharedStatement::new(Arc::clone(&db), "UPDATE t SET a = ?, b = ?");

    handler
        .run(false, |stmt| {
            stmt.bind(1, SqlValue::Integer(1))?;
            stmt.bind(2, SqlValue::Integer(2))?;
            stmt.execute_update()?;
            Ok(())
        })
        .unwrap();
    handler
        .run(false, |stmt| {
            stmt.bind(1, SqlValue::Integer(3))?;
            stmt.execute_update()?;
            Ok(())
        })
        .unwrap();

    assert_eq!(log.executions()[1].binds, vec![SqlValue::Integer(3)]);
}

#[test]
fn transactional_run_commits_and_restores_auto_commit() {
    let (db, log) = database();
    let handler = SharedStatement::new(Arc::clone(&db), "DELETE FROM t");

    handler
        .run(true, |stmt| Ok(stmt.execute_update()?))
        .unwrap();

    assert_eq!(log.commits(), 1);
    assert_eq!(log.rollbacks(), 0);
    assert_eq!(log.auto_commit_changes(), vec![false, true]);
}

#[test]
fn failing_body_rolls_back_and_still_releases() {
    let (db, log) = database();
    log.fail_on("DELETE", DriverErrorKind::Constraint);
    let handler = SharedStatement::new(Arc::clone(&db), "DELETE FROM t");

    let err = handler
        .run(true, |stmt| Ok(stmt.execute_update()?))
        .unwrap_err();

    assert_eq!(err.class, crate::error::ErrorClass::Conflict);
    assert_eq!(log.commits(), 0);
    assert_eq!(log.rollbacks(), 1);
    assert_eq!(log.auto_commit_changes(), vec![false, true]);

    // slot released: the next run reuses the cached statement
    log.fail_on("nothing-matches", DriverErrorKind::Other);
    handler.run(false, |stmt| Ok(stmt.execute_update()?)).unwrap();
    assert_eq!(log.prepared().len(), 1);
}

#[test]
fn unsupported_transactions_only_restore_auto_commit() {
    let (db, log) = database();
    log.no_transactions.store(true, Ordering::SeqCst);
    let handler = SharedStatement::new(Arc::clone(&db), "DELETE FROM t");

    handler.run(true, |stmt| Ok(stmt.execute_update()?)).unwrap();
    handler.run(true, |stmt| Ok(stmt.execute_update()?)).unwrap();

    assert_eq!(log.commits(), 0);
    assert_eq!(log.auto_commit_changes(), vec![true, true]);
    assert_eq!(MockLog::count(&log.metadata_probes), 1);
}

#[test]
fn nested_run_on_same_handler_uses_an_ephemeral_statement() {
    let (db, log) = database();
    let handler = SharedStatement::new(Arc::clone(&db), "INSERT INTO t VALUES (1)");

    handler
        .run(true, |outer| {
            handler.run(true, |inner| Ok(inner.execute_update()?))?;
            Ok(outer.execute_update()?)
        })
        .unwrap();

    assert_eq!(log.connects(), 2);
    assert_eq!(log.closes(), 1, "ephemeral connection closes on release");
    assert_eq!(log.commits(), 1, "only the cached connection runs a transaction");
}

//
// SharedConnection
//

#[test]
fn connection_run_pairs_acquire_and_release_on_error() {
    let (db, _log) = database();
    let shared = SharedConnection::new(Arc::clone(&db));

    let err = shared
        .run(true, |_| Err::<(), _>(DataAccessError::conversion("bad")))
        .unwrap_err();
    assert_eq!(err.message, "bad");

    let lease = shared.acquire().unwrap();
    assert!(lease.is_cached(), "flag must be clear after a failed run");
}

#[test]
fn transactions_on_ephemeral_leases_are_no_ops() {
    let (db, log) = database();
    let shared = SharedConnection::new(Arc::clone(&db));

    let held = shared.acquire().unwrap();
    let ephemeral = shared.acquire().unwrap();

    shared.begin_transaction(&ephemeral).unwrap();
    shared.commit(&ephemeral).unwrap();
    assert!(log.auto_commit_changes().is_empty());

    shared.begin_transaction(&held).unwrap();
    shared.rollback(&held).unwrap();
    assert_eq!(log.auto_commit_changes(), vec![false, true]);
    assert_eq!(log.rollbacks(), 1);
}

//
// SqlTemplate / QueryHandler
//

#[test]
fn template_splits_around_named_placeholders() {
    let template = SqlTemplate::parse("SELECT * FROM t WHERE a = {a} AND b IN ({ids})", &["ids", "a"]).unwrap();

    assert_eq!(template.placeholder_order().collect::<Vec<_>>(), vec![1, 0]);
    assert_eq!(
        template.render(&[3, 1], &GenericDialect).unwrap(),
        "SELECT * FROM t WHERE a = ? AND b IN (?, ?, ?)"
    );
}

#[test]
fn template_keeps_non_identifier_braces() {
    let template = SqlTemplate::parse("SELECT '{1}', '{ x }' FROM t WHERE a = {a}", &["a"]).unwrap();

    assert_eq!(
        template.render(&[1], &GenericDialect).unwrap(),
        "SELECT '{1}', '{ x }' FROM t WHERE a = ?"
    );
}

#[test]
fn template_rejects_unknown_placeholder() {
    let err = SqlTemplate::parse("SELECT * FROM t WHERE a = {missing}", &["a"]).unwrap_err();

    assert_eq!(
        err,
        TemplateError::UnresolvedPlaceholder {
            name: "missing".into()
        }
    );
}

#[test]
fn template_render_checks_argument_counts() {
    let template = SqlTemplate::parse("SELECT {a}", &["a"]).unwrap();

    assert!(template.render(&[], &GenericDialect).is_err());
}

#[test]
fn sequence_placeholder_expands_and_binds_each_element() {
    let (db, log) = database();
    let template = SqlTemplate::parse("SELECT * FROM t WHERE id IN ({ids})", &["ids"]).unwrap();
    let handler = QueryHandler::new(Arc::clone(&db), template);
    let ids = [10_i64, 20, 30];

    handler
        .run(&[ids.len()], false, |stmt| {
            let mut args = crate::column::ArgCursor::new();
            for id in &ids {
                crate::column::write(&mut *stmt, args.advance(), id)?;
            }
            stmt.execute_query()?;
            Ok(())
        })
        .unwrap();

    assert_eq!(log.prepared(), vec!["SELECT * FROM t WHERE id IN (?, ?, ?)"]);
    assert_eq!(
        log.executions()[0].binds,
        vec![
            SqlValue::Integer(10),
            SqlValue::Integer(20),
            SqlValue::Integer(30)
        ]
    );
}

#[test]
fn query_handler_reuses_its_connection() {
    let (db, log) = database();
    let template = SqlTemplate::parse("SELECT {a}", &["a"]).unwrap();
    let handler = QueryHandler::new(Arc::clone(&db), template);

    for _ in 0..3 {
        handler
            .run(&[1], false, |stmt| {
                stmt.execute_query()?;
                Ok(())
            })
            .unwrap();
    }

    assert_eq!(log.connects(), 1);
    assert_eq!(log.prepared().len(), 3);
}

mod expansion {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn each_placeholder_expands_to_its_count(counts in proptest::collection::vec(0_usize..6, 1..5)) {
            let names: Vec<String> = (0..counts.len()).map(|i| format!("p{i}")).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let sql = names.iter().map(|n| format!("[{{{n}}}]")).collect::<Vec<_>>().join(" | ");

            let rendered = SqlTemplate::parse(&sql, &refs)
                .unwrap()
                .render(&counts, &GenericDialect)
                .unwrap();

            prop_assert_eq!(rendered.matches('?').count(), counts.iter().sum::<usize>());
            for (group, count) in rendered.split(" | ").zip(&counts) {
                prop_assert_eq!(group.matches('?').count(), *count);
            }
        }
    }
}
