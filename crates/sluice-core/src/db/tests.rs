use super::*;
use crate::{
    driver::{
        DriverErrorKind,
        mock::{MockConnection, MockDriver, MockLog},
    },
    error::{ErrorClass, ErrorOrigin},
    model::{ColumnModel, IndexColumn, IndexModel, Order, PrimaryKeyModel, SqlType},
};

static USER_COLUMNS: [ColumnModel; 3] = [
    ColumnModel::new("id", "id", SqlType::BigInt).auto_generate(true),
    ColumnModel::new("name", "name", SqlType::Text),
    ColumnModel::new("email", "email", SqlType::Text).nullable(true),
];
static USER_NAME_INDEX: [IndexColumn; 1] = [IndexColumn::new("name", Order::Asc)];
static USER_INDICES: [IndexModel; 1] = [IndexModel::new("index_user_name", true, &USER_NAME_INDEX)];
static USER: TableModel = TableModel::new(
    "user",
    &USER_COLUMNS,
    PrimaryKeyModel::new(&["id"], true),
    &USER_INDICES,
);

static AUDIT_COLUMNS: [ColumnModel; 1] =
    [ColumnModel::new("entry", "entry", SqlType::Text).default_value("''")];
static AUDIT: TableModel = TableModel::new("audit", &AUDIT_COLUMNS, PrimaryKeyModel::NONE, &[]);

fn database() -> (Database<MockDriver>, Arc<MockLog>) {
    let (driver, log) = MockDriver::new();
    let db = Database::builder("app", driver)
        .table(&USER)
        .table(&AUDIT)
        .version(3)
        .migration(1, 2, Script::sql("ALTER TABLE user ADD email"))
        .migration(2, 3, Script::sql("CREATE TABLE audit (entry TEXT)"))
        .build()
        .unwrap();

    (db, log)
}

fn executed(log: &MockLog) -> Vec<String> {
    log.executions().into_iter().map(|e| e.sql).collect()
}

#[test]
fn duplicate_table_names_are_rejected() {
    let (driver, _) = MockDriver::new();
    let err = Database::builder("app", driver)
        .table(&USER)
        .table(&USER)
        .build()
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::Conflict);
    assert_eq!(err.origin, ErrorOrigin::Schema);
}

#[test]
fn init_creates_tables_before_indices() {
    let (db, log) = database();
    db.init().unwrap();

    assert_eq!(
        executed(&log),
        vec![
            "CREATE TABLE IF NOT EXISTS \"user\" (\"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \"name\" TEXT NOT NULL, \"email\" TEXT)",
            "CREATE TABLE IF NOT EXISTS \"audit\" (\"entry\" TEXT NOT NULL DEFAULT '')",
            "CREATE UNIQUE INDEX \"index_user_name\" ON \"user\" (\"name\" ASC)",
        ]
    );
}

#[test]
fn init_ignores_existing_indices() {
    let (db, log) = database();
    log.fail_on("CREATE UNIQUE INDEX", DriverErrorKind::AlreadyExists);

    db.init().unwrap();
}

#[test]
fn init_fails_on_other_schema_errors() {
    let (db, log) = database();
    log.fail_on("CREATE TABLE IF NOT EXISTS \"audit\"", DriverErrorKind::Other);

    let err = db.init().unwrap_err();
    assert_eq!(err.origin, ErrorOrigin::Schema);
}

#[test]
fn migrate_runs_resolved_steps_in_one_transaction() {
    let (db, log) = database();

    assert_eq!(db.upgrade(1).unwrap(), 2);
    assert_eq!(
        executed(&log),
        vec![
            "ALTER TABLE user ADD email",
            "CREATE TABLE audit (entry TEXT)"
        ]
    );
    assert_eq!(log.connects(), 1);
    assert_eq!(log.commits(), 1);
}

#[test]
fn unresolvable_migration_touches_nothing() {
    let (db, log) = database();

    let err = db.migrate(3, 1).unwrap_err();

    assert_eq!(err.origin, ErrorOrigin::Migration);
    assert_eq!(log.connects(), 0);
    assert!(executed(&log).is_empty());
}

#[test]
fn failing_migration_step_rolls_back() {
    let (db, log) = database();
    log.fail_on("CREATE TABLE audit", DriverErrorKind::Other);

    let err = db.migrate(1, 3).unwrap_err();

    assert_eq!(err.origin, ErrorOrigin::Migration);
    assert_eq!(log.rollbacks(), 1);
    assert_eq!(log.commits(), 0);
}

#[test]
fn custom_migration_scripts_receive_the_connection() {
    let (driver, log) = MockDriver::new();
    let db = Database::builder("app", driver)
        .migration(
            1,
            2,
            Script::custom(|conn: &MockConnection| conn.execute_batch("UPDATE user SET name = lower(name)")),
        )
        .build()
        .unwrap();

    db.migrate(1, 2).unwrap();

    assert_eq!(executed(&log), vec!["UPDATE user SET name = lower(name)"]);
}

#[test]
fn drop_and_clear_use_registered_tables() {
    let (db, log) = database();

    db.drop_table("audit").unwrap();
    db.clear_all_tables().unwrap();
    assert!(db.drop_table("missing").unwrap_err().is_not_found());

    assert_eq!(
        executed(&log),
        vec![
            "DROP TABLE IF EXISTS \"audit\"",
            "DELETE FROM \"user\"",
            "DELETE FROM \"audit\"",
        ]
    );
}

#[test]
fn find_table_looks_up_by_name() {
    let (db, _) = database();

    assert_eq!(db.find_table("user").map(|t| t.columns.len()), Some(3));
    assert!(db.find_table("nope").is_none());
    assert_eq!(db.tables().len(), 2);
    assert_eq!(db.version(), 3);
}
