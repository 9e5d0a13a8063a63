use super::*;
use crate::method::compile_unit;
use proc_macro2::Span;
use serde_json::json;
use sluice_core::model::ConflictStrategy;
use sluice_schema::{build::SchemaBuilder, source::SourceDocument};

fn document(methods: serde_json::Value) -> SourceDocument {
    serde_json::from_value(json!({
        "database": { "name": "app", "version": 3 },
        "tables": [{
            "name": "user",
            "path": "crate::model::User",
            "fields": [
                { "name": "id", "type": "i64" },
                { "name": "name", "type": "String" },
                { "name": "email", "type": "Option<String>" },
            ],
            "primary_key": { "fields": ["id"], "auto_generate": true },
            "indices": [{ "fields": ["email"], "unique": true }],
        }],
        "daos": [{ "name": "UserDao", "path": "crate::dao::UserDao", "methods": methods }],
    }))
    .unwrap()
}

fn unit(methods: serde_json::Value) -> CompiledUnit {
    let source = document(methods);
    let schema = SchemaBuilder::build(&source).unwrap();

    compile_unit(&source, &schema).unwrap()
}

/// Generated source with all whitespace removed.
fn render(unit: &CompiledUnit) -> String {
    let tokens = generate(unit);
    syn::parse2::<syn::File>(tokens.clone()).expect("generated code parses");

    tokens.to_string().chars().filter(|c| !c.is_whitespace()).collect()
}

fn compact(methods: serde_json::Value) -> String {
    render(&unit(methods))
}

/// Render a whole descriptor document.
fn compact_document(value: serde_json::Value) -> String {
    let source: SourceDocument = serde_json::from_value(value).unwrap();
    let schema = SchemaBuilder::build(&source).unwrap();

    render(&compile_unit(&source, &schema).unwrap())
}

fn keyed_table(name: &str, path: &str) -> serde_json::Value {
    json!({
        "name": name,
        "path": path,
        "fields": [
            { "name": "id", "type": "i64" },
            { "name": "label", "type": "String" },
        ],
        "primary_key": { "fields": ["id"], "auto_generate": true },
    })
}

fn statement_decl(field: &str) -> String {
    format!("{field}:::sluice::__internal::SharedStatement<D>")
}

fn insert(name: &str, on_conflict: &str) -> serde_json::Value {
    json!({
        "name": name,
        "annotations": [{ "kind": "insert", "on_conflict": on_conflict }],
        "params": [{ "name": "user", "type": "&User" }],
        "returns": "i64",
    })
}

#[test]
fn identical_writes_share_one_statement() {
    let code = compact(json!([
        insert("insert", "abort"),
        insert("insert_again", "abort"),
        insert("upsert", "replace"),
    ]));

    assert_eq!(code.matches(&statement_decl("__insert_user")).count(), 1);
    assert_eq!(code.matches(&statement_decl("__insert_user_1")).count(), 1);
    assert!(!code.contains("__insert_user_2"));
    assert!(code.contains("ConflictStrategy::Replace"));
}

#[test]
fn shared_fields_skip_names_issued_for_other_tables() {
    let insert = |name: &str, ty: &str, on_conflict: &str| {
        json!({
            "name": name,
            "annotations": [{ "kind": "insert", "on_conflict": on_conflict }],
            "params": [{ "name": "row", "type": ty }],
            "returns": "i64",
        })
    };
    let code = compact_document(json!({
        "tables": [keyed_table("a", "crate::A"), keyed_table("a_1", "crate::A1")],
        "daos": [{
            "name": "RowDao",
            "path": "crate::RowDao",
            "methods": [
                insert("i1", "&A", "abort"),
                insert("i2", "&A", "replace"),
                insert("i3", "&A1", "abort"),
            ],
        }],
    }));

    assert_eq!(code.matches(&statement_decl("__insert_a")).count(), 1);
    assert_eq!(code.matches(&statement_decl("__insert_a_1")).count(), 1);
    assert_eq!(code.matches(&statement_decl("__insert_a_1_1")).count(), 1);
    assert!(code.contains(r#"Dialect::insert(db.dialect(),"a_1",&["label"]"#));
}

#[test]
fn table_statics_stay_distinct_after_case_folding() {
    let code = compact_document(json!({
        "tables": [
            keyed_table("user_book", "crate::UserBook"),
            keyed_table("userBook", "crate::LegacyUserBook"),
        ],
    }));

    assert_eq!(code.matches("pubstaticUSER_BOOK_TABLE:").count(), 1);
    assert_eq!(code.matches("pubstaticUSER_BOOK_1_TABLE:").count(), 1);
    assert_eq!(code.matches("static__USER_BOOK_1_COLUMNS:").count(), 1);
    assert!(code.contains(".table(&USER_BOOK_TABLE).table(&USER_BOOK_1_TABLE)"));
}

#[test]
fn database_accessors_avoid_each_other_and_wrapper_members() {
    let code = compact_document(json!({
        "database": { "name": "app", "version": 1 },
        "daos": [
            { "name": "UserDao", "path": "crate::UserDao" },
            { "name": "user_dao", "path": "crate::LegacyUserDao" },
            { "name": "Database", "path": "crate::DatabaseDao" },
        ],
    }));

    assert!(code.contains("pubfnuser_dao(&self)->&UserDaoImpl<D>"));
    assert!(code.contains("pubfnuser_dao_1(&self)->&user_daoImpl<D>"));
    assert!(code.contains("pubfndatabase_1(&self)->&DatabaseImpl<D>"));
}

#[test]
fn keyless_entities_match_on_every_column() {
    let code = compact_document(json!({
        "tables": [{
            "name": "audit",
            "path": "crate::Audit",
            "fields": [
                { "name": "action", "type": "String" },
                { "name": "at", "type": "i64" },
            ],
        }],
        "daos": [{
            "name": "AuditDao",
            "path": "crate::AuditDao",
            "methods": [
                {
                    "name": "remove",
                    "annotations": [{ "kind": "delete" }],
                    "params": [{ "name": "entry", "type": "&Audit" }],
                    "returns": "u64",
                },
                {
                    "name": "rewrite",
                    "annotations": [{ "kind": "update" }],
                    "params": [{ "name": "entry", "type": "&Audit" }],
                    "returns": "u64",
                },
            ],
        }],
    }));

    let write = |index: usize, field: &str| {
        format!("::sluice::__internal::column::write(__stmt,{index}usize,&__e.{field})?;")
    };

    assert!(code.contains(r#"Dialect::delete(db.dialect(),"audit",&["action","at"])"#));
    let delete_body = format!(
        "self.__delete_audit.run(false,|__stmt|{{{}{}Ok(",
        write(1, "action"),
        write(2, "at")
    );
    assert!(code.contains(&delete_body));

    assert!(code.contains(r#"&["action","at"],&["action","at"]"#));
    let update_body = format!(
        "self.__update_audit.run(false,|__stmt|{{{}{}{}{}Ok(",
        write(1, "action"),
        write(2, "at"),
        write(3, "action"),
        write(4, "at")
    );
    assert!(code.contains(&update_body));
}

#[test]
fn insert_omits_auto_generated_key() {
    let code = compact(json!([insert("insert", "abort")]));

    assert!(code.contains(r#"Dialect::insert(db.dialect(),"user",&["name","email"],"#));
    assert!(code.contains("require_generated_key"));
}

#[test]
fn update_binds_columns_then_key() {
    let code = compact(json!([{
        "name": "update",
        "annotations": [{ "kind": "update" }],
        "params": [{ "name": "user", "type": "&User" }],
        "returns": "u64",
    }]));

    assert!(code.contains(r#"&["id","name","email"],&["id"]"#));
    assert!(code.contains("column::write(__stmt,4usize,&__e.id)"));
}

#[test]
fn sequence_inserts_run_in_a_transaction() {
    let code = compact(json!([{
        "name": "insert_all",
        "annotations": [{ "kind": "insert" }],
        "params": [{ "name": "users", "type": "&[User]" }],
        "returns": "Vec<i64>",
    }]));

    assert!(code.contains("self.__insert_user.run(true,"));
    assert!(code.contains("for__einusers.iter()"));
    assert!(code.contains("clear_bindings(__stmt)"));
}

#[test]
fn queries_expand_sequences_and_bind_in_placeholder_order() {
    let code = compact(json!([{
        "name": "find",
        "annotations": [{ "kind": "query", "sql": "SELECT * FROM user WHERE name = {name} AND id IN ({ids})" }],
        "params": [
            { "name": "ids", "type": "Vec<i64>" },
            { "name": "name", "type": "&str" },
        ],
        "returns": "Vec<User>",
    }]));

    assert!(code.contains("&[ids.len(),1usize]"));
    let name_bind = code.find("__cursor.advance(),name)").unwrap();
    let ids_bind = code.find("for__vinids.iter()").unwrap();
    assert!(name_bind < ids_bind);
    assert!(code.contains(r#"column_index(&__rows,"email")"#));
}

#[test]
fn one_row_queries_fail_when_empty() {
    let code = compact(json!([{
        "name": "count",
        "annotations": [{ "kind": "query", "sql": "SELECT COUNT(*) FROM user" }],
        "returns": "i64",
    }]));

    assert!(code.contains(r#"DataAccessError::no_rows("UserDao::count")"#));
    assert!(!code.contains("ArgCursor"));
}

#[test]
fn transactions_wrap_the_delegate() {
    let code = compact(json!([{
        "name": "rename",
        "annotations": [{ "kind": "transaction", "delegate": "crate::dao::rename" }],
        "params": [{ "name": "user", "type": "&User" }, { "name": "to", "type": "&str" }],
        "returns": "User",
    }]));

    assert!(code.contains("self.__transaction_connection.run(true,|_|crate::dao::rename(self,user,to))"));
}

#[test]
fn database_wrapper_and_constants() {
    let code = compact(json!([insert("insert", "abort")]));

    assert!(code.contains("pubconstSCHEMA_VERSION:u32=3u32;"));
    assert!(code.contains("pubstructAppDatabase<D:::sluice::Driver>"));
    assert!(code.contains("pubfnuser_dao(&self)->&UserDaoImpl<D>"));
    assert!(code.contains("pubstaticUSER_TABLE:"));
    assert!(code.contains(r#"IndexModel::new("index_user_email",true,&__USER_INDEX_0)"#));
}

#[test]
fn fingerprint_tracks_the_table_model() {
    let a = unit(json!([]));
    let mut b = unit(json!([]));

    assert_eq!(fingerprint(&a), fingerprint(&unit(json!([]))));

    b.tables[0].table.fields[1].column = "full_name".to_string();
    assert_ne!(fingerprint(&a), fingerprint(&b));
}

#[test]
fn sharing_table_interns_by_key() {
    let mut table = SharingTable::new();
    let key = SharedKey::Insert {
        table: "user".to_string(),
        conflict: ConflictStrategy::Abort,
    };

    let first = table.intern(key.clone(), TokenStream::new, TokenStream::new);
    let again = table.intern(key, TokenStream::new, TokenStream::new);
    let other = table.intern(
        SharedKey::Delete {
            table: "user".to_string(),
        },
        TokenStream::new,
        TokenStream::new,
    );

    assert_eq!(first, again);
    assert_eq!(other, syn::Ident::new("__delete_user", Span::call_site()));
    assert_eq!(table.len(), 2);
}

#[test]
fn name_allocator_suffixes_repeats() {
    let mut names = NameAllocator::new();

    assert_eq!(names.allocate("__query").to_string(), "__query");
    assert_eq!(names.allocate("__query").to_string(), "__query_1");
    assert_eq!(names.allocate("__query").to_string(), "__query_2");
    assert_eq!(names.allocate("__other").to_string(), "__other");
}

#[test]
fn name_allocator_skips_names_issued_under_another_base() {
    let mut names = NameAllocator::new();
    names.reserve("db");

    assert_eq!(names.allocate("__insert_a").to_string(), "__insert_a");
    assert_eq!(names.allocate("__insert_a").to_string(), "__insert_a_1");
    assert_eq!(names.allocate("__insert_a_1").to_string(), "__insert_a_1_1");
    assert_eq!(names.allocate("__insert_a").to_string(), "__insert_a_2");
    assert_eq!(names.allocate_name("db"), "db_1");
}
