use serde_json::json;
use sluice_build::{BuildError, CompileError, generate_from_config, generate_from_path, write_generated};
use std::fs;
use tempfile::TempDir;

fn descriptor(methods: serde_json::Value) -> String {
    json!({
        "database": { "name": "library", "version": 2, "path": "crate::db::LibraryDb" },
        "tables": [{
            "name": "book",
            "path": "crate::model::Book",
            "fields": [
                { "name": "id", "type": "i64", "auto_generate": true },
                { "name": "title", "type": "String" },
                { "name": "isbn", "type": "crate::Isbn" },
            ],
            "primary_key": { "fields": ["id"] },
            "indices": [{ "fields": ["title", "isbn"], "orders": ["asc", "desc"] }],
        }],
        "converters": [{
            "type": "crate::Isbn",
            "storage": "String",
            "to": "crate::isbn_to_sql",
            "from": "crate::isbn_from_sql",
        }],
        "daos": [{ "name": "BookDao", "path": "crate::dao::BookDao", "methods": methods }],
    })
    .to_string()
}

fn methods() -> serde_json::Value {
    json!([
        {
            "name": "insert",
            "annotations": [{ "kind": "insert" }],
            "params": [{ "name": "book", "type": "&Book" }],
            "returns": "i64",
        },
        {
            "name": "by_isbn",
            "annotations": [{ "kind": "query", "sql": "SELECT * FROM book WHERE isbn = {isbn}" }],
            "params": [{ "name": "isbn", "type": "&crate::Isbn" }],
            "returns": "Option<Book>",
        },
        {
            "name": "delete",
            "annotations": [{ "kind": "delete" }],
            "params": [{ "name": "books", "type": "Vec<Book>" }],
            "returns": "u64",
            "transactional": true,
        },
    ])
}

#[test]
fn config_drives_generation_into_the_output_dir() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("library.json"), descriptor(methods())).unwrap();
    fs::write(
        dir.path().join("sluice.toml"),
        "[build]\ndescriptor = \"library.json\"\noutput = \"library.rs\"\n",
    )
    .unwrap();

    let generated = generate_from_config(dir.path().join("sluice.toml")).unwrap();
    assert_eq!(generated.descriptor, dir.path().join("library.json"));

    let out = TempDir::new().unwrap();
    let path = write_generated(out.path(), &generated).unwrap();
    assert_eq!(path, out.path().join("library.rs"));

    let code = fs::read_to_string(path).unwrap();
    let file: syn::File = syn::parse_str(&code).unwrap();
    let structs: Vec<String> = file
        .items
        .iter()
        .filter_map(|item| match item {
            syn::Item::Struct(s) => Some(s.ident.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(structs, vec!["BookDaoImpl", "LibraryDb"]);

    let compact: String = code.chars().filter(|c| !c.is_whitespace()).collect();
    assert!(compact.contains("crate::isbn_to_sql(isbn)"));
    assert!(compact.contains("crate::isbn_from_sql("));
    assert!(compact.contains("Order::Desc"));
}

#[test]
fn every_method_error_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(
        &path,
        descriptor(json!([
            { "name": "a", "annotations": [] },
            { "name": "b", "annotations": [{ "kind": "query", "sql": "SELECT {missing}" }] },
        ])),
    )
    .unwrap();

    let Err(BuildError::Compile(errors)) = generate_from_path(&path) else {
        panic!("expected compile errors");
    };

    assert_eq!(errors.len(), 2);
    assert!(matches!(errors[0], CompileError::ConflictingMethodAnnotation { .. }));
    assert!(matches!(&errors[1], CompileError::UnresolvedPlaceholder { name, .. } if name == "missing"));
}

#[test]
fn missing_descriptor_is_a_schema_error() {
    let dir = TempDir::new().unwrap();

    let err = generate_from_path(dir.path().join("absent.json")).unwrap_err();

    assert!(matches!(err, BuildError::Schema(_)));
}
