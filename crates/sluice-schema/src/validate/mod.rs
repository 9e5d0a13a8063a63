//! Table validation passes and shared helpers.

pub mod naming;

use crate::{
    error::ErrorTree,
    err,
    node::{Schema, Table},
};
use std::collections::BTreeSet;

/// Integer types an auto-generated key may use.
const AUTO_KEY_TYPES: [&str; 4] = ["i8", "i16", "i32", "i64"];

/// Validate every node, then the cross-node rules.
pub(crate) fn validate_schema(schema: &Schema) -> Result<(), ErrorTree> {
    let mut errors = ErrorTree::new();

    if let Some(database) = &schema.database {
        let mut database_errs = ErrorTree::new();
        naming::validate_ident(&database.name, "database", &mut database_errs);
        errors.add_child("database", database_errs);
    }

    // Phase 1: validate each table (structural + local invariants).
    for table in &schema.tables {
        errors.add_child(table.name.clone(), validate_table(table));
    }

    // Phase 2: enforce schema-wide invariants.
    naming::validate_index_naming(schema, &mut errors);

    errors.result()
}

fn validate_table(table: &Table) -> ErrorTree {
    let mut errs = ErrorTree::new();

    naming::validate_ident(&table.name, "table", &mut errs);

    // fields
    let mut names = BTreeSet::new();
    let mut columns = BTreeSet::new();
    for field in &table.fields {
        let mut field_errs = ErrorTree::new();

        naming::validate_rust_ident(&field.name, "field", &mut field_errs);
        naming::validate_ident(&field.column, "column", &mut field_errs);
        if !names.insert(field.name.as_str()) {
            err!(field_errs, "duplicate field name '{}'", field.name);
        }
        if !columns.insert(field.column.as_str()) {
            err!(field_errs, "duplicate column name '{}'", field.column);
        }
        if field.auto_generate && !table.primary_key.contains(&field.name) {
            err!(field_errs, "auto_generate is only valid on primary-key fields");
        }

        errs.add_child(field.name.clone(), field_errs);
    }

    if table.fields.is_empty() {
        err!(errs, "table declares no fields");
    }

    // primary key
    let mut key = BTreeSet::new();
    for name in &table.primary_key.fields {
        if table.field(name).is_none() {
            err!(errs, "primary key field '{name}' does not exist");
        }
        if !key.insert(name.as_str()) {
            err!(errs, "primary key repeats field '{name}'");
        }
    }

    if table.primary_key.auto_generate {
        match table.key_fields().as_slice() {
            [field] if AUTO_KEY_TYPES.contains(&field.value_type()) => {}
            [field] => err!(
                errs,
                "auto-generated key '{}' must be an integer, found '{}'",
                field.name,
                field.ty
            ),
            _ => err!(errs, "auto-generated primary key must have exactly one field"),
        }
    }

    // indices
    for index in &table.indices {
        if index.columns.is_empty() {
            err!(errs, "index '{}' has no fields", index.name);
        }
        for column in &index.columns {
            if table.field(&column.field).is_none() {
                err!(
                    errs,
                    "index '{}' references unknown field '{}'",
                    index.name,
                    column.field
                );
            }
        }
    }

    errs
}
