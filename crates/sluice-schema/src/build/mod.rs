//! Module: build
//! Responsibility: turn descriptor-source records into a validated `Schema`.
//! Does not own: the records themselves (see `source`).
//!
//! Invariants:
//! - Table names are pairwise unique; a repeat fails before validation.
//! - Index columns keep declaration order, uniqueness and sort order.
//! - Only primary-key fields are ever auto-generated.


use crate::{
    Error,
    error::ErrorTree,
    err,
    node::{Database, Field, Index, IndexColumn, Order, PrimaryKey, Schema, Table, strip_option},
    source::{DescriptorSource, FieldRecord, IndexRecord, TableRecord},
    validate::validate_schema,
};
use std::collections::BTreeSet;

///
/// SchemaBuilder
///

#[derive(Debug, Default)]
pub struct SchemaBuilder;

impl SchemaBuilder {
    /// Build and validate every table the source declares.
    pub fn build(source: &impl DescriptorSource) -> Result<Schema, Error> {
        let mut seen = BTreeSet::new();
        for record in source.tables() {
            if !seen.insert(record.name.as_str()) {
                return Err(Error::DuplicateTableName {
                    name: record.name.clone(),
                });
            }
        }

        let mut errs = ErrorTree::new();
        let tables = source
            .tables()
            .iter()
            .map(|record| {
                let mut table_errs = ErrorTree::new();
                let table = build_table(record, &mut table_errs);
                errs.add_child(record.name.clone(), table_errs);

                table
            })
            .collect();

        let schema = Schema {
            database: source.database().map(|db| Database {
                name: db.name.clone(),
                version: db.version,
                path: db.path.clone(),
            }),
            tables,
        };

        errs.add_result(validate_schema(&schema));
        errs.result().map_err(Error::Validation)?;

        Ok(schema)
    }
}

fn build_table(record: &TableRecord, errs: &mut ErrorTree) -> Table {
    let key = record.primary_key.clone().unwrap_or_default();

    let fields: Vec<Field> = record
        .fields
        .iter()
        .map(|field| build_field(field, key.fields.contains(&field.name) && key.auto_generate))
        .collect();

    let auto_key = key.auto_generate
        || fields
            .iter()
            .any(|f| f.auto_generate && key.fields.contains(&f.name));

    let indices = record
        .indices
        .iter()
        .map(|index| build_index(&record.name, index, &fields, errs))
        .collect();

    Table {
        name: record.name.clone(),
        path: record.path.clone(),
        fields,
        primary_key: PrimaryKey {
            fields: key.fields,
            auto_generate: auto_key,
        },
        indices,
    }
}

fn build_field(record: &FieldRecord, auto_key: bool) -> Field {
    Field {
        name: record.name.clone(),
        column: record.column.clone().unwrap_or_else(|| record.name.clone()),
        ty: record.ty.trim().to_string(),
        nullable: record
            .nullable
            .unwrap_or_else(|| strip_option(&record.ty).is_some()),
        default: record.default.clone(),
        auto_generate: record.auto_generate || auto_key,
    }
}

fn build_index(table: &str, record: &IndexRecord, fields: &[Field], errs: &mut ErrorTree) -> Index {
    if !record.orders.is_empty() && record.orders.len() != record.fields.len() {
        err!(
            errs,
            "index on ({}) declares {} orders for {} fields",
            record.fields.join(", "),
            record.orders.len(),
            record.fields.len()
        );
    }

    let columns: Vec<IndexColumn> = record
        .fields
        .iter()
        .enumerate()
        .map(|(i, name)| IndexColumn {
            field: name.clone(),
            // unknown fields are reported by validation
            column: fields
                .iter()
                .find(|f| &f.name == name)
                .map_or_else(|| name.clone(), |f| f.column.clone()),
            order: record.orders.get(i).copied().unwrap_or(Order::Asc),
        })
        .collect();

    let name = record.name.clone().unwrap_or_else(|| {
        let names: Vec<&str> = columns.iter().map(|c| c.column.as_str()).collect();
        Index::default_name(table, &names)
    });

    Index {
        name,
        unique: record.unique,
        columns,
    }
}
