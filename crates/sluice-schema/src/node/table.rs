use crate::node::{Field, Index, PrimaryKey};
use serde::Serialize;

///
/// Table
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Table {
    pub name: String,

    /// Rust path of the entity struct.
    pub path: String,

    pub fields: Vec<Field>,
    pub primary_key: PrimaryKey,
    pub indices: Vec<Index>,
}

impl Table {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Primary-key fields in key order.
    #[must_use]
    pub fn key_fields(&self) -> Vec<&Field> {
        self.primary_key
            .fields
            .iter()
            .filter_map(|name| self.field(name))
            .collect()
    }

    /// Fields an insert writes: everything except auto-generated keys.
    #[must_use]
    pub fn insert_fields(&self) -> Vec<&Field> {
        self.fields.iter().filter(|f| !f.auto_generate).collect()
    }

    /// Fields identifying a row for update and delete: the key, or every
    /// field when the table has none.
    #[must_use]
    pub fn predicate_fields(&self) -> Vec<&Field> {
        if self.primary_key.is_missing() {
            self.fields.iter().collect()
        } else {
            self.key_fields()
        }
    }
}
