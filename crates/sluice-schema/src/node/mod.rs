mod field;
mod index;
mod primary_key;
mod table;

pub use field::{Field, strip_option};
pub use index::{Index, IndexColumn, Order};
pub use primary_key::PrimaryKey;
pub use table::Table;

use serde::Serialize;

///
/// Database
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Database {
    pub name: String,
    pub version: u32,
    pub path: Option<String>,
}

///
/// Schema
///
/// Validated table model for one generation unit, in declaration order.
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct Schema {
    pub database: Option<Database>,
    pub tables: Vec<Table>,
}

impl Schema {
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Resolve a table from the Rust type mapped onto it.
    ///
    /// Matches the full path first, then the final path segment.
    #[must_use]
    pub fn table_for_type(&self, ty: &str) -> Option<&Table> {
        let ty = ty.trim();

        self.tables.iter().find(|t| t.path == ty).or_else(|| {
            let ident = last_segment(ty);
            let mut matches = self.tables.iter().filter(|t| last_segment(&t.path) == ident);

            match (matches.next(), matches.next()) {
                (Some(table), None) => Some(table),
                _ => None,
            }
        })
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path).trim()
}
