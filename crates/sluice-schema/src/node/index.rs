use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// Order
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    #[display("asc")]
    Asc,

    #[display("desc")]
    Desc,
}

///
/// IndexColumn
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct IndexColumn {
    pub field: String,
    pub column: String,
    pub order: Order,
}

///
/// Index
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Index {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<IndexColumn>,
}

impl Index {
    /// `index_<table>_<column>_<column>`
    #[must_use]
    pub fn default_name(table: &str, columns: &[&str]) -> String {
        let mut name = format!("index_{table}");
        for column in columns {
            name.push('_');
            name.push_str(column);
        }

        name
    }
}
