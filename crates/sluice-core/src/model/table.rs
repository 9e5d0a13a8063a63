use crate::model::{ColumnModel, IndexModel};
use std::fmt::{self, Display};

///
/// ConflictStrategy
/// What the engine does when an insert or update hits a constraint.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ConflictStrategy {
    None,
    #[default]
    Abort,
    Fail,
    Ignore,
    Replace,
    Rollback,
}

impl ConflictStrategy {
    /// The `OR <clause>` keyword, or `None` for a plain statement.
    #[must_use]
    pub const fn keyword(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Abort => Some("ABORT"),
            Self::Fail => Some("FAIL"),
            Self::Ignore => Some("IGNORE"),
            Self::Replace => Some("REPLACE"),
            Self::Rollback => Some("ROLLBACK"),
        }
    }
}

impl Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword().unwrap_or("NONE"))
    }
}

///
/// PrimaryKeyModel
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PrimaryKeyModel {
    pub columns: &'static [&'static str],
    pub auto_generate: bool,
}

impl PrimaryKeyModel {
    pub const NONE: Self = Self::new(&[], false);

    #[must_use]
    pub const fn new(columns: &'static [&'static str], auto_generate: bool) -> Self {
        Self {
            columns,
            auto_generate,
        }
    }

    #[must_use]
    pub const fn is_missing(&self) -> bool {
        self.columns.is_empty()
    }
}

///
/// TableModel
/// Runtime-only descriptor for a registered table.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TableModel {
    pub name: &'static str,
    pub columns: &'static [ColumnModel],
    pub primary_key: PrimaryKeyModel,
    pub indices: &'static [IndexModel],
}

impl TableModel {
    #[must_use]
    pub const fn new(
        name: &'static str,
        columns: &'static [ColumnModel],
        primary_key: PrimaryKeyModel,
        indices: &'static [IndexModel],
    ) -> Self {
        Self {
            name,
            columns,
            primary_key,
            indices,
        }
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnModel> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }
}

impl Display for TableModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.column_names().join(", "))
    }
}
