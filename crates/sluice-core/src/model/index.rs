use std::fmt::{self, Display};

///
/// Order
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "ASC"),
            Self::Desc => write!(f, "DESC"),
        }
    }
}

///
/// IndexColumn
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IndexColumn {
    pub column: &'static str,
    pub order: Order,
}

impl IndexColumn {
    #[must_use]
    pub const fn new(column: &'static str, order: Order) -> Self {
        Self { column, order }
    }
}

///
/// IndexModel
/// Index created by `Database::init`.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IndexModel {
    pub name: &'static str,
    pub unique: bool,
    pub columns: &'static [IndexColumn],
}

impl IndexModel {
    #[must_use]
    pub const fn new(name: &'static str, unique: bool, columns: &'static [IndexColumn]) -> Self {
        Self {
            name,
            unique,
            columns,
        }
    }
}

impl Display for IndexModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.column, c.order))
            .collect::<Vec<_>>()
            .join(", ");

        if self.unique {
            write!(f, "UNIQUE {}({columns})", self.name)
        } else {
            write!(f, "{}({columns})", self.name)
        }
    }
}
