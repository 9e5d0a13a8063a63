use derive_more::Display;

///
/// SqlType
/// Storage class of a column, chosen by the column's binder.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum SqlType {
    #[display("BOOLEAN")]
    Boolean,
    #[display("TINYINT")]
    TinyInt,
    #[display("SMALLINT")]
    SmallInt,
    #[display("INTEGER")]
    Integer,
    #[display("BIGINT")]
    BigInt,
    #[display("REAL")]
    Float,
    #[display("DOUBLE")]
    Double,
    #[display("TEXT")]
    Text,
    #[display("BLOB")]
    Blob,
}

impl SqlType {
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::TinyInt | Self::SmallInt | Self::Integer | Self::BigInt
        )
    }
}

///
/// ColumnModel
/// Runtime-only descriptor for one table column.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ColumnModel {
    pub name: &'static str,
    pub field: &'static str,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub default: Option<&'static str>,
    pub auto_generate: bool,
}

impl ColumnModel {
    #[must_use]
    pub const fn new(name: &'static str, field: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            field,
            sql_type,
            nullable: false,
            default: None,
            auto_generate: false,
        }
    }

    #[must_use]
    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    #[must_use]
    pub const fn default_value(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub const fn auto_generate(mut self, auto_generate: bool) -> Self {
        self.auto_generate = auto_generate;
        self
    }
}
