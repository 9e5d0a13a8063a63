//! Module: source
//! Responsibility: the descriptor-source boundary. Everything the compiler
//! knows about declared tables, converters and Dao traits arrives through
//! `DescriptorSource`.
//! Does not own: validation (see `build`) or method compilation.

use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};
use thiserror::Error as ThisError;

///
/// DescriptorSource
///
/// Discovers declarations and exposes their type and field metadata.
///

pub trait DescriptorSource {
    fn database(&self) -> Option<&DatabaseRecord>;

    fn tables(&self) -> &[TableRecord];

    fn converters(&self) -> &[ConverterRecord];

    fn daos(&self) -> &[DaoRecord];
}

///
/// SourceError
///

#[derive(Debug, ThisError)]
pub enum SourceError {
    #[error("failed to read descriptor '{path}': {source}")]
    Io { path: String, source: io::Error },

    #[error("invalid descriptor: {0}")]
    Json(#[from] serde_json::Error),
}

///
/// SourceDocument
/// Descriptor source backed by a serialized document.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourceDocument {
    #[serde(default)]
    pub database: Option<DatabaseRecord>,

    #[serde(default)]
    pub tables: Vec<TableRecord>,

    #[serde(default)]
    pub converters: Vec<ConverterRecord>,

    #[serde(default)]
    pub daos: Vec<DaoRecord>,
}

impl SourceDocument {
    pub fn from_json_str(source: &str) -> Result<Self, SourceError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_json_str(&source)
    }
}

impl DescriptorSource for SourceDocument {
    fn database(&self) -> Option<&DatabaseRecord> {
        self.database.as_ref()
    }

    fn tables(&self) -> &[TableRecord] {
        &self.tables
    }

    fn converters(&self) -> &[ConverterRecord] {
        &self.converters
    }

    fn daos(&self) -> &[DaoRecord] {
        &self.daos
    }
}

///
/// DatabaseRecord
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseRecord {
    pub name: String,

    #[serde(default = "default_version")]
    pub version: u32,

    /// Rust path the generated database type is named after.
    #[serde(default)]
    pub path: Option<String>,
}

const fn default_version() -> u32 {
    1
}

///
/// TableRecord
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TableRecord {
    pub name: String,

    /// Rust path of the entity struct mapped onto this table.
    pub path: String,

    pub fields: Vec<FieldRecord>,

    #[serde(default)]
    pub primary_key: Option<PrimaryKeyRecord>,

    #[serde(default)]
    pub indices: Vec<IndexRecord>,
}

///
/// FieldRecord
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FieldRecord {
    pub name: String,

    #[serde(default)]
    pub column: Option<String>,

    #[serde(rename = "type")]
    pub ty: String,

    /// Derived from an `Option<..>` type when absent.
    #[serde(default)]
    pub nullable: Option<bool>,

    #[serde(default)]
    pub default: Option<String>,

    #[serde(default)]
    pub auto_generate: bool,
}

///
/// PrimaryKeyRecord
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrimaryKeyRecord {
    pub fields: Vec<String>,

    #[serde(default)]
    pub auto_generate: bool,
}

///
/// IndexRecord
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndexRecord {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub unique: bool,

    pub fields: Vec<String>,

    /// Per-field sort order; empty means ascending throughout.
    #[serde(default)]
    pub orders: Vec<crate::node::Order>,
}

///
/// ConverterRecord
///
/// User conversion between a domain type and a storage primitive. `to`
/// and `from` are paths to `fn(&T) -> S` and `fn(S) -> T`.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConverterRecord {
    #[serde(rename = "type")]
    pub ty: String,

    pub storage: String,
    pub to: String,
    pub from: String,
}

///
/// DaoRecord
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DaoRecord {
    pub name: String,

    /// Rust path of the declared trait.
    pub path: String,

    #[serde(default)]
    pub methods: Vec<MethodRecord>,
}

///
/// MethodRecord
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MethodRecord {
    pub name: String,

    #[serde(default)]
    pub annotations: Vec<Annotation>,

    #[serde(default)]
    pub params: Vec<ParamRecord>,

    /// Declared return type, without the `Result` wrapper.
    #[serde(default)]
    pub returns: Option<String>,

    #[serde(default)]
    pub transactional: bool,
}

///
/// ParamRecord
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParamRecord {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: String,

    /// Forces sequence treatment for types the compiler cannot see through.
    #[serde(default)]
    pub sequence: bool,
}

///
/// Annotation
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    Delete {
        #[serde(default)]
        sql: Option<String>,
    },
    Insert {
        #[serde(default)]
        on_conflict: Option<OnConflict>,
    },
    Query {
        sql: String,
    },
    Transaction {
        /// Path to `fn(&Self, args..) -> Result<T, DataAccessError>`.
        delegate: String,
    },
    Update {
        #[serde(default)]
        on_conflict: Option<OnConflict>,

        #[serde(default)]
        sql: Option<String>,
    },
}

impl Annotation {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Delete { .. } => "delete",
            Self::Insert { .. } => "insert",
            Self::Query { .. } => "query",
            Self::Transaction { .. } => "transaction",
            Self::Update { .. } => "update",
        }
    }
}

///
/// OnConflict
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[remain::sorted]
pub enum OnConflict {
    #[default]
    Abort,
    Fail,
    Ignore,
    None,
    Replace,
    Rollback,
}
