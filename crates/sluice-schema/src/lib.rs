pub mod build;
pub mod error;
pub mod node;
pub mod source;
pub mod validate;

/// Maximum length for table and column identifiers.
pub const MAX_IDENT_LEN: usize = 64;

/// Longest index name the builder will derive before rejecting it.
pub const MAX_INDEX_NAME_LEN: usize = 255;

use crate::source::SourceError;
use thiserror::Error as ThisError;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        err,
        error::ErrorTree,
        node::{Database, Field, Index, IndexColumn, Order, PrimaryKey, Schema, Table},
        source::DescriptorSource,
    };
    pub use serde::{Deserialize, Serialize};
}

///
/// Error
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum Error {
    #[error("duplicate table name '{name}'")]
    DuplicateTableName { name: String },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("validation failed: {0}")]
    Validation(error::ErrorTree),
}
