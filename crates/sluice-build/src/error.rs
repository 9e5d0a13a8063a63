use derive_more::{Deref, IntoIterator};
use sluice_core::config::ConfigError;
use std::{fmt, io};
use thiserror::Error as ThisError;

///
/// CompileError
///
/// Generation-time failure. Every variant names the offending declaration
/// as `Dao::method` or `table.field`.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum CompileError {
    #[error("{route}: expected exactly one of insert, update, delete, query or transaction, found {found}")]
    ConflictingMethodAnnotation { route: String, found: String },

    #[error("{route}: a converter for '{ty}' is already registered")]
    DuplicateConverter { route: String, ty: String },

    #[error("{route}: Dao '{name}' is declared more than once")]
    DuplicateDao { route: String, name: String },

    #[error("{route}: query SQL is empty")]
    EmptySql { route: String },

    #[error("{route}: invalid parameter '{param}': {reason}")]
    InvalidParameter {
        route: String,
        param: String,
        reason: String,
    },

    #[error("{route}: unsupported return type '{ty}': {reason}")]
    InvalidReturn {
        route: String,
        ty: String,
        reason: String,
    },

    #[error("{route}: cannot parse '{ty}'")]
    InvalidType { route: String, ty: String },

    #[error("{route}: no binder found for type '{ty}'")]
    NoBinderFound { route: String, ty: String },

    #[error("{route}: sequence parameter '{param}' has no resolvable element type")]
    UnboundGenericType { route: String, param: String },

    #[error("{route}: '{ty}' is not a registered entity")]
    UnknownEntity { route: String, ty: String },

    #[error("{route}: placeholder '{{{name}}}' does not match any parameter")]
    UnresolvedPlaceholder { route: String, name: String },
}

impl CompileError {
    #[must_use]
    pub fn route(&self) -> &str {
        match self {
            Self::ConflictingMethodAnnotation { route, .. }
            | Self::DuplicateConverter { route, .. }
            | Self::DuplicateDao { route, .. }
            | Self::EmptySql { route }
            | Self::InvalidParameter { route, .. }
            | Self::InvalidReturn { route, .. }
            | Self::InvalidType { route, .. }
            | Self::NoBinderFound { route, .. }
            | Self::UnboundGenericType { route, .. }
            | Self::UnknownEntity { route, .. }
            | Self::UnresolvedPlaceholder { route, .. } => route,
        }
    }
}

///
/// CompileErrors
/// Every failure in one generation unit, reported as one batch.
///

#[derive(Clone, Debug, Default, Deref, Eq, IntoIterator, PartialEq)]
pub struct CompileErrors(Vec<CompileError>);

impl CompileErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, err: CompileError) {
        self.0.push(err);
    }

    /// Record the error half of `result`, keeping the value.
    pub fn collect<T>(&mut self, result: Result<T, CompileError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.push(err);
                None
            }
        }
    }

    pub fn result<T>(self, value: T) -> Result<T, Self> {
        if self.0.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }

        Ok(())
    }
}

impl std::error::Error for CompileErrors {}

///
/// BuildError
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum BuildError {
    #[error("code generation failed:\n{0}")]
    Compile(CompileErrors),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to write '{path}': {source}")]
    Io { path: String, source: io::Error },

    #[error(transparent)]
    Schema(#[from] sluice_schema::Error),
}

impl From<CompileErrors> for BuildError {
    fn from(errors: CompileErrors) -> Self {
        Self::Compile(errors)
    }
}
