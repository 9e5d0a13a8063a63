//! Build-time compiler from declared data-access methods to Rust source.
//!
//! A descriptor source (tables, converters and Dao traits) is validated into
//! a schema, compiled into per-method IR, and emitted as one module that the
//! consuming crate includes from `OUT_DIR`.

pub mod binder;
pub mod emit;
pub mod error;
pub mod method;
pub mod ty;

mod macros;

pub use error::{BuildError, CompileError, CompileErrors};
pub use sluice_core::config;

use crate::method::compile_unit;
use proc_macro2::TokenStream;
use sluice_core::config::SluiceConfig;
use sluice_schema::{
    build::SchemaBuilder,
    source::{DescriptorSource, SourceDocument},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Generate the module for `source` as a token stream.
pub fn generate_tokens(source: &impl DescriptorSource) -> Result<TokenStream, BuildError> {
    // Phase 1: schema
    let schema = SchemaBuilder::build(source)?;

    // Phase 2: methods
    let unit = compile_unit(source, &schema)?;

    tracing::debug!(
        tables = unit.tables.len(),
        daos = unit.daos.len(),
        "compiled generation unit"
    );

    // Phase 3: emit
    Ok(emit::generate(&unit))
}

/// Generate the module for `source` as Rust source text.
pub fn generate(source: &impl DescriptorSource) -> Result<String, BuildError> {
    let tokens = generate_tokens(source)?;

    Ok(tokens.to_string())
}

/// Generate from a JSON descriptor document on disk.
pub fn generate_from_path(path: impl AsRef<Path>) -> Result<String, BuildError> {
    let document = SourceDocument::from_path(path).map_err(sluice_schema::Error::from)?;

    generate(&document)
}

///
/// Generated
/// Output of a config-driven run.
///

#[derive(Clone, Debug)]
pub struct Generated {
    pub code: String,

    /// File name inside the output directory.
    pub output: String,

    /// Resolved descriptor path, for change tracking.
    pub descriptor: PathBuf,
}

/// Load a `sluice.toml`, then generate from the descriptor it names.
///
/// The descriptor path is resolved against the config file's directory.
pub fn generate_from_config(config_path: impl AsRef<Path>) -> Result<Generated, BuildError> {
    let config_path = config_path.as_ref();
    let config = SluiceConfig::from_path(config_path)?;

    let descriptor = config_path
        .parent()
        .map_or_else(|| config.build.descriptor.clone(), |dir| dir.join(&config.build.descriptor));
    let code = generate_from_path(&descriptor)?;

    Ok(Generated {
        code,
        output: config.build.output,
        descriptor,
    })
}

/// Write generated code into `out_dir`, returning the file written.
pub fn write_generated(out_dir: &Path, generated: &Generated) -> Result<PathBuf, BuildError> {
    let path = out_dir.join(&generated.output);

    fs::write(&path, generated.code.as_bytes()).map_err(|source| BuildError::Io {
        path: path.display().to_string(),
        source,
    })?;

    Ok(path)
}
