//! Module: emit
//! Responsibility: render a compiled unit as Rust source.
//! Does not own: validation; every input here already compiled cleanly.
//!
//! Invariants:
//! - Output depends only on the unit, never on iteration order of hashed maps.
//! - Generated code names runtime items by absolute `::sluice` paths.

mod dao;
mod database;
mod shared;
mod table;

#[cfg(test)]
mod tests;

pub use shared::{NameAllocator, SharedField, SharedKey, SharingTable};
pub use table::fingerprint;

use crate::method::CompiledUnit;
use proc_macro2::TokenStream;
use quote::quote;

///
/// CodeBuilder
///

pub struct CodeBuilder<'a> {
    unit: &'a CompiledUnit,
}

impl<'a> CodeBuilder<'a> {
    #[must_use]
    pub const fn new(unit: &'a CompiledUnit) -> Self {
        Self { unit }
    }

    /// Generate the full module: table models, Dao implementations and
    /// the database wrapper.
    #[must_use]
    pub fn generate(&self) -> TokenStream {
        let mut tokens = quote!();

        tokens.extend(self.constants());
        tokens.extend(table::generate(self.unit));

        for dao in &self.unit.daos {
            tokens.extend(dao::generate(self.unit, dao));
        }

        if let Some(database) = &self.unit.database {
            tokens.extend(database::generate(self.unit, database));
        }

        tokens
    }

    fn constants(&self) -> TokenStream {
        let version = self.unit.database.as_ref().map_or(1, |db| db.version);
        let fingerprint = fingerprint(self.unit);

        quote! {
            /// Schema version registered with the hosting database.
            pub const SCHEMA_VERSION: u32 = #version;

            /// xxh3 hash of the generated table models.
            pub const SCHEMA_FINGERPRINT: u64 = #fingerprint;
        }
    }
}

/// Render `unit` as a token stream.
#[must_use]
pub fn generate(unit: &CompiledUnit) -> TokenStream {
    CodeBuilder::new(unit).generate()
}
