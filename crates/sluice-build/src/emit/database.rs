use crate::{
    emit::{dao::impl_ident, shared::NameAllocator},
    method::CompiledUnit,
};
use convert_case::{Case, Casing};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use sluice_schema::node::Database;
use syn::Ident;

/// Struct name for the hosting database wrapper.
///
/// The last segment of the declared path wins; otherwise the database name
/// in Pascal case with a `Database` suffix.
pub(super) fn database_ident(database: &Database) -> Ident {
    let last = database
        .path
        .as_deref()
        .and_then(|path| path.rsplit("::").next())
        .map(str::trim)
        .filter(|segment| !segment.is_empty());

    match last {
        Some(segment) => format_ident!("{}", segment),
        None => format_ident!("{}Database", database.name.to_case(Case::Pascal)),
    }
}

/// Members of the wrapper that accessor names must not shadow.
const WRAPPER_MEMBERS: [&str; 4] = ["builder", "database", "db", "new"];

/// Typed wrapper owning the shared `Database` and one lazily built
/// implementation per Dao.
pub(super) fn generate(unit: &CompiledUnit, database: &Database) -> TokenStream {
    let ident = database_ident(database);
    let name = &database.name;

    let mut names = NameAllocator::new();
    for member in WRAPPER_MEMBERS {
        names.reserve(member);
    }
    let field_idents: Vec<Ident> = unit
        .daos
        .iter()
        .map(|dao| names.allocate(&dao.name.to_case(Case::Snake)))
        .collect();

    let mut fields = Vec::new();
    let mut accessors = Vec::new();
    for (dao, field) in unit.daos.iter().zip(&field_idents) {
        let impl_ident = impl_ident(dao);

        fields.push(quote! {
            #field: ::std::sync::OnceLock<#impl_ident<D>>
        });
        accessors.push(quote! {
            pub fn #field(&self) -> &#impl_ident<D> {
                self.#field.get_or_init(|| #impl_ident::new(&self.db))
            }
        });
    }

    quote! {
        pub struct #ident<D: ::sluice::Driver> {
            db: ::std::sync::Arc<::sluice::Database<D>>,
            #( #fields, )*
        }

        impl<D: ::sluice::Driver> #ident<D> {
            pub const NAME: &'static str = #name;

            /// Builder preloaded with every generated table and the schema version.
            #[must_use]
            pub fn builder(driver: D) -> ::sluice::DatabaseBuilder<D> {
                register_tables(::sluice::Database::builder(#name, driver).version(SCHEMA_VERSION))
            }

            #[must_use]
            pub fn new(db: ::std::sync::Arc<::sluice::Database<D>>) -> Self {
                Self {
                    db,
                    #( #field_idents: ::std::sync::OnceLock::new(), )*
                }
            }

            #[must_use]
            pub const fn database(&self) -> &::std::sync::Arc<::sluice::Database<D>> {
                &self.db
            }

            #( #accessors )*
        }
    }
}
