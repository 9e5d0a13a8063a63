use crate::{
    emit::shared::NameAllocator,
    method::{CompiledUnit, TableBinding},
};
use convert_case::{Case, Casing};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use sluice_core::model::SqlType;
use sluice_schema::node::Order;
use xxhash_rust::xxh3::xxh3_64;

/// Name of the public `TableModel` static for an allocated prefix.
fn table_ident(prefix: &str) -> syn::Ident {
    format_ident!("{}_TABLE", prefix)
}

/// Table model statics plus `register_tables`.
///
/// Arrays are separate statics so every `&'static` slice points at a
/// named item. Static names derive from one prefix per table, allocated
/// across the unit so names that fold to the same constant case stay apart.
pub(super) fn generate(unit: &CompiledUnit) -> TokenStream {
    let mut statics = quote!();
    let mut registrations = quote!();
    let mut prefixes = NameAllocator::new();

    for binding in &unit.tables {
        let prefix = prefixes.allocate_name(&binding.table.name.to_case(Case::Constant));
        statics.extend(table_statics(binding, &prefix));

        let ident = table_ident(&prefix);
        registrations.extend(quote!(.table(&#ident)));
    }

    quote! {
        #statics

        /// Register every generated table with a database under construction.
        #[must_use]
        pub fn register_tables<D: ::sluice::Driver>(
            builder: ::sluice::DatabaseBuilder<D>,
        ) -> ::sluice::DatabaseBuilder<D> {
            builder #registrations
        }
    }
}

fn table_statics(binding: &TableBinding, prefix: &str) -> TokenStream {
    let table = &binding.table;
    let table_ident = table_ident(prefix);
    let columns_ident = format_ident!("__{}_COLUMNS", prefix);
    let indices_ident = format_ident!("__{}_INDICES", prefix);
    let name = &table.name;

    // columns
    let columns: Vec<TokenStream> = binding
        .fields()
        .map(|(field, binder)| {
            let column = &field.column;
            let field_name = &field.name;
            let sql_type = sql_type_tokens(binder.sql_type());
            let nullable = field.nullable;
            let auto = field.auto_generate;
            let default = field
                .default
                .as_ref()
                .map(|default| quote!(.default_value(#default)));

            quote! {
                ::sluice::__internal::ColumnModel::new(#column, #field_name, #sql_type)
                    .nullable(#nullable)
                    .auto_generate(#auto)
                    #default
            }
        })
        .collect();
    let column_count = columns.len();

    // indices
    let mut index_statics = quote!();
    let mut indices = Vec::new();
    for (i, index) in table.indices.iter().enumerate() {
        let parts_ident = format_ident!("__{}_INDEX_{}", prefix, i);
        let parts: Vec<TokenStream> = index
            .columns
            .iter()
            .map(|column| {
                let name = &column.column;
                let order = match column.order {
                    Order::Asc => quote!(::sluice::__internal::Order::Asc),
                    Order::Desc => quote!(::sluice::__internal::Order::Desc),
                };
                quote!(::sluice::__internal::IndexColumn::new(#name, #order))
            })
            .collect();
        let part_count = parts.len();
        let index_name = &index.name;
        let unique = index.unique;

        index_statics.extend(quote! {
            static #parts_ident: [::sluice::__internal::IndexColumn; #part_count] = [#(#parts),*];
        });
        indices.push(quote! {
            ::sluice::__internal::IndexModel::new(#index_name, #unique, &#parts_ident)
        });
    }
    let index_count = indices.len();

    // primary key
    let key_columns: Vec<&str> = table
        .key_fields()
        .iter()
        .map(|f| f.column.as_str())
        .collect();
    let auto_key = table.primary_key.auto_generate;
    let primary_key = if key_columns.is_empty() {
        quote!(::sluice::__internal::PrimaryKeyModel::NONE)
    } else {
        quote!(::sluice::__internal::PrimaryKeyModel::new(&[#(#key_columns),*], #auto_key))
    };

    quote! {
        static #columns_ident: [::sluice::__internal::ColumnModel; #column_count] = [#(#columns),*];

        #index_statics

        static #indices_ident: [::sluice::__internal::IndexModel; #index_count] = [#(#indices),*];

        pub static #table_ident: ::sluice::__internal::TableModel = ::sluice::__internal::TableModel::new(
            #name,
            &#columns_ident,
            #primary_key,
            &#indices_ident,
        );
    }
}

fn sql_type_tokens(sql_type: SqlType) -> TokenStream {
    let variant = format_ident!("{sql_type:?}");

    quote!(::sluice::__internal::SqlType::#variant)
}

/// Stable xxh3 hash of everything the generated table models declare.
#[must_use]
pub fn fingerprint(unit: &CompiledUnit) -> u64 {
    let mut canonical = String::new();

    for binding in &unit.tables {
        let table = &binding.table;
        canonical.push_str(&format!("table {}\n", table.name));

        for (field, binder) in binding.fields() {
            canonical.push_str(&format!(
                "  column {} {:?} nullable={} auto={} default={:?}\n",
                field.column,
                binder.sql_type(),
                field.nullable,
                field.auto_generate,
                field.default
            ));
        }

        canonical.push_str(&format!("  key {:?}\n", table.primary_key.fields));

        for index in &table.indices {
            let columns: Vec<String> = index
                .columns
                .iter()
                .map(|c| format!("{} {}", c.column, c.order))
                .collect();
            canonical.push_str(&format!(
                "  index {} unique={} ({})\n",
                index.name,
                index.unique,
                columns.join(", ")
            ));
        }
    }

    xxh3_64(canonical.as_bytes())
}
