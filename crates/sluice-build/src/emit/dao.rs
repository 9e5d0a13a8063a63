//! Module: emit::dao
//! Responsibility: one implementation struct per declared Dao trait.
//! Does not own: method analysis (see `method`).
//!
//! Invariants:
//! - Structurally identical operations within a Dao share one handler field.
//! - Bind indices follow placeholder order, then column declaration order.
//! - Sequence entity writes run inside a transaction.

use crate::{
    binder::Binder,
    emit::shared::{SharedKey, SharingTable},
    method::{
        CompiledUnit, DaoSpec, MethodSpec, Multiplicity, Operation, ParamTarget, ParameterBinding,
        ReturnShape, TableBinding, WriteShape,
    },
};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use sluice_core::{
    model::ConflictStrategy,
    shared::{Segment, SqlTemplate},
};
use sluice_schema::node::Field;
use syn::{Ident, Path};

/// Implementation struct name for a Dao.
pub(super) fn impl_ident(dao: &DaoSpec) -> Ident {
    format_ident!("{}Impl", dao.name)
}

/// The implementation struct, its constructor and the trait impl.
pub(super) fn generate(unit: &CompiledUnit, dao: &DaoSpec) -> TokenStream {
    let ident = impl_ident(dao);
    let trait_path = &dao.path;
    let mut sharing = SharingTable::new();

    let methods: Vec<TokenStream> = dao
        .methods
        .iter()
        .map(|method| MethodEmitter::new(unit, method, &mut sharing).emit())
        .collect();

    let field_idents: Vec<&Ident> = sharing.fields().iter().map(|f| &f.ident).collect();
    let field_types: Vec<&TokenStream> = sharing.fields().iter().map(|f| &f.ty).collect();
    let field_inits: Vec<&TokenStream> = sharing.fields().iter().map(|f| &f.init).collect();

    let doc = format!(" Generated implementation of `{}`.", dao.name);

    quote! {
        #[doc = #doc]
        pub struct #ident<D: ::sluice::Driver> {
            __db: ::std::sync::Arc<::sluice::Database<D>>,
            #( #field_idents: #field_types, )*
        }

        impl<D: ::sluice::Driver> #ident<D> {
            #[must_use]
            pub fn new(db: &::std::sync::Arc<::sluice::Database<D>>) -> Self {
                Self {
                    __db: ::std::sync::Arc::clone(db),
                    #( #field_idents: #field_inits, )*
                }
            }

            #[must_use]
            pub const fn database(&self) -> &::std::sync::Arc<::sluice::Database<D>> {
                &self.__db
            }
        }

        impl<D: ::sluice::Driver> #trait_path for #ident<D> {
            #( #methods )*
        }
    }
}

///
/// MethodEmitter
///

struct MethodEmitter<'a> {
    unit: &'a CompiledUnit,
    spec: &'a MethodSpec,
    sharing: &'a mut SharingTable,
}

impl<'a> MethodEmitter<'a> {
    const fn new(unit: &'a CompiledUnit, spec: &'a MethodSpec, sharing: &'a mut SharingTable) -> Self {
        Self { unit, spec, sharing }
    }

    fn emit(mut self) -> TokenStream {
        let spec = self.spec;
        let name = &spec.name;
        let params = spec.params.iter().map(|p| {
            let (name, ty) = (&p.name, &p.ty);
            quote!(#name: #ty)
        });
        let returns = return_type(&spec.returns);

        let body = match &spec.operation {
            Operation::Insert { table, conflict } => self.insert(table, *conflict),
            Operation::Update(WriteShape::Entity { table, conflict }) => self.update(table, *conflict),
            Operation::Delete(WriteShape::Entity { table, .. }) => self.delete(table),
            Operation::Update(WriteShape::Sql(template, sql))
            | Operation::Delete(WriteShape::Sql(template, sql))
            | Operation::Query { template, sql } => self.query(template, sql),
            Operation::Transaction { delegate } => self.transaction(delegate),
        };

        quote! {
            fn #name(&self, #(#params),*) -> ::std::result::Result<#returns, ::sluice::DataAccessError> {
                #body
            }
        }
    }

    // ---------------------------------------------------------------------
    // Entity writes
    // ---------------------------------------------------------------------

    fn insert(&mut self, table: &str, conflict: ConflictStrategy) -> TokenStream {
        let Some(binding) = self.unit.table(table) else {
            return missing_table(table);
        };
        let columns = column_names(&binding.table.insert_fields());
        let strategy = conflict_tokens(conflict);

        let field = self.sharing.intern(
            SharedKey::Insert {
                table: table.to_string(),
                conflict,
            },
            statement_type,
            || {
                statement_init(&quote! {
                    ::sluice::__internal::Dialect::insert(db.dialect(), #table, &[#(#columns),*], #strategy)
                })
            },
        );

        let writes = entity_writes(binding, &binding.table.insert_fields(), 0);
        self.entity_write(&field, &writes)
    }

    fn update(&mut self, table: &str, conflict: ConflictStrategy) -> TokenStream {
        let Some(binding) = self.unit.table(table) else {
            return missing_table(table);
        };
        let all: Vec<&Field> = binding.table.fields.iter().collect();
        let predicate = binding.table.predicate_fields();
        let columns = column_names(&all);
        let keys = column_names(&predicate);
        let strategy = conflict_tokens(conflict);

        let field = self.sharing.intern(
            SharedKey::Update {
                table: table.to_string(),
                conflict,
            },
            statement_type,
            || {
                statement_init(&quote! {
                    ::sluice::__internal::Dialect::update(
                        db.dialect(), #table, #strategy, &[#(#columns),*], &[#(#keys),*],
                    )
                })
            },
        );

        let mut writes = entity_writes(binding, &all, 0);
        writes.extend(entity_writes(binding, &predicate, all.len()));
        self.entity_write(&field, &writes)
    }

    fn delete(&mut self, table: &str) -> TokenStream {
        let Some(binding) = self.unit.table(table) else {
            return missing_table(table);
        };
        let predicate = binding.table.predicate_fields();
        let keys = column_names(&predicate);

        let field = self.sharing.intern(
            SharedKey::Delete {
                table: table.to_string(),
            },
            statement_type,
            || {
                statement_init(&quote! {
                    ::sluice::__internal::Dialect::delete(db.dialect(), #table, &[#(#keys),*])
                })
            },
        );

        let writes = entity_writes(binding, &predicate, 0);
        self.entity_write(&field, &writes)
    }

    /// Run `writes` once per entity on the shared statement `field`.
    fn entity_write(&self, field: &Ident, writes: &TokenStream) -> TokenStream {
        let Some(param) = self.spec.params.first() else {
            return quote!(::std::unreachable!());
        };
        let entity = &param.name;
        let execute = quote!(::sluice::__internal::Statement::execute_update(__stmt)?);
        let key = quote!(::sluice::__internal::column::require_generated_key(&*__stmt)?);

        if !param.multiplicity {
            let transactional = self.spec.transactional;
            let result = match &self.spec.returns {
                ReturnShape::RowCount => quote!(Ok(#execute)),
                ReturnShape::GeneratedKey => quote! {
                    #execute;
                    Ok(#key)
                },
                _ => quote! {
                    #execute;
                    Ok(())
                },
            };

            return quote! {
                let __e = &#entity;
                self.#field.run(#transactional, |__stmt| {
                    #writes
                    #result
                })
            };
        }

        let (init, step, result) = match &self.spec.returns {
            ReturnShape::RowCount => (
                quote!(let mut __count: u64 = 0;),
                quote!(__count += #execute;),
                quote!(Ok(__count)),
            ),
            ReturnShape::GeneratedKeys => (
                quote!(let mut __keys = ::std::vec::Vec::new();),
                quote! {
                    #execute;
                    __keys.push(#key);
                },
                quote!(Ok(__keys)),
            ),
            _ => (quote!(), quote!(#execute;), quote!(Ok(()))),
        };

        quote! {
            self.#field.run(true, |__stmt| {
                #init
                for __e in #entity.iter() {
                    ::sluice::__internal::Statement::clear_bindings(__stmt);
                    #writes
                    #step
                }
                #result
            })
        }
    }

    // ---------------------------------------------------------------------
    // Templated SQL
    // ---------------------------------------------------------------------

    fn query(&mut self, template: &SqlTemplate, sql: &str) -> TokenStream {
        let params = &self.spec.params;
        let segments = template.segments().iter().map(|segment| match segment {
            Segment::Text(text) => quote!(::sluice::__internal::Segment::Text(#text.to_string())),
            Segment::Arg(arg) => quote!(::sluice::__internal::Segment::Arg(#arg)),
        });
        let arity = template.arity();

        let field = self.sharing.intern(
            SharedKey::Query {
                sql: sql.to_string(),
                params: params.iter().map(|p| p.name.to_string()).collect(),
            },
            || quote!(::sluice::__internal::QueryHandler<D>),
            || {
                quote! {
                    ::sluice::__internal::QueryHandler::new(
                        ::std::sync::Arc::clone(db),
                        ::sluice::__internal::SqlTemplate::from_segments(::std::vec![#(#segments),*], #arity),
                    )
                }
            },
        );

        // Phase 1: per-argument marker counts
        let counts = params.iter().map(|p| {
            let name = &p.name;
            if p.multiplicity {
                quote!(#name.len())
            } else {
                quote!(1usize)
            }
        });

        // Phase 2: binds in placeholder order
        let order: Vec<usize> = template.placeholder_order().collect();
        let binds = if order.is_empty() {
            quote!()
        } else {
            let binds = order.iter().filter_map(|&arg| params.get(arg)).map(bind_param);
            quote! {
                let mut __cursor = ::sluice::__internal::column::ArgCursor::new();
                #( #binds )*
            }
        };
        let unused = params
            .iter()
            .enumerate()
            .filter(|(i, _)| !order.contains(i))
            .map(|(_, p)| {
                let name = &p.name;
                quote!(let _ = &#name;)
            });

        // Phase 3: result extraction
        let result = self.query_result();
        let transactional = self.spec.transactional;

        quote! {
            #( #unused )*
            let __counts: &[usize] = &[#(#counts),*];
            self.#field.run(__counts, #transactional, |__stmt| {
                #binds
                #result
            })
        }
    }

    fn query_result(&self) -> TokenStream {
        let execute_update = quote!(::sluice::__internal::Statement::execute_update(__stmt)?);
        let route = self.spec.route();

        let (read, multiplicity, prelude) = match &self.spec.returns {
            ReturnShape::RowCount => return quote!(Ok(#execute_update)),
            ReturnShape::Scalar {
                binder,
                multiplicity,
                ..
            } => {
                let nullable = matches!(binder, Binder::Nullable(_));
                let read = binder.read_tokens(&quote!(&__rows), &quote!(1), nullable);
                (read, *multiplicity, quote!())
            }
            ReturnShape::Entity {
                ty,
                table,
                multiplicity,
            } => {
                let Some(binding) = self.unit.table(table) else {
                    return missing_table(table);
                };
                let (prelude, read) = entity_read(binding, ty);
                (read, *multiplicity, prelude)
            }
            _ => {
                return quote! {
                    #execute_update;
                    Ok(())
                };
            }
        };

        let next = quote!(::sluice::__internal::Rows::next_row(&mut __rows)?);
        let collect = match multiplicity {
            Multiplicity::One => quote! {
                if !#next {
                    return Err(::sluice::DataAccessError::no_rows(#route));
                }
                Ok(#read)
            },
            Multiplicity::Optional => quote! {
                if #next {
                    Ok(Some(#read))
                } else {
                    Ok(None)
                }
            },
            Multiplicity::List => quote! {
                let mut __out = ::std::vec::Vec::new();
                while #next {
                    __out.push(#read);
                }
                Ok(__out)
            },
        };

        quote! {
            let mut __rows = ::sluice::__internal::Statement::execute_query(__stmt)?;
            #prelude
            #collect
        }
    }

    // ---------------------------------------------------------------------
    // Transactions
    // ---------------------------------------------------------------------

    fn transaction(&mut self, delegate: &Path) -> TokenStream {
        let field = self.sharing.intern(
            SharedKey::TransactionConnection,
            || quote!(::sluice::__internal::SharedConnection<D>),
            || quote!(::sluice::__internal::SharedConnection::new(::std::sync::Arc::clone(db))),
        );
        let args = self.spec.params.iter().map(|p| &p.name);

        quote! {
            self.#field.run(true, |_| #delegate(self, #(#args),*))
        }
    }
}

fn bind_param(param: &ParameterBinding) -> TokenStream {
    let ParamTarget::Scalar(binder) = &param.target else {
        return quote!();
    };
    let name = &param.name;
    let stmt = quote!(__stmt);
    let index = quote!(__cursor.advance());

    if param.multiplicity {
        let write = binder.write_tokens(&stmt, &index, &quote!(__v));
        quote! {
            for __v in #name.iter() {
                #write
            }
        }
    } else if param.by_reference() {
        binder.write_tokens(&stmt, &index, &quote!(#name))
    } else {
        binder.write_tokens(&stmt, &index, &quote!(&#name))
    }
}

/// Column index lookups plus the struct expression reading one row.
fn entity_read(binding: &TableBinding, ty: &syn::Type) -> (TokenStream, TokenStream) {
    let mut prelude = quote!();
    let mut fields = Vec::new();

    for (field, binder) in binding.fields() {
        let ident = format_ident!("{}", field.name);
        let index = format_ident!("__c_{}", field.name);
        let column = &field.column;

        prelude.extend(quote! {
            let #index = ::sluice::__internal::column::column_index(&__rows, #column);
        });

        let read = binder.read_tokens(&quote!(&__rows), &quote!(#index), field.nullable);
        fields.push(quote!(#ident: #read));
    }

    (prelude, quote!(#ty { #(#fields),* }))
}

/// Binds for `fields` of the entity `__e`, starting after `offset`.
fn entity_writes(binding: &TableBinding, fields: &[&Field], offset: usize) -> TokenStream {
    let mut writes = quote!();

    for (i, field) in fields.iter().enumerate() {
        let Some(binder) = binding.binder(&field.name) else {
            continue;
        };
        let ident = format_ident!("{}", field.name);
        let index = offset + i + 1;

        writes.extend(binder.write_tokens(&quote!(__stmt), &quote!(#index), &quote!(&__e.#ident)));
    }

    writes
}

fn column_names<'f>(fields: &[&'f Field]) -> Vec<&'f str> {
    fields.iter().map(|f| f.column.as_str()).collect()
}

fn statement_type() -> TokenStream {
    quote!(::sluice::__internal::SharedStatement<D>)
}

fn statement_init(sql: &TokenStream) -> TokenStream {
    quote!(::sluice::__internal::SharedStatement::new(::std::sync::Arc::clone(db), #sql))
}

fn conflict_tokens(conflict: ConflictStrategy) -> TokenStream {
    let variant = format_ident!("{conflict:?}");

    quote!(::sluice::__internal::ConflictStrategy::#variant)
}

fn missing_table(table: &str) -> TokenStream {
    let message = format!("table '{table}' is not part of this unit");

    quote!(::std::compile_error!(#message))
}

fn return_type(shape: &ReturnShape) -> TokenStream {
    match shape {
        ReturnShape::Unit => quote!(()),
        ReturnShape::RowCount => quote!(u64),
        ReturnShape::GeneratedKey => quote!(i64),
        ReturnShape::GeneratedKeys => quote!(::std::vec::Vec<i64>),
        ReturnShape::Scalar { ty, multiplicity, .. } | ReturnShape::Entity { ty, multiplicity, .. } => {
            match multiplicity {
                Multiplicity::One => quote!(#ty),
                Multiplicity::Optional => quote!(::std::option::Option<#ty>),
                Multiplicity::List => quote!(::std::vec::Vec<#ty>),
            }
        }
        ReturnShape::Delegated(ty) => quote!(#ty),
    }
}
