//! Module: binder
//! Responsibility: resolve declared value types to column read/write
//! strategies and render the runtime calls for each.
//! Does not own: the runtime conversions themselves (`sluice_core::column`).
//!
//! Invariants:
//! - Exactly one binder per scalar type; resolution never guesses.
//! - Resolution order is primitive, nullable primitive, converter.
//! - The registry is immutable once compilation starts.


use crate::{error::CompileError, ty};
use proc_macro2::TokenStream;
use quote::quote;
use sluice_core::model::SqlType;
use sluice_schema::source::ConverterRecord;
use std::collections::HashMap;
use syn::{Path, Type};

macro_rules! primitive_kinds {
    ($( ($ty:ty, $kind:ident, $sql:ident, [$($name:literal),*], $default:expr) ),* $(,)?) => {
        ///
        /// PrimitiveKind
        /// One entry per scalar in the shared registry.
        ///

        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum PrimitiveKind {
            $( $kind, )*
        }

        impl PrimitiveKind {
            pub const ALL: &'static [Self] = &[ $( Self::$kind, )* ];

            #[must_use]
            pub const fn sql_type(self) -> SqlType {
                match self {
                    $( Self::$kind => SqlType::$sql, )*
                }
            }

            #[must_use]
            pub const fn names(self) -> &'static [&'static str] {
                match self {
                    $( Self::$kind => &[$($name),*], )*
                }
            }

            /// The owned Rust type values of this kind read as.
            #[must_use]
            pub fn rust_type(self) -> TokenStream {
                match self {
                    $( Self::$kind => quote!($ty), )*
                }
            }
        }
    };
}

sluice_core::scalar_registry_entries!(primitive_kinds);

impl PrimitiveKind {
    /// Look up by canonical type name, or by bare final path segment.
    #[must_use]
    pub fn from_type(ty: &Type) -> Option<Self> {
        let stripped = ty::strip_reference(ty);
        let canonical = ty::canonical(stripped);

        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.names().contains(&canonical.as_str()))
            .or_else(|| {
                let ident = ty::last_ident(stripped)?;
                let bare = matches!(stripped, Type::Path(p) if p.path.segments.last().is_some_and(|s| s.arguments.is_empty()));
                if !bare {
                    return None;
                }

                Self::ALL
                    .iter()
                    .copied()
                    .find(|kind| kind.names().contains(&ident.as_str()))
            })
    }
}

///
/// Converter
/// User conversion through a storage primitive.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Converter {
    pub ty: String,
    pub storage: PrimitiveKind,
    pub to: Path,
    pub from: Path,
}

///
/// Binder
///

#[derive(Clone, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum Binder {
    Converter(Converter),
    Nullable(PrimitiveKind),
    Primitive(PrimitiveKind),
}

impl Binder {
    /// Storage class of the column this binder writes.
    #[must_use]
    pub const fn sql_type(&self) -> SqlType {
        match self {
            Self::Converter(c) => c.storage.sql_type(),
            Self::Nullable(kind) | Self::Primitive(kind) => kind.sql_type(),
        }
    }

    /// Bind `value` (an expression of type `&T`) at `index`.
    #[must_use]
    pub fn write_tokens(&self, stmt: &TokenStream, index: &TokenStream, value: &TokenStream) -> TokenStream {
        match self {
            Self::Primitive(_) => quote! {
                ::sluice::__internal::column::write(#stmt, #index, #value)?;
            },
            Self::Nullable(_) => quote! {
                ::sluice::__internal::column::write_nullable(#stmt, #index, #value)?;
            },
            Self::Converter(c) => {
                let to = &c.to;
                quote! {
                    ::sluice::__internal::column::write(#stmt, #index, &#to(#value))?;
                }
            }
        }
    }

    /// Read the current row at `index` (an `isize` expression).
    ///
    /// `nullable` selects a direct `Option` read for nullable columns.
    #[must_use]
    pub fn read_tokens(&self, rows: &TokenStream, index: &TokenStream, nullable: bool) -> TokenStream {
        match self {
            Self::Primitive(kind) => {
                let ty = kind.rust_type();
                quote!(::sluice::__internal::column::read::<_, #ty>(#rows, #index)?)
            }
            Self::Nullable(kind) => {
                let ty = kind.rust_type();
                quote!(::sluice::__internal::column::read_nullable::<_, #ty>(#rows, #index, #nullable)?)
            }
            Self::Converter(c) => {
                let from = &c.from;
                let ty = c.storage.rust_type();
                quote!(#from(::sluice::__internal::column::read::<_, #ty>(#rows, #index)?))
            }
        }
    }
}

///
/// BinderRegistry
///
/// Primitive binders are fixed; converters are registered once from the
/// descriptor source before any method is compiled.
///

#[derive(Debug, Default)]
pub struct BinderRegistry {
    converters: Vec<Converter>,
    by_type: HashMap<String, usize>,
}

impl BinderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from converter records, reporting every bad record.
    pub fn from_records(records: &[ConverterRecord]) -> Result<Self, Vec<CompileError>> {
        let mut registry = Self::new();
        let errors: Vec<_> = records
            .iter()
            .filter_map(|record| registry.register(record).err())
            .collect();

        if errors.is_empty() {
            Ok(registry)
        } else {
            Err(errors)
        }
    }

    pub fn register(&mut self, record: &ConverterRecord) -> Result<(), CompileError> {
        let route = format!("converters.{}", record.ty);
        let invalid = |ty: &str| CompileError::InvalidType {
            route: route.clone(),
            ty: ty.to_string(),
        };

        let ty = ty::parse(&record.ty).ok_or_else(|| invalid(&record.ty))?;
        let key = ty::canonical(ty::strip_reference(&ty));

        if PrimitiveKind::from_type(&ty).is_some() || self.by_type.contains_key(&key) {
            return Err(CompileError::DuplicateConverter {
                route: route.clone(),
                ty: key,
            });
        }

        let storage_ty = ty::parse(&record.storage).ok_or_else(|| invalid(&record.storage))?;
        let storage = PrimitiveKind::from_type(&storage_ty).ok_or_else(|| CompileError::NoBinderFound {
            route: route.clone(),
            ty: record.storage.clone(),
        })?;

        let to = syn::parse_str::<Path>(&record.to).map_err(|_| invalid(&record.to))?;
        let from = syn::parse_str::<Path>(&record.from).map_err(|_| invalid(&record.from))?;

        self.by_type.insert(key.clone(), self.converters.len());
        self.converters.push(Converter {
            ty: key,
            storage,
            to,
            from,
        });

        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Resolve the binder for a scalar type.
    pub fn resolve(&self, ty: &Type, route: &str) -> Result<Binder, CompileError> {
        if let Some(kind) = PrimitiveKind::from_type(ty) {
            return Ok(Binder::Primitive(kind));
        }

        if let Some(inner) = ty::option_inner(ty)
            && let Some(kind) = PrimitiveKind::from_type(inner)
        {
            return Ok(Binder::Nullable(kind));
        }

        if let Some(converter) = self.converter(ty) {
            return Ok(Binder::Converter(converter.clone()));
        }

        Err(CompileError::NoBinderFound {
            route: route.to_string(),
            ty: ty::canonical(ty),
        })
    }

    fn converter(&self, ty: &Type) -> Option<&Converter> {
        let stripped = ty::strip_reference(ty);
        let key = ty::canonical(stripped);

        if let Some(index) = self.by_type.get(&key) {
            return self.converters.get(*index);
        }

        // a bare name matches a registered path when exactly one ends with it
        let ident = ty::last_ident(stripped)?;
        if key != ident {
            return None;
        }
        let mut matches = self
            .converters
            .iter()
            .filter(|c| c.ty.rsplit("::").next() == Some(ident.as_str()));

        match (matches.next(), matches.next()) {
            (Some(converter), None) => Some(converter),
            _ => None,
        }
    }
}
