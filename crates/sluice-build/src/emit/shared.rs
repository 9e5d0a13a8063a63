use proc_macro2::{Ident, Span, TokenStream};
use sluice_core::model::ConflictStrategy;
use std::collections::{BTreeMap, BTreeSet, HashMap};

///
/// SharedKey
///
/// Structural identity of a shared handler field. Methods whose keys are
/// equal share one field.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum SharedKey {
    Delete {
        table: String,
    },
    Insert {
        table: String,
        conflict: ConflictStrategy,
    },
    /// Literal SQL together with the parameter names it was parsed against.
    Query {
        sql: String,
        params: Vec<String>,
    },
    TransactionConnection,
    Update {
        table: String,
        conflict: ConflictStrategy,
    },
}

impl SharedKey {
    fn base_name(&self) -> String {
        match self {
            Self::Delete { table } => format!("__delete_{table}"),
            Self::Insert { table, .. } => format!("__insert_{table}"),
            Self::Query { .. } => "__query".to_string(),
            Self::TransactionConnection => "__transaction_connection".to_string(),
            Self::Update { table, .. } => format!("__update_{table}"),
        }
    }
}

///
/// SharedField
///

#[derive(Clone, Debug)]
pub struct SharedField {
    pub ident: Ident,
    pub key: SharedKey,

    /// Field type, generic over `D`.
    pub ty: TokenStream,

    /// Initializer, evaluated inside `new` with `db` in scope.
    pub init: TokenStream,
}

///
/// NameAllocator
///
/// Hands out `base`, then `base_1`, `base_2`, ... per base name, skipping
/// any candidate already issued or reserved.
///

#[derive(Debug, Default)]
pub struct NameAllocator {
    next: BTreeMap<String, usize>,
    issued: BTreeSet<String>,
}

impl NameAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as taken without handing it out.
    pub fn reserve(&mut self, name: &str) {
        self.issued.insert(name.to_string());
    }

    /// Allocate a free name as a `String`.
    pub fn allocate_name(&mut self, base: &str) -> String {
        let counter = self.next.entry(base.to_string()).or_insert(0);

        loop {
            let candidate = if *counter == 0 {
                base.to_string()
            } else {
                format!("{base}_{counter}")
            };
            *counter += 1;

            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    pub fn allocate(&mut self, base: &str) -> Ident {
        Ident::new(&self.allocate_name(base), Span::call_site())
    }
}

///
/// SharingTable
///
/// Arena of shared fields plus a key index into it. Field order is
/// first-use order, so output is deterministic.
///

#[derive(Debug, Default)]
pub struct SharingTable {
    fields: Vec<SharedField>,
    index: HashMap<SharedKey, usize>,
    names: NameAllocator,
}

impl SharingTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The field for `key`, created on first request.
    pub fn intern(
        &mut self,
        key: SharedKey,
        ty: impl FnOnce() -> TokenStream,
        init: impl FnOnce() -> TokenStream,
    ) -> Ident {
        if let Some(&slot) = self.index.get(&key) {
            return self.fields[slot].ident.clone();
        }

        let ident = self.names.allocate(&key.base_name());
        self.index.insert(key.clone(), self.fields.len());
        self.fields.push(SharedField {
            ident: ident.clone(),
            key,
            ty: ty(),
            init: init(),
        });

        ident
    }

    #[must_use]
    pub fn fields(&self) -> &[SharedField] {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
