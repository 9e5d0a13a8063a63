//! Module: method
//! Responsibility: compile declared Dao methods into `MethodSpec` IR.
//! Does not own: token emission (see `emit`).
//!
//! Invariants:
//! - Every method carries exactly one operation annotation.
//! - Every placeholder names a parameter; every bound type has one binder.
//! - Errors are collected per unit, never short-circuited across methods.

mod returns;


pub use returns::{Multiplicity, ReturnShape};

use crate::{
    binder::{Binder, BinderRegistry},
    error::{CompileError, CompileErrors},
    ty::{self, Sequence},
};
use sluice_core::{model::ConflictStrategy, shared::SqlTemplate};
use sluice_schema::{
    node::{Database, Field, Schema, Table},
    source::{Annotation, DaoRecord, DescriptorSource, MethodRecord, OnConflict, ParamRecord},
};
use convert_case::{Case, Casing};
use std::collections::BTreeSet;
use syn::{Ident, Path, Type};

///
/// ParameterBinding
///

#[derive(Clone, Debug)]
pub struct ParameterBinding {
    pub name: Ident,
    pub ty: Type,
    pub multiplicity: bool,
    pub target: ParamTarget,
}

impl ParameterBinding {
    /// Whether the declared type already is a reference.
    #[must_use]
    pub const fn by_reference(&self) -> bool {
        ty::is_reference(&self.ty)
    }
}

///
/// ParamTarget
/// What a parameter binds through.
///

#[derive(Clone, Debug)]
pub enum ParamTarget {
    /// Whole-entity parameter of an insert, update or delete.
    Entity(String),

    Scalar(Binder),

    /// Passed through to a transaction delegate untouched.
    Unbound,
}

///
/// WriteShape
///

#[derive(Clone, Debug)]
pub enum WriteShape {
    /// SQL derived from the entity's table.
    Entity {
        table: String,
        conflict: ConflictStrategy,
    },

    /// Literal SQL, run like a query returning a row count.
    Sql(SqlTemplate, String),
}

///
/// Operation
///

#[derive(Clone, Debug)]
#[remain::sorted]
pub enum Operation {
    Delete(WriteShape),
    Insert {
        table: String,
        conflict: ConflictStrategy,
    },
    Query {
        template: SqlTemplate,
        sql: String,
    },
    Transaction {
        delegate: Path,
    },
    Update(WriteShape),
}

///
/// MethodSpec
///

#[derive(Clone, Debug)]
pub struct MethodSpec {
    pub dao: String,
    pub name: Ident,
    pub params: Vec<ParameterBinding>,
    pub returns: ReturnShape,
    pub transactional: bool,
    pub operation: Operation,
}

impl MethodSpec {
    /// `Dao::method`, the route named in errors.
    #[must_use]
    pub fn route(&self) -> String {
        format!("{}::{}", self.dao, self.name)
    }
}

///
/// DaoSpec
///

#[derive(Clone, Debug)]
pub struct DaoSpec {
    pub name: String,
    pub path: Path,
    pub methods: Vec<MethodSpec>,
}

///
/// TableBinding
/// A validated table with the binder of every field.
///

#[derive(Clone, Debug)]
pub struct TableBinding {
    pub table: Table,
    pub binders: Vec<Binder>,
}

impl TableBinding {
    pub fn fields(&self) -> impl Iterator<Item = (&Field, &Binder)> {
        self.table.fields.iter().zip(&self.binders)
    }

    #[must_use]
    pub fn binder(&self, field: &str) -> Option<&Binder> {
        self.fields().find(|(f, _)| f.name == field).map(|(_, b)| b)
    }
}

///
/// CompiledUnit
/// Everything one descriptor source compiles to.
///

#[derive(Clone, Debug)]
pub struct CompiledUnit {
    pub database: Option<Database>,
    pub tables: Vec<TableBinding>,
    pub daos: Vec<DaoSpec>,
}

impl CompiledUnit {
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableBinding> {
        self.tables.iter().find(|t| t.table.name == name)
    }
}

/// Compile a validated schema plus the source's Dao declarations.
pub fn compile_unit(source: &impl DescriptorSource, schema: &Schema) -> Result<CompiledUnit, CompileErrors> {
    let mut errors = CompileErrors::new();

    // Phase 1: converters
    let registry = match BinderRegistry::from_records(source.converters()) {
        Ok(registry) => registry,
        Err(errs) => {
            for err in errs {
                errors.push(err);
            }
            BinderRegistry::new()
        }
    };

    // Phase 2: table field binders
    let tables = schema
        .tables
        .iter()
        .filter_map(|table| errors.collect(bind_table(&registry, table)))
        .collect();

    // Phase 3: generated item names
    if let Some(database) = &schema.database {
        errors.collect(check_database(database));
    }
    let mut dao_names = BTreeSet::new();
    for dao in source.daos() {
        if !dao_names.insert(dao.name.as_str()) {
            errors.push(CompileError::DuplicateDao {
                route: dao.name.clone(),
                name: dao.name.clone(),
            });
        }
    }

    // Phase 4: methods
    let compiler = MethodCompiler {
        registry: &registry,
        schema,
    };
    let daos = source
        .daos()
        .iter()
        .map(|dao| compiler.compile_dao(dao, &mut errors))
        .collect();

    errors.result(CompiledUnit {
        database: schema.database.clone(),
        tables,
        daos,
    })
}

/// The wrapper struct is named by the last path segment, or by the
/// database name in Pascal case with a `Database` suffix.
fn check_database(database: &Database) -> Result<(), CompileError> {
    let invalid = |ty: &str| CompileError::InvalidType {
        route: database.name.clone(),
        ty: ty.to_string(),
    };

    match &database.path {
        Some(path) => match syn::parse_str::<Path>(path) {
            Ok(parsed) if parsed.segments.last().is_some_and(|s| s.arguments.is_empty()) => Ok(()),
            _ => Err(invalid(path)),
        },
        None => {
            let ident = format!("{}Database", database.name.to_case(Case::Pascal));
            syn::parse_str::<Ident>(&ident).map(|_| ()).map_err(|_| invalid(&ident))
        }
    }
}

fn bind_table(registry: &BinderRegistry, table: &Table) -> Result<TableBinding, CompileError> {
    let binders = table
        .fields
        .iter()
        .map(|field| {
            let route = format!("{}.{}", table.name, field.name);
            let ty = ty::parse(&field.ty).ok_or_else(|| CompileError::InvalidType {
                route: route.clone(),
                ty: field.ty.clone(),
            })?;

            registry.resolve(&ty, &route)
        })
        .collect::<Result<_, _>>()?;

    Ok(TableBinding {
        table: table.clone(),
        binders,
    })
}

///
/// MethodCompiler
///

pub struct MethodCompiler<'a> {
    pub registry: &'a BinderRegistry,
    pub schema: &'a Schema,
}

impl MethodCompiler<'_> {
    fn compile_dao(&self, dao: &DaoRecord, errors: &mut CompileErrors) -> DaoSpec {
        // The name becomes `<Name>Impl` and, snake cased, a database accessor.
        let accessor = dao.name.to_case(Case::Snake);
        for name in [dao.name.as_str(), accessor.as_str()] {
            if syn::parse_str::<Ident>(name).is_err() {
                errors.push(CompileError::InvalidType {
                    route: dao.name.clone(),
                    ty: name.to_string(),
                });
                break;
            }
        }

        let path = syn::parse_str::<Path>(&dao.path).unwrap_or_else(|_| {
            errors.push(CompileError::InvalidType {
                route: dao.name.clone(),
                ty: dao.path.clone(),
            });
            syn::parse_quote!(InvalidDaoPath)
        });

        let methods = dao
            .methods
            .iter()
            .filter_map(|method| {
                self.compile(&dao.name, method)
                    .map_err(|errs| {
                        for err in errs {
                            errors.push(err);
                        }
                    })
                    .ok()
            })
            .collect();

        DaoSpec {
            name: dao.name.clone(),
            path,
            methods,
        }
    }

    /// Compile one method, reporting every problem found in it.
    pub fn compile(&self, dao: &str, method: &MethodRecord) -> Result<MethodSpec, CompileErrors> {
        let route = format!("{dao}::{}", method.name);
        let mut errors = CompileErrors::new();

        let name = errors.collect(syn::parse_str::<Ident>(&method.name).map_err(|_| {
            CompileError::InvalidType {
                route: route.clone(),
                ty: method.name.clone(),
            }
        }));

        // Phase 1: exactly one operation annotation
        let annotation = match method.annotations.as_slice() {
            [annotation] => Some(annotation),
            other => {
                let found = if other.is_empty() {
                    "none".to_string()
                } else {
                    other.iter().map(Annotation::kind).collect::<Vec<_>>().join(", ")
                };
                errors.push(CompileError::ConflictingMethodAnnotation {
                    route: route.clone(),
                    found,
                });
                None
            }
        };

        let Some(annotation) = annotation else {
            return Err(errors);
        };

        // Phase 2: parameters
        let params = self.bind_params(&route, annotation, &method.params, &mut errors);

        // Phase 3: operation shape
        let operation = errors.collect(self.operation(&route, annotation, method, &params));

        // Phase 4: return shape
        let returns = operation.as_ref().and_then(|operation| {
            errors.collect(returns::resolve(
                self,
                &route,
                operation,
                &params,
                method.returns.as_deref(),
            ))
        });

        match (name, operation, returns) {
            (Some(name), Some(operation), Some(returns)) if errors.is_empty() => Ok(MethodSpec {
                dao: dao.to_string(),
                name,
                params,
                returns,
                transactional: method.transactional,
                operation,
            }),
            _ => Err(errors),
        }
    }

    fn bind_params(
        &self,
        route: &str,
        annotation: &Annotation,
        records: &[ParamRecord],
        errors: &mut CompileErrors,
    ) -> Vec<ParameterBinding> {
        let mut seen = BTreeSet::new();

        records
            .iter()
            .filter_map(|record| {
                let invalid = |reason: &str| CompileError::InvalidParameter {
                    route: route.to_string(),
                    param: record.name.clone(),
                    reason: reason.to_string(),
                };

                if record.name.starts_with("__") {
                    errors.push(invalid("names starting with '__' are reserved"));
                    return None;
                }
                if !seen.insert(record.name.as_str()) {
                    errors.push(invalid("declared more than once"));
                    return None;
                }
                let Ok(name) = syn::parse_str::<Ident>(&record.name) else {
                    errors.push(invalid("not an identifier"));
                    return None;
                };
                let Some(ty) = ty::parse(&record.ty) else {
                    errors.push(CompileError::InvalidType {
                        route: route.to_string(),
                        ty: record.ty.clone(),
                    });
                    return None;
                };

                errors.collect(self.bind_param(route, annotation, record, name, ty))
            })
            .collect()
    }

    fn bind_param(
        &self,
        route: &str,
        annotation: &Annotation,
        record: &ParamRecord,
        name: Ident,
        ty: Type,
    ) -> Result<ParameterBinding, CompileError> {
        if matches!(annotation, Annotation::Transaction { .. }) {
            return Ok(ParameterBinding {
                name,
                ty,
                multiplicity: false,
                target: ParamTarget::Unbound,
            });
        }

        let (element, multiplicity) = match ty::sequence(&ty, record.sequence) {
            Sequence::Scalar => (&ty, false),
            Sequence::Elements(element) => (element, true),
            Sequence::Unbound => {
                return Err(CompileError::UnboundGenericType {
                    route: route.to_string(),
                    param: record.name.clone(),
                });
            }
        };

        let entity_write = match annotation {
            Annotation::Insert { .. } => true,
            Annotation::Update { sql, .. } | Annotation::Delete { sql } => sql.is_none(),
            _ => false,
        };

        let target = if entity_write {
            let table = self
                .table_for(element)
                .ok_or_else(|| CompileError::UnknownEntity {
                    route: route.to_string(),
                    ty: ty::canonical(element),
                })?;
            ParamTarget::Entity(table.name.clone())
        } else {
            ParamTarget::Scalar(self.registry.resolve(element, route)?)
        };

        Ok(ParameterBinding {
            name,
            ty,
            multiplicity,
            target,
        })
    }

    fn operation(
        &self,
        route: &str,
        annotation: &Annotation,
        method: &MethodRecord,
        params: &[ParameterBinding],
    ) -> Result<Operation, CompileError> {
        match annotation {
            Annotation::Insert { on_conflict } => {
                let table = entity_param(route, params)?;
                Ok(Operation::Insert {
                    table,
                    conflict: conflict(on_conflict.unwrap_or_default()),
                })
            }
            Annotation::Update { on_conflict, sql } => {
                let shape = match sql {
                    Some(sql) => self.write_template(route, sql, method)?,
                    None => WriteShape::Entity {
                        table: entity_param(route, params)?,
                        conflict: conflict(on_conflict.unwrap_or_default()),
                    },
                };
                Ok(Operation::Update(shape))
            }
            Annotation::Delete { sql } => {
                let shape = match sql {
                    Some(sql) => self.write_template(route, sql, method)?,
                    None => WriteShape::Entity {
                        table: entity_param(route, params)?,
                        conflict: ConflictStrategy::None,
                    },
                };
                Ok(Operation::Delete(shape))
            }
            Annotation::Query { sql } => {
                let template = self.template(route, sql, method)?;
                Ok(Operation::Query {
                    template,
                    sql: sql.trim().to_string(),
                })
            }
            Annotation::Transaction { delegate } => {
                let delegate =
                    syn::parse_str::<Path>(delegate).map_err(|_| CompileError::InvalidType {
                        route: route.to_string(),
                        ty: delegate.clone(),
                    })?;
                Ok(Operation::Transaction { delegate })
            }
        }
    }

    fn write_template(&self, route: &str, sql: &str, method: &MethodRecord) -> Result<WriteShape, CompileError> {
        let template = self.template(route, sql, method)?;

        Ok(WriteShape::Sql(template, sql.trim().to_string()))
    }

    fn template(&self, route: &str, sql: &str, method: &MethodRecord) -> Result<SqlTemplate, CompileError> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(CompileError::EmptySql {
                route: route.to_string(),
            });
        }

        let names: Vec<&str> = method.params.iter().map(|p| p.name.as_str()).collect();
        let template = SqlTemplate::parse(sql, &names).map_err(|err| match err {
            sluice_core::shared::TemplateError::UnresolvedPlaceholder { name } => {
                CompileError::UnresolvedPlaceholder {
                    route: route.to_string(),
                    name,
                }
            }
        })?;

        let used: BTreeSet<usize> = template.placeholder_order().collect();
        for (i, param) in method.params.iter().enumerate() {
            if !used.contains(&i) {
                tracing::warn!(route, param = %param.name, "parameter is not referenced by the SQL");
            }
        }

        Ok(template)
    }

    /// The table mapped onto a type, if any.
    pub(crate) fn table_for(&self, ty: &Type) -> Option<&Table> {
        let stripped = ty::strip_reference(ty);
        self.schema.table_for_type(&ty::canonical(stripped))
    }
}

/// The single entity parameter of an entity write.
fn entity_param(route: &str, params: &[ParameterBinding]) -> Result<String, CompileError> {
    match params {
        [
            ParameterBinding {
                target: ParamTarget::Entity(table),
                ..
            },
        ] => Ok(table.clone()),
        [] => Err(CompileError::InvalidParameter {
            route: route.to_string(),
            param: String::new(),
            reason: "entity writes take exactly one entity parameter, found none".to_string(),
        }),
        [_, extra, ..] => Err(CompileError::InvalidParameter {
            route: route.to_string(),
            param: extra.name.to_string(),
            reason: "entity writes take exactly one entity parameter".to_string(),
        }),
        [other] => Err(CompileError::InvalidParameter {
            route: route.to_string(),
            param: other.name.to_string(),
            reason: "expected an entity".to_string(),
        }),
    }
}

const fn conflict(on_conflict: OnConflict) -> ConflictStrategy {
    match on_conflict {
        OnConflict::Abort => ConflictStrategy::Abort,
        OnConflict::Fail => ConflictStrategy::Fail,
        OnConflict::Ignore => ConflictStrategy::Ignore,
        OnConflict::None => ConflictStrategy::None,
        OnConflict::Replace => ConflictStrategy::Replace,
        OnConflict::Rollback => ConflictStrategy::Rollback,
    }
}
