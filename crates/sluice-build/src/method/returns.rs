use crate::{
    binder::Binder,
    error::CompileError,
    method::{MethodCompiler, Operation, ParameterBinding},
    ty,
};
use syn::Type;

///
/// Multiplicity
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Multiplicity {
    /// Exactly one row; none is a not-found error.
    One,
    /// At most one row.
    Optional,
    List,
}

///
/// ReturnShape
///

#[derive(Clone, Debug)]
pub enum ReturnShape {
    Unit,

    /// `u64` rows affected.
    RowCount,

    /// `i64` key of a single insert.
    GeneratedKey,

    /// `Vec<i64>` keys of a sequence insert, in input order.
    GeneratedKeys,

    Scalar {
        ty: Type,
        binder: Binder,
        multiplicity: Multiplicity,
    },

    Entity {
        ty: Type,
        table: String,
        multiplicity: Multiplicity,
    },

    /// Whatever a transaction delegate returns.
    Delegated(Type),
}

/// Resolve the declared return type against the operation.
pub(super) fn resolve(
    compiler: &MethodCompiler<'_>,
    route: &str,
    operation: &Operation,
    params: &[ParameterBinding],
    declared: Option<&str>,
) -> Result<ReturnShape, CompileError> {
    let declared = declared.map(str::trim).filter(|d| !d.is_empty()).unwrap_or("()");
    let ty = ty::parse(declared).ok_or_else(|| CompileError::InvalidType {
        route: route.to_string(),
        ty: declared.to_string(),
    })?;
    let canonical = ty::canonical(&ty);
    let invalid = |reason: &str| CompileError::InvalidReturn {
        route: route.to_string(),
        ty: canonical.clone(),
        reason: reason.to_string(),
    };

    match operation {
        Operation::Transaction { .. } => Ok(ReturnShape::Delegated(ty)),

        Operation::Insert { .. } => {
            let sequence = params.iter().any(|p| p.multiplicity);
            match (canonical.as_str(), sequence) {
                ("()", _) => Ok(ReturnShape::Unit),
                ("u64", _) => Ok(ReturnShape::RowCount),
                ("i64", false) => Ok(ReturnShape::GeneratedKey),
                ("Vec<i64>", true) => Ok(ReturnShape::GeneratedKeys),
                ("i64", true) => Err(invalid("a sequence insert returns Vec<i64>")),
                ("Vec<i64>", false) => Err(invalid("a single insert returns i64")),
                _ => Err(invalid("inserts return (), u64, i64 or Vec<i64>")),
            }
        }

        Operation::Update(_) | Operation::Delete(_) => match canonical.as_str() {
            "()" => Ok(ReturnShape::Unit),
            "u64" => Ok(ReturnShape::RowCount),
            _ => Err(invalid("updates and deletes return () or u64")),
        },

        Operation::Query { .. } => match canonical.as_str() {
            "()" => Ok(ReturnShape::Unit),
            "u64" => Ok(ReturnShape::RowCount),
            _ => query_shape(compiler, route, ty),
        },
    }
}

fn query_shape(compiler: &MethodCompiler<'_>, route: &str, ty: Type) -> Result<ReturnShape, CompileError> {
    // blobs are scalar even though they look like sequences
    let (element, multiplicity) = if let Some(inner) = ty::option_inner(&ty) {
        (inner.clone(), Multiplicity::Optional)
    } else if let Some(Some(inner)) = ty::wrapped(&ty, "Vec").filter(|_| !ty::is_blob(&ty)) {
        (inner.clone(), Multiplicity::List)
    } else {
        (ty.clone(), Multiplicity::One)
    };

    if ty::is_reference(&element) {
        return Err(CompileError::InvalidReturn {
            route: route.to_string(),
            ty: ty::canonical(&ty),
            reason: "query results are owned".to_string(),
        });
    }

    if let Some(table) = compiler.table_for(&element) {
        return Ok(ReturnShape::Entity {
            ty: element,
            table: table.name.clone(),
            multiplicity,
        });
    }

    let binder = compiler.registry.resolve(&element, route)?;

    Ok(ReturnShape::Scalar {
        ty: element,
        binder,
        multiplicity,
    })
}
