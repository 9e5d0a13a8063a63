//! Declared-type analysis shared by binder resolution and method compilation.

use quote::ToTokens;
use syn::{GenericArgument, PathArguments, Type};

/// Parse a declared type string.
pub fn parse(ty: &str) -> Option<Type> {
    syn::parse_str(ty).ok()
}

/// Whitespace-free rendering used as a lookup key.
#[must_use]
pub fn canonical(ty: &Type) -> String {
    ty.to_token_stream()
        .to_string()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Strip references, parentheses and invisible groups.
#[must_use]
pub fn strip_reference(mut ty: &Type) -> &Type {
    loop {
        ty = match ty {
            Type::Reference(r) => &r.elem,
            Type::Paren(p) => &p.elem,
            Type::Group(g) => &g.elem,
            _ => return ty,
        };
    }
}

#[must_use]
pub const fn is_reference(ty: &Type) -> bool {
    matches!(ty, Type::Reference(_))
}

/// Final path segment name when `ty` is a plain path.
#[must_use]
pub fn last_ident(ty: &Type) -> Option<String> {
    match strip_reference(ty) {
        Type::Path(p) if p.qself.is_none() => p.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    }
}

/// The single type argument of `Wrapper<T>` when the final segment is `name`.
///
/// `Some(None)` means the wrapper matched but its argument is missing or
/// not a concrete type.
#[must_use]
pub fn wrapped<'a>(ty: &'a Type, name: &str) -> Option<Option<&'a Type>> {
    let Type::Path(p) = strip_reference(ty) else {
        return None;
    };
    let segment = p.path.segments.last()?;
    if segment.ident != name {
        return None;
    }

    Some(single_type_arg(&segment.arguments))
}

fn single_type_arg(arguments: &PathArguments) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = arguments else {
        return None;
    };

    let mut types = args.args.iter().filter_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    });

    match (types.next(), types.next()) {
        (Some(Type::Infer(_)), None) | (None, _) | (Some(_), Some(_)) => None,
        (Some(ty), None) => Some(ty),
    }
}

/// Inner type of `Option<T>`.
#[must_use]
pub fn option_inner(ty: &Type) -> Option<&Type> {
    wrapped(ty, "Option").flatten()
}

/// Byte buffers bind as one blob rather than a sequence of bytes.
#[must_use]
pub fn is_blob(ty: &Type) -> bool {
    let canonical = canonical(strip_reference(ty));
    canonical == "Vec<u8>" || canonical == "[u8]"
}

///
/// Sequence
///

#[derive(Debug, Eq, PartialEq)]
pub enum Sequence<'a> {
    Scalar,
    Elements(&'a Type),
    Unbound,
}

/// Classify a parameter type by multiplicity.
///
/// `forced` applies sequence treatment to any single-argument generic,
/// such as a set type the compiler cannot otherwise see through.
#[must_use]
pub fn sequence(ty: &Type, forced: bool) -> Sequence<'_> {
    if is_blob(ty) && !forced {
        return Sequence::Scalar;
    }

    match strip_reference(ty) {
        Type::Slice(s) => return element(&s.elem),
        Type::Array(a) => return element(&a.elem),
        _ => {}
    }

    if let Some(inner) = wrapped(ty, "Vec") {
        return inner.map_or(Sequence::Unbound, element);
    }

    if !forced {
        return Sequence::Scalar;
    }

    match strip_reference(ty) {
        Type::Path(p) => p
            .path
            .segments
            .last()
            .and_then(|s| single_type_arg(&s.arguments))
            .map_or(Sequence::Unbound, element),
        _ => Sequence::Unbound,
    }
}

fn element(ty: &Type) -> Sequence<'_> {
    match ty {
        Type::Infer(_) | Type::ImplTrait(_) | Type::TraitObject(_) => Sequence::Unbound,
        ty => Sequence::Elements(ty),
    }
}
