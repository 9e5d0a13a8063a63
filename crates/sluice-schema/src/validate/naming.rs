use crate::{MAX_IDENT_LEN, MAX_INDEX_NAME_LEN, err, error::ErrorTree, node::Schema};
use std::collections::BTreeMap;

/// Non-empty ASCII identifier of bounded length.
pub fn validate_ident(ident: &str, what: &str, errs: &mut ErrorTree) {
    if ident.is_empty() {
        err!(errs, "{what} name is empty");
        return;
    }

    if ident.len() > MAX_IDENT_LEN {
        err!(errs, "{what} name '{ident}' exceeds {MAX_IDENT_LEN} bytes");
    }

    let mut chars = ident.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid {
        err!(errs, "{what} name '{ident}' is not an ASCII identifier");
    }
}

/// Words a field name cannot take, since it becomes a Rust struct field.
const RUST_KEYWORDS: [&str; 52] = [
    "Self", "_", "abstract", "as", "async", "await", "become", "box", "break", "const",
    "continue", "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for",
    "gen", "if", "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override",
    "priv", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "try",
    "type", "typeof", "unsafe", "unsized", "use", "virtual", "where", "while",
];

/// An ASCII identifier that is also usable as a plain Rust identifier.
pub fn validate_rust_ident(ident: &str, what: &str, errs: &mut ErrorTree) {
    validate_ident(ident, what, errs);

    if RUST_KEYWORDS.contains(&ident) {
        err!(errs, "{what} name '{ident}' is a Rust keyword");
    }
}

/// Index names share one namespace across the whole database.
pub fn validate_index_naming(schema: &Schema, errs: &mut ErrorTree) {
    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();

    for table in &schema.tables {
        for index in &table.indices {
            if index.name.len() > MAX_INDEX_NAME_LEN {
                err!(errs, "index name '{}' exceeds {MAX_INDEX_NAME_LEN} bytes", index.name);
            }

            if let Some(prev) = seen.insert(&index.name, &table.name) {
                err!(
                    errs,
                    "duplicate index name '{}' on tables '{prev}' and '{}'",
                    index.name,
                    table.name
                );
            }
        }
    }
}
