use serde::Serialize;

///
/// Field
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub column: String,

    /// Declared Rust type, as written in the descriptor.
    pub ty: String,

    pub nullable: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    pub auto_generate: bool,
}

impl Field {
    /// The declared type with any `Option<..>` wrapper removed.
    #[must_use]
    pub fn value_type(&self) -> &str {
        strip_option(&self.ty).unwrap_or(&self.ty)
    }
}

/// Inner type of `Option<T>` (or `std::option::Option<T>`), if wrapped.
#[must_use]
pub fn strip_option(ty: &str) -> Option<&str> {
    let ty = ty.trim();
    let inner = ty
        .strip_prefix("Option<")
        .or_else(|| ty.strip_prefix("std::option::Option<"))
        .or_else(|| ty.strip_prefix("::std::option::Option<"))?;

    inner.strip_suffix('>').map(str::trim)
}
