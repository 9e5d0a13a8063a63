use serde::Serialize;

///
/// PrimaryKey
///
/// Field subset identifying a row. Empty when the table declares none.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct PrimaryKey {
    pub fields: Vec<String>,
    pub auto_generate: bool,
}

impl PrimaryKey {
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}
