///
/// Author
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Author {
    pub id: i64,
    pub name: String,
}

///
/// Book
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Book {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub isbn: Isbn,
    pub rating: Option<f64>,
}

///
/// Isbn
/// Stored as text through a converter.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Isbn(pub String);

#[must_use]
pub fn isbn_to_sql(isbn: &Isbn) -> String {
    isbn.0.clone()
}

#[must_use]
pub fn isbn_from_sql(value: String) -> Isbn {
    Isbn(value)
}
