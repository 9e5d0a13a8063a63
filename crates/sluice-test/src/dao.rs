use crate::model::{Author, Book, Isbn};
use sluice::DataAccessError;

///
/// AuthorDao
///

pub trait AuthorDao {
    fn insert(&self, author: &Author) -> Result<i64, DataAccessError>;

    fn insert_or_ignore(&self, author: &Author) -> Result<u64, DataAccessError>;

    fn all(&self) -> Result<Vec<Author>, DataAccessError>;
}

///
/// BookDao
///

pub trait BookDao {
    fn insert(&self, book: &Book) -> Result<i64, DataAccessError>;

    fn insert_all(&self, books: &[Book]) -> Result<Vec<i64>, DataAccessError>;

    fn update(&self, book: &Book) -> Result<u64, DataAccessError>;

    fn delete(&self, book: &Book) -> Result<(), DataAccessError>;

    fn by_id(&self, id: i64) -> Result<Book, DataAccessError>;

    fn by_isbn(&self, isbn: &Isbn) -> Result<Option<Book>, DataAccessError>;

    fn by_ids(&self, ids: &[i64]) -> Result<Vec<Book>, DataAccessError>;

    fn titles_by_author(&self, author_id: i64) -> Result<Vec<String>, DataAccessError>;

    fn count(&self) -> Result<i64, DataAccessError>;

    fn rating_of(&self, id: i64) -> Result<Option<f64>, DataAccessError>;

    fn retitle(&self, id: i64, title: &str) -> Result<u64, DataAccessError>;

    fn delete_by_author(&self, author_id: i64) -> Result<u64, DataAccessError>;

    fn replace_title(&self, book: &Book, title: &str) -> Result<Book, DataAccessError>;
}

/// Rewrite a book's title and read it back.
pub fn replace_title(dao: &impl BookDao, book: &Book, title: &str) -> Result<Book, DataAccessError> {
    let updated = Book {
        title: title.to_string(),
        ..book.clone()
    };
    dao.update(&updated)?;

    dao.by_id(book.id)
}
