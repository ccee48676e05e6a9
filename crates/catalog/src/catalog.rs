use std::collections::HashSet;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::book::Book;
use crate::error::CatalogError;
use crate::store::BookStore;

/// Number of recommendations returned when the caller does not ask for a
/// specific count.
pub const DEFAULT_RECOMMENDATIONS: usize = 3;

/// Partial update for [`Catalog::edit`]. Fields left as `None` (or holding
/// only whitespace) keep the book's current value.
#[derive(Debug, Clone, Default)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub publication_year: Option<i32>,
}

/// The catalog: an ordered collection of books, rewritten to the backing
/// store after every mutation.
///
/// Insertion order is the canonical listing order. The catalog has no
/// internal locking; callers serialize access (the HTTP layer wraps it in a
/// mutex, the CLI is single-threaded).
pub struct Catalog {
    books: Vec<Book>,
    store: Box<dyn BookStore>,
}

impl Catalog {
    /// Load the catalog from the backing store. Missing or unreadable
    /// stores yield an empty catalog; see [`crate::JsonFileStore`].
    pub fn load(store: Box<dyn BookStore>) -> Result<Self, CatalogError> {
        let books = store.load()?;
        Ok(Self { books, store })
    }

    /// All books in catalog order.
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn get(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|book| book.id == id)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Books currently out on loan, in catalog order.
    pub fn checked_out(&self) -> Vec<&Book> {
        self.books.iter().filter(|book| book.is_checked_out).collect()
    }

    /// Books currently on the shelf, in catalog order.
    pub fn available(&self) -> Vec<&Book> {
        self.books.iter().filter(|book| !book.is_checked_out).collect()
    }

    /// Create a book with a fresh id and empty checkout fields, append it,
    /// and rewrite the store. Title, author, and genre must be non-empty.
    pub fn add(
        &mut self,
        title: &str,
        author: &str,
        genre: &str,
        publication_year: i32,
    ) -> Result<Book, CatalogError> {
        for (field, value) in [("title", title), ("author", author), ("genre", genre)] {
            if value.trim().is_empty() {
                return Err(CatalogError::InvalidField { field });
            }
        }

        let book = Book::new(
            Uuid::new_v4().to_string(),
            title.to_string(),
            author.to_string(),
            genre.to_string(),
            publication_year,
        );
        self.books.push(book.clone());
        self.persist()?;
        Ok(book)
    }

    /// Overwrite the provided non-empty fields on the matching book and
    /// rewrite the store. Omitted or empty fields are left unchanged; an
    /// all-empty update is a data no-op (the store is still rewritten).
    pub fn edit(&mut self, id: &str, update: BookUpdate) -> Result<Book, CatalogError> {
        let book = self
            .books
            .iter_mut()
            .find(|book| book.id == id)
            .ok_or_else(|| CatalogError::NotFound { id: id.to_string() })?;

        if let Some(title) = non_empty(update.title) {
            book.title = title;
        }
        if let Some(author) = non_empty(update.author) {
            book.author = author;
        }
        if let Some(genre) = non_empty(update.genre) {
            book.genre = genre;
        }
        if let Some(year) = update.publication_year {
            book.publication_year = year;
        }

        let updated = book.clone();
        self.persist()?;
        Ok(updated)
    }

    /// Remove the matching book permanently and rewrite the store.
    pub fn delete(&mut self, id: &str) -> Result<(), CatalogError> {
        let index = self
            .books
            .iter()
            .position(|book| book.id == id)
            .ok_or_else(|| CatalogError::NotFound { id: id.to_string() })?;
        self.books.remove(index);
        self.persist()
    }

    /// Loan the book out to `borrower`. Rejected without state change when
    /// the book is unknown or already checked out.
    pub fn check_out(&mut self, id: &str, borrower: &str) -> Result<Book, CatalogError> {
        let book = self
            .books
            .iter_mut()
            .find(|book| book.id == id)
            .ok_or_else(|| CatalogError::NotFound { id: id.to_string() })?;
        if book.is_checked_out {
            return Err(CatalogError::AlreadyCheckedOut { id: id.to_string() });
        }

        book.is_checked_out = true;
        book.checked_out_by = Some(borrower.to_string());
        book.checked_out_date = Some(OffsetDateTime::now_utc());
        book.return_date = None;

        let updated = book.clone();
        self.persist()?;
        Ok(updated)
    }

    /// Return the book to the shelf. The borrower and checkout date stay on
    /// the record as history; only `return_date` marks the return. Rejected
    /// without state change when the book is unknown or not checked out.
    pub fn check_in(&mut self, id: &str) -> Result<Book, CatalogError> {
        let book = self
            .books
            .iter_mut()
            .find(|book| book.id == id)
            .ok_or_else(|| CatalogError::NotFound { id: id.to_string() })?;
        if !book.is_checked_out {
            return Err(CatalogError::NotCheckedOut { id: id.to_string() });
        }

        book.is_checked_out = false;
        book.return_date = Some(OffsetDateTime::now_utc());

        let updated = book.clone();
        self.persist()?;
        Ok(updated)
    }

    /// Case-insensitive substring search over title, author, genre, and the
    /// decimal text of the publication year, in catalog order. The empty
    /// query matches every book; short-circuiting it is the caller's call.
    pub fn search(&self, query: &str) -> Vec<&Book> {
        let needle = query.to_lowercase();
        self.books.iter().filter(|book| book.matches(&needle)).collect()
    }

    /// Recommend up to `count` books related to the given one, by tiered
    /// fallback: same genre with a different author first, then the same
    /// author, then anything else, each tier in catalog order. The target is
    /// never included, membership is decided by id, and an unknown id yields
    /// an empty list.
    pub fn recommend(&self, id: &str, count: usize) -> Vec<&Book> {
        let Some(target) = self.get(id) else {
            return Vec::new();
        };

        let mut picked: Vec<&Book> = Vec::with_capacity(count);
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(target.id.as_str());

        for book in &self.books {
            if picked.len() == count {
                break;
            }
            if !seen.contains(book.id.as_str())
                && book.genre == target.genre
                && book.author != target.author
            {
                seen.insert(book.id.as_str());
                picked.push(book);
            }
        }

        if picked.len() < count {
            for book in &self.books {
                if picked.len() == count {
                    break;
                }
                if !seen.contains(book.id.as_str()) && book.author == target.author {
                    seen.insert(book.id.as_str());
                    picked.push(book);
                }
            }
        }

        if picked.len() < count {
            for book in &self.books {
                if picked.len() == count {
                    break;
                }
                if !seen.contains(book.id.as_str()) {
                    seen.insert(book.id.as_str());
                    picked.push(book);
                }
            }
        }

        picked
    }

    fn persist(&self) -> Result<(), CatalogError> {
        self.store.save(&self.books)?;
        Ok(())
    }
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{JsonFileStore, MemoryStore};

    fn empty_catalog() -> Catalog {
        Catalog::load(Box::new(MemoryStore::default())).unwrap()
    }

    /// The stock sample records, in insertion order.
    fn sample_catalog() -> Catalog {
        let mut catalog = empty_catalog();
        catalog.add("To Kill a Mockingbird", "Harper Lee", "Fiction", 1960).unwrap();
        catalog.add("1984", "George Orwell", "Science Fiction", 1949).unwrap();
        catalog.add("Pride and Prejudice", "Jane Austen", "Romance", 1813).unwrap();
        catalog.add("The Great Gatsby", "F. Scott Fitzgerald", "Fiction", 1925).unwrap();
        catalog.add("Brave New World", "Aldous Huxley", "Science Fiction", 1932).unwrap();
        catalog
    }

    fn id_of(catalog: &Catalog, title: &str) -> String {
        catalog
            .books()
            .iter()
            .find(|book| book.title == title)
            .map(|book| book.id.clone())
            .unwrap()
    }

    #[test]
    fn add_then_get_returns_the_given_fields() {
        let mut catalog = empty_catalog();
        let added = catalog.add("Dune", "Frank Herbert", "Science Fiction", 1965).unwrap();

        let fetched = catalog.get(&added.id).unwrap();
        assert_eq!(fetched.title, "Dune");
        assert_eq!(fetched.author, "Frank Herbert");
        assert_eq!(fetched.genre, "Science Fiction");
        assert_eq!(fetched.publication_year, 1965);
        assert!(!fetched.is_checked_out);
        assert!(fetched.checked_out_by.is_none());
        assert!(fetched.checked_out_date.is_none());
        assert!(fetched.return_date.is_none());
    }

    #[test]
    fn add_assigns_unique_ids() {
        let mut catalog = empty_catalog();
        let first = catalog.add("Dune", "Frank Herbert", "Science Fiction", 1965).unwrap();
        let second = catalog.add("Dune", "Frank Herbert", "Science Fiction", 1965).unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn add_rejects_empty_required_fields() {
        let mut catalog = empty_catalog();
        assert!(matches!(
            catalog.add("  ", "Frank Herbert", "Science Fiction", 1965),
            Err(CatalogError::InvalidField { field: "title" })
        ));
        assert!(matches!(
            catalog.add("Dune", "", "Science Fiction", 1965),
            Err(CatalogError::InvalidField { field: "author" })
        ));
        assert!(catalog.is_empty());
    }

    #[test]
    fn edit_overwrites_only_provided_fields() {
        let mut catalog = sample_catalog();
        let id = id_of(&catalog, "1984");

        let updated = catalog
            .edit(
                &id,
                BookUpdate {
                    genre: Some("Dystopia".to_string()),
                    publication_year: Some(1950),
                    ..BookUpdate::default()
                },
            )
            .unwrap();

        assert_eq!(updated.title, "1984");
        assert_eq!(updated.author, "George Orwell");
        assert_eq!(updated.genre, "Dystopia");
        assert_eq!(updated.publication_year, 1950);
    }

    #[test]
    fn edit_with_empty_update_is_a_data_noop() {
        let mut catalog = sample_catalog();
        let id = id_of(&catalog, "1984");
        let before = catalog.get(&id).unwrap().clone();

        let update = BookUpdate {
            title: Some("   ".to_string()),
            ..BookUpdate::default()
        };
        let after = catalog.edit(&id, update).unwrap();

        assert_eq!(after, before);
        assert_eq!(after.id, id);
    }

    #[test]
    fn edit_unknown_id_is_not_found() {
        let mut catalog = sample_catalog();
        assert!(matches!(
            catalog.edit("missing", BookUpdate::default()),
            Err(CatalogError::NotFound { .. })
        ));
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let mut catalog = sample_catalog();
        let id = id_of(&catalog, "1984");

        catalog.delete(&id).unwrap();
        assert!(catalog.get(&id).is_none());
        assert!(matches!(
            catalog.delete(&id),
            Err(CatalogError::NotFound { .. })
        ));
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn check_out_sets_loan_fields_and_clears_return_date() {
        let mut catalog = sample_catalog();
        let id = id_of(&catalog, "1984");

        let book = catalog.check_out(&id, "casey").unwrap();
        assert!(book.is_checked_out);
        assert_eq!(book.checked_out_by.as_deref(), Some("casey"));
        assert!(book.checked_out_date.is_some());
        assert!(book.return_date.is_none());
    }

    #[test]
    fn double_check_out_is_rejected_without_state_change() {
        let mut catalog = sample_catalog();
        let id = id_of(&catalog, "1984");

        catalog.check_out(&id, "casey").unwrap();
        let before = catalog.get(&id).unwrap().clone();

        assert!(matches!(
            catalog.check_out(&id, "robin"),
            Err(CatalogError::AlreadyCheckedOut { .. })
        ));
        assert_eq!(catalog.get(&id).unwrap(), &before);
    }

    #[test]
    fn check_in_keeps_borrower_history() {
        let mut catalog = sample_catalog();
        let id = id_of(&catalog, "1984");

        catalog.check_out(&id, "casey").unwrap();
        let book = catalog.check_in(&id).unwrap();

        assert!(!book.is_checked_out);
        assert_eq!(book.checked_out_by.as_deref(), Some("casey"));
        assert!(book.checked_out_date.is_some());
        assert!(book.return_date.is_some());
    }

    #[test]
    fn check_in_on_available_book_is_rejected() {
        let mut catalog = sample_catalog();
        let id = id_of(&catalog, "1984");
        assert!(matches!(
            catalog.check_in(&id),
            Err(CatalogError::NotCheckedOut { .. })
        ));
    }

    #[test]
    fn check_out_unknown_id_is_not_found() {
        let mut catalog = sample_catalog();
        assert!(matches!(
            catalog.check_out("missing", "casey"),
            Err(CatalogError::NotFound { .. })
        ));
    }

    #[test]
    fn checked_out_and_available_views_partition_the_catalog() {
        let mut catalog = sample_catalog();
        let id = id_of(&catalog, "1984");
        catalog.check_out(&id, "casey").unwrap();

        let out: Vec<_> = catalog.checked_out().iter().map(|b| b.title.clone()).collect();
        assert_eq!(out, vec!["1984"]);
        assert_eq!(catalog.available().len(), 4);
    }

    #[test]
    fn search_is_case_insensitive_substring_match() {
        let catalog = sample_catalog();
        let titles: Vec<_> = catalog
            .search("fiction")
            .iter()
            .map(|book| book.title.as_str())
            .collect();
        // "Science Fiction" and "Fiction" genres both contain the needle.
        assert_eq!(
            titles,
            vec!["To Kill a Mockingbird", "1984", "The Great Gatsby", "Brave New World"]
        );
    }

    #[test]
    fn search_matches_the_year_text() {
        let catalog = sample_catalog();
        let titles: Vec<_> = catalog
            .search("1813")
            .iter()
            .map(|book| book.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Pride and Prejudice"]);
    }

    #[test]
    fn search_returns_catalog_order() {
        let catalog = sample_catalog();
        let titles: Vec<_> = catalog
            .search("e")
            .iter()
            .map(|book| book.title.as_str())
            .collect();
        assert_eq!(
            titles,
            vec![
                "To Kill a Mockingbird",
                "1984",
                "Pride and Prejudice",
                "The Great Gatsby",
                "Brave New World",
            ]
        );
    }

    #[test]
    fn recommend_prefers_same_genre_different_author() {
        let catalog = sample_catalog();
        let id = id_of(&catalog, "1984");

        let titles: Vec<_> = catalog
            .recommend(&id, 3)
            .iter()
            .map(|book| book.title.as_str())
            .collect();
        // One same-genre match (Brave New World), no same-author books, then
        // the remaining catalog in order until the count is reached.
        assert_eq!(
            titles,
            vec!["Brave New World", "To Kill a Mockingbird", "Pride and Prejudice"]
        );
    }

    #[test]
    fn recommend_never_includes_the_target() {
        let catalog = sample_catalog();
        let id = id_of(&catalog, "The Great Gatsby");
        let picked = catalog.recommend(&id, 10);
        assert!(picked.iter().all(|book| book.id != id));
        assert_eq!(picked.len(), 4);
    }

    #[test]
    fn recommend_falls_back_to_same_author() {
        let mut catalog = empty_catalog();
        catalog.add("Foundation", "Isaac Asimov", "Science Fiction", 1951).unwrap();
        catalog.add("I, Robot", "Isaac Asimov", "Robots", 1950).unwrap();
        let id = id_of(&catalog, "Foundation");

        let titles: Vec<_> = catalog
            .recommend(&id, 3)
            .iter()
            .map(|book| book.title.as_str())
            .collect();
        assert_eq!(titles, vec!["I, Robot"]);
    }

    #[test]
    fn recommend_caps_at_count() {
        let catalog = sample_catalog();
        let id = id_of(&catalog, "1984");
        assert_eq!(catalog.recommend(&id, 2).len(), 2);
    }

    #[test]
    fn recommend_unknown_id_is_empty() {
        let catalog = sample_catalog();
        assert!(catalog.recommend("missing", 3).is_empty());
    }

    #[test]
    fn mutations_rewrite_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.json");
        let mut on_disk = Catalog::load(Box::new(JsonFileStore::new(&path))).unwrap();
        let book = on_disk.add("Dune", "Frank Herbert", "Science Fiction", 1965).unwrap();
        on_disk.check_out(&book.id, "casey").unwrap();

        let reopened = Catalog::load(Box::new(JsonFileStore::new(&path))).unwrap();
        assert_eq!(reopened.len(), 1);
        let loaded = reopened.get(&book.id).unwrap();
        assert!(loaded.is_checked_out);
        assert_eq!(loaded.checked_out_by.as_deref(), Some("casey"));
    }

    #[test]
    fn failed_save_surfaces_as_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let mut catalog =
            Catalog::load(Box::new(JsonFileStore::new(blocker.join("library.json")))).unwrap();
        assert!(matches!(
            catalog.add("Dune", "Frank Herbert", "Science Fiction", 1965),
            Err(CatalogError::Store(_))
        ));
    }
}
