use serde::Deserialize;

use libris_catalog::BookUpdate;

/// Request model for creating a new book.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub publication_year: i32,
}

/// Request model for partially updating a book. Fields that are missing or
/// empty leave the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub publication_year: Option<i32>,
}

impl From<UpdateBook> for BookUpdate {
    fn from(update: UpdateBook) -> Self {
        BookUpdate {
            title: update.title,
            author: update.author,
            genre: update.genre,
            publication_year: update.publication_year,
        }
    }
}

/// Request model for checking a book out.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub borrower: String,
}

/// Query parameters for search.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub query: Option<String>,
}

/// Query parameters for recommendations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecommendParams {
    pub count: Option<usize>,
}
