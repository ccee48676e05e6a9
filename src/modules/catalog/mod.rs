pub mod models;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use tokio::sync::Mutex;

use libris_catalog::Catalog;
use libris_kernel::settings::{AuthSettings, Settings};
use libris_kernel::{InitCtx, Module};

/// Catalog handle shared between HTTP handlers. The core has no internal
/// locking (single-writer model), so this mutex is the caller-side
/// serialization it requires.
pub type SharedCatalog = Arc<Mutex<Catalog>>;

/// Stock records seeded into a brand-new library.
pub(crate) const SAMPLE_BOOKS: [(&str, &str, &str, i32); 5] = [
    ("To Kill a Mockingbird", "Harper Lee", "Fiction", 1960),
    ("1984", "George Orwell", "Science Fiction", 1949),
    ("Pride and Prejudice", "Jane Austen", "Romance", 1813),
    ("The Great Gatsby", "F. Scott Fitzgerald", "Fiction", 1925),
    ("Brave New World", "Aldous Huxley", "Science Fiction", 1932),
];

/// Catalog module: owns the shared catalog handle and exposes the JSON API.
pub struct CatalogModule {
    catalog: SharedCatalog,
    auth: AuthSettings,
    seed_samples: bool,
}

#[async_trait]
impl Module for CatalogModule {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let mut catalog = self.catalog.lock().await;
        if self.seed_samples && catalog.is_empty() {
            for (title, author, genre, year) in SAMPLE_BOOKS {
                catalog.add(title, author, genre, year)?;
            }
            tracing::info!(
                count = SAMPLE_BOOKS.len(),
                "seeded sample books into the empty catalog"
            );
        }

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books = catalog.len(),
            "catalog module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.catalog.clone(), self.auth.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books in catalog order",
                        "tags": ["Catalog"],
                        "responses": {
                            "200": {
                                "description": "List of books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": {
                                                "$ref": "#/components/schemas/Book"
                                            }
                                        }
                                    }
                                }
                            },
                            "401": {
                                "description": "Login required",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Add a book (admin)",
                        "tags": ["Catalog"],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "$ref": "#/components/schemas/CreateBook"
                                    }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Created book",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/Book"
                                        }
                                    }
                                }
                            },
                            "403": {
                                "description": "Administrator role required",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            },
                            "422": {
                                "description": "Validation error",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/search": {
                    "get": {
                        "summary": "Search title, author, genre, and year text",
                        "tags": ["Catalog"],
                        "parameters": [
                            {
                                "name": "query",
                                "in": "query",
                                "schema": {
                                    "type": "string"
                                }
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "Matching books in catalog order",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": {
                                                "$ref": "#/components/schemas/Book"
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/checked-out": {
                    "get": {
                        "summary": "List books currently out on loan",
                        "tags": ["Catalog"],
                        "responses": {
                            "200": {
                                "description": "Checked-out books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": {
                                                "$ref": "#/components/schemas/Book"
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/available": {
                    "get": {
                        "summary": "List books currently on the shelf",
                        "tags": ["Catalog"],
                        "responses": {
                            "200": {
                                "description": "Available books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": {
                                                "$ref": "#/components/schemas/Book"
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Catalog health check",
                        "tags": ["Catalog"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": {
                                    "text/plain": {
                                        "schema": {
                                            "type": "string"
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Fetch a book by id",
                        "tags": ["Catalog"],
                        "responses": {
                            "200": {
                                "description": "The book",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/Book"
                                        }
                                    }
                                }
                            },
                            "404": {
                                "description": "Book not found",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "patch": {
                        "summary": "Update the provided fields of a book (admin)",
                        "tags": ["Catalog"],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "$ref": "#/components/schemas/UpdateBook"
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Updated book",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/Book"
                                        }
                                    }
                                }
                            },
                            "404": {
                                "description": "Book not found",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "delete": {
                        "summary": "Delete a book (admin)",
                        "tags": ["Catalog"],
                        "responses": {
                            "204": {
                                "description": "Deleted"
                            },
                            "404": {
                                "description": "Book not found",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{id}/checkout": {
                    "post": {
                        "summary": "Check a book out to a borrower",
                        "tags": ["Catalog"],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "$ref": "#/components/schemas/CheckoutRequest"
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "The checked-out book",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/Book"
                                        }
                                    }
                                }
                            },
                            "409": {
                                "description": "Book is already checked out",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{id}/checkin": {
                    "post": {
                        "summary": "Return a checked-out book",
                        "tags": ["Catalog"],
                        "responses": {
                            "200": {
                                "description": "The returned book",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/Book"
                                        }
                                    }
                                }
                            },
                            "409": {
                                "description": "Book is not checked out",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{id}/recommendations": {
                    "get": {
                        "summary": "Recommend related books",
                        "tags": ["Catalog"],
                        "parameters": [
                            {
                                "name": "count",
                                "in": "query",
                                "schema": {
                                    "type": "integer",
                                    "default": 3
                                }
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "Related books, same genre first",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": {
                                                "$ref": "#/components/schemas/Book"
                                            }
                                        }
                                    }
                                }
                            },
                            "404": {
                                "description": "Book not found",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "type": "string",
                                "description": "Unique identifier for the book"
                            },
                            "title": {
                                "type": "string"
                            },
                            "author": {
                                "type": "string"
                            },
                            "genre": {
                                "type": "string"
                            },
                            "publication_year": {
                                "type": "integer"
                            },
                            "is_checked_out": {
                                "type": "boolean"
                            },
                            "checked_out_by": {
                                "type": "string",
                                "nullable": true
                            },
                            "checked_out_date": {
                                "type": "string",
                                "format": "date-time",
                                "nullable": true
                            },
                            "return_date": {
                                "type": "string",
                                "format": "date-time",
                                "nullable": true
                            }
                        },
                        "required": ["id", "title", "author", "genre", "publication_year", "is_checked_out"]
                    },
                    "CreateBook": {
                        "type": "object",
                        "properties": {
                            "title": {
                                "type": "string"
                            },
                            "author": {
                                "type": "string"
                            },
                            "genre": {
                                "type": "string"
                            },
                            "publication_year": {
                                "type": "integer"
                            }
                        },
                        "required": ["title", "author", "genre", "publication_year"]
                    },
                    "UpdateBook": {
                        "type": "object",
                        "properties": {
                            "title": {
                                "type": "string"
                            },
                            "author": {
                                "type": "string"
                            },
                            "genre": {
                                "type": "string"
                            },
                            "publication_year": {
                                "type": "integer"
                            }
                        }
                    },
                    "CheckoutRequest": {
                        "type": "object",
                        "properties": {
                            "borrower": {
                                "type": "string"
                            }
                        },
                        "required": ["borrower"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "catalog module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "catalog module stopped");
        Ok(())
    }
}

/// Create a new instance of the catalog module
pub fn create_module(catalog: SharedCatalog, settings: &Settings) -> Arc<dyn Module> {
    Arc::new(CatalogModule {
        catalog,
        auth: settings.auth.clone(),
        seed_samples: settings.storage.seed_samples,
    })
}
