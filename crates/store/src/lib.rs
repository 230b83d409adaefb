//! Document storage for rooms, bookings and reviews
//!
//! Documents are schemaless JSON objects grouped in collections. The
//! [`DocumentStore`] trait is what the HTTP layer depends on; [`SqliteStore`]
//! keeps them in a single SQLite table.

mod collection;
mod error;
mod filter;
mod sqlite;

use async_trait::async_trait;

pub use collection::{Collection, DeleteResult, Document, InsertOneResult, UpdateResult, ID_FIELD};
pub use error::StoreError;
pub use filter::{Condition, Filter, Order, Sort};
pub use sqlite::SqliteStore;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents matching `filter`, in insertion order unless `sort` is given
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<Sort>,
    ) -> Result<Vec<Document>, StoreError>;

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError>;

    /// Store `document` under a freshly generated `_id`
    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertOneResult, StoreError>;

    /// Merge the top-level fields of `set` into the first matching document.
    /// Never creates a document; `_id` is left untouched.
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        set: Document,
    ) -> Result<UpdateResult, StoreError>;

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<DeleteResult, StoreError>;

    /// Round-trip to the backend, used by readiness checks
    async fn ping(&self) -> Result<(), StoreError>;
}
