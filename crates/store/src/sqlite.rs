use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use ulid::Ulid;

use crate::{
    Collection, Condition, DeleteResult, Document, DocumentStore, Filter, ID_FIELD,
    InsertOneResult, Order, Sort, StoreError, UpdateResult,
};

/// Documents kept as JSON text in one `documents` table keyed by collection and id
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open a pool with WAL journaling and a busy timeout on every connection
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        tracing::info!(max_connections, "Created document store pool");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<Sort>,
    ) -> Result<Vec<Document>, StoreError> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT body FROM documents");
        push_where(&mut query, collection, filter);

        match sort {
            Some(sort) => {
                let direction = match sort.order {
                    Order::Asc => ") ASC",
                    Order::Desc => ") DESC",
                };
                query
                    .push(" ORDER BY json_extract(body, ")
                    .push_bind(json_path(sort.field))
                    .push(direction)
                    .push(", rowid");
            }
            None => {
                query.push(" ORDER BY rowid");
            }
        }

        let bodies = query
            .build_query_scalar::<String>()
            .fetch_all(&self.pool)
            .await?;

        bodies.iter().map(|body| parse_document(body)).collect()
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT body FROM documents");
        push_where(&mut query, collection, filter);
        query.push(" ORDER BY rowid LIMIT 1");

        let body = query
            .build_query_scalar::<String>()
            .fetch_optional(&self.pool)
            .await?;

        body.as_deref().map(parse_document).transpose()
    }

    async fn insert_one(
        &self,
        collection: Collection,
        mut document: Document,
    ) -> Result<InsertOneResult, StoreError> {
        let id = Ulid::new().to_string();
        document.insert(ID_FIELD.to_owned(), Value::String(id.clone()));
        let body = serde_json::to_string(&document)?;

        sqlx::query("INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)")
            .bind(collection.as_ref())
            .bind(&id)
            .bind(body)
            .execute(&self.pool)
            .await?;

        tracing::debug!(%collection, id = %id, "Inserted document");

        Ok(InsertOneResult { inserted_id: id })
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        set: Document,
    ) -> Result<UpdateResult, StoreError> {
        // Take the write lock up front; a deferred read-then-write upgrade fails
        // with SQLITE_BUSY under concurrent writers instead of waiting.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let mut query = QueryBuilder::<Sqlite>::new("SELECT id, body FROM documents");
        push_where(&mut query, collection, filter);
        query.push(" ORDER BY rowid LIMIT 1");

        let row = query
            .build_query_as::<(String, String)>()
            .fetch_optional(&mut *tx)
            .await?;

        let Some((id, body)) = row else {
            return Ok(UpdateResult {
                matched_count: 0,
                modified_count: 0,
            });
        };

        let current = parse_document(&body)?;
        let mut updated = current.clone();
        for (key, value) in set {
            if key != ID_FIELD {
                updated.insert(key, value);
            }
        }

        if updated == current {
            return Ok(UpdateResult {
                matched_count: 1,
                modified_count: 0,
            });
        }

        sqlx::query("UPDATE documents SET body = ?1 WHERE collection = ?2 AND id = ?3")
            .bind(serde_json::to_string(&updated)?)
            .bind(collection.as_ref())
            .bind(&id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(%collection, id = %id, "Updated document");

        Ok(UpdateResult {
            matched_count: 1,
            modified_count: 1,
        })
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<DeleteResult, StoreError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "DELETE FROM documents WHERE rowid IN (SELECT rowid FROM documents",
        );
        push_where(&mut query, collection, filter);
        query.push(" ORDER BY rowid LIMIT 1)");

        let result = query.build().execute(&self.pool).await?;

        tracing::debug!(%collection, deleted = result.rows_affected(), "Deleted document");

        Ok(DeleteResult {
            deleted_count: result.rows_affected(),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn json_path(field: &str) -> String {
    format!("$.{field}")
}

fn push_where(query: &mut QueryBuilder<'_, Sqlite>, collection: Collection, filter: &Filter) {
    query
        .push(" WHERE collection = ")
        .push_bind(collection.as_ref().to_owned());

    for condition in filter.conditions() {
        match condition {
            Condition::Id(id) => {
                query.push(" AND id = ").push_bind(id.clone());
            }
            Condition::Eq { field, value } => {
                query
                    .push(" AND json_extract(body, ")
                    .push_bind(json_path(field))
                    .push(")");
                match value {
                    Value::Null => {
                        query.push(" IS NULL");
                    }
                    Value::Bool(b) => {
                        query.push(" = ").push_bind(*b);
                    }
                    Value::Number(n) => match n.as_i64() {
                        Some(i) => {
                            query.push(" = ").push_bind(i);
                        }
                        None => {
                            query.push(" = ").push_bind(n.as_f64().unwrap_or_default());
                        }
                    },
                    Value::String(s) => {
                        query.push(" = ").push_bind(s.clone());
                    }
                    nested => {
                        query.push(" = json(").push_bind(nested.to_string()).push(")");
                    }
                }
            }
            Condition::Range { field, min, max } => {
                if let Some(min) = min {
                    query
                        .push(" AND json_extract(body, ")
                        .push_bind(json_path(field))
                        .push(") >= ")
                        .push_bind(*min);
                }
                if let Some(max) = max {
                    query
                        .push(" AND json_extract(body, ")
                        .push_bind(json_path(field))
                        .push(") <= ")
                        .push_bind(*max);
                }
            }
        }
    }
}

fn parse_document(body: &str) -> Result<Document, StoreError> {
    match serde_json::from_str(body)? {
        Value::Object(document) => Ok(document),
        _ => Err(StoreError::NotAnObject),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn setup_store() -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        let store = SqliteStore::from_pool(pool);
        store.migrate().await.unwrap();
        store
    }

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(document) => document,
            other => panic!("not an object: {other}"),
        }
    }

    fn emails(documents: &[Document]) -> Vec<&str> {
        documents
            .iter()
            .map(|d| d["email"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_find_one_returns_it() {
        let store = setup_store().await;

        let inserted = store
            .insert_one(
                Collection::Rooms,
                doc(json!({"_id": "client-chosen", "name": "Sea View"})),
            )
            .await
            .unwrap();

        assert!(Ulid::from_string(&inserted.inserted_id).is_ok());

        let room = store
            .find_one(Collection::Rooms, &Filter::by_id(&inserted.inserted_id))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(room["_id"], json!(inserted.inserted_id));
        assert_eq!(room["name"], "Sea View");

        let missing = store
            .find_one(Collection::Rooms, &Filter::by_id("client-chosen"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_find_scopes_by_owner_case_sensitively() {
        let store = setup_store().await;
        for email in ["a@x.com", "b@x.com", "A@x.com", "a@x.com"] {
            store
                .insert_one(Collection::Bookings, doc(json!({"email": email})))
                .await
                .unwrap();
        }

        let found = store
            .find(
                Collection::Bookings,
                &Filter::all().eq("email", "a@x.com"),
                None,
            )
            .await
            .unwrap();

        assert_eq!(emails(&found), vec!["a@x.com", "a@x.com"]);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = setup_store().await;
        store
            .insert_one(Collection::Reviews, doc(json!({"email": "a@x.com"})))
            .await
            .unwrap();

        let bookings = store
            .find(Collection::Bookings, &Filter::all(), None)
            .await
            .unwrap();

        assert!(bookings.is_empty());
    }

    #[tokio::test]
    async fn test_range_filter_is_inclusive_and_open_ended() {
        let store = setup_store().await;
        for price in [80, 100, 150, 200, 320] {
            store
                .insert_one(Collection::Rooms, doc(json!({"price_per_night": price})))
                .await
                .unwrap();
        }

        let prices = |rooms: Vec<Document>| -> Vec<i64> {
            rooms
                .iter()
                .map(|r| r["price_per_night"].as_i64().unwrap())
                .collect()
        };

        let bounded = store
            .find(
                Collection::Rooms,
                &Filter::all().range("price_per_night", Some(100), Some(200)),
                None,
            )
            .await
            .unwrap();
        assert_eq!(prices(bounded), vec![100, 150, 200]);

        let open = store
            .find(
                Collection::Rooms,
                &Filter::all().range("price_per_night", Some(150), None),
                None,
            )
            .await
            .unwrap();
        assert_eq!(prices(open), vec![150, 200, 320]);
    }

    #[tokio::test]
    async fn test_sort_descending() {
        let store = setup_store().await;
        for (email, timestamp) in [("a", 10), ("b", 30), ("c", 20)] {
            store
                .insert_one(
                    Collection::Reviews,
                    doc(json!({"email": email, "timestamp": timestamp})),
                )
                .await
                .unwrap();
        }

        let reviews = store
            .find(
                Collection::Reviews,
                &Filter::all(),
                Some(Sort::desc("timestamp")),
            )
            .await
            .unwrap();

        assert_eq!(emails(&reviews), vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_update_sets_fields_and_keeps_id() {
        let store = setup_store().await;
        let inserted = store
            .insert_one(
                Collection::Bookings,
                doc(json!({"email": "a@x.com", "date": "2026-01-01"})),
            )
            .await
            .unwrap();
        let filter = Filter::by_id(&inserted.inserted_id);

        let result = store
            .update_one(
                Collection::Bookings,
                &filter,
                doc(json!({"date": "2026-02-02", "_id": "hijacked"})),
            )
            .await
            .unwrap();
        assert_eq!(
            result,
            UpdateResult {
                matched_count: 1,
                modified_count: 1
            }
        );

        let booking = store
            .find_one(Collection::Bookings, &filter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(booking["date"], "2026-02-02");
        assert_eq!(booking["email"], "a@x.com");
        assert_eq!(booking["_id"], json!(inserted.inserted_id));

        let unchanged = store
            .update_one(
                Collection::Bookings,
                &filter,
                doc(json!({"date": "2026-02-02"})),
            )
            .await
            .unwrap();
        assert_eq!(unchanged.modified_count, 0);
    }

    #[tokio::test]
    async fn test_update_missing_document_does_not_create_it() {
        let store = setup_store().await;

        let result = store
            .update_one(
                Collection::Bookings,
                &Filter::by_id(Ulid::new().to_string()),
                doc(json!({"date": "2026-02-02"})),
            )
            .await
            .unwrap();

        assert_eq!(result.matched_count, 0);
        let all = store
            .find(Collection::Bookings, &Filter::all(), None)
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_delete_one_removes_a_single_match() {
        let store = setup_store().await;
        for _ in 0..2 {
            store
                .insert_one(Collection::Bookings, doc(json!({"email": "a@x.com"})))
                .await
                .unwrap();
        }
        let owner = Filter::all().eq("email", "a@x.com");

        let result = store
            .delete_one(Collection::Bookings, &owner)
            .await
            .unwrap();
        assert_eq!(result.deleted_count, 1);

        let left = store.find(Collection::Bookings, &owner, None).await.unwrap();
        assert_eq!(left.len(), 1);

        let none = store
            .delete_one(Collection::Bookings, &Filter::by_id("nope"))
            .await
            .unwrap();
        assert_eq!(none.deleted_count, 0);
    }

    #[tokio::test]
    async fn test_ping() {
        let store = setup_store().await;
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_updates_on_file_database() {
        let path = std::env::temp_dir().join(format!("royella-store-{}.db", Ulid::new()));
        let url = format!("sqlite://{}", path.display());

        let store = SqliteStore::connect(&url, 8).await.unwrap();
        store.migrate().await.unwrap();
        let id = store
            .insert_one(Collection::Rooms, doc(json!({"visits": 0})))
            .await
            .unwrap()
            .inserted_id;

        let mut handles = Vec::new();
        for n in 1..=32 {
            let store = store.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update_one(
                        Collection::Rooms,
                        &Filter::by_id(id),
                        doc(json!({ format!("writer_{n}"): n })),
                    )
                    .await
            }));
        }

        for handle in handles {
            let result = handle.await.unwrap().unwrap();
            assert_eq!(result.matched_count, 1);
            assert_eq!(result.modified_count, 1);
        }

        let room = store
            .find_one(Collection::Rooms, &Filter::by_id(&id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(room.len(), 34);

        store.pool().close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }
}
