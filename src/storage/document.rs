//! Document Store Driver
//!
//! MongoDB-backed provider. Records are addressed by their logical `id`
//! field, never by MongoDB's `_id`, and the connection is opened lazily the
//! first time any operation needs it.
//!
//! ## Stored Shape
//! ```text
//! { _id: ObjectId, id: Int64, name: String, value: String, createdAt: Date }
//! ```
//! Legacy documents (no usable `id`, a double or string `id`, a missing or
//! string `createdAt`) are rewritten into this shape once, on connect, before
//! the unique index is built. Scalar `value`s are coerced to text on read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{
    ClientOptions, Collation, CollationStrength, FindOneAndUpdateOptions, FindOneOptions,
    FindOptions, IndexOptions, ReturnDocument,
};
use mongodb::{Client, Collection, IndexModel};
use tokio::sync::OnceCell;

use crate::config::Config;
use crate::error::{Result, VaultError};
use crate::record::{IdGenerator, Record};

use super::mapping::{
    bson_to_id, canonical_fields, dedup_by_id, legacy_filter, record_from_document,
    record_to_document, search_filter,
};
use super::{RecordStore, SortDirection, SortField, SortSpec};

/// Server error code for unique index violations
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB-backed record provider
pub struct DocumentStore {
    /// Connection string; `None` makes every operation fail with a connection error
    connection_string: Option<String>,

    /// Explicit database name, if configured
    database_name: Option<String>,

    /// Collection holding the records
    collection_name: String,

    /// Resolved collection, set once on first connect
    collection: OnceCell<Collection<Document>>,

    /// Issues ids for legacy documents that have none
    ids: IdGenerator,
}

impl DocumentStore {
    /// Create a driver; no connection is made until first use
    pub fn new(
        connection_string: Option<String>,
        database_name: Option<String>,
        collection_name: impl Into<String>,
    ) -> Self {
        Self {
            connection_string,
            database_name,
            collection_name: collection_name.into(),
            collection: OnceCell::new(),
            ids: IdGenerator::new(),
        }
    }

    /// Create a driver from the vault configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.connection_string().map(str::to_string),
            config.database_name.clone(),
            config.collection_name.clone(),
        )
    }

    /// Whether a connection has been established
    pub fn is_connected(&self) -> bool {
        self.collection.initialized()
    }

    /// Connect on first call; later calls return the same collection
    pub async fn ensure_connected(&self) -> Result<&Collection<Document>> {
        self.collection.get_or_try_init(|| self.connect()).await
    }

    /// Database the driver uses: configured name, else the URI's, else the default
    ///
    /// Parses the connection string without contacting the server.
    pub async fn resolve_database_name(&self) -> Result<String> {
        let options = self.client_options().await?;
        Ok(self.database_for(&options))
    }

    async fn connect(&self) -> Result<Collection<Document>> {
        let options = self.client_options().await?;
        let database_name = self.database_for(&options);
        let client = Client::with_options(options)
            .map_err(|e| VaultError::Connection(format!("invalid client options: {}", e)))?;

        let database = client.database(&database_name);
        let collection = database.collection::<Document>(&self.collection_name);

        // First round-trip: surfaces unreachable servers as connection errors.
        // Healing runs before the index so id-less documents cannot block it.
        let healed = self
            .heal_legacy(&collection)
            .await
            .map_err(|e| VaultError::Connection(format!("cannot reach MongoDB: {}", e)))?;
        if healed > 0 {
            tracing::info!("Rewrote {} legacy documents into canonical shape", healed);
        }

        let index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        collection
            .create_index(index, None)
            .await
            .map_err(|e| VaultError::Connection(format!("cannot create id index: {}", e)))?;

        tracing::info!(
            "Connected to MongoDB collection {}.{}",
            database.name(),
            self.collection_name
        );
        Ok(collection)
    }

    async fn client_options(&self) -> Result<ClientOptions> {
        let uri = self
            .connection_string
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| {
                VaultError::Connection("no MongoDB connection string is configured".to_string())
            })?;

        ClientOptions::parse(uri)
            .await
            .map_err(|e| VaultError::Connection(format!("invalid connection string: {}", e)))
    }

    fn database_for(&self, options: &ClientOptions) -> String {
        self.database_name
            .clone()
            .or_else(|| options.default_database.clone())
            .unwrap_or_else(|| Config::DEFAULT_DATABASE.to_string())
    }

    /// Rewrite every non-canonical document, returning how many changed
    ///
    /// Documents without a usable id get one issued past the highest id in
    /// the collection.
    async fn heal_legacy(&self, collection: &Collection<Document>) -> Result<usize> {
        let highest = collection
            .find_one(
                doc! { "id": { "$type": "number" } },
                FindOneOptions::builder().sort(doc! { "id": -1 }).build(),
            )
            .await?;
        if let Some(id) = highest.as_ref().and_then(|document| document.get("id")).and_then(bson_to_id) {
            self.ids.observe(id);
        }

        let legacy: Vec<Document> = collection.find(legacy_filter(), None).await?.try_collect().await?;
        let now = Utc::now();
        let mut healed = 0;
        for document in &legacy {
            let Some(object_id) = document.get("_id") else {
                continue;
            };
            let id = match document.get("id").and_then(bson_to_id) {
                Some(id) => id,
                None => {
                    let id = self.ids.generate();
                    tracing::warn!("Document {} had no usable id, assigned {}", object_id, id);
                    id
                }
            };

            let set = canonical_fields(document, id, now);
            if set.is_empty() {
                continue;
            }
            collection
                .update_one(doc! { "_id": object_id.clone() }, doc! { "$set": set }, None)
                .await?;
            healed += 1;
        }
        Ok(healed)
    }

    /// Run a query and normalize every returned document
    async fn find_records(
        &self,
        filter: Document,
        options: Option<FindOptions>,
    ) -> Result<Vec<Record>> {
        let collection = self.ensure_connected().await?;
        let documents: Vec<Document> = collection.find(filter, options).await?.try_collect().await?;
        Ok(documents
            .iter()
            .filter_map(|document| {
                let record = record_from_document(document);
                if record.is_none() {
                    tracing::warn!("Skipping document without a usable id: {:?}", document.get("_id"));
                }
                record
            })
            .collect())
    }
}

#[async_trait]
impl RecordStore for DocumentStore {
    async fn list(&self) -> Result<Vec<Record>> {
        let mut options = FindOptions::default();
        options.sort = Some(doc! { "_id": 1 });
        self.find_records(doc! {}, Some(options)).await
    }

    async fn get(&self, id: i64) -> Result<Option<Record>> {
        let collection = self.ensure_connected().await?;
        let found = collection.find_one(doc! { "id": id }, None).await?;
        Ok(found.as_ref().and_then(record_from_document))
    }

    async fn add(&self, record: Record) -> Result<Record> {
        let collection = self.ensure_connected().await?;
        match collection.insert_one(record_to_document(&record), None).await {
            Ok(_) => Ok(record),
            Err(e) if is_duplicate_key(&e) => Err(VaultError::DuplicateId(record.id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, id: i64, name: &str, value: &str) -> Result<Option<Record>> {
        let collection = self.ensure_connected().await?;
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = collection
            .find_one_and_update(
                doc! { "id": id },
                doc! { "$set": { "name": name, "value": value } },
                options,
            )
            .await?;
        Ok(updated.as_ref().and_then(record_from_document))
    }

    async fn delete(&self, id: i64) -> Result<Option<Record>> {
        let collection = self.ensure_connected().await?;
        let removed = collection.find_one_and_delete(doc! { "id": id }, None).await?;
        Ok(removed.as_ref().and_then(record_from_document))
    }

    async fn search(&self, keyword: &str) -> Result<Vec<Record>> {
        let mut options = FindOptions::default();
        options.sort = Some(doc! { "_id": 1 });
        let records = self.find_records(search_filter(keyword), Some(options)).await?;
        Ok(dedup_by_id(records))
    }

    async fn sort(&self, spec: SortSpec) -> Result<Vec<Record>> {
        let direction = match spec.direction {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        };

        let mut order = Document::new();
        order.insert(spec.field.as_str(), direction);
        order.insert("_id", 1);

        let mut options = FindOptions::default();
        options.sort = Some(order);
        if matches!(spec.field, SortField::Name | SortField::Value) {
            options.collation = Some(
                Collation::builder()
                    .locale("en")
                    .strength(CollationStrength::Secondary)
                    .build(),
            );
        }

        self.find_records(doc! {}, Some(options)).await
    }

    async fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(None)
    }

    fn source_name(&self) -> String {
        let database = match self.collection.get() {
            Some(collection) => collection.namespace().db,
            None => self
                .database_name
                .clone()
                .unwrap_or_else(|| Config::DEFAULT_DATABASE.to_string()),
        };
        format!("mongodb:{}/{}", database, self.collection_name)
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY_CODE
    )
}
