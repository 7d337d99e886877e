//! RediSearch-backed search index.
//!
//! Products are indexed as hashes under a dedicated key prefix and queried
//! with FT.SEARCH. The index is rebuildable from the primary store, so every
//! failure here is survivable; malformed documents are skipped on read
//! rather than failing the whole query.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use redis::aio::ConnectionManager;
use tracing::instrument;

use storefront_core::{Error, Op, Result};
use storefront_domain::{Category, Product};

use super::SearchIndex;

/// Key prefix for indexed product documents. Kept distinct from the cache
/// keyspace so FLUSHALL-free index rebuilds stay possible.
pub const DOC_PREFIX: &str = "rs:product:";

/// Default FT index name.
pub const DEFAULT_INDEX: &str = "storefront_idx";

/// Search index on a Redis connection manager.
#[derive(Clone)]
pub struct RediSearchIndex {
    conn: ConnectionManager,
    index: String,
}

impl RediSearchIndex {
    pub fn new(conn: ConnectionManager, index: impl Into<String>) -> Self {
        Self {
            conn,
            index: index.into(),
        }
    }

    pub async fn connect(url: &str, index: impl Into<String>) -> Result<Self> {
        const OP: Op = "redisearch.connect";

        let client = redis::Client::open(url).map_err(|err| Error::internal(OP, err))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|err| Error::internal(OP, err))?;
        Ok(Self::new(conn, index))
    }

    /// Creates the FT index over the document prefix. Idempotent: an already
    /// existing index is not an error.
    #[instrument(skip(self), fields(index = %self.index), err)]
    pub async fn ensure_index(&self) -> Result<()> {
        const OP: Op = "redisearch.ensure_index";

        let mut conn = self.conn.clone();
        let created = redis::cmd("FT.CREATE")
            .arg(&self.index)
            .arg("ON")
            .arg("HASH")
            .arg("PREFIX")
            .arg(1)
            .arg(DOC_PREFIX)
            .arg("SCHEMA")
            .arg("title")
            .arg("TEXT")
            .arg("WEIGHT")
            .arg(5)
            .arg("SORTABLE")
            .arg("description")
            .arg("TEXT")
            .arg("price")
            .arg("NUMERIC")
            .arg("category")
            .arg("TAG")
            .arg("created_at")
            .arg("NUMERIC")
            .arg("updated_at")
            .arg("NUMERIC")
            .query_async::<_, ()>(&mut conn)
            .await;

        match created {
            Ok(()) => Ok(()),
            Err(err) if err.to_string().contains("Index already exists") => Ok(()),
            Err(err) => Err(Error::internal(OP, err)),
        }
    }
}

fn doc_key(id: i64) -> String {
    format!("{DOC_PREFIX}{id}")
}

#[async_trait]
impl SearchIndex for RediSearchIndex {
    #[instrument(skip(self, product), fields(product_id = product.id()), err)]
    async fn upsert(&self, product: &Product) -> Result<()> {
        const OP: Op = "redisearch.upsert";

        let mut conn = self.conn.clone();
        redis::cmd("HSET")
            .arg(doc_key(product.id()))
            .arg("id")
            .arg(product.id())
            .arg("title")
            .arg(product.title())
            .arg("description")
            .arg(product.description())
            .arg("price")
            .arg(product.price())
            .arg("category")
            .arg(product.category().as_str())
            .arg("created_at")
            .arg(product.created_at().timestamp())
            .arg("updated_at")
            .arg(product.updated_at().timestamp())
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|err| Error::internal(OP, err))
    }

    async fn query_by_keywords(&self, keywords: &str) -> Result<Vec<Product>> {
        const OP: Op = "redisearch.query_by_keywords";

        let mut conn = self.conn.clone();
        let reply: redis::Value = redis::cmd("FT.SEARCH")
            .arg(&self.index)
            .arg(keywords)
            .query_async(&mut conn)
            .await
            .map_err(|err| Error::internal(OP, err))?;

        Ok(parse_search_reply(reply))
    }
}

/// Parses an FT.SEARCH reply: a bulk of the total count followed by
/// alternating document keys and field arrays. Documents that do not decode
/// into a product are dropped.
fn parse_search_reply(reply: redis::Value) -> Vec<Product> {
    let redis::Value::Bulk(entries) = reply else {
        return Vec::new();
    };

    let mut products = Vec::new();
    for entry in entries {
        match entry {
            // Leading total and interleaved document keys.
            redis::Value::Int(_) | redis::Value::Data(_) => continue,
            redis::Value::Bulk(pairs) => {
                let mut fields = HashMap::new();
                for pair in pairs.chunks(2) {
                    if let [redis::Value::Data(key), redis::Value::Data(value)] = pair {
                        fields.insert(
                            String::from_utf8_lossy(key).into_owned(),
                            String::from_utf8_lossy(value).into_owned(),
                        );
                    }
                }
                if let Some(product) = product_from_fields(&fields) {
                    products.push(product);
                }
            }
            _ => continue,
        }
    }
    products
}

fn product_from_fields(fields: &HashMap<String, String>) -> Option<Product> {
    let id = fields.get("id")?.parse::<i64>().ok()?;
    let price = fields.get("price")?.parse::<u64>().ok()?;
    let category = fields.get("category")?.parse::<Category>().ok()?;
    let created_at = DateTime::from_timestamp(fields.get("created_at")?.parse().ok()?, 0)?;
    let updated_at = DateTime::from_timestamp(fields.get("updated_at")?.parse().ok()?, 0)?;

    Some(Product::from_stored(
        id,
        fields.get("title")?.clone(),
        fields.get("description")?.clone(),
        price,
        category,
        created_at,
        updated_at,
    ))
}
