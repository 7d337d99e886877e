//! Postgres-backed primary store.
//!
//! The authoritative backend: ids and timestamps are assigned here, and
//! every read path that misses a replica ends up here. Card line items are
//! stored as a JSONB object keyed by product id, matching the wire shape of
//! [`Card::items`].

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::instrument;

use storefront_core::{Error, Kind, Op, Result};
use storefront_domain::{Card, CardItem, Category, Product};

use super::PrimaryStore;

/// Primary store on a Postgres pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        const OP: Op = "postgres_store.connect";

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(|err| Error::internal(OP, err))?;
        Ok(Self { pool })
    }

    /// Creates the tables and indexes this store expects. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<()> {
        const OP: Op = "postgres_store.ensure_schema";

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS product (
                id          BIGSERIAL PRIMARY KEY,
                title       TEXT NOT NULL,
                description TEXT NOT NULL,
                price       BIGINT NOT NULL,
                category    TEXT NOT NULL,
                created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|err| query_error(OP, err))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS product_title_idx ON product (title)")
            .execute(&self.pool)
            .await
            .map_err(|err| query_error(OP, err))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS card (
                id          BIGSERIAL PRIMARY KEY,
                user_id     TEXT NOT NULL,
                items       JSONB NOT NULL DEFAULT '{}'::jsonb,
                price       BIGINT NOT NULL,
                created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|err| query_error(OP, err))?;

        Ok(())
    }
}

fn query_error(op: Op, err: sqlx::Error) -> Error {
    Error::internal(op, err)
}

/// Domain prices are unsigned; the column is BIGINT.
fn storable_price(op: Op, price: u64) -> Result<i64> {
    i64::try_from(price).map_err(|_| Error::invalid_argument(op, "price exceeds storable range"))
}

#[derive(Debug)]
struct ProductRow {
    id: i64,
    title: String,
    description: String,
    price: i64,
    category: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for ProductRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            category: row.try_get("category")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl ProductRow {
    /// Row data that cannot map into the domain is stored corruption, not a
    /// caller mistake, so everything here classifies as internal.
    fn into_domain(self, op: Op) -> Result<Product> {
        let price = u64::try_from(self.price).map_err(|_| {
            Error::internal(op, format!("product {} has negative price {}", self.id, self.price))
        })?;
        let category = self
            .category
            .parse::<Category>()
            .map_err(|err| Error::wrap_kind(op, Kind::Internal, err))?;

        Ok(Product::from_stored(
            self.id,
            self.title,
            self.description,
            price,
            category,
            self.created_at,
            self.updated_at,
        ))
    }
}

#[derive(Debug)]
struct CardRow {
    id: i64,
    user_id: String,
    items: serde_json::Value,
    price: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for CardRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(CardRow {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            items: row.try_get("items")?,
            price: row.try_get("price")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl CardRow {
    fn into_domain(self, op: Op) -> Result<Card> {
        let price = u64::try_from(self.price).map_err(|_| {
            Error::internal(op, format!("card {} has negative price {}", self.id, self.price))
        })?;
        let items: std::collections::HashMap<String, CardItem> =
            serde_json::from_value(self.items).map_err(|err| {
                Error::internal(op, format!("card {} has malformed items: {err}", self.id))
            })?;

        Ok(Card::from_stored(
            self.id,
            self.user_id,
            items,
            price,
            self.created_at,
            self.updated_at,
        ))
    }
}

#[async_trait::async_trait]
impl PrimaryStore for PostgresStore {
    #[instrument(skip(self, product), fields(title = %product.title()), err)]
    async fn insert_product(&self, product: Product) -> Result<Product> {
        const OP: Op = "postgres_store.insert_product";

        let row: ProductRow = sqlx::query_as(
            r#"
            INSERT INTO product (title, description, price, category)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, price, category, created_at, updated_at
            "#,
        )
        .bind(product.title())
        .bind(product.description())
        .bind(storable_price(OP, product.price())?)
        .bind(product.category().as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| query_error(OP, err))?;

        row.into_domain(OP)
    }

    async fn product_by_id(&self, id: i64) -> Result<Product> {
        const OP: Op = "postgres_store.product_by_id";

        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, title, description, price, category, created_at, updated_at
            FROM product
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| query_error(OP, err))?;

        row.ok_or_else(|| Error::not_found(OP, format!("product {id} not found")))?
            .into_domain(OP)
    }

    async fn product_list(&self) -> Result<Vec<Product>> {
        const OP: Op = "postgres_store.product_list";

        let rows: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, title, description, price, category, created_at, updated_at
            FROM product
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|err| query_error(OP, err))?;

        rows.into_iter().map(|row| row.into_domain(OP)).collect()
    }

    async fn search_products_by_title(&self, keywords: &str) -> Result<Vec<Product>> {
        const OP: Op = "postgres_store.search_products_by_title";

        let rows: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, title, description, price, category, created_at, updated_at
            FROM product
            WHERE title LIKE '%' || $1 || '%'
            ORDER BY id
            "#,
        )
        .bind(keywords)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| query_error(OP, err))?;

        rows.into_iter().map(|row| row.into_domain(OP)).collect()
    }

    #[instrument(skip(self, card), fields(user_id = %card.user_id()), err)]
    async fn insert_card(&self, card: Card) -> Result<Card> {
        const OP: Op = "postgres_store.insert_card";

        let items = serde_json::to_value(card.items())
            .map_err(|err| Error::unexpected(OP, err.to_string()))?;

        let row: CardRow = sqlx::query_as(
            r#"
            INSERT INTO card (user_id, items, price)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, items, price, created_at, updated_at
            "#,
        )
        .bind(card.user_id())
        .bind(items)
        .bind(storable_price(OP, card.price())?)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| query_error(OP, err))?;

        row.into_domain(OP)
    }

    async fn card_by_id(&self, id: i64) -> Result<Card> {
        const OP: Op = "postgres_store.card_by_id";

        let row: Option<CardRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, items, price, created_at, updated_at
            FROM card
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| query_error(OP, err))?;

        row.ok_or_else(|| Error::not_found(OP, format!("card {id} not found")))?
            .into_domain(OP)
    }

    #[instrument(skip(self, card), fields(card_id = card.id()), err)]
    async fn update_card(&self, card: &Card) -> Result<()> {
        const OP: Op = "postgres_store.update_card";

        let items = serde_json::to_value(card.items())
            .map_err(|err| Error::unexpected(OP, err.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE card
            SET items = $1, price = $2, updated_at = now()
            WHERE id = $3
            "#,
        )
        .bind(items)
        .bind(storable_price(OP, card.price())?)
        .bind(card.id())
        .execute(&self.pool)
        .await
        .map_err(|err| query_error(OP, err))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found(OP, format!("card {} not found", card.id())));
        }
        Ok(())
    }
}
