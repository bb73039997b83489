use sqlx::SqlitePool;
use tracing::{debug, info};

use super::{create_error, match_names, update_error, ItemRepo, MerchantRepo, StoreError};
use crate::models::{Item, ItemFields, ItemPatch, Merchant, NewItem, BLANK_NAME};

pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn merchant_exists(&self, id: i64) -> Result<bool, StoreError> {
        let found: Option<i32> = sqlx::query_scalar("SELECT 1 FROM merchants WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }
}

#[async_trait::async_trait]
impl MerchantRepo for SqliteRepo {
    async fn list_merchants(&self) -> Result<Vec<Merchant>, StoreError> {
        let rows = sqlx::query_as::<_, Merchant>("SELECT id, name FROM merchants ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_merchant(&self, id: i64) -> Result<Option<Merchant>, StoreError> {
        let row = sqlx::query_as::<_, Merchant>("SELECT id, name FROM merchants WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// SQLite's `lower()` and `LIKE` only fold ASCII, so matching happens in Rust.
    async fn find_merchants_by_name(&self, fragment: &str) -> Result<Vec<Merchant>, StoreError> {
        let rows = sqlx::query_as::<_, Merchant>("SELECT id, name FROM merchants ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(match_names(rows, fragment))
    }

    async fn create_merchant(&self, name: &str) -> Result<Merchant, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::Validation(vec![BLANK_NAME.to_string()]));
        }
        let merchant = sqlx::query_as::<_, Merchant>(
            "INSERT INTO merchants (name) VALUES (?1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        info!(merchant_id = merchant.id, "merchant created");
        Ok(merchant)
    }

    async fn delete_merchant(&self, id: i64) -> Result<bool, StoreError> {
        let rows = sqlx::query("DELETE FROM merchants WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows > 0 {
            info!(merchant_id = id, "merchant deleted");
        }
        Ok(rows > 0)
    }
}

#[async_trait::async_trait]
impl ItemRepo for SqliteRepo {
    async fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        let rows = sqlx::query_as::<_, Item>(
            "SELECT id, name, description, unit_price, merchant_id FROM items ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_items_for_merchant(
        &self,
        merchant_id: i64,
    ) -> Result<Option<Vec<Item>>, StoreError> {
        if !self.merchant_exists(merchant_id).await? {
            return Ok(None);
        }
        let rows = sqlx::query_as::<_, Item>(
            "SELECT id, name, description, unit_price, merchant_id FROM items \
             WHERE merchant_id = ?1 ORDER BY id",
        )
        .bind(merchant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(Some(rows))
    }

    async fn get_item(&self, id: i64) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query_as::<_, Item>(
            "SELECT id, name, description, unit_price, merchant_id FROM items WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_item(&self, item: NewItem) -> Result<Item, StoreError> {
        let fields = item.validate().map_err(StoreError::Validation)?;
        let created = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (name, description, unit_price, merchant_id)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, name, description, unit_price, merchant_id
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.unit_price)
        .bind(fields.merchant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(create_error)?;
        info!(item_id = created.id, merchant_id = created.merchant_id, "item created");
        Ok(created)
    }

    async fn update_item(&self, id: i64, patch: ItemPatch) -> Result<Option<Item>, StoreError> {
        let Some(current) = self.get_item(id).await? else {
            return Ok(None);
        };

        if let Some(&merchant_id) = patch.merchant_id.as_set() {
            if !self.merchant_exists(merchant_id).await? {
                return Err(StoreError::MissingMerchant(merchant_id));
            }
        }

        let ItemFields {
            name,
            description,
            unit_price,
            merchant_id,
        } = current.merge(patch).map_err(StoreError::Validation)?;

        let updated = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET name = ?1, description = ?2, unit_price = ?3, merchant_id = ?4
            WHERE id = ?5
            RETURNING id, name, description, unit_price, merchant_id
            "#,
        )
        .bind(&name)
        .bind(&description)
        .bind(unit_price)
        .bind(merchant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| update_error(e, merchant_id))?;

        if updated.is_some() {
            debug!(item_id = id, "item updated");
        }
        Ok(updated)
    }

    async fn delete_item(&self, id: i64) -> Result<bool, StoreError> {
        let rows = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows > 0 {
            info!(item_id = id, "item deleted");
        }
        Ok(rows > 0)
    }

    async fn find_items_by_name(&self, fragment: &str) -> Result<Vec<Item>, StoreError> {
        let rows = sqlx::query_as::<_, Item>(
            "SELECT id, name, description, unit_price, merchant_id FROM items ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(match_names(rows, fragment))
    }

    async fn find_items_by_min_price(&self, min: f64) -> Result<Vec<Item>, StoreError> {
        let rows = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, name, description, unit_price, merchant_id FROM items
            WHERE unit_price >= ?1
            ORDER BY unit_price ASC, id ASC
            "#,
        )
        .bind(min)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
