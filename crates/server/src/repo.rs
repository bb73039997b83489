//! Repository seams over the `merchants` and `items` tables.
//!
//! Both traits are implemented by [`SqliteRepo`] and [`PostgresRepo`]; the
//! handlers only ever see `Arc<dyn MerchantRepo>` / `Arc<dyn ItemRepo>`.
//! Lookups by id return `Ok(None)` when the row does not exist.
//!
//! The two backends mirror each other statement for statement and differ
//! only in placeholder syntax and the name prefilter. Name matching and its
//! ordering are decided here, in [`match_names`], so both agree on them.

mod postgres_repo;
mod sqlite_repo;

pub use postgres_repo::PostgresRepo;
pub use sqlite_repo::SqliteRepo;
#[cfg(test)]
pub(crate) use sqlite_repo::tests::memory_repo;

use thiserror::Error;

use crate::errors::is_foreign_key_violation;
use crate::models::{Item, ItemPatch, Merchant, NewItem, MISSING_MERCHANT};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("merchant {0} does not exist")]
    MissingMerchant(i64),
}

#[async_trait::async_trait]
pub trait MerchantRepo: Send + Sync {
    /// All merchants in creation order.
    async fn list_merchants(&self) -> Result<Vec<Merchant>, StoreError>;

    async fn get_merchant(&self, id: i64) -> Result<Option<Merchant>, StoreError>;

    /// Case-insensitive substring match on `name`, ordered by name then id.
    async fn find_merchants_by_name(&self, fragment: &str) -> Result<Vec<Merchant>, StoreError>;

    async fn create_merchant(&self, name: &str) -> Result<Merchant, StoreError>;

    /// Removes the merchant and, through the foreign key, all of its items.
    async fn delete_merchant(&self, id: i64) -> Result<bool, StoreError>;
}

#[async_trait::async_trait]
pub trait ItemRepo: Send + Sync {
    async fn list_items(&self) -> Result<Vec<Item>, StoreError>;

    /// `None` when the merchant itself does not exist.
    async fn list_items_for_merchant(
        &self,
        merchant_id: i64,
    ) -> Result<Option<Vec<Item>>, StoreError>;

    async fn get_item(&self, id: i64) -> Result<Option<Item>, StoreError>;

    async fn create_item(&self, item: NewItem) -> Result<Item, StoreError>;

    /// Overlays `patch` onto the stored item. `Ok(None)` when the item is gone.
    async fn update_item(&self, id: i64, patch: ItemPatch) -> Result<Option<Item>, StoreError>;

    async fn delete_item(&self, id: i64) -> Result<bool, StoreError>;

    /// Case-insensitive substring match on `name`, ordered by name then id.
    async fn find_items_by_name(&self, fragment: &str) -> Result<Vec<Item>, StoreError>;

    /// Items priced at or above `min`, cheapest first.
    async fn find_items_by_min_price(&self, min: f64) -> Result<Vec<Item>, StoreError>;
}

/// Rows that take part in name search.
pub(crate) trait Named {
    fn name(&self) -> &str;

    fn id(&self) -> i64;
}

impl Named for Merchant {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl Named for Item {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> i64 {
        self.id
    }
}

/// Keeps the rows whose name contains `fragment` under Unicode lowercasing,
/// ordered by the lowercased name and then by id.
pub(crate) fn match_names<T: Named>(rows: Vec<T>, fragment: &str) -> Vec<T> {
    let needle = fragment.to_lowercase();
    let mut found: Vec<(String, T)> = rows
        .into_iter()
        .filter_map(|row| {
            let folded = row.name().to_lowercase();
            folded.contains(&needle).then_some((folded, row))
        })
        .collect();
    found.sort_by(|(a, x), (b, y)| a.cmp(b).then(x.id().cmp(&y.id())));
    found.into_iter().map(|(_, row)| row).collect()
}

/// Insert failures: a dangling `merchant_id` is a validation message.
pub(crate) fn create_error(err: sqlx::Error) -> StoreError {
    if is_foreign_key_violation(&err) {
        StoreError::Validation(vec![MISSING_MERCHANT.to_string()])
    } else {
        StoreError::Database(err)
    }
}

/// Update failures: a dangling `merchant_id` is reported as a missing merchant.
pub(crate) fn update_error(err: sqlx::Error, merchant_id: i64) -> StoreError {
    if is_foreign_key_violation(&err) {
        StoreError::MissingMerchant(merchant_id)
    } else {
        StoreError::Database(err)
    }
}

/// Builds a `LIKE` pattern that matches `fragment` literally anywhere in the column.
pub(crate) fn like_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
