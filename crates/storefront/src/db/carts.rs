//! Server-side carts of authenticated users.

use bazaar_core::cart::{Cart, CartItem};
use bazaar_core::{ProductId, UserId};
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use super::RepositoryError;
use super::catalog::{CatalogRepository, ProductRow};

#[derive(Debug, FromRow)]
struct CartRow {
    #[sqlx(flatten)]
    product: ProductRow,
    count: i32,
}

/// Repository for cart lines.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load a user's cart with live product data, oldest line first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` for a non-positive stored count.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get(&self, user_id: &UserId) -> Result<Cart, RepositoryError> {
        let rows = sqlx::query_as::<_, CartRow>(
            "SELECT p.id, p.title, p.description, p.images, p.keywords, p.price, \
             p.discount, p.stock, p.is_available, b.id AS brand_id, b.title AS brand_title, \
             ci.count \
             FROM cart_items ci \
             JOIN products p ON p.id = ci.product_id \
             LEFT JOIN brands b ON b.id = p.brand_id \
             WHERE ci.user_id = $1 \
             ORDER BY ci.created_at, ci.product_id",
        )
        .bind(user_id.as_str())
        .fetch_all(self.pool)
        .await?;

        let (product_rows, counts): (Vec<ProductRow>, Vec<i32>) =
            rows.into_iter().map(|row| (row.product, row.count)).unzip();
        let products = CatalogRepository::new(self.pool)
            .hydrate(product_rows)
            .await?;

        let items = products
            .into_iter()
            .zip(counts)
            .map(|(product, count)| {
                let count = u32::try_from(count)
                    .ok()
                    .filter(|c| *c > 0)
                    .ok_or_else(|| {
                        RepositoryError::DataCorruption(format!(
                            "invalid cart count {count} for product {}",
                            product.id
                        ))
                    })?;
                Ok(CartItem {
                    product_id: product.id.clone(),
                    product,
                    count,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(Cart::from_items(items))
    }

    /// Set the absolute count of a cart line. A count of 0 deletes the line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn set_count(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        count: u32,
    ) -> Result<(), RepositoryError> {
        if count == 0 {
            sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
                .bind(user_id.as_str())
                .bind(product_id.as_str())
                .execute(self.pool)
                .await?;
            return Ok(());
        }

        let count = i32::try_from(count)
            .map_err(|_| RepositoryError::Conflict(format!("count {count} out of range")))?;
        sqlx::query(
            "INSERT INTO cart_items (user_id, product_id, count) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, product_id) \
             DO UPDATE SET count = EXCLUDED.count, updated_at = now()",
        )
        .bind(user_id.as_str())
        .bind(product_id.as_str())
        .bind(count)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
