//! Catalog repository: renders query descriptors into SQL.
//!
//! Listing and counting both go through [`push_predicate`], so the total
//! reported next to a page is always computed from the same `WHERE` clause.

use std::collections::HashMap;

use bazaar_core::catalog::{
    Brand, CatalogOptions, Category, Constraint, CountQuery, Direction, OrderField, Ordering,
    Predicate, Product, QueryDescriptor,
};
use bazaar_core::pattern::contains_pattern;
use bazaar_core::{BrandId, CategoryId, ProductId, crosssell};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use super::RepositoryError;

/// Product columns joined with the owning brand.
pub(crate) const SELECT_PRODUCTS: &str = "SELECT p.id, p.title, p.description, p.images, \
     p.keywords, p.price, p.discount, p.stock, p.is_available, \
     b.id AS brand_id, b.title AS brand_title \
     FROM products p LEFT JOIN brands b ON b.id = p.brand_id";

/// Product row before categories are attached.
#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    id: String,
    title: String,
    description: String,
    images: Vec<String>,
    keywords: Vec<String>,
    price: Decimal,
    discount: Decimal,
    stock: i32,
    is_available: bool,
    brand_id: Option<String>,
    brand_title: Option<String>,
}

#[derive(Debug, FromRow)]
struct CategoryRow {
    product_id: String,
    id: String,
    title: String,
}

#[derive(Debug, FromRow)]
struct OptionRow {
    id: String,
    title: String,
}

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch one page of products for a listing query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, query), fields(offset = query.page_offset, size = query.page_size))]
    pub async fn list(&self, query: &QueryDescriptor) -> Result<Vec<Product>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_PRODUCTS);
        push_predicate(&mut qb, &query.predicate);
        push_ordering(&mut qb, query.ordering);
        qb.push(" LIMIT ")
            .push_bind(i64::from(query.page_size))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.page_offset).unwrap_or(i64::MAX));

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool)
            .await?;
        self.hydrate(rows).await
    }

    /// Count all products matching a count query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, query))]
    pub async fn count(&self, query: &CountQuery) -> Result<u64, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p");
        push_predicate(&mut qb, &query.predicate);

        let total: i64 = qb.build_query_scalar().fetch_one(self.pool).await?;
        u64::try_from(total)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative count {total}")))
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_PRODUCTS);
        qb.push(" WHERE p.id = ").push_bind(id.as_str().to_owned());

        let row = qb
            .build_query_as::<ProductRow>()
            .fetch_optional(self.pool)
            .await?;
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    /// Cross-sell products of the given products, merged and deduplicated.
    ///
    /// Products listed in `ids` never appear in the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(count = ids.len()))]
    pub async fn cross_sells(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw_ids: Vec<String> = ids.iter().map(|id| id.as_str().to_owned()).collect();

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT p.id, p.title, p.description, p.images, p.keywords, p.price, \
             p.discount, p.stock, p.is_available, b.id AS brand_id, b.title AS brand_title \
             FROM product_cross_sells x \
             JOIN products p ON p.id = x.cross_sell_id \
             LEFT JOIN brands b ON b.id = p.brand_id \
             WHERE x.product_id = ANY(",
        );
        qb.push_bind(raw_ids.clone())
            .push(") ORDER BY array_position(")
            .push_bind(raw_ids)
            .push("::text[], x.product_id), x.position, p.id");

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool)
            .await?;
        let products = self.hydrate(rows).await?;
        Ok(crosssell::merge(ids, products))
    }

    /// Brand and category options for the filter UI.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn options(&self) -> Result<CatalogOptions, RepositoryError> {
        let (brands, categories) = tokio::try_join!(
            sqlx::query_as::<_, OptionRow>("SELECT id, title FROM brands ORDER BY title")
                .fetch_all(self.pool),
            sqlx::query_as::<_, OptionRow>("SELECT id, title FROM categories ORDER BY title")
                .fetch_all(self.pool),
        )?;

        Ok(CatalogOptions {
            brands: brands
                .into_iter()
                .map(|row| Brand {
                    id: BrandId::new(row.id),
                    title: row.title,
                })
                .collect(),
            categories: categories
                .into_iter()
                .map(|row| Category {
                    id: CategoryId::new(row.id),
                    title: row.title,
                })
                .collect(),
        })
    }

    /// Attach categories to product rows, preserving row order.
    pub(crate) async fn hydrate(
        &self,
        rows: Vec<ProductRow>,
    ) -> Result<Vec<Product>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();

        let category_rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT pc.product_id, c.id, c.title \
             FROM product_categories pc JOIN categories c ON c.id = pc.category_id \
             WHERE pc.product_id = ANY($1) ORDER BY c.title",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let mut categories: HashMap<String, Vec<Category>> = HashMap::new();
        for row in category_rows {
            categories.entry(row.product_id).or_default().push(Category {
                id: CategoryId::new(row.id),
                title: row.title,
            });
        }

        rows.into_iter()
            .map(|row| {
                let product_categories = categories.remove(&row.id).unwrap_or_default();
                row.into_product(product_categories)
            })
            .collect()
    }
}

impl ProductRow {
    pub(crate) fn into_product(
        self,
        categories: Vec<Category>,
    ) -> Result<Product, RepositoryError> {
        let stock = u32::try_from(self.stock).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative stock {} for product {}",
                self.stock, self.id
            ))
        })?;
        let brand = match (self.brand_id, self.brand_title) {
            (Some(id), Some(title)) => Some(Brand {
                id: BrandId::new(id),
                title,
            }),
            _ => None,
        };

        Ok(Product {
            id: ProductId::new(self.id),
            title: self.title,
            description: self.description,
            images: self.images,
            keywords: self.keywords,
            price: self.price,
            discount: self.discount,
            stock,
            is_available: self.is_available,
            brand,
            categories,
        })
    }
}

/// Render a predicate as a `WHERE` clause on `products p`.
pub fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    qb.push(" WHERE TRUE");
    for constraint in predicate.constraints() {
        match constraint {
            Constraint::TitleContains(term) => {
                qb.push(" AND p.title ILIKE ").push_bind(contains_pattern(term));
            }
            Constraint::BrandIs(brand_id) => {
                qb.push(" AND p.brand_id = ")
                    .push_bind(brand_id.as_str().to_owned());
            }
            Constraint::CategoryAny(terms) => {
                let patterns: Vec<String> = terms.iter().map(|t| contains_pattern(t)).collect();
                qb.push(
                    " AND EXISTS (SELECT 1 FROM product_categories pc \
                     JOIN categories c ON c.id = pc.category_id \
                     WHERE pc.product_id = p.id AND c.title ILIKE ANY(",
                )
                .push_bind(patterns)
                .push("))");
            }
            Constraint::PriceAtLeast(min) => {
                qb.push(" AND p.price >= ").push_bind(*min);
            }
            Constraint::PriceAtMost(max) => {
                qb.push(" AND p.price <= ").push_bind(*max);
            }
            Constraint::AvailableOnly => {
                qb.push(" AND p.is_available");
            }
        }
    }
}

/// Render an ordering, with `p.id` as a stable tie-breaker.
pub fn push_ordering(qb: &mut QueryBuilder<'_, Postgres>, ordering: Ordering) {
    let expr = match ordering.field {
        OrderField::Price => "p.price",
        OrderField::Title => "p.title",
        OrderField::OrderCount => {
            "(SELECT COUNT(*) FROM order_items oi WHERE oi.product_id = p.id)"
        }
    };
    let direction = match ordering.direction {
        Direction::Asc => "ASC",
        Direction::Desc => "DESC",
    };
    qb.push(format!(" ORDER BY {expr} {direction}, p.id ASC"));
}

#[cfg(test)]
mod tests {
    use bazaar_core::catalog::{FilterState, build_query, count_query};

    use super::*;

    fn where_clause(query: &str) -> String {
        let state = FilterState::from_query_string(query).unwrap_or_default();
        let mut qb = QueryBuilder::<Postgres>::new("");
        push_predicate(&mut qb, &build_query(&state).predicate);
        qb.into_sql()
    }

    #[test]
    fn test_unconstrained_predicate() {
        assert_eq!(where_clause(""), " WHERE TRUE");
    }

    #[test]
    fn test_predicate_sql_uses_binds_in_order() {
        let sql = where_clause(
            "search=hat&brand=acme&category=Hats&minPrice=1&maxPrice=9&sort=title_asc",
        );
        assert_eq!(
            sql,
            " WHERE TRUE AND p.title ILIKE $1 AND p.brand_id = $2 \
             AND EXISTS (SELECT 1 FROM product_categories pc \
             JOIN categories c ON c.id = pc.category_id \
             WHERE pc.product_id = p.id AND c.title ILIKE ANY($3)) \
             AND p.price >= $4 AND p.price <= $5 AND p.is_available"
        );
    }

    #[test]
    fn test_listing_and_count_render_same_where_clause() {
        let state = FilterState::from_query_string("category=Shoes%2BHats&sort=popularity")
            .unwrap_or_default();

        let mut list = QueryBuilder::<Postgres>::new("");
        push_predicate(&mut list, &build_query(&state).predicate);
        let mut count = QueryBuilder::<Postgres>::new("");
        push_predicate(&mut count, &count_query(&state).predicate);

        assert_eq!(list.into_sql(), count.into_sql());
    }

    #[test]
    fn test_ordering_sql() {
        let mut qb = QueryBuilder::<Postgres>::new("");
        push_ordering(
            &mut qb,
            Ordering {
                field: OrderField::Price,
                direction: Direction::Desc,
            },
        );
        assert_eq!(qb.into_sql(), " ORDER BY p.price DESC, p.id ASC");
    }
}
