//! Order report queries.
//!
//! The orders page and the top-products summary are both restricted by
//! [`push_report_filter`], so the summary always describes the same order
//! set the pages walk through.

use std::collections::HashMap;

use bazaar_core::catalog::{Brand, CatalogOptions, Category};
use bazaar_core::pattern::contains_pattern;
use bazaar_core::report::{
    OrderLine, OrderReport, OrderSummary, REPORT_PAGE_SIZE, ReportFilter, TOP_PRODUCTS_LIMIT,
    TopProduct, group_by_day,
};
use bazaar_core::{BrandId, CategoryId, OrderId, ProductId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use super::RepositoryError;

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    number: i64,
    status: String,
    total: Decimal,
    shipping: Decimal,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct LineRow {
    order_id: String,
    product_id: String,
    title: String,
    image: Option<String>,
    count: i32,
    price: Decimal,
    discount: Decimal,
}

#[derive(Debug, FromRow)]
struct TopProductRow {
    product_id: String,
    title: String,
    image: Option<String>,
    total_quantity: i64,
    order_count: i64,
}

#[derive(Debug, FromRow)]
struct OptionRow {
    id: String,
    title: String,
}

/// Repository for admin report reads.
pub struct ReportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportRepository<'a> {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Build the full report for a filter: one page of orders grouped by
    /// day plus the top products over every matching order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails or a row is out of range.
    #[instrument(skip(self, filter), fields(page = filter.page()))]
    pub async fn report(&self, filter: &ReportFilter) -> Result<OrderReport, RepositoryError> {
        let (orders, top_products) =
            tokio::try_join!(self.orders_page(filter), self.top_products(filter))?;

        Ok(OrderReport {
            days: group_by_day(orders),
            top_products,
            current_page: filter.page(),
        })
    }

    /// One page of matching orders, newest first, with their lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails or a row is out of range.
    pub async fn orders_page(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT o.id, o.number, o.status, o.total, o.shipping, o.created_at FROM orders o",
        );
        push_report_filter(&mut qb, filter);
        qb.push(" ORDER BY o.created_at DESC, o.number DESC LIMIT ")
            .push_bind(i64::from(REPORT_PAGE_SIZE))
            .push(" OFFSET ")
            .push_bind(i64::try_from(filter.page_offset()).unwrap_or(i64::MAX));

        let orders = qb.build_query_as::<OrderRow>().fetch_all(self.pool).await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();
        let mut lines = self.lines(&ids).await?;

        Ok(orders
            .into_iter()
            .map(|order| OrderSummary {
                items: lines.remove(&order.id).unwrap_or_default(),
                id: OrderId::new(order.id),
                number: order.number,
                status: order.status,
                total: order.total,
                shipping: order.shipping,
                created_at: order.created_at,
            })
            .collect())
    }

    /// Best-selling products over every order matching the filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails or an aggregate is negative.
    pub async fn top_products(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<TopProduct>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT p.id AS product_id, p.title, p.images[1] AS image, \
             SUM(oi.count)::BIGINT AS total_quantity, \
             COUNT(DISTINCT oi.order_id) AS order_count \
             FROM order_items oi JOIN products p ON p.id = oi.product_id \
             WHERE oi.order_id IN (SELECT o.id FROM orders o",
        );
        push_report_filter(&mut qb, filter);
        qb.push(") GROUP BY p.id ORDER BY total_quantity DESC, p.id ASC LIMIT ")
            .push_bind(i64::from(TOP_PRODUCTS_LIMIT));

        qb.build_query_as::<TopProductRow>()
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(TopProductRow::into_top_product)
            .collect()
    }

    /// Brands and categories available as report filters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
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

    async fn lines(
        &self,
        order_ids: &[String],
    ) -> Result<HashMap<String, Vec<OrderLine>>, RepositoryError> {
        let rows = sqlx::query_as::<_, LineRow>(
            "SELECT oi.order_id, oi.product_id, p.title, p.images[1] AS image, \
             oi.count, oi.price, oi.discount \
             FROM order_items oi JOIN products p ON p.id = oi.product_id \
             WHERE oi.order_id = ANY($1) ORDER BY p.title, oi.product_id",
        )
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut lines: HashMap<String, Vec<OrderLine>> = HashMap::new();
        for row in rows {
            let count = u32::try_from(row.count).map_err(|_| {
                RepositoryError::DataCorruption(format!(
                    "order {} has negative count {} for {}",
                    row.order_id, row.count, row.product_id
                ))
            })?;
            lines.entry(row.order_id).or_default().push(OrderLine {
                product_id: ProductId::new(row.product_id),
                title: row.title,
                image: row.image,
                count,
                price: row.price,
                discount: row.discount,
            });
        }
        Ok(lines)
    }
}

impl TopProductRow {
    fn into_top_product(self) -> Result<TopProduct, RepositoryError> {
        let corrupt =
            |what: &str, v: i64| RepositoryError::DataCorruption(format!("negative {what} {v}"));
        Ok(TopProduct {
            total_quantity: u64::try_from(self.total_quantity)
                .map_err(|_| corrupt("quantity", self.total_quantity))?,
            order_count: u64::try_from(self.order_count)
                .map_err(|_| corrupt("order count", self.order_count))?,
            product_id: ProductId::new(self.product_id),
            title: self.title,
            image: self.image,
        })
    }
}

/// Render a report filter as a `WHERE` clause on `orders o`.
///
/// Brand and category terms match orders containing at least one item whose
/// product satisfies them. Dates form an inclusive calendar-day range.
pub fn push_report_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ReportFilter) {
    qb.push(" WHERE TRUE");
    if let Some(from) = filter.created_from() {
        qb.push(" AND o.created_at >= ").push_bind(from);
    }
    if let Some(before) = filter.created_before() {
        qb.push(" AND o.created_at < ").push_bind(before);
    }
    if let Some(brand_id) = filter.brand_id() {
        qb.push(
            " AND EXISTS (SELECT 1 FROM order_items fi JOIN products fp ON fp.id = fi.product_id \
             WHERE fi.order_id = o.id AND fp.brand_id = ",
        )
        .push_bind(brand_id.as_str().to_owned())
        .push(")");
    }
    if !filter.category_terms().is_empty() {
        let patterns: Vec<String> = filter
            .category_terms()
            .iter()
            .map(|t| contains_pattern(t))
            .collect();
        qb.push(
            " AND EXISTS (SELECT 1 FROM order_items fi \
             JOIN product_categories pc ON pc.product_id = fi.product_id \
             JOIN categories c ON c.id = pc.category_id \
             WHERE fi.order_id = o.id AND c.title ILIKE ANY(",
        )
        .push_bind(patterns)
        .push("))");
    }
}
