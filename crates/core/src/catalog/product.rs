//! Product, brand and category records as exchanged over the API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{BrandId, CategoryId, ProductId};

/// A product brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub title: String,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
}

/// A catalog product.
///
/// This is also the snapshot stored inside guest cart items, so it carries
/// everything the cart needs to render and price a line without a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    pub stock: u32,
    pub is_available: bool,
    #[serde(default)]
    pub brand: Option<Brand>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Product {
    /// Price after discount, never below zero.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        (self.price - self.discount).max(Decimal::ZERO)
    }

    /// First image, used as the thumbnail.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// One page of a catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub products: Vec<Product>,
    pub total_items: u64,
    pub total_pages: u64,
    pub pages_left: u64,
    pub current_page: u32,
}

impl CatalogPage {
    /// Assemble a page from a listing result and its total count.
    #[must_use]
    pub fn new(
        products: Vec<Product>,
        total_items: u64,
        current_page: u32,
        page_size: u32,
    ) -> Self {
        let total_pages = total_items.div_ceil(u64::from(page_size.max(1)));
        Self {
            products,
            total_items,
            total_pages,
            pages_left: total_pages.saturating_sub(u64::from(current_page)),
            current_page,
        }
    }

    /// An empty first page.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            products: Vec::new(),
            total_items: 0,
            total_pages: 0,
            pages_left: 0,
            current_page: 1,
        }
    }
}

/// Brand and category choices offered by the filter UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogOptions {
    pub brands: Vec<Brand>,
    pub categories: Vec<Category>,
}
