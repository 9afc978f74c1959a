//! Catalog query descriptors.
//!
//! A [`QueryDescriptor`] is the executable form of a [`FilterState`]: a
//! predicate, an ordering and a pagination window. It is a plain value so
//! it can be compared, logged and rendered into SQL by the services. The
//! companion [`CountQuery`] carries the same predicate, which is what keeps
//! a listing and its total count consistent.

use rust_decimal::Decimal;

use super::filter::{FilterState, SortKey};
use super::product::Product;
use crate::types::BrandId;

/// Default number of products per catalog page.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// A single field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// Case-insensitive substring match on the product title.
    TitleContains(String),
    /// Exact brand id match.
    BrandIs(BrandId),
    /// Product has at least one category whose title contains any term
    /// (case-insensitive).
    CategoryAny(Vec<String>),
    /// Price is at least this value (inclusive).
    PriceAtLeast(Decimal),
    /// Price is at most this value (inclusive).
    PriceAtMost(Decimal),
    /// Only products flagged as available.
    AvailableOnly,
}

impl Constraint {
    /// Evaluate this constraint against an in-memory product.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Self::TitleContains(term) => contains_ignore_case(&product.title, term),
            Self::BrandIs(brand_id) => product
                .brand
                .as_ref()
                .is_some_and(|brand| &brand.id == brand_id),
            Self::CategoryAny(terms) => product.categories.iter().any(|category| {
                terms
                    .iter()
                    .any(|term| contains_ignore_case(&category.title, term))
            }),
            Self::PriceAtLeast(min) => product.price >= *min,
            Self::PriceAtMost(max) => product.price <= *max,
            Self::AvailableOnly => product.is_available,
        }
    }
}

/// Conjunction of constraints.
///
/// An empty predicate matches every product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Predicate {
    constraints: Vec<Constraint>,
}

impl Predicate {
    /// Constraints in the order they are applied.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Whether the predicate restricts results to available products.
    #[must_use]
    pub fn requires_available(&self) -> bool {
        self.constraints.contains(&Constraint::AvailableOnly)
    }

    /// Evaluate every constraint against an in-memory product.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.constraints.iter().all(|c| c.matches(product))
    }

    fn from_state(state: &FilterState) -> Self {
        let mut constraints = Vec::new();

        if let Some(term) = state.search_term() {
            constraints.push(Constraint::TitleContains(term.to_string()));
        }
        if let Some(brand_id) = state.brand_id() {
            constraints.push(Constraint::BrandIs(brand_id.clone()));
        }
        if !state.category_terms().is_empty() {
            constraints.push(Constraint::CategoryAny(
                state.category_terms().iter().cloned().collect(),
            ));
        }
        if let Some(min) = state.min_price() {
            constraints.push(Constraint::PriceAtLeast(min));
        }
        if let Some(max) = state.max_price() {
            constraints.push(Constraint::PriceAtMost(max));
        }
        // Any explicit sort also limits the listing to available products.
        if state.is_available() == Some(true) || state.sort_key().is_some() {
            constraints.push(Constraint::AvailableOnly);
        }

        Self { constraints }
    }
}

/// Field a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderField {
    Price,
    Title,
    /// Number of orders containing the product.
    OrderCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

/// Listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ordering {
    pub field: OrderField,
    pub direction: Direction,
}

impl Ordering {
    /// Ordering for a sort key; no sort key means popularity.
    #[must_use]
    pub const fn for_sort(sort: Option<SortKey>) -> Self {
        let (field, direction) = match sort {
            Some(SortKey::MostExpensive) => (OrderField::Price, Direction::Desc),
            Some(SortKey::LeastExpensive) => (OrderField::Price, Direction::Asc),
            Some(SortKey::TitleAsc) => (OrderField::Title, Direction::Asc),
            Some(SortKey::TitleDesc) => (OrderField::Title, Direction::Desc),
            Some(SortKey::Popularity) | None => (OrderField::OrderCount, Direction::Desc),
        };
        Self { field, direction }
    }
}

/// Executable listing query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryDescriptor {
    pub predicate: Predicate,
    pub ordering: Ordering,
    pub page_offset: u64,
    pub page_size: u32,
}

impl QueryDescriptor {
    /// One-based page number this window corresponds to.
    #[must_use]
    pub fn page(&self) -> u32 {
        let page = self.page_offset / u64::from(self.page_size.max(1)) + 1;
        u32::try_from(page).unwrap_or(u32::MAX)
    }

    /// The matching count query.
    #[must_use]
    pub fn count_query(&self) -> CountQuery {
        CountQuery {
            predicate: self.predicate.clone(),
        }
    }
}

/// Executable count query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CountQuery {
    pub predicate: Predicate,
}

/// Builds descriptors with a fixed page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogQueryBuilder {
    page_size: u32,
}

impl Default for CatalogQueryBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl CatalogQueryBuilder {
    /// Create a builder. A page size of 0 is treated as 1.
    #[must_use]
    pub const fn new(page_size: u32) -> Self {
        Self {
            page_size: if page_size == 0 { 1 } else { page_size },
        }
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Listing query for a filter state.
    #[must_use]
    pub fn build(&self, state: &FilterState) -> QueryDescriptor {
        QueryDescriptor {
            predicate: Predicate::from_state(state),
            ordering: Ordering::for_sort(state.sort_key()),
            page_offset: u64::from(state.page() - 1) * u64::from(self.page_size),
            page_size: self.page_size,
        }
    }

    /// Count query for a filter state; shares the listing predicate.
    #[must_use]
    pub fn count(&self, state: &FilterState) -> CountQuery {
        CountQuery {
            predicate: Predicate::from_state(state),
        }
    }
}

/// [`CatalogQueryBuilder::build`] with the default page size.
#[must_use]
pub fn build_query(state: &FilterState) -> QueryDescriptor {
    CatalogQueryBuilder::default().build(state)
}

/// [`CatalogQueryBuilder::count`] with the default page size.
#[must_use]
pub fn count_query(state: &FilterState) -> CountQuery {
    CatalogQueryBuilder::default().count(state)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
