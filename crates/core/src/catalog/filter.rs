//! Catalog filter state.
//!
//! [`FilterParams`] is the raw, string-typed URL state the filter UI edits.
//! It is the single source of truth for what the shopper asked for and is
//! what gets shared and bookmarked. [`FilterState`] is the validated form
//! that the query builder consumes; it can only be obtained through
//! validation, so a `FilterState` in hand always satisfies its invariants
//! (`page >= 1`, `min_price <= max_price`, non-negative prices).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::form_urlencoded;

use crate::types::BrandId;

/// Separator between category terms in the `category` parameter.
pub const CATEGORY_SEPARATOR: char = '+';

/// Errors produced while validating filter input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("{param} must be a valid number (got '{value}')")]
    InvalidPrice { param: &'static str, value: String },

    #[error("{param} cannot be negative")]
    NegativePrice { param: &'static str },

    #[error("Minimum price cannot be greater than maximum price ({min} > {max})")]
    PriceRangeInverted { min: Decimal, max: Decimal },

    #[error("page must be a whole number of at least 1 (got '{0}')")]
    InvalidPage(String),

    #[error("unknown sort key '{0}'")]
    InvalidSort(String),

    #[error("isAvailable must be 'true' or 'false' (got '{0}')")]
    InvalidAvailability(String),
}

/// Sort orders offered by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    MostExpensive,
    LeastExpensive,
    TitleAsc,
    TitleDesc,
    Popularity,
}

impl SortKey {
    /// All sort keys, in the order the UI lists them.
    pub const ALL: [Self; 5] = [
        Self::MostExpensive,
        Self::LeastExpensive,
        Self::TitleAsc,
        Self::TitleDesc,
        Self::Popularity,
    ];

    /// Query parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MostExpensive => "most_expensive",
            Self::LeastExpensive => "least_expensive",
            Self::TitleAsc => "title_asc",
            Self::TitleDesc => "title_desc",
            Self::Popularity => "popularity",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MostExpensive => "Most Expensive",
            Self::LeastExpensive => "Least Expensive",
            Self::TitleAsc => "Title Ascending",
            Self::TitleDesc => "Title Descending",
            Self::Popularity => "Popularity",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| FilterError::InvalidSort(s.to_string()))
    }
}

/// Names of the filter query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    Search,
    Brand,
    Category,
    MinPrice,
    MaxPrice,
    IsAvailable,
    Sort,
    Page,
}

impl FilterKey {
    /// All keys in canonical query-string order.
    pub const ALL: [Self; 8] = [
        Self::Search,
        Self::Brand,
        Self::Category,
        Self::MinPrice,
        Self::MaxPrice,
        Self::IsAvailable,
        Self::Sort,
        Self::Page,
    ];

    /// Query parameter name.
    #[must_use]
    pub const fn param_name(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Brand => "brand",
            Self::Category => "category",
            Self::MinPrice => "minPrice",
            Self::MaxPrice => "maxPrice",
            Self::IsAvailable => "isAvailable",
            Self::Sort => "sort",
            Self::Page => "page",
        }
    }

    /// Look up a key by its query parameter name.
    #[must_use]
    pub fn from_param(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.param_name() == name)
    }
}

/// Raw filter query parameters, exactly as they appear in the URL.
///
/// Deserializes directly from an axum `Query` extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    pub search: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub is_available: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

impl FilterParams {
    /// Parse raw parameters from a query string (with or without leading `?`).
    ///
    /// Unknown parameters are ignored; a repeated parameter keeps its last value.
    #[must_use]
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::default();
        for (name, value) in form_urlencoded::parse(query.as_bytes()) {
            if let Some(key) = FilterKey::from_param(&name) {
                *params.slot_mut(key) = normalize(Some(&value));
            }
        }
        params
    }

    /// Serialize to a query string in canonical parameter order (no leading `?`).
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for key in FilterKey::ALL {
            if let Some(value) = self.get(key) {
                serializer.append_pair(key.param_name(), value);
            }
        }
        serializer.finish()
    }

    /// Current value of a parameter.
    #[must_use]
    pub fn get(&self, key: FilterKey) -> Option<&str> {
        match key {
            FilterKey::Search => self.search.as_deref(),
            FilterKey::Brand => self.brand.as_deref(),
            FilterKey::Category => self.category.as_deref(),
            FilterKey::MinPrice => self.min_price.as_deref(),
            FilterKey::MaxPrice => self.max_price.as_deref(),
            FilterKey::IsAvailable => self.is_available.as_deref(),
            FilterKey::Sort => self.sort.as_deref(),
            FilterKey::Page => self.page.as_deref(),
        }
    }

    /// Set or clear a parameter.
    ///
    /// Values are trimmed and an empty value removes the parameter. Changing
    /// any parameter other than `page` sends the shopper back to the first
    /// page.
    pub fn set(&mut self, key: FilterKey, value: Option<&str>) {
        let value = normalize(value);
        if key != FilterKey::Page && self.get(key) != value.as_deref() {
            self.page = None;
        }
        *self.slot_mut(key) = value;
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, key: FilterKey, value: &str) -> Self {
        self.set(key, Some(value));
        self
    }

    /// Drop sort, brand, category and price filters (the "Clear Filters" action).
    ///
    /// Search text and the availability toggle are kept.
    pub fn clear_filters(&mut self) {
        for key in [
            FilterKey::Sort,
            FilterKey::Brand,
            FilterKey::Category,
            FilterKey::MinPrice,
            FilterKey::MaxPrice,
        ] {
            self.set(key, None);
        }
    }

    /// Number of active filters, as shown on the filter badge.
    ///
    /// Sort, brand, each category term and each price bound count once.
    #[must_use]
    pub fn active_filter_count(&self) -> usize {
        let singles = [&self.sort, &self.brand, &self.min_price, &self.max_price]
            .into_iter()
            .filter(|value| value.is_some())
            .count();
        let categories = self
            .category
            .as_deref()
            .map_or(0, |category| split_categories(category).count());
        singles + categories
    }

    /// Validate into a [`FilterState`].
    ///
    /// # Errors
    ///
    /// Returns `FilterError` if a price, page, sort key or availability flag
    /// is malformed, or if the price range is inverted.
    pub fn validate(&self) -> Result<FilterState, FilterError> {
        FilterState::try_from(self)
    }

    fn slot_mut(&mut self, key: FilterKey) -> &mut Option<String> {
        match key {
            FilterKey::Search => &mut self.search,
            FilterKey::Brand => &mut self.brand,
            FilterKey::Category => &mut self.category,
            FilterKey::MinPrice => &mut self.min_price,
            FilterKey::MaxPrice => &mut self.max_price,
            FilterKey::IsAvailable => &mut self.is_available,
            FilterKey::Sort => &mut self.sort,
            FilterKey::Page => &mut self.page,
        }
    }
}

/// Validated catalog filter state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterState {
    search_term: Option<String>,
    brand_id: Option<BrandId>,
    category_terms: BTreeSet<String>,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    is_available: Option<bool>,
    sort_key: Option<SortKey>,
    page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search_term: None,
            brand_id: None,
            category_terms: BTreeSet::new(),
            min_price: None,
            max_price: None,
            is_available: None,
            sort_key: None,
            page: 1,
        }
    }
}

impl FilterState {
    /// Parse and validate a query string.
    ///
    /// # Errors
    ///
    /// See [`FilterParams::validate`].
    pub fn from_query_string(query: &str) -> Result<Self, FilterError> {
        FilterParams::from_query_string(query).validate()
    }

    /// Serialize to a canonical query string.
    ///
    /// Equal states always produce the same string, and parsing it back
    /// yields an equal state.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.to_params().to_query_string()
    }

    /// Canonical raw parameters for this state (defaults omitted).
    #[must_use]
    pub fn to_params(&self) -> FilterParams {
        let category = if self.category_terms.is_empty() {
            None
        } else {
            Some(
                self.category_terms
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(&CATEGORY_SEPARATOR.to_string()),
            )
        };

        FilterParams {
            search: self.search_term.clone(),
            brand: self.brand_id.as_ref().map(ToString::to_string),
            category,
            min_price: self.min_price.map(|p| p.normalize().to_string()),
            max_price: self.max_price.map(|p| p.normalize().to_string()),
            is_available: self.is_available.map(|flag| flag.to_string()),
            sort: self.sort_key.map(|key| key.as_str().to_string()),
            page: (self.page > 1).then(|| self.page.to_string()),
        }
    }

    /// Same filters on a different page.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidPage` if `page` is 0.
    pub fn with_page(&self, page: u32) -> Result<Self, FilterError> {
        if page == 0 {
            return Err(FilterError::InvalidPage(page.to_string()));
        }
        Ok(Self {
            page,
            ..self.clone()
        })
    }

    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search_term.as_deref()
    }

    #[must_use]
    pub const fn brand_id(&self) -> Option<&BrandId> {
        self.brand_id.as_ref()
    }

    #[must_use]
    pub const fn category_terms(&self) -> &BTreeSet<String> {
        &self.category_terms
    }

    #[must_use]
    pub const fn min_price(&self) -> Option<Decimal> {
        self.min_price
    }

    #[must_use]
    pub const fn max_price(&self) -> Option<Decimal> {
        self.max_price
    }

    #[must_use]
    pub const fn is_available(&self) -> Option<bool> {
        self.is_available
    }

    #[must_use]
    pub const fn sort_key(&self) -> Option<SortKey> {
        self.sort_key
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }
}

impl TryFrom<&FilterParams> for FilterState {
    type Error = FilterError;

    fn try_from(params: &FilterParams) -> Result<Self, Self::Error> {
        let min_price = parse_price("minPrice", params.min_price.as_deref())?;
        let max_price = parse_price("maxPrice", params.max_price.as_deref())?;
        if let (Some(min), Some(max)) = (min_price, max_price)
            && min > max
        {
            return Err(FilterError::PriceRangeInverted { min, max });
        }

        let is_available = match normalize(params.is_available.as_deref()).as_deref() {
            None => None,
            Some("true") => Some(true),
            Some("false") => Some(false),
            Some(other) => return Err(FilterError::InvalidAvailability(other.to_string())),
        };

        let sort_key = normalize(params.sort.as_deref())
            .map(|sort| sort.parse::<SortKey>())
            .transpose()?;

        let page = match normalize(params.page.as_deref()) {
            None => 1,
            Some(raw) => match raw.parse::<u32>() {
                Ok(page) if page >= 1 => page,
                _ => return Err(FilterError::InvalidPage(raw)),
            },
        };

        let category_terms = params
            .category
            .as_deref()
            .map(|category| split_categories(category).map(str::to_string).collect())
            .unwrap_or_default();

        Ok(Self {
            search_term: normalize(params.search.as_deref()),
            brand_id: normalize(params.brand.as_deref()).map(BrandId::from),
            category_terms,
            min_price,
            max_price,
            is_available,
            sort_key,
            page,
        })
    }
}

impl TryFrom<FilterParams> for FilterState {
    type Error = FilterError;

    fn try_from(params: FilterParams) -> Result<Self, Self::Error> {
        Self::try_from(&params)
    }
}

/// Trim a raw value, treating empty as absent.
fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Split a `+`-joined category list into non-empty trimmed terms.
fn split_categories(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(CATEGORY_SEPARATOR)
        .map(str::trim)
        .filter(|term| !term.is_empty())
}

fn parse_price(param: &'static str, raw: Option<&str>) -> Result<Option<Decimal>, FilterError> {
    let Some(raw) = normalize(raw) else {
        return Ok(None);
    };
    let price = Decimal::from_str(&raw).map_err(|_| FilterError::InvalidPrice {
        param,
        value: raw.clone(),
    })?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(FilterError::NegativePrice { param });
    }
    Ok(Some(price))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = FilterParams::default().validate().unwrap();
        assert_eq!(state, FilterState::default());
        assert_eq!(state.page(), 1);
        assert_eq!(state.to_query_string(), "");
    }

    #[test]
    fn test_parse_full_query_string() {
        let state = FilterState::from_query_string(
            "?search=%20boots%20&brand=acme&category=Shoes%2BHats&minPrice=10&maxPrice=50&isAvailable=true&sort=title_desc&page=3",
        )
        .unwrap();

        assert_eq!(state.search_term(), Some("boots"));
        assert_eq!(state.brand_id(), Some(&BrandId::new("acme")));
        assert_eq!(
            state.category_terms().iter().collect::<Vec<_>>(),
            vec!["Hats", "Shoes"]
        );
        assert_eq!(state.min_price(), Some(Decimal::new(10, 0)));
        assert_eq!(state.max_price(), Some(Decimal::new(50, 0)));
        assert_eq!(state.is_available(), Some(true));
        assert_eq!(state.sort_key(), Some(SortKey::TitleDesc));
        assert_eq!(state.page(), 3);
    }

    #[test]
    fn test_query_string_round_trip_is_canonical() {
        let state = FilterParams::default()
            .with(FilterKey::Sort, "most_expensive")
            .with(FilterKey::Category, "Shoes+Hats")
            .with(FilterKey::MinPrice, "10.50")
            .validate()
            .unwrap();

        let query = state.to_query_string();
        assert_eq!(query, "category=Hats%2BShoes&minPrice=10.5&sort=most_expensive");
        assert_eq!(FilterState::from_query_string(&query).unwrap(), state);
    }

    #[test]
    fn test_category_order_does_not_matter() {
        let a = FilterParams::default().with(FilterKey::Category, "Shoes+Hats");
        let b = FilterParams::default().with(FilterKey::Category, "Hats+ +Shoes+");
        assert_eq!(a.validate().unwrap(), b.validate().unwrap());
    }

    #[test]
    fn test_non_numeric_price_is_rejected() {
        let err = FilterParams::default()
            .with(FilterKey::MinPrice, "ten")
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            FilterError::InvalidPrice {
                param: "minPrice",
                ..
            }
        ));
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let err = FilterParams::default()
            .with(FilterKey::MaxPrice, "-5")
            .validate()
            .unwrap_err();
        assert_eq!(err, FilterError::NegativePrice { param: "maxPrice" });
    }

    #[test]
    fn test_inverted_price_range_is_rejected_not_swapped() {
        let err = FilterParams::default()
            .with(FilterKey::MinPrice, "50")
            .with(FilterKey::MaxPrice, "10")
            .validate()
            .unwrap_err();
        assert!(matches!(err, FilterError::PriceRangeInverted { .. }));
        assert_eq!(
            err.to_string(),
            "Minimum price cannot be greater than maximum price (50 > 10)"
        );
    }

    #[test]
    fn test_equal_bounds_are_allowed() {
        let state = FilterParams::default()
            .with(FilterKey::MinPrice, "20")
            .with(FilterKey::MaxPrice, "20")
            .validate()
            .unwrap();
        assert_eq!(state.min_price(), state.max_price());
    }

    #[test]
    fn test_page_zero_is_rejected() {
        let err = FilterParams::default()
            .with(FilterKey::Page, "0")
            .validate()
            .unwrap_err();
        assert_eq!(err, FilterError::InvalidPage("0".to_string()));

        let err = FilterParams::default()
            .with(FilterKey::Page, "two")
            .validate()
            .unwrap_err();
        assert_eq!(err, FilterError::InvalidPage("two".to_string()));
    }

    #[test]
    fn test_unknown_sort_and_flag_are_rejected() {
        assert!(matches!(
            FilterParams::default()
                .with(FilterKey::Sort, "cheapest")
                .validate(),
            Err(FilterError::InvalidSort(_))
        ));
        assert!(matches!(
            FilterParams::default()
                .with(FilterKey::IsAvailable, "yes")
                .validate(),
            Err(FilterError::InvalidAvailability(_))
        ));
    }

    #[test]
    fn test_changing_a_filter_resets_page() {
        let mut params = FilterParams::default().with(FilterKey::Page, "4");
        assert_eq!(params.page.as_deref(), Some("4"));

        params.set(FilterKey::Brand, Some("acme"));
        assert_eq!(params.page, None);
        assert_eq!(params.validate().unwrap().page(), 1);
    }

    #[test]
    fn test_setting_same_value_keeps_page() {
        let mut params = FilterParams::default()
            .with(FilterKey::Brand, "acme")
            .with(FilterKey::Page, "2");
        params.set(FilterKey::Brand, Some(" acme "));
        assert_eq!(params.page.as_deref(), Some("2"));
    }

    #[test]
    fn test_empty_value_removes_parameter() {
        let mut params = FilterParams::default().with(FilterKey::Search, "hat");
        params.set(FilterKey::Search, Some("   "));
        assert_eq!(params.search, None);
        assert_eq!(params.to_query_string(), "");
    }

    #[test]
    fn test_active_filter_count() {
        let params = FilterParams::default()
            .with(FilterKey::Sort, "title_asc")
            .with(FilterKey::Brand, "acme")
            .with(FilterKey::Category, "Shoes+Hats+Socks")
            .with(FilterKey::MinPrice, "1")
            .with(FilterKey::Search, "ignored");
        assert_eq!(params.active_filter_count(), 6);
    }

    #[test]
    fn test_clear_filters_keeps_search_and_availability() {
        let mut params = FilterParams::default()
            .with(FilterKey::Search, "hat")
            .with(FilterKey::IsAvailable, "true")
            .with(FilterKey::Sort, "title_asc")
            .with(FilterKey::Category, "Hats")
            .with(FilterKey::MaxPrice, "9");
        params.clear_filters();
        assert_eq!(params.to_query_string(), "search=hat&isAvailable=true");
        assert_eq!(params.active_filter_count(), 0);
    }

    #[test]
    fn test_params_deserialize_camel_case() {
        let params: FilterParams =
            serde_json::from_str(r#"{"minPrice":"5","isAvailable":"true"}"#).unwrap();
        assert_eq!(params.min_price.as_deref(), Some("5"));
        assert_eq!(params.is_available.as_deref(), Some("true"));
    }
}
