//! Admin order reports: filter parameters and report shapes.
//!
//! The admin dashboard lists orders matching a brand, a set of category
//! terms and a calendar-day range, grouped per day, alongside the best
//! selling products for the same order set.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::filter::CATEGORY_SEPARATOR;
use crate::types::{BrandId, OrderId, ProductId};

/// Orders per report page.
pub const REPORT_PAGE_SIZE: u32 = 12;

/// Number of entries in the top products summary.
pub const TOP_PRODUCTS_LIMIT: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("{param} must be a date in YYYY-MM-DD format (got '{value}')")]
    InvalidDate { param: &'static str, value: String },

    #[error("startDate cannot be after endDate ({start} > {end})")]
    DateRangeInverted { start: NaiveDate, end: NaiveDate },

    #[error("page must be a whole number of at least 1 (got '{0}')")]
    InvalidPage(String),
}

/// Raw report query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub categories: Option<String>,
    pub brand: Option<String>,
    pub page: Option<String>,
}

/// Validated report filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFilter {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    category_terms: BTreeSet<String>,
    brand_id: Option<BrandId>,
    page: u32,
}

impl TryFrom<&ReportParams> for ReportFilter {
    type Error = ReportError;

    fn try_from(params: &ReportParams) -> Result<Self, Self::Error> {
        let start_date = parse_date("startDate", params.start_date.as_deref())?;
        let end_date = parse_date("endDate", params.end_date.as_deref())?;
        if let (Some(start), Some(end)) = (start_date, end_date)
            && start > end
        {
            return Err(ReportError::DateRangeInverted { start, end });
        }

        let page = match non_empty(params.page.as_deref()) {
            None => 1,
            Some(raw) => match raw.parse::<u32>() {
                Ok(page) if page >= 1 => page,
                _ => return Err(ReportError::InvalidPage(raw.to_string())),
            },
        };

        let category_terms = non_empty(params.categories.as_deref())
            .map(|raw| {
                raw.split(CATEGORY_SEPARATOR)
                    .map(str::trim)
                    .filter(|term| !term.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            start_date,
            end_date,
            category_terms,
            brand_id: non_empty(params.brand.as_deref()).map(BrandId::from),
            page,
        })
    }
}

impl ReportFilter {
    #[must_use]
    pub const fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    #[must_use]
    pub const fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    #[must_use]
    pub const fn category_terms(&self) -> &BTreeSet<String> {
        &self.category_terms
    }

    #[must_use]
    pub const fn brand_id(&self) -> Option<&BrandId> {
        self.brand_id.as_ref()
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Offset of the first order on the current page.
    #[must_use]
    pub fn page_offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(REPORT_PAGE_SIZE)
    }

    /// Inclusive lower bound: midnight UTC at the start date.
    #[must_use]
    pub fn created_from(&self) -> Option<DateTime<Utc>> {
        self.start_date
            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
    }

    /// Exclusive upper bound: midnight UTC after the end date, so the whole
    /// end day is included.
    #[must_use]
    pub fn created_before(&self) -> Option<DateTime<Utc>> {
        self.end_date.map(|date| {
            let next = date
                .checked_add_signed(TimeDelta::days(1))
                .unwrap_or(NaiveDate::MAX);
            next.and_time(NaiveTime::MIN).and_utc()
        })
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub title: String,
    pub image: Option<String>,
    pub count: u32,
    pub price: Decimal,
    pub discount: Decimal,
}

/// An order as shown in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: OrderId,
    pub number: i64,
    pub status: String,
    pub total: Decimal,
    pub shipping: Decimal,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderLine>,
}

/// Orders placed on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub orders: Vec<OrderSummary>,
}

/// Best-selling product over the filtered order set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: ProductId,
    pub title: String,
    pub image: Option<String>,
    pub total_quantity: u64,
    pub order_count: u64,
}

/// Full report response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReport {
    pub days: Vec<DayGroup>,
    pub top_products: Vec<TopProduct>,
    pub current_page: u32,
}

/// Group orders by creation day, newest day first.
///
/// Orders keep their relative order within a day.
#[must_use]
pub fn group_by_day(orders: Vec<OrderSummary>) -> Vec<DayGroup> {
    let mut days: Vec<DayGroup> = Vec::new();
    for order in orders {
        let date = order.created_at.date_naive();
        match days.iter_mut().find(|day| day.date == date) {
            Some(day) => day.orders.push(order),
            None => days.push(DayGroup {
                date,
                orders: vec![order],
            }),
        }
    }
    days.sort_by(|a, b| b.date.cmp(&a.date));
    days
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(param: &'static str, raw: Option<&str>) -> Result<Option<NaiveDate>, ReportError> {
    non_empty(raw)
        .map(|value| {
            // Accept full timestamps too; only the calendar day matters.
            let day = value.get(..10).unwrap_or(value);
            NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| ReportError::InvalidDate {
                param,
                value: value.to_string(),
            })
        })
        .transpose()
}
