//! Order report handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use bazaar_core::catalog::CatalogOptions;
use bazaar_core::report::{OrderReport, ReportFilter, ReportParams};
use tracing::instrument;

use crate::db::ReportRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Orders matching the filter, grouped by day, with the top products.
///
/// Validation runs before any query, so a malformed date or page is a 400
/// without touching the database.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(params): Query<ReportParams>,
) -> Result<Json<OrderReport>> {
    let filter = ReportFilter::try_from(&params)?;
    let report = ReportRepository::new(state.pool()).report(&filter).await?;
    tracing::debug!(
        days = report.days.len(),
        top = report.top_products.len(),
        "report built"
    );
    Ok(Json(report))
}

/// Brands and categories for the report filter controls.
#[instrument(skip_all)]
pub async fn options(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<CatalogOptions>> {
    let options = ReportRepository::new(state.pool()).options().await?;
    Ok(Json(options))
}
