//! Cross-sell ("you may also like") recommendation merging.

use std::collections::HashSet;

use crate::catalog::Product;
use crate::types::ProductId;

/// Parse a comma-joined `ids` parameter.
///
/// Blank entries are skipped and duplicates collapsed, keeping first order.
#[must_use]
pub fn parse_ids(raw: &str) -> Vec<ProductId> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(*id))
        .map(ProductId::from)
        .collect()
}

/// Merge the cross-sell lists of several products.
///
/// The result holds each product once (first occurrence wins) and never
/// contains one of the `inputs`.
#[must_use]
pub fn merge<I>(inputs: &[ProductId], cross_sells: I) -> Vec<Product>
where
    I: IntoIterator<Item = Product>,
{
    let mut seen: HashSet<ProductId> = inputs.iter().cloned().collect();
    cross_sells
        .into_iter()
        .filter(|product| seen.insert(product.id.clone()))
        .collect()
}
