//! Product catalog: product model, filter state and query building.
//!
//! The flow is always the same:
//!
//! ```text
//! FilterParams (raw URL state) --validate--> FilterState --build--> QueryDescriptor
//!                                                        \--count--> CountQuery
//! ```
//!
//! Both descriptors carry the same [`Predicate`], so a listing and its total
//! count can never disagree for a given filter state.

pub mod filter;
pub mod product;
pub mod query;

pub use filter::{FilterError, FilterKey, FilterParams, FilterState, SortKey};
pub use product::{Brand, CatalogOptions, CatalogPage, Category, Product};
pub use query::{
    CatalogQueryBuilder, Constraint, CountQuery, DEFAULT_PAGE_SIZE, Direction, OrderField,
    Ordering, Predicate, QueryDescriptor, build_query, count_query,
};
