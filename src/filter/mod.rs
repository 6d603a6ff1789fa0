//! Structured filter state for list screens.
//!
//! - [`value`] - filter values, field kinds and the per-screen field trait
//! - [`spec`] - ordered filter records and edit batches
//! - [`cascade`] - parent → child rules and the pure allowed-value computation
//! - [`store`] - the mutable per-screen store (filters + raw search text)

mod cascade;
mod spec;
mod store;
mod value;

pub use cascade::{allowed_values, CascadeGraph, CascadeRule, FilterOption};
pub use spec::{FilterPatch, FilterSpec};
pub use store::FilterStore;
pub use value::{FieldKind, FilterError, FilterField, FilterValue};
