//! Filter, search and paged-fetch coordination for inventory list screens.
//!
//! A screen (product catalog, inventory-entry log, audit log) owns one
//! [`fetch::PageCoordinator`]. The view feeds it intents (typed search text,
//! filter edits, "clear all", scroll position, refresh) and reads back the
//! loaded items, totals and loading/error state. The coordinator debounces
//! search, keeps cascaded filters consistent, and turns every change into at
//! most one believed request against a [`api::ListApi`].
//!
//! ```ignore
//! use stockroom::api::HttpListApi;
//! use stockroom::fetch::{CoordinatorOptions, PageCoordinator};
//! use stockroom::filter::FilterPatch;
//! use stockroom::screen::{ProductField, ProductScreen};
//!
//! let api = Arc::new(HttpListApi::<ProductScreen>::from_config(&config)?);
//! let mut products = PageCoordinator::new(api, CoordinatorOptions::from_config::<ProductScreen>(&config));
//! products.apply_filters(&FilterPatch::new().set(ProductField::Category, "raw"))?;
//! let event = products.next_event().await;
//! ```

pub mod api;
pub mod config;
pub mod debounce;
pub mod fetch;
pub mod filter;
pub mod screen;
pub mod scroll;
