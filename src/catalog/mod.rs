//! Catalog module - resolves identifiers against the remote catalog API.
//!
//! # Architecture
//!
//! Split by concern, one file each:
//! - **Domain** (`domain.rs`) - request tagging and errors
//! - **DTOs** (`dto.rs`) - exact API response shapes
//! - **Adapter** (`adapter.rs`) - converts DTOs to [`TrackRecord`](crate::model::TrackRecord)s
//! - **Client** (`client.rs`) - builds the templated GET requests
//! - **Traits** (`traits.rs`) - the HTTP-JSON fetch seam, with mocks for tests

pub mod adapter;
pub mod domain;
pub mod dto;
mod client;
pub mod traits;

pub use client::CatalogClient;
pub use domain::{ISRC_PREFIX, ResolveError, ResolveRequest, SEARCH_PLAYLIST_PREFIX, SEARCH_PREFIX};
pub use traits::JsonFetcher;
