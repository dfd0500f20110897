//! Client for the managed book store.
//!
//! The store speaks the PostgREST dialect (Supabase and friends): one REST
//! resource per table, filters and ordering encoded as query parameters.

pub mod client;
pub mod error;
pub mod query;

pub use client::StoreClient;
pub use error::StoreError;
pub use query::{Filter, Order, Query};
