// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Strata Attribute Store Clients
//
// This crate defines the transport layer the Strata mapper talks through.
// The core `AttributeStore` trait captures the operations of a sparse
// key/attribute store: domain management, per-item attribute reads and
// writes, and paginated select expressions.
//
// # Modules
//
// - [`store`] -- The `AttributeStore` trait plus the `Item`/`ItemPage`
//   result types.
// - [`error`] -- The `ClientError` enum covering all transport failure
//   modes, with retryability classification.
// - [`memory`] -- An in-memory store that evaluates select expressions,
//   for testing and ephemeral workloads.
// - [`retry`] -- A transparent wrapper that retries throttled and
//   server-side failures with a bounded backoff.
//
// # Example
//
// ```rust
// use strata_client::{AttributeStore, MemoryStore, RetryPolicy, RetryStore};
// use strata_format::{AttrValue, AttributeMap};
//
// # tokio_test::block_on(async {
// let store = RetryStore::new(MemoryStore::new(), RetryPolicy::default());
// store.create_domain("inventory").await.unwrap();
//
// let mut attrs = AttributeMap::new();
// attrs.insert("kind".into(), AttrValue::Single("\"gear\"".into()));
// store.put_attributes("inventory", "item-1", &attrs).await.unwrap();
//
// let page = store
//     .select("SELECT * FROM `inventory` WHERE (`kind` = '\"gear\"')", None)
//     .await
//     .unwrap();
// assert_eq!(page.items.len(), 1);
// # });
// ```

pub mod error;
pub mod memory;
mod query;
pub mod retry;
pub mod store;

// Re-export the most commonly used types at the crate root for convenience.
pub use error::ClientError;
pub use memory::MemoryStore;
pub use retry::{RetryPolicy, RetryStore};
pub use store::{AttributeStore, Item, ItemPage};
