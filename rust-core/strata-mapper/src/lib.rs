// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Strata Record Mapper
//
// This crate binds serde-serializable record types to domains of a sparse
// key/attribute store. One `Mapper` owns one record type in one domain:
// writes flatten the record into dot-path attributes, reads rebuild it,
// and the optional record-type discriminator lets several mappers share a
// domain without interference.
//
// # Modules
//
// - [`mapper`] -- The `Mapper` itself, its configuration, and the
//   `RECORD_TYPE_ATTR` discriminator constant.
// - [`error`] -- The `MapperError` enum joining format and transport
//   failures.
//
// # Example
//
// ```rust
// use serde::{Deserialize, Serialize};
// use strata_client::MemoryStore;
// use strata_mapper::{Mapper, MapperConfig};
//
// #[derive(Debug, PartialEq, Serialize, Deserialize)]
// struct Task {
//     id: String,
//     title: String,
// }
//
// # tokio_test::block_on(async {
// let mapper: Mapper<Task, _> = Mapper::new(
//     MemoryStore::new(),
//     MapperConfig::new("tasks", "id").with_record_type("task"),
// );
// mapper.create().await.unwrap();
//
// mapper.put(&Task { id: "t1".into(), title: "write docs".into() }).await.unwrap();
//
// let query = mapper.query().filter("`title` = ?", &["write docs".into()]);
// let page = mapper.select(query, None).await.unwrap();
// assert_eq!(page.items.len(), 1);
// # });
// ```

pub mod error;
pub mod mapper;

// Re-export the most commonly used types at the crate root for convenience.
pub use error::MapperError;
pub use mapper::{Mapper, MapperConfig, Page, RECORD_TYPE_ATTR};
