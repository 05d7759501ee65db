// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Core attribute store trait for Strata.
//
// Defines the `AttributeStore` trait that transport clients implement.
// The trait speaks the store's native vocabulary: domains, item
// identifiers, flat attribute maps, and paginated select expressions.
// Implementations are expected to be thread-safe (`Send + Sync`) and
// fully asynchronous.

use async_trait::async_trait;

use strata_format::AttributeMap;

use crate::error::ClientError;

/// One item returned by a select: its identifier plus attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// The store-assigned item identifier.
    pub id: String,
    /// The item's attributes, with `[]`-suffixed names collected into
    /// multi-valued entries.
    pub attrs: AttributeMap,
}

/// One page of select results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPage {
    /// Items in this page.
    pub items: Vec<Item>,
    /// Opaque continuation token. Passing it back verbatim to the next
    /// `select` call resumes the same logical scan; `None` means the scan
    /// is exhausted.
    pub next: Option<String>,
}

/// A client for a sparse key/attribute store.
///
/// All operations address a domain by name on every call. Retrieval of a
/// missing item returns `Ok(None)` rather than an error. Consistency is
/// an implementation concern: stores that support a consistent-read mode
/// expose it as a construction option, not through this interface.
#[async_trait]
pub trait AttributeStore: Send + Sync {
    /// Create `domain`. Creating an existing domain is a no-op.
    async fn create_domain(&self, domain: &str) -> Result<(), ClientError>;

    /// Destroy `domain` and everything in it. Idempotent.
    async fn delete_domain(&self, domain: &str) -> Result<(), ClientError>;

    /// Fetch the attributes of item `id`, optionally restricted to
    /// `names`. Returns `Ok(None)` when the item does not exist or none
    /// of the requested attributes are present.
    async fn get_attributes(
        &self,
        domain: &str,
        id: &str,
        names: Option<&[String]>,
    ) -> Result<Option<AttributeMap>, ClientError>;

    /// Write `attrs` to item `id`, replacing each named attribute and
    /// leaving unnamed attributes untouched.
    async fn put_attributes(
        &self,
        domain: &str,
        id: &str,
        attrs: &AttributeMap,
    ) -> Result<(), ClientError>;

    /// Delete item `id` entirely, or only the attributes listed in
    /// `names`.
    async fn delete_attributes(
        &self,
        domain: &str,
        id: &str,
        names: Option<&[String]>,
    ) -> Result<(), ClientError>;

    /// Run a select expression, resuming from the continuation token of a
    /// previous page when given.
    async fn select(&self, query: &str, next: Option<&str>) -> Result<ItemPage, ClientError>;

    /// A human-readable name for this client, used in logging.
    fn name(&self) -> &str;
}
