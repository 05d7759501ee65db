// SPDX-License-Identifier: PMPL-1.0-or-later
//
// In-memory attribute store for Strata.
//
// Holds domains of items in nested `BTreeMap`s behind a tokio `RwLock`.
// Intended for tests, local development, and small ephemeral datasets.
// Reads are always consistent; there is no replication lag to observe.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use strata_format::AttributeMap;

use crate::error::ClientError;
use crate::query::ParsedQuery;
use crate::store::{AttributeStore, Item, ItemPage};

/// Result page size when a query carries no LIMIT clause.
const DEFAULT_PAGE_SIZE: usize = 100;

type Domain = BTreeMap<String, AttributeMap>;

/// An in-memory [`AttributeStore`].
///
/// Thread-safe via `Arc<RwLock<...>>`; clones share the same data. The
/// `select` implementation evaluates the dialect produced by the Strata
/// select builder, including offset-based continuation tokens, so
/// pagination can be exercised without a real store.
///
/// # Example
///
/// ```rust
/// use strata_client::{AttributeStore, MemoryStore};
/// use strata_format::{AttrValue, AttributeMap};
///
/// # tokio_test::block_on(async {
/// let store = MemoryStore::new();
/// store.create_domain("inventory").await.unwrap();
///
/// let mut attrs = AttributeMap::new();
/// attrs.insert("kind".into(), AttrValue::Single("\"gear\"".into()));
/// store.put_attributes("inventory", "item-1", &attrs).await.unwrap();
///
/// let found = store.get_attributes("inventory", "item-1", None).await.unwrap();
/// assert_eq!(found, Some(attrs));
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    domains: Arc<RwLock<BTreeMap<String, Domain>>>,
}

impl MemoryStore {
    /// Create an empty store with no domains.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of items currently stored in `domain`.
    pub async fn len(&self, domain: &str) -> usize {
        self.domains
            .read()
            .await
            .get(domain)
            .map_or(0, |items| items.len())
    }
}

#[async_trait]
impl AttributeStore for MemoryStore {
    async fn create_domain(&self, domain: &str) -> Result<(), ClientError> {
        let mut domains = self.domains.write().await;
        domains.entry(domain.to_string()).or_default();
        Ok(())
    }

    async fn delete_domain(&self, domain: &str) -> Result<(), ClientError> {
        let mut domains = self.domains.write().await;
        domains.remove(domain);
        Ok(())
    }

    async fn get_attributes(
        &self,
        domain: &str,
        id: &str,
        names: Option<&[String]>,
    ) -> Result<Option<AttributeMap>, ClientError> {
        let domains = self.domains.read().await;
        let items = domains
            .get(domain)
            .ok_or_else(|| ClientError::NoSuchDomain(domain.to_string()))?;
        let Some(attrs) = items.get(id) else {
            return Ok(None);
        };
        let attrs = match names {
            Some(names) => attrs
                .iter()
                .filter(|(name, _)| names.contains(name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            None => attrs.clone(),
        };
        if attrs.is_empty() {
            // The store reports an item with no (matching) attributes as
            // absent.
            return Ok(None);
        }
        Ok(Some(attrs))
    }

    async fn put_attributes(
        &self,
        domain: &str,
        id: &str,
        attrs: &AttributeMap,
    ) -> Result<(), ClientError> {
        let mut domains = self.domains.write().await;
        let items = domains
            .get_mut(domain)
            .ok_or_else(|| ClientError::NoSuchDomain(domain.to_string()))?;
        // Replace named attributes, keep the rest.
        let existing = items.entry(id.to_string()).or_default();
        for (name, value) in attrs {
            existing.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    async fn delete_attributes(
        &self,
        domain: &str,
        id: &str,
        names: Option<&[String]>,
    ) -> Result<(), ClientError> {
        let mut domains = self.domains.write().await;
        let items = domains
            .get_mut(domain)
            .ok_or_else(|| ClientError::NoSuchDomain(domain.to_string()))?;
        match names {
            None => {
                items.remove(id);
            }
            Some(names) => {
                if let Some(attrs) = items.get_mut(id) {
                    for name in names {
                        attrs.remove(name);
                    }
                    // An item with no attributes no longer exists.
                    if attrs.is_empty() {
                        items.remove(id);
                    }
                }
            }
        }
        Ok(())
    }

    async fn select(&self, query: &str, next: Option<&str>) -> Result<ItemPage, ClientError> {
        let parsed = ParsedQuery::parse(query)?;
        let offset: usize = match next {
            Some(token) => token
                .parse()
                .map_err(|_| ClientError::InvalidNextToken(token.to_string()))?,
            None => 0,
        };

        let domains = self.domains.read().await;
        let items = domains
            .get(&parsed.domain)
            .ok_or_else(|| ClientError::NoSuchDomain(parsed.domain.clone()))?;

        let mut matched: Vec<(&String, &AttributeMap)> = items
            .iter()
            .filter(|(_, attrs)| {
                parsed
                    .condition
                    .as_ref()
                    .map_or(true, |condition| condition.matches(attrs))
            })
            .collect();

        if let Some((field, ascending)) = &parsed.order {
            matched.sort_by(|(_, a), (_, b)| {
                let left = first_value(a, field);
                let right = first_value(b, field);
                if *ascending {
                    left.cmp(right)
                } else {
                    right.cmp(left)
                }
            });
        }

        let total = matched.len();
        let page_size = parsed.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        let page: Vec<Item> = matched
            .into_iter()
            .skip(offset)
            .take(page_size)
            .map(|(id, attrs)| Item {
                id: id.clone(),
                attrs: attrs.clone(),
            })
            .collect();

        let consumed = offset + page.len();
        let next = (consumed < total && !page.is_empty()).then(|| consumed.to_string());

        debug!(
            domain = %parsed.domain,
            matched = total,
            returned = page.len(),
            "select evaluated"
        );
        Ok(ItemPage { items: page, next })
    }

    fn name(&self) -> &str {
        "memory"
    }
}

fn first_value<'a>(attrs: &'a AttributeMap, name: &str) -> &'a str {
    match attrs.get(name) {
        Some(strata_format::AttrValue::Single(value)) => value,
        Some(strata_format::AttrValue::Multi(values)) => {
            values.first().map(String::as_str).unwrap_or("")
        }
        None => "",
    }
}
