// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Typed record mapper for Strata.
//
// Binds one serde type to one store domain. Writes flatten the record
// into dot-path attributes, reads rebuild it, and queries are seeded
// with the record-type discriminator so multiple mappers can share a
// domain without seeing each other's rows.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use strata_client::{AttributeStore, Item};
use strata_format::{flatten, unflatten_value, AttributeMap, FormatOptions};
use strata_select::Select;

use crate::error::MapperError;

/// Reserved attribute holding the record-type discriminator.
///
/// Injected on every write of a mapper configured with a record type, and
/// stripped before records are handed back to the caller. Records must
/// not carry a field with this name.
pub const RECORD_TYPE_ATTR: &str = "__strata_type";

/// Configuration for one [`Mapper`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MapperConfig {
    /// Domain the mapper reads and writes.
    pub domain: String,
    /// Name of the record field used as the item identifier. The field
    /// must hold a non-empty string; it is carried in the item name, not
    /// stored as an attribute.
    pub key: String,
    /// Discriminator tag for mappers sharing a domain. `None` disables
    /// tag injection and query seeding.
    pub record_type: Option<String>,
    /// Flattening and value-codec policy.
    #[serde(default)]
    pub format: FormatOptions,
}

impl MapperConfig {
    /// Configuration with the default format policy and no record type.
    pub fn new(domain: &str, key: &str) -> Self {
        Self {
            domain: domain.to_string(),
            key: key.to_string(),
            record_type: None,
            format: FormatOptions::default(),
        }
    }

    /// Tag records with `record_type` and seed queries with it.
    pub fn with_record_type(mut self, record_type: &str) -> Self {
        self.record_type = Some(record_type.to_string());
        self
    }

    /// Override the flattening and codec policy.
    pub fn with_format(mut self, format: FormatOptions) -> Self {
        self.format = format;
        self
    }
}

/// One page of mapped select results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Records in this page.
    pub items: Vec<T>,
    /// Continuation token for the next page, passed through from the
    /// store unchanged.
    pub next: Option<String>,
}

/// Maps records of type `T` to items in one domain of store `S`.
///
/// # Example
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use strata_client::MemoryStore;
/// use strata_mapper::{Mapper, MapperConfig};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Task {
///     id: String,
///     title: String,
/// }
///
/// # tokio_test::block_on(async {
/// let mapper: Mapper<Task, _> =
///     Mapper::new(MemoryStore::new(), MapperConfig::new("tasks", "id"));
/// mapper.create().await.unwrap();
///
/// let task = Task { id: "t1".into(), title: "write docs".into() };
/// mapper.put(&task).await.unwrap();
/// assert_eq!(mapper.get("t1").await.unwrap(), Some(task));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Mapper<T, S> {
    store: S,
    config: MapperConfig,
    _record: PhantomData<fn() -> T>,
}

impl<T, S> Mapper<T, S>
where
    T: Serialize + DeserializeOwned,
    S: AttributeStore,
{
    /// Bind `store` to the domain described by `config`.
    pub fn new(store: S, config: MapperConfig) -> Self {
        Self {
            store,
            config,
            _record: PhantomData,
        }
    }

    /// The mapper's configuration.
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Create the mapper's domain. A no-op when it already exists.
    pub async fn create(&self) -> Result<(), MapperError> {
        debug!(domain = %self.config.domain, store = self.store.name(), "create domain");
        self.store.create_domain(&self.config.domain).await?;
        Ok(())
    }

    /// Destroy the mapper's domain and everything in it, including items
    /// written by other mappers sharing the domain.
    pub async fn destroy(&self) -> Result<(), MapperError> {
        debug!(domain = %self.config.domain, store = self.store.name(), "destroy domain");
        self.store.delete_domain(&self.config.domain).await?;
        Ok(())
    }

    /// Start a select query scoped to this mapper's domain, encoding, and
    /// record type.
    pub fn query(&self) -> Select {
        let select = Select::new(&self.config.domain, self.config.format.encoding);
        match &self.config.record_type {
            Some(tag) => select.with_record_type(RECORD_TYPE_ATTR, tag),
            None => select,
        }
    }

    /// Write `record`, replacing any attributes it names on an existing
    /// item with the same key.
    ///
    /// Fails with [`MapperError::InvalidIdentifier`] before contacting the
    /// store when the key field is missing, null, not a string, or empty.
    pub async fn put(&self, record: &T) -> Result<(), MapperError> {
        let mut value = serde_json::to_value(record).map_err(strata_format::FormatError::from)?;
        let value_kind = kind(&value);
        let fields = value
            .as_object_mut()
            .ok_or_else(|| strata_format::FormatError::NotAnObject(value_kind.to_string()))?;

        let id = match fields.remove(&self.config.key) {
            Some(Value::String(id)) if !id.is_empty() => id,
            _ => return Err(MapperError::InvalidIdentifier(self.config.key.clone())),
        };
        if let Some(tag) = &self.config.record_type {
            fields.insert(RECORD_TYPE_ATTR.to_string(), Value::String(tag.clone()));
        }

        let attrs = flatten(&value, &self.config.format)?;
        debug!(domain = %self.config.domain, id = %id, attrs = attrs.len(), "put record");
        self.store
            .put_attributes(&self.config.domain, &id, &attrs)
            .await?;
        Ok(())
    }

    /// Fetch the record stored under `id`, or `None` when absent.
    pub async fn get(&self, id: &str) -> Result<Option<T>, MapperError> {
        match self.fetch(id, None).await? {
            Some(value) => {
                let record =
                    serde_json::from_value(value).map_err(strata_format::FormatError::from)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Fetch only the attribute paths in `names` for the record under
    /// `id`, as an untyped value with the key field filled in.
    ///
    /// Nested fields are addressed by their dot path, multi-valued arrays
    /// by their `[]`-suffixed attribute name.
    pub async fn get_partial(
        &self,
        id: &str,
        names: &[String],
    ) -> Result<Option<Value>, MapperError> {
        self.fetch(id, Some(names)).await
    }

    /// Delete the record under `id`, or only the attribute paths in
    /// `names`. Idempotent.
    pub async fn delete(&self, id: &str, names: Option<&[String]>) -> Result<(), MapperError> {
        debug!(domain = %self.config.domain, id = %id, "delete record");
        self.store
            .delete_attributes(&self.config.domain, id, names)
            .await?;
        Ok(())
    }

    /// Run a select query and map each row back to `T`.
    ///
    /// `query` is usually a builder from [`Mapper::query`] but any
    /// displayable select expression works. Pass the previous page's
    /// continuation token as `next` to resume a scan.
    pub async fn select(
        &self,
        query: impl fmt::Display,
        next: Option<&str>,
    ) -> Result<Page<T>, MapperError> {
        let expression = query.to_string();
        let page = self.store.select(&expression, next).await?;
        debug!(
            domain = %self.config.domain,
            rows = page.items.len(),
            more = page.next.is_some(),
            "select mapped"
        );
        let items = page
            .items
            .into_iter()
            .map(|item| self.map_item(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            next: page.next,
        })
    }

    async fn fetch(
        &self,
        id: &str,
        names: Option<&[String]>,
    ) -> Result<Option<Value>, MapperError> {
        let Some(attrs) = self
            .store
            .get_attributes(&self.config.domain, id, names)
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(self.rebuild(id, attrs)?))
    }

    fn map_item(&self, item: Item) -> Result<T, MapperError> {
        let value = self.rebuild(&item.id, item.attrs)?;
        let record = serde_json::from_value(value).map_err(strata_format::FormatError::from)?;
        Ok(record)
    }

    /// Rebuild the record value from stored attributes: strip the
    /// discriminator, unflatten, and restore the key field from the item
    /// name.
    fn rebuild(&self, id: &str, mut attrs: AttributeMap) -> Result<Value, MapperError> {
        attrs.remove(RECORD_TYPE_ATTR);
        let mut value = unflatten_value(&attrs, &self.config.format)?;
        if let Value::Object(fields) = &mut value {
            fields.insert(self.config.key.clone(), Value::String(id.to_string()));
        }
        Ok(value)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use serde::Deserialize;

    use strata_client::{ClientError, ItemPage, MemoryStore};
    use strata_format::AttrValue;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Task {
        id: String,
        title: String,
        done: bool,
    }

    fn task(id: &str, title: &str) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            done: false,
        }
    }

    /// Counts every store call; all operations fail.
    #[derive(Default)]
    struct CountingStore {
        calls: AtomicU32,
    }

    impl CountingStore {
        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn bump(&self) -> ClientError {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ClientError::Transport("unreachable".to_string())
        }
    }

    #[async_trait]
    impl AttributeStore for CountingStore {
        async fn create_domain(&self, _domain: &str) -> Result<(), ClientError> {
            Err(self.bump())
        }

        async fn delete_domain(&self, _domain: &str) -> Result<(), ClientError> {
            Err(self.bump())
        }

        async fn get_attributes(
            &self,
            _domain: &str,
            _id: &str,
            _names: Option<&[String]>,
        ) -> Result<Option<AttributeMap>, ClientError> {
            Err(self.bump())
        }

        async fn put_attributes(
            &self,
            _domain: &str,
            _id: &str,
            _attrs: &AttributeMap,
        ) -> Result<(), ClientError> {
            Err(self.bump())
        }

        async fn delete_attributes(
            &self,
            _domain: &str,
            _id: &str,
            _names: Option<&[String]>,
        ) -> Result<(), ClientError> {
            Err(self.bump())
        }

        async fn select(&self, _query: &str, _next: Option<&str>) -> Result<ItemPage, ClientError> {
            Err(self.bump())
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_put_rejects_empty_key_before_any_call() {
        let mapper: Mapper<Task, _> =
            Mapper::new(CountingStore::default(), MapperConfig::new("tasks", "id"));
        let err = mapper.put(&task("", "untitled")).await.unwrap_err();
        assert!(matches!(err, MapperError::InvalidIdentifier(field) if field == "id"));
        assert_eq!(mapper.store.calls(), 0);
    }

    #[tokio::test]
    async fn test_put_rejects_missing_key_field() {
        #[derive(Serialize, Deserialize)]
        struct Keyless {
            title: String,
        }
        let mapper: Mapper<Keyless, _> =
            Mapper::new(CountingStore::default(), MapperConfig::new("tasks", "id"));
        let err = mapper
            .put(&Keyless {
                title: "untitled".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MapperError::InvalidIdentifier(_)));
        assert_eq!(mapper.store.calls(), 0);
    }

    #[tokio::test]
    async fn test_put_stores_tag_and_omits_key_attribute() {
        let store = MemoryStore::new();
        let mapper: Mapper<Task, _> = Mapper::new(
            store.clone(),
            MapperConfig::new("tasks", "id").with_record_type("task"),
        );
        mapper.create().await.unwrap();
        mapper.put(&task("t1", "write docs")).await.unwrap();

        let attrs = store
            .get_attributes("tasks", "t1", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            attrs.get(RECORD_TYPE_ATTR),
            Some(&AttrValue::Single("\"task\"".to_string()))
        );
        assert!(!attrs.contains_key("id"));
        assert_eq!(
            attrs.get("title"),
            Some(&AttrValue::Single("\"write docs\"".to_string()))
        );
    }

    #[tokio::test]
    async fn test_get_strips_tag_and_restores_key() {
        let mapper: Mapper<Task, _> = Mapper::new(
            MemoryStore::new(),
            MapperConfig::new("tasks", "id").with_record_type("task"),
        );
        mapper.create().await.unwrap();
        mapper.put(&task("t1", "write docs")).await.unwrap();

        assert_eq!(mapper.get("t1").await.unwrap(), Some(task("t1", "write docs")));
        assert_eq!(mapper.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_query_is_seeded_with_record_type() {
        let mapper: Mapper<Task, _> = Mapper::new(
            MemoryStore::new(),
            MapperConfig::new("tasks", "id").with_record_type("task"),
        );
        assert_eq!(
            mapper.query().to_sql(),
            "SELECT * FROM `tasks` WHERE (`__strata_type` = '\"task\"')"
        );

        let untagged: Mapper<Task, _> =
            Mapper::new(MemoryStore::new(), MapperConfig::new("tasks", "id"));
        assert_eq!(untagged.query().to_sql(), "SELECT * FROM `tasks`");
    }

    #[tokio::test]
    async fn test_select_maps_rows() {
        let mapper: Mapper<Task, _> = Mapper::new(
            MemoryStore::new(),
            MapperConfig::new("tasks", "id").with_record_type("task"),
        );
        mapper.create().await.unwrap();
        mapper.put(&task("t1", "first")).await.unwrap();
        mapper.put(&task("t2", "second")).await.unwrap();

        let page = mapper.select(mapper.query(), None).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next, None);
        assert!(page.items.contains(&task("t1", "first")));
    }
}
