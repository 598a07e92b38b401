//! Repository port
//!
//! The validators resolve references only through the `RecordRepository`
//! trait. A repository is handed to each validation call and never retained,
//! and omitting it switches validation into shallow (presence-only) mode.
//!
//! `MemoryRepository` is the in-process implementation used by the CLI and
//! the tests; a networked store plugs in behind the same trait.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::RepositoryError;
use crate::model::{codes, Record, RecordType, Reference, Task, TypedRecord};

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Where a reference is being resolved from.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    /// Element path of the reference, e.g. `Task.focus`
    pub location: &'a str,
    pub source_type: RecordType,
    pub source_id: &'a str,
    /// Records contained in the source, targets of `#id` references
    pub contained: &'a [Record],
}

impl<'a> ResolutionContext<'a> {
    pub fn new(
        location: &'a str,
        source_type: RecordType,
        source_id: &'a str,
        contained: &'a [Record],
    ) -> Self {
        Self {
            location,
            source_type,
            source_id,
            contained,
        }
    }

    /// Context for a record that contains nothing
    pub fn detached(location: &'a str, source_type: RecordType, source_id: &'a str) -> Self {
        Self::new(location, source_type, source_id, &[])
    }
}

/// Search request: a record type plus `name=value` parameters, all of which
/// must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub record_type: RecordType,
    pub params: Vec<(String, String)>,
}

impl SearchParams {
    pub fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            params: Vec::new(),
        }
    }

    pub fn add(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }
}

/// Summary of a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchInfo {
    pub record_type: RecordType,
    pub total: usize,
}

/// Search results grouped by record type.
#[derive(Debug, Clone, Default)]
pub struct RecordCache {
    by_type: BTreeMap<RecordType, Vec<Record>>,
}

impl RecordCache {
    pub fn insert(&mut self, record: Record) {
        self.by_type
            .entry(record.record_type())
            .or_default()
            .push(record);
    }

    /// Every cached record of type `T`, in insertion order
    pub fn list<T: TypedRecord>(&self) -> Vec<T> {
        self.by_type
            .get(&T::RECORD_TYPE)
            .map(|records| records.iter().cloned().filter_map(T::from_record).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_type.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What a search hands back: the summary and the matching records.
#[derive(Debug, Clone)]
pub struct SearchBundle {
    pub info: SearchInfo,
    pub cache: RecordCache,
}

/// Port through which records are fetched, searched and updated.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Resolve a reference. `Ok(None)` when nothing answers to it.
    async fn get_record(
        &self,
        reference: &Reference,
        context: &ResolutionContext<'_>,
    ) -> Result<Option<Record>>;

    /// Fetch a record by type and id.
    async fn get_by_id(&self, record_type: RecordType, id: &str) -> Result<Option<Record>>;

    async fn search(&self, query: &SearchParams) -> Result<SearchBundle>;

    /// Replace a stored task, returning the stored version.
    async fn update_task(&self, task: &Task) -> Result<Task>;
}

/// Resolve a reference to a record of type `T`.
///
/// A reference declared against another type, or a port answer of another
/// type, resolves to `None`.
pub async fn resolve<T: TypedRecord>(
    repository: &dyn RecordRepository,
    reference: &Reference,
    context: &ResolutionContext<'_>,
) -> Result<Option<T>> {
    if reference.target_type != T::RECORD_TYPE {
        debug!(
            location = context.location,
            expected = %T::RECORD_TYPE,
            declared = %reference.target_type,
            "Reference declares a different target type"
        );
        return Ok(None);
    }

    let record = repository.get_record(reference, context).await?;
    Ok(record.and_then(T::from_record))
}

/// Fetch a record of type `T` by id.
pub async fn fetch<T: TypedRecord>(repository: &dyn RecordRepository, id: &str) -> Result<Option<T>> {
    let record = repository.get_by_id(T::RECORD_TYPE, id).await?;
    Ok(record.and_then(T::from_record))
}

/// Serialized collection of records, the on-disk form of a `MemoryRepository`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordBundle {
    #[serde(default)]
    pub records: Vec<Record>,
}

type RecordKey = (RecordType, String);

/// In-memory repository
pub struct MemoryRepository {
    records: RwLock<BTreeMap<RecordKey, Record>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::from_records(Vec::new())
    }

    /// Later records replace earlier ones with the same type and id
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let map = records
            .into_iter()
            .map(|r| ((r.record_type(), r.id().to_string()), r))
            .collect();
        Self {
            records: RwLock::new(map),
        }
    }

    pub fn from_bundle(bundle: RecordBundle) -> Self {
        Self::from_records(bundle.records)
    }

    /// Load a JSON `RecordBundle` from disk
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let bundle: RecordBundle = serde_json::from_slice(&bytes)?;
        debug!(path = %path.as_ref().display(), records = bundle.records.len(), "Loaded record bundle");
        Ok(Self::from_bundle(bundle))
    }

    /// Write the current contents as a JSON `RecordBundle`
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bundle = self.snapshot().await;
        let json = serde_json::to_vec_pretty(&bundle)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub async fn insert(&self, record: Record) {
        let key = (record.record_type(), record.id().to_string());
        self.records.write().await.insert(key, record);
    }

    /// All records ordered by type then id
    pub async fn snapshot(&self) -> RecordBundle {
        RecordBundle {
            records: self.records.read().await.values().cloned().collect(),
        }
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordRepository for MemoryRepository {
    async fn get_record(
        &self,
        reference: &Reference,
        context: &ResolutionContext<'_>,
    ) -> Result<Option<Record>> {
        if let Some(local_id) = reference.contained_id() {
            let found = context
                .contained
                .iter()
                .find(|r| r.id() == local_id && r.record_type() == reference.target_type)
                .cloned();
            debug!(location = context.location, reference = %reference, found = found.is_some(), "Resolved contained reference");
            return Ok(found);
        }

        let records = self.records.read().await;
        let found = records
            .get(&(reference.target_type, reference.target_id.clone()))
            .cloned();
        debug!(location = context.location, reference = %reference, found = found.is_some(), "Resolved reference");
        Ok(found)
    }

    async fn get_by_id(&self, record_type: RecordType, id: &str) -> Result<Option<Record>> {
        Ok(self
            .records
            .read()
            .await
            .get(&(record_type, id.to_string()))
            .cloned())
    }

    async fn search(&self, query: &SearchParams) -> Result<SearchBundle> {
        let records = self.records.read().await;
        let mut cache = RecordCache::default();

        for record in records.values() {
            if record.record_type() != query.record_type {
                continue;
            }
            let mut all_match = true;
            for (name, value) in &query.params {
                if !param_matches(record, name, value, &records)? {
                    all_match = false;
                    break;
                }
            }
            if all_match {
                cache.insert(record.clone());
            }
        }

        let info = SearchInfo {
            record_type: query.record_type,
            total: cache.len(),
        };
        debug!(record_type = %info.record_type, total = info.total, "Search complete");
        Ok(SearchBundle { info, cache })
    }

    async fn update_task(&self, task: &Task) -> Result<Task> {
        let mut records = self.records.write().await;
        let key = (RecordType::Task, task.id.clone());
        match records.get_mut(&key) {
            Some(stored) => {
                *stored = Record::Task(task.clone());
                Ok(task.clone())
            }
            None => Err(RepositoryError::NotFound {
                record_type: RecordType::Task,
                id: task.id.clone(),
            }),
        }
    }
}

fn param_matches(
    record: &Record,
    name: &str,
    value: &str,
    records: &BTreeMap<RecordKey, Record>,
) -> Result<bool> {
    match (name, record) {
        ("_id", r) => Ok(r.id() == value),
        ("status", Record::Task(t)) => Ok(t.status.is_some_and(|s| s.as_str() == value)),
        ("status", Record::Request(r)) => Ok(r.status.is_some_and(|s| s.as_str() == value)),
        ("intent", Record::Task(t)) => Ok(t.intent.is_some_and(|i| i.as_str() == value)),
        ("intent", Record::Request(r)) => Ok(r.intent.is_some_and(|i| i.as_str() == value)),
        ("owner.identifier", Record::Task(t)) => Ok(owner_has_identifier(t, value, records)),
        (name, r) => Err(RepositoryError::InvalidQuery(format!(
            "{} on {}",
            name,
            r.record_type()
        ))),
    }
}

/// `value` is `system|value` or a bare identifier value
fn owner_has_identifier(task: &Task, value: &str, records: &BTreeMap<RecordKey, Record>) -> bool {
    let Some(owner) = task.owner.as_ref() else {
        return false;
    };
    if owner.target_type != RecordType::OwningOrganization {
        return false;
    }

    let organization = match owner.contained_id() {
        Some(local_id) => task.contained.iter().find(|r| {
            r.id() == local_id && r.record_type() == RecordType::OwningOrganization
        }),
        None => records.get(&(RecordType::OwningOrganization, owner.target_id.clone())),
    };
    let Some(Record::OwningOrganization(organization)) = organization else {
        return false;
    };

    let (system, wanted) = match value.split_once('|') {
        Some((system, wanted)) => (Some(system), wanted),
        None => (None, value),
    };
    let wanted = codes::remove_whitespace(wanted);

    organization.identifier.iter().any(|identifier| {
        let system_ok = system.map_or(true, |s| s.is_empty() || identifier.has_system(s));
        let value_ok = identifier
            .value
            .as_deref()
            .is_some_and(|v| codes::remove_whitespace(v) == wanted);
        system_ok && value_ok
    })
}
