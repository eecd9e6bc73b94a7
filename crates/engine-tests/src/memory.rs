//! In-memory store implementing the connector traits, with transactional
//! staging and fault injection for exercising the real dispatcher, pool and
//! worker without a database.

use async_trait::async_trait;
use connectors::{
    error::{ConnectorError, DbError},
    sql::base::{destination::DestinationConnection, source::SourceConnection},
};
use engine_core::connectors::ConnectionProvider;
use model::{
    core::value::Value,
    entity::descriptor::TableDescriptor,
    records::snapshot::RowSnapshot,
    replication::{mapping::SchemaMapping, page::Page},
};
use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

pub const DEFAULT_SCHEMA: &str = "public";

type TableKey = (String, String);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub sources_opened: usize,
    pub sources_closed: usize,
    pub source_releases: usize,
    pub destinations_opened: usize,
    pub destinations_closed: usize,
    pub open_destinations: usize,
    pub max_open_destinations: usize,
    pub commits: usize,
    pub rollbacks: usize,
}

#[derive(Debug, Default)]
struct Faults {
    fail_on_key: HashSet<(String, Vec<Value>)>,
    panic_on_key: HashSet<(String, Vec<Value>)>,
    row_delay: Option<Duration>,
    refuse_source: bool,
    /// Source opens allowed before the store starts refusing them.
    source_open_limit: Option<usize>,
    refuse_destination: bool,
}

#[derive(Debug, Default)]
struct StoreState {
    source: HashMap<TableKey, Vec<RowSnapshot>>,
    destination: HashMap<TableKey, Vec<RowSnapshot>>,
    faults: Faults,
    stats: StoreStats,
}

/// Shared handle to a source and a destination "database". Clones see the
/// same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn provider(&self) -> MemoryProvider {
        MemoryProvider {
            store: self.clone(),
        }
    }

    pub fn insert_source(&self, schema: &str, table: &str, rows: Vec<RowSnapshot>) {
        let mut state = self.lock();
        let entry = state
            .source
            .entry((schema.to_string(), table.to_string()))
            .or_default();
        for row in rows {
            merge(entry, row);
        }
    }

    pub fn insert_destination(&self, schema: &str, table: &str, rows: Vec<RowSnapshot>) {
        let mut state = self.lock();
        let entry = state
            .destination
            .entry((schema.to_string(), table.to_string()))
            .or_default();
        for row in rows {
            merge(entry, row);
        }
    }

    /// Destination rows of a table ordered by key.
    pub fn destination_rows(&self, schema: &str, table: &str) -> Vec<RowSnapshot> {
        let state = self.lock();
        let mut rows = state
            .destination
            .get(&(schema.to_string(), table.to_string()))
            .cloned()
            .unwrap_or_default();
        rows.sort_by(compare_keys);
        rows
    }

    pub fn stats(&self) -> StoreStats {
        self.lock().stats
    }

    pub fn fail_on_key(&self, table: &str, key: Vec<Value>) {
        self.lock()
            .faults
            .fail_on_key
            .insert((table.to_string(), key));
    }

    pub fn panic_on_key(&self, table: &str, key: Vec<Value>) {
        self.lock()
            .faults
            .panic_on_key
            .insert((table.to_string(), key));
    }

    /// Delays every destination write by `delay`.
    pub fn set_row_delay(&self, delay: Duration) {
        self.lock().faults.row_delay = Some(delay);
    }

    pub fn refuse_source_connections(&self) {
        self.lock().faults.refuse_source = true;
    }

    /// Lets the first source open through (the dispatcher's) and refuses
    /// every later one, so only worker-side opens fail.
    pub fn refuse_worker_source_connections(&self) {
        self.lock().faults.source_open_limit = Some(1);
    }

    pub fn refuse_destination_connections(&self) {
        self.lock().faults.refuse_destination = true;
    }
}

/// Opens connections against a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryProvider {
    store: MemoryStore,
}

#[async_trait]
impl ConnectionProvider for MemoryProvider {
    type Source = MemorySource;
    type Destination = MemoryDestination;

    async fn open_source(&self, mapping: &SchemaMapping) -> Result<MemorySource, ConnectorError> {
        let mut state = self.store.lock();
        let over_limit = state
            .faults
            .source_open_limit
            .is_some_and(|limit| state.stats.sources_opened >= limit);
        if state.faults.refuse_source || over_limit {
            return Err(ConnectorError::Unavailable("source refused connection".into()));
        }
        state.stats.sources_opened += 1;
        Ok(MemorySource {
            store: self.store.clone(),
            mapping: mapping.clone(),
        })
    }

    async fn open_destination(&self) -> Result<MemoryDestination, ConnectorError> {
        let mut state = self.store.lock();
        if state.faults.refuse_destination {
            return Err(ConnectorError::Unavailable(
                "destination refused connection".into(),
            ));
        }
        let stats = &mut state.stats;
        stats.destinations_opened += 1;
        stats.open_destinations += 1;
        stats.max_open_destinations = stats.max_open_destinations.max(stats.open_destinations);
        Ok(MemoryDestination {
            store: self.store.clone(),
            staged: None,
        })
    }
}

pub struct MemorySource {
    store: MemoryStore,
    mapping: SchemaMapping,
}

impl MemorySource {
    fn physical_table(&self, descriptor: &TableDescriptor) -> TableKey {
        let schema = self
            .mapping
            .source_schema_for(descriptor.schema.as_deref())
            .unwrap_or(DEFAULT_SCHEMA);
        (schema.to_string(), descriptor.table.clone())
    }
}

#[async_trait]
impl SourceConnection for MemorySource {
    async fn count_rows(&mut self, descriptor: &TableDescriptor) -> Result<u64, DbError> {
        let key = self.physical_table(descriptor);
        let state = self.store.lock();
        state
            .source
            .get(&key)
            .map(|rows| rows.len() as u64)
            .ok_or_else(|| missing_relation(&key))
    }

    async fn fetch_page(
        &mut self,
        descriptor: &TableDescriptor,
        page: &Page,
    ) -> Result<Vec<RowSnapshot>, DbError> {
        let offset = page
            .offset()
            .ok_or_else(|| DbError::Write(format!("{page} cannot be addressed")))?;
        let key = self.physical_table(descriptor);
        let state = self.store.lock();
        let mut rows: Vec<&RowSnapshot> = state
            .source
            .get(&key)
            .ok_or_else(|| missing_relation(&key))?
            .iter()
            .collect();
        rows.sort_by(|a, b| compare_keys(a, b));

        let columns = descriptor.column_names();
        Ok(rows
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(page.limit() as usize)
            .map(|row| RowSnapshot::from_columns(descriptor, row.values_for(&columns)))
            .collect())
    }

    fn release(&mut self) {
        self.store.lock().stats.source_releases += 1;
    }

    async fn close(self) -> Result<(), DbError> {
        self.store.lock().stats.sources_closed += 1;
        Ok(())
    }
}

pub struct MemoryDestination {
    store: MemoryStore,
    staged: Option<Vec<(TableKey, RowSnapshot)>>,
}

#[async_trait]
impl DestinationConnection for MemoryDestination {
    async fn begin(&mut self) -> Result<(), DbError> {
        if self.staged.is_some() {
            return Err(DbError::Transaction("transaction already open".into()));
        }
        self.staged = Some(Vec::new());
        Ok(())
    }

    async fn upsert(
        &mut self,
        descriptor: &TableDescriptor,
        row: &RowSnapshot,
    ) -> Result<(), DbError> {
        let (delay, fail, panic) = {
            let state = self.store.lock();
            let fault_key = (descriptor.table.clone(), row.key.clone());
            (
                state.faults.row_delay,
                state.faults.fail_on_key.contains(&fault_key),
                state.faults.panic_on_key.contains(&fault_key),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if panic {
            panic!("injected panic on {} {:?}", descriptor.table, row.key);
        }
        if fail {
            return Err(DbError::Write(format!(
                "injected failure on {} {:?}",
                descriptor.table, row.key
            )));
        }

        let staged = self
            .staged
            .as_mut()
            .ok_or_else(|| DbError::Transaction("upsert outside a transaction".into()))?;
        let schema = descriptor.schema.as_deref().unwrap_or(DEFAULT_SCHEMA);
        staged.push(((schema.to_string(), descriptor.table.clone()), row.clone()));
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        let staged = self
            .staged
            .take()
            .ok_or_else(|| DbError::Transaction("commit outside a transaction".into()))?;
        let mut state = self.store.lock();
        for (table, row) in staged {
            merge(state.destination.entry(table).or_default(), row);
        }
        state.stats.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DbError> {
        if self.staged.take().is_some() {
            self.store.lock().stats.rollbacks += 1;
        }
        Ok(())
    }

    async fn close(mut self) -> Result<(), DbError> {
        self.rollback().await?;
        self.store.lock().stats.destinations_closed += 1;
        Ok(())
    }
}

impl Drop for MemoryDestination {
    fn drop(&mut self) {
        self.store.lock().stats.open_destinations -= 1;
    }
}

/// Upsert semantics: overwrite the fields of the row with the same key,
/// insert otherwise.
fn merge(rows: &mut Vec<RowSnapshot>, row: RowSnapshot) {
    match rows.iter_mut().find(|existing| existing.key == row.key) {
        Some(existing) => {
            for field in row.fields {
                match existing.fields.iter_mut().find(|f| f.name == field.name) {
                    Some(current) => current.value = field.value,
                    None => existing.fields.push(field),
                }
            }
        }
        None => rows.push(row),
    }
}

fn compare_keys(a: &RowSnapshot, b: &RowSnapshot) -> Ordering {
    a.key.partial_cmp(&b.key).unwrap_or(Ordering::Equal)
}

fn missing_relation((schema, table): &TableKey) -> DbError {
    DbError::Write(format!("relation \"{schema}.{table}\" does not exist"))
}
