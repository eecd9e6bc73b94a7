use crate::{
    core::naming::entity_name,
    entity::descriptor::{ColumnDescriptor, TableDescriptor},
    error::RegistryError,
};
use serde::Deserialize;
use std::{collections::HashMap, path::Path, sync::Arc};

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    entities: Vec<EntityEntry>,
}

#[derive(Debug, Deserialize)]
struct EntityEntry {
    #[serde(default)]
    entity: Option<String>,
    table: String,
    #[serde(default)]
    schema: Option<String>,
    columns: Vec<ColumnDescriptor>,
    primary_key: Vec<String>,
}

impl From<EntityEntry> for TableDescriptor {
    fn from(entry: EntityEntry) -> Self {
        let entity = entry.entity.unwrap_or_else(|| entity_name(&entry.table));
        TableDescriptor {
            entity,
            table: entry.table,
            schema: entry.schema,
            columns: entry.columns,
            primary_key: entry.primary_key,
        }
    }
}

/// Static table-name to descriptor mapping, built once before any work is
/// dispatched and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: HashMap<String, Arc<TableDescriptor>>,
}

impl EntityRegistry {
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = TableDescriptor>,
    ) -> Result<Self, RegistryError> {
        let mut entities = HashMap::new();
        for descriptor in descriptors {
            validate(&descriptor)?;
            let key = descriptor.entity.clone();
            if entities.insert(key.clone(), Arc::new(descriptor)).is_some() {
                return Err(RegistryError::DuplicateEntity(key));
            }
        }
        Ok(Self { entities })
    }

    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let doc: RegistryDocument = serde_json::from_str(json)?;
        Self::from_descriptors(doc.entities.into_iter().map(TableDescriptor::from))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Looks up the descriptor for `table` under its derived entity name.
    pub fn resolve(&self, table: &str) -> Result<Arc<TableDescriptor>, RegistryError> {
        let entity = entity_name(table);
        self.entities
            .get(&entity)
            .cloned()
            .ok_or_else(|| RegistryError::NotRegistered {
                table: table.to_string(),
                entity,
            })
    }

    /// Resolves every table up front; the first unregistered table fails the
    /// whole call.
    pub fn resolve_all<S: AsRef<str>>(
        &self,
        tables: &[S],
    ) -> Result<Vec<Arc<TableDescriptor>>, RegistryError> {
        tables.iter().map(|t| self.resolve(t.as_ref())).collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn validate(descriptor: &TableDescriptor) -> Result<(), RegistryError> {
    let entity = descriptor.entity.clone();
    if descriptor.columns.is_empty() {
        return Err(RegistryError::NoColumns { entity });
    }
    if descriptor.primary_key.is_empty() {
        return Err(RegistryError::NoPrimaryKey { entity });
    }
    if let Some(column) = descriptor
        .primary_key
        .iter()
        .find(|k| !descriptor.columns.iter().any(|c| &c.name == *k))
    {
        return Err(RegistryError::UnknownKeyColumn {
            entity,
            column: column.clone(),
        });
    }
    Ok(())
}
