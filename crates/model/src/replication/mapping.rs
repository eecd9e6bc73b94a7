use serde::{Deserialize, Serialize};

/// Redirects schema-qualified lookups on the source connection: objects
/// described under `destination_schema` are read from `source_schema`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaMapping {
    pub source_schema: String,
    pub destination_schema: String,
}

impl SchemaMapping {
    pub fn new(source_schema: impl Into<String>, destination_schema: impl Into<String>) -> Self {
        Self {
            source_schema: source_schema.into(),
            destination_schema: destination_schema.into(),
        }
    }

    pub fn source_schema_for<'a>(&'a self, schema: Option<&'a str>) -> Option<&'a str> {
        match schema {
            Some(s) if s == self.destination_schema => Some(self.source_schema.as_str()),
            other => other,
        }
    }
}

impl Default for SchemaMapping {
    fn default() -> Self {
        Self::new("public", "public")
    }
}
