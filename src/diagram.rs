//! Schema diagram model: the immutable input to generation.

use serde::{Deserialize, Serialize};

/// Target database dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Standard SQL
    #[default]
    Generic,
    /// PostgreSQL
    #[serde(alias = "postgres")]
    PostgreSql,
    /// MySQL
    #[serde(alias = "mariadb")]
    MySql,
    /// Microsoft SQL Server
    #[serde(alias = "mssql")]
    SqlServer,
}

impl Dialect {
    /// Parse dialect from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "generic" => Some(Self::Generic),
            "postgres" | "postgresql" => Some(Self::PostgreSql),
            "mysql" | "mariadb" => Some(Self::MySql),
            "mssql" | "sqlserver" => Some(Self::SqlServer),
            _ => None,
        }
    }

    /// Schema assumed for tables that declare none.
    pub fn default_schema(self) -> Option<&'static str> {
        match self {
            Self::PostgreSql => Some("public"),
            Self::SqlServer => Some("dbo"),
            _ => None,
        }
    }
}

/// Root input: dialect, tables, relationships, and custom types.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    #[serde(default)]
    pub dialect: Dialect,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub types: Vec<CustomType>,
}

impl Diagram {
    pub fn table(&self, id: u64) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub is_view: bool,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub indices: Vec<TableIndex>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Table {
    pub fn field(&self, id: u64) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Unique within the owning table.
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub increment: bool,
    /// Free-text default expression.
    #[serde(default)]
    pub default: Option<String>,
    /// Max length for bounded string types.
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub precision: Option<u32>,
    #[serde(default)]
    pub scale: Option<u32>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Declared type of a field: name plus optional custom-type id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldType {
    pub name: String,
    #[serde(default)]
    pub id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableIndex {
    pub name: String,
    #[serde(default)]
    pub unique: bool,
    /// Ordered field ids.
    #[serde(default)]
    pub fields: Vec<u64>,
    #[serde(default)]
    pub primary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub source_table_id: u64,
    pub source_field_id: u64,
    pub target_table_id: u64,
    pub target_field_id: u64,
    pub source_cardinality: Cardinality,
    pub target_cardinality: Cardinality,
    /// Per-relationship cascade override for one-to-many collections.
    #[serde(default)]
    pub cascade: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomType {
    pub name: String,
    pub kind: CustomTypeKind,
    /// Ordered literal values.
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub schema: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomTypeKind {
    Enum,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_str() {
        assert_eq!(Dialect::from_str("postgresql"), Some(Dialect::PostgreSql));
        assert_eq!(Dialect::from_str("Postgres"), Some(Dialect::PostgreSql));
        assert_eq!(Dialect::from_str("mysql"), Some(Dialect::MySql));
        assert_eq!(Dialect::from_str("sqlserver"), Some(Dialect::SqlServer));
        assert_eq!(Dialect::from_str("oracle"), None);
    }

    #[test]
    fn test_default_schema() {
        assert_eq!(Dialect::PostgreSql.default_schema(), Some("public"));
        assert_eq!(Dialect::SqlServer.default_schema(), Some("dbo"));
        assert_eq!(Dialect::MySql.default_schema(), None);
        assert_eq!(Dialect::Generic.default_schema(), None);
    }

    #[test]
    fn test_diagram_from_json() {
        let json = r#"{
            "dialect": "postgresql",
            "tables": [{
                "id": 1,
                "name": "users",
                "fields": [
                    {"id": 1, "name": "id", "type": {"name": "INT"}, "primary": true, "notNull": true},
                    {"id": 2, "name": "email", "type": {"name": "VARCHAR"}, "size": 255, "unique": true}
                ],
                "indices": [{"name": "ix_users_email", "unique": true, "fields": [2]}]
            }],
            "relationships": [],
            "types": [{"name": "status", "kind": "enum", "values": ["active", "inactive"]}]
        }"#;
        let diagram: Diagram = serde_json::from_str(json).unwrap();
        assert_eq!(diagram.dialect, Dialect::PostgreSql);
        assert_eq!(diagram.tables.len(), 1);
        let table = diagram.table(1).unwrap();
        assert!(table.field(1).unwrap().primary);
        assert_eq!(table.field(2).unwrap().size, Some(255));
        assert_eq!(diagram.types[0].kind, CustomTypeKind::Enum);
    }

    #[test]
    fn test_unknown_ids_resolve_to_none() {
        let diagram = Diagram::default();
        assert!(diagram.table(42).is_none());
    }
}
