//! Dialect-aware storage-type resolution and Python annotation mapping.

use std::collections::{BTreeSet, HashMap};

use crate::diagram::{CustomType, Dialect, Field};

/// Dialect-specific symbols discovered during storage-type resolution,
/// grouped per `sqlalchemy.dialects` module.
///
/// Threaded explicitly through resolution so the result is
/// order-independent and rebuilt per invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialectImports {
    pub postgresql: BTreeSet<&'static str>,
    pub mysql: BTreeSet<&'static str>,
    pub mssql: BTreeSet<&'static str>,
}

impl DialectImports {
    /// One import line per non-empty family, symbols in lexicographic
    /// order, families in fixed postgresql/mysql/mssql order.
    pub fn import_lines(&self) -> Vec<String> {
        let families = [
            ("postgresql", &self.postgresql),
            ("mysql", &self.mysql),
            ("mssql", &self.mssql),
        ];
        families
            .into_iter()
            .filter(|(_, symbols)| !symbols.is_empty())
            .map(|(module, symbols)| {
                let joined = symbols.iter().copied().collect::<Vec<_>>().join(", ");
                format!("from sqlalchemy.dialects.{module} import {joined}")
            })
            .collect()
    }
}

/// Per-invocation resolution context: target dialect plus the
/// registered custom enum types, keyed by lowercased name.
pub struct TypeContext<'a> {
    pub dialect: Dialect,
    enums: HashMap<String, &'a CustomType>,
}

impl<'a> TypeContext<'a> {
    pub fn new(dialect: Dialect, types: &'a [CustomType]) -> Self {
        let enums = types.iter().map(|t| (t.name.to_lowercase(), t)).collect();
        Self { dialect, enums }
    }

    pub fn enum_for(&self, type_name: &str) -> Option<&'a CustomType> {
        self.enums.get(&type_name.to_lowercase()).copied()
    }
}

/// Resolve the SQLAlchemy storage type expression for a field,
/// recording any dialect-specific symbol into `imports`.
pub fn storage_type(field: &Field, ctx: &TypeContext, imports: &mut DialectImports) -> String {
    resolve_storage(&field.field_type.name, field, ctx, imports, true)
}

fn resolve_storage(
    type_name: &str,
    field: &Field,
    ctx: &TypeContext,
    imports: &mut DialectImports,
    allow_array: bool,
) -> String {
    let lower = type_name.trim().to_lowercase();

    if let Some(custom) = ctx.enum_for(&lower) {
        return render_enum(custom);
    }

    if allow_array {
        if let Some(element) = array_element(&lower) {
            let inner = resolve_storage(element, field, ctx, imports, false);
            return format!("ARRAY({inner})");
        }
    }

    if let Some(resolved) = dialect_override(&lower, field, ctx.dialect, imports) {
        return resolved;
    }

    generic_storage(&lower, field)
}

/// Strip the array marker, returning the element type name.
/// A bare "array" marker yields an empty element, which falls through
/// to the string fallback.
fn array_element(lower: &str) -> Option<&str> {
    if let Some(element) = lower.strip_suffix("[]") {
        Some(element)
    } else if lower == "array" {
        Some("")
    } else {
        None
    }
}

fn render_enum(custom: &CustomType) -> String {
    let values = custom
        .values
        .iter()
        .map(|v| format!("\"{v}\""))
        .collect::<Vec<_>>()
        .join(", ");
    match custom.schema.as_deref().filter(|s| !s.is_empty()) {
        Some(schema) => format!("Enum({values}, name=\"{}\", schema=\"{schema}\")", custom.name),
        None => format!("Enum({values}, name=\"{}\")", custom.name),
    }
}

fn dialect_override(
    lower: &str,
    field: &Field,
    dialect: Dialect,
    imports: &mut DialectImports,
) -> Option<String> {
    match dialect {
        Dialect::PostgreSql => postgres_override(lower, imports),
        Dialect::MySql => mysql_override(lower, field, imports),
        Dialect::SqlServer => mssql_override(lower, field, imports),
        Dialect::Generic => None,
    }
}

fn postgres_override(lower: &str, imports: &mut DialectImports) -> Option<String> {
    let symbol = match lower {
        "uuid" => "UUID",
        "json" | "jsonb" => "JSONB",
        "inet" => "INET",
        "cidr" => "CIDR",
        "macaddr" => "MACADDR",
        "citext" => "CITEXT",
        "hstore" => "HSTORE",
        "money" => "MONEY",
        "interval" => "INTERVAL",
        _ => return None,
    };
    imports.postgresql.insert(symbol);
    Some(symbol.to_string())
}

fn mysql_override(lower: &str, field: &Field, imports: &mut DialectImports) -> Option<String> {
    // TINYINT(1) is the conventional MySQL boolean.
    if lower == "tinyint(1)" || (lower == "tinyint" && field.size == Some(1)) {
        return Some("Boolean".to_string());
    }
    let symbol = match lower {
        "json" => "JSON",
        "mediumtext" => "MEDIUMTEXT",
        "longtext" => "LONGTEXT",
        "year" => "YEAR",
        "set" => "SET",
        _ => return None,
    };
    imports.mysql.insert(symbol);
    Some(symbol.to_string())
}

fn mssql_override(lower: &str, field: &Field, imports: &mut DialectImports) -> Option<String> {
    let symbol = match lower {
        "uuid" => "UNIQUEIDENTIFIER",
        "datetime2" => "DATETIME2",
        "datetimeoffset" => "DATETIMEOFFSET",
        "smalldatetime" => "SMALLDATETIME",
        "money" => "MONEY",
        "smallmoney" => "SMALLMONEY",
        "nvarchar" | "nchar" => "NVARCHAR",
        "ntext" => "NTEXT",
        _ => return None,
    };
    imports.mssql.insert(symbol);
    if symbol == "NVARCHAR" {
        return Some(match field.size {
            Some(n) => format!("NVARCHAR({n})"),
            None => "NVARCHAR".to_string(),
        });
    }
    Some(symbol.to_string())
}

fn generic_storage(lower: &str, field: &Field) -> String {
    match lower {
        "smallint" | "int2" | "smallserial" | "serial2" | "tinyint" => "SmallInteger".to_string(),
        "int" | "integer" | "int4" | "serial" | "serial4" | "mediumint" => "Integer".to_string(),
        "bigint" | "int8" | "bigserial" | "serial8" => "BigInteger".to_string(),
        "decimal" | "numeric" | "number" => match (field.precision, field.scale) {
            (Some(p), Some(s)) => format!("Numeric({p}, {s})"),
            (Some(p), None) => format!("Numeric({p})"),
            _ => "Numeric".to_string(),
        },
        "float" | "float4" | "float8" | "real" | "double" | "double precision" => {
            "Float".to_string()
        }
        "varchar" | "character varying" | "char" | "character" => match field.size {
            Some(n) => format!("String({n})"),
            None => "String".to_string(),
        },
        "text" | "tinytext" | "mediumtext" | "longtext" => "Text".to_string(),
        "date" => "Date".to_string(),
        "datetime" => "DateTime".to_string(),
        t if t.contains("timestamp") => "DateTime(timezone=True)".to_string(),
        "time" | "timetz" => "Time".to_string(),
        "boolean" | "bool" => "Boolean".to_string(),
        "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" | "bytea"
        | "image" => "LargeBinary".to_string(),
        "json" | "jsonb" => "JSON".to_string(),
        // Unmatched names (uuid on generic/mysql included) fall back to
        // an unbounded string, never an error.
        _ => "String".to_string(),
    }
}

/// Resolve the Python-level annotation for a declared type name.
/// Dialect-independent.
pub fn python_annotation(type_name: &str, ctx: &TypeContext) -> String {
    resolve_annotation(type_name, ctx, true)
}

fn resolve_annotation(type_name: &str, ctx: &TypeContext, allow_array: bool) -> String {
    let lower = type_name.trim().to_lowercase();

    if ctx.enum_for(&lower).is_some() {
        return "str".to_string();
    }

    if allow_array {
        if let Some(element) = array_element(&lower) {
            let inner = resolve_annotation(element, ctx, false);
            return format!("List[{inner}]");
        }
    }

    let base = match lower.as_str() {
        "smallint" | "int2" | "smallserial" | "serial2" | "tinyint" | "int" | "integer"
        | "int4" | "serial" | "serial4" | "mediumint" | "bigint" | "int8" | "bigserial"
        | "serial8" => "int",
        "decimal" | "numeric" | "number" => "decimal.Decimal",
        "float" | "float4" | "float8" | "real" | "double" | "double precision" => "float",
        "date" => "datetime.date",
        "datetime" | "datetime2" | "smalldatetime" | "datetimeoffset" => "datetime.datetime",
        t if t.contains("timestamp") => "datetime.datetime",
        "time" | "timetz" => "datetime.time",
        "boolean" | "bool" | "tinyint(1)" => "bool",
        "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" | "bytea"
        | "image" => "bytes",
        "json" | "jsonb" => "dict[str, Any]",
        // string/char/text families, uuid, and anything unmatched
        _ => "str",
    };
    base.to_string()
}
