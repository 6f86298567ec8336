//! Column rendering: one mapped_column declaration per field.

use crate::diagram::{Dialect, Field, Table};
use crate::naming::sanitize_identifier;
use crate::relations::FkMap;
use crate::typemap::{DialectImports, TypeContext, python_annotation, storage_type};

/// `schema.table.field` reference for ForeignKey expressions. The
/// owner's declared schema wins, else the dialect default, else bare.
pub fn foreign_key_ref(table: &Table, field: &Field, dialect: Dialect) -> String {
    let schema = table
        .schema
        .as_deref()
        .filter(|s| !s.is_empty())
        .or_else(|| dialect.default_schema());
    match schema {
        Some(schema) => format!("{schema}.{}.{}", table.name, field.name),
        None => format!("{}.{}", table.name, field.name),
    }
}

/// Render one field declaration, preceded by its comment lines.
///
/// `composite_pk` suppresses the per-column primary-key marker when
/// the table carries a table-level composite constraint.
pub fn render_column(
    lines: &mut Vec<String>,
    table: &Table,
    field: &Field,
    composite_pk: bool,
    fk_map: &FkMap,
    ctx: &TypeContext,
    imports: &mut DialectImports,
) {
    if let Some(comment) = field.comment.as_deref().filter(|c| !c.is_empty()) {
        for line in comment.lines() {
            lines.push(format!("    # {line}"));
        }
    }

    let mut args: Vec<String> = vec![storage_type(field, ctx, imports)];

    if let Some(target) = fk_map.get(&(table.id, field.id)) {
        let reference = foreign_key_ref(target.table, target.field, ctx.dialect);
        args.push(format!("ForeignKey(\"{reference}\")"));
        args.push("index=True".to_string());
    }

    if field.primary && !composite_pk {
        args.push("primary_key=True".to_string());
    }
    if field.increment {
        args.push("autoincrement=True".to_string());
    }
    if field.not_null {
        args.push("nullable=False".to_string());
    }
    // Redundant on a primary key.
    if field.unique && !field.primary {
        args.push("unique=True".to_string());
    }

    args.extend(default_clauses(field));

    if is_uuid_type(&field.field_type.name) {
        args.push("default=uuid.uuid4".to_string());
    }

    let annotation = python_annotation(&field.field_type.name, ctx);
    lines.push(format!(
        "    {}: Mapped[{annotation}] = mapped_column({})",
        sanitize_identifier(&field.name),
        args.join(", "),
    ));
}

fn is_uuid_type(type_name: &str) -> bool {
    matches!(type_name.trim().to_lowercase().as_str(), "uuid" | "guid")
}

/// Derive default-value keyword arguments for a field. Declared
/// defaults win; the created_at/updated_at heuristics apply only when
/// no default is declared. Auto-increment fields get none.
fn default_clauses(field: &Field) -> Vec<String> {
    if field.increment {
        return Vec::new();
    }

    if let Some(default) = field.default.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        return vec![server_default(default)];
    }

    let lower = field.name.to_lowercase();
    if lower.ends_with("updated_at") {
        return vec![
            "server_default=func.now()".to_string(),
            "onupdate=func.now()".to_string(),
        ];
    }
    if lower.ends_with("created_at") {
        return vec!["server_default=func.now()".to_string()];
    }
    Vec::new()
}

fn server_default(default: &str) -> String {
    let lower = default.to_lowercase();
    if lower == "now()" || lower == "current_timestamp" || lower == "current_timestamp()" {
        return "server_default=func.now()".to_string();
    }
    if lower.starts_with("nextval(") {
        return format!("server_default=text(\"{}\")", escape_double(default));
    }
    if is_numeric_literal(default) {
        return format!("server_default=text(\"{default}\")");
    }
    if let Some(inner) = strip_quotes(default) {
        return format!("server_default=text(\"'{}'\")", escape_double(inner));
    }
    format!("server_default=text(\"{}\")", escape_double(default))
}

fn is_numeric_literal(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    !body.is_empty()
        && body.chars().all(|c| c.is_ascii_digit() || c == '.')
        && body.chars().filter(|c| *c == '.').count() <= 1
        && body.chars().any(|c| c.is_ascii_digit())
}

fn strip_quotes(s: &str) -> Option<&str> {
    for quote in ['\'', '"'] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return Some(&s[1..s.len() - 1]);
        }
    }
    None
}

fn escape_double(s: &str) -> String {
    s.replace('"', "\\\"")
}
