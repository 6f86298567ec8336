//! Table rendering: one declarative class per non-view table, plus
//! the relationship attribute lines shared between classes.

use std::collections::{BTreeSet, HashMap};

use crate::diagram::{Dialect, Field, Relationship, Table};
use crate::naming::{pascal_case, pluralize, sanitize_identifier};
use crate::relations::{AssociationTable, Classified, FkMap};
use crate::typemap::{DialectImports, TypeContext};

use super::GeneratorOptions;
use super::column::render_column;

const DEFAULT_CASCADE: &str = "all, delete-orphan";

/// Render one class block for a table.
pub fn render_table(
    table: &Table,
    fk_map: &FkMap,
    rel_lines: &[String],
    ctx: &TypeContext,
    imports: &mut DialectImports,
) -> String {
    let mut lines = Vec::new();
    lines.push(format!("class {}(Base):", pascal_case(&table.name)));

    if let Some(comment) = table.comment.as_deref().filter(|c| !c.is_empty()) {
        lines.push(format!("    \"\"\"{}\"\"\"", docstring(comment)));
        lines.push(String::new());
    }

    lines.push(format!("    __tablename__ = \"{}\"", table.name));

    let args = table_args(table, ctx.dialect);
    if !args.is_empty() {
        lines.push("    __table_args__ = (".to_string());
        for arg in &args {
            lines.push(format!("        {arg},"));
        }
        lines.push("    )".to_string());
    }
    lines.push(String::new());

    let composite_pk = table.fields.iter().filter(|f| f.primary).count() > 1;
    for field in &table.fields {
        render_column(&mut lines, table, field, composite_pk, fk_map, ctx, imports);
    }

    if !rel_lines.is_empty() {
        lines.push(String::new());
        lines.extend(rel_lines.iter().cloned());
    }

    lines.join("\n")
}

/// Flatten newlines and escape literal triple quotes.
fn docstring(comment: &str) -> String {
    comment
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .replace("\"\"\"", "\\\"\\\"\\\"")
}

/// Table-level argument tuple in fixed order: composite primary key,
/// surviving indexes, schema qualifier. Empty when nothing applies.
fn table_args(table: &Table, dialect: Dialect) -> Vec<String> {
    let mut args = Vec::new();

    let pk_fields: Vec<&Field> = table.fields.iter().filter(|f| f.primary).collect();
    if pk_fields.len() > 1 {
        args.push(format!(
            "PrimaryKeyConstraint({})",
            quoted_list(pk_fields.iter().map(|f| f.name.as_str()))
        ));
    }

    let pk_names: BTreeSet<&str> = pk_fields.iter().map(|f| f.name.as_str()).collect();
    for index in &table.indices {
        if index.primary {
            continue;
        }
        let fields: Vec<&Field> = index
            .fields
            .iter()
            .filter_map(|id| table.field(*id))
            .collect();
        if fields.is_empty() {
            continue;
        }
        let names: BTreeSet<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        if names == pk_names {
            // Would duplicate the table-level primary key.
            continue;
        }
        if index.unique && fields.len() == 1 && fields[0].unique {
            // Already unique at column level.
            continue;
        }
        let list = quoted_list(fields.iter().map(|f| f.name.as_str()));
        if index.unique {
            args.push(format!("UniqueConstraint({list}, name=\"{}\")", index.name));
        } else {
            args.push(format!("Index(\"{}\", {list})", index.name));
        }
    }

    let schema = table
        .schema
        .as_deref()
        .filter(|s| !s.is_empty())
        .or_else(|| dialect.default_schema());
    if let Some(schema) = schema {
        args.push(format!("{{\"schema\": \"{schema}\"}}"));
    }

    args
}

fn quoted_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names
        .map(|n| format!("\"{n}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the relationship attribute lines for every table: exactly one
/// line per participating side, deduplicated per table, in
/// relationship-declaration order.
///
/// `relationships` and `classified` run in parallel; the index is the
/// relationship ordinal used for association lookup.
pub fn relationship_lines(
    relationships: &[Relationship],
    classified: &[Classified<'_>],
    associations: &[AssociationTable<'_>],
    options: &GeneratorOptions,
) -> HashMap<u64, Vec<String>> {
    let mut lines: HashMap<u64, Vec<String>> = HashMap::new();

    for (ordinal, (rel, class)) in relationships.iter().zip(classified).enumerate() {
        match class {
            Classified::OneToMany { one, many } => {
                let cascade = rel
                    .cascade
                    .as_deref()
                    .or(options.cascade.as_deref())
                    .unwrap_or(DEFAULT_CASCADE);
                let collection = collection_name(many.table);
                let scalar = scalar_name(one.table);
                let many_class = pascal_case(&many.table.name);
                let one_class = pascal_case(&one.table.name);
                push_line(
                    &mut lines,
                    one.table.id,
                    format!(
                        "    {collection}: Mapped[List[\"{many_class}\"]] = relationship(\"{many_class}\", back_populates=\"{scalar}\", lazy=\"selectin\", cascade=\"{cascade}\")"
                    ),
                );
                push_line(
                    &mut lines,
                    many.table.id,
                    format!(
                        "    {scalar}: Mapped[\"{one_class}\"] = relationship(\"{one_class}\", back_populates=\"{collection}\", lazy=\"selectin\")"
                    ),
                );
            }
            Classified::OneToOne { a, b } => {
                let a_attr = scalar_name(a.table);
                let b_attr = scalar_name(b.table);
                let a_class = pascal_case(&a.table.name);
                let b_class = pascal_case(&b.table.name);
                push_line(
                    &mut lines,
                    a.table.id,
                    format!(
                        "    {b_attr}: Mapped[\"{b_class}\"] = relationship(\"{b_class}\", back_populates=\"{a_attr}\", lazy=\"selectin\")"
                    ),
                );
                push_line(
                    &mut lines,
                    b.table.id,
                    format!(
                        "    {a_attr}: Mapped[\"{a_class}\"] = relationship(\"{a_class}\", back_populates=\"{b_attr}\", lazy=\"selectin\")"
                    ),
                );
            }
            Classified::ManyToMany { a, b } => {
                let Some(assoc) = associations.iter().find(|t| t.ordinal == ordinal) else {
                    continue;
                };
                let a_coll = collection_name(a.table);
                let b_coll = collection_name(b.table);
                let a_class = pascal_case(&a.table.name);
                let b_class = pascal_case(&b.table.name);
                push_line(
                    &mut lines,
                    a.table.id,
                    format!(
                        "    {b_coll}: Mapped[List[\"{b_class}\"]] = relationship(\"{b_class}\", secondary={}, back_populates=\"{a_coll}\", lazy=\"selectin\")",
                        assoc.name
                    ),
                );
                push_line(
                    &mut lines,
                    b.table.id,
                    format!(
                        "    {a_coll}: Mapped[List[\"{a_class}\"]] = relationship(\"{a_class}\", secondary={}, back_populates=\"{b_coll}\", lazy=\"selectin\")",
                        assoc.name
                    ),
                );
            }
        }
    }

    lines
}

fn push_line(map: &mut HashMap<u64, Vec<String>>, table_id: u64, line: String) {
    let entry = map.entry(table_id).or_default();
    if !entry.contains(&line) {
        entry.push(line);
    }
}

fn collection_name(table: &Table) -> String {
    pluralize(&sanitize_identifier(&table.name).to_lowercase())
}

fn scalar_name(table: &Table) -> String {
    sanitize_identifier(&table.name).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{FieldType, TableIndex};

    fn field(id: u64, name: &str, primary: bool) -> Field {
        Field {
            id,
            name: name.to_string(),
            field_type: FieldType {
                name: "INT".to_string(),
                id: None,
            },
            primary,
            not_null: false,
            unique: false,
            increment: false,
            default: None,
            size: None,
            precision: None,
            scale: None,
            comment: None,
        }
    }

    fn table(name: &str, fields: Vec<Field>, indices: Vec<TableIndex>) -> Table {
        Table {
            id: 1,
            name: name.to_string(),
            schema: None,
            is_view: false,
            fields,
            indices,
            comment: None,
        }
    }

    fn render(table: &Table, dialect: Dialect) -> String {
        let ctx = TypeContext::new(dialect, &[]);
        let mut imports = DialectImports::default();
        render_table(table, &FkMap::new(), &[], &ctx, &mut imports)
    }

    #[test]
    fn test_composite_primary_key() {
        let t = table(
            "order_items",
            vec![
                field(1, "order_id", true),
                field(2, "item_id", true),
                field(3, "qty", false),
            ],
            vec![],
        );
        let out = render(&t, Dialect::Generic);
        assert!(out.contains("PrimaryKeyConstraint(\"order_id\", \"item_id\")"));
        assert!(!out.contains("primary_key=True"));
    }

    #[test]
    fn test_single_primary_key_stays_on_column() {
        let t = table("orders", vec![field(1, "id", true)], vec![]);
        let out = render(&t, Dialect::Generic);
        assert!(!out.contains("PrimaryKeyConstraint"));
        assert!(out.contains("primary_key=True"));
        // No schema, no indexes: the tuple is omitted entirely.
        assert!(!out.contains("__table_args__"));
    }

    #[test]
    fn test_index_matching_pk_set_is_suppressed() {
        let t = table(
            "order_items",
            vec![field(1, "order_id", true), field(2, "item_id", true)],
            vec![TableIndex {
                name: "ix_pk_dup".to_string(),
                unique: false,
                fields: vec![2, 1],
                primary: false,
            }],
        );
        let out = render(&t, Dialect::Generic);
        assert!(!out.contains("ix_pk_dup"));
    }

    #[test]
    fn test_redundant_single_column_unique_index_is_suppressed() {
        let mut email = field(2, "email", false);
        email.unique = true;
        let t = table(
            "users",
            vec![field(1, "id", true), email],
            vec![
                TableIndex {
                    name: "uq_users_email".to_string(),
                    unique: true,
                    fields: vec![2],
                    primary: false,
                },
                TableIndex {
                    name: "ix_users_email".to_string(),
                    unique: false,
                    fields: vec![2],
                    primary: false,
                },
            ],
        );
        let out = render(&t, Dialect::Generic);
        assert!(!out.contains("uq_users_email"));
        // The plain index on the same column survives.
        assert!(out.contains("Index(\"ix_users_email\", \"email\")"));
    }

    #[test]
    fn test_surviving_constraints_and_schema_order() {
        let t = Table {
            schema: Some("sales".to_string()),
            ..table(
                "orders",
                vec![
                    field(1, "id", true),
                    field(2, "region", false),
                    field(3, "number", false),
                ],
                vec![
                    TableIndex {
                        name: "uq_region_number".to_string(),
                        unique: true,
                        fields: vec![2, 3],
                        primary: false,
                    },
                    TableIndex {
                        name: "ix_region".to_string(),
                        unique: false,
                        fields: vec![2],
                        primary: false,
                    },
                ],
            )
        };
        let out = render(&t, Dialect::Generic);
        let uq = out
            .find("UniqueConstraint(\"region\", \"number\", name=\"uq_region_number\")")
            .unwrap();
        let ix = out.find("Index(\"ix_region\", \"region\")").unwrap();
        let schema = out.find("{\"schema\": \"sales\"}").unwrap();
        assert!(uq < ix && ix < schema);
    }

    #[test]
    fn test_docstring_flattening_and_escaping() {
        let t = Table {
            comment: Some("Line one\nline two with \"\"\" inside".to_string()),
            ..table("notes", vec![field(1, "id", true)], vec![])
        };
        let out = render(&t, Dialect::Generic);
        assert!(out.contains("\"\"\"Line one line two with \\\"\\\"\\\" inside\"\"\""));
    }

    #[test]
    fn test_dialect_default_schema_applies() {
        let t = table("courses", vec![field(1, "id", true)], vec![]);
        let out = render(&t, Dialect::PostgreSql);
        assert!(out.contains("{\"schema\": \"public\"}"));
        let out = render(&t, Dialect::MySql);
        assert!(!out.contains("schema"));
    }
}
