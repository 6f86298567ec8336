//! SQLAlchemy document generation: composes naming, type mapping, and
//! relationship resolution into one deterministic text output.

pub mod column;
pub mod table;

use crate::diagram::Diagram;
use crate::relations::{
    AssociationTable, ReferenceError, build_associations, build_fk_map, classify,
};
use crate::typemap::{DialectImports, TypeContext, storage_type};

/// Generation options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratorOptions {
    /// Cascade policy for one-to-many collection attributes. A
    /// per-relationship cascade on the model takes precedence.
    pub cascade: Option<String>,
}

/// Universal imports and the base-class declaration surrounding the
/// accumulated dialect imports.
const UNIVERSAL_IMPORTS: &[&str] = &[
    "from typing import Any, List",
    "",
    "import datetime",
    "import decimal",
    "import uuid",
    "",
    "from sqlalchemy import (",
    "    ARRAY, BigInteger, Boolean, Column, Date, DateTime, Enum, Float,",
    "    ForeignKey, Index, Integer, JSON, LargeBinary, Numeric,",
    "    PrimaryKeyConstraint, SmallInteger, String, Table, Text, Time,",
    "    UniqueConstraint, func, text,",
    ")",
    "from sqlalchemy.orm import DeclarativeBase, Mapped, mapped_column, relationship",
];

/// Generate SQLAlchemy declarative models for a diagram.
///
/// Deterministic for a given input; all intermediate state is local to
/// one invocation. The only failure is a relationship referencing an
/// unknown table or field id.
pub fn generate(diagram: &Diagram, options: &GeneratorOptions) -> Result<String, ReferenceError> {
    if diagram.tables.is_empty() {
        return Ok(String::new());
    }

    let ctx = TypeContext::new(diagram.dialect, &diagram.types);
    let mut imports = DialectImports::default();

    let classified = diagram
        .relationships
        .iter()
        .map(|rel| classify(diagram, rel))
        .collect::<Result<Vec<_>, _>>()?;
    let fk_map = build_fk_map(&classified);
    let associations = build_associations(&classified, diagram.dialect);
    let rel_lines =
        table::relationship_lines(&diagram.relationships, &classified, &associations, options);

    let association_blocks: Vec<String> = associations
        .iter()
        .map(|assoc| render_association(assoc, &ctx, &mut imports))
        .collect();

    let class_blocks: Vec<String> = diagram
        .tables
        .iter()
        .filter(|t| !t.is_view)
        .map(|t| {
            let lines = rel_lines.get(&t.id).map(Vec::as_slice).unwrap_or(&[]);
            table::render_table(t, &fk_map, lines, &ctx, &mut imports)
        })
        .collect();

    let mut prologue: Vec<String> = UNIVERSAL_IMPORTS.iter().map(|s| s.to_string()).collect();
    prologue.extend(imports.import_lines());
    prologue.push(String::new());
    prologue.push("class Base(DeclarativeBase):".to_string());
    prologue.push("    pass".to_string());

    let mut blocks = vec![prologue.join("\n")];
    blocks.extend(association_blocks);
    blocks.extend(class_blocks);

    let mut output = blocks.join("\n\n");
    output.push('\n');
    Ok(output)
}

/// Render one synthesized join table: two columns, each a composite
/// primary-key member and a foreign key to its owning table.
fn render_association(
    assoc: &AssociationTable<'_>,
    ctx: &TypeContext,
    imports: &mut DialectImports,
) -> String {
    let mut lines = Vec::new();
    lines.push(format!("{} = Table(", assoc.name));
    lines.push(format!("    \"{}\",", assoc.name));
    lines.push("    Base.metadata,".to_string());
    let (name_a, name_b) = assoc.column_names();
    for (name, end) in [(name_a, &assoc.a), (name_b, &assoc.b)] {
        let storage = storage_type(end.field, ctx, imports);
        let reference = column::foreign_key_ref(end.table, end.field, ctx.dialect);
        lines.push(format!(
            "    Column(\"{name}\", {storage}, ForeignKey(\"{reference}\"), primary_key=True),",
        ));
    }
    if let Some(schema) = &assoc.schema {
        lines.push(format!("    schema=\"{schema}\","));
    }
    lines.push(")".to_string());
    lines.join("\n")
}
