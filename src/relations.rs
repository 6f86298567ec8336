//! Relationship classification, foreign-key resolution, and
//! association-table synthesis.

use std::collections::HashMap;

use crate::diagram::{Cardinality, Diagram, Dialect, Field, Relationship, Table};
use crate::naming::sanitize_identifier;

/// The single fatal error class: a relationship naming a table or
/// field id absent from the diagram.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("relationship references unknown table id {0}")]
    UnknownTable(u64),
    #[error("relationship references unknown field id {field} in table \"{table}\"")]
    UnknownField { table: String, field: u64 },
}

/// A resolved relationship endpoint.
#[derive(Debug, Clone, Copy)]
pub struct Endpoint<'a> {
    pub table: &'a Table,
    pub field: &'a Field,
}

/// A relationship with both endpoints resolved and its cardinality
/// pair classified.
#[derive(Debug, Clone, Copy)]
pub enum Classified<'a> {
    /// Normalized regardless of declaration order; the foreign key
    /// sits on the many side.
    OneToMany { one: Endpoint<'a>, many: Endpoint<'a> },
    /// Declared order preserved; the foreign key sits on the a side.
    OneToOne { a: Endpoint<'a>, b: Endpoint<'a> },
    /// Declared order preserved; no foreign key on either entity
    /// table, the key lives in a synthesized association table.
    ManyToMany { a: Endpoint<'a>, b: Endpoint<'a> },
}

/// Resolve both endpoints and classify by the cardinality pair.
pub fn classify<'a>(
    diagram: &'a Diagram,
    rel: &Relationship,
) -> Result<Classified<'a>, ReferenceError> {
    let source = resolve(diagram, rel.source_table_id, rel.source_field_id)?;
    let target = resolve(diagram, rel.target_table_id, rel.target_field_id)?;
    Ok(match (rel.source_cardinality, rel.target_cardinality) {
        (Cardinality::One, Cardinality::Many) => Classified::OneToMany {
            one: source,
            many: target,
        },
        (Cardinality::Many, Cardinality::One) => Classified::OneToMany {
            one: target,
            many: source,
        },
        (Cardinality::One, Cardinality::One) => Classified::OneToOne {
            a: source,
            b: target,
        },
        (Cardinality::Many, Cardinality::Many) => Classified::ManyToMany {
            a: source,
            b: target,
        },
    })
}

fn resolve<'a>(
    diagram: &'a Diagram,
    table_id: u64,
    field_id: u64,
) -> Result<Endpoint<'a>, ReferenceError> {
    let table = diagram
        .table(table_id)
        .ok_or(ReferenceError::UnknownTable(table_id))?;
    let field = table
        .field(field_id)
        .ok_or_else(|| ReferenceError::UnknownField {
            table: table.name.clone(),
            field: field_id,
        })?;
    Ok(Endpoint { table, field })
}

/// Target of a registered foreign key.
#[derive(Debug, Clone, Copy)]
pub struct FkTarget<'a> {
    pub table: &'a Table,
    pub field: &'a Field,
}

/// Foreign-key holders keyed by (table id, field id).
pub type FkMap<'a> = HashMap<(u64, u64), FkTarget<'a>>;

/// Register foreign keys for the classified relationships. A field
/// claimed by two relationships keeps the later registration.
pub fn build_fk_map<'a>(classified: &[Classified<'a>]) -> FkMap<'a> {
    let mut map = FkMap::new();
    for rel in classified {
        let (holder, target) = match rel {
            Classified::OneToMany { one, many } => (many, one),
            Classified::OneToOne { a, b } => (a, b),
            Classified::ManyToMany { .. } => continue,
        };
        map.insert(
            (holder.table.id, holder.field.id),
            FkTarget {
                table: target.table,
                field: target.field,
            },
        );
    }
    map
}

/// A synthesized join table for a many-to-many relationship.
#[derive(Debug, Clone)]
pub struct AssociationTable<'a> {
    /// Position of the source relationship among all relationships.
    pub ordinal: usize,
    pub name: String,
    pub schema: Option<String>,
    pub a: Endpoint<'a>,
    pub b: Endpoint<'a>,
}

impl AssociationTable<'_> {
    /// Column names for the two foreign-key columns. Bare field names
    /// when they differ; prefixed with the owning table when they
    /// collide (the usual `id`/`id` join), with a positional suffix
    /// for a self-join on one field.
    pub fn column_names(&self) -> (String, String) {
        let a = sanitize_identifier(&self.a.field.name);
        let b = sanitize_identifier(&self.b.field.name);
        if a != b {
            return (a, b);
        }
        let a = format!("{}_{a}", sanitize_identifier(&self.a.table.name));
        let b = format!("{}_{b}", sanitize_identifier(&self.b.table.name));
        if a != b {
            return (a, b);
        }
        (format!("{a}_1"), format!("{b}_2"))
    }
}

/// Build a join table for every many-to-many relationship, named from
/// both participant tables plus the relationship ordinal so repeated
/// joins of the same pair stay distinct.
pub fn build_associations<'a>(
    classified: &[Classified<'a>],
    dialect: Dialect,
) -> Vec<AssociationTable<'a>> {
    let mut out = Vec::new();
    for (ordinal, rel) in classified.iter().enumerate() {
        let Classified::ManyToMany { a, b } = rel else {
            continue;
        };
        let name = format!(
            "{}_{}_{ordinal}",
            sanitize_identifier(&a.table.name),
            sanitize_identifier(&b.table.name),
        );
        let schema = [&a.table.schema, &b.table.schema]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .cloned()
            .or_else(|| dialect.default_schema().map(str::to_string));
        out.push(AssociationTable {
            ordinal,
            name,
            schema,
            a: *a,
            b: *b,
        });
    }
    out
}
