//! Engine-neutral table definitions.
//!
//! A [`TableDef`] describes a table once in logical types; the renderers in
//! [`super::render`] turn it into each engine's DDL.

/// Logical column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// UUID text primary/foreign key
    Id,
    Varchar(u32),
    Text,
    Boolean,
    Integer,
    /// Precision and scale
    Decimal(u8, u8),
    /// Millisecond-precision UTC timestamp
    Timestamp,
    Json,
    /// Text restricted to the listed values
    Enum(Vec<&'static str>),
}

/// Column default value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnDefault {
    CurrentTimestamp,
    Bool(bool),
    Int(i64),
    Text(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub unique: bool,
    pub default: Option<ColumnDefault>,
}

impl ColumnDef {
    /// A `NOT NULL` column without default.
    pub fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            nullable: false,
            unique: false,
            default: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default(mut self, value: ColumnDefault) -> Self {
        self.default = Some(value);
        self
    }
}

/// Referential action applied when the referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyAction {
    Cascade,
    SetNull,
}

impl ForeignKeyAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::SetNull => "SET NULL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: &'static str,
    pub ref_table: &'static str,
    pub ref_column: &'static str,
    pub on_delete: ForeignKeyAction,
}

impl ForeignKey {
    /// Reference to `ref_table.id`.
    pub fn to(column: &'static str, ref_table: &'static str, on_delete: ForeignKeyAction) -> Self {
        Self {
            column,
            ref_table,
            ref_column: "id",
            on_delete,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: &'static str,
    pub columns: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: Vec<ColumnDef>,
    pub primary_key: &'static str,
    pub foreign_keys: Vec<ForeignKey>,
    pub indexes: Vec<IndexDef>,
    /// Table-level CHECK expressions
    pub checks: Vec<&'static str>,
}

impl TableDef {
    pub fn new(name: &'static str, primary_key: &'static str) -> Self {
        Self {
            name,
            columns: Vec::new(),
            primary_key,
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
            checks: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn index(mut self, name: &'static str, columns: &[&'static str]) -> Self {
        self.indexes.push(IndexDef {
            name,
            columns: columns.to_vec(),
        });
        self
    }

    pub fn check(mut self, expression: &'static str) -> Self {
        self.checks.push(expression);
        self
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Tables this one references, excluding itself.
    pub fn dependencies(&self) -> Vec<&'static str> {
        let mut deps: Vec<&'static str> = self
            .foreign_keys
            .iter()
            .map(|fk| fk.ref_table)
            .filter(|t| *t != self.name)
            .collect();
        deps.sort_unstable();
        deps.dedup();
        deps
    }
}
