//! Declarative schema for the HushRyd tables.
//!
//! Tables are described once in [`model`] types ([`tables`]) and rendered into
//! MySQL, PostgreSQL, Oracle or SQLite DDL by [`render`].

pub mod model;
pub mod render;
pub mod tables;

pub use model::{ColumnDef, ColumnDefault, ColumnType, ForeignKey, ForeignKeyAction, IndexDef, TableDef};
pub use render::{render_create_table, render_drop_table};
pub use tables::{LocationColumns, core_tables};
