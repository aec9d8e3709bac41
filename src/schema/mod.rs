//! DBMaker DDL: blueprints, the schema grammar, and the catalog-backed schema builder.

pub mod blueprint;
pub mod builder;
pub mod column;
pub mod grammar;

pub use blueprint::{Blueprint, Command, ForeignKeyDefinition};
pub use builder::SchemaBuilder;
pub use column::{ColumnDefinition, ColumnType, DefaultValue};
pub use grammar::{DbMakerSchemaGrammar, SchemaTranslator};
