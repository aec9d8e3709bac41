//! Query descriptors and the DBMaker query dialect.
//!
//! A [`Query`] is plain data: table, selected columns, where clauses, ordering, paging and an
//! optional aggregate. Grammars turn it into SQL text; [`Query::bindings`] yields the values in
//! the same order as the `?` placeholders the grammar writes.

pub mod builder;
pub mod grammar;
pub mod processor;

use std::collections::BTreeMap;

use crate::types::RowValues;

pub use builder::QueryBuilder;
pub use grammar::{DbMakerQueryGrammar, GenericQueryGrammar, QueryTranslator};
pub use processor::{DbMakerProcessor, is_numeric};

/// One row of insert/update values. Keys are kept sorted, which is the column order the
/// DBMaker insert uses.
pub type Record = BTreeMap<String, RowValues>;

/// Build a [`Record`] from `(column, value)` pairs.
pub fn record<I, K, V>(pairs: I) -> Record
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<RowValues>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// How a where clause joins the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boolean {
    #[default]
    And,
    Or,
}

impl Boolean {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Boolean::And => "and",
            Boolean::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    Basic {
        column: String,
        operator: String,
        value: RowValues,
        boolean: Boolean,
    },
    Null {
        column: String,
        negated: bool,
        boolean: Boolean,
    },
    In {
        column: String,
        values: Vec<RowValues>,
        negated: bool,
        boolean: Boolean,
    },
    Exists {
        query: Box<Query>,
        negated: bool,
        boolean: Boolean,
    },
    Raw {
        sql: String,
        bindings: Vec<RowValues>,
        boolean: Boolean,
    },
    Column {
        first: String,
        operator: String,
        second: String,
        boolean: Boolean,
    },
    JsonContains {
        column: String,
        value: RowValues,
        negated: bool,
        boolean: Boolean,
    },
    JsonLength {
        column: String,
        operator: String,
        value: RowValues,
        boolean: Boolean,
    },
}

impl Where {
    #[must_use]
    pub fn boolean(&self) -> Boolean {
        match self {
            Where::Basic { boolean, .. }
            | Where::Null { boolean, .. }
            | Where::In { boolean, .. }
            | Where::Exists { boolean, .. }
            | Where::Raw { boolean, .. }
            | Where::Column { boolean, .. }
            | Where::JsonContains { boolean, .. }
            | Where::JsonLength { boolean, .. } => *boolean,
        }
    }

    fn push_bindings(&self, out: &mut Vec<RowValues>) {
        match self {
            Where::Basic { value, .. }
            | Where::JsonContains { value, .. }
            | Where::JsonLength { value, .. } => out.push(value.clone()),
            Where::In { values, .. } => out.extend(values.iter().cloned()),
            Where::Exists { query, .. } => out.extend(query.bindings()),
            Where::Raw { bindings, .. } => out.extend(bindings.iter().cloned()),
            Where::Null { .. } | Where::Column { .. } => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub function: String,
    pub columns: Vec<String>,
}

/// A select/update/delete target plus its clauses.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    /// Table name, already carrying the connection's table prefix.
    pub table: String,
    /// Selected columns; empty means `*`.
    pub columns: Vec<String>,
    pub distinct: bool,
    pub wheres: Vec<Where>,
    pub orders: Vec<Order>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub aggregate: Option<Aggregate>,
}

impl Query {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Values for the where clauses, in placeholder order.
    #[must_use]
    pub fn bindings(&self) -> Vec<RowValues> {
        let mut out = Vec::new();
        for clause in &self.wheres {
            clause.push_bindings(&mut out);
        }
        out
    }

    /// A copy of this query that computes `function(columns)` instead of selecting rows.
    #[must_use]
    pub fn with_aggregate(&self, function: &str, columns: &[&str]) -> Self {
        let mut query = self.clone();
        query.aggregate = Some(Aggregate {
            function: function.to_string(),
            columns: columns.iter().map(ToString::to_string).collect(),
        });
        query.orders.clear();
        query.limit = None;
        query.offset = None;
        query
    }
}
