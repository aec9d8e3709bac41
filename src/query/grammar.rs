use tracing::debug;

use super::{Aggregate, Order, Query, Where};
use crate::error::DbMakerError;
use crate::types::RowValues;

/// Turns [`Query`] descriptors into SQL text.
///
/// The provided methods are the portable grammar most engines accept. A dialect overrides only
/// what it does differently; everything else resolves through these defaults, so an override of
/// a small piece (say [`QueryTranslator::wrap_value`]) flows into every compiled statement.
pub trait QueryTranslator: Send + Sync {
    /// Quote one identifier segment.
    fn wrap_value(&self, value: &str) -> String {
        if value == "*" {
            value.to_string()
        } else {
            format!("\"{}\"", value.replace('"', "\"\""))
        }
    }

    /// Quote a possibly qualified (`t.col`) or aliased (`col as c`) identifier.
    fn wrap(&self, value: &str) -> String {
        if let Some((column, alias)) = split_alias(value) {
            return format!("{} as {}", self.wrap(column), self.wrap_value(alias));
        }
        value
            .split('.')
            .map(|segment| self.wrap_value(segment))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn wrap_table(&self, table: &str) -> String {
        self.wrap(table)
    }

    fn columnize(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|column| self.wrap(column))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn parameterize(&self, count: usize) -> String {
        vec!["?"; count].join(", ")
    }

    /// # Errors
    /// Returns `DbMakerError::UnsupportedOperation` if a clause cannot be expressed.
    fn compile_select(&self, query: &Query) -> Result<String, DbMakerError> {
        let mut parts = vec![match &query.aggregate {
            Some(aggregate) => self.compile_aggregate(query, aggregate),
            None => self.compile_columns(query),
        }];
        parts.push(format!("from {}", self.wrap_table(&query.table)));
        if !query.wheres.is_empty() {
            parts.push(self.compile_wheres(&query.wheres)?);
        }
        if !query.orders.is_empty() {
            parts.push(self.compile_orders(&query.orders));
        }
        if let Some(limit) = query.limit {
            parts.push(self.compile_limit(limit));
        }
        if let Some(offset) = query.offset {
            parts.push(self.compile_offset(offset));
        }
        Ok(parts.join(" "))
    }

    fn compile_columns(&self, query: &Query) -> String {
        let select = if query.distinct {
            "select distinct"
        } else {
            "select"
        };
        if query.columns.is_empty() {
            format!("{select} *")
        } else {
            format!("{select} {}", self.columnize(&query.columns))
        }
    }

    fn compile_aggregate(&self, query: &Query, aggregate: &Aggregate) -> String {
        let mut column = self.columnize(&aggregate.columns);
        if query.distinct && column != "*" {
            column = format!("distinct {column}");
        }
        format!(
            "select {}({column}) as {}",
            aggregate.function,
            self.wrap("aggregate")
        )
    }

    /// # Errors
    /// Returns `DbMakerError::UnsupportedOperation` if a clause cannot be expressed.
    fn compile_wheres(&self, wheres: &[Where]) -> Result<String, DbMakerError> {
        let mut sql = String::from("where");
        for (idx, clause) in wheres.iter().enumerate() {
            if idx > 0 {
                sql.push(' ');
                sql.push_str(clause.boolean().as_str());
            }
            sql.push(' ');
            sql.push_str(&self.compile_where(clause)?);
        }
        Ok(sql)
    }

    /// # Errors
    /// Returns `DbMakerError::UnsupportedOperation` if the clause cannot be expressed.
    fn compile_where(&self, clause: &Where) -> Result<String, DbMakerError> {
        match clause {
            Where::Basic {
                column, operator, ..
            } => Ok(format!("{} {operator} ?", self.wrap(column))),
            Where::Null {
                column, negated, ..
            } => Ok(format!(
                "{} is {}null",
                self.wrap(column),
                if *negated { "not " } else { "" }
            )),
            Where::In {
                column,
                values,
                negated,
                ..
            } => Ok(if values.is_empty() {
                let constant = if *negated { "1 = 1" } else { "0 = 1" };
                constant.to_string()
            } else {
                format!(
                    "{} {}in ({})",
                    self.wrap(column),
                    if *negated { "not " } else { "" },
                    self.parameterize(values.len())
                )
            }),
            Where::Exists { query, negated, .. } => {
                let exists = self.where_exists(query)?;
                Ok(if *negated {
                    format!("not {exists}")
                } else {
                    exists
                })
            }
            Where::Raw { sql, .. } => Ok(sql.clone()),
            Where::Column {
                first,
                operator,
                second,
                ..
            } => Ok(format!(
                "{} {operator} {}",
                self.wrap(first),
                self.wrap(second)
            )),
            Where::JsonContains {
                column, negated, ..
            } => {
                let sql = self.compile_json_contains(column)?;
                Ok(if *negated { format!("not {sql}") } else { sql })
            }
            Where::JsonLength {
                column, operator, ..
            } => self.compile_json_length(column, operator),
        }
    }

    /// # Errors
    /// Returns `DbMakerError::UnsupportedOperation` if the subquery cannot be expressed.
    fn where_exists(&self, query: &Query) -> Result<String, DbMakerError> {
        Ok(format!("exists ({})", self.compile_select(query)?))
    }

    /// # Errors
    /// Returns `DbMakerError::UnsupportedOperation` unless the dialect supports JSON containment.
    fn compile_json_contains(&self, _column: &str) -> Result<String, DbMakerError> {
        Err(DbMakerError::UnsupportedOperation(
            "This database engine does not support JSON contains operations.".into(),
        ))
    }

    /// # Errors
    /// Returns `DbMakerError::UnsupportedOperation` unless the dialect supports JSON length.
    fn compile_json_length(&self, _column: &str, _operator: &str) -> Result<String, DbMakerError> {
        Err(DbMakerError::UnsupportedOperation(
            "This database engine does not support JSON length operations.".into(),
        ))
    }

    fn compile_orders(&self, orders: &[Order]) -> String {
        let orders = orders
            .iter()
            .map(|order| format!("{} {}", self.wrap(&order.column), order.direction.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("order by {orders}")
    }

    fn compile_limit(&self, limit: u64) -> String {
        format!("limit {limit}")
    }

    fn compile_offset(&self, offset: u64) -> String {
        format!("offset {offset}")
    }

    /// SQL answering whether `query` matches any row.
    ///
    /// # Errors
    /// Returns `DbMakerError::UnsupportedOperation` if the select cannot be expressed.
    fn compile_exists(&self, query: &Query) -> Result<String, DbMakerError> {
        Ok(format!(
            "select exists({}) as {}",
            self.compile_select(query)?,
            self.wrap("exists")
        ))
    }

    /// Insert of `rows` rows into `table`, one placeholder group per row.
    fn compile_insert(&self, table: &str, columns: &[String], rows: usize) -> String {
        let group = format!("({})", self.parameterize(columns.len()));
        format!(
            "insert into {} ({}) values {}",
            self.wrap_table(table),
            self.columnize(columns),
            vec![group; rows.max(1)].join(", ")
        )
    }

    /// # Errors
    /// Returns `DbMakerError::UnsupportedOperation` if a where clause cannot be expressed.
    fn compile_update(&self, query: &Query, columns: &[String]) -> Result<String, DbMakerError> {
        let sets = columns
            .iter()
            .map(|column| format!("{} = ?", self.wrap(column)))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("update {} set {sets}", self.wrap_table(&query.table));
        if !query.wheres.is_empty() {
            sql.push(' ');
            sql.push_str(&self.compile_wheres(&query.wheres)?);
        }
        Ok(sql)
    }

    /// # Errors
    /// Returns `DbMakerError::UnsupportedOperation` if a where clause cannot be expressed.
    fn compile_delete(&self, query: &Query) -> Result<String, DbMakerError> {
        let mut sql = format!("delete from {}", self.wrap_table(&query.table));
        if !query.wheres.is_empty() {
            sql.push(' ');
            sql.push_str(&self.compile_wheres(&query.wheres)?);
        }
        Ok(sql)
    }

    /// Statement emptying the table, with its bindings.
    fn compile_truncate(&self, query: &Query) -> (String, Vec<RowValues>) {
        (
            format!("truncate table {}", self.wrap_table(&query.table)),
            Vec::new(),
        )
    }

    fn compile_savepoint(&self, name: &str) -> String {
        format!("SAVEPOINT {name}")
    }

    fn compile_savepoint_rollback(&self, name: &str) -> String {
        format!("ROLLBACK TO SAVEPOINT {name}")
    }
}

/// Split `"col as alias"` (any case of `as`).
fn split_alias(value: &str) -> Option<(&str, &str)> {
    let lower = value.to_ascii_lowercase();
    let idx = lower.find(" as ")?;
    Some((value[..idx].trim(), value[idx + 4..].trim()))
}

/// The portable grammar, with no dialect overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericQueryGrammar;

impl QueryTranslator for GenericQueryGrammar {}

/// DBMaker's query dialect.
///
/// Identifiers stay unquoted on the query side, `exists` goes through `SYSCONINFO` because
/// DBMaker has no `select exists(...)`, truncation is a plain delete, and JSON predicates are
/// rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct DbMakerQueryGrammar;

impl QueryTranslator for DbMakerQueryGrammar {
    fn wrap_value(&self, value: &str) -> String {
        if value == "*" {
            value.to_string()
        } else {
            value.replace('`', "``")
        }
    }

    fn compile_aggregate(&self, query: &Query, aggregate: &Aggregate) -> String {
        let mut column = self.columnize(&aggregate.columns);
        if query.distinct && column != "*" {
            column = format!("distinct {column}");
        }
        format!("select {}({column}) as \"aggregate\"", aggregate.function)
    }

    /// Single-row insert; the caller executes it once per row.
    fn compile_insert(&self, table: &str, columns: &[String], _rows: usize) -> String {
        format!(
            "insert into {}({}) values ({})",
            self.wrap_table(table),
            self.columnize(columns),
            self.parameterize(columns.len())
        )
    }

    fn compile_exists(&self, query: &Query) -> Result<String, DbMakerError> {
        let select = self.compile_select(query)?;
        Ok(format!(
            "select case when CONNECTION_ID is not null then 1 else 0 end from SYSCONINFO where exists ({select})"
        ))
    }

    fn compile_savepoint_rollback(&self, name: &str) -> String {
        format!("ROLLBACK TO {name}")
    }

    fn compile_json_length(&self, _column: &str, _operator: &str) -> Result<String, DbMakerError> {
        Err(DbMakerError::unsupported("JSON length operations"))
    }

    fn compile_json_contains(&self, _column: &str) -> Result<String, DbMakerError> {
        Err(DbMakerError::unsupported("JSON contains operations"))
    }

    fn compile_truncate(&self, query: &Query) -> (String, Vec<RowValues>) {
        let sql = format!("delete from {}", self.wrap_table(&query.table));
        debug!(%sql, "truncate compiled as delete");
        (sql, Vec::new())
    }
}
