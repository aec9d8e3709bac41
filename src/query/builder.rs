use tracing::debug;

use super::grammar::QueryTranslator;
use super::{Boolean, Direction, Order, Query, Record, Where};
use crate::connection::DbMakerConnection;
use crate::error::DbMakerError;
use crate::results::CustomDbRow;
use crate::types::{InsertId, RowValues};

/// Fluent query builder bound to a [`DbMakerConnection`].
///
/// Clause methods consume and return the builder; terminal methods (`get`, `insert`, `exists`,
/// ...) borrow it, so one builder can run several statements.
///
/// ```rust,no_run
/// use dbmaker_middleware::prelude::*;
///
/// # fn demo(db: &mut DbMakerConnection) -> Result<(), DbMakerError> {
/// let adults = db
///     .table("users")
///     .where_op("age", ">=", 18)
///     .order_by("name", Direction::Asc)
///     .get()?;
/// let id = db.table("users").insert_get_id(record([("name", "Ann")]))?;
/// # let _ = (adults, id);
/// # Ok(())
/// # }
/// ```
pub struct QueryBuilder<'c> {
    conn: &'c mut DbMakerConnection,
    query: Query,
}

impl<'c> QueryBuilder<'c> {
    pub(crate) fn new(conn: &'c mut DbMakerConnection, table: String) -> Self {
        Self {
            conn,
            query: Query::new(table),
        }
    }

    #[must_use]
    pub fn query(&self) -> &Query {
        &self.query
    }

    #[must_use]
    pub fn bindings(&self) -> Vec<RowValues> {
        self.query.bindings()
    }

    /// The select this builder would run.
    ///
    /// # Errors
    /// Returns `DbMakerError::UnsupportedOperation` if a clause cannot be expressed.
    pub fn to_sql(&self) -> Result<String, DbMakerError> {
        self.conn.query_grammar().compile_select(&self.query)
    }

    #[must_use]
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.query.columns = columns.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.query.distinct = true;
        self
    }

    #[must_use]
    pub fn where_eq(self, column: &str, value: impl Into<RowValues>) -> Self {
        self.where_op(column, "=", value)
    }

    #[must_use]
    pub fn where_op(mut self, column: &str, operator: &str, value: impl Into<RowValues>) -> Self {
        self.query.wheres.push(Where::Basic {
            column: column.to_string(),
            operator: operator.to_string(),
            value: value.into(),
            boolean: Boolean::And,
        });
        self
    }

    #[must_use]
    pub fn or_where(mut self, column: &str, operator: &str, value: impl Into<RowValues>) -> Self {
        self.query.wheres.push(Where::Basic {
            column: column.to_string(),
            operator: operator.to_string(),
            value: value.into(),
            boolean: Boolean::Or,
        });
        self
    }

    #[must_use]
    pub fn where_null(mut self, column: &str) -> Self {
        self.query.wheres.push(Where::Null {
            column: column.to_string(),
            negated: false,
            boolean: Boolean::And,
        });
        self
    }

    #[must_use]
    pub fn where_not_null(mut self, column: &str) -> Self {
        self.query.wheres.push(Where::Null {
            column: column.to_string(),
            negated: true,
            boolean: Boolean::And,
        });
        self
    }

    #[must_use]
    pub fn where_in(mut self, column: &str, values: Vec<RowValues>) -> Self {
        self.query.wheres.push(Where::In {
            column: column.to_string(),
            values,
            negated: false,
            boolean: Boolean::And,
        });
        self
    }

    #[must_use]
    pub fn where_not_in(mut self, column: &str, values: Vec<RowValues>) -> Self {
        self.query.wheres.push(Where::In {
            column: column.to_string(),
            values,
            negated: true,
            boolean: Boolean::And,
        });
        self
    }

    #[must_use]
    pub fn where_exists(mut self, query: Query) -> Self {
        self.query.wheres.push(Where::Exists {
            query: Box::new(query),
            negated: false,
            boolean: Boolean::And,
        });
        self
    }

    #[must_use]
    pub fn where_not_exists(mut self, query: Query) -> Self {
        self.query.wheres.push(Where::Exists {
            query: Box::new(query),
            negated: true,
            boolean: Boolean::And,
        });
        self
    }

    #[must_use]
    pub fn where_raw(mut self, sql: &str, bindings: Vec<RowValues>) -> Self {
        self.query.wheres.push(Where::Raw {
            sql: sql.to_string(),
            bindings,
            boolean: Boolean::And,
        });
        self
    }

    #[must_use]
    pub fn where_column(mut self, first: &str, operator: &str, second: &str) -> Self {
        self.query.wheres.push(Where::Column {
            first: first.to_string(),
            operator: operator.to_string(),
            second: second.to_string(),
            boolean: Boolean::And,
        });
        self
    }

    /// Recorded as given; compiling it fails on DBMaker.
    #[must_use]
    pub fn where_json_contains(mut self, column: &str, value: impl Into<RowValues>) -> Self {
        self.query.wheres.push(Where::JsonContains {
            column: column.to_string(),
            value: value.into(),
            negated: false,
            boolean: Boolean::And,
        });
        self
    }

    /// Recorded as given; compiling it fails on DBMaker.
    #[must_use]
    pub fn where_json_length(
        mut self,
        column: &str,
        operator: &str,
        value: impl Into<RowValues>,
    ) -> Self {
        self.query.wheres.push(Where::JsonLength {
            column: column.to_string(),
            operator: operator.to_string(),
            value: value.into(),
            boolean: Boolean::And,
        });
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.query.orders.push(Order {
            column: column.to_string(),
            direction,
        });
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.query.offset = Some(offset);
        self
    }

    /// DBMaker has no random ordering; the builder is returned unchanged.
    #[must_use]
    pub fn in_random_order(self, seed: &str) -> Self {
        debug!(seed, "random ordering is not supported on DBMaker; ignored");
        self
    }

    /// Keyset page: rows with `column > last_id`, ordered by `column`, at most `per_page`.
    #[must_use]
    pub fn for_page_after_id(
        mut self,
        per_page: u64,
        last_id: Option<RowValues>,
        column: &str,
    ) -> Self {
        self.query = page_after_id(&self.query, per_page, last_id, column);
        self
    }

    /// # Errors
    /// Returns `DbMakerError::UnsupportedOperation` for clauses DBMaker cannot express and
    /// `DbMakerError::DriverExecutionError` if the select fails.
    pub fn get(&mut self) -> Result<Vec<CustomDbRow>, DbMakerError> {
        run_select(self.conn, &self.query)
    }

    /// # Errors
    /// Same as [`QueryBuilder::get`].
    pub fn first(&mut self) -> Result<Option<CustomDbRow>, DbMakerError> {
        let mut query = self.query.clone();
        query.limit = Some(1);
        Ok(run_select(self.conn, &query)?.into_iter().next())
    }

    /// Row whose `id` equals `id`.
    ///
    /// # Errors
    /// Same as [`QueryBuilder::get`].
    pub fn find(self, id: impl Into<RowValues>) -> Result<Option<CustomDbRow>, DbMakerError> {
        self.where_eq("id", id).first()
    }

    /// # Errors
    /// Same as [`QueryBuilder::get`].
    pub fn aggregate(
        &mut self,
        function: &str,
        column: &str,
    ) -> Result<Option<RowValues>, DbMakerError> {
        let query = self.query.with_aggregate(function, &[column]);
        let sql = self.conn.query_grammar().compile_select(&query)?;
        let row = self.conn.select_one(&sql, &query.bindings())?;
        Ok(row.and_then(|row| {
            row.get_ignore_case("aggregate")
                .or_else(|| row.first_value())
                .cloned()
        }))
    }

    /// # Errors
    /// Same as [`QueryBuilder::get`], plus `DbMakerError::Other` for a non-numeric count.
    pub fn count(&mut self) -> Result<i64, DbMakerError> {
        match self.aggregate("count", "*")? {
            Some(RowValues::Int(n)) => Ok(n),
            Some(RowValues::Text(text)) => text
                .trim()
                .parse()
                .map_err(|_| DbMakerError::Other(format!("non-numeric count `{text}`"))),
            Some(RowValues::Null) | None => Ok(0),
            Some(other) => Err(DbMakerError::Other(format!("non-numeric count {other:?}"))),
        }
    }

    /// # Errors
    /// Same as [`QueryBuilder::get`].
    pub fn max(&mut self, column: &str) -> Result<Option<RowValues>, DbMakerError> {
        self.aggregate("max", column)
    }

    /// # Errors
    /// Same as [`QueryBuilder::get`].
    pub fn min(&mut self, column: &str) -> Result<Option<RowValues>, DbMakerError> {
        self.aggregate("min", column)
    }

    /// # Errors
    /// Same as [`QueryBuilder::get`].
    pub fn sum(&mut self, column: &str) -> Result<Option<RowValues>, DbMakerError> {
        self.aggregate("sum", column)
    }

    /// # Errors
    /// Same as [`QueryBuilder::get`].
    pub fn avg(&mut self, column: &str) -> Result<Option<RowValues>, DbMakerError> {
        self.aggregate("avg", column)
    }

    /// Whether any row matches, via the `SYSCONINFO` exists query.
    ///
    /// # Errors
    /// Same as [`QueryBuilder::get`].
    pub fn exists(&mut self) -> Result<bool, DbMakerError> {
        let sql = self.conn.query_grammar().compile_exists(&self.query)?;
        let rows = self.conn.select(&sql, &self.query.bindings())?;
        Ok(rows
            .first()
            .and_then(CustomDbRow::first_value)
            .is_some_and(truthy))
    }

    /// # Errors
    /// Same as [`QueryBuilder::exists`].
    pub fn doesnt_exist(&mut self) -> Result<bool, DbMakerError> {
        Ok(!self.exists()?)
    }

    /// Insert `rows`, one execution per row. An empty slice is a no-op.
    ///
    /// # Errors
    /// Returns `DbMakerError::ParameterError` if the rows do not share one column set, and
    /// `DbMakerError::DriverExecutionError` if an execution fails.
    pub fn insert(&mut self, rows: Vec<Record>) -> Result<(), DbMakerError> {
        if rows.is_empty() {
            return Ok(());
        }
        let (columns, values) = split_records(&rows)?;
        let sql = self
            .conn
            .query_grammar()
            .compile_insert(&self.query.table, &columns, values.len());
        self.conn.insert_rows(&sql, &values)
    }

    /// # Errors
    /// Same as [`QueryBuilder::insert`].
    pub fn insert_one(&mut self, row: Record) -> Result<(), DbMakerError> {
        self.insert(vec![row])
    }

    /// Insert one row and return the serial DBMaker generated for it.
    ///
    /// # Errors
    /// Same as [`QueryBuilder::insert`], plus failures of the catalog read.
    pub fn insert_get_id(&mut self, row: Record) -> Result<InsertId, DbMakerError> {
        let rows = [row];
        let (columns, values) = split_records(&rows)?;
        let sql = self
            .conn
            .query_grammar()
            .compile_insert(&self.query.table, &columns, 1);
        let processor = self.conn.processor();
        processor.process_insert_get_id(self.conn, &sql, &values)
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the update fails.
    pub fn update(&mut self, values: Record) -> Result<i64, DbMakerError> {
        let columns: Vec<String> = values.keys().cloned().collect();
        let sql = self
            .conn
            .query_grammar()
            .compile_update(&self.query, &columns)?;
        let mut bindings: Vec<RowValues> = values.into_values().collect();
        bindings.extend(self.query.bindings());
        self.conn.update(&sql, &bindings)
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the delete fails.
    pub fn delete(&mut self) -> Result<i64, DbMakerError> {
        let sql = self.conn.query_grammar().compile_delete(&self.query)?;
        self.conn.delete(&sql, &self.query.bindings())
    }

    /// Remove every row of the table (`delete from`, DBMaker has no `truncate`).
    ///
    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the statement fails.
    pub fn truncate(&mut self) -> Result<(), DbMakerError> {
        let (sql, bindings) = self.conn.query_grammar().compile_truncate(&self.query);
        self.conn.statement(&sql, &bindings)
    }

    /// Values of `column` across the result.
    ///
    /// # Errors
    /// Same as [`QueryBuilder::get`].
    pub fn pluck(&mut self, column: &str) -> Result<Vec<RowValues>, DbMakerError> {
        let mut query = self.query.clone();
        query.columns = vec![column.to_string()];
        let rows = run_select(self.conn, &query)?;
        let column = strip_table_for_pluck(column);
        Ok(rows
            .iter()
            .map(|row| lookup(row, column).cloned().unwrap_or(RowValues::Null))
            .collect())
    }

    /// `(key, value)` pairs of `key` and `column` across the result.
    ///
    /// # Errors
    /// Same as [`QueryBuilder::get`].
    pub fn pluck_keyed(
        &mut self,
        column: &str,
        key: &str,
    ) -> Result<Vec<(RowValues, RowValues)>, DbMakerError> {
        let mut query = self.query.clone();
        query.columns = vec![column.to_string(), key.to_string()];
        let rows = run_select(self.conn, &query)?;
        let column = strip_table_for_pluck(column);
        let key = strip_table_for_pluck(key);
        Ok(rows
            .iter()
            .map(|row| {
                (
                    lookup(row, key).cloned().unwrap_or(RowValues::Null),
                    lookup(row, column).cloned().unwrap_or(RowValues::Null),
                )
            })
            .collect())
    }

    /// Walk the result in keyset pages of `count` rows ordered by `column`.
    ///
    /// The column name is upper-cased to match DBMaker's catalog casing; `alias` names the
    /// result field holding the id when it differs. Stops after a short page, or when
    /// `callback` returns `false`, in which case the result is `Ok(false)`.
    ///
    /// # Errors
    /// Same as [`QueryBuilder::get`], plus `DbMakerError::ParameterError` if a page lacks the
    /// id field.
    pub fn chunk_by_id<F>(
        &mut self,
        count: u64,
        mut callback: F,
        column: &str,
        alias: Option<&str>,
    ) -> Result<bool, DbMakerError>
    where
        F: FnMut(&[CustomDbRow]) -> bool,
    {
        let column = column.to_uppercase();
        let alias = alias.map_or_else(|| column.clone(), ToString::to_string);
        let mut last_id: Option<RowValues> = None;

        loop {
            let page = page_after_id(&self.query, count, last_id.take(), &column);
            let rows = run_select(self.conn, &page)?;
            let Some(last) = rows.last() else {
                break;
            };
            if !callback(&rows) {
                return Ok(false);
            }
            last_id = Some(lookup(last, &alias).cloned().ok_or_else(|| {
                DbMakerError::ParameterError(format!("chunk id field `{alias}` missing from rows"))
            })?);
            if u64::try_from(rows.len()).map_or(true, |n| n != count) {
                break;
            }
        }
        Ok(true)
    }
}

fn run_select(conn: &mut DbMakerConnection, query: &Query) -> Result<Vec<CustomDbRow>, DbMakerError> {
    let sql = conn.query_grammar().compile_select(query)?;
    conn.select(&sql, &query.bindings())
}

fn page_after_id(query: &Query, per_page: u64, last_id: Option<RowValues>, column: &str) -> Query {
    let mut page = query.clone();
    page.orders.retain(|order| order.column != column);
    if let Some(last_id) = last_id {
        page.wheres.push(Where::Basic {
            column: column.to_string(),
            operator: ">".into(),
            value: last_id,
            boolean: Boolean::And,
        });
    }
    page.orders.insert(
        0,
        Order {
            column: column.to_string(),
            direction: Direction::Asc,
        },
    );
    page.limit = Some(per_page);
    page.aggregate = None;
    page
}

/// Split rows into a shared, sorted column list and per-row values.
fn split_records(rows: &[Record]) -> Result<(Vec<String>, Vec<Vec<RowValues>>), DbMakerError> {
    let Some(first) = rows.first() else {
        return Ok((Vec::new(), Vec::new()));
    };
    let columns: Vec<String> = first.keys().cloned().collect();
    let mut values = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        if !row.keys().eq(columns.iter()) {
            return Err(DbMakerError::ParameterError(format!(
                "insert row {idx} has columns {:?}, expected {columns:?}",
                row.keys().collect::<Vec<_>>()
            )));
        }
        values.push(row.values().cloned().collect());
    }
    Ok((columns, values))
}

/// Last segment of `table.column` or `column as alias`.
fn strip_table_for_pluck(column: &str) -> &str {
    column
        .rsplit(|c: char| c == '.' || c == ' ')
        .next()
        .unwrap_or(column)
}

fn lookup<'r>(row: &'r CustomDbRow, field: &str) -> Option<&'r RowValues> {
    row.get(field).or_else(|| row.get_ignore_case(field))
}

fn truthy(value: &RowValues) -> bool {
    match value {
        RowValues::Bool(b) => *b,
        RowValues::Int(n) => *n != 0,
        RowValues::Float(f) => *f != 0.0,
        RowValues::Text(text) => !text.is_empty() && text != "0",
        RowValues::Null => false,
        RowValues::Timestamp(_) | RowValues::JSON(_) | RowValues::Blob(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pluck_keys_drop_table_and_alias() {
        assert_eq!(strip_table_for_pluck("users.name"), "name");
        assert_eq!(strip_table_for_pluck("name as n"), "n");
        assert_eq!(strip_table_for_pluck("name"), "name");
    }

    #[test]
    fn records_must_share_columns() {
        let a = crate::query::record([("a", 1), ("b", 2)]);
        let b = crate::query::record([("b", 3), ("a", 4)]);
        let (columns, values) = split_records(&[a.clone(), b]).unwrap();
        assert_eq!(columns, ["a", "b"]);
        assert_eq!(values[1], vec![RowValues::Int(4), RowValues::Int(3)]);

        let c = crate::query::record([("a", 1)]);
        assert!(matches!(
            split_records(&[a, c]),
            Err(DbMakerError::ParameterError(_))
        ));
    }

    #[test]
    fn page_after_id_orders_by_the_key_first() {
        let mut q = Query::new("users");
        q.orders.push(Order {
            column: "ID".into(),
            direction: Direction::Desc,
        });
        q.orders.push(Order {
            column: "name".into(),
            direction: Direction::Asc,
        });
        let page = page_after_id(&q, 50, Some(RowValues::Int(10)), "ID");
        assert_eq!(page.orders[0].column, "ID");
        assert_eq!(page.orders[0].direction, Direction::Asc);
        assert_eq!(page.orders.len(), 2);
        assert_eq!(page.limit, Some(50));
        assert_eq!(page.bindings(), vec![RowValues::Int(10)]);
    }

    #[test]
    fn truthiness_follows_loose_rules() {
        assert!(truthy(&RowValues::Int(1)));
        assert!(truthy(&RowValues::Text("1".into())));
        assert!(!truthy(&RowValues::Text("0".into())));
        assert!(!truthy(&RowValues::Int(0)));
        assert!(!truthy(&RowValues::Null));
    }
}
