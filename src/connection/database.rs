use std::fmt;

use tracing::{debug, warn};

use super::DbConnection;
use crate::config::DbMakerConfig;
use crate::error::DbMakerError;
use crate::query::{DbMakerProcessor, DbMakerQueryGrammar, QueryBuilder, QueryTranslator};
use crate::results::CustomDbRow;
use crate::schema::{DbMakerSchemaGrammar, SchemaBuilder};
use crate::types::{ConnectionKind, RowValues};

/// Framework-level DBMaker connection.
///
/// Wraps whichever [`DbConnection`] the connector selected and runs SQL with positional
/// bindings through it. Query and schema builders start here.
pub struct DbMakerConnection {
    conn: Box<dyn DbConnection>,
    table_prefix: String,
    index_prefix: String,
    query_grammar: DbMakerQueryGrammar,
    schema_grammar: DbMakerSchemaGrammar,
    processor: DbMakerProcessor,
}

impl DbMakerConnection {
    #[must_use]
    pub fn new(conn: Box<dyn DbConnection>) -> Self {
        Self {
            conn,
            table_prefix: String::new(),
            index_prefix: String::new(),
            query_grammar: DbMakerQueryGrammar,
            schema_grammar: DbMakerSchemaGrammar,
            processor: DbMakerProcessor,
        }
    }

    /// Wrap `conn` with the table prefix and index prefix of `config`.
    #[must_use]
    pub fn from_config(conn: Box<dyn DbConnection>, config: &DbMakerConfig) -> Self {
        Self::new(conn)
            .with_table_prefix(&config.prefix)
            .with_index_prefix(config.index_prefix())
    }

    #[must_use]
    pub fn with_table_prefix(mut self, prefix: &str) -> Self {
        self.table_prefix = prefix.to_string();
        self
    }

    #[must_use]
    pub fn with_index_prefix(mut self, prefix: &str) -> Self {
        self.index_prefix = prefix.to_string();
        self
    }

    #[must_use]
    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    #[must_use]
    pub fn index_prefix(&self) -> &str {
        &self.index_prefix
    }

    #[must_use]
    pub fn kind(&self) -> ConnectionKind {
        self.conn.kind()
    }

    #[must_use]
    pub fn query_grammar(&self) -> &DbMakerQueryGrammar {
        &self.query_grammar
    }

    #[must_use]
    pub fn schema_grammar(&self) -> &DbMakerSchemaGrammar {
        &self.schema_grammar
    }

    #[must_use]
    pub fn processor(&self) -> DbMakerProcessor {
        self.processor
    }

    /// The underlying standard connection.
    pub fn raw(&mut self) -> &mut dyn DbConnection {
        self.conn.as_mut()
    }

    /// Builder over `table`, with the table prefix applied.
    pub fn table(&mut self, table: &str) -> QueryBuilder<'_> {
        let table = format!("{}{table}", self.table_prefix);
        QueryBuilder::new(self, table)
    }

    /// Builder over a system catalog table; never prefixed.
    pub fn catalog_table(&mut self, table: &str) -> QueryBuilder<'_> {
        QueryBuilder::new(self, table.to_string())
    }

    pub fn schema(&mut self) -> SchemaBuilder<'_> {
        SchemaBuilder::new(self)
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if prepare, execute or fetch fails.
    pub fn select(
        &mut self,
        sql: &str,
        bindings: &[RowValues],
    ) -> Result<Vec<CustomDbRow>, DbMakerError> {
        debug!(sql, bindings = bindings.len(), "select");
        let mut stmt = self.conn.prepare(sql)?;
        stmt.bind_positional(bindings);
        stmt.execute()?;
        stmt.fetch_all()
    }

    /// First row of [`DbMakerConnection::select`].
    ///
    /// # Errors
    /// Same as [`DbMakerConnection::select`].
    pub fn select_one(
        &mut self,
        sql: &str,
        bindings: &[RowValues],
    ) -> Result<Option<CustomDbRow>, DbMakerError> {
        Ok(self.select(sql, bindings)?.into_iter().next())
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the statement fails.
    pub fn insert(&mut self, sql: &str, bindings: &[RowValues]) -> Result<(), DbMakerError> {
        self.statement(sql, bindings)
    }

    /// Prepare `sql` once and execute it for each row of values. Nothing runs for an empty
    /// slice.
    ///
    /// # Errors
    /// Returns the first `DbMakerError::DriverExecutionError`; earlier rows stay inserted.
    pub fn insert_rows(&mut self, sql: &str, rows: &[Vec<RowValues>]) -> Result<(), DbMakerError> {
        if rows.is_empty() {
            return Ok(());
        }
        debug!(sql, rows = rows.len(), "insert");
        let mut stmt = self.conn.prepare(sql)?;
        for values in rows {
            stmt.bind_positional(values);
            stmt.execute()?;
        }
        Ok(())
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the statement fails.
    pub fn update(&mut self, sql: &str, bindings: &[RowValues]) -> Result<i64, DbMakerError> {
        self.affecting_statement(sql, bindings)
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the statement fails.
    pub fn delete(&mut self, sql: &str, bindings: &[RowValues]) -> Result<i64, DbMakerError> {
        self.affecting_statement(sql, bindings)
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the statement fails.
    pub fn statement(&mut self, sql: &str, bindings: &[RowValues]) -> Result<(), DbMakerError> {
        debug!(sql, bindings = bindings.len(), "statement");
        let mut stmt = self.conn.prepare(sql)?;
        stmt.bind_positional(bindings);
        stmt.execute()
    }

    /// Run `sql` and return the driver's affected-row count.
    ///
    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the statement fails.
    pub fn affecting_statement(
        &mut self,
        sql: &str,
        bindings: &[RowValues],
    ) -> Result<i64, DbMakerError> {
        debug!(sql, bindings = bindings.len(), "affecting statement");
        let mut stmt = self.conn.prepare(sql)?;
        stmt.bind_positional(bindings);
        stmt.execute()?;
        stmt.row_count()
    }

    /// Run raw SQL without preparing bindings.
    ///
    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the statement fails.
    pub fn unprepared(&mut self, sql: &str) -> Result<(), DbMakerError> {
        debug!(sql, "unprepared");
        self.conn.exec(sql)
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the driver call fails.
    pub fn begin_transaction(&mut self) -> Result<(), DbMakerError> {
        self.conn.begin_transaction()
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the driver call fails.
    pub fn commit(&mut self) -> Result<(), DbMakerError> {
        self.conn.commit()
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the driver call fails.
    pub fn roll_back(&mut self) -> Result<(), DbMakerError> {
        self.conn.roll_back()
    }

    /// Run `work` inside a transaction: commit on `Ok`, roll back on `Err`.
    ///
    /// The error from `work` is returned even if the rollback fails too; the rollback failure
    /// is logged.
    ///
    /// # Errors
    /// Returns the error from `work`, or the begin/commit failure.
    pub fn transaction<T, F>(&mut self, work: F) -> Result<T, DbMakerError>
    where
        F: FnOnce(&mut Self) -> Result<T, DbMakerError>,
    {
        self.begin_transaction()?;
        match work(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.roll_back() {
                    warn!(error = %rollback_err, "rollback after failed transaction body failed");
                }
                Err(err)
            }
        }
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the statement fails.
    pub fn savepoint(&mut self, name: &str) -> Result<(), DbMakerError> {
        let sql = self.query_grammar.compile_savepoint(name);
        self.statement(&sql, &[])
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the statement fails.
    pub fn rollback_to_savepoint(&mut self, name: &str) -> Result<(), DbMakerError> {
        let sql = self.query_grammar.compile_savepoint_rollback(name);
        self.statement(&sql, &[])
    }
}

impl fmt::Debug for DbMakerConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbMakerConnection")
            .field("kind", &self.conn.kind())
            .field("table_prefix", &self.table_prefix)
            .field("index_prefix", &self.index_prefix)
            .finish_non_exhaustive()
    }
}
