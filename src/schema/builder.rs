use tracing::debug;

use super::blueprint::Blueprint;
use super::grammar::SchemaTranslator;
use crate::connection::DbMakerConnection;
use crate::error::DbMakerError;
use crate::results::CustomDbRow;
use crate::types::RowValues;

/// Catalog introspection and blueprint execution against one connection.
///
/// Obtained from [`DbMakerConnection::schema`].
pub struct SchemaBuilder<'c> {
    conn: &'c mut DbMakerConnection,
}

impl<'c> SchemaBuilder<'c> {
    pub(crate) fn new(conn: &'c mut DbMakerConnection) -> Self {
        Self { conn }
    }

    fn blueprint(&self, table: &str) -> Blueprint {
        Blueprint::new(table).with_prefixes(self.conn.table_prefix(), self.conn.index_prefix())
    }

    fn prefixed(&self, table: &str) -> String {
        format!("{}{table}", self.conn.table_prefix())
    }

    fn build(&mut self, blueprint: &Blueprint) -> Result<(), DbMakerError> {
        let statements = blueprint.to_sql(self.conn.schema_grammar())?;
        for sql in statements {
            self.conn.statement(&sql, &[])?;
        }
        Ok(())
    }

    /// True when `SYSTABLE` lists the prefixed table.
    ///
    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the catalog query fails.
    pub fn has_table(&mut self, table: &str) -> Result<bool, DbMakerError> {
        let sql = self.conn.schema_grammar().compile_table_exists();
        let bindings = [RowValues::Text(self.prefixed(table))];
        Ok(!self.conn.select(&sql, &bindings)?.is_empty())
    }

    /// True when exactly one `SYSCOLUMN` row matches. `table` is used as given.
    ///
    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the catalog query fails.
    pub fn has_column(&mut self, table: &str, column: &str) -> Result<bool, DbMakerError> {
        let sql = self.conn.schema_grammar().compile_has_column();
        let bindings = [RowValues::from(column), RowValues::from(table)];
        Ok(self.conn.select(&sql, &bindings)?.len() == 1)
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the catalog query fails.
    pub fn get_column_listing(&mut self, table: &str) -> Result<Vec<String>, DbMakerError> {
        let sql = self.conn.schema_grammar().compile_column_listing();
        let bindings = [RowValues::Text(self.prefixed(table))];
        let rows = self.conn.select(&sql, &bindings)?;
        first_texts(&rows, "column listing")
    }

    /// DBMaker type name of a column; `jsoncols` is reported as `dynamic`.
    ///
    /// # Errors
    /// Returns `DbMakerError::CatalogIntrospection` when the catalog has no type for the
    /// column, or `DbMakerError::DriverExecutionError` if the query fails.
    pub fn get_column_type(&mut self, table: &str, column: &str) -> Result<String, DbMakerError> {
        let sql = self.conn.schema_grammar().compile_column_type();
        let bindings = [RowValues::from(table), RowValues::from(column)];
        let type_name = self
            .conn
            .select_one(&sql, &bindings)?
            .and_then(|row| {
                row.get_ignore_case("TYPE_NAME")
                    .and_then(RowValues::as_text)
                    .map(|t| t.trim().to_string())
            })
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                DbMakerError::CatalogIntrospection(format!(
                    "DBMaker can't get column type of {table}.{column}"
                ))
            })?;
        if type_name.eq_ignore_ascii_case("jsoncols") {
            return Ok("dynamic".to_string());
        }
        Ok(type_name)
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the catalog query fails, or
    /// `DbMakerError::CatalogIntrospection` if a row has no table name.
    pub fn get_all_tables(&mut self) -> Result<Vec<String>, DbMakerError> {
        let sql = self.conn.schema_grammar().compile_get_all_tables();
        let rows = self.conn.select(&sql, &[])?;
        first_texts(&rows, "table listing")
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the catalog query fails, or
    /// `DbMakerError::CatalogIntrospection` if a row has no view name.
    pub fn get_all_views(&mut self) -> Result<Vec<String>, DbMakerError> {
        let sql = self.conn.schema_grammar().compile_get_all_views();
        let rows = self.conn.select(&sql, &[])?;
        first_texts(&rows, "view listing")
    }

    /// Drop every foreign key listed in `SYSFOREIGNKEY`, then every user table.
    ///
    /// # Errors
    /// Returns `DbMakerError::CatalogIntrospection` before dropping anything if a foreign-key row
    /// lacks its table or key name, otherwise the first `DbMakerError::DriverExecutionError`.
    pub fn drop_all_tables(&mut self) -> Result<(), DbMakerError> {
        let grammar = *self.conn.schema_grammar();
        let keys = self.conn.select(&grammar.compile_get_foreign_keys(), &[])?;
        let drops = keys
            .iter()
            .map(|key| {
                let table = catalog_text(key, "FK_TBL_NAME")?;
                let name = catalog_text(key, "FK_NAME")?;
                Ok(format!(
                    "ALTER TABLE {} DROP FOREIGN KEY {}",
                    grammar.wrap(table),
                    grammar.wrap(name)
                ))
            })
            .collect::<Result<Vec<_>, DbMakerError>>()?;
        for sql in drops {
            self.conn.statement(&sql, &[])?;
        }

        let tables = self.get_all_tables()?;
        if tables.is_empty() {
            debug!("no tables to drop");
            return Ok(());
        }
        for table in tables {
            self.conn
                .statement(&grammar.compile_drop_all_tables(&table), &[])?;
        }
        Ok(())
    }

    /// # Errors
    /// Returns the first `DbMakerError::DriverExecutionError`.
    pub fn drop_all_views(&mut self) -> Result<(), DbMakerError> {
        let grammar = *self.conn.schema_grammar();
        for view in self.get_all_views()? {
            self.conn.statement(&grammar.compile_drop_all_views(&view), &[])?;
        }
        Ok(())
    }

    /// Create `table` with the columns declared by `define`.
    ///
    /// # Errors
    /// Returns `DbMakerError::UnsupportedOperation` for unmappable column types, or the first
    /// `DbMakerError::DriverExecutionError`.
    pub fn create<F>(&mut self, table: &str, define: F) -> Result<(), DbMakerError>
    where
        F: FnOnce(&mut Blueprint),
    {
        let mut blueprint = self.blueprint(table);
        blueprint.create();
        define(&mut blueprint);
        self.build(&blueprint)
    }

    /// Alter an existing `table`.
    ///
    /// # Errors
    /// Same as [`SchemaBuilder::create`].
    pub fn table<F>(&mut self, table: &str, define: F) -> Result<(), DbMakerError>
    where
        F: FnOnce(&mut Blueprint),
    {
        let mut blueprint = self.blueprint(table);
        define(&mut blueprint);
        self.build(&blueprint)
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the statement fails.
    pub fn drop(&mut self, table: &str) -> Result<(), DbMakerError> {
        let mut blueprint = self.blueprint(table);
        blueprint.drop();
        self.build(&blueprint)
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the statement fails.
    pub fn drop_if_exists(&mut self, table: &str) -> Result<(), DbMakerError> {
        let mut blueprint = self.blueprint(table);
        blueprint.drop_if_exists();
        self.build(&blueprint)
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the statement fails.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), DbMakerError> {
        let mut blueprint = self.blueprint(from);
        blueprint.rename(to);
        self.build(&blueprint)
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the statement fails.
    pub fn enable_foreign_key_constraints(&mut self) -> Result<(), DbMakerError> {
        let sql = self.conn.schema_grammar().compile_enable_foreign_key_constraints();
        self.conn.statement(&sql, &[])
    }

    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the statement fails.
    pub fn disable_foreign_key_constraints(&mut self) -> Result<(), DbMakerError> {
        let sql = self.conn.schema_grammar().compile_disable_foreign_key_constraints();
        self.conn.statement(&sql, &[])
    }
}

fn catalog_text<'r>(row: &'r CustomDbRow, column: &str) -> Result<&'r str, DbMakerError> {
    row.get_ignore_case(column)
        .and_then(RowValues::as_text)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| {
            DbMakerError::CatalogIntrospection(format!("catalog row without {column}: {row:?}"))
        })
}

fn first_texts(rows: &[CustomDbRow], listing: &str) -> Result<Vec<String>, DbMakerError> {
    rows.iter()
        .map(|row| {
            row.first_value()
                .and_then(RowValues::as_text)
                .map(|name| name.trim().to_string())
                .ok_or_else(|| {
                    DbMakerError::CatalogIntrospection(format!(
                        "{listing} row without a name: {row:?}"
                    ))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbMakerConfig;
    use crate::test_utils::{MockDriver, mock_database};

    fn table_rows(names: &[&str]) -> Vec<CustomDbRow> {
        names
            .iter()
            .map(|n| CustomDbRow::from_pairs([("TABLE_NAME", RowValues::from(*n))]))
            .collect()
    }

    #[test]
    fn has_table_binds_prefixed_name() {
        let driver = MockDriver::new();
        driver.on_query("FROM SYSTABLE", table_rows(&["app_users"]));
        let cfg = DbMakerConfig::builder("TESTDB").prefix("app_").finish();
        let mut db = mock_database(&driver, &cfg).unwrap();
        assert!(db.schema().has_table("users").unwrap());
        assert_eq!(
            driver.executed()[0].params,
            vec![RowValues::Text("app_users".into())]
        );
    }

    #[test]
    fn has_column_requires_exactly_one_row() {
        let driver = MockDriver::new();
        let mut db = mock_database(&driver, &DbMakerConfig::new("TESTDB")).unwrap();
        assert!(!db.schema().has_column("users", "email").unwrap());

        driver.on_query(
            "FROM SYSCOLUMN",
            vec![CustomDbRow::from_pairs([("COLUMN_NAME", RowValues::from("email"))])],
        );
        assert!(db.schema().has_column("users", "email").unwrap());
        let last = driver.executed().pop().unwrap();
        assert_eq!(
            last.params,
            vec![RowValues::from("email"), RowValues::from("users")]
        );
    }

    #[test]
    fn column_type_maps_jsoncols_and_rejects_missing() {
        let driver = MockDriver::new();
        let mut db = mock_database(&driver, &DbMakerConfig::new("TESTDB")).unwrap();
        assert!(matches!(
            db.schema().get_column_type("t", "c"),
            Err(DbMakerError::CatalogIntrospection(_))
        ));

        driver.on_query(
            "SELECT TYPE_NAME",
            vec![CustomDbRow::from_pairs([("TYPE_NAME", RowValues::from("JSONCOLS "))])],
        );
        assert_eq!(db.schema().get_column_type("t", "c").unwrap(), "dynamic");

        driver.on_query(
            "SELECT TYPE_NAME",
            vec![CustomDbRow::from_pairs([("TYPE_NAME", RowValues::from(""))])],
        );
        assert!(db.schema().get_column_type("t", "c").is_err());
    }

    #[test]
    fn drop_all_tables_drops_foreign_keys_first() {
        let driver = MockDriver::new();
        driver.on_query(
            "SYSFOREIGNKEY",
            vec![CustomDbRow::from_pairs([
                ("FK_TBL_NAME", RowValues::from("posts")),
                ("FK_NAME", RowValues::from("posts_user_id_foreign")),
            ])],
        );
        driver.on_query("TABLE_TYPE = 'TABLE'", table_rows(&["users", "posts"]));
        let mut db = mock_database(&driver, &DbMakerConfig::new("TESTDB")).unwrap();
        db.schema().drop_all_tables().unwrap();
        assert_eq!(
            driver.executed_sql(),
            [
                "SELECT FK_TBL_NAME, FK_NAME FROM SYSFOREIGNKEY",
                "ALTER TABLE \"posts\" DROP FOREIGN KEY \"posts_user_id_foreign\"",
                "SELECT TABLE_NAME FROM SYSTABLE WHERE TABLE_TYPE = 'TABLE'",
                "DROP TABLE \"users\"",
                "DROP TABLE \"posts\"",
            ]
        );
    }

    #[test]
    fn drop_all_tables_stops_on_an_unreadable_foreign_key() {
        let driver = MockDriver::new();
        driver.on_query(
            "SYSFOREIGNKEY",
            vec![
                CustomDbRow::from_pairs([
                    ("FK_TBL_NAME", RowValues::from("posts")),
                    ("FK_NAME", RowValues::from("posts_user_id_foreign")),
                ]),
                CustomDbRow::from_pairs([
                    ("FK_TBL_NAME", RowValues::from("comments")),
                    ("FK_NAME", RowValues::Null),
                ]),
            ],
        );
        driver.on_query("TABLE_TYPE = 'TABLE'", table_rows(&["posts", "comments"]));
        let mut db = mock_database(&driver, &DbMakerConfig::new("TESTDB")).unwrap();

        let err = db.schema().drop_all_tables().unwrap_err();
        assert!(
            matches!(err, DbMakerError::CatalogIntrospection(ref msg) if msg.contains("FK_NAME")),
            "{err:?}"
        );
        assert_eq!(
            driver.executed_sql(),
            ["SELECT FK_TBL_NAME, FK_NAME FROM SYSFOREIGNKEY"]
        );
    }

    #[test]
    fn null_table_name_in_listing_is_an_error() {
        let driver = MockDriver::new();
        driver.on_query(
            "TABLE_TYPE = 'TABLE'",
            vec![
                CustomDbRow::from_pairs([("TABLE_NAME", RowValues::from("users"))]),
                CustomDbRow::from_pairs([("TABLE_NAME", RowValues::Null)]),
            ],
        );
        let mut db = mock_database(&driver, &DbMakerConfig::new("TESTDB")).unwrap();
        assert!(matches!(
            db.schema().get_all_tables(),
            Err(DbMakerError::CatalogIntrospection(_))
        ));
        assert!(matches!(
            db.schema().drop_all_tables(),
            Err(DbMakerError::CatalogIntrospection(_))
        ));
        assert!(!driver.executed_sql().iter().any(|sql| sql.starts_with("DROP TABLE")));
    }

    #[test]
    fn drop_all_views_with_no_views_runs_only_the_listing() {
        let driver = MockDriver::new();
        let mut db = mock_database(&driver, &DbMakerConfig::new("TESTDB")).unwrap();
        db.schema().drop_all_views().unwrap();
        assert_eq!(
            driver.executed_sql(),
            ["SELECT TABLE_NAME FROM SYSTABLE WHERE TABLE_TYPE = 'VIEW'"]
        );
    }

    #[test]
    fn create_uses_connection_prefixes() {
        let driver = MockDriver::new();
        let cfg = DbMakerConfig::builder("TESTDB")
            .prefix("app_")
            .prefix_indexes(true)
            .finish();
        let mut db = mock_database(&driver, &cfg).unwrap();
        db.schema()
            .create("users", |t| {
                t.increments("id");
                t.string("email", 100).unique();
            })
            .unwrap();
        assert_eq!(
            driver.executed_sql(),
            [
                "CREATE TABLE \"app_users\" (\"id\" serial primary key, \"email\" varchar(100) not null)",
                "CREATE UNIQUE INDEX \"app_users_email_unique\" ON \"app_users\" (\"email\")",
            ]
        );
    }

    #[test]
    fn fk_checks_toggle() {
        let driver = MockDriver::new();
        let mut db = mock_database(&driver, &DbMakerConfig::new("TESTDB")).unwrap();
        db.schema().disable_foreign_key_constraints().unwrap();
        db.schema().enable_foreign_key_constraints().unwrap();
        assert_eq!(
            driver.executed_sql(),
            [
                "CALL SETSYSTEMOPTION('FKCHK','0');",
                "CALL SETSYSTEMOPTION('FKCHK','1');"
            ]
        );
    }
}
