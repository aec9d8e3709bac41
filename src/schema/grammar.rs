use super::blueprint::{Blueprint, Command, ForeignKeyDefinition};
use super::column::{ColumnDefinition, ColumnType, DefaultValue};
use crate::error::DbMakerError;
use crate::query::is_numeric;

/// Turns blueprints into DDL and provides the catalog queries behind schema introspection.
///
/// Identifier quoting, column assembly, command dispatch and foreign keys come with portable
/// defaults; everything engine-specific is required.
pub trait SchemaTranslator: Send + Sync {
    fn wrap(&self, value: &str) -> String {
        value
            .split('.')
            .map(|segment| {
                if segment == "*" {
                    segment.to_string()
                } else {
                    format!("\"{}\"", segment.replace('"', "\"\""))
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    fn wrap_table(&self, blueprint: &Blueprint) -> String {
        self.wrap(&blueprint.qualified_table())
    }

    fn columnize(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|column| self.wrap(column))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// # Errors
    /// Returns `DbMakerError::UnsupportedOperation` for types the engine cannot store.
    fn type_sql(&self, column: &ColumnDefinition) -> Result<String, DbMakerError>;

    /// Modifier suffix (`not null`, `DEFAULT ...`, ...) with a leading space per modifier.
    fn modifiers(&self, column: &ColumnDefinition) -> String;

    /// # Errors
    /// Same as [`SchemaTranslator::type_sql`].
    fn get_column(&self, column: &ColumnDefinition) -> Result<String, DbMakerError> {
        Ok(format!(
            "{} {}{}",
            self.wrap(&column.name),
            self.type_sql(column)?,
            self.modifiers(column)
        ))
    }

    /// # Errors
    /// Same as [`SchemaTranslator::type_sql`].
    fn get_columns(&self, columns: &[&ColumnDefinition]) -> Result<Vec<String>, DbMakerError> {
        columns.iter().map(|column| self.get_column(column)).collect()
    }

    /// # Errors
    /// Same as [`SchemaTranslator::type_sql`].
    fn compile_command(
        &self,
        blueprint: &Blueprint,
        command: &Command,
    ) -> Result<Vec<String>, DbMakerError> {
        Ok(match command {
            Command::Create => vec![self.compile_create(blueprint)?],
            Command::Drop => vec![self.compile_drop(blueprint)],
            Command::DropIfExists => vec![self.compile_drop_if_exists(blueprint)],
            Command::Rename { to } => vec![self.compile_rename(blueprint, to)],
            Command::DropColumn { columns } => self.compile_drop_column(blueprint, columns),
            Command::RenameColumn { from, to } => {
                vec![self.compile_rename_column(blueprint, from, to)]
            }
            Command::Primary { columns, .. } => vec![self.compile_primary(blueprint, columns)],
            Command::Unique { index, columns } => {
                vec![self.compile_unique(blueprint, index, columns)]
            }
            Command::Index { index, columns } => vec![self.compile_index(blueprint, index, columns)],
            Command::RenameIndex { from, to } => vec![self.compile_rename_index(blueprint, from, to)],
            Command::DropPrimary { .. } => vec![self.compile_drop_primary(blueprint)],
            Command::DropUnique { index } => vec![self.compile_drop_unique(blueprint, index)],
            Command::DropIndex { index } => vec![self.compile_drop_index(blueprint, index)],
            Command::Foreign(fk) => vec![self.compile_foreign(blueprint, fk)],
            Command::DropForeign { index } => vec![self.compile_drop_foreign(blueprint, index)],
        })
    }

    fn compile_foreign(&self, blueprint: &Blueprint, fk: &ForeignKeyDefinition) -> String {
        let mut sql = format!(
            "alter table {} add constraint {} foreign key ({}) references {} ({})",
            self.wrap_table(blueprint),
            self.wrap(&fk.index),
            self.columnize(&fk.columns),
            self.wrap(&format!("{}{}", blueprint.table_prefix(), fk.on)),
            self.columnize(&fk.references)
        );
        if let Some(action) = &fk.on_delete {
            sql.push_str(&format!(" on delete {action}"));
        }
        if let Some(action) = &fk.on_update {
            sql.push_str(&format!(" on update {action}"));
        }
        sql
    }

    /// # Errors
    /// Same as [`SchemaTranslator::type_sql`].
    fn compile_create(&self, blueprint: &Blueprint) -> Result<String, DbMakerError>;

    /// # Errors
    /// Same as [`SchemaTranslator::type_sql`].
    fn compile_add(
        &self,
        blueprint: &Blueprint,
        columns: &[&ColumnDefinition],
    ) -> Result<Vec<String>, DbMakerError>;

    /// # Errors
    /// Same as [`SchemaTranslator::type_sql`].
    fn compile_change(
        &self,
        blueprint: &Blueprint,
        columns: &[&ColumnDefinition],
    ) -> Result<Vec<String>, DbMakerError>;

    fn compile_drop(&self, blueprint: &Blueprint) -> String;
    fn compile_drop_if_exists(&self, blueprint: &Blueprint) -> String;
    fn compile_rename(&self, blueprint: &Blueprint, to: &str) -> String;
    fn compile_drop_column(&self, blueprint: &Blueprint, columns: &[String]) -> Vec<String>;
    fn compile_rename_column(&self, blueprint: &Blueprint, from: &str, to: &str) -> String;
    fn compile_primary(&self, blueprint: &Blueprint, columns: &[String]) -> String;
    fn compile_unique(&self, blueprint: &Blueprint, index: &str, columns: &[String]) -> String;
    fn compile_index(&self, blueprint: &Blueprint, index: &str, columns: &[String]) -> String;
    fn compile_rename_index(&self, blueprint: &Blueprint, from: &str, to: &str) -> String;
    fn compile_drop_primary(&self, blueprint: &Blueprint) -> String;
    fn compile_drop_unique(&self, blueprint: &Blueprint, index: &str) -> String;
    fn compile_drop_index(&self, blueprint: &Blueprint, index: &str) -> String;
    fn compile_drop_foreign(&self, blueprint: &Blueprint, index: &str) -> String;

    fn compile_enable_foreign_key_constraints(&self) -> String;
    fn compile_disable_foreign_key_constraints(&self) -> String;

    /// Rows exist when the table does; binds the table name.
    fn compile_table_exists(&self) -> String;
    /// Binds the table name.
    fn compile_column_listing(&self) -> String;
    /// Binds the column name, then the table name.
    fn compile_has_column(&self) -> String;
    /// Binds the table name, then the column name.
    fn compile_column_type(&self) -> String;
    fn compile_get_all_tables(&self) -> String;
    fn compile_get_all_views(&self) -> String;
    fn compile_get_foreign_keys(&self) -> String;
    fn compile_drop_all_tables(&self, table: &str) -> String;
    fn compile_drop_all_views(&self, view: &str) -> String;
}

/// DBMaker DDL and catalog dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct DbMakerSchemaGrammar;

impl DbMakerSchemaGrammar {
    fn modify_nullable(column: &ColumnDefinition) -> &'static str {
        match column.kind {
            ColumnType::Serial | ColumnType::BigSerial | ColumnType::Json | ColumnType::Jsonb => "",
            _ if column.nullable => "",
            _ => " not null",
        }
    }

    fn modify_default(column: &ColumnDefinition) -> Option<String> {
        column
            .default
            .as_ref()
            .map(|value| format!(" DEFAULT {}", default_value(value)))
    }

    fn modify_after(&self, column: &ColumnDefinition) -> Option<String> {
        column
            .after
            .as_ref()
            .map(|after| format!(" after {}", self.wrap(after)))
    }

    fn modify_before(&self, column: &ColumnDefinition) -> Option<String> {
        column
            .before
            .as_ref()
            .map(|before| format!(" before {}", self.wrap(before)))
    }

    fn modify_increment(column: &ColumnDefinition) -> Option<&'static str> {
        (column.kind.is_serial() && column.auto_increment).then_some(" primary key")
    }
}

fn default_value(value: &DefaultValue) -> String {
    match value {
        DefaultValue::Expression(expression) => expression.clone(),
        DefaultValue::Bool(b) => i64::from(*b).to_string(),
        DefaultValue::Int(n) => n.to_string(),
        DefaultValue::Float(f) => f.to_string(),
        DefaultValue::Text(text) if is_numeric(text) => text.clone(),
        DefaultValue::Text(text) => quote_string(text),
    }
}

fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn timestamp_type(column: &ColumnDefinition) -> String {
    if column.use_current {
        "TIMESTAMP default CURRENT_TIMESTAMP".to_string()
    } else {
        "TIMESTAMP".to_string()
    }
}

impl SchemaTranslator for DbMakerSchemaGrammar {
    fn type_sql(&self, column: &ColumnDefinition) -> Result<String, DbMakerError> {
        Ok(match &column.kind {
            ColumnType::String(length) => format!("varchar({length})"),
            ColumnType::Char(length) => format!("char({length})"),
            ColumnType::Text | ColumnType::MediumText | ColumnType::LongText => {
                "long varchar".into()
            }
            ColumnType::Integer => "int".into(),
            ColumnType::BigInteger => "bigint".into(),
            ColumnType::MediumInteger => "integer".into(),
            ColumnType::SmallInteger | ColumnType::TinyInteger | ColumnType::Boolean => {
                "smallint".into()
            }
            ColumnType::Serial => "serial".into(),
            ColumnType::BigSerial => "bigserial".into(),
            ColumnType::Binary => "blob".into(),
            ColumnType::Date => "date".into(),
            ColumnType::DateTime
            | ColumnType::DateTimeTz
            | ColumnType::Timestamp
            | ColumnType::TimestampTz => timestamp_type(column),
            ColumnType::Time | ColumnType::TimeTz => "time".into(),
            ColumnType::Decimal { total, places } => format!("decimal({total},{places})"),
            ColumnType::Double => "Double".into(),
            ColumnType::Float { total: Some(total) } if *total > 0 => format!("Float({total})"),
            ColumnType::Float { .. } => "Float".into(),
            ColumnType::Enum(allowed) => format!(
                "varchar(255) check (\"{}\" in ({}))",
                column.name,
                allowed
                    .iter()
                    .map(|value| quote_string(value))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            ColumnType::Json | ColumnType::Jsonb => "JSONCOLS".into(),
            ColumnType::Uuid => "char(36)".into(),
            ColumnType::IpAddress => "varchar(45)".into(),
            ColumnType::MacAddress => "varchar(17)".into(),
            ColumnType::Geometry | ColumnType::Point => "varchar(128)".into(),
            ColumnType::LineString
            | ColumnType::Polygon
            | ColumnType::GeometryCollection
            | ColumnType::MultiPoint
            | ColumnType::MultiLineString
            | ColumnType::MultiPolygon => "LONG VARCHAR".into(),
            ColumnType::Computed(_) => {
                return Err(DbMakerError::UnsupportedOperation(
                    "This database driver requires a type, see the virtualAs / storedAs modifiers."
                        .into(),
                ));
            }
        })
    }

    fn modifiers(&self, column: &ColumnDefinition) -> String {
        let mut sql = String::from(Self::modify_nullable(column));
        for modifier in [
            Self::modify_default(column),
            self.modify_after(column),
            self.modify_before(column),
            Self::modify_increment(column).map(ToString::to_string),
        ]
        .into_iter()
        .flatten()
        {
            sql.push_str(&modifier);
        }
        sql
    }

    fn compile_create(&self, blueprint: &Blueprint) -> Result<String, DbMakerError> {
        let table_type = if blueprint.is_temporary() {
            "CREATE TEMPORARY"
        } else {
            "CREATE"
        };
        let columns: Vec<&ColumnDefinition> = blueprint.added_columns().collect();
        Ok(format!(
            "{table_type} TABLE {} ({})",
            self.wrap_table(blueprint),
            self.get_columns(&columns)?.join(", ")
        ))
    }

    fn compile_add(
        &self,
        blueprint: &Blueprint,
        columns: &[&ColumnDefinition],
    ) -> Result<Vec<String>, DbMakerError> {
        let table = self.wrap_table(blueprint);
        Ok(self
            .get_columns(columns)?
            .into_iter()
            .map(|column| format!("ALTER TABLE {table} add column {column}"))
            .collect())
    }

    fn compile_change(
        &self,
        blueprint: &Blueprint,
        columns: &[&ColumnDefinition],
    ) -> Result<Vec<String>, DbMakerError> {
        let table = self.wrap_table(blueprint);
        columns
            .iter()
            .map(|column| {
                let name = self.wrap(&column.name);
                Ok(format!(
                    "ALTER TABLE {table} MODIFY ({name} TO {name} {}{})",
                    self.type_sql(column)?,
                    self.modifiers(column)
                ))
            })
            .collect()
    }

    fn compile_drop(&self, blueprint: &Blueprint) -> String {
        format!("DROP TABLE {}", self.wrap_table(blueprint))
    }

    fn compile_drop_if_exists(&self, blueprint: &Blueprint) -> String {
        format!("DROP TABLE IF EXISTS {}", self.wrap_table(blueprint))
    }

    fn compile_rename(&self, blueprint: &Blueprint, to: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {}",
            self.wrap_table(blueprint),
            self.wrap(&format!("{}{to}", blueprint.table_prefix()))
        )
    }

    fn compile_drop_column(&self, blueprint: &Blueprint, columns: &[String]) -> Vec<String> {
        let table = self.wrap_table(blueprint);
        columns
            .iter()
            .map(|column| format!("ALTER TABLE {table} drop {}", self.wrap(column)))
            .collect()
    }

    fn compile_rename_column(&self, blueprint: &Blueprint, from: &str, to: &str) -> String {
        format!(
            "ALTER TABLE {} MODIFY ({} NAME TO {})",
            self.wrap_table(blueprint),
            self.wrap(from),
            self.wrap(to)
        )
    }

    fn compile_primary(&self, blueprint: &Blueprint, columns: &[String]) -> String {
        format!(
            "ALTER TABLE {} ADD primary key ({})",
            self.wrap_table(blueprint),
            self.columnize(columns)
        )
    }

    fn compile_unique(&self, blueprint: &Blueprint, index: &str, columns: &[String]) -> String {
        format!(
            "CREATE UNIQUE INDEX {} ON {} ({})",
            self.wrap(index),
            self.wrap_table(blueprint),
            self.columnize(columns)
        )
    }

    fn compile_index(&self, blueprint: &Blueprint, index: &str, columns: &[String]) -> String {
        format!(
            "CREATE INDEX {} ON {} ({})",
            self.wrap(index),
            self.wrap_table(blueprint),
            self.columnize(columns)
        )
    }

    fn compile_rename_index(&self, blueprint: &Blueprint, from: &str, to: &str) -> String {
        format!(
            "ALTER INDEX {} ON {} RENAME TO {}",
            self.wrap(from),
            self.wrap_table(blueprint),
            self.wrap(to)
        )
    }

    fn compile_drop_primary(&self, blueprint: &Blueprint) -> String {
        format!("ALTER TABLE {} DROP PRIMARY KEY", self.wrap_table(blueprint))
    }

    fn compile_drop_unique(&self, blueprint: &Blueprint, index: &str) -> String {
        format!(
            "DROP INDEX {} FROM {}",
            self.wrap(index),
            self.wrap_table(blueprint)
        )
    }

    fn compile_drop_index(&self, blueprint: &Blueprint, index: &str) -> String {
        format!(
            "DROP INDEX {} FROM {}",
            self.wrap(index),
            self.wrap_table(blueprint)
        )
    }

    fn compile_drop_foreign(&self, blueprint: &Blueprint, index: &str) -> String {
        format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            self.wrap_table(blueprint),
            self.wrap(index)
        )
    }

    fn compile_enable_foreign_key_constraints(&self) -> String {
        "CALL SETSYSTEMOPTION('FKCHK','1');".into()
    }

    fn compile_disable_foreign_key_constraints(&self) -> String {
        "CALL SETSYSTEMOPTION('FKCHK','0');".into()
    }

    fn compile_table_exists(&self) -> String {
        "SELECT * FROM SYSTABLE WHERE TABLE_NAME = ?".into()
    }

    fn compile_column_listing(&self) -> String {
        "SELECT COLUMN_NAME FROM SYSCOLUMN WHERE TABLE_NAME = ?".into()
    }

    fn compile_has_column(&self) -> String {
        "SELECT * FROM SYSCOLUMN WHERE COLUMN_NAME = ? AND TABLE_NAME = ?".into()
    }

    fn compile_column_type(&self) -> String {
        "SELECT TYPE_NAME FROM SYSCOLUMN WHERE TABLE_NAME = ? AND COLUMN_NAME = ?".into()
    }

    fn compile_get_all_tables(&self) -> String {
        "SELECT TABLE_NAME FROM SYSTABLE WHERE TABLE_TYPE = 'TABLE'".into()
    }

    fn compile_get_all_views(&self) -> String {
        "SELECT TABLE_NAME FROM SYSTABLE WHERE TABLE_TYPE = 'VIEW'".into()
    }

    fn compile_get_foreign_keys(&self) -> String {
        "SELECT FK_TBL_NAME, FK_NAME FROM SYSFOREIGNKEY".into()
    }

    fn compile_drop_all_tables(&self, table: &str) -> String {
        format!("DROP TABLE {}", self.wrap(table))
    }

    fn compile_drop_all_views(&self, view: &str) -> String {
        format!("DROP VIEW {}", self.wrap(view))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_sql(build: impl FnOnce(&mut Blueprint)) -> String {
        let mut bp = Blueprint::new("t");
        build(&mut bp);
        DbMakerSchemaGrammar.get_column(&bp.columns()[0]).unwrap()
    }

    #[test]
    fn type_mapping() {
        let g = DbMakerSchemaGrammar;
        let cases = [
            (ColumnType::String(100), "varchar(100)"),
            (ColumnType::Char(2), "char(2)"),
            (ColumnType::MediumText, "long varchar"),
            (ColumnType::Integer, "int"),
            (ColumnType::BigInteger, "bigint"),
            (ColumnType::MediumInteger, "integer"),
            (ColumnType::Boolean, "smallint"),
            (ColumnType::TinyInteger, "smallint"),
            (ColumnType::Serial, "serial"),
            (ColumnType::BigSerial, "bigserial"),
            (ColumnType::Binary, "blob"),
            (ColumnType::DateTimeTz, "TIMESTAMP"),
            (ColumnType::TimeTz, "time"),
            (ColumnType::Decimal { total: 8, places: 2 }, "decimal(8,2)"),
            (ColumnType::Double, "Double"),
            (ColumnType::Float { total: Some(10) }, "Float(10)"),
            (ColumnType::Float { total: None }, "Float"),
            (ColumnType::Jsonb, "JSONCOLS"),
            (ColumnType::Uuid, "char(36)"),
            (ColumnType::IpAddress, "varchar(45)"),
            (ColumnType::MacAddress, "varchar(17)"),
            (ColumnType::Point, "varchar(128)"),
            (ColumnType::MultiPolygon, "LONG VARCHAR"),
        ];
        for (kind, expected) in cases {
            let column = ColumnDefinition::new("c", kind.clone());
            assert_eq!(g.type_sql(&column).unwrap(), expected, "{kind:?}");
        }
    }

    #[test]
    fn enum_and_use_current() {
        assert_eq!(
            column_sql(|t| {
                t.enumeration("role", &["admin", "o'neil"]);
            }),
            "\"role\" varchar(255) check (\"role\" in ('admin', 'o''neil')) not null"
        );
        assert_eq!(
            column_sql(|t| {
                t.timestamp("created_at").use_current();
            }),
            "\"created_at\" TIMESTAMP default CURRENT_TIMESTAMP not null"
        );
    }

    #[test]
    fn computed_columns_are_unsupported() {
        let column = ColumnDefinition::new("total", ColumnType::Computed("a + b".into()));
        assert!(matches!(
            DbMakerSchemaGrammar.type_sql(&column),
            Err(DbMakerError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn modifiers_apply_in_fixed_order() {
        assert_eq!(
            column_sql(|t| {
                t.string("name", 50)
                    .before("b")
                    .after("a")
                    .default("x");
            }),
            "\"name\" varchar(50) not null DEFAULT 'x' after \"a\" before \"b\""
        );
        assert_eq!(
            column_sql(|t| {
                t.increments("id");
            }),
            "\"id\" serial primary key"
        );
        assert_eq!(
            column_sql(|t| {
                t.json("meta");
            }),
            "\"meta\" JSONCOLS"
        );
        assert_eq!(
            column_sql(|t| {
                t.serial("n", false);
            }),
            "\"n\" serial"
        );
    }

    #[test]
    fn default_values() {
        assert_eq!(default_value(&DefaultValue::Bool(true)), "1");
        assert_eq!(default_value(&DefaultValue::Int(5)), "5");
        assert_eq!(default_value(&DefaultValue::Text("12".into())), "12");
        assert_eq!(default_value(&DefaultValue::Text("abc".into())), "'abc'");
        assert_eq!(
            default_value(&DefaultValue::Expression("CURRENT_TIMESTAMP".into())),
            "CURRENT_TIMESTAMP"
        );
    }

    #[test]
    fn create_temporary_and_plain() {
        let mut bp = Blueprint::new("sessions");
        bp.create();
        bp.temporary();
        bp.string("token", 64);
        bp.integer("hits").nullable();
        assert_eq!(
            bp.to_sql(&DbMakerSchemaGrammar).unwrap(),
            ["CREATE TEMPORARY TABLE \"sessions\" (\"token\" varchar(64) not null, \"hits\" int)"]
        );
    }

    #[test]
    fn alter_commands() {
        let mut bp = Blueprint::new("users").with_prefixes("app_", "");
        bp.string("nick", 20).nullable();
        bp.integer("age").change();
        bp.drop_column(&["a", "b"]);
        bp.rename_column("from", "to");
        bp.rename_index("old_idx", "new_idx");
        bp.primary(&["id", "tenant"]);
        bp.index(&["email"]);
        bp.drop_primary();
        bp.drop_unique("users_email_unique");
        bp.drop_index("users_email_index");
        bp.drop_foreign("users_team_id_foreign");
        bp.rename("members");
        assert_eq!(
            bp.to_sql(&DbMakerSchemaGrammar).unwrap(),
            [
                "ALTER TABLE \"app_users\" MODIFY (\"age\" TO \"age\" int not null)",
                "ALTER TABLE \"app_users\" add column \"nick\" varchar(20)",
                "ALTER TABLE \"app_users\" drop \"a\"",
                "ALTER TABLE \"app_users\" drop \"b\"",
                "ALTER TABLE \"app_users\" MODIFY (\"from\" NAME TO \"to\")",
                "ALTER INDEX \"old_idx\" ON \"app_users\" RENAME TO \"new_idx\"",
                "ALTER TABLE \"app_users\" ADD primary key (\"id\", \"tenant\")",
                "CREATE INDEX \"users_email_index\" ON \"app_users\" (\"email\")",
                "ALTER TABLE \"app_users\" DROP PRIMARY KEY",
                "DROP INDEX \"users_email_unique\" FROM \"app_users\"",
                "DROP INDEX \"users_email_index\" FROM \"app_users\"",
                "ALTER TABLE \"app_users\" DROP FOREIGN KEY \"users_team_id_foreign\"",
                "ALTER TABLE \"app_users\" RENAME TO \"app_members\"",
            ]
        );
    }

    #[test]
    fn drop_variants() {
        let mut bp = Blueprint::new("t");
        bp.drop();
        bp.drop_if_exists();
        assert_eq!(
            bp.to_sql(&DbMakerSchemaGrammar).unwrap(),
            ["DROP TABLE \"t\"", "DROP TABLE IF EXISTS \"t\""]
        );
    }

    #[test]
    fn foreign_keys_use_the_portable_form() {
        let mut bp = Blueprint::new("posts");
        bp.foreign(&["user_id"])
            .references(&["id"])
            .on("users")
            .on_delete("cascade")
            .on_update("restrict");
        assert_eq!(
            bp.to_sql(&DbMakerSchemaGrammar).unwrap(),
            ["alter table \"posts\" add constraint \"posts_user_id_foreign\" foreign key (\"user_id\") references \"users\" (\"id\") on delete cascade on update restrict"]
        );
    }

    #[test]
    fn fk_check_toggles() {
        let g = DbMakerSchemaGrammar;
        assert_eq!(
            g.compile_enable_foreign_key_constraints(),
            "CALL SETSYSTEMOPTION('FKCHK','1');"
        );
        assert_eq!(
            g.compile_disable_foreign_key_constraints(),
            "CALL SETSYSTEMOPTION('FKCHK','0');"
        );
    }
}
