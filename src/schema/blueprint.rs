use super::column::{ColumnDefinition, ColumnType};
use super::grammar::SchemaTranslator;
use crate::error::DbMakerError;

/// `FOREIGN KEY` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDefinition {
    pub index: String,
    pub columns: Vec<String>,
    pub references: Vec<String>,
    pub on: String,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
}

impl ForeignKeyDefinition {
    pub fn references(&mut self, columns: &[&str]) -> &mut Self {
        self.references = columns.iter().map(ToString::to_string).collect();
        self
    }

    pub fn on(&mut self, table: &str) -> &mut Self {
        self.on = table.to_string();
        self
    }

    pub fn on_delete(&mut self, action: &str) -> &mut Self {
        self.on_delete = Some(action.to_string());
        self
    }

    pub fn on_update(&mut self, action: &str) -> &mut Self {
        self.on_update = Some(action.to_string());
        self
    }

    pub fn cascade_on_delete(&mut self) -> &mut Self {
        self.on_delete("cascade")
    }
}

/// Table-level operations recorded on a blueprint, compiled in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create,
    Drop,
    DropIfExists,
    Rename { to: String },
    DropColumn { columns: Vec<String> },
    RenameColumn { from: String, to: String },
    Primary { index: String, columns: Vec<String> },
    Unique { index: String, columns: Vec<String> },
    Index { index: String, columns: Vec<String> },
    RenameIndex { from: String, to: String },
    DropPrimary { index: String },
    DropUnique { index: String },
    DropIndex { index: String },
    Foreign(ForeignKeyDefinition),
    DropForeign { index: String },
}

/// Describes a table change: new columns plus table commands.
///
/// ```rust
/// use dbmaker_middleware::prelude::*;
///
/// let mut table = Blueprint::new("users");
/// table.create();
/// table.increments("id");
/// table.string("email", 255).unique();
/// let sql = table.to_sql(&DbMakerSchemaGrammar)?;
/// assert_eq!(
///     sql,
///     [
///         r#"CREATE TABLE "users" ("id" serial primary key, "email" varchar(255) not null)"#,
///         r#"CREATE UNIQUE INDEX "users_email_unique" ON "users" ("email")"#,
///     ]
/// );
/// # Ok::<(), DbMakerError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    table: String,
    table_prefix: String,
    index_prefix: String,
    temporary: bool,
    columns: Vec<ColumnDefinition>,
    commands: Vec<Command>,
}

impl Blueprint {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            table_prefix: String::new(),
            index_prefix: String::new(),
            temporary: false,
            columns: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Table prefix for the SQL name, index prefix for generated index names.
    #[must_use]
    pub fn with_prefixes(mut self, table_prefix: &str, index_prefix: &str) -> Self {
        self.table_prefix = table_prefix.to_string();
        self.index_prefix = index_prefix.to_string();
        self
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Table name as it appears in SQL.
    #[must_use]
    pub fn qualified_table(&self) -> String {
        format!("{}{}", self.table_prefix, self.table)
    }

    #[must_use]
    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    #[must_use]
    pub fn creating(&self) -> bool {
        self.commands.contains(&Command::Create)
    }

    /// Columns to add (not marked as changes).
    pub fn added_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| !c.change)
    }

    pub fn changed_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| c.change)
    }

    /// Compile every column and command into SQL statements.
    ///
    /// For an existing table, changed columns are compiled first, then added columns, then the
    /// recorded commands, then indexes declared on columns.
    ///
    /// # Errors
    /// Returns `DbMakerError::UnsupportedOperation` for column types the grammar cannot map.
    pub fn to_sql(&self, grammar: &dyn SchemaTranslator) -> Result<Vec<String>, DbMakerError> {
        let mut statements = Vec::new();
        if !self.creating() {
            let changed: Vec<&ColumnDefinition> = self.changed_columns().collect();
            if !changed.is_empty() {
                statements.extend(grammar.compile_change(self, &changed)?);
            }
            let added: Vec<&ColumnDefinition> = self.added_columns().collect();
            if !added.is_empty() {
                statements.extend(grammar.compile_add(self, &added)?);
            }
        }
        for command in self.commands.iter().chain(self.fluent_indexes().iter()) {
            statements.extend(grammar.compile_command(self, command)?);
        }
        Ok(statements)
    }

    fn fluent_indexes(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        for column in &self.columns {
            let columns = vec![column.name.clone()];
            if column.primary {
                commands.push(Command::Primary {
                    index: self.create_index_name("primary", &columns),
                    columns: columns.clone(),
                });
            }
            if column.unique {
                commands.push(Command::Unique {
                    index: self.create_index_name("unique", &columns),
                    columns: columns.clone(),
                });
            }
            if column.index {
                commands.push(Command::Index {
                    index: self.create_index_name("index", &columns),
                    columns,
                });
            }
        }
        commands
    }

    /// Default name of an index of `kind` over `columns`.
    #[must_use]
    pub fn create_index_name(&self, kind: &str, columns: &[String]) -> String {
        let name = format!(
            "{}{}_{}_{kind}",
            self.index_prefix,
            self.table,
            columns.join("_")
        );
        name.to_lowercase().replace(['-', '.'], "_")
    }

    pub fn create(&mut self) {
        self.commands.push(Command::Create);
    }

    pub fn temporary(&mut self) {
        self.temporary = true;
    }

    pub fn drop(&mut self) {
        self.commands.push(Command::Drop);
    }

    pub fn drop_if_exists(&mut self) {
        self.commands.push(Command::DropIfExists);
    }

    pub fn rename(&mut self, to: &str) {
        self.commands.push(Command::Rename { to: to.to_string() });
    }

    pub fn drop_column(&mut self, columns: &[&str]) {
        self.commands.push(Command::DropColumn {
            columns: columns.iter().map(ToString::to_string).collect(),
        });
    }

    pub fn rename_column(&mut self, from: &str, to: &str) {
        self.commands.push(Command::RenameColumn {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    pub fn primary(&mut self, columns: &[&str]) {
        let columns = to_strings(columns);
        let index = self.create_index_name("primary", &columns);
        self.commands.push(Command::Primary { index, columns });
    }

    pub fn unique(&mut self, columns: &[&str]) {
        let columns = to_strings(columns);
        let index = self.create_index_name("unique", &columns);
        self.commands.push(Command::Unique { index, columns });
    }

    pub fn index(&mut self, columns: &[&str]) {
        let columns = to_strings(columns);
        let index = self.create_index_name("index", &columns);
        self.commands.push(Command::Index { index, columns });
    }

    pub fn rename_index(&mut self, from: &str, to: &str) {
        self.commands.push(Command::RenameIndex {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    pub fn drop_primary(&mut self) {
        let index = self.create_index_name("primary", &[]);
        self.commands.push(Command::DropPrimary { index });
    }

    pub fn drop_unique(&mut self, index: &str) {
        self.commands.push(Command::DropUnique {
            index: index.to_string(),
        });
    }

    pub fn drop_index(&mut self, index: &str) {
        self.commands.push(Command::DropIndex {
            index: index.to_string(),
        });
    }

    /// Declare a foreign key over `columns`; finish it with `references` and `on`.
    pub fn foreign(&mut self, columns: &[&str]) -> &mut ForeignKeyDefinition {
        let columns = to_strings(columns);
        let index = self.create_index_name("foreign", &columns);
        self.commands.push(Command::Foreign(ForeignKeyDefinition {
            index,
            columns,
            references: Vec::new(),
            on: String::new(),
            on_delete: None,
            on_update: None,
        }));
        match self.commands.last_mut() {
            Some(Command::Foreign(fk)) => fk,
            _ => unreachable!("foreign key command was just pushed"),
        }
    }

    pub fn drop_foreign(&mut self, index: &str) {
        self.commands.push(Command::DropForeign {
            index: index.to_string(),
        });
    }

    pub fn add_column(&mut self, name: &str, kind: ColumnType) -> &mut ColumnDefinition {
        self.columns.push(ColumnDefinition::new(name, kind));
        let idx = self.columns.len() - 1;
        &mut self.columns[idx]
    }

    pub fn string(&mut self, name: &str, length: u32) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::String(length))
    }

    pub fn char(&mut self, name: &str, length: u32) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Char(length))
    }

    pub fn text(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Text)
    }

    pub fn medium_text(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::MediumText)
    }

    pub fn long_text(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::LongText)
    }

    pub fn integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Integer)
    }

    pub fn big_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::BigInteger)
    }

    pub fn medium_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::MediumInteger)
    }

    pub fn small_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::SmallInteger)
    }

    pub fn tiny_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::TinyInteger)
    }

    pub fn boolean(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Boolean)
    }

    pub fn serial(&mut self, name: &str, auto_increment: bool) -> &mut ColumnDefinition {
        let column = self.add_column(name, ColumnType::Serial);
        column.auto_increment = auto_increment;
        column
    }

    pub fn bigserial(&mut self, name: &str, auto_increment: bool) -> &mut ColumnDefinition {
        let column = self.add_column(name, ColumnType::BigSerial);
        column.auto_increment = auto_increment;
        column
    }

    /// Auto-incrementing key; a DBMaker `serial primary key`.
    pub fn increments(&mut self, name: &str) -> &mut ColumnDefinition {
        self.serial(name, true)
    }

    /// Auto-incrementing 8-byte key; a DBMaker `bigserial primary key`.
    pub fn big_increments(&mut self, name: &str) -> &mut ColumnDefinition {
        self.bigserial(name, true)
    }

    pub fn binary(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Binary)
    }

    pub fn date(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Date)
    }

    pub fn date_time(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::DateTime)
    }

    pub fn date_time_tz(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::DateTimeTz)
    }

    pub fn timestamp(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Timestamp)
    }

    pub fn timestamp_tz(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::TimestampTz)
    }

    /// Nullable `created_at` and `updated_at`.
    pub fn timestamps(&mut self) {
        self.timestamp("created_at").nullable();
        self.timestamp("updated_at").nullable();
    }

    pub fn time(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Time)
    }

    pub fn time_tz(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::TimeTz)
    }

    pub fn decimal(&mut self, name: &str, total: u32, places: u32) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Decimal { total, places })
    }

    pub fn double(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Double)
    }

    pub fn float(&mut self, name: &str, total: Option<u32>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Float { total })
    }

    pub fn enumeration(&mut self, name: &str, allowed: &[&str]) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Enum(to_strings(allowed)))
    }

    pub fn json(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Json)
    }

    pub fn jsonb(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Jsonb)
    }

    pub fn uuid(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Uuid)
    }

    pub fn ip_address(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::IpAddress)
    }

    pub fn mac_address(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::MacAddress)
    }

    pub fn geometry(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Geometry)
    }

    pub fn point(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Point)
    }

    pub fn line_string(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::LineString)
    }

    pub fn polygon(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Polygon)
    }

    pub fn geometry_collection(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::GeometryCollection)
    }

    pub fn multi_point(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::MultiPoint)
    }

    pub fn multi_line_string(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::MultiLineString)
    }

    pub fn multi_polygon(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::MultiPolygon)
    }

    pub fn computed(&mut self, name: &str, expression: &str) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Computed(expression.to_string()))
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_names_are_lowercased_and_sanitized() {
        let bp = Blueprint::new("Users.Archive").with_prefixes("app_", "app_");
        assert_eq!(
            bp.create_index_name("unique", &["e-mail".to_string(), "Name".to_string()]),
            "app_users_archive_e_mail_name_unique"
        );
        assert_eq!(bp.qualified_table(), "app_Users.Archive");
    }

    #[test]
    fn increments_map_to_serial_keys() {
        let mut bp = Blueprint::new("t");
        bp.increments("id");
        bp.big_increments("big_id");
        bp.serial("plain", false);
        let cols = bp.columns();
        assert_eq!(cols[0].kind, ColumnType::Serial);
        assert!(cols[0].auto_increment);
        assert_eq!(cols[1].kind, ColumnType::BigSerial);
        assert!(cols[1].auto_increment);
        assert!(!cols[2].auto_increment);
    }

    #[test]
    fn foreign_key_builder() {
        let mut bp = Blueprint::new("posts");
        bp.foreign(&["user_id"])
            .references(&["id"])
            .on("users")
            .cascade_on_delete();
        let Command::Foreign(fk) = &bp.commands()[0] else {
            panic!("expected a foreign key command");
        };
        assert_eq!(fk.index, "posts_user_id_foreign");
        assert_eq!(fk.on, "users");
        assert_eq!(fk.on_delete.as_deref(), Some("cascade"));
    }
}
