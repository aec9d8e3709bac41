/// Abstract column types a blueprint can declare.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    String(u32),
    Char(u32),
    Text,
    MediumText,
    LongText,
    Integer,
    BigInteger,
    MediumInteger,
    SmallInteger,
    TinyInteger,
    Boolean,
    /// DBMaker 4-byte auto-numbering pseudo-type.
    Serial,
    /// DBMaker 8-byte auto-numbering pseudo-type.
    BigSerial,
    Binary,
    Date,
    DateTime,
    DateTimeTz,
    Timestamp,
    TimestampTz,
    Time,
    TimeTz,
    Decimal { total: u32, places: u32 },
    Double,
    Float { total: Option<u32> },
    Enum(Vec<String>),
    Json,
    Jsonb,
    Uuid,
    IpAddress,
    MacAddress,
    Geometry,
    Point,
    LineString,
    Polygon,
    GeometryCollection,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    /// Generated column; carries its expression.
    Computed(String),
}

impl ColumnType {
    #[must_use]
    pub fn is_serial(&self) -> bool {
        matches!(self, ColumnType::Serial | ColumnType::BigSerial)
    }
}

/// A column `DEFAULT`.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Emitted verbatim, e.g. `CURRENT_TIMESTAMP`.
    Expression(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        DefaultValue::Bool(value)
    }
}

impl From<i64> for DefaultValue {
    fn from(value: i64) -> Self {
        DefaultValue::Int(value)
    }
}

impl From<i32> for DefaultValue {
    fn from(value: i32) -> Self {
        DefaultValue::Int(i64::from(value))
    }
}

impl From<f64> for DefaultValue {
    fn from(value: f64) -> Self {
        DefaultValue::Float(value)
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        DefaultValue::Text(value.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        DefaultValue::Text(value)
    }
}

/// One column in a [`crate::schema::Blueprint`], with its modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub kind: ColumnType,
    pub nullable: bool,
    pub default: Option<DefaultValue>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub auto_increment: bool,
    pub use_current: bool,
    /// Alter an existing column instead of adding one.
    pub change: bool,
    pub primary: bool,
    pub unique: bool,
    pub index: bool,
}

impl ColumnDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            default: None,
            after: None,
            before: None,
            auto_increment: false,
            use_current: false,
            change: false,
            primary: false,
            unique: false,
            index: false,
        }
    }

    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    pub fn default(&mut self, value: impl Into<DefaultValue>) -> &mut Self {
        self.default = Some(value.into());
        self
    }

    /// `DEFAULT` written verbatim.
    pub fn default_raw(&mut self, expression: &str) -> &mut Self {
        self.default = Some(DefaultValue::Expression(expression.to_string()));
        self
    }

    pub fn after(&mut self, column: &str) -> &mut Self {
        self.after = Some(column.to_string());
        self
    }

    pub fn before(&mut self, column: &str) -> &mut Self {
        self.before = Some(column.to_string());
        self
    }

    pub fn auto_increment(&mut self) -> &mut Self {
        self.auto_increment = true;
        self
    }

    /// Timestamp columns default to `CURRENT_TIMESTAMP`.
    pub fn use_current(&mut self) -> &mut Self {
        self.use_current = true;
        self
    }

    pub fn change(&mut self) -> &mut Self {
        self.change = true;
        self
    }

    pub fn primary(&mut self) -> &mut Self {
        self.primary = true;
        self
    }

    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    pub fn index(&mut self) -> &mut Self {
        self.index = true;
        self
    }
}
