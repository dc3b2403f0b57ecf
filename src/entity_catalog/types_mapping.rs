/// JDBC type lookup
///
/// Maps host (Java-style) type names to JDBC types and back. Used to infer a
/// result column's SQL type when no db attribute is bound to it.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JdbcType {
    Bit,
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Real,
    Double,
    Numeric,
    Decimal,
    Char,
    VarChar,
    LongVarChar,
    NChar,
    NVarChar,
    LongNVarChar,
    Date,
    Time,
    Timestamp,
    Binary,
    VarBinary,
    LongVarBinary,
    Blob,
    Clob,
    NClob,
    Null,
    Other,
}

impl JdbcType {
    /// Numeric code as defined by `java.sql.Types`.
    pub fn code(&self) -> i32 {
        match self {
            JdbcType::Bit => -7,
            JdbcType::Boolean => 16,
            JdbcType::TinyInt => -6,
            JdbcType::SmallInt => 5,
            JdbcType::Integer => 4,
            JdbcType::BigInt => -5,
            JdbcType::Float => 6,
            JdbcType::Real => 7,
            JdbcType::Double => 8,
            JdbcType::Numeric => 2,
            JdbcType::Decimal => 3,
            JdbcType::Char => 1,
            JdbcType::VarChar => 12,
            JdbcType::LongVarChar => -1,
            JdbcType::NChar => -15,
            JdbcType::NVarChar => -9,
            JdbcType::LongNVarChar => -16,
            JdbcType::Date => 91,
            JdbcType::Time => 92,
            JdbcType::Timestamp => 93,
            JdbcType::Binary => -2,
            JdbcType::VarBinary => -3,
            JdbcType::LongVarBinary => -4,
            JdbcType::Blob => 2004,
            JdbcType::Clob => 2005,
            JdbcType::NClob => 2011,
            JdbcType::Null => 0,
            JdbcType::Other => 1111,
        }
    }

    pub fn sql_name(&self) -> &'static str {
        match self {
            JdbcType::Bit => "BIT",
            JdbcType::Boolean => "BOOLEAN",
            JdbcType::TinyInt => "TINYINT",
            JdbcType::SmallInt => "SMALLINT",
            JdbcType::Integer => "INTEGER",
            JdbcType::BigInt => "BIGINT",
            JdbcType::Float => "FLOAT",
            JdbcType::Real => "REAL",
            JdbcType::Double => "DOUBLE",
            JdbcType::Numeric => "NUMERIC",
            JdbcType::Decimal => "DECIMAL",
            JdbcType::Char => "CHAR",
            JdbcType::VarChar => "VARCHAR",
            JdbcType::LongVarChar => "LONGVARCHAR",
            JdbcType::NChar => "NCHAR",
            JdbcType::NVarChar => "NVARCHAR",
            JdbcType::LongNVarChar => "LONGNVARCHAR",
            JdbcType::Date => "DATE",
            JdbcType::Time => "TIME",
            JdbcType::Timestamp => "TIMESTAMP",
            JdbcType::Binary => "BINARY",
            JdbcType::VarBinary => "VARBINARY",
            JdbcType::LongVarBinary => "LONGVARBINARY",
            JdbcType::Blob => "BLOB",
            JdbcType::Clob => "CLOB",
            JdbcType::NClob => "NCLOB",
            JdbcType::Null => "NULL",
            JdbcType::Other => "OTHER",
        }
    }
}

/// Host type used when nothing better is known.
pub const DEFAULT_HOST_TYPE: &str = "java.lang.Object";

/// JDBC type for a host type name, `Other` if unknown.
pub fn jdbc_type_for_host(host_type: &str) -> JdbcType {
    HOST_TO_JDBC
        .get(host_type)
        .copied()
        .unwrap_or(JdbcType::Other)
}

/// Default host type for a JDBC type.
pub fn host_type_for_jdbc(jdbc_type: JdbcType) -> &'static str {
    JDBC_TO_HOST
        .get(&jdbc_type)
        .copied()
        .unwrap_or(DEFAULT_HOST_TYPE)
}

lazy_static::lazy_static! {
    static ref HOST_TO_JDBC: HashMap<&'static str, JdbcType> = {
        let mut m = HashMap::new();
        m.insert("java.lang.String", JdbcType::VarChar);
        m.insert("java.lang.Boolean", JdbcType::Boolean);
        m.insert("boolean", JdbcType::Boolean);
        m.insert("java.lang.Byte", JdbcType::TinyInt);
        m.insert("byte", JdbcType::TinyInt);
        m.insert("java.lang.Short", JdbcType::SmallInt);
        m.insert("short", JdbcType::SmallInt);
        m.insert("java.lang.Integer", JdbcType::Integer);
        m.insert("int", JdbcType::Integer);
        m.insert("java.lang.Long", JdbcType::BigInt);
        m.insert("long", JdbcType::BigInt);
        m.insert("java.lang.Float", JdbcType::Float);
        m.insert("float", JdbcType::Float);
        m.insert("java.lang.Double", JdbcType::Double);
        m.insert("double", JdbcType::Double);
        m.insert("java.math.BigDecimal", JdbcType::Decimal);
        m.insert("java.math.BigInteger", JdbcType::BigInt);
        m.insert("java.time.LocalDate", JdbcType::Date);
        m.insert("java.sql.Date", JdbcType::Date);
        m.insert("java.time.LocalTime", JdbcType::Time);
        m.insert("java.sql.Time", JdbcType::Time);
        m.insert("java.time.LocalDateTime", JdbcType::Timestamp);
        m.insert("java.sql.Timestamp", JdbcType::Timestamp);
        m.insert("java.util.Date", JdbcType::Timestamp);
        m.insert("byte[]", JdbcType::VarBinary);
        m.insert("char[]", JdbcType::VarChar);
        m
    };

    static ref JDBC_TO_HOST: HashMap<JdbcType, &'static str> = {
        let mut m = HashMap::new();
        m.insert(JdbcType::Bit, "java.lang.Boolean");
        m.insert(JdbcType::Boolean, "java.lang.Boolean");
        m.insert(JdbcType::TinyInt, "java.lang.Byte");
        m.insert(JdbcType::SmallInt, "java.lang.Short");
        m.insert(JdbcType::Integer, "java.lang.Integer");
        m.insert(JdbcType::BigInt, "java.lang.Long");
        m.insert(JdbcType::Float, "java.lang.Float");
        m.insert(JdbcType::Real, "java.lang.Float");
        m.insert(JdbcType::Double, "java.lang.Double");
        m.insert(JdbcType::Numeric, "java.math.BigDecimal");
        m.insert(JdbcType::Decimal, "java.math.BigDecimal");
        m.insert(JdbcType::Char, "java.lang.String");
        m.insert(JdbcType::VarChar, "java.lang.String");
        m.insert(JdbcType::LongVarChar, "java.lang.String");
        m.insert(JdbcType::NChar, "java.lang.String");
        m.insert(JdbcType::NVarChar, "java.lang.String");
        m.insert(JdbcType::LongNVarChar, "java.lang.String");
        m.insert(JdbcType::Clob, "java.lang.String");
        m.insert(JdbcType::NClob, "java.lang.String");
        m.insert(JdbcType::Date, "java.time.LocalDate");
        m.insert(JdbcType::Time, "java.time.LocalTime");
        m.insert(JdbcType::Timestamp, "java.time.LocalDateTime");
        m.insert(JdbcType::Binary, "byte[]");
        m.insert(JdbcType::VarBinary, "byte[]");
        m.insert(JdbcType::LongVarBinary, "byte[]");
        m.insert(JdbcType::Blob, "byte[]");
        m
    };
}
