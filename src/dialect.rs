//! SQL dialect resolution
//!
//! Every backend the store can talk to is classified into a closed set of
//! dialects. All quoting, placeholder and column-type decisions are routed
//! through [`Dialect`] so statement builders never branch on driver names.

use crate::{Error, Result};
use rusqlite::Connection;
use std::fmt;

/// Something that can report the name of the driver behind it.
pub trait Driver {
    /// The driver's identifying name, e.g. `"github.com/lib/pq"` or `"mysql"`
    fn driver_name(&self) -> String;
}

impl Driver for Connection {
    fn driver_name(&self) -> String {
        "rusqlite (sqlite3)".to_string()
    }
}

impl Driver for str {
    fn driver_name(&self) -> String {
        self.to_string()
    }
}

/// SQL dialect of the backing database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
    /// Recognised, but no statements can be generated for it
    MsSql,
}

impl Dialect {
    /// Classify a driver into a dialect. Fails closed on unknown drivers.
    pub fn resolve<D: Driver + ?Sized>(driver: &D) -> Result<Self> {
        Self::from_driver_name(&driver.driver_name())
    }

    /// Classify a driver name by substring; first match wins.
    pub fn from_driver_name(name: &str) -> Result<Self> {
        if name.contains("mysql") {
            Ok(Dialect::MySql)
        } else if name.contains("postgres") || name.contains("pq") {
            Ok(Dialect::Postgres)
        } else if name.contains("sqlite") {
            Ok(Dialect::Sqlite)
        } else if name.contains("mssql") {
            Ok(Dialect::MsSql)
        } else {
            Err(Error::UnsupportedDialect(name.to_string()))
        }
    }

    /// Get the string representation of the dialect
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
            Dialect::MsSql => "mssql",
        }
    }

    /// Fail with `UnsupportedDialect` unless statements can be generated.
    pub fn ensure_supported(&self) -> Result<()> {
        match self {
            Dialect::MySql | Dialect::Postgres | Dialect::Sqlite => Ok(()),
            Dialect::MsSql => Err(Error::UnsupportedDialect(self.as_str().to_string())),
        }
    }

    /// Quote an identifier (table or column name)
    pub fn quote(&self, ident: &str) -> String {
        match self {
            Dialect::MySql => ident.to_string(),
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
            Dialect::MsSql => format!("[{}]", ident),
        }
    }

    /// Positional parameter marker, 1-indexed
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", n),
            Dialect::Sqlite => format!("?{}", n),
            Dialect::MySql | Dialect::MsSql => "?".to_string(),
        }
    }

    /// Comma-separated placeholders `start..start+count`
    pub fn placeholders(&self, start: usize, count: usize) -> String {
        (start..start + count)
            .map(|n| self.placeholder(n))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Column type used for timestamps
    pub fn timestamp_type(&self) -> &'static str {
        match self {
            Dialect::Postgres => "timestamptz(6)",
            _ => "datetime",
        }
    }

    /// Render a LIMIT/OFFSET tail. `None` means no upper bound.
    pub fn limit_offset(&self, limit: Option<u64>, offset: u64) -> String {
        match (self, limit) {
            (_, Some(limit)) => format!(" LIMIT {} OFFSET {}", limit, offset),
            (_, None) if offset == 0 => String::new(),
            (Dialect::Sqlite, None) => format!(" LIMIT -1 OFFSET {}", offset),
            (Dialect::MySql, None) => format!(" LIMIT {} OFFSET {}", u64::MAX, offset),
            (_, None) => format!(" OFFSET {}", offset),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_drivers() {
        assert_eq!(Dialect::from_driver_name("*mysql.MySQLDriver").unwrap(), Dialect::MySql);
        assert_eq!(Dialect::from_driver_name("*pq.Driver").unwrap(), Dialect::Postgres);
        assert_eq!(Dialect::from_driver_name("postgres").unwrap(), Dialect::Postgres);
        assert_eq!(Dialect::from_driver_name("*sqlite3.SQLiteDriver").unwrap(), Dialect::Sqlite);
        assert_eq!(Dialect::from_driver_name("*mssql.Driver").unwrap(), Dialect::MsSql);
    }

    #[test]
    fn test_resolve_connection() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(Dialect::resolve(&conn).unwrap(), Dialect::Sqlite);
        assert_eq!(Dialect::resolve("mysql").unwrap(), Dialect::MySql);
    }

    #[test]
    fn test_unknown_driver_fails_closed() {
        let err = Dialect::from_driver_name("oracle").unwrap_err();
        assert!(matches!(err, Error::UnsupportedDialect(name) if name == "oracle"));
        assert!(Dialect::MsSql.ensure_supported().is_err());
        assert!(Dialect::Sqlite.ensure_supported().is_ok());
    }

    #[test]
    fn test_first_match_wins() {
        // "mysql" is checked before "sqlite"
        assert_eq!(Dialect::from_driver_name("mysql-over-sqlite").unwrap(), Dialect::MySql);
    }

    #[test]
    fn test_quoting_and_placeholders() {
        assert_eq!(Dialect::MySql.quote("id"), "id");
        assert_eq!(Dialect::Postgres.quote("id"), "\"id\"");
        assert_eq!(Dialect::Sqlite.quote("id"), "\"id\"");
        assert_eq!(Dialect::Postgres.placeholders(2, 3), "$2, $3, $4");
        assert_eq!(Dialect::Sqlite.placeholders(1, 2), "?1, ?2");
        assert_eq!(Dialect::MySql.placeholders(1, 2), "?, ?");
    }

    #[test]
    fn test_limit_offset() {
        assert_eq!(Dialect::Sqlite.limit_offset(Some(10), 20), " LIMIT 10 OFFSET 20");
        assert_eq!(Dialect::Sqlite.limit_offset(None, 0), "");
        assert_eq!(Dialect::Sqlite.limit_offset(None, 5), " LIMIT -1 OFFSET 5");
        assert_eq!(Dialect::Postgres.limit_offset(None, 5), " OFFSET 5");
    }
}
