//! Backend families: identifier quoting, placeholder style, generated-key support.

use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Dialect {
    Postgres,
    Sqlite,
    SqlServer,
    MySql,
    /// Unknown backend: identifiers unquoted, `?` placeholders.
    #[default]
    Generic,
}

impl Dialect {
    /// Quote identifier (safe: identifiers only come from descriptors).
    pub fn quote(&self, ident: &str) -> String {
        match self {
            Dialect::Postgres | Dialect::Sqlite | Dialect::SqlServer => {
                format!("\"{}\"", ident.replace('"', "\"\""))
            }
            Dialect::MySql => format!("`{}`", ident.replace('`', "``")),
            Dialect::Generic => ident.to_string(),
        }
    }

    /// Placeholder for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            _ => "?".to_string(),
        }
    }

    /// Generated keys come back through `INSERT ... RETURNING` rather than a driver facility.
    pub fn returns_generated_keys(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
            Dialect::SqlServer => "sqlserver",
            Dialect::MySql => "mysql",
            Dialect::Generic => "generic",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_per_family() {
        assert_eq!(Dialect::Sqlite.quote("user"), "\"user\"");
        assert_eq!(Dialect::SqlServer.quote("user"), "\"user\"");
        assert_eq!(Dialect::MySql.quote("user"), "`user`");
        assert_eq!(Dialect::Generic.quote("user"), "user");
        assert_eq!(Dialect::Postgres.quote("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn placeholders() {
        assert_eq!(Dialect::Postgres.placeholder(3), "$3");
        assert_eq!(Dialect::MySql.placeholder(3), "?");
    }
}
