//! Engine configuration.

use crate::error::QueryError;

/// Relational backend the finished queries are executed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    H2,
    Postgres,
    MySql,
    MariaDb,
    Oracle,
    MsSql,
    Db2,
}

impl Dialect {
    /// Backends that persist `""` as NULL.
    pub fn stores_empty_string_as_null(self) -> bool {
        matches!(self, Dialect::Oracle)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::H2 => "h2",
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::MariaDb => "mariadb",
            Dialect::Oracle => "oracle",
            Dialect::MsSql => "mssql",
            Dialect::Db2 => "db2",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Dialect {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "h2" => Ok(Dialect::H2),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySql),
            "mariadb" => Ok(Dialect::MariaDb),
            "oracle" => Ok(Dialect::Oracle),
            "mssql" | "sqlserver" => Ok(Dialect::MsSql),
            "db2" => Ok(Dialect::Db2),
            other => Err(QueryError::Config(format!("unknown dialect '{}'", other))),
        }
    }
}

/// Configuration shared by every query executed through one engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Active storage backend.
    pub dialect: Dialect,
    /// Upper bound for the page size of a paged list. `None` disables the cap.
    pub query_max_results: Option<usize>,
    /// Cache user group lookups on the query that issued them.
    pub cache_user_groups: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            query_max_results: None,
            cache_user_groups: true,
        }
    }
}

impl EngineConfig {
    /// Create a configuration for the given dialect.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    /// Set the dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Cap the page size of paged lists.
    pub fn with_query_max_results(mut self, max: usize) -> Self {
        self.query_max_results = Some(max);
        self
    }

    /// Enable or disable the per-query user group cache.
    pub fn with_user_group_cache(mut self, enabled: bool) -> Self {
        self.cache_user_groups = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.dialect, Dialect::H2);
        assert!(config.query_max_results.is_none());
        assert!(config.cache_user_groups);
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new(Dialect::Oracle)
            .with_query_max_results(500)
            .with_user_group_cache(false);
        assert_eq!(config.dialect, Dialect::Oracle);
        assert_eq!(config.query_max_results, Some(500));
        assert!(!config.cache_user_groups);
    }

    #[test]
    fn test_dialect_parse() {
        assert_eq!("ORACLE".parse::<Dialect>().unwrap(), Dialect::Oracle);
        assert_eq!("postgresql".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert!("sybase".parse::<Dialect>().is_err());
        assert!(Dialect::Oracle.stores_empty_string_as_null());
        assert!(!Dialect::Postgres.stores_empty_string_as_null());
    }
}
