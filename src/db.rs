use secrecy::{ExposeSecret as _, SecretString};

use crate::{
    cmd::Cmd,
    config::DatabaseConfig,
    error::{Result, ShelpError},
};

const MAX_NAME_LEN: usize = 64;

pub trait DbClient {
    fn execute(&self, sql: &str) -> Result<()>;
}

/// Runs statements through the `mysql` command-line client.
#[derive(Debug)]
pub struct MysqlCli<'a> {
    config: &'a DatabaseConfig,
}

impl<'a> MysqlCli<'a> {
    pub fn new(config: &'a DatabaseConfig) -> Self {
        Self { config }
    }
}

impl DbClient for MysqlCli<'_> {
    fn execute(&self, sql: &str) -> Result<()> {
        let port = self.config.port.to_string();
        let mut cmd = Cmd::new(
            "mysql",
            [
                "--host",
                self.config.host.as_str(),
                "--port",
                port.as_str(),
                "--user",
                self.config.user.as_str(),
                "--batch",
                "--execute",
                sql,
            ],
        );
        cmd.with_title(format!(
            "🗄️ mysql --user {} --host {} --execute \"{sql}\"",
            self.config.user, self.config.host
        ));
        if let Some(password) = &self.config.password {
            // MYSQL_PWD keeps the password off the process list.
            cmd.with_env_var(
                "MYSQL_PWD",
                SecretString::from(password.expose_secret().to_owned()),
            );
        }
        cmd.run_checked()?;
        Ok(())
    }
}

/// Database names are restricted so they can be quoted without escaping.
pub fn validate_name(name: &str) -> Result<&str> {
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if valid {
        Ok(name)
    } else {
        Err(ShelpError::InvalidDatabaseName(name.to_string()))
    }
}

pub fn recreate_sql(name: &str) -> String {
    format!("DROP DATABASE IF EXISTS `{name}`; CREATE DATABASE `{name}`;")
}

/// Drop the database if it exists and create it again, empty.
pub fn make_db(db: &dyn DbClient, name: Option<&str>) -> Result<()> {
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(ShelpError::MissingRequiredArgument("name"))?;
    let name = validate_name(name)?;
    db.execute(&recreate_sql(name))?;
    println!("✅ Database {name} recreated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDb;

    #[test]
    fn test_make_db_twice_leaves_one_database() {
        let db = FakeDb::default();
        make_db(&db, Some("foo")).unwrap();
        make_db(&db, Some("foo")).unwrap();
        assert_eq!(db.databases(), ["foo"]);
        assert_eq!(db.executed().len(), 2);
    }

    #[test]
    fn test_make_db_keeps_other_databases() {
        let db = FakeDb::default();
        make_db(&db, Some("app")).unwrap();
        make_db(&db, Some("app_test")).unwrap();
        assert_eq!(db.databases(), ["app", "app_test"]);
    }

    #[test]
    fn test_missing_name() {
        let db = FakeDb::default();
        for name in [None, Some(""), Some("  ")] {
            let err = make_db(&db, name).unwrap_err();
            assert!(matches!(err, ShelpError::MissingRequiredArgument("name")));
        }
        assert!(db.executed().is_empty());
    }

    #[test]
    fn test_rejects_names_that_need_escaping() {
        let db = FakeDb::default();
        for name in ["my-db", "a`b", "x; DROP DATABASE y", "café"] {
            let err = make_db(&db, Some(name)).unwrap_err();
            assert!(matches!(err, ShelpError::InvalidDatabaseName(_)), "{name}");
        }
        assert!(db.executed().is_empty());
    }

    #[test]
    fn test_name_length_limit() {
        assert!(validate_name(&"a".repeat(64)).is_ok());
        assert!(validate_name(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_recreate_sql() {
        assert_eq!(
            recreate_sql("foo"),
            "DROP DATABASE IF EXISTS `foo`; CREATE DATABASE `foo`;"
        );
    }
}
