//! SQL dump scanning and database name rules

use regex::Regex;
use std::sync::OnceLock;

/// Strip every character that is not an ASCII word character or `-`.
///
/// Case is preserved. Applying it twice gives the same result as once.
pub fn sanitize_db_name(input: &str) -> String {
    static NON_NAME: OnceLock<Regex> = OnceLock::new();
    let re = NON_NAME.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]").unwrap());
    re.replace_all(input, "").into_owned()
}

/// Find the database a dump creates, if it has a `CREATE DATABASE` statement.
///
/// Handles plain `pg_dump` output (`CREATE DATABASE mydb WITH ...`) and
/// `mysqldump` output with version comments and quoting
/// (``CREATE DATABASE /*!32312 IF NOT EXISTS*/ `mydb` ``). Keywords must be
/// upper case, as dump tools write them, so prose in comments does not
/// match. When the dump holds several statements the last one wins.
pub fn find_database_name(contents: &str) -> Option<String> {
    static CREATE_DATABASE: OnceLock<Regex> = OnceLock::new();
    let re = CREATE_DATABASE.get_or_init(|| {
        Regex::new(
            r#"\bCREATE\s+DATABASE\s+(?:/\*!\d+\s+)?(?:IF\s+NOT\s+EXISTS\s*)?(?:\*/\s*)?[`"']?([^\s`"';]+)"#,
        )
        .unwrap()
    });

    re.captures_iter(contents)
        .filter_map(|caps| caps.get(1))
        .map(|m| sanitize_db_name(m.as_str()))
        .filter(|name| !name.is_empty())
        .last()
}

/// Name used for an import: the dump's own name, else what the user typed
pub fn choose_import_name(contents: &str, user_entered: &str) -> String {
    match find_database_name(contents) {
        Some(name) => {
            tracing::debug!(name = %name, "Dump declares its database name");
            name
        }
        None => sanitize_db_name(user_entered),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_special_characters() {
        assert_eq!(sanitize_db_name("my db!"), "mydb");
        assert_eq!(sanitize_db_name("Sales-2024_v2"), "Sales-2024_v2");
        assert_eq!(sanitize_db_name("drop;table"), "droptable");
        assert_eq!(sanitize_db_name("café"), "caf");
        assert_eq!(sanitize_db_name(""), "");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            "plain",
            "With Spaces And CAPS",
            "`quoted`",
            "semi;colon--dash",
            "ünïcödé ñame",
            "tabs\tand\nnewlines",
            "$$$",
            "a-b_c.d/e\\f",
            "日本語のデータベース",
            "emoji🚀name",
        ];
        for sample in samples {
            let once = sanitize_db_name(sample);
            assert_eq!(sanitize_db_name(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_find_name_in_pg_dump() {
        let dump = "--\n-- PostgreSQL database dump\n--\nCREATE DATABASE mydb WITH TEMPLATE = template0 ENCODING = 'UTF8';\n\\connect mydb\n";
        assert_eq!(find_database_name(dump), Some("mydb".to_string()));
    }

    #[test]
    fn test_find_name_in_mysqldump() {
        let dump = "CREATE DATABASE /*!32312 IF NOT EXISTS*/ `shop_db` /*!40100 DEFAULT CHARACTER SET utf8mb4 */;\nUSE `shop_db`;";
        assert_eq!(find_database_name(dump), Some("shop_db".to_string()));
    }

    #[test]
    fn test_find_name_skips_if_not_exists_and_semicolon() {
        assert_eq!(
            find_database_name("CREATE DATABASE IF NOT EXISTS analytics;"),
            Some("analytics".to_string())
        );
        assert_eq!(find_database_name("CREATE DATABASE mydb;"), Some("mydb".to_string()));
    }

    #[test]
    fn test_lower_case_prose_is_not_a_statement() {
        let dump = "-- create database manually first
CREATE TABLE users (id int);";
        assert_eq!(find_database_name(dump), None);

        let dump = "-- create database manually first
CREATE DATABASE shop;";
        assert_eq!(find_database_name(dump), Some("shop".to_string()));
    }

    #[test]
    fn test_last_statement_wins() {
        let dump = "CREATE DATABASE first;\nCREATE DATABASE second;";
        assert_eq!(find_database_name(dump), Some("second".to_string()));
    }

    #[test]
    fn test_no_create_database() {
        assert_eq!(find_database_name("CREATE TABLE users (id int);"), None);
        assert_eq!(find_database_name(""), None);
    }

    #[test]
    fn test_choose_import_name() {
        assert_eq!(choose_import_name("x CREATE DATABASE mydb y", "typed"), "mydb");
        assert_eq!(choose_import_name("CREATE TABLE t (id int);", "typed name"), "typedname");
    }
}
