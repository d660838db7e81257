use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{RecordError, RecordResult};
use crate::models::{Role, UserAccount};

use super::is_unique_violation;

/// Insert a login account. `role` defaults to [`Role::Admin`].
pub fn create_account(
    conn: &Connection,
    username: &str,
    password: &str,
    role: Option<Role>,
) -> RecordResult<UserAccount> {
    let role = role.unwrap_or_default();
    conn.execute(
        "INSERT INTO users (username, password, role) VALUES (?1, ?2, ?3)",
        params![username, password, role.as_str()],
    )
    .map_err(|err| {
        if is_unique_violation(&err) {
            RecordError::DuplicateKey {
                what: "Username",
                key: username.to_string(),
            }
        } else {
            RecordError::store("insert account")(err)
        }
    })?;

    let id = conn.last_insert_rowid();
    info!("created account '{username}' with role {}", role.as_str());
    Ok(UserAccount {
        id,
        username: username.to_string(),
        password: password.to_string(),
        role,
    })
}

/// Look up the account whose username and password both match exactly.
pub fn find_by_credentials(
    conn: &Connection,
    username: &str,
    password: &str,
) -> RecordResult<Option<UserAccount>> {
    let account = conn
        .query_row(
            "SELECT id, username, password, role FROM users
             WHERE username = ?1 AND password = ?2",
            params![username, password],
            |row| {
                let role: String = row.get(3)?;
                Ok(UserAccount {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password: row.get(2)?,
                    role: Role::parse(&role),
                })
            },
        )
        .optional()
        .map_err(RecordError::store("look up account"))?;

    debug!(
        "credential check for '{username}': {}",
        if account.is_some() { "match" } else { "no match" }
    );
    Ok(account)
}

pub(crate) fn count_accounts(conn: &Connection) -> RecordResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .map_err(RecordError::store("count accounts"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::db::Session;
    use crate::error::ErrorKind;

    #[test]
    fn credentials_compare_verbatim() {
        let session = Session::open(&StoreConfig::in_memory()).unwrap();
        let conn = session.conn();
        create_account(conn, "clerk", "Pa55word", Some(Role::Staff)).unwrap();

        let found = find_by_credentials(conn, "clerk", "Pa55word").unwrap().unwrap();
        assert_eq!(found.role, Role::Staff);

        assert!(find_by_credentials(conn, "clerk", "pa55word").unwrap().is_none());
        assert!(find_by_credentials(conn, "Clerk", "Pa55word").unwrap().is_none());
    }

    #[test]
    fn usernames_are_unique() {
        let session = Session::open(&StoreConfig::in_memory()).unwrap();
        let err = create_account(session.conn(), "admin", "other", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    }
}
