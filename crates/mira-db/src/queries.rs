use crate::Database;
use crate::models::{ChatRow, MessageRow, SecurityQuestionRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, email: &str, name: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, name, password_hash) VALUES (?1, ?2, ?3, ?4)",
                (id, email, name, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    pub fn update_user_profile(&self, id: &str, name: &str, email: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET name = ?2, email = ?3 WHERE id = ?1",
                (id, name, email),
            )?;
            Ok(())
        })
    }

    pub fn update_user_password(&self, id: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET password_hash = ?2 WHERE id = ?1",
                (id, password_hash),
            )?;
            Ok(())
        })
    }

    /// Cascades to security_questions, chats, and messages.
    pub fn delete_user(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    // -- Security questions --

    /// Deactivate the current active row (if any) and insert the new
    /// one, in a single transaction. Concurrent rotations serialize on
    /// the connection, so exactly one active row survives.
    pub fn replace_active_question(
        &self,
        id: &str,
        user_id: &str,
        question: &str,
        answer_hash: &str,
        salt: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE security_questions
                 SET is_active = 0, updated_at = datetime('now')
                 WHERE user_id = ?1 AND is_active = 1",
                [user_id],
            )?;
            tx.execute(
                "INSERT INTO security_questions (id, user_id, question, answer_hash, salt, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1)",
                (id, user_id, question, answer_hash, salt),
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_active_question(&self, user_id: &str) -> Result<Option<SecurityQuestionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, question, answer_hash, salt, is_active
                 FROM security_questions
                 WHERE user_id = ?1 AND is_active = 1",
            )?;

            let row = stmt
                .query_row([user_id], |row| {
                    Ok(SecurityQuestionRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        question: row.get(2)?,
                        answer_hash: row.get(3)?,
                        salt: row.get(4)?,
                        is_active: row.get(5)?,
                    })
                })
                .optional()?;

            Ok(row)
        })
    }

    pub fn delete_questions(&self, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM security_questions WHERE user_id = ?1", [user_id])?;
            Ok(())
        })
    }

    pub fn count_questions(&self, user_id: &str, active_only: bool) -> Result<u32> {
        self.with_conn(|conn| {
            let sql = if active_only {
                "SELECT COUNT(*) FROM security_questions WHERE user_id = ?1 AND is_active = 1"
            } else {
                "SELECT COUNT(*) FROM security_questions WHERE user_id = ?1"
            };
            let count = conn.query_row(sql, [user_id], |row| row.get(0))?;
            Ok(count)
        })
    }

    // -- Chats --

    pub fn create_chat(&self, id: &str, user_id: &str, title: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chats (id, user_id, title) VALUES (?1, ?2, ?3)",
                (id, user_id, title),
            )?;
            Ok(())
        })
    }

    pub fn get_chat(&self, id: &str) -> Result<Option<ChatRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, user_id, title, created_at FROM chats WHERE id = ?1")?;
            let row = stmt
                .query_row([id], |row| {
                    Ok(ChatRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        title: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_chats_for_user(&self, user_id: &str) -> Result<Vec<ChatRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, title, created_at FROM chats
                 WHERE user_id = ?1 ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(ChatRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        title: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_chat(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM chats WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    // -- Messages --

    pub fn insert_message(&self, id: &str, chat_id: &str, role: &str, content: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, chat_id, role, content) VALUES (?1, ?2, ?3, ?4)",
                (id, chat_id, role, content),
            )?;
            Ok(())
        })
    }

    pub fn get_messages(&self, chat_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, role, content, created_at FROM messages
                 WHERE chat_id = ?1 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt
                .query_map([chat_id], |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        chat_id: row.get(1)?,
                        role: row.get(2)?,
                        content: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, filter: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, email, name, password_hash, created_at FROM users WHERE {filter}"
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                name: row.get(2)?,
                password_hash: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
