/// Database row types — these map directly to SQLite rows.
/// Distinct from the mira-auth repo records and mira-types API models
/// to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: String,
}

pub struct SecurityQuestionRow {
    pub id: String,
    pub user_id: String,
    pub question: String,
    pub answer_hash: String,
    pub salt: String,
    pub is_active: bool,
}

pub struct ChatRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub chat_id: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
}
