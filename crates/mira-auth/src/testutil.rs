//! In-memory store double for service tests. Mirrors the real store's
//! contracts: case-insensitive email uniqueness, atomic rotation,
//! history retention.

use std::sync::Mutex;

use uuid::Uuid;

use crate::error::{PersistenceError, UserInsertError};
use crate::repo::{QuestionRecord, QuestionRepo, UserRecord, UserRepo};

pub struct MemoryStore {
    users: Mutex<Vec<UserRecord>>,
    /// (record, is_active) — inactive rows are kept as history
    questions: Mutex<Vec<(QuestionRecord, bool)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn seed_user(&self, email: &str, name: &str, password_hash: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.users.lock().unwrap().push(UserRecord {
            id,
            email: email.to_string(),
            name: name.to_string(),
            password_hash: password_hash.to_string(),
        });
        id
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn password_hash_of(&self, id: Uuid) -> String {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.password_hash.clone())
            .unwrap_or_default()
    }

    pub fn active_question_count(&self, user_id: Uuid) -> usize {
        self.questions
            .lock()
            .unwrap()
            .iter()
            .filter(|(q, active)| q.user_id == user_id && *active)
            .count()
    }
}

impl UserRepo for MemoryStore {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, PersistenceError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, PersistenceError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    fn insert(&self, user: &UserRecord) -> Result<(), UserInsertError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(UserInsertError::DuplicateEmail);
        }
        users.push(user.clone());
        Ok(())
    }

    fn update_profile(&self, id: Uuid, name: &str, email: &str) -> Result<(), PersistenceError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.name = name.to_string();
            user.email = email.to_string();
        }
        Ok(())
    }

    fn update_password_hash(&self, id: Uuid, hash: &str) -> Result<(), PersistenceError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.password_hash = hash.to_string();
        }
        Ok(())
    }

    fn delete(&self, id: Uuid) -> Result<(), PersistenceError> {
        self.users.lock().unwrap().retain(|u| u.id != id);
        Ok(())
    }
}

impl QuestionRepo for MemoryStore {
    fn replace_active(&self, record: &QuestionRecord) -> Result<(), PersistenceError> {
        let mut questions = self.questions.lock().unwrap();
        for (q, active) in questions.iter_mut() {
            if q.user_id == record.user_id {
                *active = false;
            }
        }
        questions.push((record.clone(), true));
        Ok(())
    }

    fn find_active(&self, user_id: Uuid) -> Result<Option<QuestionRecord>, PersistenceError> {
        Ok(self
            .questions
            .lock()
            .unwrap()
            .iter()
            .find(|(q, active)| q.user_id == user_id && *active)
            .map(|(q, _)| q.clone()))
    }

    fn delete_all(&self, user_id: Uuid) -> Result<(), PersistenceError> {
        self.questions.lock().unwrap().retain(|(q, _)| q.user_id != user_id);
        Ok(())
    }
}
