use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::UserConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CreateUserError {
    EmailTaken,
}

/// Account storage collaborator. Emails are matched case-insensitively.
pub trait UserRepository: Send + Sync {
    fn find_by_email(&self, email: &str) -> Option<UserRecord>;
    fn create(&self, user: NewUser) -> Result<UserRecord, CreateUserError>;
}

#[derive(Default)]
pub struct InMemoryUsers {
    by_email: DashMap<String, UserRecord>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store from `[[users]]` entries. Later duplicates are skipped.
    pub fn from_config(users: &[UserConfig]) -> Self {
        let store = Self::new();
        for user in users {
            let created = store.create(NewUser {
                email: user.email.clone(),
                name: user.name.clone(),
                password_hash: user.password_hash.clone(),
            });
            match created {
                Ok(record) => tracing::info!("Seeded user {}", record.email),
                Err(CreateUserError::EmailTaken) => {
                    tracing::warn!("Skipping duplicate seeded user {}", user.email)
                }
            }
        }
        tracing::debug!("User store holds {} accounts", store.by_email.len());
        store
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl UserRepository for InMemoryUsers {
    fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        self.by_email
            .get(&normalize_email(email))
            .map(|r| r.clone())
    }

    fn create(&self, user: NewUser) -> Result<UserRecord, CreateUserError> {
        let email = normalize_email(&user.email);
        match self.by_email.entry(email.clone()) {
            Entry::Occupied(_) => Err(CreateUserError::EmailTaken),
            Entry::Vacant(slot) => {
                let record = UserRecord {
                    id: uuid::Uuid::new_v4().to_string(),
                    email,
                    name: user.name,
                    password_hash: user.password_hash,
                    avatar_url: None,
                };
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }
}
