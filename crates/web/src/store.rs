use std::error;
use std::fmt;

use async_trait::async_trait;
use itertools::Itertools;
use jogging::recorder::{JogRecorder, RecordError};
use model::{account::Account, jog::JogRecord, WithId};
use serde::Deserialize;
use tokio::sync::RwLock;
use utility::id::Id;

/// How many records `recent_jogs` returns.
pub const RECENT_JOGS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    PasswordMismatch,
    UsernameTaken(String),
}

impl error::Error for StoreError {}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::PasswordMismatch => write!(f, "Passwords do not match."),
            StoreError::UsernameTaken(name) => write!(f, "Username '{name}' is taken."),
        }
    }
}

/// Account registration form; `repword` repeats the password.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub uname: String,
    pub pword: String,
    pub repword: String,
    pub email: String,
    pub fname: String,
    pub lname: String,
}

impl Registration {
    fn into_account(self) -> Result<Account, StoreError> {
        if self.pword != self.repword {
            return Err(StoreError::PasswordMismatch);
        }
        Ok(Account {
            username: self.uname,
            password: self.pword,
            email: self.email,
            forename: self.fname,
            surname: self.lname,
        })
    }
}

/// Accounts and finished jogs, kept in memory for the lifetime of the
/// server.
#[derive(Default)]
pub struct MemoryStore {
    accounts: RwLock<Vec<WithId<Account>>>,
    jogs: RwLock<Vec<JogRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, registration: Registration) -> Result<Id<Account>, StoreError> {
        let account = registration.into_account()?;

        let mut accounts = self.accounts.write().await;
        if accounts
            .iter()
            .any(|existing| existing.content.username == account.username)
        {
            return Err(StoreError::UsernameTaken(account.username));
        }

        let id = Id::new(accounts.len() as u64 + 1);
        log::info!("registered account {} as '{}'", id, account.username);
        accounts.push(WithId::new(id, account));
        Ok(id)
    }

    pub async fn login(&self, username: &str, password: &str) -> Option<Id<Account>> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|account| account.content.matches(username, password))
            .map(|account| account.id)
    }

    pub async fn accounts(&self) -> Vec<WithId<Account>> {
        self.accounts.read().await.clone()
    }

    pub async fn add_jog(&self, record: JogRecord) {
        log::debug!("storing jog {} of user {}", record.jog_id, record.user_id);
        self.jogs.write().await.push(record);
    }

    pub async fn jogs(&self) -> Vec<JogRecord> {
        self.jogs.read().await.clone()
    }

    /// The last `RECENT_JOGS` records of a user, oldest first.
    pub async fn recent_jogs(&self, user_id: Id<Account>) -> Vec<JogRecord> {
        let jogs = self
            .jogs
            .read()
            .await
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect_vec();
        let skip = jogs.len().saturating_sub(RECENT_JOGS);
        jogs.into_iter().skip(skip).collect()
    }
}

#[async_trait]
impl JogRecorder for MemoryStore {
    async fn record(&self, record: JogRecord) -> Result<(), RecordError> {
        self.add_jog(record).await;
        Ok(())
    }
}
