//! Repository functions over the persistent tables
//!
//! Services only ever talk to an `Arc<dyn Store>`, so the same code runs on
//! PostgreSQL in production and on [`MemoryStore`] in tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::Error,
    objects::{Account, FriendRequest, Page, PendingRequest, Profile, User},
};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// How the directory narrows its listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    All,
    /// Exact email match
    Email(String),
    /// Case-insensitive substring of first or last name
    Name(String),
}

impl SearchFilter {
    pub fn from_term(term: Option<&str>) -> Self {
        match term {
            None | Some("") => SearchFilter::All,
            Some(term) if term.contains('@') => SearchFilter::Email(term.to_string()),
            Some(term) => SearchFilter::Name(term.to_string()),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn username_taken(&self, username: &str) -> Result<bool, Error>;

    async fn email_taken(&self, email: &str) -> Result<bool, Error>;

    /// Inserts the user together with its paired account.
    ///
    /// Fails with `BadRequest("Email already exists")` when the email is claimed concurrently.
    async fn create_user(&self, user: User) -> Result<Account, Error>;

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, Error>;

    async fn profile(&self, account_id: i64) -> Result<Option<Profile>, Error>;

    /// Returns the user's existing token, or stores `candidate` as the new one
    async fn session_token(&self, user_uuid: Uuid, candidate: String) -> Result<String, Error>;

    async fn account_by_token(&self, token: &str) -> Result<Option<Account>, Error>;

    async fn delete_session_token(&self, token: &str) -> Result<(), Error>;

    /// Accounts other than `exclude` matching `filter`, ordered by id
    async fn search_accounts(
        &self,
        exclude: i64,
        filter: &SearchFilter,
        page: Page,
    ) -> Result<Vec<Profile>, Error>;

    async fn are_friends(&self, account_id: i64, other_id: i64) -> Result<bool, Error>;

    async fn unresolved_request(
        &self,
        sender: i64,
        receiver: i64,
    ) -> Result<Option<FriendRequest>, Error>;

    /// Atomically creates an unresolved request.
    ///
    /// Returns `None` when an unresolved request already exists between the two
    /// accounts in either direction.
    async fn insert_friend_request(
        &self,
        sender: i64,
        receiver: i64,
    ) -> Result<Option<FriendRequest>, Error>;

    /// Marks the unresolved request `id` addressed to `receiver` as accepted and
    /// links both accounts as friends, in one step.
    async fn accept_friend_request(
        &self,
        id: i64,
        receiver: i64,
    ) -> Result<Option<FriendRequest>, Error>;

    /// Deletes the unresolved request `id` addressed to `receiver`
    async fn delete_friend_request(&self, id: i64, receiver: i64) -> Result<bool, Error>;

    /// Unresolved requests addressed to `receiver`, oldest first
    async fn pending_requests(
        &self,
        receiver: i64,
        page: Page,
    ) -> Result<Vec<PendingRequest>, Error>;

    async fn friends(&self, account_id: i64, page: Page) -> Result<Vec<Profile>, Error>;
}
