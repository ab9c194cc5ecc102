use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{SearchFilter, Store};
use crate::{
    error::Error,
    objects::{Account, FriendRequest, Page, PendingRequest, Profile, User},
};

/// Process-local tables. Every operation runs under one lock, which makes each
/// of them atomic the way a transaction would.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    accounts: BTreeMap<i64, Account>,
    /// Adjacency pairs, always present in both directions
    friendships: BTreeSet<(i64, i64)>,
    friend_requests: BTreeMap<i64, FriendRequest>,
    session_tokens: HashMap<String, Uuid>,
    last_account_id: i64,
    last_request_id: i64,
}

impl Tables {
    fn profile(&self, account_id: i64) -> Option<Profile> {
        let account = self.accounts.get(&account_id)?;
        let user = self.users.get(&account.user_uuid)?;

        Some(Profile {
            user_id: account.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        })
    }

    fn link_friends(&mut self, account_id: i64, friend_id: i64) {
        self.friendships.insert((account_id, friend_id));
        self.friendships.insert((friend_id, account_id));
    }

    fn has_unresolved_between(&self, a: i64, b: i64) -> bool {
        self.friend_requests.values().any(|r| {
            !r.accepted
                && ((r.sender == a && r.receiver == b) || (r.sender == b && r.receiver == a))
        })
    }
}

fn paginate<T>(items: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    items
        .skip(page.offset() as usize)
        .take(page.size as usize)
        .collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub fn user_count(&self) -> usize {
        self.tables().users.len()
    }

    #[cfg(test)]
    pub fn account_count(&self) -> usize {
        self.tables().accounts.len()
    }

    #[cfg(test)]
    pub fn friend_request(&self, id: i64) -> Option<FriendRequest> {
        self.tables().friend_requests.get(&id).cloned()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn username_taken(&self, username: &str) -> Result<bool, Error> {
        Ok(self.tables().users.values().any(|u| u.username == username))
    }

    async fn email_taken(&self, email: &str) -> Result<bool, Error> {
        Ok(self.tables().users.values().any(|u| u.email == email))
    }

    async fn create_user(&self, user: User) -> Result<Account, Error> {
        let mut tables = self.tables();

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(Error::BadRequest("Email already exists".to_string()));
        }

        tables.last_account_id += 1;
        let account = Account {
            id: tables.last_account_id,
            user_uuid: user.uuid,
        };

        tables.accounts.insert(account.id, account);
        tables.users.insert(user.uuid, user);

        Ok(account)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn profile(&self, account_id: i64) -> Result<Option<Profile>, Error> {
        Ok(self.tables().profile(account_id))
    }

    async fn session_token(&self, user_uuid: Uuid, candidate: String) -> Result<String, Error> {
        let mut tables = self.tables();

        if let Some((token, _)) = tables
            .session_tokens
            .iter()
            .find(|(_, owner)| **owner == user_uuid)
        {
            return Ok(token.clone());
        }

        tables.session_tokens.insert(candidate.clone(), user_uuid);

        Ok(candidate)
    }

    async fn account_by_token(&self, token: &str) -> Result<Option<Account>, Error> {
        let tables = self.tables();

        let Some(user_uuid) = tables.session_tokens.get(token) else {
            return Ok(None);
        };

        Ok(tables
            .accounts
            .values()
            .find(|a| a.user_uuid == *user_uuid)
            .copied())
    }

    async fn delete_session_token(&self, token: &str) -> Result<(), Error> {
        self.tables().session_tokens.remove(token);

        Ok(())
    }

    async fn search_accounts(
        &self,
        exclude: i64,
        filter: &SearchFilter,
        page: Page,
    ) -> Result<Vec<Profile>, Error> {
        let tables = self.tables();

        let needle = match filter {
            SearchFilter::Name(term) => term.to_lowercase(),
            _ => String::new(),
        };

        let matches = tables
            .accounts
            .keys()
            .filter(|id| **id != exclude)
            .filter_map(|id| tables.profile(*id))
            .filter(|p| match filter {
                SearchFilter::All => true,
                SearchFilter::Email(email) => p.email == *email,
                SearchFilter::Name(_) => {
                    p.first_name.to_lowercase().contains(&needle)
                        || p.last_name.to_lowercase().contains(&needle)
                }
            });

        Ok(paginate(matches, page))
    }

    async fn are_friends(&self, account_id: i64, other_id: i64) -> Result<bool, Error> {
        Ok(self.tables().friendships.contains(&(account_id, other_id)))
    }

    async fn unresolved_request(
        &self,
        sender: i64,
        receiver: i64,
    ) -> Result<Option<FriendRequest>, Error> {
        Ok(self
            .tables()
            .friend_requests
            .values()
            .find(|r| !r.accepted && r.sender == sender && r.receiver == receiver)
            .cloned())
    }

    async fn insert_friend_request(
        &self,
        sender: i64,
        receiver: i64,
    ) -> Result<Option<FriendRequest>, Error> {
        let mut tables = self.tables();

        if tables.has_unresolved_between(sender, receiver) {
            return Ok(None);
        }

        tables.last_request_id += 1;
        let request = FriendRequest {
            id: tables.last_request_id,
            sender,
            receiver,
            accepted: false,
            created_at: Utc::now(),
        };

        tables.friend_requests.insert(request.id, request.clone());

        Ok(Some(request))
    }

    async fn accept_friend_request(
        &self,
        id: i64,
        receiver: i64,
    ) -> Result<Option<FriendRequest>, Error> {
        let mut tables = self.tables();

        let Some(request) = tables
            .friend_requests
            .get_mut(&id)
            .filter(|r| r.receiver == receiver && !r.accepted)
        else {
            return Ok(None);
        };

        request.accepted = true;
        let request = request.clone();

        tables.link_friends(request.sender, request.receiver);

        Ok(Some(request))
    }

    async fn delete_friend_request(&self, id: i64, receiver: i64) -> Result<bool, Error> {
        let mut tables = self.tables();

        let reachable = tables
            .friend_requests
            .get(&id)
            .is_some_and(|r| r.receiver == receiver && !r.accepted);

        if reachable {
            tables.friend_requests.remove(&id);
        }

        Ok(reachable)
    }

    async fn pending_requests(
        &self,
        receiver: i64,
        page: Page,
    ) -> Result<Vec<PendingRequest>, Error> {
        let tables = self.tables();

        let mut unresolved: Vec<&FriendRequest> = tables
            .friend_requests
            .values()
            .filter(|r| r.receiver == receiver && !r.accepted)
            .collect();
        unresolved.sort_by_key(|r| (r.created_at, r.id));

        let pending = unresolved.into_iter().filter_map(|r| {
            tables.profile(r.sender).map(|sender| PendingRequest {
                friend_request_id: r.id,
                first_name: sender.first_name,
                last_name: sender.last_name,
                email: sender.email,
            })
        });

        Ok(paginate(pending, page))
    }

    async fn friends(&self, account_id: i64, page: Page) -> Result<Vec<Profile>, Error> {
        let tables = self.tables();

        let friends = tables
            .friendships
            .range((account_id, i64::MIN)..=(account_id, i64::MAX))
            .filter_map(|(_, friend_id)| tables.profile(*friend_id));

        Ok(paginate(friends, page))
    }
}
