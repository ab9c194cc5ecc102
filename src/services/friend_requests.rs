//! Friend request lifecycle: `none -> pending -> accepted | rejected`.
//!
//! Accepting keeps the record with its flag set and links both accounts as
//! friends. Rejecting deletes the record outright.

use log::info;

use crate::{
    error::Error,
    objects::{Account, FriendRequest, Page, PendingRequest, Profile},
    store::Store,
};

fn request_not_found() -> Error {
    Error::NotFound("Friend request not found.".to_string())
}

/// Fails when an unresolved request already links the two accounts
async fn check_pending(store: &dyn Store, caller: &Account, target: &Profile) -> Result<(), Error> {
    if store
        .unresolved_request(target.user_id, caller.id)
        .await?
        .is_some()
    {
        return Err(Error::BadRequest(format!(
            "{} is awaiting your acceptance of their friend request.",
            target.full_name()
        )));
    }

    if store
        .unresolved_request(caller.id, target.user_id)
        .await?
        .is_some()
    {
        return Err(Error::BadRequest("Request already sent.".to_string()));
    }

    Ok(())
}

pub async fn send(
    store: &dyn Store,
    caller: &Account,
    target_id: i64,
) -> Result<FriendRequest, Error> {
    let target = store
        .profile(target_id)
        .await?
        .ok_or(Error::NotFound("User not found.".to_string()))?;

    if target.user_id == caller.id {
        return Err(Error::BadRequest(
            "You can't send a friend request to yourself.".to_string(),
        ));
    }

    if store.are_friends(caller.id, target.user_id).await? {
        return Err(Error::BadRequest(format!(
            "{} is already in your friends list.",
            target.full_name()
        )));
    }

    check_pending(store, caller, &target).await?;

    match store.insert_friend_request(caller.id, target.user_id).await? {
        Some(request) => {
            info!(
                "friend request {} sent from {} to {}",
                request.id, request.sender, request.receiver
            );
            Ok(request)
        }
        None => {
            // Someone created one between the check and the insert
            check_pending(store, caller, &target).await?;
            Err(Error::BadRequest("Request already sent.".to_string()))
        }
    }
}

/// Accepts an unresolved request addressed to the caller
pub async fn accept(store: &dyn Store, caller: &Account, id: i64) -> Result<FriendRequest, Error> {
    let request = store
        .accept_friend_request(id, caller.id)
        .await?
        .ok_or_else(request_not_found)?;

    info!(
        "friend request {} accepted, {} and {} are now friends",
        request.id, request.sender, request.receiver
    );

    Ok(request)
}

/// Permanently deletes an unresolved request addressed to the caller
pub async fn reject(store: &dyn Store, caller: &Account, id: i64) -> Result<(), Error> {
    if !store.delete_friend_request(id, caller.id).await? {
        return Err(request_not_found());
    }

    info!("friend request {id} rejected");

    Ok(())
}

pub async fn list_pending(
    store: &dyn Store,
    caller: &Account,
    page: Page,
) -> Result<Vec<PendingRequest>, Error> {
    let pending = store.pending_requests(caller.id, page).await?;

    page.check(pending)
}

pub async fn list_friends(
    store: &dyn Store,
    caller: &Account,
    page: Page,
) -> Result<Vec<Profile>, Error> {
    let friends = store.friends(caller.id, page).await?;

    page.check(friends)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::{
        objects::{MAX_PAGE_SIZE, PageQuery, User},
        services::testing::signed_up,
        store::{MemoryStore, SearchFilter},
    };

    /// Lets the other side send its request right before ours is inserted
    struct CrossingStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl Store for CrossingStore {
        async fn username_taken(&self, username: &str) -> Result<bool, Error> {
            self.inner.username_taken(username).await
        }

        async fn email_taken(&self, email: &str) -> Result<bool, Error> {
            self.inner.email_taken(email).await
        }

        async fn create_user(&self, user: User) -> Result<Account, Error> {
            self.inner.create_user(user).await
        }

        async fn user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
            self.inner.user_by_email(email).await
        }

        async fn profile(&self, account_id: i64) -> Result<Option<Profile>, Error> {
            self.inner.profile(account_id).await
        }

        async fn session_token(&self, user_uuid: Uuid, candidate: String) -> Result<String, Error> {
            self.inner.session_token(user_uuid, candidate).await
        }

        async fn account_by_token(&self, token: &str) -> Result<Option<Account>, Error> {
            self.inner.account_by_token(token).await
        }

        async fn delete_session_token(&self, token: &str) -> Result<(), Error> {
            self.inner.delete_session_token(token).await
        }

        async fn search_accounts(
            &self,
            exclude: i64,
            filter: &SearchFilter,
            page: Page,
        ) -> Result<Vec<Profile>, Error> {
            self.inner.search_accounts(exclude, filter, page).await
        }

        async fn are_friends(&self, account_id: i64, other_id: i64) -> Result<bool, Error> {
            self.inner.are_friends(account_id, other_id).await
        }

        async fn unresolved_request(
            &self,
            sender: i64,
            receiver: i64,
        ) -> Result<Option<FriendRequest>, Error> {
            self.inner.unresolved_request(sender, receiver).await
        }

        async fn insert_friend_request(
            &self,
            sender: i64,
            receiver: i64,
        ) -> Result<Option<FriendRequest>, Error> {
            self.inner.insert_friend_request(receiver, sender).await?;
            self.inner.insert_friend_request(sender, receiver).await
        }

        async fn accept_friend_request(
            &self,
            id: i64,
            receiver: i64,
        ) -> Result<Option<FriendRequest>, Error> {
            self.inner.accept_friend_request(id, receiver).await
        }

        async fn delete_friend_request(&self, id: i64, receiver: i64) -> Result<bool, Error> {
            self.inner.delete_friend_request(id, receiver).await
        }

        async fn pending_requests(
            &self,
            receiver: i64,
            page: Page,
        ) -> Result<Vec<PendingRequest>, Error> {
            self.inner.pending_requests(receiver, page).await
        }

        async fn friends(&self, account_id: i64, page: Page) -> Result<Vec<Profile>, Error> {
            self.inner.friends(account_id, page).await
        }
    }

    async fn two_users(store: &MemoryStore) -> (Account, Account) {
        let (john, _) = signed_up(store, "John", "Doe", "john@example.com").await;
        let (jane, _) = signed_up(store, "Jane", "Roe", "jane@example.com").await;
        (john, jane)
    }

    fn bad_request(result: Result<FriendRequest, Error>) -> String {
        match result {
            Err(Error::BadRequest(msg)) => msg,
            Err(other) => panic!("expected a validation error, got {other:?}"),
            Ok(request) => panic!("expected a validation error, got {request:?}"),
        }
    }

    #[tokio::test]
    async fn cannot_befriend_yourself() {
        let store = MemoryStore::new();
        let (john, _) = two_users(&store).await;

        let msg = bad_request(send(&store, &john, john.id).await);

        assert!(msg.contains("yourself"));
    }

    #[tokio::test]
    async fn unknown_target_is_not_found() {
        let store = MemoryStore::new();
        let (john, _) = two_users(&store).await;

        assert!(matches!(
            send(&store, &john, 999).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn reverse_request_while_pending_is_refused() {
        let store = MemoryStore::new();
        let (john, jane) = two_users(&store).await;

        let request = send(&store, &john, jane.id).await.unwrap();
        assert!(!request.accepted);

        let msg = bad_request(send(&store, &jane, john.id).await);
        assert_eq!(
            msg,
            "John Doe is awaiting your acceptance of their friend request."
        );

        let again = bad_request(send(&store, &john, jane.id).await);
        assert_eq!(again, "Request already sent.");

        let pending = list_pending(&store, &jane, Page::default()).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert!(list_pending(&store, &john, Page::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn simultaneous_crossing_sends_create_one_request() {
        let store = MemoryStore::new();
        let (john, jane) = two_users(&store).await;

        let (from_john, from_jane) =
            tokio::join!(send(&store, &john, jane.id), send(&store, &jane, john.id));

        assert_eq!(
            usize::from(from_john.is_ok()) + usize::from(from_jane.is_ok()),
            1
        );

        let to_jane = list_pending(&store, &jane, Page::default()).await.unwrap();
        let to_john = list_pending(&store, &john, Page::default()).await.unwrap();
        assert_eq!(to_jane.len() + to_john.len(), 1);
    }

    #[tokio::test]
    async fn request_lost_to_a_crossing_one_reports_it() {
        let store = CrossingStore {
            inner: MemoryStore::new(),
        };
        let (john, _) = signed_up(&store, "John", "Doe", "john@example.com").await;
        let (jane, _) = signed_up(&store, "Jane", "Roe", "jane@example.com").await;

        let msg = bad_request(send(&store, &john, jane.id).await);
        assert_eq!(
            msg,
            "Jane Roe is awaiting your acceptance of their friend request."
        );

        let to_john = list_pending(&store, &john, Page::default()).await.unwrap();
        let to_jane = list_pending(&store, &jane, Page::default()).await.unwrap();
        assert_eq!(to_john.len(), 1);
        assert!(to_jane.is_empty());
    }

    #[tokio::test]
    async fn accepting_links_both_sides() {
        let store = MemoryStore::new();
        let (john, jane) = two_users(&store).await;

        let request = send(&store, &john, jane.id).await.unwrap();
        let accepted = accept(&store, &jane, request.id).await.unwrap();

        assert!(accepted.accepted);
        assert!(store.friend_request(request.id).unwrap().accepted);
        assert!(store.are_friends(john.id, jane.id).await.unwrap());
        assert!(store.are_friends(jane.id, john.id).await.unwrap());

        let johns = list_friends(&store, &john, Page::default()).await.unwrap();
        let janes = list_friends(&store, &jane, Page::default()).await.unwrap();
        assert_eq!(johns[0].user_id, jane.id);
        assert_eq!(janes[0].user_id, john.id);

        let msg = bad_request(send(&store, &jane, john.id).await);
        assert_eq!(msg, "John Doe is already in your friends list.");
        assert!(list_pending(&store, &jane, Page::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn only_the_receiver_can_accept() {
        let store = MemoryStore::new();
        let (john, jane) = two_users(&store).await;

        let request = send(&store, &john, jane.id).await.unwrap();

        assert!(matches!(
            accept(&store, &john, request.id).await,
            Err(Error::NotFound(_))
        ));
        assert!(!store.are_friends(john.id, jane.id).await.unwrap());
    }

    #[tokio::test]
    async fn accepting_twice_is_not_found() {
        let store = MemoryStore::new();
        let (john, jane) = two_users(&store).await;

        let request = send(&store, &john, jane.id).await.unwrap();
        accept(&store, &jane, request.id).await.unwrap();

        assert!(matches!(
            accept(&store, &jane, request.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rejecting_deletes_the_request() {
        let store = MemoryStore::new();
        let (john, jane) = two_users(&store).await;

        let request = send(&store, &john, jane.id).await.unwrap();
        reject(&store, &jane, request.id).await.unwrap();

        assert!(store.friend_request(request.id).is_none());
        assert!(matches!(
            accept(&store, &jane, request.id).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            reject(&store, &jane, request.id).await,
            Err(Error::NotFound(_))
        ));
        assert!(!store.are_friends(john.id, jane.id).await.unwrap());

        // Nothing left behind, so the pair can start over
        send(&store, &jane, john.id).await.unwrap();
    }

    #[tokio::test]
    async fn listings_never_exceed_page_size() {
        let store = MemoryStore::new();
        let (target, _) = signed_up(&store, "Target", "User", "target@example.com").await;

        for i in 0..12u8 {
            let letter = (b'a' + i) as char;
            let (sender, _) = signed_up(
                &store,
                &format!("Sender{letter}"),
                "User",
                &format!("sender{i}@example.com"),
            )
            .await;
            let request = send(&store, &sender, target.id).await.unwrap();
            if i % 2 == 0 {
                accept(&store, &target, request.id).await.unwrap();
            }
        }

        let page = Page::from_query(&PageQuery {
            page: None,
            page_size: Some(100),
        })
        .unwrap();

        let pending = list_pending(&store, &target, page).await.unwrap();
        let friends = list_friends(&store, &target, page).await.unwrap();

        assert_eq!(pending.len(), 6);
        assert_eq!(friends.len(), 6);

        let all_pending_page = Page { number: 1, size: MAX_PAGE_SIZE };
        for i in 12..24u8 {
            let letter = (b'a' + i) as char;
            let (sender, _) = signed_up(
                &store,
                &format!("Late{letter}"),
                "User",
                &format!("late{i}@example.com"),
            )
            .await;
            send(&store, &sender, target.id).await.unwrap();
        }

        let first = list_pending(&store, &target, all_pending_page).await.unwrap();
        let second = list_pending(&store, &target, Page { number: 2, size: MAX_PAGE_SIZE })
            .await
            .unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(second.len(), 8);
    }
}
