use async_trait::async_trait;
use chrono::Utc;
use diesel::{
    BoolExpressionMethods, Connection, ExpressionMethods, JoinOnDsl, OptionalExtension,
    PgTextExpressionMethods, QueryDsl, SelectableHelper, delete, dsl::exists, insert_into,
    result::{DatabaseErrorKind, Error as DieselError},
    select, update,
};
use diesel_async::{
    AsyncConnection, AsyncPgConnection, RunQueryDsl,
    async_connection_wrapper::AsyncConnectionWrapper,
    pooled_connection::{
        AsyncDieselConnectionManager,
        deadpool::{Object, Pool},
    },
    scoped_futures::ScopedFutureExt,
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use log::{debug, info};
use uuid::Uuid;

use super::{SearchFilter, Store};
use crate::{
    error::Error,
    objects::{Account, FriendRequest, Page, PendingRequest, Profile, User},
    schema::{accounts, friend_requests, friendships, session_tokens, users},
};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub type Conn = Object<AsyncPgConnection>;

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<AsyncPgConnection>,
}

impl PgStore {
    pub async fn connect(url: String) -> Result<Self, Error> {
        run_migrations(url.clone()).await?;

        let pool_config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(url);
        let pool = Pool::builder(pool_config).build()?;

        Ok(Self { pool })
    }
}

async fn run_migrations(url: String) -> Result<(), Error> {
    // The harness is synchronous, keep it off the runtime threads
    tokio::task::spawn_blocking(move || {
        let mut conn =
            <AsyncConnectionWrapper<AsyncPgConnection> as Connection>::establish(&url)?;

        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| Error::MigrationError(e.to_string()))?;

        info!("applied {} pending migrations", applied.len());

        Ok::<(), Error>(())
    })
    .await?
}

/// Writes both directions of the friendship, the only place the relation is mutated
async fn link_friends(conn: &mut Conn, account_id: i64, friend_id: i64) -> Result<(), Error> {
    let since = Utc::now();

    use friendships::dsl;
    insert_into(friendships::table)
        .values(vec![
            (
                dsl::account_id.eq(account_id),
                dsl::friend_id.eq(friend_id),
                dsl::since.eq(since),
            ),
            (
                dsl::account_id.eq(friend_id),
                dsl::friend_id.eq(account_id),
                dsl::since.eq(since),
            ),
        ])
        .on_conflict_do_nothing()
        .execute(conn)
        .await?;

    Ok(())
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl Store for PgStore {
    async fn username_taken(&self, username: &str) -> Result<bool, Error> {
        let mut conn = self.pool.get().await?;

        use users::dsl;
        let taken = select(exists(dsl::users.filter(dsl::username.eq(username))))
            .get_result(&mut conn)
            .await?;

        Ok(taken)
    }

    async fn email_taken(&self, email: &str) -> Result<bool, Error> {
        let mut conn = self.pool.get().await?;

        use users::dsl;
        let taken = select(exists(dsl::users.filter(dsl::email.eq(email))))
            .get_result(&mut conn)
            .await?;

        Ok(taken)
    }

    async fn create_user(&self, user: User) -> Result<Account, Error> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, Error, _>(|conn| {
            async move {
                insert_into(users::table)
                    .values(&user)
                    .execute(conn)
                    .await?;

                let account = insert_into(accounts::table)
                    .values(accounts::user_uuid.eq(user.uuid))
                    .returning(Account::as_returning())
                    .get_result(conn)
                    .await?;

                Ok(account)
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| match error {
            Error::SqlError(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info))
                if info.constraint_name() == Some("users_email_key") =>
            {
                Error::BadRequest("Email already exists".to_string())
            }
            error => error,
        })
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let mut conn = self.pool.get().await?;

        use users::dsl;
        let user = dsl::users
            .filter(dsl::email.eq(email))
            .select(User::as_select())
            .get_result(&mut conn)
            .await
            .optional()?;

        Ok(user)
    }

    async fn profile(&self, account_id: i64) -> Result<Option<Profile>, Error> {
        let mut conn = self.pool.get().await?;

        let profile = accounts::table
            .inner_join(users::table)
            .filter(accounts::id.eq(account_id))
            .select((
                accounts::id,
                users::first_name,
                users::last_name,
                users::email,
            ))
            .get_result(&mut conn)
            .await
            .optional()?;

        Ok(profile)
    }

    async fn session_token(&self, user_uuid: Uuid, candidate: String) -> Result<String, Error> {
        let mut conn = self.pool.get().await?;

        use session_tokens::dsl;
        let inserted = insert_into(session_tokens::table)
            .values((
                dsl::token.eq(&candidate),
                dsl::user_uuid.eq(user_uuid),
                dsl::created_at.eq(Utc::now()),
            ))
            .on_conflict(dsl::user_uuid)
            .do_nothing()
            .execute(&mut conn)
            .await?;

        if inserted == 1 {
            debug!("issued new session token for {user_uuid}");
            return Ok(candidate);
        }

        let token = dsl::session_tokens
            .filter(dsl::user_uuid.eq(user_uuid))
            .select(dsl::token)
            .get_result(&mut conn)
            .await?;

        Ok(token)
    }

    async fn account_by_token(&self, token: &str) -> Result<Option<Account>, Error> {
        let mut conn = self.pool.get().await?;

        let account = session_tokens::table
            .inner_join(accounts::table.on(accounts::user_uuid.eq(session_tokens::user_uuid)))
            .filter(session_tokens::token.eq(token))
            .select(Account::as_select())
            .get_result(&mut conn)
            .await
            .optional()?;

        Ok(account)
    }

    async fn delete_session_token(&self, token: &str) -> Result<(), Error> {
        let mut conn = self.pool.get().await?;

        use session_tokens::dsl;
        delete(session_tokens::table)
            .filter(dsl::token.eq(token))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn search_accounts(
        &self,
        exclude: i64,
        filter: &SearchFilter,
        page: Page,
    ) -> Result<Vec<Profile>, Error> {
        let mut conn = self.pool.get().await?;

        let mut query = accounts::table
            .inner_join(users::table)
            .filter(accounts::id.ne(exclude))
            .select((
                accounts::id,
                users::first_name,
                users::last_name,
                users::email,
            ))
            .into_boxed();

        match filter {
            SearchFilter::All => {}
            SearchFilter::Email(email) => {
                query = query.filter(users::email.eq(email.clone()));
            }
            SearchFilter::Name(term) => {
                let pattern = format!("%{}%", escape_like(term));
                query = query.filter(
                    users::first_name
                        .ilike(pattern.clone())
                        .or(users::last_name.ilike(pattern)),
                );
            }
        }

        let profiles = query
            .order(accounts::id.asc())
            .limit(page.size)
            .offset(page.offset())
            .load(&mut conn)
            .await?;

        Ok(profiles)
    }

    async fn are_friends(&self, account_id: i64, other_id: i64) -> Result<bool, Error> {
        let mut conn = self.pool.get().await?;

        use friendships::dsl;
        let friends = select(exists(
            dsl::friendships
                .filter(dsl::account_id.eq(account_id))
                .filter(dsl::friend_id.eq(other_id)),
        ))
        .get_result(&mut conn)
        .await?;

        Ok(friends)
    }

    async fn unresolved_request(
        &self,
        sender: i64,
        receiver: i64,
    ) -> Result<Option<FriendRequest>, Error> {
        let mut conn = self.pool.get().await?;

        use friend_requests::dsl;
        let request = dsl::friend_requests
            .filter(dsl::sender.eq(sender))
            .filter(dsl::receiver.eq(receiver))
            .filter(dsl::accepted.eq(false))
            .select(FriendRequest::as_select())
            .get_result(&mut conn)
            .await
            .optional()?;

        Ok(request)
    }

    async fn insert_friend_request(
        &self,
        sender: i64,
        receiver: i64,
    ) -> Result<Option<FriendRequest>, Error> {
        let mut conn = self.pool.get().await?;

        // friend_requests_unresolved_pair turns a duplicate into a no-op
        use friend_requests::dsl;
        let request = insert_into(friend_requests::table)
            .values((
                dsl::sender.eq(sender),
                dsl::receiver.eq(receiver),
                dsl::created_at.eq(Utc::now()),
            ))
            .on_conflict_do_nothing()
            .returning(FriendRequest::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?;

        Ok(request)
    }

    async fn accept_friend_request(
        &self,
        id: i64,
        receiver: i64,
    ) -> Result<Option<FriendRequest>, Error> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, Error, _>(|conn| {
            async move {
                use friend_requests::dsl;
                let request: Option<FriendRequest> = update(friend_requests::table)
                    .filter(dsl::id.eq(id))
                    .filter(dsl::receiver.eq(receiver))
                    .filter(dsl::accepted.eq(false))
                    .set(dsl::accepted.eq(true))
                    .returning(FriendRequest::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;

                if let Some(request) = &request {
                    link_friends(conn, request.sender, request.receiver).await?;
                }

                Ok(request)
            }
            .scope_boxed()
        })
        .await
    }

    async fn delete_friend_request(&self, id: i64, receiver: i64) -> Result<bool, Error> {
        let mut conn = self.pool.get().await?;

        use friend_requests::dsl;
        let deleted = delete(friend_requests::table)
            .filter(dsl::id.eq(id))
            .filter(dsl::receiver.eq(receiver))
            .filter(dsl::accepted.eq(false))
            .execute(&mut conn)
            .await?;

        Ok(deleted > 0)
    }

    async fn pending_requests(
        &self,
        receiver: i64,
        page: Page,
    ) -> Result<Vec<PendingRequest>, Error> {
        let mut conn = self.pool.get().await?;

        let requests = friend_requests::table
            .inner_join(accounts::table.on(accounts::id.eq(friend_requests::sender)))
            .inner_join(users::table.on(users::uuid.eq(accounts::user_uuid)))
            .filter(friend_requests::receiver.eq(receiver))
            .filter(friend_requests::accepted.eq(false))
            .select((
                friend_requests::id,
                users::first_name,
                users::last_name,
                users::email,
            ))
            .order((friend_requests::created_at.asc(), friend_requests::id.asc()))
            .limit(page.size)
            .offset(page.offset())
            .load(&mut conn)
            .await?;

        Ok(requests)
    }

    async fn friends(&self, account_id: i64, page: Page) -> Result<Vec<Profile>, Error> {
        let mut conn = self.pool.get().await?;

        let profiles = friendships::table
            .inner_join(accounts::table.on(accounts::id.eq(friendships::friend_id)))
            .inner_join(users::table.on(users::uuid.eq(accounts::user_uuid)))
            .filter(friendships::account_id.eq(account_id))
            .select((
                accounts::id,
                users::first_name,
                users::last_name,
                users::email,
            ))
            .order(accounts::id.asc())
            .limit(page.size)
            .offset(page.offset())
            .load(&mut conn)
            .await?;

        Ok(profiles)
    }
}
