use diesel::{Queryable, Selectable};
use serde::Serialize;
use uuid::Uuid;

use crate::schema::accounts;

/// Profile record paired 1:1 with a [`User`](super::User), owner of the friend relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Account {
    pub id: i64,
    pub user_uuid: Uuid,
}

/// Public view of an account, as returned by search and friend listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Queryable)]
pub struct Profile {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
