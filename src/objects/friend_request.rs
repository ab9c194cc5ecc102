use chrono::{DateTime, Utc};
use diesel::{Queryable, Selectable};
use serde::Serialize;

use crate::schema::friend_requests;

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = friend_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FriendRequest {
    pub id: i64,
    pub sender: i64,
    pub receiver: i64,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
}

/// An unresolved request as shown to its receiver, described by the sender's details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Queryable)]
pub struct PendingRequest {
    pub friend_request_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}
