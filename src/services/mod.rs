//! Application logic, one module per service. Every function works against an
//! injected [`Store`](crate::store::Store) handle.

pub mod directory;
pub mod friend_requests;
pub mod registration;
pub mod session;
