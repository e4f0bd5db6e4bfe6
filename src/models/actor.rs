//! Acting principals
//!
//! An [`Actor`] is the authenticated principal handed to the façade and the
//! capture layer by calling code; an [`ActorRef`] is the denormalized slice
//! of it that gets stored on each record.

use serde::{Deserialize, Serialize};

use super::ids::ActorId;

/// The authenticated principal performing an audited action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub email: String,
    pub username: String,
}

impl Actor {
    pub fn new(id: ActorId, email: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            username: username.into(),
        }
    }

    /// The reference slice persisted on records
    pub fn reference(&self) -> ActorRef {
        ActorRef {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
        }
    }
}

/// Denormalized actor reference stored on an audit record
///
/// Kept even after the principal is deleted upstream; the store's
/// `detach_actor` nulls the whole reference in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRef {
    pub id: ActorId,
    pub email: String,
    pub username: String,
}
