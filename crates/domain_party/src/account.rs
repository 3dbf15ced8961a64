//! Account standing and acting roles
//!
//! The engine does not own user records. It only asks the identity service
//! whether an account may currently act, and it needs to know in which
//! capacity (client, provider, moderator) a caller is acting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::UserId;

/// Standing of a user account as reported by the identity service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Suspended,
    Banned,
    Deleted,
}

impl AccountStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }

    /// Banned and deleted accounts can never act again
    pub fn is_banned_or_deleted(&self) -> bool {
        matches!(self, AccountStatus::Banned | AccountStatus::Deleted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Suspended => "suspended",
            AccountStatus::Banned => "banned",
            AccountStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "suspended" => Ok(AccountStatus::Suspended),
            "banned" => Ok(AccountStatus::Banned),
            "deleted" => Ok(AccountStatus::Deleted),
            other => Err(format!("unknown account status: {other}")),
        }
    }
}

/// Side of a hiring a user is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    Client,
    Provider,
}

impl fmt::Display for PartyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartyRole::Client => f.write_str("client"),
            PartyRole::Provider => f.write_str("provider"),
        }
    }
}

/// Platform role carried by the caller's credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    User,
    Moderator,
    Admin,
}

/// The authenticated caller of an engine operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: ActorRole,
}

impl Actor {
    pub fn user(user_id: UserId) -> Self {
        Self { user_id, role: ActorRole::User }
    }

    pub fn moderator(user_id: UserId) -> Self {
        Self { user_id, role: ActorRole::Moderator }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self { user_id, role: ActorRole::Admin }
    }

    /// Moderators and admins may resolve claims and review submissions
    pub fn can_moderate(&self) -> bool {
        matches!(self.role, ActorRole::Moderator | ActorRole::Admin)
    }
}
