//! Shop memberships

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{MembershipId, ShopId, UserId};

/// Role a user holds inside a shop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipRole {
    Owner,
    Manager,
    Cashier,
}

impl MembershipRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Owner => "owner",
            MembershipRole::Manager => "manager",
            MembershipRole::Cashier => "cashier",
        }
    }
}

impl fmt::Display for MembershipRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(MembershipRole::Owner),
            "manager" => Ok(MembershipRole::Manager),
            "cashier" => Ok(MembershipRole::Cashier),
            other => Err(format!("unknown membership role '{}'", other)),
        }
    }
}

/// Association between a user and a shop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub shop_id: ShopId,
    pub user_id: UserId,
    pub role: MembershipRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Membership {
    /// Creates an active membership
    pub fn new(shop_id: ShopId, user_id: UserId, role: MembershipRole) -> Self {
        Self {
            id: MembershipId::new_v7(),
            shop_id,
            user_id,
            role,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Returns true if this membership grants access to `shop_id`
    pub fn grants(&self, shop_id: ShopId) -> bool {
        self.is_active && self.shop_id == shop_id
    }
}
