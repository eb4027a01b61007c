//! Shop Tenancy Domain
//!
//! A shop is the unit of data isolation. Users reach a shop's data only
//! through an active [`Membership`], and every billing or catalog operation
//! starts with [`AccessGuard::check_access`].

pub mod membership;
pub mod access;
pub mod error;
pub mod ports;

pub use membership::{Membership, MembershipRole};
pub use access::AccessGuard;
pub use error::AccessError;
pub use ports::MembershipPort;
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::InMemoryMembershipPort;
