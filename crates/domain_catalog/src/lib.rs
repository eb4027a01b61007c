//! Shop Catalog Domain
//!
//! Items (inventory with stock levels) and customers belong to exactly one
//! shop. Bills reference both: lines snapshot an item's name at billing
//! time and draw down its stock, and bills are hydrated with their customer.

pub mod item;
pub mod customer;
pub mod error;
pub mod ports;
pub mod service;

pub use item::{Item, ItemRequest, DEFAULT_UNIT};
pub use customer::{Customer, CustomerRequest};
pub use error::CatalogError;
pub use ports::CatalogPort;
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::InMemoryCatalogPort;
pub use service::CatalogService;
