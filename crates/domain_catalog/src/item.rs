//! Inventory items

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, ItemId, Money, ShopId};

/// Unit of measure applied when a request leaves it blank
pub const DEFAULT_UNIT: &str = "PCS";

/// A sellable item with a stock level
///
/// `quantity` is decremented by every bill line and is allowed to go
/// negative; overselling is surfaced through [`Item::is_low_stock`] rather
/// than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub shop_id: ShopId,
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Money,
    pub cost_price: Option<Money>,
    /// Percentage, 0-100
    pub tax_rate: Decimal,
    pub category: Option<String>,
    pub quantity: Decimal,
    pub min_quantity: Decimal,
    pub unit: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_quantity
    }

    /// Stock value at cost, falling back to list price
    pub fn stock_value(&self) -> Money {
        let unit_value = self.cost_price.unwrap_or(self.price);
        unit_value * self.quantity
    }
}

/// Payload for creating an item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub cost_price: Option<Decimal>,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default)]
    pub min_quantity: Decimal,
    #[serde(default)]
    pub unit: Option<String>,
}

impl ItemRequest {
    /// Checks the request, returning the reason it is unacceptable
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name is required".to_string());
        }
        if self.price <= Decimal::ZERO {
            return Err("price must be greater than 0".to_string());
        }
        if let Some(cost) = self.cost_price {
            if cost < Decimal::ZERO {
                return Err("cost_price cannot be negative".to_string());
            }
        }
        if self.tax_rate < Decimal::ZERO {
            return Err("tax_rate cannot be negative".to_string());
        }
        Ok(())
    }

    /// Builds the item for `shop_id`, defaulting a blank unit to `PCS`
    pub fn into_item(self, shop_id: ShopId, currency: Currency) -> Item {
        let now = Utc::now();
        let unit = self
            .unit
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_UNIT.to_string());

        Item {
            id: ItemId::new_v7(),
            shop_id,
            name: self.name.trim().to_string(),
            description: self.description,
            sku: self.sku,
            price: Money::new(self.price, currency),
            cost_price: self.cost_price.map(|c| Money::new(c, currency)),
            tax_rate: self.tax_rate,
            category: self.category,
            quantity: self.quantity,
            min_quantity: self.min_quantity,
            unit,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
