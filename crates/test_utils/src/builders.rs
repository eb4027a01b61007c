//! Test Data Builders
//!
//! Builders for request payloads. Tests set only the fields they care
//! about and take defaults for the rest.

use chrono::NaiveDate;
use core_kernel::{CustomerId, ItemId};
use domain_billing::{BillLineRequest, BillRequest, PaymentMethod, PaymentRequest};
use domain_catalog::{CustomerRequest, ItemRequest};
use fake::faker::address::en::CityName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rust_decimal::Decimal;

use crate::fixtures::{date_str, reference_date};

/// Builder for bill create/update payloads
#[derive(Debug, Clone)]
pub struct BillRequestBuilder {
    request: BillRequest,
}

impl Default for BillRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BillRequestBuilder {
    /// A bill dated on the reference date with no lines
    pub fn new() -> Self {
        Self {
            request: BillRequest {
                bill_date: date_str(reference_date()),
                ..Default::default()
            },
        }
    }

    /// Adds a line
    pub fn line(mut self, item_id: ItemId, quantity: Decimal, unit_price: Decimal) -> Self {
        self.request.lines.push(BillLineRequest {
            item_id,
            quantity,
            unit_price,
            description: None,
        });
        self
    }

    pub fn customer(mut self, customer_id: CustomerId) -> Self {
        self.request.customer_id = Some(customer_id);
        self
    }

    pub fn bill_date(mut self, date: NaiveDate) -> Self {
        self.request.bill_date = date_str(date);
        self
    }

    /// Sets the raw bill date text, for malformed-date cases
    pub fn bill_date_text(mut self, text: impl Into<String>) -> Self {
        self.request.bill_date = text.into();
        self
    }

    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.request.due_date = Some(date_str(date));
        self
    }

    pub fn due_date_text(mut self, text: impl Into<String>) -> Self {
        self.request.due_date = Some(text.into());
        self
    }

    pub fn tax_rate(mut self, percentage: Decimal) -> Self {
        self.request.tax_rate = percentage;
        self
    }

    pub fn discount(mut self, discount: Decimal) -> Self {
        self.request.discount = discount;
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.request.notes = Some(notes.into());
        self
    }

    pub fn terms(mut self, terms: impl Into<String>) -> Self {
        self.request.terms = Some(terms.into());
        self
    }

    pub fn build(self) -> BillRequest {
        self.request
    }
}

/// Builder for payment payloads, defaulting to cash on the reference date
#[derive(Debug, Clone)]
pub struct PaymentRequestBuilder {
    request: PaymentRequest,
}

impl PaymentRequestBuilder {
    pub fn new(amount: Decimal) -> Self {
        Self {
            request: PaymentRequest {
                amount,
                payment_date: date_str(reference_date()),
                payment_method: PaymentMethod::Cash,
                reference: None,
                notes: None,
            },
        }
    }

    pub fn method(mut self, method: PaymentMethod) -> Self {
        self.request.payment_method = method;
        self
    }

    pub fn payment_date(mut self, date: NaiveDate) -> Self {
        self.request.payment_date = date_str(date);
        self
    }

    pub fn payment_date_text(mut self, text: impl Into<String>) -> Self {
        self.request.payment_date = text.into();
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.request.reference = Some(reference.into());
        self
    }

    pub fn build(self) -> PaymentRequest {
        self.request
    }
}

/// Builder for catalog item payloads
#[derive(Debug, Clone)]
pub struct ItemRequestBuilder {
    request: ItemRequest,
}

impl ItemRequestBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            request: ItemRequest {
                name: name.into(),
                price: Decimal::ONE,
                ..Default::default()
            },
        }
    }

    pub fn price(mut self, price: Decimal) -> Self {
        self.request.price = price;
        self
    }

    pub fn cost_price(mut self, cost_price: Decimal) -> Self {
        self.request.cost_price = Some(cost_price);
        self
    }

    pub fn quantity(mut self, quantity: Decimal) -> Self {
        self.request.quantity = quantity;
        self
    }

    pub fn min_quantity(mut self, min_quantity: Decimal) -> Self {
        self.request.min_quantity = min_quantity;
        self
    }

    pub fn tax_rate(mut self, tax_rate: Decimal) -> Self {
        self.request.tax_rate = tax_rate;
        self
    }

    pub fn sku(mut self, sku: impl Into<String>) -> Self {
        self.request.sku = Some(sku.into());
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.request.unit = Some(unit.into());
        self
    }

    pub fn build(self) -> ItemRequest {
        self.request
    }
}

/// Builder for customer payloads with generated contact details
#[derive(Debug, Clone)]
pub struct CustomerRequestBuilder {
    request: CustomerRequest,
}

impl Default for CustomerRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomerRequestBuilder {
    pub fn new() -> Self {
        Self {
            request: CustomerRequest {
                name: Name().fake(),
                email: Some(SafeEmail().fake()),
                phone: Some(PhoneNumber().fake()),
                city: Some(CityName().fake()),
                ..Default::default()
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.request.name = name.into();
        self
    }

    pub fn tax_number(mut self, tax_number: impl Into<String>) -> Self {
        self.request.tax_number = Some(tax_number.into());
        self
    }

    pub fn build(self) -> CustomerRequest {
        self.request
    }
}
