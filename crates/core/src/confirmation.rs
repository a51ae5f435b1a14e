//! Order confirmation.
//!
//! [`ConfirmationRequest`] is the loosely-typed body a customer submits at
//! checkout. [`OrderConfirmation::validate`] turns it into a value that is
//! safe to render and send: contact fields present, phone in Pakistani
//! mobile format, at least one item, and every amount filled in.

use serde::Deserialize;

use crate::draft::SHIPPING_FEE;
use crate::types::{PakistaniMobile, Price, phone::PhoneError};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationError {
    #[error("missing customer fields")]
    MissingCustomerFields,
    #[error("invalid Pakistani phone format")]
    InvalidPhone(#[source] PhoneError),
    #[error("no items provided")]
    NoItems,
    #[error("line {position} total is too large")]
    LineTotalOverflow { position: usize },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineInput {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Price,
    #[serde(default)]
    pub line_total: Option<Price>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PricingInput {
    #[serde(default)]
    pub subtotal: Option<Price>,
    #[serde(default)]
    pub shipping: Option<Price>,
    #[serde(default)]
    pub total: Option<Price>,
}

/// Body of `POST /send-order-email`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmationRequest {
    #[serde(default)]
    pub customer: CustomerInput,
    #[serde(default)]
    pub items: Vec<LineInput>,
    #[serde(default)]
    pub pricing: PricingInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub name: String,
    pub phone: PakistaniMobile,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationLine {
    /// 1-based position in the order.
    pub position: usize,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmation {
    pub customer: Customer,
    pub lines: Vec<ConfirmationLine>,
    pub subtotal: Price,
    pub shipping: Price,
    pub total: Price,
}

fn required(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

impl OrderConfirmation {
    /// Validate a request and fill in defaulted amounts.
    ///
    /// Missing shipping becomes the flat delivery charge, a missing subtotal
    /// is zero, a missing total is subtotal plus shipping, and a missing line
    /// total is unit price times quantity.
    ///
    /// # Errors
    ///
    /// Checks run in order and stop at the first failure: customer fields,
    /// phone format, items, then that every line total fits.
    pub fn validate(request: ConfirmationRequest) -> Result<Self, ConfirmationError> {
        let ConfirmationRequest {
            customer,
            items,
            pricing,
        } = request;

        let (Some(name), Some(phone), Some(address)) = (
            required(customer.name),
            required(customer.phone),
            required(customer.address),
        ) else {
            return Err(ConfirmationError::MissingCustomerFields);
        };

        let phone = PakistaniMobile::parse(&phone).map_err(ConfirmationError::InvalidPhone)?;

        if items.is_empty() {
            return Err(ConfirmationError::NoItems);
        }

        let lines = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let position = index + 1;
                let line_total = match item.line_total {
                    Some(total) => total,
                    None => item
                        .unit_price
                        .checked_mul(i64::from(item.quantity))
                        .ok_or(ConfirmationError::LineTotalOverflow { position })?,
                };
                Ok(ConfirmationLine {
                    position,
                    name: item.name,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    line_total,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let subtotal = pricing.subtotal.unwrap_or(Price::ZERO);
        let shipping = pricing.shipping.unwrap_or(SHIPPING_FEE);
        let total = pricing.total.unwrap_or(subtotal + shipping);

        Ok(Self {
            customer: Customer {
                name,
                phone,
                address,
            },
            lines,
            subtotal,
            shipping,
            total,
        })
    }

    /// Subject line of the store's notification email.
    #[must_use]
    pub fn subject(&self) -> String {
        format!(
            "New Order from {} ({})",
            self.customer.name, self.customer.phone
        )
    }
}
