//! Pending order draft.
//!
//! The option flow stages configured items in a draft before the customer
//! enters contact details. The draft's JSON form is the `{items, pricing}`
//! half of an order confirmation request.

use serde::{Deserialize, Serialize};

use crate::pricing::{self, PricingError, Quote, Selection};
use crate::types::Price;

/// Flat delivery charge added to every order.
pub const SHIPPING_FEE: Price = Price::new(250);

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("no items selected")]
    Empty,
    #[error("selection {index} ({name}) is incomplete")]
    Incomplete { index: usize, name: String },
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
}

impl From<Quote> for DraftLine {
    fn from(quote: Quote) -> Self {
        Self {
            name: quote.name,
            quantity: quote.quantity,
            unit_price: quote.unit_price,
            line_total: quote.line_total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftPricing {
    pub subtotal: Price,
    pub shipping: Price,
    pub total: Price,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub items: Vec<DraftLine>,
    pub pricing: DraftPricing,
}

impl OrderDraft {
    /// Build a draft from already-priced quotes.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::Empty`] for no quotes and
    /// [`DraftError::Incomplete`] for the first quote that is not addable.
    pub fn from_quotes(quotes: impl IntoIterator<Item = Quote>) -> Result<Self, DraftError> {
        let mut items = Vec::new();
        for (index, quote) in quotes.into_iter().enumerate() {
            if !quote.addable {
                return Err(DraftError::Incomplete {
                    index,
                    name: quote.name,
                });
            }
            items.push(DraftLine::from(quote));
        }
        if items.is_empty() {
            return Err(DraftError::Empty);
        }

        let subtotal: Price = items.iter().map(|line| line.line_total).sum();
        Ok(Self {
            items,
            pricing: DraftPricing {
                subtotal,
                shipping: SHIPPING_FEE,
                total: subtotal + SHIPPING_FEE,
            },
        })
    }

    /// Price every selection and build a draft from the results.
    ///
    /// # Errors
    ///
    /// Fails like [`OrderDraft::from_quotes`], or with
    /// [`DraftError::Pricing`] when a quantity is out of range.
    pub fn from_selections(selections: &[Selection]) -> Result<Self, DraftError> {
        let quotes = selections
            .iter()
            .map(pricing::quote)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_quotes(quotes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::pricing::{Gender, ItemType, Level, Season, Size};

    fn select(item: ItemType, size: Option<u16>, quantity: u32) -> Selection {
        Selection {
            gender: Gender::Boy,
            season: Season::Winter,
            level: Level::School,
            item,
            size: size.map(Size::new),
            quantity,
        }
    }

    #[test]
    fn test_draft_totals_include_shipping() {
        let draft = OrderDraft::from_selections(&[
            select(ItemType::Shirt, Some(24), 2),
            select(ItemType::Tie, None, 1),
        ])
        .unwrap();
        assert_eq!(draft.items.len(), 2);
        assert_eq!(draft.pricing.subtotal, Price::new(1850));
        assert_eq!(draft.pricing.shipping, Price::new(250));
        assert_eq!(draft.pricing.total, Price::new(2100));
    }

    #[test]
    fn test_incomplete_selection_is_rejected() {
        let err = OrderDraft::from_selections(&[
            select(ItemType::Tie, None, 1),
            select(ItemType::Sweater, None, 1),
        ])
        .unwrap_err();
        assert!(matches!(err, DraftError::Incomplete { index: 1, .. }));
    }

    #[test]
    fn test_empty_draft_is_rejected() {
        assert_eq!(OrderDraft::from_selections(&[]), Err(DraftError::Empty));
    }

    #[test]
    fn test_wire_shape_matches_confirmation_body() {
        let draft = OrderDraft::from_selections(&[select(ItemType::Pant, Some(30), 1)]).unwrap();
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["items"][0]["unitPrice"], 900);
        assert_eq!(json["items"][0]["lineTotal"], 900);
        assert_eq!(json["items"][0]["name"], "Boy • Winter • School • Pant • Size 30");
        assert_eq!(json["pricing"]["total"], 1150);
    }
}
