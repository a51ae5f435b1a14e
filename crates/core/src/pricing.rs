//! Uniform pricing rules.
//!
//! A customer configures an item by walking a guided flow: gender, then
//! season, then level, then the item type and its size. Each
//! (gender, season, level) combination is a named [`RuleSet`] that decides
//! which items are on offer and how pants are priced. The two boy/winter
//! flows intentionally disagree on pant prices; they are kept as separate
//! rule sets rather than merged.
//!
//! Amounts are whole rupees. A price of zero means "incomplete": the item is
//! missing a size, the size is not on the chart, or the flow does not offer
//! the item at all.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::Price;

/// Quantities offered by the configuration flow.
pub const MIN_QUANTITY: u32 = 1;
pub const MAX_QUANTITY: u32 = 10;

/// Fixed price of a tie.
pub const TIE_PRICE: Price = Price::new(150);

const SHIRT_SIZES: &[u16] = &[18, 20, 22, 24, 26, 28, 30];
const SWEATER_SIZES: &[u16] = &[22, 24, 26, 28, 30, 32];
const PANT_SIZES: &[u16] = &[22, 24, 26, 28, 30, 32, 34, 36, 38, 40];
const FROCK_SIZES: &[u16] = &[22, 24, 26, 28, 30, 32, 34, 36, 38, 40, 42];

/// Rupees per inch for pants and frocks priced by size.
const PER_INCH: i64 = 30;

/// Errors produced by the pricing engine.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("quantity must be between {MIN_QUANTITY} and {MAX_QUANTITY}, got {0}")]
    QuantityOutOfRange(u32),
    #[error("unknown {facet}: {value}")]
    UnknownFacet { facet: &'static str, value: String },
}

macro_rules! facet {
    ($(#[$meta:meta])* $name:ident, $facet:literal, { $($variant:ident => $wire:literal / $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Lowercase wire value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }

            /// Capitalized label used in line item names.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = PricingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err(PricingError::UnknownFacet {
                        facet: $facet,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

facet!(Gender, "gender", { Boy => "boy" / "Boy", Girl => "girl" / "Girl" });
facet!(Season, "season", { Summer => "summer" / "Summer", Winter => "winter" / "Winter" });
facet!(Level, "level", { School => "school" / "School", College => "college" / "College" });
facet!(
    /// Kinds of uniform item.
    ItemType, "item", {
        Shirt => "shirt" / "Shirt",
        Pant => "pant" / "Pant",
        Sweater => "sweater" / "Sweater",
        Tie => "tie" / "Tie",
        Frock => "frock" / "Frock",
    }
);

impl ItemType {
    /// Sizes on the chart for this item. Ties are one-size.
    #[must_use]
    pub const fn size_chart(self) -> &'static [u16] {
        match self {
            Self::Shirt => SHIRT_SIZES,
            Self::Sweater => SWEATER_SIZES,
            Self::Pant => PANT_SIZES,
            Self::Frock => FROCK_SIZES,
            Self::Tie => &[],
        }
    }

    #[must_use]
    pub const fn is_sized(self) -> bool {
        !matches!(self, Self::Tie)
    }
}

/// A size in inches.
///
/// Accepts either a JSON number or a numeric string, since the option flow
/// sends sizes as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "SizeRepr", into = "u16")]
pub struct Size(u16);

impl Size {
    #[must_use]
    pub const fn new(inches: u16) -> Self {
        Self(inches)
    }

    #[must_use]
    pub const fn inches(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Size> for u16 {
    fn from(size: Size) -> Self {
        size.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeRepr {
    Number(u16),
    Text(String),
}

impl TryFrom<SizeRepr> for Size {
    type Error = String;

    fn try_from(repr: SizeRepr) -> Result<Self, Self::Error> {
        match repr {
            SizeRepr::Number(n) => Ok(Self(n)),
            SizeRepr::Text(s) => s
                .trim()
                .parse::<u16>()
                .map(Self)
                .map_err(|_| format!("invalid size: {s}")),
        }
    }
}

/// How a rule set prices pants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PantPricing {
    /// `size * 30`.
    PerInch,
    /// 1200 for size 40, 900 for every other size on the chart.
    Flat,
}

/// The three facets chosen before an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flow {
    pub gender: Gender,
    pub season: Season,
    pub level: Level,
}

impl Flow {
    #[must_use]
    pub const fn new(gender: Gender, season: Season, level: Level) -> Self {
        Self {
            gender,
            season,
            level,
        }
    }

    /// The rule set this flow follows.
    #[must_use]
    pub const fn rule_set(self) -> RuleSet {
        match (self.gender, self.season, self.level) {
            (Gender::Boy, Season::Winter, Level::School) => RuleSet {
                name: "boy-winter-school",
                items: &[ItemType::Shirt, ItemType::Pant, ItemType::Sweater, ItemType::Tie],
                pants: PantPricing::PerInch,
            },
            (Gender::Boy, Season::Winter, Level::College) => RuleSet {
                name: "boy-winter-college",
                items: &[ItemType::Shirt, ItemType::Pant, ItemType::Sweater, ItemType::Tie],
                pants: PantPricing::Flat,
            },
            (Gender::Boy, Season::Summer, Level::School) => RuleSet {
                name: "boy-summer-school",
                items: &[ItemType::Shirt, ItemType::Pant],
                pants: PantPricing::PerInch,
            },
            (Gender::Boy, Season::Summer, Level::College) => RuleSet {
                name: "boy-summer-college",
                items: &[ItemType::Shirt, ItemType::Pant],
                pants: PantPricing::PerInch,
            },
            (Gender::Girl, _, _) => RuleSet {
                name: "girl",
                items: &[ItemType::Frock],
                pants: PantPricing::PerInch,
            },
        }
    }
}

/// Items offered by one flow and the tables that price them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSet {
    name: &'static str,
    items: &'static [ItemType],
    pants: PantPricing,
}

impl RuleSet {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn items(&self) -> &'static [ItemType] {
        self.items
    }

    #[must_use]
    pub fn offers(&self, item: ItemType) -> bool {
        self.items.contains(&item)
    }

    /// Unit price of `item` in `size`, or zero when the combination is
    /// incomplete or not offered.
    #[must_use]
    pub fn unit_price(&self, item: ItemType, size: Option<Size>) -> Price {
        if !self.offers(item) {
            return Price::ZERO;
        }
        if item == ItemType::Tie {
            return TIE_PRICE;
        }
        let Some(size) = size.filter(|s| item.size_chart().contains(&s.inches())) else {
            return Price::ZERO;
        };
        let inches = i64::from(size.inches());
        let amount = match item {
            ItemType::Tie => TIE_PRICE.amount(),
            ItemType::Shirt if inches == 30 => 1100,
            ItemType::Shirt => 850,
            ItemType::Sweater if inches <= 28 => 1300,
            ItemType::Sweater => 1500,
            ItemType::Pant => match self.pants {
                PantPricing::PerInch => inches * PER_INCH,
                PantPricing::Flat if inches == 40 => 1200,
                PantPricing::Flat => 900,
            },
            ItemType::Frock => inches * PER_INCH,
        };
        Price::new(amount)
    }
}

/// Unit price for an item in a flow. See [`RuleSet::unit_price`].
#[must_use]
pub fn unit_price(flow: Flow, item: ItemType, size: Option<Size>) -> Price {
    flow.rule_set().unit_price(item, size)
}

/// A fully described configuration, as posted by the option flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub gender: Gender,
    pub season: Season,
    pub level: Level,
    pub item: ItemType,
    #[serde(default)]
    pub size: Option<Size>,
    pub quantity: u32,
}

impl Selection {
    #[must_use]
    pub const fn flow(&self) -> Flow {
        Flow::new(self.gender, self.season, self.level)
    }

    /// Line item name, e.g. `Boy • Winter • School • Shirt • Size 30`.
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut name = [
            self.gender.label(),
            self.season.label(),
            self.level.label(),
            self.item.label(),
        ]
        .join(" • ");
        if self.item.is_sized()
            && let Some(size) = self.size
        {
            name.push_str(" • Size ");
            name.push_str(&size.to_string());
        }
        name
    }
}

/// The priced result of a [`Selection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub name: String,
    pub item: ItemType,
    pub size: Option<Size>,
    pub quantity: u32,
    #[serde(rename = "unitPriceCents")]
    pub unit_price: Price,
    #[serde(rename = "lineTotalCents")]
    pub line_total: Price,
    /// Whether "Add to cart" is enabled for this configuration.
    pub addable: bool,
}

/// Price a selection.
///
/// # Errors
///
/// Returns [`PricingError::QuantityOutOfRange`] when the quantity is outside
/// the 1 to 10 range offered by the flow.
pub fn quote(selection: &Selection) -> Result<Quote, PricingError> {
    if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&selection.quantity) {
        return Err(PricingError::QuantityOutOfRange(selection.quantity));
    }
    let unit_price = unit_price(selection.flow(), selection.item, selection.size);
    let line_total = unit_price
        .checked_mul(i64::from(selection.quantity))
        .unwrap_or(Price::ZERO);
    let addable = match selection.item {
        ItemType::Tie => !unit_price.is_zero() && selection.quantity > 0,
        _ => line_total > Price::ZERO,
    };
    Ok(Quote {
        name: selection.display_name(),
        item: selection.item,
        size: selection.size.filter(|_| selection.item.is_sized()),
        quantity: selection.quantity,
        unit_price,
        line_total,
        addable,
    })
}

/// One size choice and its price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeOption {
    pub size: Size,
    #[serde(rename = "unitPriceCents")]
    pub unit_price: Price,
}

/// What the flow shows for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemOptions {
    pub item: ItemType,
    pub label: &'static str,
    /// Empty for one-size items.
    pub sizes: Vec<SizeOption>,
    /// Set only for one-size items.
    #[serde(rename = "unitPriceCents", skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Price>,
}

/// Everything the guided option flow needs to render one (gender, season,
/// level) combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionMenu {
    pub flow: Flow,
    pub rule_set: &'static str,
    pub items: Vec<ItemOptions>,
    pub min_quantity: u32,
    pub max_quantity: u32,
}

#[must_use]
pub fn option_menu(flow: Flow) -> OptionMenu {
    let rules = flow.rule_set();
    let items = rules
        .items()
        .iter()
        .map(|&item| {
            let sizes = item
                .size_chart()
                .iter()
                .map(|&inches| {
                    let size = Size::new(inches);
                    SizeOption {
                        size,
                        unit_price: rules.unit_price(item, Some(size)),
                    }
                })
                .collect();
            ItemOptions {
                item,
                label: item.label(),
                sizes,
                unit_price: (!item.is_sized()).then(|| rules.unit_price(item, None)),
            }
        })
        .collect();
    OptionMenu {
        flow,
        rule_set: rules.name(),
        items,
        min_quantity: MIN_QUANTITY,
        max_quantity: MAX_QUANTITY,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const BOY_WINTER_SCHOOL: Flow = Flow::new(Gender::Boy, Season::Winter, Level::School);
    const BOY_WINTER_COLLEGE: Flow = Flow::new(Gender::Boy, Season::Winter, Level::College);
    const BOY_SUMMER_SCHOOL: Flow = Flow::new(Gender::Boy, Season::Summer, Level::School);

    fn price(flow: Flow, item: ItemType, size: u16) -> i64 {
        unit_price(flow, item, Some(Size::new(size))).amount()
    }

    fn selection(item: ItemType, size: Option<u16>, quantity: u32) -> Selection {
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
    fn test_shirt_prices() {
        for size in [18, 20, 22, 24, 26, 28] {
            assert_eq!(price(BOY_WINTER_SCHOOL, ItemType::Shirt, size), 850);
        }
        assert_eq!(price(BOY_WINTER_SCHOOL, ItemType::Shirt, 30), 1100);
        assert_eq!(price(BOY_SUMMER_SCHOOL, ItemType::Shirt, 30), 1100);
    }

    #[test]
    fn test_sweater_prices() {
        for size in [22, 24, 26, 28] {
            assert_eq!(price(BOY_WINTER_SCHOOL, ItemType::Sweater, size), 1300);
        }
        assert_eq!(price(BOY_WINTER_SCHOOL, ItemType::Sweater, 30), 1500);
        assert_eq!(price(BOY_WINTER_SCHOOL, ItemType::Sweater, 32), 1500);
    }

    #[test]
    fn test_pants_priced_per_inch() {
        for size in PANT_SIZES {
            assert_eq!(
                price(BOY_WINTER_SCHOOL, ItemType::Pant, *size),
                i64::from(*size) * 30
            );
        }
        assert_eq!(price(BOY_SUMMER_SCHOOL, ItemType::Pant, 40), 1200);
    }

    #[test]
    fn test_winter_college_pants_use_flat_table() {
        assert_eq!(price(BOY_WINTER_COLLEGE, ItemType::Pant, 40), 1200);
        assert_eq!(price(BOY_WINTER_COLLEGE, ItemType::Pant, 22), 900);
        assert_eq!(price(BOY_WINTER_COLLEGE, ItemType::Pant, 38), 900);
        // Same size, different flow, different price
        assert_eq!(price(BOY_WINTER_SCHOOL, ItemType::Pant, 30), 900);
        assert_eq!(price(BOY_WINTER_SCHOOL, ItemType::Pant, 32), 960);
        assert_eq!(price(BOY_WINTER_COLLEGE, ItemType::Pant, 32), 900);
    }

    #[test]
    fn test_frock_priced_per_inch_in_every_girl_flow() {
        for &season in Season::ALL {
            for &level in Level::ALL {
                let flow = Flow::new(Gender::Girl, season, level);
                assert_eq!(price(flow, ItemType::Frock, 22), 660);
                assert_eq!(price(flow, ItemType::Frock, 42), 1260);
            }
        }
    }

    #[test]
    fn test_tie_is_fixed_price() {
        assert_eq!(unit_price(BOY_WINTER_SCHOOL, ItemType::Tie, None), TIE_PRICE);
        assert_eq!(
            unit_price(BOY_WINTER_COLLEGE, ItemType::Tie, Some(Size::new(99))),
            TIE_PRICE
        );
    }

    #[test]
    fn test_incomplete_configurations_price_to_zero() {
        // Missing size
        for item in [ItemType::Shirt, ItemType::Pant, ItemType::Sweater] {
            assert!(unit_price(BOY_WINTER_SCHOOL, item, None).is_zero());
        }
        // Size not on the chart
        assert_eq!(price(BOY_WINTER_SCHOOL, ItemType::Shirt, 32), 0);
        assert_eq!(price(BOY_WINTER_SCHOOL, ItemType::Sweater, 20), 0);
        assert_eq!(price(BOY_WINTER_SCHOOL, ItemType::Pant, 21), 0);
        // Not offered by the flow
        assert_eq!(price(BOY_SUMMER_SCHOOL, ItemType::Sweater, 24), 0);
        assert!(unit_price(BOY_SUMMER_SCHOOL, ItemType::Tie, None).is_zero());
        assert_eq!(price(BOY_WINTER_SCHOOL, ItemType::Frock, 30), 0);
        let girl = Flow::new(Gender::Girl, Season::Winter, Level::School);
        assert_eq!(price(girl, ItemType::Shirt, 30), 0);
    }

    #[test]
    fn test_quote_computes_line_total_and_name() {
        let q = quote(&selection(ItemType::Shirt, Some(30), 2)).unwrap();
        assert_eq!(q.unit_price, Price::new(1100));
        assert_eq!(q.line_total, Price::new(2200));
        assert_eq!(q.name, "Boy • Winter • School • Shirt • Size 30");
        assert!(q.addable);
    }

    #[test]
    fn test_quote_tie_has_no_size_suffix() {
        let q = quote(&selection(ItemType::Tie, Some(30), 3)).unwrap();
        assert_eq!(q.name, "Boy • Winter • School • Tie");
        assert_eq!(q.line_total, Price::new(450));
        assert_eq!(q.size, None);
        assert!(q.addable);
    }

    #[test]
    fn test_quote_without_size_is_not_addable() {
        let q = quote(&selection(ItemType::Pant, None, 1)).unwrap();
        assert_eq!(q.name, "Boy • Winter • School • Pant");
        assert!(q.unit_price.is_zero());
        assert!(!q.addable);
    }

    #[test]
    fn test_quote_rejects_quantity_outside_flow() {
        assert_eq!(
            quote(&selection(ItemType::Tie, None, 0)),
            Err(PricingError::QuantityOutOfRange(0))
        );
        assert_eq!(
            quote(&selection(ItemType::Tie, None, 11)),
            Err(PricingError::QuantityOutOfRange(11))
        );
    }

    #[test]
    fn test_selection_accepts_string_sizes() {
        let json = r#"{"gender":"girl","season":"summer","level":"college","item":"frock","size":"24","quantity":1}"#;
        let sel: Selection = serde_json::from_str(json).unwrap();
        assert_eq!(sel.size, Some(Size::new(24)));
        let q = quote(&sel).unwrap();
        assert_eq!(q.name, "Girl • Summer • College • Frock • Size 24");
        assert_eq!(q.unit_price, Price::new(720));
    }

    #[test]
    fn test_facets_parse_case_insensitively() {
        assert_eq!("Boy".parse::<Gender>().unwrap(), Gender::Boy);
        assert_eq!(" WINTER ".parse::<Season>().unwrap(), Season::Winter);
        assert!(matches!(
            "university".parse::<Level>(),
            Err(PricingError::UnknownFacet { facet: "level", .. })
        ));
    }

    #[test]
    fn test_option_menu_lists_offered_items() {
        let menu = option_menu(BOY_WINTER_COLLEGE);
        assert_eq!(menu.rule_set, "boy-winter-college");
        let items: Vec<_> = menu.items.iter().map(|i| i.item).collect();
        assert_eq!(
            items,
            [ItemType::Shirt, ItemType::Pant, ItemType::Sweater, ItemType::Tie]
        );
        let pants = &menu.items[1];
        assert_eq!(pants.sizes.len(), PANT_SIZES.len());
        assert_eq!(pants.sizes.last().unwrap().unit_price, Price::new(1200));
        let tie = &menu.items[3];
        assert!(tie.sizes.is_empty());
        assert_eq!(tie.unit_price, Some(TIE_PRICE));

        let summer = option_menu(BOY_SUMMER_SCHOOL);
        assert_eq!(summer.items.len(), 2);
    }
}
