use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const BLANK_NAME: &str = "Name can't be blank";
pub const BLANK_DESCRIPTION: &str = "Description can't be blank";
pub const BLANK_UNIT_PRICE: &str = "Unit price can't be blank";
pub const NAN_UNIT_PRICE: &str = "Unit price is not a number";
pub const NEGATIVE_UNIT_PRICE: &str = "Unit price must be greater than or equal to 0";
pub const BLANK_MERCHANT: &str = "Merchant can't be blank";
pub const MISSING_MERCHANT: &str = "Merchant must exist";

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Merchant {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub unit_price: f64,
    pub merchant_id: i64,
}

/// Item fields that passed validation and are ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    pub name: String,
    pub description: String,
    pub unit_price: f64,
    pub merchant_id: i64,
}

/// A submitted `unit_price`. Numbers and numeric strings are accepted; any
/// other value is kept as `NotANumber` so validation can report it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitPrice {
    Number(f64),
    NotANumber,
}

impl UnitPrice {
    fn number(self) -> Option<f64> {
        match self {
            UnitPrice::Number(price) => Some(price),
            UnitPrice::NotANumber => None,
        }
    }
}

impl From<f64> for UnitPrice {
    fn from(price: f64) -> Self {
        UnitPrice::Number(price)
    }
}

impl<'de> Deserialize<'de> for UnitPrice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let price = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(price
            .filter(|p| p.is_finite())
            .map_or(UnitPrice::NotANumber, UnitPrice::Number))
    }
}

/// Creation payload. Every field is optional so that missing ones surface
/// as validation messages rather than deserialisation failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewItem {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<UnitPrice>,
    pub merchant_id: Option<i64>,
}

/// A field in a partial update: either left untouched or replaced.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Keep,
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Keep
    }
}

impl<T> Patch<T> {
    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Keep => None,
            Patch::Set(value) => Some(value),
        }
    }

    fn overlay(self, current: T) -> T {
        match self {
            Patch::Keep => current,
            Patch::Set(value) => value,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Patch::Set)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPatch {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub unit_price: Patch<UnitPrice>,
    #[serde(default)]
    pub merchant_id: Patch<i64>,
}

/// Request bodies may arrive as `{"item": {...}}` or as the bare object.
/// A top-level `item` key selects the wrapped form; a wrapped body that
/// fails to parse is an error, never re-read as a bare one.
#[derive(Debug)]
pub struct ItemPayload<T>(T);

impl<T> ItemPayload<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ItemPayload<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let body = match Value::deserialize(deserializer)? {
            Value::Object(mut fields) if fields.contains_key("item") => {
                fields.remove("item").unwrap_or_default()
            }
            other => other,
        };
        T::deserialize(body).map(ItemPayload).map_err(D::Error::custom)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ShowQuery {
    pub invalid_param: Option<String>,
}

impl ShowQuery {
    pub fn is_invalid(&self) -> bool {
        self.invalid_param
            .as_deref()
            .map(str::trim)
            .is_some_and(|v| !matches!(v, "" | "false" | "0"))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MerchantSearchQuery {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemSearchQuery {
    pub name: Option<String>,
    pub min_price: Option<String>,
}

impl NewItem {
    pub fn validate(self) -> Result<ItemFields, Vec<String>> {
        let mut errors = Vec::new();

        let name = present(self.name);
        if name.is_none() {
            errors.push(BLANK_NAME.to_string());
        }

        let description = present(self.description);
        if description.is_none() {
            errors.push(BLANK_DESCRIPTION.to_string());
        }

        let unit_price = self.unit_price.and_then(UnitPrice::number);
        match (self.unit_price, unit_price) {
            (None, _) => errors.push(BLANK_UNIT_PRICE.to_string()),
            (Some(_), None) => errors.push(NAN_UNIT_PRICE.to_string()),
            (Some(_), Some(price)) => check_price(price, &mut errors),
        }

        if self.merchant_id.is_none() {
            errors.push(BLANK_MERCHANT.to_string());
        }

        match (name, description, unit_price, self.merchant_id) {
            (Some(name), Some(description), Some(unit_price), Some(merchant_id))
                if errors.is_empty() =>
            {
                Ok(ItemFields {
                    name,
                    description,
                    unit_price,
                    merchant_id,
                })
            }
            _ => Err(errors),
        }
    }
}

impl Item {
    /// Overlays the supplied patch fields onto this item and validates the result.
    pub fn merge(&self, patch: ItemPatch) -> Result<ItemFields, Vec<String>> {
        let name = patch.name.overlay(self.name.clone());
        let description = patch.description.overlay(self.description.clone());
        let unit_price = patch
            .unit_price
            .overlay(UnitPrice::Number(self.unit_price))
            .number();
        let merchant_id = patch.merchant_id.overlay(self.merchant_id);

        let mut errors = Vec::new();
        if name.trim().is_empty() {
            errors.push(BLANK_NAME.to_string());
        }
        if description.trim().is_empty() {
            errors.push(BLANK_DESCRIPTION.to_string());
        }
        match unit_price {
            None => errors.push(NAN_UNIT_PRICE.to_string()),
            Some(price) => check_price(price, &mut errors),
        }

        match unit_price {
            Some(unit_price) if errors.is_empty() => Ok(ItemFields {
                name,
                description,
                unit_price,
                merchant_id,
            }),
            _ => Err(errors),
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn check_price(price: f64, errors: &mut Vec<String>) {
    if !price.is_finite() {
        errors.push(NAN_UNIT_PRICE.to_string());
    } else if price < 0.0 {
        errors.push(NEGATIVE_UNIT_PRICE.to_string());
    }
}
