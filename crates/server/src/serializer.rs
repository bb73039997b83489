//! `{"data": ...}` envelopes for merchants and items.
//!
//! Each record renders as `{"id": "<id>", "type": "<kind>", "attributes": {...}}`
//! with the id string-encoded.

use serde::Serialize;

use crate::models::{Item, Merchant};

#[derive(Debug, Serialize)]
pub struct Document<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct ResourceObject<A> {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub attributes: A,
}

pub type Single<A> = Document<ResourceObject<A>>;
pub type Collection<A> = Document<Vec<ResourceObject<A>>>;

pub trait Resource {
    const KIND: &'static str;

    type Attributes: Serialize;

    fn id(&self) -> i64;

    fn attributes(&self) -> Self::Attributes;

    fn to_object(&self) -> ResourceObject<Self::Attributes> {
        ResourceObject {
            id: Some(self.id().to_string()),
            kind: Self::KIND,
            attributes: self.attributes(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MerchantAttributes {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItemAttributes {
    pub name: String,
    pub description: String,
    pub unit_price: f64,
    pub merchant_id: i64,
}

impl Resource for Merchant {
    const KIND: &'static str = "merchant";

    type Attributes = MerchantAttributes;

    fn id(&self) -> i64 {
        self.id
    }

    fn attributes(&self) -> MerchantAttributes {
        MerchantAttributes {
            name: Some(self.name.clone()),
        }
    }
}

impl Resource for Item {
    const KIND: &'static str = "item";

    type Attributes = ItemAttributes;

    fn id(&self) -> i64 {
        self.id
    }

    fn attributes(&self) -> ItemAttributes {
        ItemAttributes {
            name: self.name.clone(),
            description: self.description.clone(),
            unit_price: self.unit_price,
            merchant_id: self.merchant_id,
        }
    }
}

pub fn one<R: Resource>(resource: &R) -> Single<R::Attributes> {
    Document {
        data: resource.to_object(),
    }
}

pub fn many<R: Resource>(resources: &[R]) -> Collection<R::Attributes> {
    Document {
        data: resources.iter().map(Resource::to_object).collect(),
    }
}

/// An unsaved merchant: no id and a null name. Returned when a name search
/// has no match.
pub fn empty_merchant() -> Single<MerchantAttributes> {
    Document {
        data: ResourceObject {
            id: None,
            kind: Merchant::KIND,
            attributes: MerchantAttributes { name: None },
        },
    }
}
