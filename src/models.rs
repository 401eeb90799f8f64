use hashbrown::HashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::error::FormError;

/// Mapping of variant name -> publicly resolvable URL.
pub type ImageVariants = HashMap<String, String>;

/// The three record kinds the catalog serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceKind {
    Product,
    Banner,
    Category,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Product,
        ResourceKind::Banner,
        ResourceKind::Category,
    ];

    /// The primary-store table backing this resource.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Product => "products",
            Self::Banner => "banners",
            Self::Category => "categories",
        }
    }

    pub fn singular(&self) -> &'static str {
        (*self).into()
    }

    /// Cache entries are namespaced `<singular>:<id>`.
    pub fn cache_key(&self, id: &str) -> String {
        format!("{}:{}", self.singular(), id)
    }
}

/// A record kind persisted through the write-through store.
///
/// The serde form of the record is the canonical serialization: the
/// exact same bytes land in the primary table and the cache.
pub trait StoreRecord: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub category: String,
    pub desc: String,
    pub name: String,
    pub new_price: f64,
    /// `null` when the product has no previous price.
    pub old_price: Option<f64>,
    pub quantity: u32,
    pub season: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageVariants>,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageVariants>,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageVariants>,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl StoreRecord for Product {
    const KIND: ResourceKind = ResourceKind::Product;

    fn id(&self) -> &str {
        &self.id
    }
}

impl StoreRecord for Banner {
    const KIND: ResourceKind = ResourceKind::Banner;

    fn id(&self) -> &str {
        &self.id
    }
}

impl StoreRecord for Category {
    const KIND: ResourceKind = ResourceKind::Category;

    fn id(&self) -> &str {
        &self.id
    }
}

// Form values arrive as text. Coercion happens before any store or
// object-store write so a bad value can never partially apply.

pub fn required_f64(field: &'static str, raw: &str) -> Result<f64, FormError> {
    raw.trim()
        .parse()
        .map_err(|_| FormError::InvalidNumber(field))
}

pub fn optional_f64(field: &'static str, raw: Option<&str>) -> Result<Option<f64>, FormError> {
    match raw {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => required_f64(field, v).map(Some),
    }
}

pub fn required_u32(field: &'static str, raw: &str) -> Result<u32, FormError> {
    raw.trim()
        .parse()
        .map_err(|_| FormError::InvalidNumber(field))
}

pub fn optional_u32(field: &'static str, raw: Option<&str>) -> Result<Option<u32>, FormError> {
    match raw {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => required_u32(field, v).map(Some),
    }
}

pub fn optional_bool(field: &'static str, raw: Option<&str>) -> Result<Option<bool>, FormError> {
    let raw = match raw {
        None => return Ok(None),
        Some(v) => v.trim(),
    };

    if raw.is_empty() {
        Ok(None)
    } else if raw.eq_ignore_ascii_case("true") {
        Ok(Some(true))
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(Some(false))
    } else {
        Err(FormError::InvalidBool(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_numbers_the_way_forms_send_them() {
        assert_eq!(required_f64("newPrice", "500").unwrap(), 500.0);
        assert_eq!(required_u32("quantity", " 3 ").unwrap(), 3);
        assert!(matches!(
            required_u32("quantity", "three"),
            Err(FormError::InvalidNumber("quantity"))
        ));
    }

    #[test]
    fn empty_optional_numbers_become_none() {
        assert_eq!(optional_f64("oldPrice", Some("")).unwrap(), None);
        assert_eq!(optional_f64("oldPrice", None).unwrap(), None);
        assert_eq!(optional_f64("oldPrice", Some("250")).unwrap(), Some(250.0));
        assert!(optional_f64("oldPrice", Some("abc")).is_err());
    }

    #[test]
    fn bools_accept_any_casing() {
        assert_eq!(optional_bool("isActive", Some("TRUE")).unwrap(), Some(true));
        assert_eq!(
            optional_bool("isActive", Some("false")).unwrap(),
            Some(false)
        );
        assert_eq!(optional_bool("isActive", None).unwrap(), None);
        assert!(optional_bool("isActive", Some("yes")).is_err());
    }

    #[test]
    fn image_field_is_omitted_when_never_uploaded() {
        let product = Product {
            id: "p1".to_string(),
            category: "tops".to_string(),
            desc: "a shirt".to_string(),
            name: "Shirt".to_string(),
            new_price: 500.0,
            old_price: None,
            quantity: 3,
            season: "summer".to_string(),
            kind: "casual".to_string(),
            image: None,
            created_at: 1,
            updated_at: None,
        };

        let value = serde_json::to_value(&product).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("image"));
        assert!(!object.contains_key("updatedAt"));
        assert_eq!(value["old_price"], serde_json::Value::Null);
        assert_eq!(value["type"], "casual");
        assert_eq!(value["createdAt"], 1);
    }

    #[test]
    fn cache_keys_use_the_singular_namespace() {
        assert_eq!(ResourceKind::Product.cache_key("abc123"), "product:abc123");
        assert_eq!(ResourceKind::Banner.cache_key("b1"), "banner:b1");
        assert_eq!(ResourceKind::Category.table(), "categories");
    }
}
