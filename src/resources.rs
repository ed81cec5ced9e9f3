//! # Response Representations
//!
//! JSON shapes returned by the API. User resources carry hypermedia links;
//! product resources embed their brand from API version 2.0 onwards.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{brand, product, user};
use crate::versioning::ApiVersion;

/// Single hypermedia link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Link {
    pub href: String,
}

/// Links attached to every user representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserLinks {
    #[serde(rename = "self")]
    pub self_: Link,
    pub update: Link,
    pub delete: Link,
    pub create: Link,
}

impl UserLinks {
    pub fn for_user(id: i32) -> Self {
        let href = user_path(id);
        Self {
            self_: Link { href: href.clone() },
            update: Link { href: href.clone() },
            delete: Link { href },
            create: Link {
                href: USERS_PATH.to_string(),
            },
        }
    }
}

/// Collection path users are created under.
pub const USERS_PATH: &str = "/api/users";

/// Canonical path of a user resource.
pub fn user_path(id: i32) -> String {
    format!("{USERS_PATH}/{id}")
}

/// User as exposed to its owning customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResource {
    #[schema(example = 12)]
    pub id: i32,
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john.doe@gmail.com")]
    pub email: String,
    #[serde(rename = "_links")]
    pub links: UserLinks,
}

impl UserResource {
    /// Every version currently shares one user representation.
    pub fn render(model: user::Model, _version: ApiVersion) -> Self {
        Self {
            links: UserLinks::for_user(model.id),
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BrandResource {
    pub id: i32,
    #[schema(example = "Samsung")]
    pub name: String,
    #[schema(example = "samsung")]
    pub slug: String,
}

impl From<brand::Model> for BrandResource {
    fn from(model: brand::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
        }
    }
}

/// Catalog product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductResource {
    pub id: i32,
    #[schema(example = "Galaxy S24")]
    pub name: String,
    #[schema(example = "galaxy-s24")]
    pub slug: String,
    pub description: String,
    /// Decimal price with two fraction digits
    #[schema(example = "999.99")]
    pub price: String,
    /// Present from API version 2.0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<BrandResource>,
}

impl ProductResource {
    pub fn render(
        model: product::Model,
        brand: Option<brand::Model>,
        version: ApiVersion,
    ) -> Self {
        Self {
            price: model.formatted_price(),
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            brand: brand
                .filter(|_| version.embeds_brand())
                .map(BrandResource::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn phone() -> (product::Model, brand::Model) {
        (
            product::Model {
                id: 3,
                name: "Galaxy S24".to_string(),
                slug: "galaxy-s24".to_string(),
                description: "Phone".to_string(),
                price_cents: 99_999,
                brand_id: 2,
            },
            brand::Model {
                id: 2,
                name: "Samsung".to_string(),
                slug: "samsung".to_string(),
            },
        )
    }

    #[test]
    fn user_resource_has_links() {
        let model = user::Model {
            id: 4,
            username: "jdoe".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "john.doe@gmail.com".to_string(),
            customer_id: 1,
        };

        let value = serde_json::to_value(UserResource::render(model, ApiVersion::V1)).unwrap();
        assert_eq!(value["_links"]["self"], json!({"href": "/api/users/4"}));
        assert_eq!(value["_links"]["delete"]["href"], "/api/users/4");
        assert_eq!(value["_links"]["create"]["href"], "/api/users");
        assert!(value.get("customer_id").is_none());
    }

    #[test]
    fn brand_is_hidden_before_v2() {
        let (product, brand) = phone();
        let value =
            serde_json::to_value(ProductResource::render(product, Some(brand), ApiVersion::V1))
                .unwrap();
        assert!(value.get("brand").is_none());
        assert_eq!(value["price"], "999.99");
    }

    #[test]
    fn brand_is_embedded_from_v2() {
        let (product, brand) = phone();
        let value =
            serde_json::to_value(ProductResource::render(product, Some(brand), ApiVersion::V2))
                .unwrap();
        assert_eq!(value["brand"]["name"], "Samsung");
    }
}
