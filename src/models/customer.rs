//! Customer entity model
//!
//! Customers are the authenticated principals of the API. Each one owns a set
//! of users.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

/// Customer entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Display name of the company
    pub name: String,

    pub slug: String,

    /// Login identifier (unique)
    #[sea_orm(unique)]
    pub email: String,

    /// Granted role names as a JSON array, e.g. `["ROLE_CUSTOMER"]`
    #[sea_orm(column_type = "Json")]
    pub roles: JsonValue,

    /// Argon2 PHC hash of the password
    #[sea_orm(column_type = "Text")]
    pub password_hash: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user::Entity")]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Role names stored on the row; non-string entries are ignored.
    pub fn role_names(&self) -> Vec<String> {
        self.roles
            .as_array()
            .map(|roles| {
                roles
                    .iter()
                    .filter_map(|role| role.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}
