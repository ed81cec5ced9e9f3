//! Product entity model
//!
//! Prices are kept as integer cents; see [`Model::formatted_price`] for the
//! wire representation.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;

/// Product of the public catalog
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    pub slug: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Price in cents
    pub price_cents: i64,

    pub brand_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::brand::Entity",
        from = "Column::BrandId",
        to = "super::brand::Column::Id"
    )]
    Brand,
}

impl Related<super::brand::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brand.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Price as a two-decimal string, e.g. `99999` cents becomes `"999.99"`.
    pub fn formatted_price(&self) -> String {
        let sign = if self.price_cents < 0 { "-" } else { "" };
        let cents = self.price_cents.unsigned_abs();
        format!("{sign}{}.{:02}", cents / 100, cents % 100)
    }
}
