//! Free (alternative) plugin listings.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "alt_plugins")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub submitter_id: Option<i32>,
    pub name: String,
    pub name_norm: String,
    pub date_released: Date,
    pub price: i32,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub size: f64,
    pub download_link: String,
    pub image: Option<String>,
    pub rating: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SubmitterId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Submitter,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submitter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
