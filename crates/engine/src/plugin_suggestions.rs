//! Plugins proposed by registered users, pending staff review.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "plugin_suggestions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub submitter_id: i32,
    pub name: String,
    pub suggested_type: String,
    pub link: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub status: String,
    pub submitted_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
