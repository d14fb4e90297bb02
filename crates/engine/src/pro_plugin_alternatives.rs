//! Links a Pro plugin to the free alternatives that can replace it.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pro_plugin_alternatives")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub pro_plugin_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub alt_plugin_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pro_plugins::Entity",
        from = "Column::ProPluginId",
        to = "super::pro_plugins::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    ProPlugin,
    #[sea_orm(
        belongs_to = "super::alt_plugins::Entity",
        from = "Column::AltPluginId",
        to = "super::alt_plugins::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    AltPlugin,
}

impl ActiveModelBehavior for ActiveModel {}
