//! Many-to-many link between Pro plugins and subcategories.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pro_plugin_subcategories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub plugin_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub subcategory_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pro_plugins::Entity",
        from = "Column::PluginId",
        to = "super::pro_plugins::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Plugin,
    #[sea_orm(
        belongs_to = "super::subcategories::Entity",
        from = "Column::SubcategoryId",
        to = "super::subcategories::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Subcategory,
}

impl ActiveModelBehavior for ActiveModel {}
