//! Plugin listings, their taxonomy links and audio demos.
//!
//! Pro and Alternative plugins live in two structurally identical tables.
//! Each has its own subcategory link table; `pro_plugin_alternatives` links
//! the two kinds. An audio demo points at exactly one plugin of either kind.

use sea_orm_migration::prelude::*;

use crate::m20260105_000001_catalog::{Subcategories, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Clone, Copy, Iden)]
pub(crate) enum ProPlugins {
    Table,
}

#[derive(Clone, Copy, Iden)]
pub(crate) enum AltPlugins {
    Table,
}

/// Columns shared by both plugin tables.
#[derive(Iden)]
enum Plugin {
    Id,
    SubmitterId,
    Name,
    /// Case-folded name, written by the engine for name search.
    NameNorm,
    DateReleased,
    Price,
    Description,
    Size,
    DownloadLink,
    Image,
    Rating,
}

#[derive(Clone, Copy, Iden)]
enum ProPluginSubcategories {
    Table,
}

#[derive(Clone, Copy, Iden)]
enum AltPluginSubcategories {
    Table,
}

/// Columns shared by both subcategory link tables.
#[derive(Iden)]
enum PluginSubcategory {
    PluginId,
    SubcategoryId,
}

#[derive(Iden)]
enum ProPluginAlternatives {
    Table,
    ProPluginId,
    AltPluginId,
}

#[derive(Iden)]
enum AudioDemos {
    Table,
    Id,
    Title,
    File,
    ProPluginId,
    AltPluginId,
}

fn plugin_table<T: Iden + Copy + 'static>(table: T, fk_name: &str) -> TableCreateStatement {
    Table::create()
        .table(table)
        .if_not_exists()
        .col(
            ColumnDef::new(Plugin::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(Plugin::SubmitterId).integer())
        .col(ColumnDef::new(Plugin::Name).string_len(30).not_null())
        .col(ColumnDef::new(Plugin::NameNorm).string().not_null())
        .col(ColumnDef::new(Plugin::DateReleased).date().not_null())
        .col(ColumnDef::new(Plugin::Price).integer().not_null())
        .col(ColumnDef::new(Plugin::Description).text().not_null())
        .col(ColumnDef::new(Plugin::Size).double().not_null())
        .col(ColumnDef::new(Plugin::DownloadLink).string_len(99).not_null())
        .col(ColumnDef::new(Plugin::Image).string())
        .col(
            ColumnDef::new(Plugin::Rating)
                .double()
                .not_null()
                .default(0.0),
        )
        .foreign_key(
            ForeignKey::create()
                .name(fk_name)
                .from(table, Plugin::SubmitterId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

fn link_table<T: Iden + Copy + 'static, P: Iden + Copy + 'static>(
    table: T,
    plugins: P,
    prefix: &str,
) -> TableCreateStatement {
    Table::create()
        .table(table)
        .if_not_exists()
        .col(
            ColumnDef::new(PluginSubcategory::PluginId)
                .integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(PluginSubcategory::SubcategoryId)
                .integer()
                .not_null(),
        )
        .primary_key(
            Index::create()
                .col(PluginSubcategory::PluginId)
                .col(PluginSubcategory::SubcategoryId),
        )
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk-{prefix}-plugin_id"))
                .from(table, PluginSubcategory::PluginId)
                .to(plugins, Plugin::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk-{prefix}-subcategory_id"))
                .from(table, PluginSubcategory::SubcategoryId)
                .to(Subcategories::Table, Subcategories::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(plugin_table(
                ProPlugins::Table,
                "fk-pro_plugins-submitter_id",
            ))
            .await?;
        manager
            .create_table(plugin_table(
                AltPlugins::Table,
                "fk-alt_plugins-submitter_id",
            ))
            .await?;

        manager
            .create_table(link_table(
                ProPluginSubcategories::Table,
                ProPlugins::Table,
                "pro_plugin_subcategories",
            ))
            .await?;
        manager
            .create_table(link_table(
                AltPluginSubcategories::Table,
                AltPlugins::Table,
                "alt_plugin_subcategories",
            ))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProPluginAlternatives::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProPluginAlternatives::ProPluginId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProPluginAlternatives::AltPluginId)
                            .integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ProPluginAlternatives::ProPluginId)
                            .col(ProPluginAlternatives::AltPluginId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pro_plugin_alternatives-pro_plugin_id")
                            .from(
                                ProPluginAlternatives::Table,
                                ProPluginAlternatives::ProPluginId,
                            )
                            .to(ProPlugins::Table, Plugin::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pro_plugin_alternatives-alt_plugin_id")
                            .from(
                                ProPluginAlternatives::Table,
                                ProPluginAlternatives::AltPluginId,
                            )
                            .to(AltPlugins::Table, Plugin::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AudioDemos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AudioDemos::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AudioDemos::Title).string().not_null())
                    .col(ColumnDef::new(AudioDemos::File).string().not_null())
                    .col(ColumnDef::new(AudioDemos::ProPluginId).integer())
                    .col(ColumnDef::new(AudioDemos::AltPluginId).integer())
                    // Exactly one owner: a demo belongs to a Pro or an Alternative plugin.
                    .check(Expr::cust(
                        "(pro_plugin_id IS NULL) <> (alt_plugin_id IS NULL)",
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-audio_demos-pro_plugin_id")
                            .from(AudioDemos::Table, AudioDemos::ProPluginId)
                            .to(ProPlugins::Table, Plugin::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-audio_demos-alt_plugin_id")
                            .from(AudioDemos::Table, AudioDemos::AltPluginId)
                            .to(AltPlugins::Table, Plugin::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AudioDemos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProPluginAlternatives::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AltPluginSubcategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProPluginSubcategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AltPlugins::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProPlugins::Table).to_owned())
            .await
    }
}
