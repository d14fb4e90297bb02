//! Ratings and user-submitted plugin suggestions.
//!
//! A rating targets a plugin through `(target_kind, target_id)`, so it cannot
//! carry a foreign key to the plugin tables; the engine removes a plugin's
//! ratings when the plugin is deleted. The unique index on
//! `(user_id, target_kind, target_id)` backs the rating upsert.

use sea_orm_migration::prelude::*;

use crate::m20260105_000001_catalog::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Ratings {
    Table,
    Id,
    UserId,
    TargetKind,
    TargetId,
    Score,
}

#[derive(Iden)]
enum PluginSuggestions {
    Table,
    Id,
    SubmitterId,
    Name,
    SuggestedType,
    Link,
    Description,
    Status,
    SubmittedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ratings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Ratings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Ratings::UserId).integer().not_null())
                    .col(ColumnDef::new(Ratings::TargetKind).string().not_null())
                    .col(ColumnDef::new(Ratings::TargetId).integer().not_null())
                    .col(ColumnDef::new(Ratings::Score).double().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ratings-user_id")
                            .from(Ratings::Table, Ratings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ratings-user_id-target")
                    .table(Ratings::Table)
                    .col(Ratings::UserId)
                    .col(Ratings::TargetKind)
                    .col(Ratings::TargetId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ratings-target")
                    .table(Ratings::Table)
                    .col(Ratings::TargetKind)
                    .col(Ratings::TargetId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PluginSuggestions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PluginSuggestions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PluginSuggestions::SubmitterId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PluginSuggestions::Name).string().not_null())
                    .col(
                        ColumnDef::new(PluginSuggestions::SuggestedType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PluginSuggestions::Link).string().not_null())
                    .col(
                        ColumnDef::new(PluginSuggestions::Description)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PluginSuggestions::Status)
                            .string()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(PluginSuggestions::SubmittedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-plugin_suggestions-submitter_id")
                            .from(PluginSuggestions::Table, PluginSuggestions::SubmitterId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PluginSuggestions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ratings::Table).to_owned())
            .await
    }
}
