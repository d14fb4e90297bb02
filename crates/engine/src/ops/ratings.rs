use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};

use crate::{
    PluginRef, ResultEngine, alt_plugins, plugin::PluginTable, pro_plugins, ratings,
    util::validate_score,
};

use super::{Engine, plugins::find_plugin, with_tx};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatingStats {
    pub count: u64,
    pub average: f64,
}

/// Rewrite the cached `rating` of plugin `id` as the mean of its ratings.
///
/// The mean is computed by the store inside the `UPDATE`, so two concurrent
/// submissions cannot overwrite each other with a stale average.
pub(crate) async fn recompute_rating<E: PluginTable>(
    db_tx: &DatabaseTransaction,
    id: i32,
) -> ResultEngine<f64> {
    E::update_many()
        .col_expr(
            E::rating_column(),
            Expr::cust_with_values(
                "(SELECT COALESCE(AVG(score), 0.0) FROM ratings WHERE target_kind = ? AND target_id = ?)",
                [Value::from(E::KIND.as_str()), Value::from(id)],
            ),
        )
        .filter(E::id_column().eq(id))
        .exec(db_tx)
        .await?;

    let plugin = find_plugin(db_tx, PluginRef::new(E::KIND, id)).await?;
    Ok(plugin.rating)
}

impl Engine {
    /// Record `user_id`'s score for a plugin and return the new average.
    ///
    /// A second rating from the same user replaces the first.
    pub async fn submit_rating(&self, user_id: i32, key: PluginRef, score: f64) -> ResultEngine<f64> {
        let score = validate_score(score)?;

        with_tx!(self, |db_tx| {
            find_plugin(&db_tx, key).await?;

            let rating = ratings::ActiveModel {
                user_id: ActiveValue::Set(user_id),
                target_kind: ActiveValue::Set(key.kind().as_str().to_string()),
                target_id: ActiveValue::Set(key.id()),
                score: ActiveValue::Set(score),
                ..Default::default()
            };
            ratings::Entity::insert(rating)
                .on_conflict(
                    OnConflict::columns([
                        ratings::Column::UserId,
                        ratings::Column::TargetKind,
                        ratings::Column::TargetId,
                    ])
                    .update_column(ratings::Column::Score)
                    .to_owned(),
                )
                .exec_without_returning(&db_tx)
                .await?;

            let average = match key {
                PluginRef::Pro(id) => recompute_rating::<pro_plugins::Entity>(&db_tx, id).await?,
                PluginRef::Alt(id) => recompute_rating::<alt_plugins::Entity>(&db_tx, id).await?,
            };
            tracing::debug!("user {user_id} rated {} {}: {score}, average {average}", key.kind(), key.id());
            Ok(average)
        })
    }

    /// Number of ratings and their mean for a plugin.
    pub async fn rating_stats(&self, key: PluginRef) -> ResultEngine<RatingStats> {
        let rows = ratings::Entity::find()
            .filter(ratings::Column::TargetKind.eq(key.kind().as_str()))
            .filter(ratings::Column::TargetId.eq(key.id()))
            .all(&self.database)
            .await?;
        let count = rows.len() as u64;
        let average = if rows.is_empty() {
            0.0
        } else {
            rows.iter().map(|row| row.score).sum::<f64>() / rows.len() as f64
        };
        Ok(RatingStats { count, average })
    }

    /// The score `user_id` gave a plugin, if any.
    pub async fn user_rating(&self, user_id: i32, key: PluginRef) -> ResultEngine<Option<f64>> {
        Ok(ratings::Entity::find()
            .filter(ratings::Column::UserId.eq(user_id))
            .filter(ratings::Column::TargetKind.eq(key.kind().as_str()))
            .filter(ratings::Column::TargetId.eq(key.id()))
            .one(&self.database)
            .await?
            .map(|row| row.score))
    }
}
