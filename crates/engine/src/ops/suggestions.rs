use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, prelude::*, sea_query::Expr,
};

use crate::{
    EngineError, PluginKind, ResultEngine, plugin_suggestions,
    util::{required_text, validate_link},
};

use super::{Actor, Engine};

const MAX_SUGGESTION_NAME_CHARS: usize = 100;
const MAX_SUGGESTION_LINK_CHARS: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuggestionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SuggestionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl TryFrom<&str> for SuggestionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(EngineError::InvalidState(format!(
                "unknown suggestion status: {other}"
            ))),
        }
    }
}

/// Suggested type as stored: the form choices `PRO` / `ALT`.
fn kind_choice(kind: PluginKind) -> &'static str {
    match kind {
        PluginKind::Pro => "PRO",
        PluginKind::Alt => "ALT",
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Suggestion {
    pub id: i32,
    pub submitter_id: i32,
    pub name: String,
    pub suggested_type: PluginKind,
    pub link: String,
    pub description: String,
    pub status: SuggestionStatus,
    pub submitted_at: DateTime<Utc>,
}

impl TryFrom<plugin_suggestions::Model> for Suggestion {
    type Error = EngineError;

    fn try_from(model: plugin_suggestions::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            submitter_id: model.submitter_id,
            suggested_type: PluginKind::try_from(model.suggested_type.as_str())?,
            status: SuggestionStatus::try_from(model.status.as_str())?,
            name: model.name,
            link: model.link,
            description: model.description,
            submitted_at: model.submitted_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewSuggestion {
    pub name: String,
    pub suggested_type: PluginKind,
    pub link: String,
    pub description: String,
}

impl Engine {
    /// File a suggestion on behalf of `user_id`. It starts out `PENDING`.
    pub async fn create_suggestion(&self, user_id: i32, new: NewSuggestion) -> ResultEngine<Suggestion> {
        let name = required_text(&new.name, "name", Some(MAX_SUGGESTION_NAME_CHARS))?;
        let link = validate_link(&new.link, "link", Some(MAX_SUGGESTION_LINK_CHARS))?;
        let description = required_text(&new.description, "description", None)?;

        let model = plugin_suggestions::ActiveModel {
            submitter_id: ActiveValue::Set(user_id),
            name: ActiveValue::Set(name),
            suggested_type: ActiveValue::Set(kind_choice(new.suggested_type).to_string()),
            link: ActiveValue::Set(link),
            description: ActiveValue::Set(description),
            status: ActiveValue::Set(SuggestionStatus::Pending.as_str().to_string()),
            submitted_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.database)
        .await?;
        tracing::info!("user {user_id} suggested plugin {}", model.name);
        Suggestion::try_from(model)
    }

    /// A user's own suggestions, newest first.
    pub async fn suggestions_for_user(&self, user_id: i32) -> ResultEngine<Vec<Suggestion>> {
        plugin_suggestions::Entity::find()
            .filter(plugin_suggestions::Column::SubmitterId.eq(user_id))
            .order_by_desc(plugin_suggestions::Column::SubmittedAt)
            .order_by_desc(plugin_suggestions::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Suggestion::try_from)
            .collect()
    }

    /// Suggestions awaiting review, oldest first.
    pub async fn pending_suggestions(&self) -> ResultEngine<Vec<Suggestion>> {
        plugin_suggestions::Entity::find()
            .filter(plugin_suggestions::Column::Status.eq(SuggestionStatus::Pending.as_str()))
            .order_by_asc(plugin_suggestions::Column::SubmittedAt)
            .order_by_asc(plugin_suggestions::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Suggestion::try_from)
            .collect()
    }

    /// Move a pending suggestion to `REJECTED`.
    pub async fn reject_suggestion(&self, actor: &Actor, id: i32) -> ResultEngine<Suggestion> {
        actor.require_staff()?;

        let model = plugin_suggestions::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("suggestion {id}")))?;
        if model.status != SuggestionStatus::Pending.as_str() {
            return Err(EngineError::InvalidState(format!(
                "suggestion {id} is already {}",
                model.status
            )));
        }

        let mut active: plugin_suggestions::ActiveModel = model.into();
        active.status = ActiveValue::Set(SuggestionStatus::Rejected.as_str().to_string());
        let model = active.update(&self.database).await?;
        tracing::info!("suggestion {id} rejected by user {}", actor.user_id);
        Suggestion::try_from(model)
    }
}

/// Mark a pending suggestion approved inside a submission transaction.
///
/// Unknown ids and suggestions that already left `PENDING` are left alone.
pub(super) async fn approve_suggestion(db_tx: &DatabaseTransaction, id: i32) -> ResultEngine<bool> {
    let result = plugin_suggestions::Entity::update_many()
        .col_expr(
            plugin_suggestions::Column::Status,
            Expr::value(SuggestionStatus::Approved.as_str()),
        )
        .filter(plugin_suggestions::Column::Id.eq(id))
        .filter(plugin_suggestions::Column::Status.eq(SuggestionStatus::Pending.as_str()))
        .exec(db_tx)
        .await?;
    Ok(result.rows_affected > 0)
}
