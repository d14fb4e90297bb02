//! Staff submission workflow and plugin deletion.
//!
//! A submission writes the plugin row, its subcategory links, the optional
//! Pro links of an Alternative, up to three audio demos and the approval of
//! the originating suggestion in one transaction. Files are written to the
//! media storage as the transaction goes; if it does not commit they are
//! removed again.

use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, TransactionTrait, prelude::*,
};

use crate::{
    AUDIO_FOLDER, EngineError, IMAGE_FOLDER, PluginKind, PluginRef, ResultEngine, alt_plugin_subcategories,
    alt_plugins, audio_demos, pro_plugin_alternatives, pro_plugin_subcategories, pro_plugins,
    ratings, subcategories,
    util::{
        MAX_DOWNLOAD_LINK_CHARS, MAX_PLUGIN_NAME_CHARS, display_file_name, fold_name,
        normalize_optional_text, required_text, validate_link, validate_size,
    },
};

use super::{Actor, Engine, plugins::find_plugin, suggestions::approve_suggestion, with_tx};

/// Number of audio demo slots on the submission form.
pub const MAX_DEMOS: usize = 3;

/// An uploaded file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// One audio demo slot. Slots without a file are skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DemoUpload {
    pub title: Option<String>,
    pub file: Option<Upload>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PluginSubmission {
    pub kind: PluginKind,
    pub name: String,
    pub date_released: NaiveDate,
    pub subcategories: Vec<i32>,
    pub price: i32,
    pub description: String,
    /// Size in megabytes.
    pub size: f64,
    pub download_link: String,
    pub image: Option<Upload>,
    /// Pro plugins an Alternative replaces. Ignored for Pro submissions.
    pub link_to_pro_plugins: Vec<i32>,
    pub demos: Vec<DemoUpload>,
    /// Suggestion this submission was created from.
    pub suggestion_id: Option<i32>,
}

/// Scalar fields after validation.
struct PluginFields {
    name: String,
    date_released: NaiveDate,
    price: i32,
    description: String,
    size: f64,
    download_link: String,
}

fn validate_submission(submission: &PluginSubmission) -> ResultEngine<PluginFields> {
    if submission.price < 0 {
        return Err(EngineError::InvalidField(
            "price must not be negative".to_string(),
        ));
    }
    if submission.subcategories.is_empty() {
        return Err(EngineError::InvalidField(
            "select at least one subcategory".to_string(),
        ));
    }
    if submission.demos.len() > MAX_DEMOS {
        return Err(EngineError::InvalidField(format!(
            "at most {MAX_DEMOS} audio demos"
        )));
    }

    Ok(PluginFields {
        name: required_text(&submission.name, "plugin name", Some(MAX_PLUGIN_NAME_CHARS))?,
        date_released: submission.date_released,
        price: submission.price,
        description: required_text(&submission.description, "description", None)?,
        size: validate_size(submission.size)?,
        download_link: validate_link(
            &submission.download_link,
            "download link",
            Some(MAX_DOWNLOAD_LINK_CHARS),
        )?,
    })
}

fn dedup_ids(ids: &[i32]) -> Vec<i32> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

macro_rules! insert_plugin_row {
    ($module:ident, $link:ident, $db_tx:expr, $submitter:expr, $fields:expr, $image:expr, $subcategories:expr) => {{
        let model = $module::ActiveModel {
            submitter_id: ActiveValue::Set(Some($submitter)),
            name_norm: ActiveValue::Set(fold_name(&$fields.name)),
            name: ActiveValue::Set($fields.name),
            date_released: ActiveValue::Set($fields.date_released),
            price: ActiveValue::Set($fields.price),
            description: ActiveValue::Set($fields.description),
            size: ActiveValue::Set($fields.size),
            download_link: ActiveValue::Set($fields.download_link),
            image: ActiveValue::Set($image),
            rating: ActiveValue::Set(0.0),
            ..Default::default()
        }
        .insert($db_tx)
        .await?;
        $link::Entity::insert_many($subcategories.iter().map(|subcategory_id| $link::ActiveModel {
            plugin_id: ActiveValue::Set(model.id),
            subcategory_id: ActiveValue::Set(*subcategory_id),
        }))
        .exec_without_returning($db_tx)
        .await?;
        model.id
    }};
}

impl Engine {
    /// Create a plugin from a staff submission.
    ///
    /// Either every row of the submission is written or none is.
    pub async fn submit_plugin(&self, actor: &Actor, submission: PluginSubmission) -> ResultEngine<PluginRef> {
        actor.require_staff()?;
        let fields = validate_submission(&submission)?;

        let mut stored = Vec::new();
        match self
            .write_submission(actor, submission, fields, &mut stored)
            .await
        {
            Ok(key) => {
                tracing::info!(
                    "user {} submitted {} plugin {}",
                    actor.user_id,
                    key.kind(),
                    key.id()
                );
                Ok(key)
            }
            Err(err) => {
                self.discard_files(&stored).await;
                Err(err)
            }
        }
    }

    async fn write_submission(
        &self,
        actor: &Actor,
        submission: PluginSubmission,
        fields: PluginFields,
        stored: &mut Vec<String>,
    ) -> ResultEngine<PluginRef> {
        let subcategory_ids = dedup_ids(&submission.subcategories);

        with_tx!(self, |db_tx| {
            let known = subcategories::Entity::find()
                .filter(subcategories::Column::Id.is_in(subcategory_ids.clone()))
                .count(&db_tx)
                .await?;
            if known != subcategory_ids.len() as u64 {
                return Err(EngineError::InvalidField(
                    "unknown subcategory".to_string(),
                ));
            }

            let image = match &submission.image {
                Some(upload) => Some(self.store_upload(IMAGE_FOLDER, upload, stored).await?),
                None => None,
            };

            let key = match submission.kind {
                PluginKind::Pro => PluginRef::Pro(insert_plugin_row!(
                    pro_plugins,
                    pro_plugin_subcategories,
                    &db_tx,
                    actor.user_id,
                    fields,
                    image,
                    subcategory_ids
                )),
                PluginKind::Alt => {
                    let id = insert_plugin_row!(
                        alt_plugins,
                        alt_plugin_subcategories,
                        &db_tx,
                        actor.user_id,
                        fields,
                        image,
                        subcategory_ids
                    );
                    link_to_pro_plugins(&db_tx, id, &dedup_ids(&submission.link_to_pro_plugins))
                        .await?;
                    PluginRef::Alt(id)
                }
            };

            for demo in &submission.demos {
                let Some(upload) = &demo.file else {
                    continue;
                };
                let file = self.store_upload(AUDIO_FOLDER, upload, stored).await?;
                let title = normalize_optional_text(demo.title.as_deref())
                    .unwrap_or_else(|| display_file_name(&upload.file_name));
                let (pro_plugin_id, alt_plugin_id) = match key {
                    PluginRef::Pro(id) => (Some(id), None),
                    PluginRef::Alt(id) => (None, Some(id)),
                };
                audio_demos::ActiveModel {
                    title: ActiveValue::Set(title),
                    file: ActiveValue::Set(file),
                    pro_plugin_id: ActiveValue::Set(pro_plugin_id),
                    alt_plugin_id: ActiveValue::Set(alt_plugin_id),
                    ..Default::default()
                }
                .insert(&db_tx)
                .await?;
            }

            if let Some(suggestion_id) = submission.suggestion_id
                && approve_suggestion(&db_tx, suggestion_id).await?
            {
                tracing::info!("suggestion {suggestion_id} approved");
            }

            Ok(key)
        })
    }

    async fn store_upload(&self, folder: &str, upload: &Upload, stored: &mut Vec<String>) -> ResultEngine<String> {
        let path = self
            .storage
            .store(folder, &upload.file_name, &upload.bytes)
            .await?;
        stored.push(path.clone());
        Ok(path)
    }

    /// Delete a plugin with its demos, links and ratings.
    ///
    /// Only the submitter or a superuser may delete a plugin.
    pub async fn delete_plugin(&self, actor: &Actor, key: PluginRef) -> ResultEngine<()> {
        let plugin = find_plugin(&self.database, key).await?;
        if plugin.submitter_id != Some(actor.user_id) && !actor.is_superuser {
            tracing::warn!(
                "user {} may not delete {} plugin {}",
                actor.user_id,
                key.kind(),
                key.id()
            );
            return Err(EngineError::Forbidden(
                "only the submitter can delete this plugin".to_string(),
            ));
        }

        let files: ResultEngine<Vec<String>> = with_tx!(self, |db_tx| {
            let demo_filter = match key {
                PluginRef::Pro(id) => audio_demos::Column::ProPluginId.eq(id),
                PluginRef::Alt(id) => audio_demos::Column::AltPluginId.eq(id),
            };
            let mut files: Vec<String> = audio_demos::Entity::find()
                .filter(demo_filter.clone())
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|demo| demo.file)
                .collect();
            files.extend(plugin.image.clone());

            audio_demos::Entity::delete_many()
                .filter(demo_filter)
                .exec(&db_tx)
                .await?;
            ratings::Entity::delete_many()
                .filter(ratings::Column::TargetKind.eq(key.kind().as_str()))
                .filter(ratings::Column::TargetId.eq(key.id()))
                .exec(&db_tx)
                .await?;

            match key {
                PluginRef::Pro(id) => {
                    pro_plugin_subcategories::Entity::delete_many()
                        .filter(pro_plugin_subcategories::Column::PluginId.eq(id))
                        .exec(&db_tx)
                        .await?;
                    pro_plugin_alternatives::Entity::delete_many()
                        .filter(pro_plugin_alternatives::Column::ProPluginId.eq(id))
                        .exec(&db_tx)
                        .await?;
                    pro_plugins::Entity::delete_by_id(id).exec(&db_tx).await?;
                }
                PluginRef::Alt(id) => {
                    alt_plugin_subcategories::Entity::delete_many()
                        .filter(alt_plugin_subcategories::Column::PluginId.eq(id))
                        .exec(&db_tx)
                        .await?;
                    pro_plugin_alternatives::Entity::delete_many()
                        .filter(pro_plugin_alternatives::Column::AltPluginId.eq(id))
                        .exec(&db_tx)
                        .await?;
                    alt_plugins::Entity::delete_by_id(id).exec(&db_tx).await?;
                }
            }
            Ok(files)
        });

        self.discard_files(&files?).await;
        tracing::info!(
            "user {} deleted {} plugin {}",
            actor.user_id,
            key.kind(),
            key.id()
        );
        Ok(())
    }
}

/// Add an Alternative to the `alternatives` of each listed Pro plugin.
async fn link_to_pro_plugins(db_tx: &DatabaseTransaction, alt_id: i32, pro_ids: &[i32]) -> ResultEngine<()> {
    if pro_ids.is_empty() {
        return Ok(());
    }

    let known = pro_plugins::Entity::find()
        .filter(pro_plugins::Column::Id.is_in(pro_ids.to_vec()))
        .count(db_tx)
        .await?;
    if known != pro_ids.len() as u64 {
        return Err(EngineError::InvalidField("unknown pro plugin".to_string()));
    }

    pro_plugin_alternatives::Entity::insert_many(pro_ids.iter().map(|pro_id| {
        pro_plugin_alternatives::ActiveModel {
            pro_plugin_id: ActiveValue::Set(*pro_id),
            alt_plugin_id: ActiveValue::Set(alt_id),
        }
    }))
    .exec_without_returning(db_tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> PluginSubmission {
        PluginSubmission {
            kind: PluginKind::Pro,
            name: "Serum".to_string(),
            date_released: NaiveDate::from_ymd_opt(2014, 9, 1).unwrap(),
            subcategories: vec![1],
            price: 189,
            description: "Wavetable synth".to_string(),
            size: 120.5,
            download_link: "https://xferrecords.com/products/serum".to_string(),
            image: None,
            link_to_pro_plugins: Vec::new(),
            demos: Vec::new(),
            suggestion_id: None,
        }
    }

    #[test]
    fn accepts_a_complete_submission() {
        let fields = validate_submission(&submission()).unwrap();
        assert_eq!(fields.name, "Serum");
        assert_eq!(fields.price, 189);
    }

    #[test]
    fn rejects_bad_scalar_fields() {
        let mut long_name = submission();
        long_name.name = "x".repeat(31);
        assert!(validate_submission(&long_name).is_err());

        let mut negative = submission();
        negative.price = -1;
        assert!(validate_submission(&negative).is_err());

        let mut no_subcategory = submission();
        no_subcategory.subcategories.clear();
        assert!(validate_submission(&no_subcategory).is_err());

        let mut too_many_demos = submission();
        too_many_demos.demos = vec![DemoUpload::default(); MAX_DEMOS + 1];
        assert!(validate_submission(&too_many_demos).is_err());
    }

    #[test]
    fn dedup_sorts_ids() {
        assert_eq!(dedup_ids(&[3, 1, 3, 2]), vec![1, 2, 3]);
    }
}
