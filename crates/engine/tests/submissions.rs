mod common;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use engine::{
    AUDIO_FOLDER, CatalogQuery, DemoUpload, EngineError, LocalStorage, MediaStorage, NewSuggestion,
    PluginKind, ResultEngine, SuggestionStatus,
};

use common::{
    add_plugin, catalog, catalog_with_storage, count_rows, demo, media_root, seed_categories,
    submission, user,
};

/// Local storage that refuses the n-th audio demo.
#[derive(Debug)]
struct FailingAudioStorage {
    inner: LocalStorage,
    fail_on: usize,
    audio_writes: AtomicUsize,
}

#[async_trait]
impl MediaStorage for FailingAudioStorage {
    async fn store(&self, folder: &str, file_name: &str, bytes: &[u8]) -> ResultEngine<String> {
        if folder == AUDIO_FOLDER {
            let n = self.audio_writes.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.fail_on {
                return Err(EngineError::Storage("disk full".to_string()));
            }
        }
        self.inner.store(folder, file_name, bytes).await
    }

    async fn exists(&self, path: &str) -> bool {
        self.inner.exists(path).await
    }

    async fn remove(&self, path: &str) -> ResultEngine<()> {
        self.inner.remove(path).await
    }

    fn url(&self, path: &str) -> String {
        self.inner.url(path)
    }
}

fn suggestion(name: &str) -> NewSuggestion {
    NewSuggestion {
        name: name.to_string(),
        suggested_type: PluginKind::Pro,
        link: "https://example.com/plugin".to_string(),
        description: "Please add it".to_string(),
    }
}

fn files_under(root: &std::path::Path) -> usize {
    std::fs::read_dir(root.join(AUDIO_FOLDER))
        .map(|dir| dir.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn pro_submission_with_demos_approves_suggestion() {
    let t = catalog().await;
    let staff = user(&t.db, "staff", true, false).await;
    let alice = user(&t.db, "alice", false, false).await;
    let [_, _, synth] = seed_categories(&t.engine).await;
    let suggested = t
        .engine
        .create_suggestion(alice.user_id, suggestion("Serum"))
        .await
        .unwrap();
    assert_eq!(suggested.status, SuggestionStatus::Pending);

    let mut serum = submission(PluginKind::Pro, "Serum", &[synth]);
    serum.demos = vec![
        demo("bass.wav", Some("Growl bass")),
        DemoUpload::default(),
        demo("pads/lush pad.wav", None),
    ];
    serum.suggestion_id = Some(suggested.id);
    let key = t.engine.submit_plugin(&staff, serum).await.unwrap();

    let listing = t
        .engine
        .list_plugins(CatalogQuery::default())
        .await
        .unwrap();
    assert_eq!(listing.plugins.len(), 1);
    assert_eq!(listing.plugins[0].key, key);
    assert_eq!(listing.plugins[0].submitter_id, Some(staff.user_id));

    let detail = t.engine.plugin_detail(key, None).await.unwrap();
    let titles: Vec<_> = detail.demos.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["Growl bass", "lush pad.wav"]);
    assert_eq!(
        count_rows(
            &t.db,
            &format!(
                "SELECT COUNT(*) FROM audio_demos WHERE pro_plugin_id = {} AND alt_plugin_id IS NULL",
                key.id()
            )
        )
        .await,
        2
    );
    assert_eq!(files_under(&t.media_root), 2);

    let mine = t.engine.suggestions_for_user(alice.user_id).await.unwrap();
    assert_eq!(mine[0].status, SuggestionStatus::Approved);
    assert!(t.engine.pending_suggestions().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_demo_rolls_back_everything() {
    let root = media_root();
    let storage = Arc::new(FailingAudioStorage {
        inner: LocalStorage::new(&root, "/media/"),
        fail_on: 2,
        audio_writes: AtomicUsize::new(0),
    });
    let t = catalog_with_storage(storage, root).await;
    let staff = user(&t.db, "staff", true, false).await;
    let alice = user(&t.db, "alice", false, false).await;
    let [_, _, synth] = seed_categories(&t.engine).await;
    let suggested = t
        .engine
        .create_suggestion(alice.user_id, suggestion("Serum"))
        .await
        .unwrap();

    let mut serum = submission(PluginKind::Pro, "Serum", &[synth]);
    serum.demos = vec![demo("one.wav", None), demo("two.wav", None)];
    serum.suggestion_id = Some(suggested.id);
    let result = t.engine.submit_plugin(&staff, serum).await;
    assert!(matches!(result, Err(EngineError::Storage(_))));

    for table in ["pro_plugins", "pro_plugin_subcategories", "audio_demos"] {
        assert_eq!(
            count_rows(&t.db, &format!("SELECT COUNT(*) FROM {table}")).await,
            0,
            "{table} is not empty"
        );
    }
    let pending = t.engine.pending_suggestions().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, suggested.id);
    // The first demo file was written, then discarded.
    assert_eq!(files_under(&t.media_root), 0);
}

#[tokio::test]
async fn alternative_links_to_pro_plugins() {
    let t = catalog().await;
    let staff = user(&t.db, "staff", true, false).await;
    let [reverb, _, synth] = seed_categories(&t.engine).await;
    let serum = add_plugin(&t.engine, &staff, PluginKind::Pro, "Serum", &[synth]).await;
    let massive = add_plugin(&t.engine, &staff, PluginKind::Pro, "Massive", &[synth]).await;

    let mut vital = submission(PluginKind::Alt, "Vital", &[synth, reverb]);
    vital.link_to_pro_plugins = vec![serum.id(), massive.id(), serum.id()];
    vital.demos = vec![demo("vital.wav", None)];
    let vital = t.engine.submit_plugin(&staff, vital).await.unwrap();

    assert_eq!(
        count_rows(&t.db, "SELECT COUNT(*) FROM pro_plugin_alternatives").await,
        2
    );
    assert_eq!(
        count_rows(
            &t.db,
            &format!(
                "SELECT COUNT(*) FROM audio_demos WHERE alt_plugin_id = {} AND pro_plugin_id IS NULL",
                vital.id()
            )
        )
        .await,
        1
    );

    let mut broken = submission(PluginKind::Alt, "Surge", &[synth]);
    broken.link_to_pro_plugins = vec![999];
    assert!(matches!(
        t.engine.submit_plugin(&staff, broken).await,
        Err(EngineError::InvalidField(_))
    ));
    assert_eq!(
        count_rows(&t.db, "SELECT COUNT(*) FROM alt_plugins").await,
        1
    );
}

#[tokio::test]
async fn non_staff_cannot_submit() {
    let t = catalog().await;
    let alice = user(&t.db, "alice", false, false).await;
    let [_, _, synth] = seed_categories(&t.engine).await;

    assert!(matches!(
        t.engine
            .submit_plugin(&alice, submission(PluginKind::Pro, "Serum", &[synth]))
            .await,
        Err(EngineError::Forbidden(_))
    ));
    assert_eq!(
        count_rows(&t.db, "SELECT COUNT(*) FROM pro_plugins").await,
        0
    );
}

#[tokio::test]
async fn unknown_subcategory_is_rejected() {
    let t = catalog().await;
    let staff = user(&t.db, "staff", true, false).await;
    seed_categories(&t.engine).await;

    assert!(matches!(
        t.engine
            .submit_plugin(&staff, submission(PluginKind::Pro, "Serum", &[999]))
            .await,
        Err(EngineError::InvalidField(_))
    ));
}

#[tokio::test]
async fn delete_by_other_user_is_forbidden() {
    let t = catalog().await;
    let owner = user(&t.db, "owner", true, false).await;
    let other = user(&t.db, "other", true, false).await;
    let [_, _, synth] = seed_categories(&t.engine).await;

    let mut serum = submission(PluginKind::Pro, "Serum", &[synth]);
    serum.demos = vec![demo("one.wav", None)];
    let key = t.engine.submit_plugin(&owner, serum).await.unwrap();

    assert!(matches!(
        t.engine.delete_plugin(&other, key).await,
        Err(EngineError::Forbidden(_))
    ));

    assert_eq!(count_rows(&t.db, "SELECT COUNT(*) FROM pro_plugins").await, 1);
    assert_eq!(count_rows(&t.db, "SELECT COUNT(*) FROM audio_demos").await, 1);
    assert_eq!(
        count_rows(&t.db, "SELECT COUNT(*) FROM pro_plugin_subcategories").await,
        1
    );
    assert_eq!(files_under(&t.media_root), 1);
}

#[tokio::test]
async fn owner_and_superuser_can_delete() {
    let t = catalog().await;
    let owner = user(&t.db, "owner", true, false).await;
    let admin = user(&t.db, "admin", true, true).await;
    let alice = user(&t.db, "alice", false, false).await;
    let [_, _, synth] = seed_categories(&t.engine).await;

    let serum = add_plugin(&t.engine, &owner, PluginKind::Pro, "Serum", &[synth]).await;
    let mut vital = submission(PluginKind::Alt, "Vital", &[synth]);
    vital.link_to_pro_plugins = vec![serum.id()];
    vital.demos = vec![demo("vital.wav", None)];
    let vital = t.engine.submit_plugin(&owner, vital).await.unwrap();
    t.engine.submit_rating(alice.user_id, vital, 4.5).await.unwrap();

    t.engine.delete_plugin(&owner, vital).await.unwrap();
    for table in [
        "alt_plugins",
        "alt_plugin_subcategories",
        "pro_plugin_alternatives",
        "audio_demos",
        "ratings",
    ] {
        assert_eq!(
            count_rows(&t.db, &format!("SELECT COUNT(*) FROM {table}")).await,
            0,
            "{table} is not empty"
        );
    }
    assert_eq!(files_under(&t.media_root), 0);

    t.engine.delete_plugin(&admin, serum).await.unwrap();
    assert_eq!(count_rows(&t.db, "SELECT COUNT(*) FROM pro_plugins").await, 0);

    assert!(matches!(
        t.engine.delete_plugin(&admin, serum).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn reject_only_moves_pending_suggestions() {
    let t = catalog().await;
    let staff = user(&t.db, "staff", true, false).await;
    let alice = user(&t.db, "alice", false, false).await;

    let first = t
        .engine
        .create_suggestion(alice.user_id, suggestion("Serum"))
        .await
        .unwrap();
    let second = t
        .engine
        .create_suggestion(alice.user_id, suggestion("Vital"))
        .await
        .unwrap();

    let pending = t.engine.pending_suggestions().await.unwrap();
    let names: Vec<_> = pending.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Serum", "Vital"]);
    let mine = t.engine.suggestions_for_user(alice.user_id).await.unwrap();
    assert_eq!(mine[0].id, second.id);

    assert!(matches!(
        t.engine.reject_suggestion(&alice, first.id).await,
        Err(EngineError::Forbidden(_))
    ));

    let rejected = t.engine.reject_suggestion(&staff, first.id).await.unwrap();
    assert_eq!(rejected.status, SuggestionStatus::Rejected);
    assert!(matches!(
        t.engine.reject_suggestion(&staff, first.id).await,
        Err(EngineError::InvalidState(_))
    ));
    assert!(matches!(
        t.engine.reject_suggestion(&staff, 999).await,
        Err(EngineError::KeyNotFound(_))
    ));

    // Approving through a submission leaves a rejected suggestion alone.
    let [_, _, synth] = seed_categories(&t.engine).await;
    let mut serum = submission(PluginKind::Pro, "Serum", &[synth]);
    serum.suggestion_id = Some(first.id);
    t.engine.submit_plugin(&staff, serum).await.unwrap();
    let mine = t.engine.suggestions_for_user(alice.user_id).await.unwrap();
    let first_now = mine.iter().find(|s| s.id == first.id).unwrap();
    assert_eq!(first_now.status, SuggestionStatus::Rejected);
}

#[tokio::test]
async fn suggestions_are_validated() {
    let t = catalog().await;
    let alice = user(&t.db, "alice", false, false).await;

    let mut bad_link = suggestion("Serum");
    bad_link.link = "not a url".to_string();
    assert!(matches!(
        t.engine.create_suggestion(alice.user_id, bad_link).await,
        Err(EngineError::InvalidField(_))
    ));

    let mut empty = suggestion("  ");
    empty.description = String::new();
    assert!(matches!(
        t.engine.create_suggestion(alice.user_id, empty).await,
        Err(EngineError::InvalidField(_))
    ));
}

#[tokio::test]
async fn users_authenticate_against_hashed_passwords() {
    let t = catalog().await;
    let created = t
        .engine
        .create_user(engine::NewUser {
            username: "carol",
            password: "correct horse",
            email: Some("carol@example.com"),
            is_staff: false,
            is_superuser: false,
        })
        .await
        .unwrap();
    assert!(!created.is_staff);

    let found = t
        .engine
        .authenticate("carol", "correct horse")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, created.id);
    assert!(t.engine.authenticate("carol", "wrong").await.unwrap().is_none());
    assert!(t.engine.authenticate("nobody", "x").await.unwrap().is_none());

    let promoted = t.engine.set_staff("carol", true).await.unwrap();
    assert!(promoted.actor().is_staff);
}
