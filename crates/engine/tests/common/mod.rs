#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc};

use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Actor, DemoUpload, Engine, LocalStorage, MediaStorage, PluginKind, PluginRef,
    PluginSubmission, Upload,
};
use migration::MigratorTrait;
use uuid::Uuid;

pub struct TestCatalog {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub media_root: PathBuf,
}

impl Drop for TestCatalog {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.media_root);
    }
}

pub fn media_root() -> PathBuf {
    std::env::temp_dir().join(format!("plugin_catalog_{}", Uuid::new_v4()))
}

pub async fn catalog() -> TestCatalog {
    let root = media_root();
    let storage = Arc::new(LocalStorage::new(&root, "/media/"));
    catalog_with_storage(storage, root).await
}

pub async fn catalog_with_storage(storage: Arc<dyn MediaStorage>, media_root: PathBuf) -> TestCatalog {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .storage(storage)
        .build()
        .await
        .unwrap();
    TestCatalog {
        engine,
        db,
        media_root,
    }
}

/// Insert a user row directly, skipping password hashing.
pub async fn user(db: &DatabaseConnection, username: &str, is_staff: bool, is_superuser: bool) -> Actor {
    let backend = db.get_database_backend();
    let result = db
        .execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password, is_staff, is_superuser, date_joined) \
             VALUES (?, ?, ?, ?, ?)",
            vec![
                username.into(),
                "!".into(),
                is_staff.into(),
                is_superuser.into(),
                "2026-01-05 00:00:00+00:00".into(),
            ],
        ))
        .await
        .unwrap();
    Actor {
        user_id: result.last_insert_id() as i32,
        is_staff,
        is_superuser,
    }
}

/// Seeds `Effects` (reverb, delay) and `Instruments` (synth).
/// Returns the subcategory ids `[reverb, delay, synth]`.
pub async fn seed_categories(engine: &Engine) -> [i32; 3] {
    engine.create_category("Effects", None).await.unwrap();
    engine.create_category("Instruments", None).await.unwrap();
    let reverb = engine
        .create_subcategory("effects", "Reverb", None)
        .await
        .unwrap();
    let delay = engine
        .create_subcategory("effects", "Delay", None)
        .await
        .unwrap();
    let synth = engine
        .create_subcategory("instruments", "Synth", None)
        .await
        .unwrap();
    [reverb.id, delay.id, synth.id]
}

pub fn submission(kind: PluginKind, name: &str, subcategories: &[i32]) -> PluginSubmission {
    PluginSubmission {
        kind,
        name: name.to_string(),
        date_released: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        subcategories: subcategories.to_vec(),
        price: match kind {
            PluginKind::Pro => 99,
            PluginKind::Alt => 0,
        },
        description: format!("{name} description"),
        size: 42.5,
        download_link: "https://example.com/download".to_string(),
        image: None,
        link_to_pro_plugins: Vec::new(),
        demos: Vec::new(),
        suggestion_id: None,
    }
}

pub fn demo(file_name: &str, title: Option<&str>) -> DemoUpload {
    DemoUpload {
        title: title.map(ToString::to_string),
        file: Some(Upload {
            file_name: file_name.to_string(),
            bytes: b"RIFF....WAVE".to_vec(),
        }),
    }
}

pub async fn add_plugin(engine: &Engine, staff: &Actor, kind: PluginKind, name: &str, subcategories: &[i32]) -> PluginRef {
    engine
        .submit_plugin(staff, submission(kind, name, subcategories))
        .await
        .unwrap()
}

pub async fn count_rows(db: &DatabaseConnection, sql: &str) -> i64 {
    let row = db
        .query_one(Statement::from_string(db.get_database_backend(), sql))
        .await
        .unwrap()
        .unwrap();
    row.try_get_by_index::<i64>(0).unwrap()
}
