mod common;

use engine::{EngineError, PluginKind, PluginRef};

use common::{add_plugin, catalog, count_rows, seed_categories, user};

#[tokio::test]
async fn average_is_mean_of_all_ratings() {
    let t = catalog().await;
    let staff = user(&t.db, "staff", true, false).await;
    let [_, _, synth] = seed_categories(&t.engine).await;
    let serum = add_plugin(&t.engine, &staff, PluginKind::Pro, "Serum", &[synth]).await;

    let scores = [0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0];
    let mut sum = 0.0;
    for (i, score) in scores.iter().enumerate() {
        let rater = user(&t.db, &format!("rater{i}"), false, false).await;
        let average = t
            .engine
            .submit_rating(rater.user_id, serum, *score)
            .await
            .unwrap();
        sum += score;
        let expected = sum / (i + 1) as f64;
        assert!((average - expected).abs() < 1e-9, "{average} != {expected}");

        let detail = t.engine.plugin_detail(serum, None).await.unwrap();
        assert!((detail.plugin.rating - expected).abs() < 1e-9);
        assert_eq!(detail.rating_count, i as u64 + 1);
    }
}

#[tokio::test]
async fn second_rating_from_same_user_overwrites() {
    let t = catalog().await;
    let staff = user(&t.db, "staff", true, false).await;
    let alice = user(&t.db, "alice", false, false).await;
    let bob = user(&t.db, "bob", false, false).await;
    let [_, _, synth] = seed_categories(&t.engine).await;
    let vital = add_plugin(&t.engine, &staff, PluginKind::Alt, "Vital", &[synth]).await;

    t.engine.submit_rating(alice.user_id, vital, 5.0).await.unwrap();
    t.engine.submit_rating(bob.user_id, vital, 3.0).await.unwrap();
    let average = t.engine.submit_rating(alice.user_id, vital, 1.0).await.unwrap();
    assert_eq!(average, 2.0);

    assert_eq!(
        count_rows(&t.db, "SELECT COUNT(*) FROM ratings").await,
        2
    );
    let detail = t.engine.plugin_detail(vital, Some(alice.user_id)).await.unwrap();
    assert_eq!(detail.user_rating, Some(1.0));
    let stats = t.engine.rating_stats(vital).await.unwrap();
    assert_eq!(stats.count, 2);
    assert_eq!(stats.average, 2.0);
}

#[tokio::test]
async fn ratings_of_each_kind_are_kept_apart() {
    let t = catalog().await;
    let staff = user(&t.db, "staff", true, false).await;
    let alice = user(&t.db, "alice", false, false).await;
    let [_, _, synth] = seed_categories(&t.engine).await;

    // Same row id in both tables.
    let pro = add_plugin(&t.engine, &staff, PluginKind::Pro, "Serum", &[synth]).await;
    let alt = add_plugin(&t.engine, &staff, PluginKind::Alt, "Vital", &[synth]).await;
    assert_eq!(pro.id(), alt.id());

    t.engine.submit_rating(alice.user_id, pro, 4.0).await.unwrap();
    t.engine.submit_rating(alice.user_id, alt, 2.0).await.unwrap();

    assert_eq!(t.engine.user_rating(alice.user_id, pro).await.unwrap(), Some(4.0));
    assert_eq!(t.engine.user_rating(alice.user_id, alt).await.unwrap(), Some(2.0));
    assert_eq!(t.engine.plugin_detail(pro, None).await.unwrap().plugin.rating, 4.0);
}

#[tokio::test]
async fn concurrent_ratings_are_not_lost() {
    let t = catalog().await;
    let staff = user(&t.db, "staff", true, false).await;
    let alice = user(&t.db, "alice", false, false).await;
    let bob = user(&t.db, "bob", false, false).await;
    let [reverb, _, _] = seed_categories(&t.engine).await;
    let room = add_plugin(&t.engine, &staff, PluginKind::Pro, "Valhalla Room", &[reverb]).await;

    let (first, second) = tokio::join!(
        t.engine.submit_rating(alice.user_id, room, 4.0),
        t.engine.submit_rating(bob.user_id, room, 2.0),
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(
        count_rows(&t.db, "SELECT COUNT(*) FROM ratings").await,
        2
    );
    let detail = t.engine.plugin_detail(room, None).await.unwrap();
    assert_eq!(detail.plugin.rating, 3.0);
}

#[tokio::test]
async fn invalid_scores_are_rejected_without_writes() {
    let t = catalog().await;
    let staff = user(&t.db, "staff", true, false).await;
    let alice = user(&t.db, "alice", false, false).await;
    let [_, _, synth] = seed_categories(&t.engine).await;
    let serum = add_plugin(&t.engine, &staff, PluginKind::Pro, "Serum", &[synth]).await;

    for score in [0.0, 5.5, -1.0, 2.3, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            t.engine.submit_rating(alice.user_id, serum, score).await,
            Err(EngineError::InvalidScore(_))
        ));
    }
    assert_eq!(
        count_rows(&t.db, "SELECT COUNT(*) FROM ratings").await,
        0
    );
}

#[tokio::test]
async fn rating_unknown_plugin_is_not_found() {
    let t = catalog().await;
    let alice = user(&t.db, "alice", false, false).await;

    assert!(matches!(
        t.engine.submit_rating(alice.user_id, PluginRef::Alt(42), 3.0).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert_eq!(
        count_rows(&t.db, "SELECT COUNT(*) FROM ratings").await,
        0
    );
}
