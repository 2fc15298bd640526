use chrono::Duration;
use hanzi_core::model::{
    AchievementId, CharacterId, GameSessionRecord, User, UserId, UserProgress, UserUpdate,
};
use hanzi_core::time::fixed_now;
use storage::repository::{
    AchievementRepository, GameSessionRepository, ProgressRepository, Storage, StorageError,
    UserRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn learner(id: &str) -> User {
    User::new(
        UserId::new(id).unwrap(),
        "学生",
        "student@example.com",
        Some("https://example.com/a.png".into()),
        fixed_now(),
    )
}

fn session(user_id: &UserId, offset_minutes: i64, score: u64) -> GameSessionRecord {
    let started_at = fixed_now() + Duration::minutes(offset_minutes);
    GameSessionRecord {
        id: None,
        user_id: user_id.clone(),
        characters_studied: vec![CharacterId::new(1), CharacterId::new(5), CharacterId::new(9)],
        score,
        correct_answers: 2,
        total_questions: 3,
        time_spent_secs: 95,
        started_at,
        completed_at: Some(started_at + Duration::seconds(95)),
    }
}

#[tokio::test]
async fn sqlite_user_roundtrip_and_partial_update() {
    let repo = connect("memdb_users").await;
    let user = learner("u-roundtrip");
    repo.upsert_user(&user).await.unwrap();

    let fetched = repo.get_user(&user.id).await.unwrap().expect("stored");
    assert_eq!(fetched, user);

    repo.add_experience(&user.id, 1_250).await.unwrap();
    repo.set_level(&user.id, 2).await.unwrap();

    let later = fixed_now() + Duration::hours(1);
    let updated = repo
        .update_user(
            &user.id,
            &UserUpdate {
                total_score: Some(1_250),
                name: Some("Renamed".into()),
                ..UserUpdate::default()
            },
            later,
        )
        .await
        .unwrap();
    assert_eq!(updated.experience, 1_250);
    assert_eq!(updated.level, 2);
    assert_eq!(updated.total_score, 1_250);
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.last_login_at, later);

    let missing = UserId::new("ghost").unwrap();
    assert!(repo.get_user(&missing).await.unwrap().is_none());
    let err = repo.add_experience(&missing, 10).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_progress_upserts_by_user_and_character() {
    let repo = connect("memdb_progress").await;
    let uid = UserId::new("u-progress").unwrap();

    let mut first = UserProgress::first_attempt(uid.clone(), CharacterId::new(7), true, fixed_now());
    let second = UserProgress::first_attempt(uid.clone(), CharacterId::new(2), false, fixed_now());
    repo.upsert_progress(&[first.clone(), second]).await.unwrap();

    for _ in 0..2 {
        first.record_attempt(true, fixed_now() + Duration::minutes(1), 3);
    }
    repo.upsert_progress(std::slice::from_ref(&first)).await.unwrap();

    let all = repo.list_progress(&uid).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].character_id, CharacterId::new(2));
    assert_eq!(all[1], first);
    assert!(all[1].mastered);

    let one = repo
        .get_progress(&uid, CharacterId::new(7))
        .await
        .unwrap()
        .expect("progress");
    assert_eq!(one.correct_attempts, 3);
}

#[tokio::test]
async fn sqlite_achievements_keep_saved_order() {
    let repo = connect("memdb_achievements").await;
    let uid = UserId::new("u-ach").unwrap();

    repo.save_unlocked(&uid, &[AchievementId::new("3"), AchievementId::new("1")])
        .await
        .unwrap();
    let listed = repo.list_unlocked(&uid).await.unwrap();
    assert_eq!(
        listed,
        vec![AchievementId::new("3"), AchievementId::new("1")]
    );

    repo.save_unlocked(&uid, &[AchievementId::new("2")]).await.unwrap();
    assert_eq!(
        repo.list_unlocked(&uid).await.unwrap(),
        vec![AchievementId::new("2")]
    );
}

#[tokio::test]
async fn sqlite_sessions_append_update_and_list() {
    let repo = connect("memdb_sessions").await;
    let uid = UserId::new("u-sessions").unwrap();

    let older = repo.append_session(&session(&uid, 0, 200)).await.unwrap();
    let newer = repo.append_session(&session(&uid, 30, 300)).await.unwrap();

    let mut in_progress = session(&uid, 60, 0);
    in_progress.completed_at = None;
    let open = repo.append_session(&in_progress).await.unwrap();

    let fetched = repo.get_session(older).await.unwrap();
    assert_eq!(fetched.characters_studied.len(), 3);
    assert_eq!(fetched.score, 200);

    let listed = repo.list_sessions(&uid, 10).await.unwrap();
    let ids: Vec<_> = listed.iter().filter_map(|s| s.id).collect();
    assert_eq!(ids, vec![open, newer, older]);
    assert!(!listed[0].is_completed());

    let mut finished = repo.get_session(open).await.unwrap();
    finished.score = 900;
    finished.completed_at = Some(finished.started_at + Duration::seconds(40));
    repo.update_session(&finished).await.unwrap();
    assert!(repo.get_session(open).await.unwrap().is_completed());

    assert_eq!(repo.list_sessions(&uid, 1).await.unwrap().len(), 1);

    let mut unsaved = session(&uid, 0, 0);
    unsaved.id = None;
    let err = repo.update_session(&unsaved).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_achievement_duplicates_match_in_memory() {
    use storage::repository::InMemoryRepository;

    let repo = connect("memdb_achievement_dupes").await;
    let memory = InMemoryRepository::new();
    let uid = UserId::new("u-dupes").unwrap();
    let ids = [
        AchievementId::new("4"),
        AchievementId::new("1"),
        AchievementId::new("4"),
    ];

    repo.save_unlocked(&uid, &ids).await.unwrap();
    memory.save_unlocked(&uid, &ids).await.unwrap();
    let expected = vec![AchievementId::new("4"), AchievementId::new("1")];
    assert_eq!(repo.list_unlocked(&uid).await.unwrap(), expected);
    assert_eq!(memory.list_unlocked(&uid).await.unwrap(), expected);
}

#[tokio::test]
async fn sqlite_completed_since_filters_by_completion_time() {
    let repo = connect("memdb_completed_since").await;
    let uid = UserId::new("u-window").unwrap();

    repo.append_session(&session(&uid, -2 * 24 * 60, 100)).await.unwrap();
    let recent = repo.append_session(&session(&uid, 0, 200)).await.unwrap();
    let mut open = session(&uid, 10, 0);
    open.completed_at = None;
    repo.append_session(&open).await.unwrap();

    let window = repo
        .list_completed_since(&uid, fixed_now() - Duration::days(1))
        .await
        .unwrap();
    let ids: Vec<_> = window.iter().filter_map(|s| s.id).collect();
    assert_eq!(ids, vec![recent]);

    let wider = repo
        .list_completed_since(&uid, fixed_now() - Duration::days(3))
        .await
        .unwrap();
    assert_eq!(wider.len(), 2);
}

#[tokio::test]
async fn connect_creates_a_missing_database_file() {
    let path = std::env::temp_dir().join(format!(
        "hanzi-storage-create-{}.sqlite3",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);

    let url = format!("sqlite://{}", path.display());
    let storage = Storage::sqlite(&url).await.unwrap();
    assert!(path.exists());
    let uid = UserId::new("u-file").unwrap();
    assert!(storage.users.get_user(&uid).await.unwrap().is_none());

    drop(storage);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn storage_sqlite_wires_every_repository() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    let user = learner("u-storage");
    storage.users.upsert_user(&user).await.unwrap();
    storage
        .achievements
        .save_unlocked(&user.id, &[AchievementId::new("1")])
        .await
        .unwrap();
    storage
        .sessions
        .append_session(&session(&user.id, 0, 100))
        .await
        .unwrap();

    assert!(storage.users.get_user(&user.id).await.unwrap().is_some());
    assert_eq!(
        storage.achievements.list_unlocked(&user.id).await.unwrap().len(),
        1
    );
    assert_eq!(
        storage.sessions.list_sessions(&user.id, 5).await.unwrap().len(),
        1
    );
    assert!(storage.progress.list_progress(&user.id).await.unwrap().is_empty());
}
