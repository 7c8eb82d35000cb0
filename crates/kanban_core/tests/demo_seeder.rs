use kanban_core::cache::LocalCache;
use kanban_core::seed::demo_data::{DEMO_CONTACT_COUNT, DEMO_TASK_COUNT};
use kanban_core::{
    Board, ContactRepository, MemoryRemoteStore, RemoteStore, SeedError, SeedOutcome,
    TaskRepository, UserRepository,
};
use serde_json::json;
use std::sync::Arc;

fn board_with(remote: &Arc<MemoryRemoteStore>) -> Board {
    Board::new(
        Arc::clone(remote) as Arc<dyn RemoteStore>,
        LocalCache::open_in_memory().unwrap(),
    )
}

#[tokio::test]
async fn first_upload_writes_demo_set() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let board = board_with(&remote);

    let outcome = board.seeder().upload(false).await.unwrap();

    assert_eq!(
        outcome,
        SeedOutcome::Uploaded {
            contacts: DEMO_CONTACT_COUNT,
            tasks: DEMO_TASK_COUNT
        }
    );
    let status = board.seeder().check().await;
    assert_eq!(status.contacts_count, DEMO_CONTACT_COUNT);
    assert_eq!(status.tasks_count, DEMO_TASK_COUNT);
    assert!(status.all_exist());
}

#[tokio::test]
async fn second_initialize_performs_no_writes() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let board = board_with(&remote);
    let (first, users) = board.seeder().initialize().await.unwrap();
    assert!(matches!(first, SeedOutcome::Uploaded { .. }));
    assert_eq!(users, 2);
    let writes = remote.write_count();

    let (outcome, users) = board.seeder().initialize().await.unwrap();

    assert!(matches!(outcome, SeedOutcome::Skipped(status) if status.all_exist()));
    assert_eq!(users, 0);
    assert_eq!(remote.write_count(), writes);
}

#[tokio::test]
async fn partial_data_is_overwritten_without_force() {
    let remote = Arc::new(MemoryRemoteStore::with_data(json!({
        "contacts": {"mine": {"name": "Only Contact", "email": "only@demo.com"}}
    })));
    let board = board_with(&remote);

    let outcome = board.seeder().upload(false).await.unwrap();

    assert!(matches!(outcome, SeedOutcome::Uploaded { .. }));
    assert!(board.contacts().get_contact("mine").await.unwrap().is_none());
}

#[tokio::test]
async fn reset_leaves_exactly_the_demo_set() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let board = board_with(&remote);
    board.seeder().upload(false).await.unwrap();
    board
        .store()
        .save(
            "tasks/extra",
            json!({
                "id": "extra",
                "title": "Leftover",
                "category": "User Story",
                "dueDate": "2025-12-01",
                "createdAt": "2025-01-01T00:00:00Z",
                "createdBy": "guest",
                "updatedAt": "2025-01-01T00:00:00Z"
            }),
        )
        .await;
    board.store().delete("contacts/contact_demo_3").await;

    let outcome = board.seeder().reset().await.unwrap();

    assert!(matches!(outcome, SeedOutcome::Uploaded { .. }));
    let contacts = board.contacts().list_contacts().await.unwrap();
    let tasks = board.tasks().list_tasks().await.unwrap();
    assert_eq!(contacts.len(), DEMO_CONTACT_COUNT);
    assert_eq!(tasks.len(), DEMO_TASK_COUNT);
    assert!(tasks.iter().all(|task| task.id.starts_with("task_demo_")));
    assert!(contacts.iter().any(|c| c.id == "contact_demo_3"));
}

#[tokio::test]
async fn upload_fails_when_remote_is_offline() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let board = board_with(&remote);
    remote.set_connected(false);

    let err = board.seeder().upload(true).await.unwrap_err();

    assert!(matches!(err, SeedError::Upload(_)));
}

#[tokio::test]
async fn demo_users_are_seeded_once_with_linked_contacts() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let board = board_with(&remote);

    assert_eq!(board.seeder().ensure_demo_users().await.unwrap(), 2);
    assert_eq!(board.seeder().ensure_demo_users().await.unwrap(), 0);

    let anton = board
        .users()
        .find_user_by_email("ANTON@gmail.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(anton.id, "user_demo_1");
    let linked = board.contacts().get_contact("user_demo_1").await.unwrap().unwrap();
    assert_eq!(linked.user_id.as_deref(), Some("user_demo_1"));
    assert_eq!(linked.phone, "");
}
