use chrono::NaiveDate;
use kanban_core::service::contact_service::ContactServiceError;
use kanban_core::{
    Board, ContactRepository, MemoryRemoteStore, NewContact, NewTask, RemoteStore, TaskCategory,
    TaskRepository,
};
use kanban_core::cache::LocalCache;
use std::sync::Arc;
use std::time::Duration;

fn contact(name: &str, email: &str) -> NewContact {
    NewContact {
        name: name.to_string(),
        email: email.to_string(),
        phone: "+49 1111 11 111".to_string(),
    }
}

fn task_for(title: &str, assignees: &[&str]) -> NewTask {
    let mut task = NewTask::new(
        title,
        TaskCategory::UserStory,
        NaiveDate::from_ymd_opt(2025, 12, 18).unwrap(),
    );
    task.assigned_to = assignees.iter().map(|id| id.to_string()).collect();
    task
}

#[tokio::test]
async fn deleting_contact_unassigns_it_and_touches_only_affected_tasks() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let board = Board::new(
        Arc::clone(&remote) as Arc<dyn RemoteStore>,
        LocalCache::open_in_memory().unwrap(),
    );
    let contacts = board.contacts();
    let tasks = board.tasks();

    let sofia = contacts
        .create_contact(contact("Sofia Müller", "sofia@gmail.com"), "guest")
        .await
        .unwrap();
    let marcel = contacts
        .create_contact(contact("Marcel Bauer", "marcel@gmail.com"), "guest")
        .await
        .unwrap();
    let shared = tasks
        .create_task(task_for("Shared", &[&sofia.id, &marcel.id]), "guest")
        .await
        .unwrap();
    let solo = tasks
        .create_task(task_for("Solo", &[&sofia.id]), "guest")
        .await
        .unwrap();
    let other = tasks
        .create_task(task_for("Other", &[&marcel.id]), "guest")
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    let writes_before = remote.write_count();
    assert!(contacts.delete_contact(&sofia.id).await.unwrap());
    assert_eq!(remote.write_count(), writes_before + 1);

    assert!(contacts.get_contact(&sofia.id).await.unwrap().is_none());

    let shared_after = tasks.get_task(&shared.id).await.unwrap().unwrap();
    assert_eq!(shared_after.assigned_to, vec![marcel.id.clone()]);
    assert!(shared_after.updated_at > shared.updated_at);

    let solo_after = tasks.get_task(&solo.id).await.unwrap().unwrap();
    assert!(solo_after.assigned_to.is_empty());
    assert!(solo_after.updated_at > solo.updated_at);

    let other_after = tasks.get_task(&other.id).await.unwrap().unwrap();
    assert_eq!(other_after, other);
}

#[tokio::test]
async fn deleting_unknown_contact_writes_nothing() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let board = Board::new(
        Arc::clone(&remote) as Arc<dyn RemoteStore>,
        LocalCache::open_in_memory().unwrap(),
    );

    assert!(!board.contacts().delete_contact("ghost").await.unwrap());
    assert_eq!(remote.write_count(), 0);
}

#[tokio::test]
async fn duplicate_email_is_rejected_before_create() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let board = Board::new(
        Arc::clone(&remote) as Arc<dyn RemoteStore>,
        LocalCache::open_in_memory().unwrap(),
    );
    let service = board.contact_service();
    service
        .add_contact(contact("Sofia Müller", "sofia@gmail.com"), "guest")
        .await
        .unwrap();
    let writes = remote.write_count();

    let err = service
        .add_contact(contact("Sofia Other", "SOFIA@gmail.com"), "guest")
        .await
        .unwrap_err();

    assert!(matches!(err, ContactServiceError::DuplicateEmail(_)));
    assert_eq!(remote.write_count(), writes);
    assert_eq!(service.list_contacts().await.unwrap().len(), 1);
}

#[tokio::test]
async fn edit_keeps_own_email_and_recomputes_initials() {
    let board = Board::in_memory().unwrap();
    let service = board.contact_service();
    let created = service
        .add_contact(contact("Sofia Müller", "sofia@gmail.com"), "guest")
        .await
        .unwrap();
    service
        .add_contact(contact("Marcel Bauer", "marcel@gmail.com"), "guest")
        .await
        .unwrap();

    let edited = service
        .edit_contact(&created.id, contact("Laura Schmidt", "sofia@gmail.com"))
        .await
        .unwrap();
    assert_eq!(edited.initials, "LS");
    assert_eq!(edited.color, created.color);

    let clash = service
        .edit_contact(&created.id, contact("Laura Schmidt", "marcel@gmail.com"))
        .await
        .unwrap_err();
    assert!(matches!(clash, ContactServiceError::DuplicateEmail(_)));

    let missing = service
        .edit_contact("ghost", contact("Nobody Here", "nobody@gmail.com"))
        .await
        .unwrap_err();
    assert!(matches!(missing, ContactServiceError::NotFound(_)));
}

#[tokio::test]
async fn invalid_contact_fields_are_rejected() {
    let board = Board::in_memory().unwrap();
    let service = board.contact_service();

    let mut no_phone = contact("Sofia Müller", "sofia@gmail.com");
    no_phone.phone = " ".to_string();
    assert!(matches!(
        service.add_contact(no_phone, "guest").await,
        Err(ContactServiceError::MissingPhone)
    ));
    assert!(matches!(
        service.add_contact(contact("S", "s@gmail.com"), "guest").await,
        Err(ContactServiceError::InvalidName)
    ));
    assert!(matches!(
        service
            .add_contact(contact("Sofia Müller", "sofia"), "guest")
            .await,
        Err(ContactServiceError::InvalidEmail)
    ));
}
