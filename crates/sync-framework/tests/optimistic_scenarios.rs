use std::sync::Arc;
use std::time::Duration;
use sync_framework::mock::{MockError, MockRemote, RecordingSink};
use sync_framework::{
    AsyncLoader, CollectionOptions, Entity, LoaderOptions, MutationMessages, NotificationKind, OptimisticCollection,
    SyncError,
};

// --- Test Entity ---

#[derive(Clone, Debug, PartialEq)]
struct Item {
    id: u32,
    name: String,
}

impl Entity for Item {
    type Id = u32;

    fn id(&self) -> &u32 {
        &self.id
    }
}

fn item(id: u32, name: &str) -> Item {
    Item {
        id,
        name: name.to_string(),
    }
}

fn seeded(items: Vec<Item>, sink: Arc<RecordingSink>) -> OptimisticCollection<Item> {
    let list = MockRemote::<(), Vec<Item>>::new();
    let collection = OptimisticCollection::new(list.fetcher(), sink, CollectionOptions::default());
    collection.set_items(items);
    collection
}

#[tokio::test]
async fn rejected_update_shows_speculative_value_then_reverts() {
    let sink = Arc::new(RecordingSink::new());
    let collection = Arc::new(seeded(vec![item(1, "A")], sink.clone()));
    let update = MockRemote::<Item, Item>::new();
    let responder = update.expect_call().deferred();

    let mut state = collection.subscribe();
    let call = tokio::spawn({
        let collection = Arc::clone(&collection);
        let handler = update.handler();
        async move {
            collection
                .update_item(item(1, "B"), handler, MutationMessages::new())
                .await
        }
    });

    // Transient speculative state is observable while the write is pending.
    state
        .wait_for(|s| s.items == vec![item(1, "B")])
        .await
        .unwrap();

    responder.reject("network");
    let error = call.await.unwrap().unwrap_err();

    assert_eq!(error.downcast_ref::<MockError>(), Some(&MockError::new("network")));
    assert_eq!(collection.items(), vec![item(1, "A")]);

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, NotificationKind::Error);
    assert!(events[0].message.contains("network"));
    update.verify();
}

#[tokio::test]
async fn add_into_empty_collection_keeps_canonical_entity() {
    let sink = Arc::new(RecordingSink::new());
    let collection = seeded(Vec::new(), sink.clone());
    let add = MockRemote::<Item, Item>::new();
    add.expect_call().return_ok(item(5, "X-canonical"));

    let created = collection
        .add_item(item(5, "X"), add.handler(), MutationMessages::new())
        .await
        .unwrap();

    assert_eq!(created, item(5, "X-canonical"));
    assert_eq!(collection.items(), vec![item(5, "X-canonical")]);
    assert_eq!(add.calls(), vec![item(5, "X")]);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn failed_add_leaves_no_trace_of_the_key() {
    let sink = Arc::new(RecordingSink::new());
    let collection = seeded(vec![item(1, "A")], sink.clone());
    let add = MockRemote::<Item, Item>::new();
    add.expect_call().return_err("quota exceeded");

    let result = collection
        .add_item(item(2, "B"), add.handler(), MutationMessages::new())
        .await;

    assert!(result.is_err());
    assert_eq!(collection.items(), vec![item(1, "A")]);
    assert_eq!(sink.errors(), vec!["Error adding item: quota exceeded".to_string()]);
}

#[tokio::test]
async fn delete_of_missing_key_rejects_without_remote_call() {
    let sink = Arc::new(RecordingSink::new());
    let collection = seeded(vec![item(1, "A")], sink.clone());
    let delete = MockRemote::<u32, ()>::new();

    let error = collection
        .delete_item(9, delete.handler(), MutationMessages::new())
        .await
        .unwrap_err();

    assert!(matches!(error, SyncError::NotFound { ref id } if id == "9"));
    assert_eq!(delete.call_count(), 0);
    assert_eq!(collection.items(), vec![item(1, "A")]);
    // Not-found is left to the caller: no notification.
    assert!(sink.is_empty());
}

#[tokio::test]
async fn update_of_missing_key_rejects_without_remote_call() {
    let sink = Arc::new(RecordingSink::new());
    let collection = seeded(Vec::new(), sink.clone());
    let update = MockRemote::<Item, Item>::new();

    let error = collection
        .update_item(item(3, "C"), update.handler(), MutationMessages::new())
        .await
        .unwrap_err();

    assert!(error.is_not_found());
    assert_eq!(update.call_count(), 0);
}

#[tokio::test]
async fn failed_delete_restores_identical_entity_in_place() {
    let sink = Arc::new(RecordingSink::new());
    let original = vec![item(1, "A"), item(2, "B"), item(3, "C")];
    let collection = Arc::new(seeded(original.clone(), sink.clone()));
    let delete = MockRemote::<u32, ()>::new();
    let responder = delete.expect_call().deferred();

    let mut state = collection.subscribe();
    let call = tokio::spawn({
        let collection = Arc::clone(&collection);
        let handler = delete.handler();
        async move { collection.delete_item(1, handler, MutationMessages::new()).await }
    });
    state.wait_for(|s| s.items.len() == 2).await.unwrap();
    assert!(collection.get(&1).is_none());

    responder.reject("forbidden");
    assert!(call.await.unwrap().is_err());
    assert_eq!(collection.items(), original);
    assert_eq!(sink.errors(), vec!["Error deleting item: forbidden".to_string()]);
}

#[tokio::test]
async fn unserialized_same_key_updates_race_to_last_response() {
    let sink = Arc::new(RecordingSink::new());
    let list = MockRemote::<(), Vec<Item>>::new();
    let collection = Arc::new(OptimisticCollection::new(
        list.fetcher(),
        sink,
        CollectionOptions::default().serialize_per_key(false),
    ));
    collection.set_items(vec![item(1, "A")]);

    let update = MockRemote::<Item, Item>::new();
    let first = update.expect_call().deferred();
    let second = update.expect_call().deferred();

    let mut state = collection.subscribe();
    let spawn_update = |name: &'static str| {
        let collection = Arc::clone(&collection);
        let handler = update.handler();
        tokio::spawn(async move {
            collection
                .update_item(item(1, name), handler, MutationMessages::new())
                .await
        })
    };
    let a = spawn_update("B");
    state.wait_for(|s| s.items[0].name == "B").await.unwrap();
    let b = spawn_update("C");
    state.wait_for(|s| s.items[0].name == "C").await.unwrap();

    // Both calls are in flight at once.
    assert_eq!(update.call_count(), 2);

    second.resolve(item(1, "C-canonical"));
    b.await.unwrap().unwrap();
    first.resolve(item(1, "B-canonical"));
    a.await.unwrap().unwrap();

    assert_eq!(collection.items(), vec![item(1, "B-canonical")]);
}

#[tokio::test(start_paused = true)]
async fn fast_load_never_reveals_loading_but_toggles_in_flight() {
    let sink = Arc::new(RecordingSink::new());
    let loader = Arc::new(AsyncLoader::new(
        || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, MockError>(7u32)
        },
        sink,
        LoaderOptions::default(),
    ));

    let mut state = loader.subscribe();
    let observer = tokio::spawn(async move {
        let mut saw_in_flight = false;
        let mut saw_visible = false;
        while state.changed().await.is_ok() {
            let current = state.borrow_and_update().clone();
            saw_in_flight |= current.in_flight;
            saw_visible |= current.loading_visible;
            if current.data.is_some() {
                break;
            }
        }
        (saw_in_flight, saw_visible)
    });
    tokio::task::yield_now().await;

    assert_eq!(loader.fetch().await, Some(7));
    let (saw_in_flight, saw_visible) = observer.await.unwrap();
    assert!(saw_in_flight);
    assert!(!saw_visible);
    assert!(!loader.state().in_flight);
}
