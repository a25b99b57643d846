use markboard_core::db::open_db_in_memory;
use markboard_core::{
    BookmarkId, BookmarkRepository, BookmarkService, BookmarkServiceError, ConfigError,
    LogActivityRecorder, Namespace, OrderingConfig, OrderingService, OrderingStore,
    SqliteActivityRecorder, SqliteBoardRepository, StoreError,
};
use proptest::prelude::*;
use rusqlite::{params, Connection};
use uuid::Uuid;

use generators::*;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn small_gaps() -> OrderingConfig {
    OrderingConfig::new(4, 1, 4, 4).unwrap()
}

fn bookmarks(conn: &Connection) -> BookmarkService<SqliteBoardRepository<'_>> {
    BookmarkService::new(SqliteBoardRepository::try_new(conn).unwrap())
}

fn ordering(conn: &Connection) -> OrderingService<SqliteBoardRepository<'_>> {
    OrderingService::new(SqliteBoardRepository::try_new(conn).unwrap())
}

fn ordering_with(
    conn: &Connection,
    config: OrderingConfig,
) -> OrderingService<SqliteBoardRepository<'_>, LogActivityRecorder> {
    OrderingService::with_config(
        SqliteBoardRepository::try_new(conn).unwrap(),
        LogActivityRecorder,
        config,
    )
}

fn collection(conn: &Connection, name: &str) -> Namespace {
    Namespace::Collection(bookmarks(conn).create_collection(name).unwrap().id)
}

fn seed(conn: &Connection, namespace: Namespace, count: usize) -> Vec<BookmarkId> {
    let service = bookmarks(conn);
    (0..count)
        .map(|index| {
            service
                .create_bookmark(
                    namespace,
                    format!("https://example.com/{index}"),
                    format!("Bookmark {index}"),
                )
                .unwrap()
                .id
        })
        .collect()
}

fn order(conn: &Connection, namespace: Namespace) -> Vec<BookmarkId> {
    keys(conn, namespace).into_iter().map(|(id, _)| id).collect()
}

fn keys(conn: &Connection, namespace: Namespace) -> Vec<(BookmarkId, i64)> {
    let entries = SqliteBoardRepository::try_new(conn)
        .unwrap()
        .list_order_keys(&namespace)
        .unwrap();
    let keys: Vec<(BookmarkId, i64)> = entries
        .into_iter()
        .map(|entry| (entry.id, entry.order_key))
        .collect();
    assert!(
        keys.windows(2).all(|pair| pair[0].1 < pair[1].1),
        "keys in {namespace} must be strictly increasing: {keys:?}"
    );
    keys
}

#[test]
fn created_bookmarks_append_in_creation_order() {
    let conn = setup();
    let ids = seed(&conn, Namespace::Unsorted, 3);

    let placed = keys(&conn, Namespace::Unsorted);
    assert_eq!(order(&conn, Namespace::Unsorted), ids);
    assert_eq!(
        placed.iter().map(|(_, key)| *key).collect::<Vec<_>>(),
        vec![1000, 2000, 3000]
    );
}

#[test]
fn cross_namespace_move_updates_both_orders() {
    let conn = setup();
    let a = collection(&conn, "A");
    let b = collection(&conn, "B");
    let a_items = seed(&conn, a, 3);
    let b_items = seed(&conn, b, 2);

    ordering(&conn)
        .move_item(a_items[1], b, Some(b_items[1]))
        .unwrap();

    assert_eq!(order(&conn, a), vec![a_items[0], a_items[2]]);
    assert_eq!(order(&conn, b), vec![b_items[0], b_items[1], a_items[1]]);
    let moved = bookmarks(&conn).get_bookmark(a_items[1]).unwrap();
    assert_eq!(moved.namespace, b);
}

#[test]
fn bulk_move_to_front_keeps_caller_order_not_creation_order() {
    let conn = setup();
    let target = collection(&conn, "Target");
    let existing = seed(&conn, target, 2);
    let loose = seed(&conn, Namespace::Unsorted, 10);
    // Drag items 5, 2 and 9 (in that order) in front of the collection.
    let batch = vec![loose[5], loose[2], loose[9]];

    let mut by_creation = batch.clone();
    by_creation.sort_by_key(|id| loose.iter().position(|candidate| candidate == id));
    let mut by_id = batch.clone();
    by_id.sort();
    assert_ne!(batch, by_creation);

    let outcome = ordering(&conn).bulk_move(&batch, target, None).unwrap();

    assert_eq!(
        outcome.assigned.iter().map(|entry| entry.id).collect::<Vec<_>>(),
        batch
    );
    let placed = order(&conn, target);
    assert_eq!(placed[..3], batch[..]);
    assert_ne!(placed[..3], by_creation[..]);
    if by_id != batch {
        assert_ne!(placed[..3], by_id[..]);
    }
    assert_eq!(placed[3..], existing[..]);
    assert_eq!(order(&conn, Namespace::Unsorted).len(), 7);
}

#[test]
fn insert_first_with_exhausted_keys_rebalances() {
    let conn = setup();
    let target = collection(&conn, "Tight");
    let existing = seed(&conn, target, 2);
    let newcomer = seed(&conn, Namespace::Unsorted, 1)[0];

    let repo = SqliteBoardRepository::try_new(&conn).unwrap();
    repo.set_position(existing[0], &target, 1).unwrap();
    repo.set_position(existing[1], &target, 2).unwrap();

    let outcome = ordering(&conn).move_item(newcomer, target, None).unwrap();

    assert_eq!(outcome.rebalanced, 2);
    assert_eq!(order(&conn, target), vec![newcomer, existing[0], existing[1]]);
}

#[test]
fn repeated_insert_after_same_anchor_rebalances_without_collisions() {
    let conn = setup();
    let target = collection(&conn, "Stack");
    let service = ordering_with(&conn, small_gaps());
    let base = seed(&conn, target, 2);
    let incoming = seed(&conn, Namespace::Unsorted, 12);

    let mut rebalances = 0;
    for id in &incoming {
        let outcome = service.move_item(*id, target, Some(base[0])).unwrap();
        if outcome.rebalanced > 0 {
            rebalances += 1;
        }
        keys(&conn, target);
    }

    assert!(rebalances > 0, "tight gaps must force at least one rebalance");
    let mut expected = vec![base[0]];
    expected.extend(incoming.iter().rev());
    expected.push(base[1]);
    assert_eq!(order(&conn, target), expected);
}

#[test]
fn moving_after_current_predecessor_keeps_order() {
    let conn = setup();
    let target = collection(&conn, "Stable");
    let items = seed(&conn, target, 3);
    let service = ordering(&conn);

    service.move_item(items[1], target, Some(items[0])).unwrap();
    assert_eq!(order(&conn, target), items);

    service.move_item(items[0], target, None).unwrap();
    assert_eq!(order(&conn, target), items);

    service.move_item(items[2], target, Some(items[1])).unwrap();
    assert_eq!(order(&conn, target), items);
}

#[test]
fn missing_anchor_appends_to_namespace() {
    let conn = setup();
    let target = collection(&conn, "Append");
    let items = seed(&conn, target, 3);

    ordering(&conn)
        .move_item(items[0], target, Some(Uuid::new_v4()))
        .unwrap();

    assert_eq!(order(&conn, target), vec![items[1], items[2], items[0]]);
}

#[test]
fn moving_into_unsorted_namespace_works_like_collections() {
    let conn = setup();
    let source = collection(&conn, "Source");
    let moved = seed(&conn, source, 1)[0];
    let loose = seed(&conn, Namespace::Unsorted, 2);

    ordering(&conn)
        .move_item(moved, Namespace::Unsorted, Some(loose[0]))
        .unwrap();

    assert_eq!(
        order(&conn, Namespace::Unsorted),
        vec![loose[0], moved, loose[1]]
    );
    assert!(order(&conn, source).is_empty());
}

#[test]
fn bulk_move_with_duplicates_and_anchor_inside_batch() {
    let conn = setup();
    let target = collection(&conn, "Dupes");
    let items = seed(&conn, target, 4);

    let outcome = ordering(&conn)
        .bulk_move(&[items[1], items[0], items[1]], target, Some(items[0]))
        .unwrap();

    assert_eq!(outcome.assigned.len(), 2);
    assert_eq!(
        order(&conn, target),
        vec![items[2], items[3], items[1], items[0]]
    );
}

#[test]
fn bulk_move_records_activity() {
    let conn = setup();
    let target = collection(&conn, "Logged");
    let loose = seed(&conn, Namespace::Unsorted, 2);
    let service = OrderingService::with_config(
        SqliteBoardRepository::try_new(&conn).unwrap(),
        SqliteActivityRecorder::new(&conn),
        OrderingConfig::default(),
    );

    service.bulk_move(&loose, target, None).unwrap();
    service.bulk_move(&[], target, None).unwrap();

    let records = SqliteActivityRecorder::new(&conn).recent(10).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].target, target);
    assert_eq!(records[0].item_ids, loose);
    assert_eq!(records[0].item_count(), 2);
}

#[test]
fn failing_bulk_move_rolls_back_on_sqlite() {
    let conn = setup();
    let target = collection(&conn, "Atomic");
    let existing = seed(&conn, target, 2);
    let loose = seed(&conn, Namespace::Unsorted, 2);
    let ghost = Uuid::new_v4();

    let err = ordering(&conn)
        .bulk_move(&[loose[0], ghost, loose[1]], target, None)
        .unwrap_err();

    assert!(matches!(err, StoreError::ItemNotFound(id) if id == ghost));
    assert_eq!(order(&conn, target), existing);
    assert_eq!(order(&conn, Namespace::Unsorted), loose);
}

#[test]
fn moving_into_unknown_collection_is_a_store_error() {
    let conn = setup();
    let item = seed(&conn, Namespace::Unsorted, 1)[0];

    let err = ordering(&conn)
        .move_item(item, Namespace::Collection(Uuid::new_v4()), None)
        .unwrap_err();

    assert!(matches!(err, StoreError::Db(_)));
    assert_eq!(order(&conn, Namespace::Unsorted), vec![item]);
}

#[test]
fn deleting_bookmarks_leaves_harmless_holes() {
    let conn = setup();
    let target = collection(&conn, "Holes");
    let items = seed(&conn, target, 3);
    let newcomer = seed(&conn, Namespace::Unsorted, 1)[0];

    bookmarks(&conn).delete_bookmark(items[1]).unwrap();
    ordering(&conn)
        .move_item(newcomer, target, Some(items[0]))
        .unwrap();

    assert_eq!(order(&conn, target), vec![items[0], newcomer, items[2]]);
}

#[test]
fn blank_collection_name_is_rejected() {
    let conn = setup();
    let err = bookmarks(&conn).create_collection(" \t ").unwrap_err();
    assert!(matches!(err, BookmarkServiceError::InvalidName));
}

#[test]
fn creating_bookmark_in_unknown_collection_fails() {
    let conn = setup();
    let missing = Uuid::new_v4();

    let err = bookmarks(&conn)
        .create_bookmark(
            Namespace::Collection(missing),
            "https://example.com",
            "Lost",
        )
        .unwrap_err();

    assert!(matches!(err, BookmarkServiceError::CollectionNotFound(id) if id == missing));
    assert!(order(&conn, Namespace::Unsorted).is_empty());
}

#[test]
fn listing_orders_by_key_then_newest_then_id() {
    let conn = setup();
    let target = collection(&conn, "Ties");
    let items = seed(&conn, target, 3);
    let repo = SqliteBoardRepository::try_new(&conn).unwrap();
    for id in &items {
        repo.set_position(*id, &target, 500).unwrap();
    }
    for (id, created_at) in items.iter().zip([100_i64, 300, 300]) {
        conn.execute(
            "UPDATE bookmarks SET created_at = ?1 WHERE uuid = ?2;",
            params![created_at, id.to_string()],
        )
        .unwrap();
    }
    let newer_first = items[1].min(items[2]);
    let newer_second = items[1].max(items[2]);
    let expected = vec![newer_first, newer_second, items[0]];

    let listed: Vec<BookmarkId> = bookmarks(&conn)
        .list_bookmarks(target)
        .unwrap()
        .into_iter()
        .map(|bookmark| bookmark.id)
        .collect();
    assert_eq!(listed, expected);

    let from_repo: Vec<BookmarkId> = repo
        .list_bookmarks(&target)
        .unwrap()
        .into_iter()
        .map(|bookmark| bookmark.id)
        .collect();
    assert_eq!(from_repo, expected);
}

#[test]
fn listing_follows_key_order_after_moves() {
    let conn = setup();
    let target = collection(&conn, "Listed");
    let items = seed(&conn, target, 3);
    ordering(&conn).move_item(items[2], target, None).unwrap();

    let listed: Vec<BookmarkId> = bookmarks(&conn)
        .list_bookmarks(target)
        .unwrap()
        .into_iter()
        .map(|bookmark| bookmark.id)
        .collect();

    assert_eq!(listed, vec![items[2], items[0], items[1]]);
    assert!(matches!(
        bookmarks(&conn).list_bookmarks(Namespace::Collection(Uuid::new_v4())),
        Err(BookmarkServiceError::CollectionNotFound(_))
    ));
}

#[test]
fn services_run_with_parsed_tuning_and_reject_broken_tuning() {
    assert!(matches!(
        OrderingConfig::from_json(r#"{"min_gap": 10, "rebalance_gap": 10}"#),
        Err(ConfigError::Invalid {
            field: "rebalance_gap",
            ..
        })
    ));
    assert!(OrderingConfig::new(10, 1, 10, 0).is_err());

    let config =
        OrderingConfig::from_json(r#"{"default_gap": 10, "rebalance_gap": 10, "first_position": 10}"#)
            .unwrap();
    let conn = setup();
    let target = collection(&conn, "Tuned");
    let service = BookmarkService::with_config(SqliteBoardRepository::try_new(&conn).unwrap(), config);
    let first = service
        .create_bookmark(target, "https://example.com/a", "A")
        .unwrap();
    let second = service
        .create_bookmark(target, "https://example.com/b", "B")
        .unwrap();
    assert_eq!((first.sort_order, second.sort_order), (10, 20));

    let loose = seed(&conn, Namespace::Unsorted, 1)[0];
    let mover = ordering_with(&conn, config);
    assert_eq!(mover.config(), &config);
    mover.move_item(loose, target, Some(first.id)).unwrap();
    assert_eq!(
        keys(&conn, target),
        vec![(first.id, 10), (loose, 15), (second.id, 20)]
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Replays random move scripts and compares against a plain `Vec` model.
    #[test]
    fn move_scripts_match_reference_model(
        config in arb_config(),
        script in arb_script(3, 12, 40),
    ) {
        let conn = setup();
        let namespaces = [
            Namespace::Unsorted,
            collection(&conn, "One"),
            collection(&conn, "Two"),
        ];
        let mut model: Vec<Vec<BookmarkId>> = namespaces
            .iter()
            .map(|namespace| seed(&conn, *namespace, 4))
            .collect();
        let all: Vec<BookmarkId> = model.iter().flatten().copied().collect();
        let service = ordering_with(&conn, config);

        for (step, (target_index, anchor, picks)) in script.into_iter().enumerate() {
            let target = namespaces[target_index];
            let anchor = match anchor {
                AnchorKind::First => None,
                AnchorKind::Missing => Some(Uuid::new_v4()),
                AnchorKind::Item(index) => Some(all[index % all.len()]),
            };
            let requested: Vec<BookmarkId> = picks.iter().map(|index| all[*index]).collect();
            let mut batch: Vec<BookmarkId> = Vec::new();
            for id in &requested {
                if !batch.contains(id) {
                    batch.push(*id);
                }
            }

            if requested.len() == 1 {
                service.move_item(requested[0], target, anchor).unwrap();
            } else {
                service.bulk_move(&requested, target, anchor).unwrap();
            }

            for items in &mut model {
                items.retain(|id| !batch.contains(id));
            }
            let items = &mut model[target_index];
            let insert_at = match anchor {
                None => 0,
                Some(anchor) => items
                    .iter()
                    .position(|id| *id == anchor)
                    .map_or(items.len(), |index| index + 1),
            };
            items.splice(insert_at..insert_at, batch.iter().copied());

            for (namespace, expected) in namespaces.iter().zip(&model) {
                prop_assert_eq!(
                    &order(&conn, *namespace),
                    expected,
                    "step {}: {} diverged from the model",
                    step,
                    namespace
                );
            }
        }
    }
}
