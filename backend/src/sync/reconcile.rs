//! Column-by-column reconciliation of a dataset with the remote lists.
//!
//! For each non-empty column `L` of the dataset:
//!
//! ```text
//!                 ┌─ 0 matches ──▶ create "L" with every item ─────────────┐
//! match prefix L ─┤                                                        ├─▶ done
//!                 └─ n matches ──▶ for each: skip if full, else overwrite ─┘
//!                                  with the first `room` items
//! ```
//!
//! Every successful write is followed by [`WRITE_COOLDOWN`]. The first error
//! ends the run; writes already applied stay applied.

use chrono::Utc;

use super::pause::{Pause, WRITE_COOLDOWN};
use super::report::{SyncReport, WriteSummary};
use crate::api::logs::{log_info, log_info_indent, log_success, log_success_indent};
use crate::error::{RemoteResult, SyncResult};
use crate::models::{Collection, Dataset, Entity};
use crate::remote::ListApi;

/// Collections whose label starts with `column`, in snapshot order.
///
/// Case-sensitive prefix match: "Team" matches "Team-Alpha" and "Teams".
pub fn matching_collections<'s>(column: &str, snapshot: &'s [Collection]) -> Vec<&'s Collection> {
    snapshot
        .iter()
        .filter(|c| c.label.starts_with(column))
        .collect()
}

/// One keyword entity per non-empty item, in item order.
pub fn build_entities(items: &[String]) -> Vec<Entity> {
    items
        .iter()
        .filter(|text| !text.is_empty())
        .map(Entity::keyword)
        .collect()
}

/// The update to send for `existing`, or `None` when it is already full.
///
/// The result is `existing` with its entities **replaced** by the first
/// `min(room, entities.len())` of `entities`. Nothing is merged: entities
/// already stored on the service are dropped by the write. `id`, `label` and
/// `kind` are carried through unchanged.
///
/// Each call starts again from the front of `entities`, so several matched
/// collections of one column all receive the same leading items.
pub fn fill_from_front(existing: &Collection, entities: &[Entity]) -> Option<Collection> {
    if existing.is_full() {
        return None;
    }
    let take = existing.room().min(entities.len());

    let mut update = existing.clone();
    update.entities = entities[..take].to_vec();
    Some(update)
}

/// Drives a sync against a [`ListApi`], pausing through a [`Pause`].
pub struct Reconciler<A, P> {
    api: A,
    pause: P,
}

impl<A: ListApi, P: Pause> Reconciler<A, P> {
    pub fn new(api: A, pause: P) -> Self {
        Self { api, pause }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetch the remote snapshot once, then reconcile every column against it.
    pub async fn run(&self, dataset: &Dataset) -> SyncResult<SyncReport> {
        log_info("📡 Fetching existing lists...");
        let snapshot = self.api.fetch_collections().await?;
        log_success(format!("Found {} lists", snapshot.len()));

        Ok(self.reconcile(dataset, &snapshot).await?)
    }

    /// Issue the creates and updates needed to upload `dataset`.
    ///
    /// `snapshot` is never refreshed: a collection matched by several columns
    /// is judged on its pre-run entity count each time.
    pub async fn reconcile(
        &self,
        dataset: &Dataset,
        snapshot: &[Collection],
    ) -> RemoteResult<SyncReport> {
        let mut report = SyncReport::started(Utc::now());

        for column in dataset.columns() {
            if column.items.is_empty() {
                log_info_indent(format!("Skipping '{}': no items", column.name), 1);
                report.empty_columns.push(column.name.clone());
                continue;
            }

            log_info(format!(
                "📋 Processing '{}' ({} items)",
                column.name,
                column.items.len()
            ));

            let existing = matching_collections(&column.name, snapshot);
            let entities = build_entities(&column.items);

            if existing.is_empty() {
                self.create(&column.name, entities, &mut report).await?;
            } else {
                for collection in existing {
                    self.update(collection, &entities, &mut report).await?;
                }
            }
            report.columns_processed += 1;
        }

        report.finished_at = Some(Utc::now());
        Ok(report)
    }

    async fn create(
        &self,
        label: &str,
        entities: Vec<Entity>,
        report: &mut SyncReport,
    ) -> RemoteResult<()> {
        // Not capped: an oversized list is the service's to reject.
        let collection = Collection::topic(label, entities);

        self.api.create_collection(&collection).await?;
        log_success_indent(
            format!(
                "Created list '{}' with {} entities",
                collection.label,
                collection.entities.len()
            ),
            1,
        );
        report.created.push(WriteSummary::of(&collection));

        self.pause.pause(WRITE_COOLDOWN).await;
        Ok(())
    }

    async fn update(
        &self,
        existing: &Collection,
        entities: &[Entity],
        report: &mut SyncReport,
    ) -> RemoteResult<()> {
        let Some(update) = fill_from_front(existing, entities) else {
            log_info_indent(format!("Skipping '{}': list is full", existing.label), 1);
            report.skipped_full.push(existing.label.clone());
            return Ok(());
        };

        self.api.update_collection(&update).await?;
        log_success_indent(
            format!(
                "Added {} entities to '{}'",
                update.entities.len(),
                update.label
            ),
            1,
        );
        report.updated.push(WriteSummary::of(&update));

        self.pause.pause(WRITE_COOLDOWN).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RemoteError, SyncError, WriteOp};
    use crate::models::{CAPACITY, COLLECTION_KIND, ENTITY_KIND};
    use crate::sync::pause::NoPause;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        Post(Collection),
        Put(Collection),
    }

    /// Static snapshot; records writes; answers write number `fail_at` with `status`.
    #[derive(Default)]
    struct FakeApi {
        snapshot: Vec<Collection>,
        sent: Mutex<Vec<Sent>>,
        fail_at: Option<(usize, u16)>,
    }

    impl FakeApi {
        fn with_snapshot(snapshot: Vec<Collection>) -> Self {
            Self {
                snapshot,
                ..Self::default()
            }
        }

        fn failing_at(mut self, write: usize, status: u16) -> Self {
            self.fail_at = Some((write, status));
            self
        }

        fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        fn record(&self, sent: Sent, operation: WriteOp, label: &str) -> RemoteResult<()> {
            let mut log = self.sent.lock().unwrap();
            if let Some((n, status)) = self.fail_at {
                if log.len() == n {
                    return Err(RemoteError::UnexpectedStatus {
                        operation,
                        label: label.to_string(),
                        status,
                    });
                }
            }
            log.push(sent);
            Ok(())
        }
    }

    impl ListApi for FakeApi {
        async fn fetch_collections(&self) -> RemoteResult<Vec<Collection>> {
            Ok(self.snapshot.clone())
        }

        async fn create_collection(&self, collection: &Collection) -> RemoteResult<()> {
            self.record(Sent::Post(collection.clone()), WriteOp::Create, &collection.label)
        }

        async fn update_collection(&self, collection: &Collection) -> RemoteResult<()> {
            self.record(Sent::Put(collection.clone()), WriteOp::Update, &collection.label)
        }
    }

    struct UnreachableApi;

    impl ListApi for UnreachableApi {
        async fn fetch_collections(&self) -> RemoteResult<Vec<Collection>> {
            Err(RemoteError::Fetch {
                status: Some(401),
                message: "unexpected status code: 401".into(),
            })
        }

        async fn create_collection(&self, _: &Collection) -> RemoteResult<()> {
            unreachable!("no write after a failed fetch")
        }

        async fn update_collection(&self, _: &Collection) -> RemoteResult<()> {
            unreachable!("no write after a failed fetch")
        }
    }

    #[derive(Default)]
    struct CountingPause(Mutex<Vec<Duration>>);

    impl CountingPause {
        fn count(&self) -> usize {
            self.0.lock().unwrap().len()
        }
    }

    impl Pause for &CountingPause {
        async fn pause(&self, duration: Duration) {
            self.0.lock().unwrap().push(duration);
        }
    }

    fn dataset(columns: Vec<(&str, Vec<&str>)>) -> Dataset {
        columns.into_iter().collect()
    }

    fn existing(id: &str, label: &str, count: usize) -> Collection {
        Collection {
            id: Some(id.to_string()),
            label: label.to_string(),
            kind: COLLECTION_KIND.to_string(),
            entities: (0..count).map(|i| Entity::keyword(format!("old-{}", i))).collect(),
        }
    }

    fn items(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("item-{}", i)).collect()
    }

    fn texts(collection: &Collection) -> Vec<&str> {
        collection.entities.iter().map(|e| e.text.as_str()).collect()
    }

    #[tokio::test]
    async fn test_create_when_nothing_matches() {
        let pause = CountingPause::default();
        let reconciler = Reconciler::new(FakeApi::default(), &pause);

        let report = reconciler
            .run(&dataset(vec![("Fruits", vec!["apple", "banana"])]))
            .await
            .unwrap();

        let expected = Collection {
            id: None,
            label: "Fruits".into(),
            kind: "customTopic".into(),
            entities: vec![
                Entity {
                    kind: "customKeyword".into(),
                    text: "apple".into(),
                },
                Entity {
                    kind: "customKeyword".into(),
                    text: "banana".into(),
                },
            ],
        };
        assert_eq!(reconciler.api().sent(), vec![Sent::Post(expected)]);
        assert_eq!(pause.count(), 1);
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].entity_count, 2);
        assert!(report.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_create_sends_every_item_uncapped() {
        let pause = CountingPause::default();
        let reconciler = Reconciler::new(FakeApi::default(), &pause);
        let data: Dataset = [("Big", items(CAPACITY + 10))].into_iter().collect();

        reconciler.run(&data).await.unwrap();

        match &reconciler.api().sent()[..] {
            [Sent::Post(created)] => assert_eq!(created.entities.len(), CAPACITY + 10),
            other => panic!("unexpected writes: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_fills_remaining_room() {
        let pause = CountingPause::default();
        let snapshot = vec![existing("list-1", "Fruits-2024", 48)];
        let reconciler = Reconciler::new(FakeApi::with_snapshot(snapshot), &pause);

        reconciler
            .run(&dataset(vec![(
                "Fruits",
                vec!["apple", "banana", "cherry"],
            )]))
            .await
            .unwrap();

        let sent = reconciler.api().sent();
        assert_eq!(sent.len(), 1);
        let Sent::Put(update) = &sent[0] else {
            panic!("expected an update, got {:?}", sent[0]);
        };
        assert_eq!(update.id.as_deref(), Some("list-1"));
        assert_eq!(update.label, "Fruits-2024");
        assert_eq!(update.kind, COLLECTION_KIND);
        assert_eq!(texts(update), vec!["apple", "banana"]);
        assert!(update.entities.iter().all(|e| e.kind == ENTITY_KIND));
        assert_eq!(pause.count(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_instead_of_merging() {
        let pause = CountingPause::default();
        let snapshot = vec![existing("list-1", "Colors", 3)];
        let reconciler = Reconciler::new(FakeApi::with_snapshot(snapshot), &pause);

        reconciler
            .run(&dataset(vec![("Colors", vec!["red", "blue"])]))
            .await
            .unwrap();

        let Sent::Put(update) = &reconciler.api().sent()[0] else {
            panic!("expected an update");
        };
        // Room is 47 but only two items exist; the three stored ones are gone.
        assert_eq!(texts(update), vec!["red", "blue"]);
    }

    #[tokio::test]
    async fn test_full_collection_is_skipped_silently() {
        let pause = CountingPause::default();
        let snapshot = vec![
            existing("a", "Teams", CAPACITY),
            existing("b", "Teams-overflow", CAPACITY + 5),
        ];
        let reconciler = Reconciler::new(FakeApi::with_snapshot(snapshot), &pause);

        let report = reconciler
            .run(&dataset(vec![("Teams", vec!["x"])]))
            .await
            .unwrap();

        assert!(reconciler.api().sent().is_empty());
        assert_eq!(pause.count(), 0);
        assert_eq!(report.skipped_full, vec!["Teams", "Teams-overflow"]);
        assert_eq!(report.columns_processed, 1);
    }

    #[tokio::test]
    async fn test_every_match_gets_the_same_leading_items() {
        let pause = CountingPause::default();
        let snapshot = vec![
            existing("a", "Teams-1", 10),
            existing("b", "Teams-2", 45),
        ];
        let reconciler = Reconciler::new(FakeApi::with_snapshot(snapshot), &pause);
        let data: Dataset = [("Teams", items(8))].into_iter().collect();

        reconciler.run(&data).await.unwrap();

        let sent = reconciler.api().sent();
        let [Sent::Put(first), Sent::Put(second)] = &sent[..] else {
            panic!("expected two updates, got {:?}", sent);
        };
        assert_eq!(first.label, "Teams-1");
        assert_eq!(texts(first), items(8));
        // No remainder tracking: the second list restarts from item-0.
        assert_eq!(second.label, "Teams-2");
        assert_eq!(texts(second), items(5));
        assert_eq!(pause.count(), 2);
    }

    #[tokio::test]
    async fn test_snapshot_is_stale_across_columns() {
        let pause = CountingPause::default();
        let snapshot = vec![existing("list-1", "Fruits-2024", 48)];
        let reconciler = Reconciler::new(FakeApi::with_snapshot(snapshot), &pause);

        reconciler
            .run(&dataset(vec![
                ("Fruit", vec!["fig", "kiwi", "lime"]),
                ("Fruits", vec!["apple"]),
            ]))
            .await
            .unwrap();

        let sent = reconciler.api().sent();
        let [Sent::Put(first), Sent::Put(second)] = &sent[..] else {
            panic!("expected two updates, got {:?}", sent);
        };
        // Both writes were sized from the pre-run count of 48.
        assert_eq!(texts(first), vec!["fig", "kiwi"]);
        assert_eq!(texts(second), vec!["apple"]);
    }

    #[tokio::test]
    async fn test_empty_column_sends_nothing() {
        let pause = CountingPause::default();
        let reconciler = Reconciler::new(FakeApi::default(), &pause);

        let report = reconciler.run(&dataset(vec![("Empty", vec![])])).await.unwrap();

        assert!(reconciler.api().sent().is_empty());
        assert_eq!(pause.count(), 0);
        assert_eq!(report.empty_columns, vec!["Empty"]);
        assert_eq!(report.columns_processed, 0);
    }

    #[tokio::test]
    async fn test_unexpected_status_aborts_the_run() {
        let pause = CountingPause::default();
        let reconciler = Reconciler::new(FakeApi::default().failing_at(0, 500), &pause);

        let err = reconciler
            .run(&dataset(vec![("Fruits", vec!["apple"]), ("Colors", vec!["red"])]))
            .await
            .unwrap_err();

        match err {
            SyncError::Remote(RemoteError::UnexpectedStatus {
                operation, status, ..
            }) => {
                assert_eq!(operation, WriteOp::Create);
                assert_eq!(status, 500);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(reconciler.api().sent().is_empty());
        assert_eq!(pause.count(), 0);
    }

    #[tokio::test]
    async fn test_failure_keeps_earlier_writes() {
        let pause = CountingPause::default();
        let snapshot = vec![existing("a", "Colors-1", 0), existing("b", "Colors-2", 0)];
        let api = FakeApi::with_snapshot(snapshot).failing_at(1, 503);
        let reconciler = Reconciler::new(api, &pause);

        let err = reconciler
            .run(&dataset(vec![("Colors", vec!["red"]), ("Shapes", vec!["circle"])]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Remote(RemoteError::UnexpectedStatus { status: 503, .. })
        ));
        let sent = reconciler.api().sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(&sent[0], Sent::Put(c) if c.label == "Colors-1"));
        assert_eq!(pause.count(), 1);
    }

    #[tokio::test]
    async fn test_second_run_on_same_snapshot_creates_again() {
        let pause = CountingPause::default();
        let reconciler = Reconciler::new(FakeApi::default(), &pause);
        let data = dataset(vec![("Fruits", vec!["apple"])]);

        reconciler.run(&data).await.unwrap();
        reconciler.run(&data).await.unwrap();

        let sent = reconciler.api().sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|s| matches!(s, Sent::Post(c) if c.label == "Fruits")));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_reported_before_any_write() {
        let reconciler = Reconciler::new(UnreachableApi, NoPause);

        let err = reconciler
            .run(&dataset(vec![("Fruits", vec!["apple"])]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Remote(RemoteError::Fetch { status: Some(401), .. })
        ));
    }

    #[test]
    fn test_matching_is_a_case_sensitive_prefix() {
        let snapshot = vec![
            existing("1", "Team-Alpha", 0),
            existing("2", "team-beta", 0),
            existing("3", "Teams", 0),
            existing("4", "The Team", 0),
        ];
        let labels: Vec<&str> = matching_collections("Team", &snapshot)
            .into_iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Team-Alpha", "Teams"]);
    }

    #[test]
    fn test_build_entities_keeps_order_and_duplicates() {
        let items = vec!["b".to_string(), "a".to_string(), "b".to_string(), String::new()];
        let entities = build_entities(&items);
        assert_eq!(
            entities,
            vec![Entity::keyword("b"), Entity::keyword("a"), Entity::keyword("b")]
        );
    }

    #[test]
    fn test_fill_from_front_bounds() {
        let entities = build_entities(&items(30));

        let update = fill_from_front(&existing("x", "L", 49), &entities).unwrap();
        assert_eq!(update.entities.len(), 1);

        let update = fill_from_front(&existing("x", "L", 0), &entities).unwrap();
        assert_eq!(update.entities.len(), 30);

        assert!(fill_from_front(&existing("x", "L", CAPACITY), &entities).is_none());
    }
}
