mod common;

use std::sync::Arc;
use std::time::Duration;

use ddd_directory::application::contacts::UpdateContactCommand;
use ddd_directory::application::pagination::PageRequest;
use ddd_directory::application::regions::UpdateRegionCommand;
use ddd_directory::cache::{CacheConfig, CacheCoordinator, CacheKey, Mutation};

use common::{FailingCache, HangingCache, Harness};

async fn exercise_full_lifecycle(harness: &Harness) {
    let region = harness.region("SP", "11").await;
    let contact = harness.contact("Ana", region.id).await;

    let fetched = harness.regions.get_by_id(region.id).await.expect("by id");
    assert_eq!(fetched, region);
    let by_ddd = harness
        .regions
        .get_by_ddd("11")
        .await
        .expect("by ddd")
        .expect("region 11");
    assert_eq!(by_ddd.id, region.id);
    let page = harness
        .regions
        .list_paged(PageRequest::default())
        .await
        .expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(harness.contacts.get_by_ddd("11").await.expect("contacts").len(), 1);

    harness
        .regions
        .update(UpdateRegionCommand {
            id: region.id,
            name: "SP".to_string(),
            ddd: "95".to_string(),
        })
        .await
        .expect("update");
    assert!(harness.regions.get_by_ddd("11").await.expect("lookup").is_none());

    harness
        .contacts
        .update(UpdateContactCommand {
            id: contact.id,
            name: "Ana Maria".to_string(),
            phone: contact.phone.clone(),
            email: contact.email.clone(),
            region_id: region.id,
        })
        .await
        .expect("contact update");
    let view = harness
        .regions
        .get_by_ddd_with_contacts("95")
        .await
        .expect("view")
        .expect("region 95");
    assert_eq!(view.contacts[0].name, "Ana Maria");

    harness.contacts.soft_delete(contact.id).await.expect("contact delete");
    harness.regions.soft_delete(region.id).await.expect("region delete");
    assert!(
        harness
            .regions
            .get_by_id(region.id)
            .await
            .expect_err("deleted")
            .is_not_found()
    );
}

#[tokio::test]
async fn failing_backend_degrades_to_store_reads() {
    let harness = Harness::with_backend(Arc::new(FailingCache));
    exercise_full_lifecycle(&harness).await;
}

#[tokio::test(start_paused = true)]
async fn hanging_backend_is_bounded_by_operation_timeout() {
    let harness = Harness::with_backend(Arc::new(HangingCache));
    exercise_full_lifecycle(&harness).await;
}

#[tokio::test]
async fn disabled_cache_still_serves_every_operation() {
    let harness = Harness::with_coordinator(CacheCoordinator::disabled());
    exercise_full_lifecycle(&harness).await;
}

#[tokio::test(start_paused = true)]
async fn single_lookup_against_hanging_backend_returns_after_timeout() {
    let config = CacheConfig {
        operation_timeout: Duration::from_millis(50),
        ..CacheConfig::default()
    };
    let cache = CacheCoordinator::new(config, Arc::new(HangingCache));
    let started = tokio::time::Instant::now();

    let pinned = cache.pin(CacheKey::region_by_ddd("11")).await;
    let value = cache.try_get::<String>(&pinned).await;

    assert!(pinned.generation().is_none());
    assert!(value.is_none());
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn failed_invalidation_is_reported_not_raised() {
    let harness = Harness::with_backend(Arc::new(FailingCache));
    let region = harness.region("SP", "11").await;

    let report = harness.cache.apply(&Mutation::region_deleted(&region)).await;

    assert_eq!(report.deleted, 0);
    assert!(report.failed > 0);
    assert!(!report.is_complete());
}

#[tokio::test]
async fn unpinned_reads_go_straight_to_the_store() {
    let harness = Harness::with_backend(Arc::new(FailingCache));
    let pinned = harness
        .cache
        .pin(CacheKey::region_page(PageRequest::default()))
        .await;
    assert!(pinned.generation().is_none());

    harness.region("SP", "11").await;
    let reads = harness.store.reads();
    harness
        .regions
        .list_paged(PageRequest::default())
        .await
        .expect("list");
    assert_eq!(harness.store.reads(), reads + 1);
}
