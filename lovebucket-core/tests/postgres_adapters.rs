#![cfg(feature = "database")]

use chrono::{Timelike, Utc};
use lovebucket_core::infra::{PostgresCollectionLocator, PostgresCopyLinkRepository};
use lovebucket_core::ports::{
    CollectionLocator, CopyLink, CopyLinkRepository, LinkInsert,
};
use lovebucket_model::{BucketKind, CopyID, DestinationID, MediaID, UserID};
use sqlx::PgPool;

fn link(source_id: MediaID, owner_id: UserID, destination_id: DestinationID) -> CopyLink {
    CopyLink {
        source_id,
        copy_id: CopyID::derive(source_id, owner_id, destination_id),
        destination_id,
        owner_id,
        kind: BucketKind::Like,
        file_name: format!("{owner_id}/{source_id}.png"),
        // Postgres keeps microseconds.
        created_at: Utc::now()
            .with_nanosecond(0)
            .unwrap_or_else(Utc::now),
    }
}

#[sqlx::test(migrator = "lovebucket_core::MIGRATOR")]
async fn duplicate_pairs_return_the_stored_link(pool: PgPool) {
    let repo = PostgresCopyLinkRepository::new(pool);
    let source = MediaID::new();
    let destination = DestinationID::new();

    let first = link(source, UserID::new(), destination);
    assert_eq!(repo.insert(first.clone()).await.unwrap(), LinkInsert::Inserted);

    let second = link(source, UserID::new(), destination);
    assert_eq!(
        repo.insert(second).await.unwrap(),
        LinkInsert::Duplicate(first.clone())
    );

    assert_eq!(repo.find_copy(source, destination).await.unwrap(), Some(first.clone()));
    assert_eq!(repo.find_by_copy(first.copy_id).await.unwrap(), Some(first));
    assert_eq!(repo.count_in_destination(destination).await.unwrap(), 1);
}

#[sqlx::test(migrator = "lovebucket_core::MIGRATOR")]
async fn deletes_are_scoped(pool: PgPool) {
    let repo = PostgresCopyLinkRepository::new(pool);
    let owner = UserID::new();
    let source = MediaID::new();
    let like = DestinationID::new();
    let love = DestinationID::new();

    let liked = link(source, owner, like);
    repo.insert(liked.clone()).await.unwrap();
    repo.insert(link(source, owner, love)).await.unwrap();
    assert_eq!(repo.list_by_source(source).await.unwrap().len(), 2);

    assert_eq!(repo.delete_by_destination(love).await.unwrap(), 1);
    assert_eq!(repo.list_by_destination(like).await.unwrap(), vec![liked.clone()]);
    assert!(repo.delete_by_copy(liked.copy_id).await.unwrap());
    assert!(!repo.delete_by_copy(liked.copy_id).await.unwrap());
}

#[sqlx::test(migrator = "lovebucket_core::MIGRATOR")]
async fn locator_round_trip(pool: PgPool) {
    let locator = PostgresCollectionLocator::new(pool);
    let user = UserID::new();
    let like = DestinationID::new();
    let love = DestinationID::new();

    assert!(locator.assign(user, BucketKind::Like, like).await.unwrap());
    assert!(locator.assign(user, BucketKind::Love, love).await.unwrap());
    assert!(!locator.assign(user, BucketKind::Like, DestinationID::new()).await.unwrap());

    assert_eq!(
        locator.destination_for(user, BucketKind::Love).await.unwrap(),
        Some(love)
    );
    assert_eq!(
        locator.owner_of(like).await.unwrap(),
        Some((user, BucketKind::Like))
    );
    assert_eq!(
        locator.destinations_of(user).await.unwrap(),
        vec![(BucketKind::Like, like), (BucketKind::Love, love)]
    );

    assert!(locator.release(like).await.unwrap());
    assert_eq!(locator.destination_for(user, BucketKind::Like).await.unwrap(), None);
}
