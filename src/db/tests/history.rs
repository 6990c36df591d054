use super::{finished_batch, sample_batch};
use crate::db::*;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_archive_is_most_recent_first() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let first = finished_batch("20240101T000000");
    let second = finished_batch("20240201T000000");
    db.archive_batch(&first).await.unwrap();
    db.archive_batch(&second).await.unwrap();

    let archived = db.archived_batches().await.unwrap();
    assert_eq!(archived.len(), 2);
    assert_eq!(archived[0].batch, second);
    assert_eq!(archived[1].batch, first);

    db.close().await;
}

#[tokio::test]
async fn test_archive_does_not_touch_current_batch() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let current = sample_batch("20240301T000000");
    db.save_batch(&current).await.unwrap();
    db.archive_batch(&finished_batch("20240101T000000")).await.unwrap();

    assert_eq!(db.load_batch().await.unwrap(), Some(current));

    db.close().await;
}

#[tokio::test]
async fn test_find_archived_by_identity() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let batch = finished_batch("20240101T000000");
    let id = db.insert_archive(&batch).await.unwrap();

    let found = db.find_archived("20240101T000000").await.unwrap().unwrap();
    assert_eq!(found.id, id);
    assert_eq!(found.batch, batch);
    assert!(db.find_archived("19990101T000000").await.unwrap().is_none());

    db.close().await;
}

#[tokio::test]
async fn test_archiving_same_batch_twice_keeps_one_row() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let batch = finished_batch("20240101T000000");
    let first = db.insert_archive(&batch).await.unwrap();
    let second = db.insert_archive(&batch).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(db.archived_batches().await.unwrap().len(), 1);

    db.close().await;
}
