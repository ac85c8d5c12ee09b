use std::collections::HashSet;

use clipclock_core::job::{CompletedExtraction, ExtractionResult, JobStatus, ListQuery};
use clipclock_core::job_store::JobStore;

use crate::integration::common::setup_test_db;

fn completed(seconds: i64) -> CompletedExtraction {
    CompletedExtraction::from_result(
        ExtractionResult::new(seconds)
            .with_video_title("A talk")
            .with_site_title("Example"),
        "Generic (yt-dlp)",
    )
}

#[tokio::test]
async fn enqueue_sets_queued_fields() {
    let (db, _dir) = setup_test_db().await;
    let repo = db.job_repo();

    let id = repo.enqueue("https://www.example.com/watch/1").await.unwrap();
    let job = repo.get(id).await.unwrap().expect("job exists");

    assert_eq!(job.url, "https://www.example.com/watch/1");
    assert_eq!(job.domain, "example.com");
    assert_eq!(job.status, JobStatus::Queued);
    assert!(job.started_at.is_none());
    assert!(job.completed_at.is_none());
    assert!(job.duration_seconds.is_none());
    assert!(job.error_message.is_none());
}

#[tokio::test]
async fn enqueue_does_not_validate() {
    let (db, _dir) = setup_test_db().await;
    let repo = db.job_repo();

    let id = repo.enqueue("not a url").await.unwrap();
    let job = repo.get(id).await.unwrap().unwrap();
    assert_eq!(job.domain, "unknown");
}

#[tokio::test]
async fn ids_increase_monotonically() {
    let (db, _dir) = setup_test_db().await;
    let repo = db.job_repo();

    let a = repo.enqueue("https://a.test/1").await.unwrap();
    let b = repo.enqueue("https://b.test/2").await.unwrap();
    let c = repo.enqueue("https://c.test/3").await.unwrap();

    assert!(a < b && b < c);
}

#[tokio::test]
async fn next_queued_is_fifo() {
    let (db, _dir) = setup_test_db().await;
    let repo = db.job_repo();

    let first = repo.enqueue("https://a.test/1").await.unwrap();
    let second = repo.enqueue("https://a.test/2").await.unwrap();

    assert_eq!(repo.next_queued().await.unwrap().unwrap().id, first);

    assert!(repo.mark_processing(first).await.unwrap());
    assert_eq!(repo.next_queued().await.unwrap().unwrap().id, second);

    assert!(repo.mark_processing(second).await.unwrap());
    assert!(repo.next_queued().await.unwrap().is_none());
}

#[tokio::test]
async fn mark_processing_is_guarded() {
    let (db, _dir) = setup_test_db().await;
    let repo = db.job_repo();

    let id = repo.enqueue("https://a.test/1").await.unwrap();
    assert!(repo.mark_processing(id).await.unwrap());
    assert!(!repo.mark_processing(id).await.unwrap());

    let job = repo.get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Processing);
    assert!(job.started_at.is_some());
}

#[tokio::test]
async fn complete_requires_processing() {
    let (db, _dir) = setup_test_db().await;
    let repo = db.job_repo();

    let id = repo.enqueue("https://a.test/1").await.unwrap();
    assert!(!repo.mark_completed(id, &completed(60)).await.unwrap());
    assert!(!repo.mark_failed(id, "nope").await.unwrap());
    assert_eq!(repo.get(id).await.unwrap().unwrap().status, JobStatus::Queued);
}

#[tokio::test]
async fn mark_completed_stores_result() {
    let (db, _dir) = setup_test_db().await;
    let repo = db.job_repo();

    let id = repo.enqueue("https://a.test/1").await.unwrap();
    repo.mark_processing(id).await.unwrap();
    assert!(repo.mark_completed(id, &completed(3661)).await.unwrap());

    let job = repo.get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.duration_seconds, Some(3661));
    assert_eq!(job.duration_display.as_deref(), Some("1h 1m 1s"));
    assert_eq!(job.video_title.as_deref(), Some("A talk"));
    assert_eq!(job.site_title.as_deref(), Some("Example"));
    assert_eq!(job.extractor_used.as_deref(), Some("Generic (yt-dlp)"));
    assert!(job.error_message.is_none());
    assert!(job.completed_at.is_some());

    // Terminal states are final.
    assert!(!repo.mark_failed(id, "late").await.unwrap());
    assert!(!repo.mark_completed(id, &completed(1)).await.unwrap());
    assert_eq!(repo.get(id).await.unwrap().unwrap().duration_seconds, Some(3661));
}

#[tokio::test]
async fn mark_failed_stores_message() {
    let (db, _dir) = setup_test_db().await;
    let repo = db.job_repo();

    let id = repo.enqueue("https://a.test/1").await.unwrap();
    repo.mark_processing(id).await.unwrap();
    assert!(repo.mark_failed(id, "boom").await.unwrap());

    let job = repo.get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some("boom"));
    assert!(job.duration_seconds.is_none());
    assert!(job.completed_at.is_some());
}

#[tokio::test]
async fn counts_sum_to_total() {
    let (db, _dir) = setup_test_db().await;
    let repo = db.job_repo();

    for i in 0..5 {
        repo.enqueue(&format!("https://a.test/{i}")).await.unwrap();
    }
    let a = repo.claim_next(10).await.unwrap().unwrap().id;
    let b = repo.claim_next(10).await.unwrap().unwrap().id;
    let _c = repo.claim_next(10).await.unwrap().unwrap().id;
    repo.mark_completed(a, &completed(10)).await.unwrap();
    repo.mark_failed(b, "boom").await.unwrap();

    let counts = repo.counts().await.unwrap();
    assert_eq!(counts.queued, 2);
    assert_eq!(counts.processing, 1);
    assert_eq!(counts.completed, 1);
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.total, 5);
    assert_eq!(
        counts.queued + counts.processing + counts.completed + counts.failed,
        counts.total
    );
    assert_eq!(repo.processing_count().await.unwrap(), 1);
}

#[tokio::test]
async fn counts_on_empty_store() {
    let (db, _dir) = setup_test_db().await;
    let counts = db.job_repo().counts().await.unwrap();
    assert_eq!(counts.total, 0);
    assert_eq!(counts.queued, 0);
}

#[tokio::test]
async fn claim_next_is_fifo_and_capped() {
    let (db, _dir) = setup_test_db().await;
    let repo = db.job_repo();

    let first = repo.enqueue("https://a.test/1").await.unwrap();
    let second = repo.enqueue("https://a.test/2").await.unwrap();
    repo.enqueue("https://a.test/3").await.unwrap();

    let claimed = repo.claim_next(2).await.unwrap().unwrap();
    assert_eq!(claimed.id, first);
    assert_eq!(claimed.status, JobStatus::Processing);
    assert!(claimed.started_at.is_some());

    assert_eq!(repo.claim_next(2).await.unwrap().unwrap().id, second);
    assert!(repo.claim_next(2).await.unwrap().is_none());
    assert_eq!(repo.counts().await.unwrap().queued, 1);
}

#[tokio::test]
async fn claim_next_on_empty_queue() {
    let (db, _dir) = setup_test_db().await;
    assert!(db.job_repo().claim_next(3).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_claims_never_share_a_job() {
    let (db, _dir) = setup_test_db().await;
    let repo = db.job_repo();

    for i in 0..5 {
        repo.enqueue(&format!("https://a.test/{i}")).await.unwrap();
    }

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move { repo.claim_next(3).await }));
    }

    let mut claimed = Vec::new();
    for handle in handles {
        if let Some(job) = handle.await.unwrap().unwrap() {
            claimed.push(job.id);
        }
    }

    let unique: HashSet<i64> = claimed.iter().copied().collect();
    assert_eq!(unique.len(), claimed.len());
    assert_eq!(claimed.len(), 3);
    assert_eq!(repo.processing_count().await.unwrap(), 3);
}

#[tokio::test]
async fn list_newest_first_with_window() {
    let (db, _dir) = setup_test_db().await;
    let repo = db.job_repo();

    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(repo.enqueue(&format!("https://a.test/{i}")).await.unwrap());
    }

    let page = repo.list(&ListQuery::new(2)).await.unwrap();
    assert_eq!(
        page.iter().map(|j| j.id).collect::<Vec<_>>(),
        vec![ids[4], ids[3]]
    );

    let page = repo.list(&ListQuery::new(2).with_offset(4)).await.unwrap();
    assert_eq!(page.iter().map(|j| j.id).collect::<Vec<_>>(), vec![ids[0]]);

    let page = repo.list(&ListQuery::new(2).with_page(2, 2)).await.unwrap();
    assert_eq!(
        page.iter().map(|j| j.id).collect::<Vec<_>>(),
        vec![ids[2], ids[1]]
    );
}

#[tokio::test]
async fn list_filters_by_status_and_domain() {
    let (db, _dir) = setup_test_db().await;
    let repo = db.job_repo();

    let yt = repo.enqueue("https://www.youtube.com/watch?v=a").await.unwrap();
    repo.enqueue("https://vimeo.com/1").await.unwrap();
    repo.enqueue("https://youtube.com/watch?v=b").await.unwrap();
    repo.mark_processing(yt).await.unwrap();

    let query = ListQuery::new(50).with_domain("youtube.com");
    assert_eq!(repo.list(&query).await.unwrap().len(), 2);
    assert_eq!(repo.count_matching(&query).await.unwrap(), 2);

    let query = ListQuery::new(50).with_status(JobStatus::Queued);
    let queued = repo.list(&query).await.unwrap();
    assert_eq!(queued.len(), 2);
    assert!(queued.iter().all(|j| j.status == JobStatus::Queued));

    let query = ListQuery::new(50)
        .with_status(JobStatus::Processing)
        .with_domain("youtube.com");
    let processing = repo.list(&query).await.unwrap();
    assert_eq!(processing.len(), 1);
    assert_eq!(processing[0].id, yt);

    let query = ListQuery::new(1).with_status(JobStatus::Queued);
    assert_eq!(repo.count_matching(&query).await.unwrap(), 2);
}

#[tokio::test]
async fn get_missing_job_is_none() {
    let (db, _dir) = setup_test_db().await;
    assert!(db.job_repo().get(999).await.unwrap().is_none());
}

#[tokio::test]
async fn writes_survive_reopen() {
    let (db, dir) = setup_test_db().await;
    let id = db.job_repo().enqueue("https://a.test/1").await.unwrap();
    db.pool().close().await;

    let config = clipclock_db::DatabaseConfig {
        url: format!(
            "sqlite://{}",
            dir.path().join("nested").join("jobs.sqlite").display()
        ),
        max_connections: 1,
    };
    let reopened = clipclock_db::Database::connect(&config).await.unwrap();
    reopened.migrate().await.unwrap();

    let job = reopened.job_repo().get(id).await.unwrap().unwrap();
    assert_eq!(job.url, "https://a.test/1");
}

#[tokio::test]
async fn health_check_succeeds() {
    let (db, _dir) = setup_test_db().await;
    db.health_check().await.unwrap();
}
