#![allow(clippy::disallowed_methods)]

use pipeline_core::{EnrollmentId, EnrollmentJob};
use queue::{QueueBackend, QueueClient, QueueConfig, QueueError, QueueKind};

fn job(id: &str) -> EnrollmentJob {
    EnrollmentJob::new(EnrollmentId::from(id))
}

fn ids(batch: &[serde_json::Value]) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    batch
        .iter()
        .map(|payload| {
            EnrollmentJob::from_payload(payload)
                .map(|j| j.enrollment_id.into_inner())
                .map_err(Into::into)
        })
        .collect()
}

#[tokio::test]
async fn memory_client_from_config() -> Result<(), QueueError> {
    let client = QueueClient::new(QueueConfig::memory())?;
    assert_eq!(client.kind(), QueueKind::Memory);
    client.connect().await?;
    assert_eq!(client.size().await?, 0);
    assert!(client.dequeue_batch(20).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn batch_preserves_enqueue_order_truncated_at_n() -> Result<(), Box<dyn std::error::Error>> {
    for n in [1usize, 3, 7, 10] {
        let client = QueueClient::new(QueueConfig::memory())?;
        let enqueued: Vec<String> = (0..7).map(|i| format!("E{i}")).collect();
        for id in &enqueued {
            client.enqueue(&job(id)).await?;
        }

        let batch = client.dequeue_batch(n).await?;
        assert!(batch.len() <= n);
        let expected: Vec<String> = enqueued.iter().take(n).cloned().collect();
        assert_eq!(ids(&batch)?, expected);
        assert_eq!(client.size().await?, (7 - expected.len()) as u64);
    }
    Ok(())
}

#[tokio::test]
async fn duplicates_are_not_collapsed() -> Result<(), Box<dyn std::error::Error>> {
    let client = QueueClient::new(QueueConfig::memory())?;
    client.enqueue(&job("E1")).await?;
    client.enqueue(&job("E1")).await?;

    let batch = client.dequeue_batch(5).await?;
    assert_eq!(ids(&batch)?, vec!["E1".to_string(), "E1".to_string()]);
    Ok(())
}

#[tokio::test]
async fn popped_items_are_gone() -> Result<(), QueueError> {
    let client = QueueClient::new(QueueConfig::memory())?;
    client.enqueue(&job("E1")).await?;

    assert_eq!(client.dequeue_batch(1).await?.len(), 1);
    assert!(client.dequeue_batch(1).await?.is_empty());
    client.close().await;
    Ok(())
}

#[tokio::test]
async fn unreachable_redis_surfaces_an_error() -> Result<(), QueueError> {
    let config = QueueConfig::from_lookup(|name| match name {
        "REDIS_URL" => Some("redis://127.0.0.1:1/0".to_string()),
        "REDIS_CONNECT_TIMEOUT_MS" => Some("200".to_string()),
        _ => None,
    })?;
    let client = QueueClient::new(config)?;
    assert_eq!(client.kind(), QueueKind::Redis);

    let result = client.enqueue(&job("E1")).await;
    assert!(result.is_err());
    Ok(())
}
