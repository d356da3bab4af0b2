use redis::AsyncCommands;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tracing::{error, warn};

const MEMORY_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue is full")]
    Full,

    #[error("queue is closed")]
    Closed,

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Queue payload: just enough for a worker to re-read the request row.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QueuedRequest {
    pub tenant_id: i64,
    pub request_id: i64,
}

impl QueuedRequest {
    fn encode(&self) -> String {
        format!("{}:{}", self.tenant_id, self.request_id)
    }

    fn decode(payload: &str) -> Option<QueuedRequest> {
        let (tenant, request) = payload.split_once(':')?;
        Some(QueuedRequest {
            tenant_id: tenant.parse().ok()?,
            request_id: request.parse().ok()?,
        })
    }
}

pub struct MemoryQueue {
    sender: mpsc::Sender<QueuedRequest>,
    receiver: Mutex<mpsc::Receiver<QueuedRequest>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(MEMORY_QUEUE_CAPACITY);
        MemoryQueue {
            sender,
            receiver: Mutex::new(receiver),
        }
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        MemoryQueue::new()
    }
}

pub struct RedisQueue {
    connection: redis::aio::ConnectionManager,
    queue_name: String,
}

impl RedisQueue {
    pub async fn connect(url: &str, queue_name: String) -> Result<Self, QueueError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_connection_manager().await?;

        Ok(RedisQueue {
            connection,
            queue_name,
        })
    }
}

/// At-least-once FIFO of request ids. The in-memory backing is a bounded
/// channel inside the process; the Redis backing is a list shared by worker
/// processes.
pub enum WorkQueue {
    Memory(MemoryQueue),
    Redis(RedisQueue),
}

impl WorkQueue {
    pub fn in_memory() -> Self {
        WorkQueue::Memory(MemoryQueue::new())
    }

    pub async fn enqueue(&self, item: QueuedRequest) -> Result<(), QueueError> {
        match self {
            WorkQueue::Memory(queue) => {
                queue.sender.try_send(item).map_err(|error| match error {
                    mpsc::error::TrySendError::Full(_) => QueueError::Full,
                    mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
                })
            }
            WorkQueue::Redis(queue) => {
                let mut connection = queue.connection.clone();
                let _: () = connection
                    .lpush(&queue.queue_name, item.encode())
                    .await?;
                Ok(())
            }
        }
    }

    /// Blocks until the next request id is available. `None` means the queue
    /// is gone and the worker should exit.
    pub async fn dequeue(&self) -> Option<QueuedRequest> {
        match self {
            WorkQueue::Memory(queue) => queue.receiver.lock().await.recv().await,
            WorkQueue::Redis(queue) => loop {
                let mut connection = queue.connection.clone();
                let result: Result<Option<(String, String)>, redis::RedisError> =
                    connection.brpop(&queue.queue_name, 0.0).await;

                match result {
                    Ok(Some((_, payload))) => match QueuedRequest::decode(&payload) {
                        Some(item) => return Some(item),
                        None => {
                            warn!("discarding malformed queue payload: {payload}");
                        }
                    },
                    Ok(None) => {}
                    Err(error) => {
                        error!("queue dequeue failed, retrying: {error}");
                        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_round_trip() {
        let item = QueuedRequest {
            tenant_id: 7,
            request_id: 42,
        };

        assert_eq!(QueuedRequest::decode(&item.encode()), Some(item));
        assert_eq!(QueuedRequest::decode("garbage"), None);
    }

    #[tokio::test]
    async fn test_memory_queue_is_fifo() {
        let queue = WorkQueue::in_memory();

        for request_id in 1..=3 {
            queue
                .enqueue(QueuedRequest {
                    tenant_id: 1,
                    request_id,
                })
                .await
                .unwrap();
        }

        for request_id in 1..=3 {
            assert_eq!(queue.dequeue().await.unwrap().request_id, request_id);
        }
    }
}
