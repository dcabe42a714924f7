use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use stagepass_core::RemoteBookingStore;
use stagepass_shared::RemoteBookingDocument;
use tracing::{info, warn};

const SEQUENCE_KEY: &str = "bookings:seq";

fn document_key(id: &str) -> String {
    format!("booking:{}", id)
}

fn user_index_key(user_id: &str) -> String {
    format!("user:{}:bookings", user_id)
}

/// Remote booking mirror kept in Redis.
///
/// Each document is a JSON string under `booking:{id}`. A per-user sorted set
/// indexes document ids by the server timestamp, taken from the Redis server's
/// own clock at write time.
#[derive(Clone)]
pub struct RedisRemoteStore {
    client: redis::Client,
}

impl RedisRemoteStore {
    pub fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteBookingStore for RedisRemoteStore {
    async fn insert(
        &self,
        document: &RemoteBookingDocument,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (secs, micros): (i64, i64) = redis::cmd("TIME").query_async(&mut conn).await?;
        let server_timestamp = DateTime::<Utc>::from_timestamp(secs, (micros * 1_000) as u32)
            .ok_or("Redis returned an out-of-range server time")?;

        let id: i64 = conn.incr(SEQUENCE_KEY, 1).await?;
        let id = id.to_string();

        let mut stored = document.clone();
        stored.server_timestamp = Some(server_timestamp);
        let payload = serde_json::to_string(&stored)?;
        let score = (secs * 1_000_000 + micros) as f64;

        let _: () = redis::pipe()
            .atomic()
            .set(document_key(&id), payload)
            .ignore()
            .zadd(user_index_key(&document.user_id), &id, score)
            .ignore()
            .query_async(&mut conn)
            .await?;

        info!("Booking saved with ID: {}", id);
        Ok(id)
    }

    async fn find_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<RemoteBookingDocument>, Box<dyn std::error::Error + Send + Sync>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let ids: Vec<String> = redis::cmd("ZRANGE")
            .arg(user_index_key(user_id))
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| document_key(id)).collect();
        let payloads: Vec<Option<String>> =
            redis::cmd("MGET").arg(&keys).query_async(&mut conn).await?;

        let mut documents = Vec::with_capacity(payloads.len());
        for (id, payload) in ids.iter().zip(payloads) {
            match payload {
                Some(json) => documents.push(serde_json::from_str(&json)?),
                None => warn!("Booking {} is indexed for a user but missing", id),
            }
        }
        Ok(documents)
    }
}
