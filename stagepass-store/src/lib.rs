pub mod app_config;
pub mod database;
pub mod redis_repo;

pub use database::BookingStore;
pub use redis_repo::RedisRemoteStore;
