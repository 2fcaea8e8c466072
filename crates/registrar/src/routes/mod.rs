pub mod block;
pub mod health;
pub mod metrics;
