pub mod background;
pub mod providers;
pub mod rate_limit;
pub mod sanitize;
pub mod store;

pub use background::BackgroundTasks;
pub use rate_limit::RateLimiter;
