pub mod analytics;
pub mod churches;
pub mod dashboard;

pub use analytics::analytics;
pub use dashboard::dashboard;
