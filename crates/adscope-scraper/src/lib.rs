pub mod agent;
pub mod csv_rows;
pub mod error;
pub mod parse;
pub mod snapshot;
pub mod task;
pub mod types;

pub use agent::AgentClient;
pub use csv_rows::csv_ads;
pub use error::ScraperError;
pub use parse::{ads_document, normalize_ads, parse_agent_output};
pub use snapshot::SnapshotSource;
pub use task::{ad_library_url, extraction_task};
pub use types::AgentRun;
