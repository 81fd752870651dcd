pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::HelpdeskConfig;
pub use error::{HelpdeskError, Result};
pub use events::DomainEvent;
pub use types::*;
