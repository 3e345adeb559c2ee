mod service;

pub use service::{classify_period, IngestService};
