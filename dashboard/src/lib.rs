pub mod debounce;
pub mod explorer;
pub mod fetch;
pub mod filters;
pub mod metrics;
pub mod query;
pub mod supply;
