// Real-time traffic monitor: multi-resolution binning with drill-down
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
