// Application layer - Use cases over the traffic log and widget window chains
pub mod binner;
pub mod ingest_service;
pub mod traffic_repository;
pub mod widget_service;
