pub mod tracking_dto;

pub use tracking_dto::{ApiResponse, RunIngestionRequest, RunsQuery};
