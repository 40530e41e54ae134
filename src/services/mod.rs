pub mod chart_adapter;
pub mod dashboard_controller;
pub mod series_normalizer;
pub mod upload_service;
