pub mod arima_http;
pub mod forecast_service;
