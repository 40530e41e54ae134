//! Backend for the stock forecast dashboard.
//!
//! Holds the user's ticker/range/ARIMA selection, pulls price history and
//! forecasts from the statistics service, reconciles every series shape into
//! date-indexed points and serves chart-ready series to the browser UI.

pub mod app;
pub mod config;
pub mod errors;
pub mod external;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
