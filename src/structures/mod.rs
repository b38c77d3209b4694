pub mod api;
pub mod calendar;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod modal;
pub mod model;
pub mod view;

#[cfg(test)]
pub mod testing;
