pub mod app;
pub mod notify;
