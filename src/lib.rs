pub mod api;
pub mod backend;
pub mod config;
pub mod dashboard;
pub mod policy;

pub use self::{config::Config, dashboard::Dashboard};
