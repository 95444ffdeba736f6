pub mod agent;
pub mod profile;
