pub mod exec;
pub mod notify;
