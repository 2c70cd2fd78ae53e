pub mod engine;
pub mod session;
pub mod topic;

pub use engine::Broker;
