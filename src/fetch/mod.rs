pub mod duration;
pub mod orchestrator;
pub mod selection;

pub use orchestrator::Orchestrator;
