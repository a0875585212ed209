pub mod functions;
pub mod global;
pub mod schedule;
pub mod stack_project;
pub mod warehouse;
