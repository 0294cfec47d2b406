pub mod collection;
pub mod selection;
pub mod session;
pub mod task;
