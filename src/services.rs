pub mod tasks;
pub mod view;
