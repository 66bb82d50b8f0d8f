pub mod component;
pub mod control;
pub mod drawable;
pub mod group;
pub mod hooks;
pub mod shape;
