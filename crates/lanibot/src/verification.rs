pub mod base;
pub mod factory;
pub mod placeholder;
pub mod widget;

#[cfg(test)]
pub mod mock;
