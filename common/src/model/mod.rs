pub mod contract;
pub mod template;
