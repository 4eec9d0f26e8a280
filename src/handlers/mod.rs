pub mod catalog;
pub mod system;

pub use catalog::Resource;
