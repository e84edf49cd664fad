pub mod agent;
pub mod market;
pub mod system;

pub use agent::*;
pub use market::*;
pub use system::*;
