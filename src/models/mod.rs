pub mod criticality;
pub mod sow;

pub use criticality::*;
pub use sow::*;
