//! Delivery charge and surcharge assembly.

mod breakdown;
mod calculator;
pub mod money;
mod surcharge;

pub use breakdown::*;
pub use calculator::*;
pub use surcharge::*;
