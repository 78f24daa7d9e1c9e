mod float_compare;
mod prob;
mod stochastic;

#[cfg(test)]
mod test;

pub use float_compare::*;
pub use prob::*;
pub use stochastic::*;
