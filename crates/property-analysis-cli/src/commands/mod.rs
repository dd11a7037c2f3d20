pub mod analysis;
pub mod loan;
