//! Background housekeeping tasks.

pub mod sweeper;

pub use sweeper::ExpirySweeper;
