pub mod appointment;
pub mod schedule;
