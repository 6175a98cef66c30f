//! Support code for the `sermon` terminal host.

pub mod demo;
pub mod output;

pub use demo::DemoDevice;
