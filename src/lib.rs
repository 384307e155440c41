#![doc = include_str!("../README.md")]
pub mod calc;
pub mod config;
pub mod csv_store;
pub mod input;
pub mod products;
pub mod sheets;
pub mod store;
pub mod workflow;

pub use products::{Products, Row, PRODUCT_COUNT};
pub use store::{MemoryStore, Store, Worksheet};
pub use workflow::{run, Outcome};
