//! Browser driver: Playwright helper processes behind the session traits.

mod playwright;
mod process;

pub use playwright::{ensure_node_available, ensure_playwright_available};
pub use process::{DriverOptions, DriverProcess, DriverSession, DriverSessionFactory};
