//! User-space driver for the Xbox 360 wireless receiver.
//!
//! A background thread keeps the receiver attached, reads all four controller
//! channels in parallel and decodes their reports into [`ControllerState`]
//! snapshots. [`Driver`] exposes those snapshots and sends LED and rumble
//! commands back to the controllers.

mod commands;
mod config;
mod device;
mod driver;
mod engine;
mod error;
mod report;
mod session;
mod state;
pub mod transport;

pub use config::DriverConfig;
pub use device::{buttons, Channel, ControllerState, LedSetting, MAX_CONTROLLERS, PRODUCT_ID, VENDOR_ID};
pub use driver::Driver;
pub use error::{DriverError, Result};
