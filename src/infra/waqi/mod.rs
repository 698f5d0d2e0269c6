//! WAQI (World Air Quality Index) provider implementation.

mod client;

pub use client::{DEFAULT_BASE_URL, WaqiClient};
