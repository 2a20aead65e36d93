//! Alarm Panel Library
//!
//! Core modules for the MQTT alarm control panel.

pub mod audit;
pub mod bus;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod history;
pub mod state;
pub mod timer;
