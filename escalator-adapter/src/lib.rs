//! Input helpers for the `escalator` crate.
//!
//! The `escalator` crate is UI-agnostic and only understands pixel scroll positions. This crate
//! provides small, framework-neutral helpers that turn host input into those positions:
//!
//! - Wheel normalization (axis snapping, speed)
//! - Touch drag with inertial deceleration, behind the [`TouchTranslator`] trait
//! - Tween-based smooth scrolling (optional; adapter-driven)
//! - A [`Controller`] that routes all of the above to an [`escalator::Escalator`]
//!
//! This crate is intentionally framework-agnostic (no DOM/egui bindings).
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod controller;
mod touch;
mod tween;
mod wheel;


pub use controller::Controller;
pub use touch::{InertiaFrame, InertialTouch, TouchOptions, TouchPoint, TouchTranslator};
pub use tween::{Easing, Tween};
pub use wheel::WheelOptions;
