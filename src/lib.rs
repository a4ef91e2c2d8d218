//! A tilting, layered-blur card rendered in software.
//!
//! The card composites its background with [`compositor`] pipelines,
//! projects it in 3D, and reacts to drags and taps through
//! [`controller::CardController`]. [`widget`] drives it in a terminal;
//! [`snapshot`] renders single frames to PNG.

pub mod animation;
pub mod assets;
pub mod card;
pub mod compositor;
pub mod config;
pub mod controller;
pub mod gesture;
pub mod graphics;
pub mod host;
pub mod logging;
pub mod math;
pub mod snapshot;
pub mod state;
pub mod terminal;
pub mod text;
pub mod timer;
pub mod vertex;
pub mod widget;
