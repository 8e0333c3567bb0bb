//! Interaction routing: hit-testing input against the frame's widgets.
//!
//! Widgets register logic callbacks while drawing; the router offers the
//! frame's events to them with keyboard focus semantics and hands back what
//! nobody claimed.

mod router;

pub use router::{LogicId, Router, RouterFrame};
