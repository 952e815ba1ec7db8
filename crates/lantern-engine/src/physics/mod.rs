//! Axis-aligned collision helpers for tile-based worlds.

mod collider;

pub use collider::Collider;
