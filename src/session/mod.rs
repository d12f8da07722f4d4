//! Cross-cutting session signals.

pub mod broadcast;
