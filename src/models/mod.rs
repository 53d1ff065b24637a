//! Data models for the cart core.
//!
//! Record shapes match the portal's JSON for cart objects so they pass through the backend unchanged.

mod action;
mod item;
mod record;
mod state;

pub use action::*;
pub use item::*;
pub use record::*;
pub use state::*;
