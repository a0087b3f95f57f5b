//! HTTP handlers

pub mod appointment;
pub mod auth;
pub mod health;
pub mod owner;
pub mod pet;
pub mod product;
pub mod purchase;
pub mod supplier;

pub use appointment::*;
pub use auth::*;
pub use health::*;
pub use owner::*;
pub use pet::*;
pub use product::*;
pub use purchase::*;
pub use supplier::*;
