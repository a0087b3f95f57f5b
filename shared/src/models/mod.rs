//! Domain models for the Vet Clinic Management Platform

mod clinic;
mod invoice;
mod purchase;
mod user;

pub use clinic::*;
pub use invoice::*;
pub use purchase::*;
pub use user::*;
