//! Business logic services for the Vet Clinic Management Platform

pub mod appointment;
pub mod auth;
pub mod inventory;
pub mod invoice_mirror;
pub mod mirror_outbox;
pub mod owner;
pub mod pet;
pub mod product;
pub mod purchase_store;
pub mod purchasing;
pub mod supplier;

pub use appointment::AppointmentService;
pub use auth::AuthService;
pub use inventory::{InventoryReconciler, PgProductStock, ProductStock};
pub use invoice_mirror::{DisabledInvoiceMirror, InvoiceMirror, PgInvoiceMirror};
pub use mirror_outbox::MirrorOutbox;
pub use owner::{OwnerScope, OwnerService};
pub use pet::PetService;
pub use product::ProductService;
pub use purchase_store::PurchaseStore;
pub use purchasing::PurchaseService;
pub use supplier::SupplierService;
