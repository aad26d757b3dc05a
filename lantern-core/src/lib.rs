//! Lantern Core
//!
//! Reconciliation engine shared by Lantern providers: desired resources and
//! observed state are compared into a plan of effects, which a provider executes.

pub mod differ;
pub mod effect;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod schema;
