//! # engine_component
//!
//! The "E" and "C" of the frame runtime: entity identity, component kinds and
//! the store that owns them.
//!
//! This crate provides:
//!
//! - [`Entity`]: lightweight `u64` entity identifiers, never reused.
//! - [`Component`] trait and [`ComponentTypeId`]: FNV-1a kind ids.
//! - [`Attached`]: a stored component with its owner back-reference.
//! - [`ComponentStore`]: entity table plus kind → entity inverse index.
//! - [`QueryDescriptor`]: declarative entity selection for systems.
//! - [`ActiveScene`] / [`CreatedInScene`]: scene ownership tagging.

pub mod component;
pub mod entity;
pub mod query;
pub mod scene;
pub mod store;

pub use component::{Attached, Component, ComponentTypeId, kind_hash};
pub use entity::{Entity, EntityAllocator};
pub use query::QueryDescriptor;
pub use scene::{ActiveScene, CreatedInScene};
pub use store::ComponentStore;
