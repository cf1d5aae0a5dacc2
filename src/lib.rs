//! An in-process store of entity component data.
//!
//! An entity is an opaque identifier. Each entity holds a set of components, and that set
//! can change at any time. Components are fixed-size blocks of plain data; all instances
//! of one component type live next to each other in a dense column.
//!
//! Entities that hold exactly the same set of components (their [`Signature`]) form an
//! [`Archetype`]. A query asks for a set of components and returns every entity of every
//! archetype holding *at least* those components, so an entity with position, velocity
//! and health is found by a query for position and velocity alone.
//!
//! # Examples
//!
//! ```
//! use archetype_store::{EntityStore, Query};
//! use bytemuck::{Pod, Zeroable};
//!
//! #[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
//! #[repr(C)]
//! struct Position {
//!     x: f32,
//!     y: f32,
//! }
//!
//! #[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
//! #[repr(C)]
//! struct Velocity {
//!     x: f32,
//!     y: f32,
//! }
//!
//! let mut store = EntityStore::new();
//! let position = store.register::<Position>().unwrap();
//! let velocity = store.register::<Velocity>().unwrap();
//!
//! let e = store.create(&[position, velocity]).unwrap();
//! store.set_component(e, Velocity { x: 1.0, y: 1.0 }).unwrap();
//!
//! let mut query = Query::new();
//! store.query(&mut query, &[position, velocity]).unwrap();
//! for entity in &query {
//!     let vel = *store.get::<Velocity>(entity).unwrap();
//!     let pos = store.get_mut::<Position>(entity).unwrap();
//!     pos.x += vel.x;
//!     pos.y += vel.y;
//! }
//!
//! assert_eq!(store.get::<Position>(e), Some(&Position { x: 1.0, y: 1.0 }));
//!
//! store.remove(e, &[velocity]).unwrap();
//! assert_eq!(store.query(&mut query, &[position, velocity]).unwrap(), 0);
//! assert_eq!(store.query(&mut query, &[position]).unwrap(), 1);
//! ```


mod archetype;
mod component;
mod config;
mod directory;
mod entity;
mod entity_store;
mod entry;
mod error;
mod query;
mod signature;

pub use archetype::entities::EntitiesIter;
pub use archetype::Archetype;
pub use component::column::Column;
pub use component::{Component, ComponentInfo};
pub use config::StoreConfig;
pub use entity::{ArchetypeId, ComponentId, EntityId};
pub use entity_store::EntityStore;
pub use entry::{Entry, EntryMut};
pub use error::{Result, StoreError};
pub use query::{Query, QueryIter};
pub use signature::{Signature, SignatureIter, MAX_COMPONENTS};

pub(crate) type HashMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
