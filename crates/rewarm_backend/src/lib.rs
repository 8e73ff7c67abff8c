// Copyright (c) Microsoft Corporation.

//! Core storage abstractions for the rewarm cache.
//!
//! This crate defines the [`Backend`] trait that all storage implementations
//! must satisfy, along with [`Entry`] for storing values with freshness
//! metadata and [`Error`] for fallible operations.
//!
//! # Overview
//!
//! The backend abstraction separates storage concerns from cache coordination.
//! Implement [`Backend`] for your storage, then use `rewarm` to layer
//! freshness classification, single-flight admission, and background refresh
//! on top.
//!
//! # Implementing a Backend
//!
//! ```
//! use rewarm_backend::{Backend, Entry, Error};
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//! use std::time::Duration;
//!
//! struct SimpleBackend<T>(RwLock<HashMap<String, Entry<T>>>);
//!
//! impl<T> Backend<T> for SimpleBackend<T>
//! where
//!     T: Send + Sync,
//! {
//!     async fn get(&self, key: &str) -> Result<Option<Entry<T>>, Error> {
//!         Ok(self.0.read().unwrap().get(key).cloned())
//!     }
//!
//!     async fn set(&self, key: &str, _ttl: Duration, entry: Entry<T>) -> Result<(), Error> {
//!         self.0.write().unwrap().insert(key.to_owned(), entry);
//!         Ok(())
//!     }
//! }
//! ```

mod backend;
mod entry;
pub mod error;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use backend::Backend;
#[doc(inline)]
pub use entry::Entry;
#[doc(inline)]
pub use error::{BoxError, Error, Result};
