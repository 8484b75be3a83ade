//! Upstream source adapters for the steamwatch tracker.
//!
//! Each adapter answers one question about one item: what is its current
//! upstream state? The answer is a [`Lookup`] on success, or an
//! [`UpstreamError`] when upstream could not be observed. The two must never
//! be confused: only [`Lookup::NotFound`] is evidence that an item is gone.
//!
//! # Architecture
//!
//! ```text
//! UpstreamSource::fetch(kind, id)
//!     |
//!     +-- WorkshopMod --> WorkshopAdapter   (GetPublishedFileDetails)
//!     |
//!     +-- Game -------> AppDetailsAdapter (appdetails) --> NewsAdapter (GetNewsForApp)
//! ```
//!
//! # Modules
//!
//! - [`workshop`] -- Steam Workshop item lookup
//! - [`app_details`] -- Steam store application lookup
//! - [`news`] -- Most recent announcement for an application
//! - [`steam`] -- [`SteamSource`], the composite used in production
//! - [`error`] -- Transient failure taxonomy

pub mod app_details;
pub mod error;
mod http;
pub mod news;
pub mod steam;
pub mod workshop;

use std::future::Future;
use std::sync::Arc;

use steamwatch_types::ItemKind;

pub use error::UpstreamError;
pub use steam::{SteamClientConfig, SteamSource};

/// The observed upstream state of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemState {
    /// Upstream's last-modified timestamp, in unix seconds.
    pub update_timestamp: i64,
    /// Upstream's display name, when the endpoint returns one.
    pub title: Option<String>,
}

/// The authoritative answer from an upstream lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The item exists and has this state.
    Found(ItemState),
    /// The item exists but upstream has nothing to compare against
    /// (e.g. a game with no news items).
    NoChange,
    /// Upstream confirms the item does not exist.
    NotFound,
}

/// What registration needs to know about an item before it is tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    /// Display name to store.
    pub name: String,
    /// Initial observation, if upstream had one.
    pub update_timestamp: Option<i64>,
}

impl Description {
    /// Describe `id` from a lookup of it. The upstream title wins over the
    /// id as display name; `NotFound` yields `None`.
    pub fn from_lookup(id: &str, lookup: Lookup) -> Option<Self> {
        match lookup {
            Lookup::Found(state) => Some(Self {
                name: state.title.unwrap_or_else(|| id.to_owned()),
                update_timestamp: Some(state.update_timestamp),
            }),
            Lookup::NoChange => Some(Self {
                name: id.to_owned(),
                update_timestamp: None,
            }),
            Lookup::NotFound => None,
        }
    }
}

/// A source of upstream item state.
///
/// The reconciler is generic over this trait so tests can script outcomes
/// without a network. Implementations must bound the duration of each call
/// themselves; the reconciler adds its own deadline on top.
pub trait UpstreamSource: Send + Sync {
    /// Fetch the current state of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when upstream could not be observed. A
    /// missing item is `Ok(Lookup::NotFound)`, never an error.
    fn fetch(
        &self,
        kind: ItemKind,
        id: &str,
    ) -> impl Future<Output = Result<Lookup, UpstreamError>> + Send;

    /// Look up the name and initial timestamp of an item about to be tracked.
    ///
    /// Returns `Ok(None)` when upstream confirms the item does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when upstream could not be observed.
    fn describe(
        &self,
        kind: ItemKind,
        id: &str,
    ) -> impl Future<Output = Result<Option<Description>, UpstreamError>> + Send {
        async move { Ok(Description::from_lookup(id, self.fetch(kind, id).await?)) }
    }
}

impl<T: UpstreamSource> UpstreamSource for Arc<T> {
    fn fetch(
        &self,
        kind: ItemKind,
        id: &str,
    ) -> impl Future<Output = Result<Lookup, UpstreamError>> + Send {
        T::fetch(self, kind, id)
    }

    fn describe(
        &self,
        kind: ItemKind,
        id: &str,
    ) -> impl Future<Output = Result<Option<Description>, UpstreamError>> + Send {
        T::describe(self, kind, id)
    }
}
