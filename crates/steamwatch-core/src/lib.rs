//! Registry ownership, reconciliation, and scheduling for the steamwatch
//! tracker.
//!
//! Every five minutes (by default) the [`Scheduler`] asks the
//! [`Reconciler`] to walk every tracked workshop mod and game, compare what
//! upstream reports against the last stored timestamp, persist any change,
//! and announce it exactly once through the [`Dispatcher`].
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `steamwatch.yaml` into
//!   strongly-typed structs.
//! - [`tracker`] -- [`Tracker`], the lock-guarded registry handle shared by
//!   the reconciler and the registration surface.
//! - [`reconcile`] -- One reconciliation pass.
//! - [`dispatch`] -- [`Delivery`] trait, [`Dispatcher`], [`LogDelivery`].
//! - [`render`] -- Notification text.
//! - [`scheduler`] -- Fixed-period driver and [`ShutdownSignal`].

pub mod config;
pub mod dispatch;
pub mod reconcile;
pub mod render;
pub mod scheduler;
pub mod tracker;

pub use config::WatchConfig;
pub use dispatch::{Delivery, DeliveryError, Dispatcher, LogDelivery};
pub use reconcile::{PassSummary, Reconciler, ReconcilerConfig};
pub use scheduler::{ScheduleReport, Scheduler, SchedulerConfig, ShutdownSignal};
pub use tracker::{Persisted, Tracker, TrackerError};
