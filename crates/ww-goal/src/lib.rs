//! # ww-goal
//!
//! Recurring goal templates, per-week goal instances, and completion
//! cascades for Weekwise.
//!
//! A [`GoalTemplate`] is a recurring rule ("run three times a week, for six
//! weeks"). The [`materializer`] turns the templates that are active for a
//! given ISO week into concrete [`GoalInstance`]s and persists them through a
//! [`WeekStore`]. When an instance is toggled, [`cascade::toggle`] computes
//! which other weeks must change: a whole month for monthly goals, the
//! remaining weeks of a deadline chain once the deadline goal is met.
//!
//! ## Key components
//!
//! - [`activation`] — pure rule deciding whether a template applies to a week
//! - [`materializer`] — idempotent lazy and bulk expansion of templates
//! - [`strategy`] — [`InstantiationStrategy`]: [`LazyPerWeek`] vs [`EagerBatch`]
//! - [`cascade`] — the completion state machine, producing a [`CascadePlan`]
//! - [`LoadCache`] — weeks already materialized in this session
//! - [`Optimistic`] — apply / commit / rollback of in-memory state
//! - [`GoalSession`] — the UI-facing API tying the above together
//! - [`JsonWeekStore`] / [`MemoryWeekStore`] — persistence gateway implementations
//! - [`GoalEvent`] / [`EventDispatcher`] — events for notification sinks

pub mod activation;
pub mod cache;
pub mod cascade;
pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod instance;
pub mod kpi;
pub mod materializer;
pub mod memory;
pub mod optimistic;
pub mod session;
pub mod store;
pub mod strategy;
pub mod template;

pub use activation::{evaluate, is_active, Activation, ActiveReason, InactiveReason};
pub use cache::LoadCache;
pub use cascade::{CascadeKind, CascadePlan, WeekGoals};
pub use config::WeekwiseConfig;
pub use document::{WeekDocument, WeekEntry};
pub use error::GoalError;
pub use events::{EventDispatcher, GoalEvent, LogSink, NotificationSink};
pub use instance::{GoalInstance, GoalKind};
pub use kpi::{week_progress, WeekKpis};
pub use materializer::{bulk_instantiate, load_or_create, BulkReport};
pub use memory::MemoryWeekStore;
pub use optimistic::{Optimistic, Snapshot};
pub use session::{GoalSession, ToggleOutcome};
pub use store::{JsonWeekStore, MilestoneSource, NoMilestones, WeekStore};
pub use strategy::{
    EagerBatch, GoalRequest, InstantiationStrategy, LazyPerWeek, SeriesRequest, SeriesShape,
};
pub use template::{DreamLink, DurationType, GoalTemplate, Milestone, Recurrence};
