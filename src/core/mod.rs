//! Gate core: the confined state machine and its runtime wiring.
//!
//! The public API from this module is [`StatusMachine`] (synchronous, owned by
//! one context), [`StatusHandle`] (async, any thread) and [`GateBuilder`].
//!
//! Internal modules:
//! - [`machine`]: decision core and signal callbacks;
//! - [`observation`]: starts/stops signal subscriptions with queue occupancy;
//! - [`actor`]: the task that owns the machine and serializes all mutation;
//! - [`handle`]: marshals calls onto the actor;
//! - [`builder`]: wires bus, subscribers and actor.
//!
//! ```text
//! StatusHandle ── Command ──► StatusActor ──► StatusMachine ──► StateStore ──► Bus
//!      ▲  (oneshot reply) ◄───────┘                ▲                            │
//!      │                                           └──── observed signals ◄─────┤
//!      └──────────────────── subscribe() ◄──────────────────────────────────────┘
//! ```

mod actor;
mod builder;
mod handle;
mod machine;
mod observation;

pub use builder::GateBuilder;
pub use handle::StatusHandle;
pub use machine::StatusMachine;
