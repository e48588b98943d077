//! Observability for the Stage Controller.
//!
//! Metric labels are bounded to prevent cardinality explosion:
//! - `event`: bounded by `StageEvent` variants (~15 values)
//! - `reason`: bounded by `TargetReason` variants (~10 values)
//! - `outcome`: completed, stale, cancelled
//!
//! Participant IDs are never used as labels; they appear only in log fields.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `stage_events_total` | Counter | `event` | Inbound events routed |
//! | `stage_event_duration_seconds` | Histogram | `event` | Time spent handling one event |
//! | `stage_large_target_switches_total` | Counter | `reason` | Large video retargets |
//! | `stage_display_switches_total` | Counter | `outcome` | Display switch completions |
//! | `stage_last_n_ignored_ids_total` | Counter | none | Stray entering IDs dropped |
//! | `stage_participants` | Gauge | none | Registry size, local included |
//! | `stage_local_last_n_capacity` | Gauge | none | Local LastN capacity |
//! | `stage_actor_mailbox_depth` | Gauge | none | Session actor backlog |

pub mod metrics;

pub use self::metrics::{
    init_metrics_recorder, record_display_switch, record_event, record_large_target_switch,
    record_last_n_ignored, set_local_last_n_capacity, set_mailbox_depth, set_participants,
};
