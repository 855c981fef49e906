//! Run history and trace side-channel

pub mod history;
pub mod tracer;

pub use self::history::{FlowHistory, HistoryStep, ResidualEntry, ResidualSnapshot, StepResidual};
pub use self::tracer::{
    format_step_line, CancellationToken, CollectingTraceSink, LogTraceSink, TraceSink,
};
