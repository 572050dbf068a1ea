//! Conversion workflow - drives one file through upload, processing and
//! completion, and owns the state the presentation layer renders.
//!
//! [`WorkflowMachine`] holds the transition rules as a pure function.
//! [`ConversionWorkflow`] runs the operations those transitions ask for and
//! publishes every state change.

mod config;
mod runner;
mod state;
mod types;

pub use config::WorkflowConfig;
pub use runner::ConversionWorkflow;
pub use state::{
    IdleState, Selection, Transition, UploadingState, WorkflowEffect, WorkflowEvent,
    WorkflowMachine, WorkflowState, WorkflowStateKind,
};
pub use types::{WorkflowError, WorkflowUpdate};
