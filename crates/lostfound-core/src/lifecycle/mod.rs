//! Lifecycle engine for found items
//!
//! Each found item carries two independent state dimensions, custody and
//! refund. A [`Transition`] names the predecessor states it accepts in both;
//! [`apply`] checks them and merges the payload into a new record.

mod status;
mod transition;

pub use status::{CustodyStatus, RefundStatus};
pub use transition::{
    apply, DisposalPayload, PoliceFiling, RefundCompletion, RefundSchedule, RefundedDisposition,
    RefundedProcessing, ReturnPayload, SalePayload, Transition,
};
