//! Patent prosecution status model and the pure views computed over it:
//! stage derivation, aggregation, filtering, finance, and deadlines.

pub mod aggregate;
pub mod deadline;
mod error;
pub mod filter;
pub mod finance;
pub mod model;
pub mod sort_key;
pub mod stage;

pub use aggregate::{
    ClientStats, StatusBucket, StatusCounts, UNASSIGNED_CLIENT, aggregate_by_assignee,
    aggregate_by_client, aggregate_by_processing_state, aggregate_by_stage, classify_slot,
    pipeline_complete,
};
pub use deadline::{DeadlineItem, upcoming_deadlines};
pub use error::ParseError;
pub use filter::{
    DateRange, FilterState, PatentStatusFilter, PaymentStatusFilter, ProgressFilter, apply_filters,
    count_active_filters,
};
pub use finance::{FinancialSummary, Invoice, TaxRates, financial_summary};
pub use model::{
    AssignmentSlot, Duty, Employee, FerEntry, FormField, Forms, Inventor, Patent, PaymentStatus,
    Role, Section, SectionStatus, is_done, parse_date,
};
pub use sort_key::normalize_tracking_id;
pub use stage::{ProcessingState, Stage, derive_processing_state, derive_stage};
