//! Counts over a patent collection: by stage, by assignee, by client.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::model::{AssignmentSlot, Employee, Patent, Role, Section, is_done};
use crate::stage::{ProcessingState, Stage, derive_processing_state, derive_stage};

/// Key under which patents without a `client_id` are grouped.
pub const UNASSIGNED_CLIENT: &str = "unassigned";

/// Tally [`derive_stage`] over every patent. Every stage is present, zero or not.
pub fn aggregate_by_stage(patents: &[Patent]) -> BTreeMap<Stage, usize> {
    let mut counts: BTreeMap<Stage, usize> = Stage::ALL.iter().map(|s| (*s, 0)).collect();
    for patent in patents {
        *counts.entry(derive_stage(patent)).or_default() += 1;
    }
    counts
}

/// Tally [`derive_processing_state`] over every patent, zero-initialised.
pub fn aggregate_by_processing_state(patents: &[Patent]) -> BTreeMap<ProcessingState, usize> {
    let mut counts: BTreeMap<ProcessingState, usize> =
        ProcessingState::ALL.iter().map(|s| (*s, 0)).collect();
    for patent in patents {
        *counts.entry(derive_processing_state(patent)).or_default() += 1;
    }
    counts
}

// ── By assignee ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatusBucket {
    Review,
    Completed,
    Drafting,
    PendingConfirmation,
    PendingInformation,
}

/// Per-employee workload counts. `total` is always the sum of the buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub review: usize,
    pub completed: usize,
    pub drafting: usize,
    pub pending_confirmation: usize,
    pub pending_information: usize,
    pub total: usize,
}

impl StatusCounts {
    pub fn record(&mut self, bucket: StatusBucket) {
        match bucket {
            StatusBucket::Review => self.review += 1,
            StatusBucket::Completed => self.completed += 1,
            StatusBucket::Drafting => self.drafting += 1,
            StatusBucket::PendingConfirmation => self.pending_confirmation += 1,
            StatusBucket::PendingInformation => self.pending_information += 1,
        }
        self.total += 1;
    }

    pub fn get(&self, bucket: StatusBucket) -> usize {
        match bucket {
            StatusBucket::Review => self.review,
            StatusBucket::Completed => self.completed,
            StatusBucket::Drafting => self.drafting,
            StatusBucket::PendingConfirmation => self.pending_confirmation,
            StatusBucket::PendingInformation => self.pending_information,
        }
    }
}

/// Classify one assignment slot of one patent into exactly one bucket, or
/// `None` when the slot's filing predecessor is not done yet.
///
/// Precedence: pending confirmation, then pending information (IDF sent but
/// not back), then the sub-status / review pair.
pub fn classify_slot(patent: &Patent, slot: AssignmentSlot) -> Option<StatusBucket> {
    if !patent.slot_open(slot) {
        return None;
    }
    if patent.pending_confirmation(slot.section) {
        return Some(StatusBucket::PendingConfirmation);
    }
    if patent.idf_sent && !patent.idf_received {
        return Some(StatusBucket::PendingInformation);
    }

    let (sub_status, review) = patent.section(slot.section).for_duty(slot.duty);
    let bucket = match (is_done(sub_status), is_done(review)) {
        (true, false) => StatusBucket::Review,
        (true, true) => StatusBucket::Completed,
        (false, _) => StatusBucket::Drafting,
    };
    Some(bucket)
}

/// Workload per assignee name across all six assignment slots.
///
/// `perspective` drops names the roster lists under the opposite duty: a
/// drafter view never counts filers, even when a filer's name was typed into
/// a drafter slot. Names missing from the roster are counted.
pub fn aggregate_by_assignee(
    patents: &[Patent],
    employees: &[Employee],
    perspective: Role,
) -> BTreeMap<String, StatusCounts> {
    let excluded = match perspective {
        Role::Drafter => Some(Role::Filer),
        Role::Filer => Some(Role::Drafter),
        Role::Admin => None,
    };
    let roster: HashMap<&str, Role> = employees
        .iter()
        .map(|e| (e.full_name.trim(), e.role))
        .collect();

    let mut counts: BTreeMap<String, StatusCounts> = BTreeMap::new();
    for patent in patents {
        for slot in AssignmentSlot::ALL {
            let Some(name) = patent.assignee(slot) else {
                continue;
            };
            if excluded.is_some() && roster.get(name).copied() == excluded {
                continue;
            }
            if let Some(bucket) = classify_slot(patent, slot) {
                counts.entry(name.to_string()).or_default().record(bucket);
            }
        }
    }

    debug!(
        patents = patents.len(),
        assignees = counts.len(),
        perspective = perspective.as_str(),
        "aggregated by assignee"
    );
    counts
}

// ── By client ──

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub withdrawn: usize,
    /// Number of distinct assignees, whatever their role.
    pub employee_count: usize,
    pub assignees: BTreeSet<String>,
}

impl ClientStats {
    /// Completed share in percent; 0 for a client with no patents.
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }
}

/// PS and CS complete, and FER either inactive or complete.
pub fn pipeline_complete(patent: &Patent) -> bool {
    patent.section(Section::Ps).completed()
        && patent.section(Section::Cs).completed()
        && (!patent.fer_active() || patent.section(Section::Fer).completed())
}

pub fn aggregate_by_client(patents: &[Patent]) -> BTreeMap<String, ClientStats> {
    let mut clients: BTreeMap<String, ClientStats> = BTreeMap::new();
    for patent in patents {
        let key = patent
            .client_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNASSIGNED_CLIENT);
        let stats = clients.entry(key.to_string()).or_default();

        stats.total += 1;
        if pipeline_complete(patent) {
            stats.completed += 1;
        } else if patent.withdrawn {
            stats.withdrawn += 1;
        } else {
            stats.in_progress += 1;
        }
        for slot in AssignmentSlot::ALL {
            if let Some(name) = patent.assignee(slot) {
                stats.assignees.insert(name.to_string());
            }
        }
    }

    for stats in clients.values_mut() {
        stats.employee_count = stats.assignees.len();
    }
    debug!(patents = patents.len(), clients = clients.len(), "aggregated by client");
    clients
}
