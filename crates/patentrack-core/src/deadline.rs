//! Upcoming and overdue assignment deadlines.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{AssignmentSlot, Duty, FerEntry, Patent, Section, is_done, parse_date};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadlineItem {
    pub tracking_id: String,
    pub slot: AssignmentSlot,
    /// Set for deadlines that come from a numbered FER round.
    pub fer_round: Option<i32>,
    pub assignee: Option<String>,
    pub due: NaiveDate,
    /// Negative when overdue.
    pub days_left: i64,
}

impl DeadlineItem {
    pub fn is_overdue(&self) -> bool {
        self.days_left < 0
    }
}

/// Pending work due within `within_days` of `today`, overdue items included.
///
/// Terminal patents, gated slots, finished work and unparseable dates are
/// skipped. Ordered by due date, then tracking id.
pub fn upcoming_deadlines(
    patents: &[Patent],
    today: NaiveDate,
    within_days: i64,
) -> Vec<DeadlineItem> {
    let mut items = Vec::new();
    for patent in patents.iter().filter(|p| !p.is_terminal()) {
        for slot in AssignmentSlot::ALL {
            if !patent.slot_open(slot) {
                continue;
            }
            let (sub_status, _) = patent.section(slot.section).for_duty(slot.duty);
            if is_done(sub_status) {
                continue;
            }
            let Some(due) = patent.deadline(slot).and_then(|d| parse_date(d).ok()) else {
                continue;
            };
            items.push(DeadlineItem {
                tracking_id: patent.tracking_id.clone(),
                slot,
                fer_round: None,
                assignee: patent.assignee(slot).map(str::to_string),
                due,
                days_left: (due - today).num_days(),
            });
        }

        if patent.slot_open(AssignmentSlot::new(Section::Fer, Duty::Drafter)) {
            for entry in &patent.fer_entries {
                items.extend(fer_round_deadlines(patent, entry, today));
            }
        }
    }

    items.retain(|item| item.days_left <= within_days);
    items.sort_by(|a, b| {
        a.due
            .cmp(&b.due)
            .then_with(|| a.tracking_id.cmp(&b.tracking_id))
    });
    items
}

fn fer_round_deadlines<'a>(
    patent: &'a Patent,
    entry: &'a FerEntry,
    today: NaiveDate,
) -> impl Iterator<Item = DeadlineItem> + 'a {
    let rounds = [
        (
            Duty::Drafter,
            entry.drafting_status,
            &entry.drafter_deadline,
            &entry.drafter_assgn,
        ),
        (
            Duty::Filer,
            entry.filing_status,
            &entry.filer_deadline,
            &entry.filer_assgn,
        ),
    ];
    rounds
        .into_iter()
        .filter(|(_, status, _, _)| !is_done(*status))
        .filter_map(move |(duty, _, deadline, assignee)| {
            let due = parse_date(deadline.as_deref()?).ok()?;
            Some(DeadlineItem {
                tracking_id: patent.tracking_id.clone(),
                slot: AssignmentSlot::new(Section::Fer, duty),
                fer_round: Some(entry.fer_number),
                assignee: assignee.clone(),
                due,
                days_left: (due - today).num_days(),
            })
        })
}
