//! Multi-group patent filtering.
//!
//! A group is active when at least one of its leaves is selected. Within an
//! active group a patent must satisfy every selected leaf, and across groups
//! every active group must pass. Selecting "completed" and "withdrawn"
//! together therefore matches nothing; it does not widen the result.
//!
//! Free-text search is the one OR: the query may hit any searchable field.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::model::{AssignmentSlot, FormField, Patent, PaymentStatus, Section, is_done, parse_date};
use crate::stage::{Stage, derive_stage};

type Criterion = fn(&Patent) -> bool;

/// The full filter selection, shaped like the dashboard's filter object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterState {
    pub patent_status: PatentStatusFilter,
    pub payment_status: PaymentStatusFilter,
    pub drafting_status: ProgressFilter,
    pub filing_status: ProgressFilter,
    #[serde(deserialize_with = "form_selection")]
    pub form_status: BTreeSet<FormField>,
    pub stage: BTreeSet<Stage>,
    pub date_range: DateRange,
    pub search_query: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatentStatusFilter {
    pub completed: bool,
    pub in_progress: bool,
    pub not_started: bool,
    pub withdrawn: bool,
    pub idf_sent: bool,
    pub idf_received: bool,
    pub idf_sent_not_received: bool,
    pub cs_data_sent: bool,
    pub cs_data_received: bool,
    pub cs_data_sent_not_received: bool,
}

impl PatentStatusFilter {
    fn criteria(&self) -> [(bool, Criterion); 10] {
        [
            (self.completed, |p| p.completed),
            (self.in_progress, |p| started(p) && !p.is_terminal()),
            (self.not_started, |p| !started(p) && !p.is_terminal()),
            (self.withdrawn, |p| p.withdrawn),
            (self.idf_sent, |p| p.idf_sent),
            (self.idf_received, |p| p.idf_received),
            (self.idf_sent_not_received, |p| p.idf_sent && !p.idf_received),
            (self.cs_data_sent, |p| p.cs_data),
            (self.cs_data_received, |p| p.cs_data_received),
            (self.cs_data_sent_not_received, |p| {
                p.cs_data && !p.cs_data_received
            }),
        ]
    }
}

/// Work has begun once the IDF went out, came back, or PS drafting is done.
fn started(patent: &Patent) -> bool {
    patent.idf_sent || patent.idf_received || is_done(patent.ps_drafting_status)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaymentStatusFilter {
    pub not_sent: bool,
    pub sent: bool,
    pub partial: bool,
    pub received: bool,
}

impl PaymentStatusFilter {
    fn criteria(&self) -> [(bool, Criterion); 4] {
        [
            (self.not_sent, |p| {
                matches!(
                    p.payment_status,
                    None | Some(PaymentStatus::NotSent) | Some(PaymentStatus::NotStarted)
                )
            }),
            (self.sent, |p| p.payment_status == Some(PaymentStatus::Sent)),
            (self.partial, |p| p.payment_status == Some(PaymentStatus::Partial)),
            (self.received, |p| {
                matches!(
                    p.payment_status,
                    Some(PaymentStatus::Received) | Some(PaymentStatus::Complete)
                )
            }),
        ]
    }
}

/// Pending/done leaves per section. Used for both the drafting and the
/// filing group; which sub-status is read depends on the group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProgressFilter {
    pub ps_pending: bool,
    pub ps_done: bool,
    pub cs_pending: bool,
    pub cs_done: bool,
    pub fer_pending: bool,
    pub fer_done: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    Drafting,
    Filing,
}

impl ProgressFilter {
    /// `(selected, section, wants_done)` for each leaf.
    fn leaves(&self) -> [(bool, Section, bool); 6] {
        [
            (self.ps_pending, Section::Ps, false),
            (self.ps_done, Section::Ps, true),
            (self.cs_pending, Section::Cs, false),
            (self.cs_done, Section::Cs, true),
            (self.fer_pending, Section::Fer, false),
            (self.fer_done, Section::Fer, true),
        ]
    }

    fn active_count(&self) -> usize {
        self.leaves().iter().filter(|(selected, _, _)| *selected).count()
    }

    fn passes(&self, patent: &Patent, progress: Progress) -> bool {
        self.leaves()
            .iter()
            .filter(|(selected, _, _)| *selected)
            .all(|(_, section, wants_done)| {
                // FER leaves only speak about patents where FER applies.
                if *section == Section::Fer && !patent.fer_active() {
                    return false;
                }
                let status = patent.section(*section);
                let done = match progress {
                    Progress::Drafting => status.drafted(),
                    Progress::Filing => status.filed(),
                };
                done == *wants_done
            })
    }
}

/// Inclusive bounds on `date_of_filing`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRange {
    #[serde(deserialize_with = "optional_date")]
    pub start: Option<NaiveDate>,
    #[serde(deserialize_with = "optional_date")]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_active(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Undated (or unparseable) patents fail an active range.
    fn passes(&self, patent: &Patent) -> bool {
        if !self.is_active() {
            return true;
        }
        let Some(filed) = patent
            .date_of_filing
            .as_deref()
            .and_then(|d| parse_date(d).ok())
        else {
            return false;
        };
        self.start.is_none_or(|start| filed >= start) && self.end.is_none_or(|end| filed <= end)
    }
}

/// The dashboard sends `formStatus` as one boolean per form; a plain list of
/// form names is accepted too.
#[derive(Deserialize)]
#[serde(untagged)]
enum FormSelection {
    Flags(BTreeMap<FormField, bool>),
    Names(BTreeSet<FormField>),
}

fn form_selection<'de, D>(deserializer: D) -> Result<BTreeSet<FormField>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<FormSelection>::deserialize(deserializer)? {
        None => BTreeSet::new(),
        Some(FormSelection::Names(names)) => names,
        Some(FormSelection::Flags(flags)) => flags
            .into_iter()
            .filter_map(|(form, selected)| selected.then_some(form))
            .collect(),
    })
}

/// A cleared date input arrives as `""`; treat it like `null`.
fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_date(raw).map(Some).map_err(serde::de::Error::custom),
    }
}

fn count_selected(criteria: &[(bool, Criterion)]) -> usize {
    criteria.iter().filter(|(selected, _)| *selected).count()
}

/// Reject as soon as the patent fails any selected criterion.
fn group_passes(criteria: &[(bool, Criterion)], patent: &Patent) -> bool {
    criteria
        .iter()
        .filter(|(selected, _)| *selected)
        .all(|(_, criterion)| criterion(patent))
}

/// Every text field the search box looks at.
fn searchable_fields(patent: &Patent) -> impl Iterator<Item = &str> {
    let fixed = [
        Some(patent.tracking_id.as_str()),
        patent.internal_tracking_id.as_deref(),
        patent.patent_title.as_deref(),
        patent.patent_applicant.as_deref(),
        patent.client_id.as_deref(),
        patent.application_no.as_deref(),
        patent.applicant_addr.as_deref(),
        patent.inventor_ph_no.as_deref(),
        patent.inventor_email.as_deref(),
    ];
    let assignments = AssignmentSlot::ALL
        .into_iter()
        .flat_map(move |slot| [patent.assignee(slot), patent.deadline(slot)]);
    fixed.into_iter().chain(assignments).flatten()
}

impl FilterState {
    fn search_term(&self) -> Option<String> {
        let term = self.search_query.trim();
        (!term.is_empty()).then(|| term.to_lowercase())
    }

    /// Whether a single patent survives every active group.
    pub fn matches(&self, patent: &Patent) -> bool {
        self.matches_with_term(patent, self.search_term().as_deref())
    }

    fn matches_with_term(&self, patent: &Patent, term: Option<&str>) -> bool {
        if !group_passes(&self.patent_status.criteria(), patent) {
            return false;
        }
        if !group_passes(&self.payment_status.criteria(), patent) {
            return false;
        }
        if !self.drafting_status.passes(patent, Progress::Drafting) {
            return false;
        }
        if !self.filing_status.passes(patent, Progress::Filing) {
            return false;
        }
        if !self.form_status.iter().all(|form| patent.forms.is_set(*form)) {
            return false;
        }
        if !self.stage.is_empty() {
            let stage = derive_stage(patent);
            if !self.stage.iter().all(|wanted| *wanted == stage) {
                return false;
            }
        }
        if !self.date_range.passes(patent) {
            return false;
        }
        match term {
            Some(term) => searchable_fields(patent).any(|f| f.to_lowercase().contains(term)),
            None => true,
        }
    }

    /// Number of selected leaves, plus one per date bound and one for a
    /// non-empty search query. A whitespace-only query still counts even
    /// though it matches everything.
    pub fn active_count(&self) -> usize {
        count_selected(&self.patent_status.criteria())
            + count_selected(&self.payment_status.criteria())
            + self.drafting_status.active_count()
            + self.filing_status.active_count()
            + self.form_status.len()
            + self.stage.len()
            + usize::from(self.date_range.start.is_some())
            + usize::from(self.date_range.end.is_some())
            + usize::from(!self.search_query.is_empty())
    }
}

/// Patents matching `filter`, in input order.
pub fn apply_filters<'a>(patents: &'a [Patent], filter: &FilterState) -> Vec<&'a Patent> {
    let term = filter.search_term();
    let matched: Vec<&Patent> = patents
        .iter()
        .filter(|p| filter.matches_with_term(p, term.as_deref()))
        .collect();
    debug!(
        total = patents.len(),
        matched = matched.len(),
        active_filters = filter.active_count(),
        "applied filters"
    );
    matched
}

pub fn count_active_filters(filter: &FilterState) -> usize {
    filter.active_count()
}
