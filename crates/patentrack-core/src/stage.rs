//! Lifecycle stage derivation.
//!
//! Two taxonomies are derived from the same status vector and they are not
//! interchangeable:
//!
//! - [`derive_stage`] checks the furthest-progressed condition first and is
//!   what dashboards, counters and the stage filter use.
//! - [`derive_processing_state`] walks from the earliest incomplete step and
//!   feeds the processing-state distribution table.
//!
//! TODO: the distribution table could be rebuilt on `Stage`; until its labels
//! are retired both derivations stay.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ParseError;
use crate::model::{Patent, Section, is_done};

/// Current lifecycle stage. Variants are declared in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Withdrawn,
    Completed,
    CsCompleted,
    CsFilingApproval,
    CsFiling,
    CsDraftingApproval,
    CsDrafting,
    CsDataReceived,
    CsDataSent,
    PsCompleted,
    PsFilingApproval,
    PsFiling,
    PsDraftingApproval,
    PsDrafting,
    IdfReceived,
    IdfSent,
}

impl Stage {
    /// All stages, highest priority first.
    pub const ALL: [Stage; 16] = [
        Stage::Withdrawn,
        Stage::Completed,
        Stage::CsCompleted,
        Stage::CsFilingApproval,
        Stage::CsFiling,
        Stage::CsDraftingApproval,
        Stage::CsDrafting,
        Stage::CsDataReceived,
        Stage::CsDataSent,
        Stage::PsCompleted,
        Stage::PsFilingApproval,
        Stage::PsFiling,
        Stage::PsDraftingApproval,
        Stage::PsDrafting,
        Stage::IdfReceived,
        Stage::IdfSent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Withdrawn => "withdrawn",
            Stage::Completed => "completed",
            Stage::CsCompleted => "cs_completed",
            Stage::CsFilingApproval => "cs_filing_approval",
            Stage::CsFiling => "cs_filing",
            Stage::CsDraftingApproval => "cs_drafting_approval",
            Stage::CsDrafting => "cs_drafting",
            Stage::CsDataReceived => "cs_data_received",
            Stage::CsDataSent => "cs_data_sent",
            Stage::PsCompleted => "ps_completed",
            Stage::PsFilingApproval => "ps_filing_approval",
            Stage::PsFiling => "ps_filing",
            Stage::PsDraftingApproval => "ps_drafting_approval",
            Stage::PsDrafting => "ps_drafting",
            Stage::IdfReceived => "idf_received",
            Stage::IdfSent => "idf_sent",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Stage::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == wanted)
            .ok_or_else(|| ParseError::UnknownStage(s.to_string()))
    }
}

/// Derive the single current stage of a patent.
///
/// First match wins. Terminal flags beat everything, and CS conditions are
/// checked before PS ones since reaching CS implies PS is behind us. Sub-field
/// codes are never cross-validated, only prioritised.
pub fn derive_stage(patent: &Patent) -> Stage {
    if patent.withdrawn {
        return Stage::Withdrawn;
    }
    if patent.completed {
        return Stage::Completed;
    }

    let cs = patent.section(Section::Cs);
    if cs.completed() {
        return Stage::CsCompleted;
    }
    if cs.filed() {
        return if is_done(cs.review_file) {
            Stage::CsFilingApproval
        } else {
            Stage::CsFiling
        };
    }
    if cs.drafted() {
        return if is_done(cs.review_draft) {
            Stage::CsDraftingApproval
        } else {
            Stage::CsDrafting
        };
    }
    if patent.cs_data_received {
        return Stage::CsDataReceived;
    }
    if patent.cs_data {
        return Stage::CsDataSent;
    }

    let ps = patent.section(Section::Ps);
    if ps.completed() {
        return Stage::PsCompleted;
    }
    if ps.filed() {
        return if is_done(ps.review_file) {
            Stage::PsFilingApproval
        } else {
            Stage::PsFiling
        };
    }
    if ps.drafted() {
        return if is_done(ps.review_draft) {
            Stage::PsDraftingApproval
        } else {
            Stage::PsDrafting
        };
    }
    if patent.idf_received {
        return Stage::IdfReceived;
    }
    Stage::IdfSent
}

/// Fine-grained processing state used by the distribution table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProcessingState {
    AwaitingIdf,
    PsDraftingPending,
    PsDrafted,
    PsFiled,
    CsDrafted,
    CsFiled,
    FerDraftingPending,
    FerDrafted,
    FerFiled,
    Completed,
    Withdrawn,
    Unknown,
}

impl ProcessingState {
    pub const ALL: [ProcessingState; 12] = [
        ProcessingState::AwaitingIdf,
        ProcessingState::PsDraftingPending,
        ProcessingState::PsDrafted,
        ProcessingState::PsFiled,
        ProcessingState::CsDrafted,
        ProcessingState::CsFiled,
        ProcessingState::FerDraftingPending,
        ProcessingState::FerDrafted,
        ProcessingState::FerFiled,
        ProcessingState::Completed,
        ProcessingState::Withdrawn,
        ProcessingState::Unknown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProcessingState::AwaitingIdf => "Awaiting IDF",
            ProcessingState::PsDraftingPending => "PS Drafting Pending",
            ProcessingState::PsDrafted => "PS Drafted",
            ProcessingState::PsFiled => "PS Filed",
            ProcessingState::CsDrafted => "CS Drafted",
            ProcessingState::CsFiled => "CS Filed",
            ProcessingState::FerDraftingPending => "FER Drafting Pending",
            ProcessingState::FerDrafted => "FER Drafted",
            ProcessingState::FerFiled => "FER Filed",
            ProcessingState::Completed => "Completed",
            ProcessingState::Withdrawn => "Withdrawn",
            ProcessingState::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Derive the processing state by walking from the earliest incomplete step.
///
/// Terminal flags are only consulted once every pipeline step is done, so a
/// withdrawn patent that never received its IDF still reads "Awaiting IDF".
pub fn derive_processing_state(patent: &Patent) -> ProcessingState {
    if !patent.idf_received {
        return ProcessingState::AwaitingIdf;
    }

    let ps = patent.section(Section::Ps);
    if !ps.drafted() {
        return ProcessingState::PsDraftingPending;
    }
    if !ps.filed() {
        return ProcessingState::PsDrafted;
    }

    let cs = patent.section(Section::Cs);
    if !cs.drafted() {
        return ProcessingState::PsFiled;
    }
    if !cs.filed() {
        return ProcessingState::CsDrafted;
    }

    if patent.fer_active() {
        let fer = patent.section(Section::Fer);
        if !fer.drafted() {
            return ProcessingState::FerDraftingPending;
        }
        if !fer.filed() {
            return ProcessingState::FerDrafted;
        }
        if !fer.completed() {
            return ProcessingState::FerFiled;
        }
    } else if !patent.is_terminal() {
        return ProcessingState::CsFiled;
    }

    if patent.completed {
        ProcessingState::Completed
    } else if patent.withdrawn {
        ProcessingState::Withdrawn
    } else {
        ProcessingState::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// The raw predicate of each stage, without priority.
    fn predicate(stage: Stage, p: &Patent) -> bool {
        match stage {
            Stage::Withdrawn => p.withdrawn,
            Stage::Completed => p.completed,
            Stage::CsCompleted => p.cs_completion_status == 1,
            Stage::CsFilingApproval => p.cs_filing_status == 1 && p.cs_review_file_status == 1,
            Stage::CsFiling => p.cs_filing_status == 1,
            Stage::CsDraftingApproval => {
                p.cs_drafting_status == 1 && p.cs_review_draft_status == 1
            }
            Stage::CsDrafting => p.cs_drafting_status == 1,
            Stage::CsDataReceived => p.cs_data_received,
            Stage::CsDataSent => p.cs_data,
            Stage::PsCompleted => p.ps_completion_status == 1,
            Stage::PsFilingApproval => p.ps_filing_status == 1 && p.ps_review_file_status == 1,
            Stage::PsFiling => p.ps_filing_status == 1,
            Stage::PsDraftingApproval => {
                p.ps_drafting_status == 1 && p.ps_review_draft_status == 1
            }
            Stage::PsDrafting => p.ps_drafting_status == 1,
            Stage::IdfReceived => p.idf_received,
            Stage::IdfSent => true,
        }
    }

    prop_compose! {
        fn arb_patent()(
            flags in proptest::collection::vec(any::<bool>(), 6),
            codes in proptest::collection::vec(0..=1i32, 16),
        ) -> Patent {
            Patent {
                withdrawn: flags[0],
                completed: flags[1],
                idf_sent: flags[2],
                idf_received: flags[3],
                cs_data: flags[4],
                cs_data_received: flags[5],
                ps_drafting_status: codes[0],
                ps_review_draft_status: codes[1],
                ps_filing_status: codes[2],
                ps_review_file_status: codes[3],
                ps_completion_status: codes[4],
                cs_drafting_status: codes[5],
                cs_review_draft_status: codes[6],
                cs_filing_status: codes[7],
                cs_review_file_status: codes[8],
                cs_completion_status: codes[9],
                fer_status: codes[10],
                fer_drafter_status: codes[11],
                fer_review_draft_status: codes[12],
                fer_filing_status: codes[13],
                fer_review_file_status: codes[14],
                fer_completion_status: codes[15],
                ..Default::default()
            }
        }
    }

    proptest! {
        #[test]
        fn stage_is_first_matching_predicate(patent in arb_patent()) {
            let derived = derive_stage(&patent);
            let first = Stage::ALL
                .iter()
                .copied()
                .find(|s| predicate(*s, &patent))
                .unwrap();
            prop_assert_eq!(derived, first);
            prop_assert!(predicate(derived, &patent));
        }

        #[test]
        fn processing_state_is_total(patent in arb_patent()) {
            let state = derive_processing_state(&patent);
            prop_assert!(ProcessingState::ALL.contains(&state));
        }
    }

    #[test]
    fn terminal_highest_wins() {
        let patent = Patent {
            withdrawn: true,
            completed: true,
            cs_completion_status: 1,
            ..Default::default()
        };
        assert_eq!(derive_stage(&patent), Stage::Withdrawn);
    }

    #[test]
    fn cs_checked_before_ps() {
        let patent = Patent {
            cs_drafting_status: 1,
            cs_review_draft_status: 1,
            ps_drafting_status: 0,
            ..Default::default()
        };
        assert_eq!(derive_stage(&patent), Stage::CsDraftingApproval);
    }

    #[test]
    fn empty_record_falls_back_to_idf_sent() {
        assert_eq!(derive_stage(&Patent::default()), Stage::IdfSent);
    }

    #[test]
    fn filing_without_review_is_filing() {
        let patent = Patent {
            ps_drafting_status: 1,
            ps_review_draft_status: 1,
            ps_filing_status: 1,
            ..Default::default()
        };
        assert_eq!(derive_stage(&patent), Stage::PsFiling);
    }

    #[test]
    fn cs_data_ranks_above_ps_completion() {
        let patent = Patent {
            ps_completion_status: 1,
            cs_data: true,
            ..Default::default()
        };
        assert_eq!(derive_stage(&patent), Stage::CsDataSent);
    }

    #[test]
    fn out_of_domain_codes_count_as_pending() {
        let patent = Patent {
            idf_received: true,
            ps_drafting_status: 2,
            ..Default::default()
        };
        assert_eq!(derive_stage(&patent), Stage::IdfReceived);
    }

    #[test]
    fn stage_parse_and_display() {
        for stage in Stage::ALL {
            assert_eq!(stage.to_string().parse::<Stage>().unwrap(), stage);
        }
        assert_eq!("cs-filing".parse::<Stage>().unwrap(), Stage::CsFiling);
        assert!("drafting".parse::<Stage>().is_err());
    }

    #[test]
    fn stage_serde_uses_snake_case() {
        let json = serde_json::to_string(&Stage::PsDraftingApproval).unwrap();
        assert_eq!(json, r#""ps_drafting_approval""#);
    }

    fn filed_through_cs() -> Patent {
        Patent {
            idf_received: true,
            ps_drafting_status: 1,
            ps_filing_status: 1,
            cs_drafting_status: 1,
            cs_filing_status: 1,
            ..Default::default()
        }
    }

    #[test]
    fn processing_walks_earliest_step_first() {
        let mut patent = Patent {
            withdrawn: true,
            ..Default::default()
        };
        assert_eq!(derive_processing_state(&patent), ProcessingState::AwaitingIdf);

        patent.withdrawn = false;
        patent.idf_received = true;
        assert_eq!(
            derive_processing_state(&patent),
            ProcessingState::PsDraftingPending
        );

        patent.ps_drafting_status = 1;
        assert_eq!(derive_processing_state(&patent), ProcessingState::PsDrafted);

        patent.ps_filing_status = 1;
        assert_eq!(derive_processing_state(&patent), ProcessingState::PsFiled);

        patent.cs_drafting_status = 1;
        assert_eq!(derive_processing_state(&patent), ProcessingState::CsDrafted);

        patent.cs_filing_status = 1;
        assert_eq!(derive_processing_state(&patent), ProcessingState::CsFiled);
    }

    #[test]
    fn processing_fer_states() {
        let mut patent = filed_through_cs();
        patent.fer_status = 1;
        assert_eq!(
            derive_processing_state(&patent),
            ProcessingState::FerDraftingPending
        );

        patent.fer_drafter_status = 1;
        assert_eq!(derive_processing_state(&patent), ProcessingState::FerDrafted);

        patent.fer_filing_status = 1;
        assert_eq!(derive_processing_state(&patent), ProcessingState::FerFiled);

        patent.fer_completion_status = 1;
        assert_eq!(derive_processing_state(&patent), ProcessingState::Unknown);

        patent.completed = true;
        assert_eq!(derive_processing_state(&patent), ProcessingState::Completed);
    }

    #[test]
    fn processing_terminal_without_fer() {
        let mut patent = filed_through_cs();
        patent.withdrawn = true;
        assert_eq!(derive_processing_state(&patent), ProcessingState::Withdrawn);

        patent.completed = true;
        assert_eq!(derive_processing_state(&patent), ProcessingState::Completed);
    }

    #[test]
    fn processing_labels() {
        assert_eq!(ProcessingState::AwaitingIdf.label(), "Awaiting IDF");
        assert_eq!(ProcessingState::FerDraftingPending.to_string(), "FER Drafting Pending");
    }
}
