//! Patent status vector, roster, and the small enums that index into them.
//!
//! Rows arrive from the hosted database with plenty of nulls. Every scalar
//! field here deserializes `null` (or a missing key) as its default, so a
//! half-populated record still parses and simply classifies as "pending".

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::ParseError;

/// Deserialize `null` as `T::default()`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Status codes are `0` (pending) or `1` (done). Anything else counts as pending.
pub fn is_done(code: i32) -> bool {
    code == 1
}

/// Parse the date part of a stored date. Timestamps such as
/// `2024-03-01T00:00:00` or `2024-03-01 10:00` keep only the date, and
/// month and day need not be zero-padded.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ParseError> {
    let date = raw.trim().split(['T', ' ']).next().unwrap_or_default();
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ParseError::InvalidDate(raw.to_string()))
}

// ── Sections and assignment slots ──

/// One of the three pipeline sections that carry drafting/filing sub-fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Provisional Specification.
    Ps,
    /// Complete Specification.
    Cs,
    /// First Examination Report.
    Fer,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Ps, Section::Cs, Section::Fer];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Ps => "PS",
            Section::Cs => "CS",
            Section::Fer => "FER",
        }
    }
}

/// The kind of work an assignee does within a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Duty {
    Drafter,
    Filer,
}

/// A `(section, duty)` pair naming one of the six `{section}_{duty}_assgn` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssignmentSlot {
    pub section: Section,
    pub duty: Duty,
}

impl AssignmentSlot {
    pub const ALL: [AssignmentSlot; 6] = [
        AssignmentSlot::new(Section::Ps, Duty::Drafter),
        AssignmentSlot::new(Section::Ps, Duty::Filer),
        AssignmentSlot::new(Section::Cs, Duty::Drafter),
        AssignmentSlot::new(Section::Cs, Duty::Filer),
        AssignmentSlot::new(Section::Fer, Duty::Drafter),
        AssignmentSlot::new(Section::Fer, Duty::Filer),
    ];

    pub const fn new(section: Section, duty: Duty) -> Self {
        Self { section, duty }
    }
}

impl fmt::Display for AssignmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let duty = match self.duty {
            Duty::Drafter => "drafter",
            Duty::Filer => "filer",
        };
        write!(f, "{} {}", self.section.as_str(), duty)
    }
}

/// The five status codes of one section, read out of the flat record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionStatus {
    pub drafting: i32,
    pub review_draft: i32,
    pub filing: i32,
    pub review_file: i32,
    pub completion: i32,
}

impl SectionStatus {
    pub fn drafted(&self) -> bool {
        is_done(self.drafting)
    }

    pub fn filed(&self) -> bool {
        is_done(self.filing)
    }

    pub fn completed(&self) -> bool {
        is_done(self.completion)
    }

    /// `(sub_status, review_flag)` for the given duty.
    pub fn for_duty(&self, duty: Duty) -> (i32, i32) {
        match duty {
            Duty::Drafter => (self.drafting, self.review_draft),
            Duty::Filer => (self.filing, self.review_file),
        }
    }
}

// ── Payment ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    NotSent,
    Sent,
    Received,
    NotStarted,
    Partial,
    Complete,
    #[serde(other)]
    Other,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::NotSent => "not_sent",
            PaymentStatus::Sent => "sent",
            PaymentStatus::Received => "received",
            PaymentStatus::NotStarted => "not_started",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Complete => "complete",
            PaymentStatus::Other => "other",
        }
    }
}

// ── Forms ──

macro_rules! form_fields {
    ($($variant:ident => $column:ident),+ $(,)?) => {
        /// Form-requirement flags, one per statutory form.
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct Forms {
            $(
                #[serde(deserialize_with = "nullable")]
                pub $column: bool,
            )+
        }

        /// Names one column of [`Forms`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(into = "String", try_from = "String")]
        pub enum FormField {
            $($variant),+
        }

        impl FormField {
            pub const ALL: &'static [FormField] = &[$(FormField::$variant),+];

            /// The column name, e.g. `form_07a`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(FormField::$variant => stringify!($column)),+
                }
            }
        }

        impl Forms {
            pub fn is_set(&self, field: FormField) -> bool {
                match field {
                    $(FormField::$variant => self.$column),+
                }
            }

            pub fn set(&mut self, field: FormField, value: bool) {
                match field {
                    $(FormField::$variant => self.$column = value),+
                }
            }
        }
    };
}

form_fields! {
    Form01 => form_01,
    Form02Ps => form_02_ps,
    Form02Cs => form_02_cs,
    Form03 => form_03,
    Form04 => form_04,
    Form05 => form_05,
    Form06 => form_06,
    Form07 => form_07,
    Form07a => form_07a,
    Form08 => form_08,
    Form08a => form_08a,
    Form09 => form_09,
    Form09a => form_09a,
    Form10 => form_10,
    Form11 => form_11,
    Form12 => form_12,
    Form13 => form_13,
    Form14 => form_14,
    Form15 => form_15,
    Form16 => form_16,
    Form17 => form_17,
    Form18 => form_18,
    Form18a => form_18a,
    Form19 => form_19,
    Form20 => form_20,
    Form21 => form_21,
    Form22 => form_22,
    Form23 => form_23,
    Form24 => form_24,
    Form25 => form_25,
    Form26 => form_26,
    Form27 => form_27,
    Form28 => form_28,
    Form29 => form_29,
    Form30 => form_30,
    Form31 => form_31,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormField {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        FormField::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| ParseError::UnknownForm(s.to_string()))
    }
}

impl From<FormField> for String {
    fn from(field: FormField) -> Self {
        field.as_str().to_string()
    }
}

impl TryFrom<String> for FormField {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ── Nested collections ──

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inventor {
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    pub address: Option<String>,
}

/// One numbered FER round with its own assignments and status codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FerEntry {
    #[serde(deserialize_with = "nullable")]
    pub fer_number: i32,
    pub drafter_assgn: Option<String>,
    pub drafter_deadline: Option<String>,
    pub filer_assgn: Option<String>,
    pub filer_deadline: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub drafting_status: i32,
    #[serde(deserialize_with = "nullable")]
    pub review_draft_status: i32,
    #[serde(deserialize_with = "nullable")]
    pub filing_status: i32,
    #[serde(deserialize_with = "nullable")]
    pub review_file_status: i32,
    #[serde(deserialize_with = "nullable")]
    pub completion_status: i32,
}

// ── Patent ──

/// One patent's flat status vector, as stored in the `patents` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Patent {
    // Identity
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub tracking_id: String,
    pub internal_tracking_id: Option<String>,
    pub client_id: Option<String>,
    pub patent_title: Option<String>,
    pub patent_applicant: Option<String>,
    pub application_no: Option<String>,
    pub applicant_addr: Option<String>,
    pub inventor_ph_no: Option<String>,
    pub inventor_email: Option<String>,
    /// `YYYY-MM-DD`, possibly with a trailing time part.
    pub date_of_filing: Option<String>,

    // Intake
    #[serde(deserialize_with = "nullable")]
    pub idf_sent: bool,
    #[serde(deserialize_with = "nullable")]
    pub idf_received: bool,
    /// CS data sent to the client.
    #[serde(deserialize_with = "nullable")]
    pub cs_data: bool,
    #[serde(deserialize_with = "nullable")]
    pub cs_data_received: bool,

    // Provisional Specification
    pub ps_drafter_assgn: Option<String>,
    pub ps_drafter_deadline: Option<String>,
    pub ps_filer_assgn: Option<String>,
    pub ps_filer_deadline: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub ps_drafting_status: i32,
    #[serde(deserialize_with = "nullable")]
    pub ps_review_draft_status: i32,
    #[serde(deserialize_with = "nullable")]
    pub ps_filing_status: i32,
    #[serde(deserialize_with = "nullable")]
    pub ps_review_file_status: i32,
    #[serde(deserialize_with = "nullable")]
    pub ps_completion_status: i32,
    #[serde(deserialize_with = "nullable")]
    pub pending_ps_confirmation: bool,

    // Complete Specification
    pub cs_drafter_assgn: Option<String>,
    pub cs_drafter_deadline: Option<String>,
    pub cs_filer_assgn: Option<String>,
    pub cs_filer_deadline: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub cs_drafting_status: i32,
    #[serde(deserialize_with = "nullable")]
    pub cs_review_draft_status: i32,
    #[serde(deserialize_with = "nullable")]
    pub cs_filing_status: i32,
    #[serde(deserialize_with = "nullable")]
    pub cs_review_file_status: i32,
    #[serde(deserialize_with = "nullable")]
    pub cs_completion_status: i32,
    #[serde(deserialize_with = "nullable")]
    pub pending_cs_confirmation: bool,

    // First Examination Report
    /// `1` when the FER section applies to this patent at all.
    #[serde(deserialize_with = "nullable")]
    pub fer_status: i32,
    pub fer_drafter_assgn: Option<String>,
    pub fer_drafter_deadline: Option<String>,
    pub fer_filer_assgn: Option<String>,
    pub fer_filer_deadline: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub fer_drafter_status: i32,
    #[serde(deserialize_with = "nullable")]
    pub fer_review_draft_status: i32,
    #[serde(deserialize_with = "nullable")]
    pub fer_filing_status: i32,
    #[serde(deserialize_with = "nullable")]
    pub fer_review_file_status: i32,
    #[serde(deserialize_with = "nullable")]
    pub fer_completion_status: i32,

    // Terminal flags
    #[serde(deserialize_with = "nullable")]
    pub completed: bool,
    #[serde(deserialize_with = "nullable")]
    pub withdrawn: bool,

    // Finance
    pub payment_status: Option<PaymentStatus>,
    #[serde(deserialize_with = "nullable")]
    pub payment_amount: f64,
    #[serde(deserialize_with = "nullable")]
    pub payment_received: f64,
    #[serde(deserialize_with = "nullable")]
    pub professional_fees: f64,
    #[serde(deserialize_with = "nullable")]
    pub reimbursement: f64,
    #[serde(deserialize_with = "nullable")]
    pub invoice_sent: bool,
    pub invoice_status: Option<String>,

    #[serde(flatten)]
    pub forms: Forms,

    #[serde(deserialize_with = "nullable")]
    pub inventors: Vec<Inventor>,
    #[serde(deserialize_with = "nullable")]
    pub fer_entries: Vec<FerEntry>,
}

impl Patent {
    pub fn fer_active(&self) -> bool {
        is_done(self.fer_status)
    }

    pub fn is_terminal(&self) -> bool {
        self.completed || self.withdrawn
    }

    pub fn section(&self, section: Section) -> SectionStatus {
        match section {
            Section::Ps => SectionStatus {
                drafting: self.ps_drafting_status,
                review_draft: self.ps_review_draft_status,
                filing: self.ps_filing_status,
                review_file: self.ps_review_file_status,
                completion: self.ps_completion_status,
            },
            Section::Cs => SectionStatus {
                drafting: self.cs_drafting_status,
                review_draft: self.cs_review_draft_status,
                filing: self.cs_filing_status,
                review_file: self.cs_review_file_status,
                completion: self.cs_completion_status,
            },
            Section::Fer => SectionStatus {
                drafting: self.fer_drafter_status,
                review_draft: self.fer_review_draft_status,
                filing: self.fer_filing_status,
                review_file: self.fer_review_file_status,
                completion: self.fer_completion_status,
            },
        }
    }

    /// Whether the section's "pending confirmation" flag is raised. FER has none.
    pub fn pending_confirmation(&self, section: Section) -> bool {
        match section {
            Section::Ps => self.pending_ps_confirmation,
            Section::Cs => self.pending_cs_confirmation,
            Section::Fer => false,
        }
    }

    /// Assignee name for a slot; blank names count as unassigned.
    pub fn assignee(&self, slot: AssignmentSlot) -> Option<&str> {
        let name = match (slot.section, slot.duty) {
            (Section::Ps, Duty::Drafter) => &self.ps_drafter_assgn,
            (Section::Ps, Duty::Filer) => &self.ps_filer_assgn,
            (Section::Cs, Duty::Drafter) => &self.cs_drafter_assgn,
            (Section::Cs, Duty::Filer) => &self.cs_filer_assgn,
            (Section::Fer, Duty::Drafter) => &self.fer_drafter_assgn,
            (Section::Fer, Duty::Filer) => &self.fer_filer_assgn,
        };
        non_blank(name)
    }

    pub fn deadline(&self, slot: AssignmentSlot) -> Option<&str> {
        let date = match (slot.section, slot.duty) {
            (Section::Ps, Duty::Drafter) => &self.ps_drafter_deadline,
            (Section::Ps, Duty::Filer) => &self.ps_filer_deadline,
            (Section::Cs, Duty::Drafter) => &self.cs_drafter_deadline,
            (Section::Cs, Duty::Filer) => &self.cs_filer_deadline,
            (Section::Fer, Duty::Drafter) => &self.fer_drafter_deadline,
            (Section::Fer, Duty::Filer) => &self.fer_filer_deadline,
        };
        non_blank(date)
    }

    /// A slot is open once its filing predecessor is done: CS work waits on
    /// PS filing, FER work waits on an active FER and CS filing.
    pub fn slot_open(&self, slot: AssignmentSlot) -> bool {
        match slot.section {
            Section::Ps => true,
            Section::Cs => is_done(self.ps_filing_status),
            Section::Fer => self.fer_active() && is_done(self.cs_filing_status),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ── Roster ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Drafter,
    Filer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Drafter => "drafter",
            Role::Filer => "filer",
        }
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "drafter" => Ok(Role::Drafter),
            "filer" => Ok(Role::Filer),
            _ => Err(ParseError::UnknownRole(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub full_name: String,
    pub role: Role,
}
