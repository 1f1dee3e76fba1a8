//! Terminal rendering: summary tables and the per-patent card.
//!
//! The card is driven by column-name groupings over the serialized row, so
//! a column added to `Patent` shows up as soon as it is listed here.

use std::collections::BTreeMap;

use patentrack_core::{
    ClientStats, DeadlineItem, FinancialSummary, FormField, Invoice, Patent, ProcessingState,
    Stage, StatusCounts, TaxRates, derive_processing_state, derive_stage,
};
use serde_json::{Map, Value};

const MAX_LIST_ITEMS: usize = 10;
const TITLE_WIDTH: usize = 48;

// ── Card section groupings ──

const IDENTITY: &[&str] = &[
    "tracking_id",
    "internal_tracking_id",
    "id",
    "client_id",
    "patent_applicant",
    "application_no",
    "date_of_filing",
    "applicant_addr",
    "inventor_ph_no",
    "inventor_email",
];

const INTAKE: &[&str] = &["idf_sent", "idf_received", "cs_data", "cs_data_received"];

const PROVISIONAL: &[&str] = &[
    "ps_drafter_assgn",
    "ps_drafter_deadline",
    "ps_filer_assgn",
    "ps_filer_deadline",
    "ps_drafting_status",
    "ps_review_draft_status",
    "ps_filing_status",
    "ps_review_file_status",
    "ps_completion_status",
    "pending_ps_confirmation",
];

const COMPLETE: &[&str] = &[
    "cs_drafter_assgn",
    "cs_drafter_deadline",
    "cs_filer_assgn",
    "cs_filer_deadline",
    "cs_drafting_status",
    "cs_review_draft_status",
    "cs_filing_status",
    "cs_review_file_status",
    "cs_completion_status",
    "pending_cs_confirmation",
];

const EXAMINATION: &[&str] = &[
    "fer_status",
    "fer_drafter_assgn",
    "fer_drafter_deadline",
    "fer_filer_assgn",
    "fer_filer_deadline",
    "fer_drafter_status",
    "fer_review_draft_status",
    "fer_filing_status",
    "fer_review_file_status",
    "fer_completion_status",
];

const TERMINAL: &[&str] = &["completed", "withdrawn"];

const FINANCE: &[&str] = &[
    "payment_status",
    "payment_amount",
    "payment_received",
    "professional_fees",
    "reimbursement",
    "invoice_sent",
    "invoice_status",
];

// ── Card ──

/// Print a single patent as a vertical card grouped by pipeline section.
pub fn print_patent_card(patent: &Patent, rates: TaxRates) -> anyhow::Result<()> {
    let row = serde_json::to_value(patent)?;
    let row = row
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("patent row did not serialize to an object"))?;

    println!("=== {} ===", patent.tracking_id);
    if let Some(title) = patent.patent_title.as_deref().filter(|t| !t.is_empty()) {
        println!("{title}");
    }
    println!();

    print_section(row, "Identity", IDENTITY);
    print_section(row, "Intake", INTAKE);
    print_section(row, "Provisional Specification", PROVISIONAL);
    print_section(row, "Complete Specification", COMPLETE);
    print_section(row, "First Examination Report", EXAMINATION);
    print_section(row, "Status", TERMINAL);
    print_section(row, "Finance", FINANCE);
    print_forms(patent);
    print_inventors(patent);
    print_fer_rounds(patent);
    print_derived(patent, rates);

    Ok(())
}

fn print_section(row: &Map<String, Value>, header: &str, cols: &[&str]) {
    let has_data = cols
        .iter()
        .any(|col| row.get(*col).is_some_and(|v| !v.is_null()));
    if !has_data {
        return;
    }

    println!("{header}");
    for &col in cols {
        match row.get(col) {
            None | Some(Value::Null) => continue,
            Some(Value::Bool(b)) => println!("  {:<26} {}", col, if *b { "yes" } else { "no" }),
            Some(Value::String(s)) => println!("  {:<26} {}", col, s),
            Some(other) => println!("  {:<26} {}", col, other),
        }
    }
    println!();
}

fn print_forms(patent: &Patent) {
    let required: Vec<&str> = FormField::ALL
        .iter()
        .filter(|f| patent.forms.is_set(**f))
        .map(|f| f.as_str())
        .collect();
    if required.is_empty() {
        return;
    }
    println!("Forms");
    println!("  {:<26} {}", "required", required.join(", "));
    println!();
}

fn print_inventors(patent: &Patent) {
    let len = patent.inventors.len();
    if len == 0 {
        return;
    }
    println!("Inventors ({len})");
    for inventor in patent.inventors.iter().take(MAX_LIST_ITEMS) {
        print!("    {:<30}", inventor.name);
        if let Some(address) = inventor.address.as_deref().filter(|a| !a.is_empty()) {
            print!("  {}", truncate(address, TITLE_WIDTH));
        }
        println!();
    }
    if len > MAX_LIST_ITEMS {
        println!("    ... and {} more", len - MAX_LIST_ITEMS);
    }
    println!();
}

fn print_fer_rounds(patent: &Patent) {
    let len = patent.fer_entries.len();
    if len == 0 {
        return;
    }
    println!("FER rounds ({len})");
    for entry in patent.fer_entries.iter().take(MAX_LIST_ITEMS) {
        print!("    #{:<3}", entry.fer_number);
        if let Some(drafter) = entry.drafter_assgn.as_deref() {
            print!("  drafter: {:<16}", drafter);
        }
        if let Some(filer) = entry.filer_assgn.as_deref() {
            print!("  filer: {:<16}", filer);
        }
        print!(
            "  drafted: {}  filed: {}  complete: {}",
            flag(entry.drafting_status),
            flag(entry.filing_status),
            flag(entry.completion_status)
        );
        println!();
    }
    if len > MAX_LIST_ITEMS {
        println!("    ... and {} more", len - MAX_LIST_ITEMS);
    }
    println!();
}

fn print_derived(patent: &Patent, rates: TaxRates) {
    let invoice = Invoice::for_patent(patent, rates);
    println!("Derived");
    println!("  {:<26} {}", "stage", derive_stage(patent));
    println!("  {:<26} {}", "processing_state", derive_processing_state(patent));
    println!("  {:<26} {:.2}", "gst", invoice.gst);
    println!("  {:<26} {:.2}", "tds", invoice.tds);
    println!("  {:<26} {:.2}", "gross", invoice.gross);
    println!("  {:<26} {:.2}", "net_receivable", invoice.net_receivable);
    println!();
}

// ── Tables ──

pub fn print_stage_counts(counts: &BTreeMap<Stage, usize>) {
    let total: usize = counts.values().sum();
    println!("{:<24} {:>6} {:>7}", "stage", "count", "share");
    for (stage, count) in counts {
        println!(
            "{:<24} {:>6} {:>6.1}%",
            stage.as_str(),
            count,
            percent(*count, total)
        );
    }
    println!("{:<24} {:>6}", "total", total);
}

pub fn print_processing_states(counts: &BTreeMap<ProcessingState, usize>) {
    let total: usize = counts.values().sum();
    println!("{:<24} {:>6} {:>7}", "state", "count", "share");
    for (state, count) in counts {
        println!(
            "{:<24} {:>6} {:>6.1}%",
            state.label(),
            count,
            percent(*count, total)
        );
    }
    println!("{:<24} {:>6}", "total", total);
}

pub fn print_assignees(counts: &BTreeMap<String, StatusCounts>) {
    if counts.is_empty() {
        println!("no assignments");
        return;
    }
    println!(
        "{:<24} {:>8} {:>8} {:>9} {:>9} {:>9} {:>6}",
        "assignee", "drafting", "review", "completed", "pend_conf", "pend_info", "total"
    );
    for (name, c) in counts {
        println!(
            "{:<24} {:>8} {:>8} {:>9} {:>9} {:>9} {:>6}",
            truncate(name, 24),
            c.drafting,
            c.review,
            c.completed,
            c.pending_confirmation,
            c.pending_information,
            c.total
        );
    }
}

pub fn print_clients(clients: &BTreeMap<String, ClientStats>) {
    if clients.is_empty() {
        println!("no clients");
        return;
    }
    println!(
        "{:<20} {:>6} {:>9} {:>11} {:>9} {:>6} {:>7}",
        "client", "total", "completed", "in_progress", "withdrawn", "staff", "rate"
    );
    for (client, s) in clients {
        println!(
            "{:<20} {:>6} {:>9} {:>11} {:>9} {:>6} {:>6.1}%",
            truncate(client, 20),
            s.total,
            s.completed,
            s.in_progress,
            s.withdrawn,
            s.employee_count,
            s.completion_rate()
        );
    }
}

pub fn print_finance(summary: &FinancialSummary, projected: &Invoice) {
    println!("Collections");
    println!("  {:<26} {}", "patents", summary.patents);
    println!("  {:<26} {:.2}", "billed", summary.billed);
    println!("  {:<26} {:.2}", "received", summary.received);
    println!("  {:<26} {:.2}", "outstanding", summary.outstanding);
    println!("  {:<26} {:.1}%", "collection_rate", summary.collection_rate);
    println!("  {:<26} {}", "invoices_sent", summary.invoices_sent);
    println!();

    println!("Payment status");
    for (status, count) in &summary.by_status {
        println!("  {:<26} {}", status, count);
    }
    println!();

    println!("Projected invoicing");
    println!("  {:<26} {:.2}", "professional_fees", projected.professional_fees);
    println!("  {:<26} {:.2}", "reimbursement", projected.reimbursement);
    println!("  {:<26} {:.2}", "gst", projected.gst);
    println!("  {:<26} {:.2}", "tds", projected.tds);
    println!("  {:<26} {:.2}", "gross", projected.gross);
    println!("  {:<26} {:.2}", "net_receivable", projected.net_receivable);
}

pub fn print_patent_list(patents: &[&Patent], active_filters: usize) {
    println!(
        "{:<16} {:<22} {:<12} {}",
        "tracking_id", "stage", "client", "title"
    );
    for patent in patents {
        println!(
            "{:<16} {:<22} {:<12} {}",
            truncate(&patent.tracking_id, 16),
            derive_stage(patent).as_str(),
            truncate(patent.client_id.as_deref().unwrap_or("-"), 12),
            truncate(patent.patent_title.as_deref().unwrap_or(""), TITLE_WIDTH)
        );
    }
    println!();
    println!("{} patents ({} active filters)", patents.len(), active_filters);
}

pub fn print_deadlines(items: &[DeadlineItem]) {
    if items.is_empty() {
        println!("no deadlines in range");
        return;
    }
    println!(
        "{:<12} {:<16} {:<16} {:<20} {:>6}",
        "due", "tracking_id", "slot", "assignee", "days"
    );
    for item in items {
        let slot = match item.fer_round {
            Some(round) => format!("{} #{}", item.slot, round),
            None => item.slot.to_string(),
        };
        let days = if item.is_overdue() {
            format!("{}!", item.days_left)
        } else {
            item.days_left.to_string()
        };
        println!(
            "{:<12} {:<16} {:<16} {:<20} {:>6}",
            item.due,
            truncate(&item.tracking_id, 16),
            slot,
            truncate(item.assignee.as_deref().unwrap_or("-"), 20),
            days
        );
    }
}

// ── Helpers ──

fn flag(code: i32) -> &'static str {
    if patentrack_core::is_done(code) {
        "yes"
    } else {
        "no"
    }
}

/// Share of `part` in `total`, in percent; 0 for an empty total.
fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

/// Cut to `width` characters, marking the cut with "...".
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let kept: String = s.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}
