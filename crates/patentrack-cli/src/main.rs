mod display;
mod source;

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use patentrack_core::{
    Employee, FilterState, FormField, Invoice, Patent, Role, Stage, TaxRates,
    aggregate_by_assignee, aggregate_by_client, aggregate_by_processing_state, aggregate_by_stage,
    apply_filters, count_active_filters, financial_summary, normalize_tracking_id, parse_date,
    upcoming_deadlines,
};
use patentrack_store::{FieldMap, SnapshotStore};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::source::Source;

#[derive(Parser, Debug)]
#[command(name = "patentrack")]
#[command(about = "Patent prosecution tracker", long_about = None)]
#[command(version)]
struct Cli {
    /// Snapshot directory holding patents.json and employees.json
    #[arg(long, global = true, env = "PATENTRACK_DATA", default_value = "data")]
    data: PathBuf,

    /// Hosted database URL; when set, reads and writes go there instead of the snapshot
    #[arg(long, global = true, env = "PATENTRACK_API_URL")]
    api_url: Option<String>,

    /// API key sent with every request to the hosted database
    #[arg(long, global = true, env = "PATENTRACK_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Count patents per stage
    Stages,
    /// Count patents per processing state
    States,
    /// Workload per assignee
    Assignees {
        /// Perspective: drafter, filer or admin
        #[arg(long, default_value = "drafter")]
        role: Role,
    },
    /// Portfolio progress per client
    Clients,
    /// Billing and collection summary
    Finance {
        /// GST percent applied to professional fees
        #[arg(long, default_value_t = TaxRates::default().gst_percent)]
        gst: f64,
        /// TDS percent withheld on professional fees
        #[arg(long, default_value_t = TaxRates::default().tds_percent)]
        tds: f64,
    },
    /// List patents matching the given filters
    List(ListArgs),
    /// Show one patent in full
    Show {
        /// Tracking id, e.g. PAT-014
        tracking_id: String,
    },
    /// Pending work due soon, overdue items included
    Deadlines {
        /// Look-ahead window in days
        #[arg(long, default_value = "14")]
        days: i64,
    },
    /// Download the hosted tables into the snapshot directory
    Pull,
    /// Update columns on one patent (column=value, values parsed as JSON)
    Set {
        /// Patent row id
        id: String,
        /// Assignments such as ps_drafting_status=1 or ps_drafter_assgn=Meera
        #[arg(required = true)]
        assignments: Vec<String>,
    },
}

#[derive(Args, Debug, Default)]
struct ListArgs {
    /// Filter selection as a JSON file shaped like the dashboard's filter state
    #[arg(long)]
    filter: Option<PathBuf>,

    /// Free-text search over title, ids, client, applicant and assignees
    #[arg(long)]
    search: Option<String>,

    /// Earliest filing date (YYYY-MM-DD), inclusive
    #[arg(long, value_parser = parse_date)]
    from: Option<NaiveDate>,

    /// Latest filing date (YYYY-MM-DD), inclusive
    #[arg(long, value_parser = parse_date)]
    to: Option<NaiveDate>,

    /// Require these forms, e.g. --form form_01,form_18a
    #[arg(long, value_delimiter = ',')]
    form: Vec<FormField>,

    /// Keep only these stages, e.g. --stage ps-filing
    #[arg(long, value_delimiter = ',')]
    stage: Vec<Stage>,

    /// Patent status leaves
    #[arg(long, value_enum, value_delimiter = ',')]
    status: Vec<StatusLeaf>,

    /// Payment status leaves
    #[arg(long, value_enum, value_delimiter = ',')]
    payment: Vec<PaymentLeaf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusLeaf {
    Completed,
    InProgress,
    NotStarted,
    Withdrawn,
    IdfSent,
    IdfReceived,
    IdfSentNotReceived,
    CsDataSent,
    CsDataReceived,
    CsDataSentNotReceived,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PaymentLeaf {
    NotSent,
    Sent,
    Partial,
    Received,
}

impl ListArgs {
    /// Start from the `--filter` file, if any, then layer the flags on top.
    fn filter_state(&self) -> anyhow::Result<FilterState> {
        let mut state = match &self.filter {
            Some(path) => read_filter(path)?,
            None => FilterState::default(),
        };

        if let Some(query) = &self.search {
            state.search_query = query.clone();
        }
        if self.from.is_some() {
            state.date_range.start = self.from;
        }
        if self.to.is_some() {
            state.date_range.end = self.to;
        }
        state.form_status.extend(self.form.iter().copied());
        state.stage.extend(self.stage.iter().copied());

        let status = &mut state.patent_status;
        for leaf in &self.status {
            match leaf {
                StatusLeaf::Completed => status.completed = true,
                StatusLeaf::InProgress => status.in_progress = true,
                StatusLeaf::NotStarted => status.not_started = true,
                StatusLeaf::Withdrawn => status.withdrawn = true,
                StatusLeaf::IdfSent => status.idf_sent = true,
                StatusLeaf::IdfReceived => status.idf_received = true,
                StatusLeaf::IdfSentNotReceived => status.idf_sent_not_received = true,
                StatusLeaf::CsDataSent => status.cs_data_sent = true,
                StatusLeaf::CsDataReceived => status.cs_data_received = true,
                StatusLeaf::CsDataSentNotReceived => status.cs_data_sent_not_received = true,
            }
        }

        let payment = &mut state.payment_status;
        for leaf in &self.payment {
            match leaf {
                PaymentLeaf::NotSent => payment.not_sent = true,
                PaymentLeaf::Sent => payment.sent = true,
                PaymentLeaf::Partial => payment.partial = true,
                PaymentLeaf::Received => payment.received = true,
            }
        }

        Ok(state)
    }
}

fn read_filter(path: &Path) -> anyhow::Result<FilterState> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading filter file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing filter file {}", path.display()))
}

/// Parse `column=value` pairs. Values that are not valid JSON are taken as strings.
fn parse_assignments(assignments: &[String]) -> anyhow::Result<FieldMap> {
    let mut fields = FieldMap::new();
    for assignment in assignments {
        let (column, raw) = assignment
            .split_once('=')
            .with_context(|| format!("expected column=value, got {assignment:?}"))?;
        let column = column.trim();
        if column.is_empty() {
            anyhow::bail!("empty column name in {assignment:?}");
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        fields.insert(column.to_string(), value);
    }
    Ok(fields)
}

fn find_patent<'a>(patents: &'a [Patent], tracking_id: &str) -> Option<&'a Patent> {
    let wanted = normalize_tracking_id(tracking_id);
    patents
        .iter()
        .find(|p| normalize_tracking_id(&p.tracking_id) == wanted)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("patentrack v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Pull => pull(&cli).await?,
        Commands::Set { id, assignments } => {
            let fields = parse_assignments(assignments)?;
            let count = fields.len();
            cli.source()?
                .update(id, fields)
                .await
                .with_context(|| format!("updating patent {id}"))?;
            println!("updated {count} column(s) on {id}");
        }
        Commands::Stages => {
            let (patents, _) = cli.load().await?;
            display::print_stage_counts(&aggregate_by_stage(&patents));
        }
        Commands::States => {
            let (patents, _) = cli.load().await?;
            display::print_processing_states(&aggregate_by_processing_state(&patents));
        }
        Commands::Assignees { role } => {
            let (patents, employees) = cli.load().await?;
            display::print_assignees(&aggregate_by_assignee(&patents, &employees, *role));
        }
        Commands::Clients => {
            let (patents, _) = cli.load().await?;
            display::print_clients(&aggregate_by_client(&patents));
        }
        Commands::Finance { gst, tds } => {
            let (patents, _) = cli.load().await?;
            let rates = TaxRates {
                gst_percent: *gst,
                tds_percent: *tds,
            };
            let fees: f64 = patents.iter().map(|p| p.professional_fees).sum();
            let reimbursement: f64 = patents.iter().map(|p| p.reimbursement).sum();
            let projected = Invoice::compute(fees, reimbursement, rates);
            display::print_finance(&financial_summary(&patents), &projected);
        }
        Commands::List(args) => {
            let state = args.filter_state()?;
            let (patents, _) = cli.load().await?;
            let mut matched = apply_filters(&patents, &state);
            matched.sort_by_cached_key(|p| normalize_tracking_id(&p.tracking_id));
            display::print_patent_list(&matched, count_active_filters(&state));
        }
        Commands::Show { tracking_id } => {
            let (patents, _) = cli.load().await?;
            let patent = find_patent(&patents, tracking_id)
                .with_context(|| format!("no patent with tracking id {tracking_id}"))?;
            display::print_patent_card(patent, TaxRates::default())?;
        }
        Commands::Deadlines { days } => {
            let (patents, _) = cli.load().await?;
            let today = chrono::Local::now().date_naive();
            display::print_deadlines(&upcoming_deadlines(&patents, today, *days));
        }
    }

    Ok(())
}

impl Cli {
    fn source(&self) -> anyhow::Result<Source> {
        Source::select(&self.data, self.api_url.as_deref(), self.api_key.as_deref())
    }

    async fn load(&self) -> anyhow::Result<(Vec<Patent>, Vec<Employee>)> {
        self.source()?.load().await
    }
}

async fn pull(cli: &Cli) -> anyhow::Result<()> {
    let url = cli
        .api_url
        .as_deref()
        .context("pull needs --api-url or PATENTRACK_API_URL")?;
    let client = source::remote(url, cli.api_key.as_deref());
    let (patents, employees) = source::fetch_all(&client).await?;

    let store = SnapshotStore::create(&cli.data)
        .await
        .with_context(|| format!("creating snapshot directory {}", cli.data.display()))?;
    store.write_snapshot(&patents, &employees).await?;
    println!(
        "pulled {} patents and {} employees into {}",
        patents.len(),
        employees.len(),
        store.dir().display()
    );
    Ok(())
}
