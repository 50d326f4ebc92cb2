use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use listing_desk::backend::{
    EngagementSource, ListingStore, MediaStorage, MemoryBackend, SessionProvider,
};
use listing_desk::dashboard::{DashboardService, SellerDashboard};
use listing_desk::drafts::{spawn_autosave, MediaSlot, Upload};
use listing_desk::finance::{
    format_currency, format_percent, DerivedFinancials, FlipCalculator, FlipInputs,
    RentalCalculator, RentalInputs,
};
use listing_desk::sheet::render_listing_sheet;
use listing_desk::wizard::{validate_step, FormSession, StepStore, WizardStep};
use listing_desk::{Config, DraftService, ListingDraft, ListingId, Notice, SaveError};

#[derive(Parser, Debug)]
#[command(name = "listing-desk", version, about = "Seller back office for investment property listings")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Use the built-in demo backend instead of the hosted one
    #[arg(long, global = true)]
    offline: bool,

    #[arg(long, env = "LISTING_DESK_BACKEND_URL", global = true)]
    backend_url: Option<String>,

    #[arg(long, env = "LISTING_DESK_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Seller session token
    #[arg(long, env = "LISTING_DESK_ACCESS_TOKEN", hide_env_values = true, global = true)]
    access_token: Option<String>,

    #[arg(long, env = "LISTING_DESK_LISTINGS_TABLE", default_value = "listings", global = true)]
    listings_table: String,

    #[arg(long, env = "LISTING_DESK_EVENTS_TABLE", default_value = "listing_events", global = true)]
    events_table: String,

    #[arg(long, env = "LISTING_DESK_MEDIA_BUCKET", default_value = "listing-media", global = true)]
    media_bucket: String,

    /// File remembering the last wizard step of each draft
    #[arg(long, env = "LISTING_DESK_STEP_STORE", default_value = ".listing-desk/steps.json", global = true)]
    step_store: PathBuf,

    /// Seconds between auto-saves of a draft being edited
    #[arg(long, env = "LISTING_DESK_AUTOSAVE_SECS", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..), global = true)]
    autosave_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the derived figures of a draft file
    Calc { draft: PathBuf },

    /// Validate every wizard step of a draft file and report what blocks publishing
    Check {
        draft: PathBuf,
        /// Check with "save as draft" turned on
        #[arg(long = "draft")]
        as_draft: bool,
    },

    /// Fix-and-flip calculator
    Flip {
        #[arg(long)]
        purchase_price: f64,
        #[arg(long, default_value_t = 0.0)]
        repair_costs: f64,
        #[arg(long)]
        arv: f64,
        #[arg(long, default_value_t = 0.0)]
        holding_months: f64,
        #[arg(long, default_value_t = 0.0)]
        monthly_holding_cost: f64,
        #[arg(long, default_value_t = 6.0)]
        closing_cost_percent: f64,
        #[arg(long, default_value_t = 0.0)]
        assignment_fee: f64,
    },

    /// Buy-and-hold rental calculator
    Rental {
        #[arg(long)]
        purchase_price: f64,
        #[arg(long, default_value_t = 20.0)]
        down_payment_percent: f64,
        #[arg(long, default_value_t = 7.0)]
        interest_rate: f64,
        #[arg(long, default_value_t = 30)]
        loan_term_years: u32,
        #[arg(long)]
        monthly_rent: f64,
        #[arg(long, default_value_t = 0.0)]
        monthly_expenses: f64,
        #[arg(long, default_value_t = 5.0)]
        vacancy_percent: f64,
    },

    /// Save a draft file to the marketplace, uploading any attached files
    Save {
        draft: PathBuf,
        #[arg(long)]
        primary: Option<PathBuf>,
        /// Gallery image, appended after the existing ones (repeatable)
        #[arg(long)]
        gallery: Vec<PathBuf>,
        #[arg(long)]
        video: Option<PathBuf>,
        #[arg(long)]
        agreement: Option<PathBuf>,
        /// Publish instead of saving as a draft
        #[arg(long)]
        publish: bool,
    },

    /// Keep saving a draft file as a draft while it is edited, until Ctrl-C
    Autosave { draft: PathBuf },

    /// Buyer engagement across the signed-in seller's listings
    Dashboard {
        #[arg(long, default_value_t = 14, value_parser = clap::value_parser!(u32).range(1..=3650))]
        days: u32,
        /// Print the dashboard as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render the marketing page of a listing
    Sheet {
        id: ListingId,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            backend_url: self.backend_url.clone(),
            api_key: self.api_key.clone(),
            access_token: self.access_token.clone(),
            listings_table: self.listings_table.clone(),
            events_table: self.events_table.clone(),
            media_bucket: self.media_bucket.clone(),
            step_store_path: self.step_store.clone(),
            autosave_interval: Duration::from_secs(self.autosave_secs),
            ..Config::default()
        }
    }
}

/// Backend ports the commands run against
struct Backends {
    listings: Arc<dyn ListingStore>,
    media: Arc<dyn MediaStorage>,
    sessions: Arc<dyn SessionProvider>,
    events: Arc<dyn EngagementSource>,
}

impl Backends {
    fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: ListingStore + MediaStorage + SessionProvider + EngagementSource + 'static,
    {
        Self {
            listings: backend.clone(),
            media: backend.clone(),
            sessions: backend.clone(),
            events: backend,
        }
    }

    fn connect(cli: &Cli) -> Result<Self> {
        if cli.offline {
            info!("📦 Using offline demo backend, changes are not kept");
            return Ok(Self::from_backend(Arc::new(MemoryBackend::with_mock_data(Utc::now()))));
        }

        let backend = cli
            .config()
            .rest_backend()
            .context("Set --backend-url and --api-key, or pass --offline")?;
        info!("🌐 Using {}", backend.backend_name());
        Ok(Self::from_backend(Arc::new(backend)))
    }

    fn draft_service(&self) -> DraftService {
        DraftService::new(self.listings.clone(), self.media.clone(), self.sessions.clone())
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "listing_desk=info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Command::Calc { draft } => calc(draft).await,
        Command::Check { draft, as_draft } => check(&cli, draft, *as_draft).await,
        Command::Flip {
            purchase_price,
            repair_costs,
            arv,
            holding_months,
            monthly_holding_cost,
            closing_cost_percent,
            assignment_fee,
        } => {
            let calculator = FlipCalculator::new(FlipInputs {
                purchase_price: *purchase_price,
                repair_costs: *repair_costs,
                arv: *arv,
                holding_months: *holding_months,
                monthly_holding_cost: *monthly_holding_cost,
                closing_cost_percent: *closing_cost_percent,
                assignment_fee: *assignment_fee,
            });
            println!("{}", serde_json::to_string_pretty(calculator.result())?);
            Ok(())
        }
        Command::Rental {
            purchase_price,
            down_payment_percent,
            interest_rate,
            loan_term_years,
            monthly_rent,
            monthly_expenses,
            vacancy_percent,
        } => {
            let calculator = RentalCalculator::new(RentalInputs {
                purchase_price: *purchase_price,
                down_payment_percent: *down_payment_percent,
                down_payment: 0.0,
                interest_rate: *interest_rate,
                loan_term_years: *loan_term_years,
                monthly_rent: *monthly_rent,
                monthly_expenses: *monthly_expenses,
                vacancy_percent: *vacancy_percent,
            });
            println!("{}", serde_json::to_string_pretty(calculator.result())?);
            Ok(())
        }
        Command::Save {
            draft,
            primary,
            gallery,
            video,
            agreement,
            publish,
        } => {
            let backends = Backends::connect(&cli)?;
            let files = AttachedFiles {
                primary: primary.as_deref(),
                gallery,
                video: video.as_deref(),
                agreement: agreement.as_deref(),
            };
            save(&backends, draft, files, *publish).await
        }
        Command::Autosave { draft } => {
            let backends = Backends::connect(&cli)?;
            autosave(&backends, draft, cli.config().autosave_interval).await
        }
        Command::Dashboard { days, json } => {
            let backends = Backends::connect(&cli)?;
            dashboard(&backends, *days, *json).await
        }
        Command::Sheet { id, output } => {
            let backends = Backends::connect(&cli)?;
            sheet(&backends, *id, output.as_deref()).await
        }
    }
}

async fn read_draft(path: &Path) -> Result<ListingDraft> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut draft: ListingDraft = serde_json::from_str(&json)
        .with_context(|| format!("{} is not a listing draft", path.display()))?;
    draft.recompute_derived();
    Ok(draft)
}

async fn write_draft(path: &Path, draft: &ListingDraft) -> Result<()> {
    let json = serde_json::to_string_pretty(draft)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("💾 Saved draft to {}", path.display());
    Ok(())
}

fn print_notices(notices: &[Notice]) {
    for notice in notices {
        println!("{}", notice);
    }
}

async fn calc(path: &Path) -> Result<()> {
    let draft = read_draft(path).await?;
    let derived = DerivedFinancials::compute(&draft);

    println!("{}", draft.address);
    println!(
        "   Assignment fee: {}",
        derived.assignment_fee.map(format_currency).unwrap_or_default()
    );
    println!(
        "   Expenses: {} / month, {} / year",
        format_currency(derived.monthly_expenses),
        format_currency(derived.annual_expenses)
    );
    println!("   Repairs: {}", format_currency(derived.repair_total));
    println!("   Gross rent: {} / year", format_currency(derived.gross_annual_rent));
    println!("   NOI: {}", format_currency(derived.net_operating_income));
    println!(
        "   Cap rate: {}",
        derived.cap_rate.map(format_percent).unwrap_or_else(|| "n/a".to_string())
    );
    Ok(())
}

async fn check(cli: &Cli, path: &Path, as_draft: bool) -> Result<()> {
    let mut draft = read_draft(path).await?;
    draft.is_draft = as_draft;
    let today = Utc::now().date_naive();

    let store = StepStore::new(cli.config().step_store_path);
    let (session, notices) = FormSession::new(draft).with_step_store(store, today);
    print_notices(&notices);
    println!("Last viewed step: {}", session.step());

    for step in WizardStep::ALL {
        let errors = validate_step(session.draft(), step, today);
        if errors.is_empty() {
            println!("✅ {}", step);
        } else {
            println!("❌ {}", step);
            for error in errors {
                println!("   {}", error);
            }
        }
    }

    let completeness = session.completeness(today);
    if completeness.is_complete() {
        println!("Ready to publish");
    } else {
        println!("Will be saved as a draft until these are added:");
        for missing in completeness.missing() {
            println!("   - {}", missing);
        }
    }
    Ok(())
}

struct AttachedFiles<'a> {
    primary: Option<&'a Path>,
    gallery: &'a [PathBuf],
    video: Option<&'a Path>,
    agreement: Option<&'a Path>,
}

impl AttachedFiles<'_> {
    async fn read(&self, existing_gallery: usize) -> Result<Vec<Upload>> {
        let mut uploads = Vec::new();
        if let Some(path) = self.primary {
            uploads.push(Upload::from_file(MediaSlot::PrimaryImage, path).await?);
        }
        for (i, path) in self.gallery.iter().enumerate() {
            uploads.push(Upload::from_file(MediaSlot::Gallery(existing_gallery + i), path).await?);
        }
        if let Some(path) = self.video {
            uploads.push(Upload::from_file(MediaSlot::Video, path).await?);
        }
        if let Some(path) = self.agreement {
            uploads.push(Upload::from_file(MediaSlot::PurchaseAgreement, path).await?);
        }
        Ok(uploads)
    }
}

async fn save(backends: &Backends, path: &Path, files: AttachedFiles<'_>, publish: bool) -> Result<()> {
    let mut draft = read_draft(path).await?;
    let uploads = files.read(draft.gallery.len()).await?;
    let service = backends.draft_service();

    info!("🏠 Saving {}", path.display());
    let result = if publish {
        service.publish(&mut draft, uploads).await
    } else {
        service.save(&mut draft, uploads).await
    };

    // The draft carries its id and uploaded media even when the save failed
    if draft.id.is_some() {
        write_draft(path, &draft).await?;
    }

    match result {
        Ok(outcome) => {
            print_notices(&outcome.notices);
            println!("Listing {} is {:?}", outcome.id, outcome.status);
            Ok(())
        }
        Err(SaveError::Incomplete { missing }) => {
            warn!("Listing kept as a draft");
            bail!("Not published, still missing: {}", missing.join(", "))
        }
        Err(e) => Err(e).context("Save failed, run the command again to retry"),
    }
}

async fn autosave(backends: &Backends, path: &Path, interval: Duration) -> Result<()> {
    let draft = read_draft(path).await?;
    if !draft.is_draft {
        bail!("{} has draft mode off, use save --publish instead", path.display());
    }

    let session = Arc::new(Mutex::new(FormSession::new(draft)));
    let handle = spawn_autosave(Arc::new(backends.draft_service()), session.clone(), interval);
    info!("⏱️ Auto-saving {} every {}s, press Ctrl-C to stop", path.display(), interval.as_secs());

    let mut reload = tokio::time::interval(interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl-C")?;
                break;
            }
            _ = reload.tick() => match read_draft(path).await {
                Ok(mut edited) => {
                    let mut session = session.lock().await;
                    let current = session.draft_mut();
                    // The file may predate the first save, identity comes from the session
                    edited.id = current.id.or(edited.id);
                    edited.seller_id = current.seller_id.clone().or(edited.seller_id);
                    edited.created_at = current.created_at.or(edited.created_at);
                    edited.updated_at = current.updated_at;
                    edited.published = current.published;
                    *current = edited;
                }
                Err(e) => warn!("Keeping the last good copy of the draft: {:#}", e),
            },
        }
    }

    handle.stop();
    let draft = session.lock().await.draft().clone();
    if draft.id.is_some() {
        write_draft(path, &draft).await?;
    }
    Ok(())
}

async fn dashboard(backends: &Backends, days: u32, json: bool) -> Result<()> {
    let session = backends
        .sessions
        .current_seller()
        .await?
        .context("No seller is signed in, set --access-token")?;
    let service = DashboardService::new(backends.listings.clone(), backends.events.clone());
    let dashboard = service.for_seller(&session.seller_id, days).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
    } else {
        print_dashboard(&dashboard);
    }
    Ok(())
}

fn print_dashboard(dashboard: &SellerDashboard) {
    let totals = &dashboard.totals;
    println!(
        "{} listings ({} published, {} drafts)",
        totals.listings, totals.published, totals.drafts
    );
    println!(
        "{} views, {} saves, {} shares, {} inquiries, {} offers",
        totals.views, totals.saves, totals.shares, totals.inquiries, totals.offers
    );
    println!();

    for (i, listing) in dashboard.top(5).iter().enumerate() {
        println!("{}. {} ({:?})", i + 1, listing.address, listing.status);
        println!(
            "   {} views from {} buyers, {} inquiries, {} offers",
            listing.views, listing.unique_buyers, listing.inquiries, listing.offers
        );
        if let Some(conversion) = listing.offer_conversion {
            println!("   Offer conversion: {}", format_percent(conversion));
        }
    }
    println!();

    for day in &dashboard.daily_views {
        println!("{}  {:>4}  {}", day.date, day.views, "#".repeat(day.views as usize));
    }
}

async fn sheet(backends: &Backends, id: ListingId, output: Option<&Path>) -> Result<()> {
    let listing = backends
        .listings
        .fetch(id)
        .await?
        .with_context(|| format!("Listing {} not found", id))?;
    if listing.deleted {
        bail!("Listing {} has been deleted", id);
    }

    let html = render_listing_sheet(&listing);
    match output {
        Some(path) => {
            tokio::fs::write(path, html)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("💾 Wrote marketing page to {}", path.display());
        }
        None => print!("{}", html),
    }
    Ok(())
}
