//! Command orchestration: authenticate → run the request → audit → print.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};
use portfolio_pulse::market_data::CachedPriceSource;
use portfolio_pulse::service::{ModelComparison, RebalanceReport, ScoreReport, UploadReport};
use portfolio_pulse::{
    Authenticator, NoPriceData, PortfolioStore, PriceSource, PulseService, ReferenceData, UserId,
};

use crate::audit::{self, AuditLog};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::file_store::JsonFileStore;
use crate::input::PortfolioFile;
use crate::prices::CsvPriceSource;

/// Service wired to the on-disk store and whichever price source is configured.
pub type Service = PulseService<JsonFileStore, Box<dyn PriceSource>>;

/// An authenticated user plus the service and audit trail they act through.
pub struct Session {
    user: UserId,
    service: Service,
    audit_path: PathBuf,
}

impl Session {
    /// Authenticate `token` and open the configured store and price source.
    ///
    /// `allow_anonymous_env` is the `ALLOW_ANON` override from the environment.
    pub fn open(config: &Config, token: Option<&str>, allow_anonymous_env: bool) -> Result<Self> {
        let user = config
            .authenticator(allow_anonymous_env)
            .authenticate(token)?;
        debug!("authenticated as {user}");

        let prices: Box<dyn PriceSource> = match &config.data.prices_dir {
            Some(dir) => Box::new(CachedPriceSource::new(CsvPriceSource::new(dir))),
            None => Box::new(NoPriceData),
        };
        let service = PulseService::new(
            Arc::new(ReferenceData::standard()),
            config.settings(),
            JsonFileStore::open(&config.store_path()),
            prices,
        );

        Ok(Self {
            user,
            service,
            audit_path: config.audit_path(),
        })
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn service(&self) -> &Service {
        &self.service
    }

    fn audit(&self) -> Result<AuditLog> {
        AuditLog::open(&self.audit_path)
    }
}

/// Options for an upload.
pub struct UploadOptions {
    /// Overwrite an existing portfolio without asking.
    pub force: bool,
}

/// Load a portfolio file and store it for the session user.
pub fn run_upload(session: &Session, file: &Path, opts: &UploadOptions) -> Result<UploadReport> {
    let portfolio = PortfolioFile::load(file)?;

    if !opts.force && session.service.store().contains(&session.user) {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Replace the stored portfolio for {}?", session.user))
            .default(false)
            .interact()
            .map_err(|e| Error::Aborted(format!("confirmation prompt failed: {e}")))?;
        if !confirmed {
            return Err(Error::Aborted("existing portfolio kept".into()));
        }
    }

    let report = session.service.upload(&session.user, portfolio.holdings())?;
    audit::log_uploaded(&mut session.audit()?, &file.display().to_string(), &report)?;
    display_upload(&report);
    Ok(report)
}

pub fn run_score(session: &Session) -> Result<ScoreReport> {
    let report = session.service.score(&session.user)?;
    audit::log_scored(&mut session.audit()?, &session.user, &report)?;
    display_score(&report);
    Ok(report)
}

pub fn run_compare(session: &Session) -> Result<ModelComparison> {
    let report = session.service.compare_models(&session.user)?;
    audit::log_compared(&mut session.audit()?, &session.user, &report)?;
    display_comparison(&report);
    Ok(report)
}

pub fn run_rebalance(session: &Session) -> Result<RebalanceReport> {
    let report = session.service.rebalance_suggestions(&session.user)?;
    audit::log_rebalance(&mut session.audit()?, &session.user, &report)?;
    info!(
        "{} adjustments toward {}",
        report.adjustments.len(),
        report.target_model_key
    );
    display_rebalance(&report);
    Ok(report)
}

/// Print the reference models. Needs no authentication.
pub fn show_models(reference: &ReferenceData) {
    for (key, model) in reference.models() {
        println!("{} ({key}):", reference.model_name(key));
        for (ticker, weight) in model.iter() {
            println!(
                "  {:8} {:>6.2}%  {}",
                ticker,
                weight * 100.0,
                reference.classify(ticker)
            );
        }
        println!();
    }
}

// === Display ===

fn display_upload(report: &UploadReport) {
    println!(
        "Stored portfolio for {} (value ${:.2}):",
        report.user_id, report.total_value
    );
    for (ticker, weight) in &report.holdings {
        println!("  {:8} {:>6.2}%", ticker, weight * 100.0);
    }
}

fn display_score(report: &ScoreReport) {
    println!("PULSE SCORE: {:.2} {}", report.pulse_score, report.grade);
    let b = &report.breakdown;
    println!("  Diversification   {:>6.2} / 30", b.diversification);
    println!("  Resilience        {:>6.2} / 30", b.resilience);
    println!("  Return efficiency {:>6.2} / 20", b.return_efficiency);
    println!("  Risk balance      {:>6.2} / 20", b.risk_balance);
    println!("  Expected return   {:>6.2}%", report.expected_return * 100.0);

    println!("\nDIVERSIFICATION:");
    for slice in &report.diversification_chart {
        println!("  {:24} {:>6.2}%", slice.label.label(), slice.weight * 100.0);
    }

    println!("\nSUGGESTIONS:");
    for s in &report.top_suggestions {
        println!("  - {s}");
    }
}

fn display_comparison(report: &ModelComparison) {
    println!(
        "YOUR PORTFOLIO: return {:.2}%, volatility {:.2}%\n",
        report.user_expected_return * 100.0,
        report.user_volatility * 100.0
    );
    println!(
        "  {:28} {:>8} {:>10} {:>10}",
        "Model", "Return", "Volatility", "Tracking"
    );
    for m in &report.models {
        println!(
            "  {:28} {:>7.2}% {:>9.2}% {:>10.4}",
            m.model_name,
            m.expected_return * 100.0,
            m.volatility * 100.0,
            m.tracking_error
        );
    }
}

fn display_rebalance(report: &RebalanceReport) {
    println!("TARGET MODEL: {}", report.target_model);
    if report.adjustments.is_empty() {
        println!("\nNo rebalancing needed. Portfolio matches the target.");
        return;
    }

    println!("\nADJUSTMENTS:");
    println!(
        "  {:>3}  {:6} {:8} {:>9} {:>12}",
        "#", "Action", "Ticker", "Weight", "Notional"
    );
    for (i, a) in report.adjustments.iter().enumerate() {
        println!(
            "  {:>3}  {:6} {:8} {:>+8.2}% {:>+12.2}",
            i + 1,
            a.action.to_string(),
            a.ticker,
            a.weight_diff * 100.0,
            a.notional_change
        );
    }
}
