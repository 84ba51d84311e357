mod fallback;
mod report;

use chrono::{Local, NaiveDateTime};
use cianstat_core::{
    parse_cli_datetime, AppConfig, ConfigError, ReportWindow, SheetsConfig, WindowError,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cianstat")]
#[command(about = "Collect daily Cian listing statistics into the report sheet")]
struct Cli {
    /// Start of the report window (`YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS`, or `DD.MM.YYYY`)
    #[arg(short = 'f', long = "date-from")]
    date_from: String,

    /// End of the report window; defaults to now
    #[arg(short = 't', long = "date-to")]
    date_to: Option<String>,

    /// Run the pipeline and print the row count without writing to the sheet
    #[arg(long)]
    dry_run: bool,
}

/// Everything a run needs, validated before any network activity.
#[derive(Debug)]
struct Startup {
    window: ReportWindow,
    config: AppConfig,
    /// `None` on a dry run.
    sheets: Option<SheetsConfig>,
}

impl Cli {
    /// Resolves the requested window, using `now` when `--date-to` is absent.
    fn window(&self, now: NaiveDateTime) -> Result<ReportWindow, WindowError> {
        let date_from = parse_cli_datetime(&self.date_from)?;
        let date_to = match &self.date_to {
            Some(raw) => parse_cli_datetime(raw)?,
            None => now,
        };
        ReportWindow::new(date_from, date_to)
    }

    /// Checks the window first, then the Cian settings, then the sheet
    /// settings. A dry run never loads the sheet settings.
    fn startup<A, S>(
        &self,
        now: NaiveDateTime,
        load_app: A,
        load_sheets: S,
    ) -> anyhow::Result<Startup>
    where
        A: FnOnce() -> Result<AppConfig, ConfigError>,
        S: FnOnce() -> Result<SheetsConfig, ConfigError>,
    {
        let window = self.window(now).inspect_err(|e| {
            tracing::error!(error = %e, "invalid report window");
        })?;
        let config = load_app().inspect_err(|e| {
            tracing::error!(error = %e, "invalid configuration");
        })?;
        let sheets = if self.dry_run {
            None
        } else {
            Some(load_sheets().inspect_err(|e| {
                tracing::error!(error = %e, "invalid report sheet configuration");
            })?)
        };
        Ok(Startup {
            window,
            config,
            sheets,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(cianstat_core::load_log_level()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let startup = cli.startup(
        Local::now().naive_local(),
        cianstat_core::load_app_config,
        cianstat_core::load_sheets_config,
    )?;
    tracing::info!(window = %startup.window, dry_run = cli.dry_run, "cianstat starting");

    let run = report::run_report(&startup.config, startup.sheets.as_ref(), &startup.window);
    let result = tokio::select! {
        result = run => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted, stopping without writing the report");
            Err(anyhow::anyhow!("interrupted"))
        }
    };

    match &result {
        Ok(()) => tracing::info!("cianstat finished"),
        Err(e) => tracing::error!(error = %format!("{e:#}"), "cianstat failed"),
    }
    result
}
