//! CLI command implementations
//!
//! This module contains the implementation for each CLI command.

use crate::cli::{DataSourceType, TargetArgs};
use crate::data_source::{EventSource, EventStore, FetchOutcome, create_event_source, normalize::parse_instant};
use crate::timeline::{RangeController, RangeLimits, TimeWindow};
use crate::{Config, Error, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Parse a user-supplied instant
pub fn parse_bound(input: &str) -> Result<DateTime<Utc>> {
    parse_instant(input).ok_or_else(|| Error::InvalidInstant(input.to_string()))
}

fn parse_optional_bound(input: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    input.map(parse_bound).transpose()
}

/// Everything a command needs to talk to one machine's events
pub struct Target {
    pub machine: String,
    pub source: Arc<dyn EventSource>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl Target {
    pub fn resolve(args: TargetArgs, config: &Config) -> Result<Self> {
        let source_type = DataSourceType::resolve(args.source, config)?;
        let machine = args
            .machine
            .unwrap_or_else(|| config.default.machine.clone());
        let start = parse_optional_bound(args.start.as_deref())?;
        let end = parse_optional_bound(args.end.as_deref())?;
        let source = create_event_source(source_type, config, args.cache)?;

        tracing::debug!("Machine {} via {}", machine, source.describe());
        Ok(Self {
            machine,
            source,
            start,
            end,
        })
    }

    /// Whether the user asked for an explicit window
    pub fn has_filter(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }
}

/// Validate the requested window, fetch it, and settle the active window.
///
/// Without `--start`/`--end` this is the initial load. A failed fetch is
/// reported on stderr and leaves an empty store, as in the UI.
pub async fn load_events(
    target: &Target,
    config: &Config,
) -> Result<(EventStore, TimeWindow)> {
    let now = Utc::now();
    let mut range = RangeController::new(RangeLimits::from(&config.range));
    let query = if target.has_filter() {
        Some(range.request_filter(target.start, target.end, now)?)
    } else {
        None
    };

    let mut store = EventStore::new();
    if let FetchOutcome::Failed(notice) = store.fetch(target.source.as_ref(), query).await {
        eprintln!("{}", notice.message);
    }

    let window = range.finish_fetch(store.events(), Utc::now());
    Ok((store, window))
}

/// View and watch command implementation
pub mod view {
    use super::*;
    use crate::tui::Session;
    use std::time::Duration;

    /// Execute the view command; `interval` enables watch mode
    pub async fn execute(target: TargetArgs, config: Config, interval: Option<u64>) -> Result<()> {
        let target = Target::resolve(target, &config)?;
        let refresh_interval = interval.filter(|secs| *secs > 0).map(Duration::from_secs);

        tracing::info!(
            "Launching TUI for {}{}",
            target.machine,
            if refresh_interval.is_some() { " in watch mode" } else { "" }
        );

        let filter = target.has_filter().then_some((target.start, target.end));
        let session = Session {
            machine: target.machine,
            source: target.source,
            limits: RangeLimits::from(&config.range),
            chart: config.chart.clone(),
            filter,
            refresh_interval,
        };
        crate::tui::run(session)
    }
}

/// Export command implementation
pub mod export {
    use super::*;
    use crate::cli::ExportFormat;
    use crate::cli::output::{output_csv, output_json, output_table};
    use crate::timeline::events_within;
    use std::io::Write;
    use std::path::PathBuf;

    /// Execute the export command
    pub async fn execute(
        target: TargetArgs,
        config: Config,
        format: ExportFormat,
        output: Option<PathBuf>,
    ) -> Result<()> {
        let target = Target::resolve(target, &config)?;
        tracing::info!("Exporting events for {}", target.machine);

        let (store, window) = load_events(&target, &config).await?;
        let rows = events_within(store.events(), &window);
        tracing::info!("Exporting {} events in {}", rows.len(), window);

        let mut writer: Box<dyn std::io::Write> = match &output {
            Some(path) => Box::new(std::io::BufWriter::new(std::fs::File::create(path)?)),
            None => Box::new(std::io::stdout()),
        };

        match format {
            ExportFormat::Csv => output_csv(&mut writer, rows)?,
            ExportFormat::Json => output_json(&mut writer, &target.machine, &window, store.events())?,
            ExportFormat::Table => {
                output_table(&mut writer, &target.machine, &window, store.events())?
            }
        }
        writer.flush()?;

        if let Some(path) = output {
            eprintln!("Wrote {} events to {}", rows.len(), path.display());
        }
        Ok(())
    }
}

/// State-at command implementation
pub mod state_at {
    use super::*;
    use crate::timeline::{format_instant, state_at};

    /// Execute the state-at command
    pub async fn execute(instant: &str, target: TargetArgs, config: Config) -> Result<()> {
        let instant = parse_bound(instant)?;
        let target = Target::resolve(target, &config)?;

        let (store, _) = load_events(&target, &config).await?;
        let state = state_at(store.events(), instant);

        println!("{}  {}  {}", target.machine, format_instant(instant), state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::MachineState;
    use crate::timeline::state_at;
    use chrono::{Duration, TimeZone};

    fn mock_target(start: Option<&str>, end: Option<&str>) -> Result<Target> {
        Target::resolve(
            TargetArgs {
                source: Some(DataSourceType::Mock),
                start: start.map(String::from),
                end: end.map(String::from),
                ..Default::default()
            },
            &Config::default(),
        )
    }

    #[test]
    fn test_parse_bound() {
        assert_eq!(
            parse_bound("2025-03-01 10:07").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 1, 10, 7, 0).unwrap()
        );
        assert!(matches!(parse_bound("ayer"), Err(Error::InvalidInstant(_))));
    }

    #[test]
    fn test_target_resolution() {
        let target = mock_target(None, None).unwrap();
        assert_eq!(target.machine, "maquina-1");
        assert_eq!(target.source.describe(), "mock");
        assert!(!target.has_filter());

        assert!(mock_target(Some("not a time"), None).is_err());
    }

    #[tokio::test]
    async fn test_load_events_initial() {
        let target = mock_target(None, None).unwrap();
        let (store, window) = load_events(&target, &Config::default()).await.unwrap();

        assert!(!store.is_empty());
        assert_eq!(window.start, store.events()[0].timestamp);
        assert!(window.end <= Utc::now());
    }

    #[tokio::test]
    async fn test_load_events_filtered() {
        let now = Utc::now();
        let start = (now - Duration::hours(6)).to_rfc3339();
        let end = (now - Duration::hours(1)).to_rfc3339();
        let target = mock_target(Some(&start), Some(&end)).unwrap();

        let (store, window) = load_events(&target, &Config::default()).await.unwrap();
        assert!(store.events().iter().all(|e| window.contains(e.timestamp)));

        // State resolution over the fetched events is total
        let state = state_at(store.events(), window.start);
        assert!(matches!(state, MachineState::Running | MachineState::Stopped));
    }

    #[tokio::test]
    async fn test_json_export_matches_chart_at_window_start() {
        // One day of lookback over three days of history leaves earlier events in the store
        let mut config = Config::default();
        config.range.max_lookback_days = 1;
        let target = mock_target(None, None).unwrap();
        let (store, window) = load_events(&target, &config).await.unwrap();
        assert!(store.events()[0].timestamp < window.start);

        let mut output = Vec::new();
        crate::cli::output::output_json(&mut output, &target.machine, &window, store.events())
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();

        let chart = state_at(store.events(), window.start);
        assert_eq!(value["series"][0]["level"], chart.level());
        let exported = value["events"].as_array().unwrap().len();
        assert_eq!(
            exported,
            crate::timeline::events_within(store.events(), &window).len()
        );
        assert!(exported < store.len());
    }

    #[tokio::test]
    async fn test_invalid_range_fails_before_fetch() {
        let now = Utc::now();
        let start = (now - Duration::hours(1)).to_rfc3339();
        let end = (now - Duration::hours(2)).to_rfc3339();
        let target = mock_target(Some(&start), Some(&end)).unwrap();

        let result = load_events(&target, &Config::default()).await;
        assert!(matches!(result, Err(Error::InvalidRange(_))));
    }
}
