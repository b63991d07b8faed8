use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use priora_core::{
    parse_timezone, AnalyzeOptions, AnnualHoliday, HolidayCalendar, Strategy, Weights,
    DEFAULT_ANNUAL_HOLIDAYS, DEFAULT_MAX_BATCH_SIZE, DEFAULT_SUGGESTION_LIMIT,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{default_config_path, ensure_priora_home};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scoring: ScoringSection,
    pub calendar: CalendarSection,
    pub suggest: SuggestSection,
    pub limits: LimitsSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSection {
    pub strategy: Strategy,
    pub weights: Weights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSection {
    /// IANA zone used to decide what "today" is.
    pub timezone: String,
    /// Recurring holidays as "MM-DD".
    pub annual_holidays: Vec<String>,
    /// One-off holidays as "YYYY-MM-DD".
    pub extra_holidays: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestSection {
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsSection {
    pub max_batch_size: usize,
}

impl Default for CalendarSection {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            annual_holidays: DEFAULT_ANNUAL_HOLIDAYS
                .iter()
                .map(|(m, d)| format!("{m:02}-{d:02}"))
                .collect(),
            extra_holidays: Vec::new(),
        }
    }
}

impl Default for SuggestSection {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

impl Config {
    /// Build the holiday calendar from the `[calendar]` section.
    pub fn holiday_calendar(&self) -> Result<HolidayCalendar> {
        let mut cal = HolidayCalendar::weekends_only();
        for raw in &self.calendar.annual_holidays {
            let Some(h) = AnnualHoliday::parse(raw) else {
                bail!("invalid annual holiday '{raw}' (expected MM-DD)");
            };
            cal = cal.with_annual(h);
        }
        for d in &self.calendar.extra_holidays {
            cal = cal.with_date(*d);
        }
        Ok(cal)
    }

    pub fn timezone(&self) -> Result<chrono_tz::Tz> {
        Ok(parse_timezone(&self.calendar.timezone)?)
    }

    pub fn analyze_options(&self) -> Result<AnalyzeOptions> {
        let weights = self
            .scoring
            .weights
            .check()
            .context("invalid [scoring.weights] in config")?;
        Ok(AnalyzeOptions {
            weights,
            strategy: self.scoring.strategy,
            calendar: self.holiday_calendar()?,
            suggestion_limit: self.suggest.limit,
        })
    }
}

/// Resolve the config path: explicit flag first, then the default location.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => default_config_path(),
    }
}

pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let p = config_path(explicit)?;
    if !p.exists() {
        if explicit.is_some() {
            bail!("config not found: {}", p.display());
        }
        tracing::debug!(path = %p.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
    tracing::debug!(path = %p.display(), "loaded config");
    Ok(cfg)
}

pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(explicit: Option<&Path>) -> Result<PathBuf> {
    let p = match explicit {
        Some(p) => p.to_path_buf(),
        None => ensure_priora_home()?.join("config.toml"),
    };
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(p);
    }
    save_config(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(p)
}
