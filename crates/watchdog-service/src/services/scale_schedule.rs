//! Scheduled scale-down windows.
//!
//! Some clusters are scaled to zero on a timetable (nights, weekends) and stop
//! sending heartbeats while down. Those clusters are listed together with a
//! scale-down and a scale-up cron expression; a listed cluster is considered
//! down when the most recent scale-down firing is later than the most recent
//! scale-up firing.

use chrono::{DateTime, Utc};
use cron::Schedule;
use std::collections::BTreeSet;
use std::str::FromStr;

/// Scale-down window shared by a set of clusters.
#[derive(Debug, Clone)]
pub struct ScaleDownSchedule {
    clusters: BTreeSet<String>,
    scale_down: Schedule,
    scale_up: Schedule,
}

impl ScaleDownSchedule {
    /// Build a schedule from cluster names and two cron expressions.
    ///
    /// Accepts classic 5-field crontab expressions (minute precision, day of
    /// week 0-7 with Sunday as 0 or 7) as well as the 6/7-field form of the
    /// `cron` crate (leading seconds column, day of week 1-7 with Sunday as 1).
    ///
    /// Expressions are evaluated in UTC, not in the host's local time zone.
    ///
    /// # Errors
    ///
    /// Returns a description of the first expression that fails to parse.
    pub fn new<I>(clusters: I, scale_down_expr: &str, scale_up_expr: &str) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let scale_down = parse_cron("SCALE_DOWN_CRON", scale_down_expr)?;
        let scale_up = parse_cron("SCALE_UP_CRON", scale_up_expr)?;

        Ok(Self {
            clusters: clusters.into_iter().collect(),
            scale_down,
            scale_up,
        })
    }

    /// Whether the cluster participates in the scale-down window at all.
    pub fn covers(&self, cluster_id: &str) -> bool {
        self.clusters.contains(cluster_id)
    }

    /// Whether the cluster is expected to be scaled down at `now`.
    ///
    /// Unlisted clusters are never scaled down. A schedule that has no firing
    /// before `now` counts as "never happened".
    pub fn is_scaled_down(&self, cluster_id: &str, now: DateTime<Utc>) -> bool {
        if !self.covers(cluster_id) {
            return false;
        }

        let last_down = previous_firing(&self.scale_down, now);
        let last_up = previous_firing(&self.scale_up, now);

        match (last_down, last_up) {
            (Some(down), Some(up)) => down > up,
            (Some(_), None) => true,
            _ => false,
        }
    }
}

fn previous_firing(schedule: &Schedule, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(&now).next_back()
}

fn parse_cron(name: &str, expr: &str) -> Result<Schedule, String> {
    let trimmed = expr.trim();
    let fields: Vec<&str> = trimmed.split_whitespace().collect();

    // The cron crate wants a seconds column and numbers weekdays from
    // Sunday = 1; classic crontab lines have no seconds and use Sunday = 0.
    let normalized = match fields.as_slice() {
        [minute, hour, day_of_month, month, day_of_week] => {
            let day_of_week = crontab_day_of_week(day_of_week)
                .map_err(|e| format!("{} is not a valid cron expression '{}': {}", name, expr, e))?;
            format!(
                "0 {} {} {} {} {}",
                minute, hour, day_of_month, month, day_of_week
            )
        }
        _ => trimmed.to_string(),
    };

    Schedule::from_str(&normalized)
        .map_err(|e| format!("{} is not a valid cron expression '{}': {}", name, expr, e))
}

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Rewrite a crontab day-of-week field as an explicit list of weekday names.
///
/// Supports `*`, numbers 0-7, names, ranges, lists and `/step`.
fn crontab_day_of_week(field: &str) -> Result<String, String> {
    if field == "*" {
        return Ok(field.to_string());
    }

    let mut days = [false; 7];
    for item in field.split(',') {
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => {
                let step: usize = step
                    .parse()
                    .map_err(|_| format!("invalid day-of-week step '{}'", step))?;
                if step == 0 {
                    return Err("day-of-week step must be greater than 0".to_string());
                }
                (range, step)
            }
            None => (item, 1),
        };

        let (start, end) = match range.split_once('-') {
            _ if range == "*" => (0, 6),
            Some((start, end)) => (crontab_weekday(start)?, crontab_weekday(end)?),
            // "5/2" means from Friday to the end of the week.
            None if step > 1 => (crontab_weekday(range)?, 6),
            None => {
                let day = crontab_weekday(range)?;
                (day, day)
            }
        };
        if start > end {
            return Err(format!("invalid day-of-week range '{}'", range));
        }

        for day in (start..=end).step_by(step) {
            // 7 is Sunday again.
            if let Some(slot) = days.get_mut(day % 7) {
                *slot = true;
            }
        }
    }

    let names: Vec<&str> = WEEKDAY_NAMES
        .iter()
        .zip(days.iter())
        .filter(|(_, selected)| **selected)
        .map(|(name, _)| *name)
        .collect();

    if names.is_empty() {
        return Err(format!("empty day-of-week field '{}'", field));
    }
    Ok(names.join(","))
}

/// Parse one crontab weekday: 0-7 (0 and 7 are Sunday) or a three-letter name.
fn crontab_weekday(value: &str) -> Result<usize, String> {
    if let Ok(day) = value.parse::<usize>() {
        return if day <= 7 {
            Ok(day)
        } else {
            Err(format!("day of week {} is out of range 0-7", day))
        };
    }

    WEEKDAY_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(value))
        .ok_or_else(|| format!("unknown day of week '{}'", value))
}
