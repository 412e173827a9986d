//! Plain-text rendering of a dashboard poll.

use std::fmt;

use crate::core::stay::PathwayStage;
use crate::dashboard::{DashboardView, FeedStatus, PollKind, Trend};
use crate::models::{BedStatus, OccupancyBand, TIMESTAMP_FORMAT};

const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Display adapter for a [`DashboardView`].
pub struct ConsoleView<'a>(pub &'a DashboardView);

pub fn render(view: &DashboardView) -> String {
    ConsoleView(view).to_string()
}

impl fmt::Display for ConsoleView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.view_header(f)?;
        self.view_alerts(f)?;
        self.view_vitals(f)?;
        self.view_forecasts(f)?;
        self.view_location(f)?;
        self.view_beds(f)?;
        self.view_therapy(f)
    }
}

fn status_line(f: &mut fmt::Formatter<'_>, source: &str, status: &FeedStatus) -> fmt::Result {
    match status {
        FeedStatus::Idle => writeln!(f, "  {source}: not polled yet"),
        FeedStatus::Live { path } => writeln!(f, "  {source}: {}", path.display()),
        FeedStatus::Waiting { reason } => writeln!(f, "  {source}: waiting, {reason}"),
        FeedStatus::ReadError { message } => writeln!(f, "  {source}: READ ERROR, showing last good data ({message})"),
    }
}

/// One character per point, scaled between the series' min and max.
pub fn sparkline(values: &[f64]) -> String {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let span = max - min;
    values
        .iter()
        .map(|&v| {
            if span <= f64::EPSILON {
                SPARKS[SPARKS.len() / 2]
            } else {
                let idx = ((v - min) / span * (SPARKS.len() - 1) as f64).round() as usize;
                SPARKS[idx.min(SPARKS.len() - 1)]
            }
        })
        .collect()
}

fn band_label(status: &BedStatus) -> &'static str {
    match status.band() {
        OccupancyBand::Low => "low",
        OccupancyBand::Moderate => "moderate",
        OccupancyBand::High => "high",
    }
}

impl ConsoleView<'_> {
    fn view_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.0;
        let trigger = match view.poll {
            Some(PollKind::FeedRefresh) => "feed refresh",
            Some(PollKind::FullReload) => "full reload",
            None => "operator update",
        };
        writeln!(f, "=== Noah Monitor | {} ({trigger}) ===", view.generated_at.format(TIMESTAMP_FORMAT))?;
        for (label, value) in view.patient.fields() {
            writeln!(f, "{label:>17}: {}", if value.is_empty() { "-" } else { value.as_str() })?;
        }
        status_line(f, "vitals", &view.vitals_status)?;
        status_line(f, "beds", &view.beds_status)
    }

    fn view_alerts(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.alerts {
            Ok(alerts) if alerts.is_empty() => writeln!(f, "\nNo critical conditions."),
            Ok(alerts) => {
                writeln!(f, "\n!!! ALERT at {} !!!", self.0.generated_at.format(TIMESTAMP_FORMAT))?;
                for alert in alerts {
                    writeln!(f, "  {alert}")?;
                }
                Ok(())
            }
            Err(e) => writeln!(f, "\nTrend evaluation pending: {e}"),
        }
    }

    fn view_vitals(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n-- Current vital signs --")?;
        if self.0.current.is_empty() {
            return writeln!(f, "  no readings yet");
        }
        for (current, trend) in self.0.current.iter().zip(&self.0.trends) {
            writeln!(
                f,
                "  {:<24} {:>6.1} {:<5} {} {}",
                current.parameter.label(),
                current.value,
                current.parameter.unit(),
                if current.critical { "CRITICAL" } else { "        " },
                trend_text(trend)
            )?;
        }
        Ok(())
    }

    fn view_forecasts(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n-- Forecast --")?;
        for (parameter, result) in &self.0.forecasts {
            match result {
                Ok(forecast) => match (forecast.points.first(), forecast.points.last()) {
                    (Some(first), Some(last)) => writeln!(
                        f,
                        "  {:<24} {:.1} at {} .. {:.1} at {}",
                        parameter.label(),
                        first.value,
                        first.timestamp.format("%H:%M"),
                        last.value,
                        last.timestamp.format("%H:%M")
                    )?,
                    _ => writeln!(f, "  {:<24} no points requested", parameter.label())?,
                },
                Err(e) => writeln!(f, "  {:<24} unavailable: {e}", parameter.label())?,
            }
        }
        Ok(())
    }

    fn view_location(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = &self.0.location;
        writeln!(f, "\n-- Location --")?;
        match location.current_unit {
            Some(unit) => writeln!(f, "  current: {} ({})", unit.label(), unit)?,
            None => writeln!(f, "  current: not recorded")?,
        }
        let pathway: Vec<String> = location
            .pathway
            .iter()
            .map(|(unit, stage)| match stage {
                PathwayStage::Passed => format!("({unit})"),
                PathwayStage::Current => format!("[{unit}]"),
                PathwayStage::Upcoming => unit.to_string(),
            })
            .collect();
        writeln!(f, "  pathway: {}", pathway.join(" -> "))?;
        for event in &location.timeline {
            writeln!(f, "  {}  {:<5} {}", event.timestamp.format(TIMESTAMP_FORMAT), event.status, event.unit.label())?;
        }
        match &self.0.stay {
            Ok(rows) => {
                for row in rows {
                    writeln!(
                        f,
                        "  stay {:<4} {:>7.2} h  {:<12} {}",
                        row.unit, row.hours, row.formatted, row.attending_doctor
                    )?;
                }
                Ok(())
            }
            Err(e) => writeln!(f, "  stay durations unavailable: {e}"),
        }
    }

    fn view_beds(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n-- Bed availability --")?;
        let Some(board) = &self.0.beds else {
            return writeln!(f, "  no bed data yet");
        };
        writeln!(f, "  as of {}", board.timestamp.format(TIMESTAMP_FORMAT))?;
        for status in &board.units {
            writeln!(
                f,
                "  {:<24} {:>2}/{:<2} used, {:>2} free  {:>5.1}% {}{}",
                status.unit.label(),
                status.beds_in_use,
                status.total_capacity,
                status.beds_available,
                status.occupancy_pct(),
                band_label(status),
                if status.near_capacity() { "  NEAR CAPACITY" } else { "" }
            )?;
        }
        Ok(())
    }

    fn view_therapy(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let therapy = &self.0.therapy;
        writeln!(f, "\n-- Therapy --")?;
        if therapy.is_empty() {
            return writeln!(f, "  no orders");
        }
        for entry in &therapy.entries {
            let order = &entry.order;
            writeln!(
                f,
                "  {} {} {} {} {} by {}{}",
                order.timestamp.format(TIMESTAMP_FORMAT),
                order.medicine,
                order.dosage,
                order.frequency,
                order.route,
                order.prescribing_doctor,
                if entry.active {
                    format!("  active until {}", entry.active_until.format("%H:%M"))
                } else {
                    String::new()
                }
            )?;
        }
        let routes: Vec<String> = therapy.route_counts.iter().map(|(route, n)| format!("{route}: {n}")).collect();
        writeln!(f, "  routes: {}", routes.join(", "))
    }
}

fn trend_text(trend: &Trend) -> String {
    if trend.values.len() < 2 {
        return String::new();
    }
    sparkline(&trend.values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparkline_spans_the_range() {
        assert_eq!(sparkline(&[1.0, 2.0, 3.0]), "▁▅█");
        assert_eq!(sparkline(&[5.0, 5.0]), "▅▅");
        assert_eq!(sparkline(&[]), "");
    }
}
