//! Plain-text rendering of dashboard frames

use std::fmt::Write;

use obd_dash_core::chart::{ChartPanel, ChartSeries};
use obd_dash_core::dashboard::{DashboardView, MetricCard, Screen, ViewState};

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render one screen
pub fn frame(screen: &Screen) -> String {
    match screen {
        Screen::Login => "Not logged in.\n".to_string(),
        Screen::Loading => "Loading telemetry...\n".to_string(),
        Screen::Dashboard(view) => dashboard(view),
    }
}

fn dashboard(view: &DashboardView) -> String {
    let mut out = String::new();

    let state = match view.state {
        ViewState::Refreshing => " (refreshing)",
        _ => "",
    };
    let auto = if view.auto_refresh { "on" } else { "off" };
    let _ = writeln!(
        out,
        "== {} readings{} | auto-refresh {} ==",
        view.record_count, state, auto
    );

    for card in &view.cards {
        out.push_str(&metric_card(card));
    }
    out.push('\n');

    for panel in &view.charts {
        out.push_str(&chart(panel));
    }
    out
}

fn metric_card(card: &MetricCard) -> String {
    let live = match card.live.last_value {
        Some(value) if card.live.is_live => format!("live {:.1}", value),
        _ => "offline".to_string(),
    };

    match &card.stats {
        Some(stats) => format!(
            "{:<14} avg {:>8.1}  min {:>8.1}  max {:>8.1} {:<5} [{}]\n",
            card.title, stats.avg, stats.min, stats.max, card.unit, live
        ),
        None => format!("{:<14} no data [{}]\n", card.title, live),
    }
}

fn chart(panel: &ChartPanel) -> String {
    let ChartPanel::Plot { kind, lines, series } = panel else {
        return format!("{}: no data available\n", panel.kind().title());
    };

    let mut out = format!("{}\n", kind.title());
    for (index, line) in lines.iter().enumerate() {
        if !line.present {
            let _ = writeln!(out, "  {:<26} no data", line.field.label());
            continue;
        }
        let values = line_values(series, index);
        let _ = writeln!(
            out,
            "  {:<26} {}",
            line.field.label(),
            sparkline(&values)
        );
    }
    out
}

/// Values of one line, oldest first
fn line_values(series: &ChartSeries, index: usize) -> Vec<Option<f64>> {
    let mut values: Vec<Option<f64>> = match series {
        ChartSeries::SpeedRpm(points) => points
            .iter()
            .map(|p| if index == 0 { p.speed } else { p.rpm })
            .collect(),
        ChartSeries::Single(points) => points.iter().map(|p| p.value).collect(),
        ChartSeries::Dual(points) => points
            .iter()
            .map(|p| if index == 0 { p.first } else { p.second })
            .collect(),
    };
    values.reverse();
    values
}

fn sparkline(values: &[Option<f64>]) -> String {
    let present = values.iter().flatten();
    let min = present.clone().copied().fold(f64::INFINITY, f64::min);
    let max = present.copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    values
        .iter()
        .map(|v| match v {
            None => ' ',
            Some(_) if span <= 0.0 => SPARK[0],
            Some(v) => {
                let level = ((v - min) / span * (SPARK.len() - 1) as f64).round() as usize;
                SPARK[level.min(SPARK.len() - 1)]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparkline_gaps_and_scale() {
        let line = sparkline(&[Some(0.0), None, Some(7.0), Some(3.5)]);
        assert_eq!(line, "▁ █▅");
    }

    #[test]
    fn test_flat_sparkline() {
        assert_eq!(sparkline(&[Some(2.0), Some(2.0)]), "▁▁");
        assert_eq!(sparkline(&[None, None]), "  ");
    }

    #[test]
    fn test_non_dashboard_screens() {
        assert_eq!(frame(&Screen::Login), "Not logged in.\n");
        assert_eq!(frame(&Screen::Loading), "Loading telemetry...\n");
    }
}
