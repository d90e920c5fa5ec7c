// src/rollout/sinks.rs
#![forbid(unsafe_code)]

/// One periodic row emitted by the runner.
///
/// Transport struct: runner/stats compute fields, sinks only format/emit.
#[derive(Clone, Debug)]
pub struct ReportRow {
    pub episode: u64,
    pub episodes_total: u64,
    pub step: u64,

    pub sps: f64,

    pub completions: u64,
    pub deaths: u64,
    pub stalls: u64,

    pub avg_ep_len: f64,
    pub avg_final_x: f64,
    pub best_x: u32,
}

/// Sink interface for periodic reporting.
pub trait RolloutSink {
    fn on_report_row(&mut self, row: &ReportRow, pb: Option<&indicatif::ProgressBar>);
}

/// Default sink: does nothing.
#[derive(Default)]
pub struct NoopSink;

impl RolloutSink for NoopSink {
    fn on_report_row(&mut self, _row: &ReportRow, _pb: Option<&indicatif::ProgressBar>) {}
}

/// Human-readable periodic table sink.
///
/// Cadence (every N steps) is handled by the runner. This sink prints
/// whenever called.
pub struct TableSink {
    header_every: u64,
    rows_printed: u64,
}

impl TableSink {
    const DEFAULT_HEADER_EVERY: u64 = 20;

    /// If `header_every == 0`, a reasonable default is used.
    pub fn new(header_every: u64) -> Self {
        Self {
            header_every: if header_every == 0 {
                Self::DEFAULT_HEADER_EVERY
            } else {
                header_every
            },
            rows_printed: 0,
        }
    }

    fn header_line(&self) -> String {
        // Keep widths aligned with row_line() below.
        format!(
            "{:>11} {:>9} {:>9} {:>6} {:>6} {:>6} {:>9} {:>9} {:>7}",
            "ep/total", "step", "sps", "clear", "die", "stall", "avg_ep", "avg_x", "best_x",
        )
    }

    fn sep_line(&self) -> String {
        "-".repeat(self.header_line().len())
    }

    fn row_line(&self, r: &ReportRow) -> String {
        format!(
            "{:>5}/{:<5} {:>9} {:>9.1} {:>6} {:>6} {:>6} {:>9.1} {:>9.1} {:>7}",
            r.episode,
            r.episodes_total,
            r.step,
            r.sps,
            r.completions,
            r.deaths,
            r.stalls,
            r.avg_ep_len,
            r.avg_final_x,
            r.best_x,
        )
    }
}

impl RolloutSink for TableSink {
    fn on_report_row(&mut self, row: &ReportRow, pb: Option<&indicatif::ProgressBar>) {
        let mut lines: Vec<String> = Vec::new();

        if self.rows_printed == 0 || (self.rows_printed % self.header_every == 0) {
            lines.push(self.header_line());
            lines.push(self.sep_line());
        }

        lines.push(self.row_line(row));
        self.rows_printed += 1;

        if let Some(pb) = pb {
            for l in lines {
                pb.println(l);
            }
        } else {
            for l in lines {
                println!("{l}");
            }
        }
    }
}
