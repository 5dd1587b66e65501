use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct TelemetryState {
    queries_total: u64,
    reports_total: u64,
    refusals_total: u64,
    deaths_total: u64,
    partitions_detected_total: u64,
    witness_count: u64,
}

/// Operational counters for the daemon, rendered at `/metrics` in the
/// Prometheus text format.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    state: Arc<Mutex<TelemetryState>>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_query(&self, refused: bool) {
        let mut guard = self.state.lock();
        guard.queries_total = guard.queries_total.saturating_add(1);
        if refused {
            guard.refusals_total = guard.refusals_total.saturating_add(1);
        }
    }

    pub fn record_report(&self) {
        let mut guard = self.state.lock();
        guard.reports_total = guard.reports_total.saturating_add(1);
    }

    pub fn record_death(&self) {
        let mut guard = self.state.lock();
        guard.deaths_total = guard.deaths_total.saturating_add(1);
    }

    pub fn record_partition(&self) {
        let mut guard = self.state.lock();
        guard.partitions_detected_total = guard.partitions_detected_total.saturating_add(1);
    }

    pub fn set_witness_count(&self, count: u64) {
        let mut guard = self.state.lock();
        guard.witness_count = count;
    }

    /// Render all metrics as Prometheus exposition text.
    pub fn render_prometheus(&self) -> String {
        let guard = self.state.lock();
        let mut out = String::new();

        write_counter(
            &mut out,
            "styx_queries_total",
            "Total queries processed",
            guard.queries_total,
        );
        write_counter(
            &mut out,
            "styx_reports_total",
            "Total witness reports received",
            guard.reports_total,
        );
        write_counter(
            &mut out,
            "styx_refusals_total",
            "Total query refusals",
            guard.refusals_total,
        );
        write_counter(
            &mut out,
            "styx_deaths_total",
            "Total death declarations",
            guard.deaths_total,
        );
        write_counter(
            &mut out,
            "styx_partitions_detected_total",
            "Total partitions detected",
            guard.partitions_detected_total,
        );
        write_gauge(
            &mut out,
            "styx_witnesses",
            "Current witness count",
            guard.witness_count,
        );
        write_gauge(&mut out, "styx_up", "STYX server is up", 1);

        out
    }
}

fn write_counter(out: &mut String, name: &str, help: &str, value: u64) {
    write_metric(out, name, "counter", help, value);
}

fn write_gauge(out: &mut String, name: &str, help: &str, value: u64) {
    write_metric(out, name, "gauge", help, value);
}

fn write_metric(out: &mut String, name: &str, mtype: &str, help: &str, value: u64) {
    out.push_str(&format!(
        "# HELP {name} {help}\n# TYPE {name} {mtype}\n{name} {value}\n"
    ));
}
