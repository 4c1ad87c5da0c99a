//! Prometheus metrics collection for slircd-core.
//!
//! All metrics live in one process-wide registry. Recording helpers are
//! no-ops until [`init`] has run, so library users and unit tests never need
//! to set anything up.
//!
//! - `irc_command_total{command}` - Commands processed by type
//! - `irc_command_duration_seconds{command}` - Command latency histogram
//! - `slircd_hook_dispatch_total{event}` - Hook fires per event kind
//! - `slircd_hook_verdict_total{event,verdict}` - Deciding verdicts
//! - `slircd_mode_changes_total{mode}` - Applied mode changes per letter

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters
// ========================================================================

/// Commands processed by type.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command processing latency by command type.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Command errors by type and error kind.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

pub static HOOK_DISPATCH: OnceLock<IntCounterVec> = OnceLock::new();

pub static HOOK_VERDICTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Hook panics caught during dispatch.
pub static HOOK_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

pub static MODE_CHANGES: OnceLock<IntCounterVec> = OnceLock::new();

/// Mode items dropped during validation, by reason.
pub static MODE_REJECTIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Outbound messages dropped because a client's queue was full.
pub static SENDQ_DROPS: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Gauges
// ========================================================================

/// Currently connected users.
pub static CONNECTED_USERS: OnceLock<IntGauge> = OnceLock::new();

/// Active channels.
pub static ACTIVE_CHANNELS: OnceLock<IntGauge> = OnceLock::new();

/// Loaded extension modules.
pub static LOADED_MODULES: OnceLock<IntGauge> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call at server startup. Repeated calls are no-ops.
pub fn init() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(register_all);
}

fn register_all() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::error!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("irc_command_total", "IRC commands processed by type"), &["command"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("irc_command_duration_seconds", "IRC command latency by type")
            .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("irc_command_errors_total", "IRC command errors by type"), &["command", "error"]));
    register!(HOOK_DISPATCH, IntCounterVec::new(Opts::new("slircd_hook_dispatch_total", "Hook fires by event kind"), &["event"]));
    register!(HOOK_VERDICTS, IntCounterVec::new(Opts::new("slircd_hook_verdict_total", "Veto outcomes by event kind"), &["event", "verdict"]));
    register!(HOOK_ERRORS, IntCounterVec::new(Opts::new("slircd_hook_errors_total", "Hook panics caught during dispatch"), &["event"]));
    register!(MODE_CHANGES, IntCounterVec::new(Opts::new("slircd_mode_changes_total", "Applied mode changes"), &["mode"]));
    register!(MODE_REJECTIONS, IntCounterVec::new(Opts::new("slircd_mode_rejections_total", "Mode items dropped during validation"), &["reason"]));
    register!(SENDQ_DROPS, IntCounter::new("irc_sendq_drops_total", "Messages dropped on full client queues"));
    register!(CONNECTED_USERS, IntGauge::new("irc_connected_users", "Currently connected users"));
    register!(ACTIVE_CHANNELS, IntGauge::new("irc_active_channels", "Active channels"));
    register!(LOADED_MODULES, IntGauge::new("slircd_loaded_modules", "Loaded extension modules"));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recording helpers
// ============================================================================

#[inline]
fn inc_vec(metric: &OnceLock<IntCounterVec>, labels: &[&str]) {
    if let Some(c) = metric.get() {
        c.with_label_values(labels).inc();
    }
}

#[inline]
fn set_gauge(metric: &OnceLock<IntGauge>, value: usize) {
    if let Some(g) = metric.get() {
        g.set(value as i64);
    }
}

/// Record a command execution with latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    inc_vec(&COMMAND_COUNTER, &[command]);
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

/// Record a command error.
#[inline]
pub fn record_command_error(command: &str, error: &str) {
    inc_vec(&COMMAND_ERRORS, &[command, error]);
}

#[inline]
pub fn record_hook_dispatch(event: &str) {
    inc_vec(&HOOK_DISPATCH, &[event]);
}

#[inline]
pub fn record_hook_verdict(event: &str, verdict: &str) {
    inc_vec(&HOOK_VERDICTS, &[event, verdict]);
}

#[inline]
pub fn record_hook_error(event: &str) {
    inc_vec(&HOOK_ERRORS, &[event]);
}

#[inline]
pub fn record_mode_change(mode: char) {
    inc_vec(&MODE_CHANGES, &[&mode.to_string()]);
}

#[inline]
pub fn record_mode_rejection(reason: &str) {
    inc_vec(&MODE_REJECTIONS, &[reason]);
}

#[inline]
pub fn record_sendq_drop() {
    if let Some(c) = SENDQ_DROPS.get() {
        c.inc();
    }
}

#[inline]
pub fn set_connected_users(count: usize) {
    set_gauge(&CONNECTED_USERS, count);
}

#[inline]
pub fn set_active_channels(count: usize) {
    set_gauge(&ACTIVE_CHANNELS, count);
}

#[inline]
pub fn set_loaded_modules(count: usize) {
    set_gauge(&LOADED_MODULES, count);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();

        record_command("TEST", 0.001);
        record_hook_verdict("raw_mode", "deny");

        let output = gather_metrics();
        assert!(output.contains("irc_command_total"));
        assert!(output.contains("slircd_hook_verdict_total"));
    }
}
