use super::truncate_bytes;
use super::types::{HookAction, QueryContext, QueryHook, QueryResult};
use std::time::Duration;
use tracing::Level;

/// A `tracing`-based hook that emits the OQL handed to the engine.
///
/// Queries are logged **before** execution at the configured level under the
/// `regionql.oql` target. Methods that request `<TRACE>` are always logged at
/// `INFO` or above. Completion is logged at `DEBUG`, failures at `WARN`.
///
/// Enable via the crate feature: `regionql = { features = ["tracing"] }`.
#[derive(Debug, Clone)]
pub struct TracingOqlHook {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long OQL strings (in bytes). `None` means no truncation.
    pub max_oql_length: Option<usize>,
}

impl Default for TracingOqlHook {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_oql_length: Some(200),
        }
    }
}

impl TracingOqlHook {
    /// Create a new hook with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum OQL length to display.
    pub fn max_oql_length(mut self, len: usize) -> Self {
        self.max_oql_length = Some(len);
        self
    }

    /// Disable OQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_oql_length = None;
        self
    }

    pub(crate) fn truncate_oql(&self, oql: &str) -> String {
        match self.max_oql_length {
            Some(max) if oql.len() > max => format!("{}...", truncate_bytes(oql, max)),
            _ => oql.to_string(),
        }
    }

    pub(crate) fn effective_level(&self, ctx: &QueryContext) -> Level {
        // Level orders by verbosity: ERROR < WARN < INFO < DEBUG < TRACE.
        if ctx.trace && self.level > Level::INFO {
            Level::INFO
        } else {
            self.level
        }
    }
}

impl QueryHook for TracingOqlHook {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let oql = self.truncate_oql(&ctx.oql);
        let fields = tracing::field::debug(&ctx.fields);
        emit_at_level!(
            self.effective_level(ctx),
            target: "regionql.oql",
            method = %ctx.method,
            region = %ctx.region,
            param_count = ctx.param_count,
            trace = ctx.trace,
            oql = %oql,
            fields = fields,
        );
        HookAction::Continue
    }

    fn after_query(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        match result {
            QueryResult::Rows(rows) => tracing::debug!(
                target: "regionql.oql",
                method = %ctx.method,
                rows = *rows,
                elapsed_us = duration.as_micros() as u64,
                "query completed"
            ),
            QueryResult::Error(error) => tracing::warn!(
                target: "regionql.oql",
                method = %ctx.method,
                error = %error,
                elapsed_us = duration.as_micros() as u64,
                "query failed"
            ),
        }
    }
}
