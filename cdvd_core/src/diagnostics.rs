// SPDX-License-Identifier: GPL-3.0
// diagnostics.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

/// This trait provides somewhere for a disc source to write runtime failure lines
/// (failed reads and so on). It is handed to the source rather than being global, so
/// tests can capture what was written. Sinks must be `Send` so a source can be handed
/// to a reader thread.
pub trait DiagnosticSink: Send {

    /// Implementations must record the supplied diagnostic line.
    fn emit(&self, line: &str);
}

/// The default sink, which forwards each line to the `log` facade at error level.
pub struct LogSink;

impl DiagnosticSink for LogSink {

    fn emit(&self, line: &str) {
        log::error!("{line}");
    }
}
