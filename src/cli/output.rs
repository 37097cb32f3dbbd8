//! Output formatting for CLI commands

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::storage::{DisplayConfig, OutputFormat};

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "message": message
                    })
                );
            }
        }
    }

    /// Prints structured data
    pub fn data<T: Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Text => {
                // Callers normally print their own text; this is the fallback
                if let Ok(json) = serde_json::to_string_pretty(data) {
                    println!("{}", json);
                }
            }
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(data) {
                    println!("{}", json);
                }
            }
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Emits a debug message (shown with --verbose)
    pub fn verbose(&self, message: &str) {
        tracing::debug!("{}", message);
    }

    /// Emits a debug message with context (shown with --verbose)
    pub fn verbose_ctx(&self, context: &str, message: &str) {
        tracing::debug!(context, "{}", message);
    }
}

/// Formats a money amount for text output
///
/// Rounds half away from zero to the configured scale; the value the
/// engine computed is never rounded.
pub fn money(display: &DisplayConfig, amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(display.scale, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{}{:.*}", display.currency, display.scale as usize, rounded.abs())
    } else {
        format!("{}{:.*}", display.currency, display.scale as usize, rounded.abs())
    }
}

/// Formats a quantity without trailing zeros (`0.500` -> `0.5`)
pub fn quantity(amount: Decimal) -> String {
    amount.normalize().to_string()
}
