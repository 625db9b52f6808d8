// ==============================================================================
// error.rs - Plot Generation Errors
// ==============================================================================
// Description: Error taxonomy for connection, query, render and storage steps
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use thiserror::Error;

/// Errors that can occur while generating plots for a module
#[derive(Error, Debug)]
pub enum PlotError {
    /// Module database unreachable or credentials rejected (fatal)
    #[error("Could not connect to module database {database}: {source}")]
    Connection {
        database: String,
        source: sqlx::Error,
    },

    #[error("Database query failed while {context}: {source}")]
    DataAccess {
        context: String,
        source: sqlx::Error,
    },

    /// Test has no SNP rows (soft, nothing to do)
    #[error("No data found for test {test_number}")]
    EmptyInput { test_number: i32 },

    #[error("Failed to render plot for test {test_number}: {message}")]
    Render { test_number: i32, message: String },

    #[error("Failed to {operation} for test {test_number}: {source}")]
    Storage {
        test_number: i32,
        operation: &'static str,
        source: sqlx::Error,
    },
}

impl PlotError {
    /// Pipeline step the error was raised from, for log context
    pub fn step(&self) -> &'static str {
        match self {
            PlotError::Connection { .. } => "connect",
            PlotError::DataAccess { .. } | PlotError::EmptyInput { .. } => "fetch",
            PlotError::Render { .. } => "render",
            PlotError::Storage { operation, .. } => *operation,
        }
    }

    pub fn is_soft(&self) -> bool {
        matches!(self, PlotError::EmptyInput { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_steps() {
        let empty = PlotError::EmptyInput { test_number: 3 };
        assert_eq!(empty.step(), "fetch");
        assert!(empty.is_soft());

        let render = PlotError::Render {
            test_number: 3,
            message: "no coordinates".to_string(),
        };
        assert_eq!(render.step(), "render");
        assert!(!render.is_soft());

        let storage = PlotError::Storage {
            test_number: 9,
            operation: "store metadata",
            source: sqlx::Error::Protocol("lost connection".to_string()),
        };
        assert_eq!(storage.step(), "store metadata");
        assert!(storage.to_string().contains("Failed to store metadata for test 9"));
    }
}
