// ==============================================================================
// config.rs - Command Line & Environment Configuration
// ==============================================================================
// Description: CLI arguments, database settings and pipeline tuning
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Usage: mplot-generator <host> <user> <password> <module_id>
// Every positional may instead come from MPLOT_DB_HOST, MPLOT_DB_USER,
// MPLOT_DB_PASSWORD and MPLOT_MODULE_ID (a .env file is honoured).
// ==============================================================================

use clap::Parser;
use std::fmt;

use crate::models::{CHROMOSOME_GAP, DEFAULT_SIGNIFICANCE_THRESHOLD};
use crate::render::PngRenderer;

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate Manhattan plots for every test in a module database", long_about = None)]
pub struct Args {
    /// MySQL server host
    #[arg(env = "MPLOT_DB_HOST")]
    pub host: String,

    /// MySQL user
    #[arg(env = "MPLOT_DB_USER")]
    pub user: String,

    /// MySQL password
    #[arg(env = "MPLOT_DB_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Module number (database Module_<id>)
    #[arg(env = "MPLOT_MODULE_ID")]
    pub module_id: i32,

    /// MySQL server port
    #[arg(long, env = "MPLOT_DB_PORT", default_value_t = 3306)]
    pub port: u16,

    /// -log10(p-value) cut-off for significant SNPs and the reference line
    #[arg(long, default_value_t = DEFAULT_SIGNIFICANCE_THRESHOLD)]
    pub threshold: f64,

    /// Plot width in pixels
    #[arg(long, default_value_t = 1200, value_parser = clap::value_parser!(u32).range(200..=10_000))]
    pub width: u32,

    /// Plot height in pixels
    #[arg(long, default_value_t = 800, value_parser = clap::value_parser!(u32).range(200..=10_000))]
    pub height: u32,

    /// Only process these test numbers (repeatable)
    #[arg(long = "test", value_name = "TEST_NUMBER")]
    pub tests: Vec<i32>,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl Args {
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
            module_id: self.module_id,
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            gap: CHROMOSOME_GAP,
            threshold: self.threshold,
        }
    }

    pub fn renderer(&self) -> PngRenderer {
        PngRenderer::new(self.width, self.height, self.threshold)
    }
}

/// Connection settings for one module database
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub module_id: i32,
}

impl DatabaseConfig {
    pub fn database_name(&self) -> String {
        format!("Module_{}", self.module_id)
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("module_id", &self.module_id)
            .finish()
    }
}

/// Tuning for the coordinate and significance stages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    /// X-axis slot width per chromosome
    pub gap: i64,
    pub threshold: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            gap: CHROMOSOME_GAP,
            threshold: DEFAULT_SIGNIFICANCE_THRESHOLD,
        }
    }
}
