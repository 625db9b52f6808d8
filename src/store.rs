// ==============================================================================
// store.rs - Module Database Access
// ==============================================================================
// Description: SNP queries and plot persistence against a Module_<id> database
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Tables read:    pval, v_ind, ind, col
// Tables written: mplot_png (one PNG per test_number, upsert)
//                 mplot     (significant SNPs, replaced per test_number)
// ==============================================================================

use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::PlotError;
use crate::models::{SignificantSnp, SnpRecord};

/// Rows per INSERT statement when writing significant SNPs
pub const INSERT_CHUNK_SIZE: usize = 1000;

const TEST_DATA_QUERY: &str = r#"
    SELECT
        p.pval,
        v.ind,
        v.col AS test_number,
        i.chr,
        i.nrow,
        c.test AS test_name
    FROM pval p
    JOIN v_ind v ON p.v_ind = v.v_ind
    JOIN ind i ON v.ind = i.ind
    JOIN col c ON v.col = c.col
    WHERE v.col = ?
    ORDER BY i.chr, i.nrow
"#;

/// Read and write access to one module's plot data
///
/// Storage failures come back as `PlotError::Storage`; the pipeline folds them
/// into a per-test outcome instead of aborting the batch.
#[allow(async_fn_in_trait)]
pub trait PlotStore {
    /// Distinct test numbers, ascending
    async fn test_numbers(&mut self) -> Result<Vec<i32>, PlotError>;

    /// SNP rows for one test, ordered by chromosome then row index
    async fn fetch_snps(&mut self, test_number: i32) -> Result<Vec<SnpRecord>, PlotError>;

    /// Insert or replace the test's PNG
    async fn store_image(&mut self, test_number: i32, png: &[u8]) -> Result<(), PlotError>;

    /// Replace all significant-SNP rows for the test
    async fn store_metadata(&mut self, test_number: i32, rows: &[SignificantSnp]) -> Result<(), PlotError>;

    /// Stored PNG for the test, if one has been written
    async fn fetch_image(&mut self, test_number: i32) -> Result<Option<Vec<u8>>, PlotError>;

    /// Stored significant-SNP rows for the test, ordered by x
    async fn fetch_metadata(&mut self, test_number: i32) -> Result<Vec<SignificantSnp>, PlotError>;

    async fn plot_exists(&mut self, test_number: i32) -> Result<bool, PlotError>;
}

#[derive(Debug, FromRow)]
struct SnpRow {
    pval: f64,
    ind: i32,
    test_number: i32,
    chr: i32,
    nrow: i32,
    test_name: Option<String>,
}

impl From<SnpRow> for SnpRecord {
    fn from(row: SnpRow) -> Self {
        Self {
            variant_id: row.ind,
            test_number: row.test_number,
            chromosome: row.chr,
            row_index: row.nrow,
            p_value: row.pval,
            test_name: row.test_name,
        }
    }
}

#[derive(Debug, FromRow)]
struct MplotRow {
    ind: i32,
    test_number: i32,
    chr: i32,
    nrow: i32,
    coord_x: i64,
    coord_y: f64,
}

impl From<MplotRow> for SignificantSnp {
    fn from(row: MplotRow) -> Self {
        Self {
            variant_id: row.ind,
            test_number: row.test_number,
            chromosome: row.chr,
            row_index: row.nrow,
            x: row.coord_x,
            y: row.coord_y,
        }
    }
}

/// MySQL-backed store holding a single-connection pool for the batch run
pub struct MySqlPlotStore {
    pool: MySqlPool,
    database: String,
}

impl MySqlPlotStore {
    /// Connect to `Module_<id>` on the configured server
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, PlotError> {
        let database = config.database_name();

        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&database)
            .charset("utf8mb4");

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|source| PlotError::Connection {
                database: database.clone(),
                source,
            })?;

        info!("Connected to {} successfully", database);

        Ok(Self { pool, database })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Release the connection; safe to call after any batch outcome
    pub async fn close(self) {
        self.pool.close().await;
        info!("Database connection closed");
    }
}

impl PlotStore for MySqlPlotStore {
    async fn test_numbers(&mut self) -> Result<Vec<i32>, PlotError> {
        let rows: Vec<(i32,)> = sqlx::query_as("SELECT DISTINCT col FROM col ORDER BY col")
            .fetch_all(&self.pool)
            .await
            .map_err(|source| PlotError::DataAccess {
                context: "retrieving test numbers".to_string(),
                source,
            })?;

        Ok(rows.into_iter().map(|(col,)| col).collect())
    }

    async fn fetch_snps(&mut self, test_number: i32) -> Result<Vec<SnpRecord>, PlotError> {
        let rows: Vec<SnpRow> = sqlx::query_as(TEST_DATA_QUERY)
            .bind(test_number)
            .fetch_all(&self.pool)
            .await
            .map_err(|source| PlotError::DataAccess {
                context: format!("retrieving SNP data for test {}", test_number),
                source,
            })?;

        Ok(rows.into_iter().map(SnpRecord::from).collect())
    }

    async fn store_image(&mut self, test_number: i32, png: &[u8]) -> Result<(), PlotError> {
        sqlx::query(
            "INSERT INTO mplot_png (test_number, png) VALUES (?, ?)
             ON DUPLICATE KEY UPDATE png = VALUES(png)",
        )
        .bind(test_number)
        .bind(png)
        .execute(&self.pool)
        .await
        .map_err(|source| PlotError::Storage {
            test_number,
            operation: "store PNG data",
            source,
        })?;

        Ok(())
    }

    async fn store_metadata(&mut self, test_number: i32, rows: &[SignificantSnp]) -> Result<(), PlotError> {
        let storage_err = |source: sqlx::Error| PlotError::Storage {
            test_number,
            operation: "store metadata",
            source,
        };

        // Dropping `tx` without commit rolls back, keeping the previous rows
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        sqlx::query("DELETE FROM mplot WHERE test_number = ?")
            .bind(test_number)
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;

        for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
            let mut builder: QueryBuilder<MySql> =
                QueryBuilder::new("INSERT INTO mplot (ind, test_number, chr, nrow, coordX, coordY) ");

            builder.push_values(chunk, |mut row, snp| {
                row.push_bind(snp.variant_id)
                    .push_bind(snp.test_number)
                    .push_bind(snp.chromosome)
                    .push_bind(snp.row_index)
                    .push_bind(snp.x)
                    .push_bind(snp.y);
            });

            builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(storage_err)?;
        }

        tx.commit().await.map_err(storage_err)?;

        Ok(())
    }

    async fn fetch_image(&mut self, test_number: i32) -> Result<Option<Vec<u8>>, PlotError> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT png FROM mplot_png WHERE test_number = ?")
            .bind(test_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(|source| PlotError::DataAccess {
                context: format!("retrieving PNG data for test {}", test_number),
                source,
            })?;

        Ok(row.map(|(png,)| png))
    }

    async fn fetch_metadata(&mut self, test_number: i32) -> Result<Vec<SignificantSnp>, PlotError> {
        let rows: Vec<MplotRow> = sqlx::query_as(
            "SELECT ind, test_number, chr, nrow,
                    CAST(coordX AS SIGNED) AS coord_x,
                    CAST(coordY AS DOUBLE) AS coord_y
             FROM mplot
             WHERE test_number = ?
             ORDER BY coordX",
        )
        .bind(test_number)
        .fetch_all(&self.pool)
        .await
        .map_err(|source| PlotError::DataAccess {
            context: format!("retrieving metadata for test {}", test_number),
            source,
        })?;

        Ok(rows.into_iter().map(SignificantSnp::from).collect())
    }

    async fn plot_exists(&mut self, test_number: i32) -> Result<bool, PlotError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM mplot_png WHERE test_number = ?")
            .bind(test_number)
            .fetch_one(&self.pool)
            .await
            .map_err(|source| PlotError::DataAccess {
                context: format!("checking plot for test {}", test_number),
                source,
            })?;

        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mplot_row_conversion() {
        let row = MplotRow {
            ind: 2,
            test_number: 7,
            chr: 1,
            nrow: 20,
            coord_x: 20,
            coord_y: 4.0,
        };

        let snp = SignificantSnp::from(row);

        assert_eq!(snp.variant_id, 2);
        assert_eq!(snp.chromosome, 1);
        assert_eq!(snp.row_index, 20);
        assert_eq!(snp.x, 20);
        assert_eq!(snp.y, 4.0);
    }

    #[test]
    fn test_snp_row_conversion() {
        let row = SnpRow {
            pval: 0.0001,
            ind: 42,
            test_number: 7,
            chr: 2,
            nrow: 5,
            test_name: Some("BMI".to_string()),
        };

        let record = SnpRecord::from(row);

        assert_eq!(record.variant_id, 42);
        assert_eq!(record.test_number, 7);
        assert_eq!(record.chromosome, 2);
        assert_eq!(record.row_index, 5);
        assert_eq!(record.p_value, 0.0001);
        assert_eq!(record.test_name.as_deref(), Some("BMI"));
    }

    #[test]
    fn test_insert_chunk_stays_under_placeholder_limit() {
        // MySQL caps a prepared statement at 65535 placeholders, 6 per row
        assert!(INSERT_CHUNK_SIZE * 6 < u16::MAX as usize);
    }
}
