use chrono::Utc;
use sqlx::PgPool;
use tracing::info;

use super::DomainError;
use crate::db::queries::sweeps;
use crate::db::with_retry;

/// Tables the time-box sweep covers. Each carries the same activation
/// window columns; the banner table belongs to the content module and
/// is only swept here.
pub const EXPIRY_TARGETS: [&str; 3] = ["merch_typehint", "merch_showcase", "content_banner"];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: u64,
    pub cascaded: u64,
}

/// One reconciliation pass: expire lapsed activation windows, then take
/// down showcases orphaned by their hint. Expiry runs first so a hint
/// lapsing this tick costs its showcases in the same pass. Both sweeps
/// re-check their predicate inside the UPDATE, so a rerun is a no-op.
#[tracing::instrument(skip(pool))]
pub async fn run_sweeps(pool: &PgPool) -> Result<SweepReport, DomainError> {
    let now = Utc::now();
    let mut report = SweepReport::default();

    for table in EXPIRY_TARGETS {
        let affected = with_retry(3, || sweeps::expire_rows(pool, table, now)).await?;
        report.expired += affected;
    }

    report.cascaded = with_retry(3, || sweeps::cascade_showcases(pool)).await?;

    info!(
        "Reconciliation sweep complete: expired {} rows, cascaded {} showcases",
        report.expired, report.cascaded
    );
    Ok(report)
}
