//! The batch runner.
//!
//! Advances every record in a batch through one stage, strictly
//! sequentially, one record at a time. A record's failure is recorded on
//! the record and in the summary; it never halts the loop. Records whose
//! status is not eligible for the stage are skipped, which is what makes
//! re-running a stage against its own output a no-op.

use crate::error::StageError;
use crate::models::{BatchSummary, TrackRecord, TrackStatus};
use crate::progress::create_progress_bar;

/// Run one stage over the whole batch. `advance` performs the stage's work
/// for a single eligible record and transitions it on success; on error the
/// runner transitions the record to `failed` itself.
pub fn run_stage<F>(
    stage: &str,
    records: &mut [TrackRecord],
    eligible: TrackStatus,
    mut advance: F,
) -> BatchSummary
where
    F: FnMut(&mut TrackRecord) -> Result<(), StageError>,
{
    let mut summary = BatchSummary::default();
    let pb = create_progress_bar(records.len() as u64, stage);

    for record in records.iter_mut() {
        if record.status != eligible {
            summary.record_skipped();
            pb.inc(1);
            continue;
        }

        match advance(record) {
            Ok(()) => {
                pb.println(format!("  ✓ {}", record.identity()));
                summary.record_advanced();
            }
            Err(err) => {
                pb.println(format!("  ✗ {} [{}]: {}", record.identity(), err.kind(), err));
                record.mark_failed(&err);
                summary.record_failed(record.identity(), err.to_string());
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message(format!(
        "{}: {} advanced, {} failed, {} skipped",
        stage, summary.advanced, summary.failed, summary.skipped
    ));
    summary
}
