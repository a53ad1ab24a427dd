use log::info;
use std::collections::BTreeMap;

use crate::config::GroupByConfig;
use crate::discovery::discover_images;
use crate::error::Result;
use crate::metadata::extract_capture_time;
use crate::output::{copy_all, PlacementPlanner};
use crate::scheduler::run_tasks;
use crate::types::{FileRecord, GroupKey, RunSummary, TimestampSource};

/// Group one image tree by capture timestamp and copy every file into its
/// `<year>[/<month>[/<day>]]` bucket under the destination.
pub fn run_groupby(config: &GroupByConfig) -> Result<RunSummary> {
    config.validate()?;
    let workers = config.resolved_workers();
    let mut summary = RunSummary::default();

    info!("Scanning {}", config.src.display());
    let records = discover_images(&config.src, &mut summary)?;

    let times = run_tasks(
        &records,
        |record: &FileRecord| extract_capture_time(&record.path),
        workers,
        "Reading image metadata",
    );

    let mut buckets: BTreeMap<GroupKey, Vec<FileRecord>> = BTreeMap::new();
    for (record, result) in records.into_iter().zip(times) {
        match result {
            Ok(capture) => {
                if capture.source == TimestampSource::FileModified {
                    summary.timestamp_fallbacks += 1;
                }
                let key = GroupKey::from_date(&capture.timestamp, config.granularity);
                buckets.entry(key).or_default().push(record);
            }
            Err(err) => summary.record_failure(record.path, err),
        }
    }
    info!("Grouping images into {} buckets by {}", buckets.len(), config.granularity);

    // Targets are assigned sequentially so parallel copies never race on a
    // destination name.
    let mut planner = PlacementPlanner::new();
    let mut tasks = Vec::new();
    for (key, bucket) in &buckets {
        let bucket_dir = config.dest.join(key.relative_dir());
        for record in bucket {
            let preferred = bucket_dir.join(record.file_name());
            tasks.push(planner.plan(record, preferred));
        }
    }

    copy_all(&tasks, workers, "Writing output images", &mut summary);
    Ok(summary)
}
