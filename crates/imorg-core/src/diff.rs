use log::info;
use std::collections::{HashMap, VecDeque};

use crate::config::DiffConfig;
use crate::discovery::discover_images;
use crate::error::Result;
use crate::hashing::compute_digest;
use crate::output::{copy_all, PlacementPlanner};
use crate::scheduler::run_tasks;
use crate::types::{ComparisonOutcome, FileDigest, FileRecord, RunSummary};

/// Destination subdirectory for content present in both sources
pub const MATCHED_DIR: &str = "matched";
/// Destination subdirectory for content present only in the first source
pub const ONLY_IN_A_DIR: &str = "only-in-a";
/// Destination subdirectory for content present only in the second source
pub const ONLY_IN_B_DIR: &str = "only-in-b";

/// Compare two image trees by content hash and copy every file into the
/// destination under `matched/`, `only-in-a/` or `only-in-b/`.
pub fn run_diff(config: &DiffConfig) -> Result<RunSummary> {
    config.validate()?;
    let workers = config.resolved_workers();
    let mut summary = RunSummary::default();

    info!("Scanning {}", config.src1.display());
    let side_a = discover_images(&config.src1, &mut summary)?;
    info!("Scanning {}", config.src2.display());
    let side_b = discover_images(&config.src2, &mut summary)?;

    let hashed_a = hash_side(side_a, config, workers, "Hashing images from src1", &mut summary);
    let hashed_b = hash_side(side_b, config, workers, "Hashing images from src2", &mut summary);

    let outcomes = compare(hashed_a, hashed_b);
    info!(
        "Partitioned {} files across {}, {} and {}",
        outcomes.len(),
        MATCHED_DIR,
        ONLY_IN_A_DIR,
        ONLY_IN_B_DIR
    );

    // Targets are assigned sequentially so parallel copies never race on a
    // destination name.
    let mut planner = PlacementPlanner::new();
    let mut tasks = Vec::with_capacity(outcomes.len());
    for outcome in &outcomes {
        let (record, category) = match outcome {
            ComparisonOutcome::Matched { first, .. } => (first, MATCHED_DIR),
            ComparisonOutcome::OnlyInFirst(record) => (record, ONLY_IN_A_DIR),
            ComparisonOutcome::OnlyInSecond(record) => (record, ONLY_IN_B_DIR),
        };
        let preferred = config.dest.join(category).join(&record.relative_path);
        tasks.push(planner.plan(record, preferred));
    }

    copy_all(&tasks, workers, "Writing output images", &mut summary);
    Ok(summary)
}

/// Partition two hashed file sets into per-file comparison outcomes.
///
/// Files with equal digests are paired in enumeration order; files beyond
/// the shorter side's count for a digest, and digests present on one side
/// only, become `OnlyIn*` outcomes. Every input file lands in exactly one
/// outcome. A matched pair keeps the first side's file as the canonical
/// copy for placement.
pub fn compare(
    side_a: Vec<(FileRecord, FileDigest)>,
    side_b: Vec<(FileRecord, FileDigest)>,
) -> Vec<ComparisonOutcome> {
    let mut unpaired_b: HashMap<&[u8], VecDeque<usize>> = HashMap::new();
    for (index, (_, digest)) in side_b.iter().enumerate() {
        unpaired_b
            .entry(digest.bytes.as_slice())
            .or_default()
            .push_back(index);
    }

    let mut paired_b = vec![false; side_b.len()];
    let mut outcomes = Vec::with_capacity(side_a.len() + side_b.len());

    for (record, digest) in side_a {
        let partner = unpaired_b
            .get_mut(digest.bytes.as_slice())
            .and_then(|queue| queue.pop_front());
        match partner {
            Some(index) => {
                paired_b[index] = true;
                outcomes.push(ComparisonOutcome::Matched {
                    first: record,
                    second: side_b[index].0.clone(),
                });
            }
            None => outcomes.push(ComparisonOutcome::OnlyInFirst(record)),
        }
    }

    for (index, (record, _)) in side_b.iter().enumerate() {
        if !paired_b[index] {
            outcomes.push(ComparisonOutcome::OnlyInSecond(record.clone()));
        }
    }

    outcomes
}

fn hash_side(
    records: Vec<FileRecord>,
    config: &DiffConfig,
    workers: usize,
    label: &str,
    summary: &mut RunSummary,
) -> Vec<(FileRecord, FileDigest)> {
    let results = run_tasks(
        &records,
        |record: &FileRecord| compute_digest(&record.path, config.algorithm),
        workers,
        label,
    );

    let mut hashed = Vec::with_capacity(records.len());
    for (record, result) in records.into_iter().zip(results) {
        match result {
            Ok(digest) => hashed.push((record, digest)),
            Err(err) => summary.record_failure(record.path, err),
        }
    }
    hashed
}

// -- Tests --
