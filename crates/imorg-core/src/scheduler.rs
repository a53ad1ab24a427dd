use crossbeam::channel;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::mpsc;
use std::thread;

use crate::error::{Error, Result};

/// Run `worker_fn` over every item on a bounded pool of worker threads.
///
/// The returned vector preserves the input order: slot `i` holds the result
/// for `items[i]` regardless of which worker finished it, achieved by
/// indexing completions back into a pre-sized slot vector. A failing item
/// yields an `Err` slot and never aborts its siblings, and the call returns
/// only once every unit has a terminal result. `workers == 1` executes
/// strictly sequentially on the calling thread.
pub fn run_tasks<I, T, F>(items: &[I], worker_fn: F, workers: usize, label: &str) -> Vec<Result<T>>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> Result<T> + Sync,
{
    let progress = progress_bar(items.len() as u64, label);

    if workers <= 1 {
        let results = items
            .iter()
            .map(|item| {
                let result = worker_fn(item);
                progress.inc(1);
                result
            })
            .collect();
        progress.finish();
        return results;
    }

    let mut slots: Vec<Option<Result<T>>> = Vec::with_capacity(items.len());
    slots.resize_with(items.len(), || None);

    // The whole batch is queued up front; the channel closes once the sender
    // drops, so workers drain it and exit.
    let (work_tx, work_rx) = channel::unbounded();
    for unit in items.iter().enumerate() {
        let _ = work_tx.send(unit);
    }
    drop(work_tx);

    let (done_tx, done_rx) = mpsc::channel::<(usize, Result<T>)>();

    thread::scope(|scope| {
        for _ in 0..workers {
            let work_rx = work_rx.clone();
            let done_tx = done_tx.clone();
            let worker_fn = &worker_fn;
            scope.spawn(move || {
                while let Ok((index, item)) = work_rx.recv() {
                    let _ = done_tx.send((index, worker_fn(item)));
                }
            });
        }
        drop(done_tx);

        for (index, result) in done_rx.iter() {
            slots[index] = Some(result);
            progress.inc(1);
        }
    });
    progress.finish();

    slots
        .into_iter()
        .map(|slot| {
            slot.unwrap_or_else(|| {
                Err(Error::Unknown(
                    "worker exited without reporting a result".to_string(),
                ))
            })
        })
        .collect()
}

fn progress_bar(len: u64, label: &str) -> ProgressBar {
    let progress = ProgressBar::new(len);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{eta}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
            .unwrap()
            .progress_chars("##-"),
    );
    progress.set_message(label.to_string());
    progress
}

// -- Tests --
