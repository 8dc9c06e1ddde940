//! # Concurrency Tests
//!
//! Checks that the report aggregator stays consistent when many test cases
//! finish at the same time: every call is counted exactly once and every
//! outcome block is written whole.

mod common;

use api_harness::reporting::aggregator::ReportAggregator;
use common::{case, count_blocks, SharedBuffer};
use std::sync::{Arc, Barrier};
use std::thread;

/// Fifty threads record at once; the counters and the report must agree.
#[test]
fn test_concurrent_recording_is_counted_exactly_once() {
    const THREADS: usize = 50;

    let buffer = SharedBuffer::new();
    let aggregator = Arc::new(ReportAggregator::new(buffer.sink()));
    aggregator.start("concurrent").unwrap();

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let aggregator = Arc::clone(&aggregator);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let case = case(&format!("parallel[{}]", i + 1), i as u64);
                let recorded = match i % 3 {
                    0 => aggregator.record_success(case),
                    1 => aggregator.record_failure(case, None),
                    _ => aggregator.record_skip(case),
                };
                recorded.unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let run = aggregator.finish().unwrap();
    assert_eq!(run.summary.total(), THREADS);
    assert_eq!(run.summary.passed, 17);
    assert_eq!(run.summary.failed, 17);
    assert_eq!(run.summary.skipped, 16);

    let report = buffer.contents();
    assert_eq!(count_blocks(&report), THREADS);

    // A whole block is `Test:`, `Class:`, `Status:`, `Duration:` in sequence.
    let lines: Vec<&str> = report.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        if line.starts_with("Test: ") {
            assert!(lines[i + 1].starts_with("Class: "));
            assert!(lines[i + 2].starts_with("Status: "));
            assert!(lines[i + 3].starts_with("Duration: "));
        }
    }
    for i in 1..=THREADS {
        assert_eq!(
            report.matches(&format!("Test: parallel[{i}]\n")).count(),
            1,
            "case {i} must appear exactly once"
        );
    }
}

#[cfg(test)]
mod loom_tests {
    use loom::sync::{Arc, Mutex};
    use loom::thread;

    /// Models the aggregator's critical section: the outcome is counted and
    /// its block written under one lock. Whatever the interleaving, the
    /// count equals the number of blocks and no block is split.
    #[test]
    fn test_count_and_write_is_atomic() {
        // loom explores deeply nested schedules; give it a larger stack.
        const STACK_SIZE: usize = 8 * 1024 * 1024; // 8 MB

        let builder = std::thread::Builder::new()
            .name("loom-test-thread".into())
            .stack_size(STACK_SIZE);

        let handle = builder
            .spawn(|| {
                loom::model(|| {
                    const NUM_TASKS: usize = 2;
                    // (outcome count, report text)
                    let state = Arc::new(Mutex::new((0usize, String::new())));

                    let handles: Vec<_> = (0..NUM_TASKS)
                        .map(|i| {
                            let state = state.clone();
                            thread::spawn(move || {
                                let block = format!("Test: case[{i}]\nStatus: PASSED\n");
                                let mut guard = state.lock().unwrap();
                                guard.0 += 1;
                                guard.1.push_str(&block);
                            })
                        })
                        .collect();

                    for handle in handles {
                        handle.join().unwrap();
                    }

                    let guard = state.lock().unwrap();
                    assert_eq!(guard.0, NUM_TASKS);
                    assert_eq!(guard.1.matches("Test: ").count(), NUM_TASKS);
                    let lines: Vec<&str> = guard.1.lines().collect();
                    for pair in lines.chunks(2) {
                        assert!(pair[0].starts_with("Test: "));
                        assert_eq!(pair[1], "Status: PASSED");
                    }
                });
            })
            .unwrap();

        handle.join().unwrap();
    }
}
