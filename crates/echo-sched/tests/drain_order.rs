// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Heartbeat drain ordering: eligibility, tick order, admission-order ties.

use echo_dry_tests::{ExecutionLog, RecordingTask};
use echo_sched::Scheduler;

#[test]
fn only_due_tasks_run() {
    let log = ExecutionLog::new();
    let mut sched = Scheduler::new();
    sched
        .schedule_delayed(RecordingTask::new("t3", &log), 3)
        .unwrap();
    sched.schedule_now(RecordingTask::new("t0", &log)).unwrap();
    sched
        .schedule_delayed(RecordingTask::new("t7", &log), 7)
        .unwrap();

    sched.advance(3).unwrap();
    assert_eq!(log.labels(), vec!["t0", "t3"]);

    sched.advance(6).unwrap();
    assert_eq!(log.len(), 2);

    sched.advance(7).unwrap();
    assert_eq!(
        log.timeline(),
        vec![("t0".into(), 3), ("t3".into(), 3), ("t7".into(), 7)]
    );
}

#[test]
fn equal_ticks_run_in_scheduling_order() {
    let log = ExecutionLog::new();
    let mut sched = Scheduler::new();
    for label in ["e", "b", "d", "a", "c"] {
        sched
            .schedule_delayed(RecordingTask::new(label, &log), 2)
            .unwrap();
    }
    sched.advance(2).unwrap();
    assert_eq!(log.labels(), vec!["e", "b", "d", "a", "c"]);
}

#[test]
fn earlier_tick_beats_earlier_insertion() {
    let log = ExecutionLog::new();
    let mut sched = Scheduler::new();
    sched
        .schedule_delayed(RecordingTask::new("late", &log), 5)
        .unwrap();
    sched
        .schedule_delayed(RecordingTask::new("early", &log), 1)
        .unwrap();
    sched.advance(10).unwrap();
    assert_eq!(log.labels(), vec!["early", "late"]);
}

#[test]
fn repeating_task_reinserts_at_tick_plus_period() {
    let log = ExecutionLog::new();
    let mut sched = Scheduler::new();
    sched.advance(10).unwrap();
    let h = sched
        .schedule_repeating(RecordingTask::new("r", &log), 5)
        .unwrap();

    sched.advance(10).unwrap();
    assert_eq!(h.next_run(), 15);
    sched.advance(14).unwrap();
    assert_eq!(log.ticks_for("r"), vec![10]);
    sched.advance(15).unwrap();
    assert_eq!(log.ticks_for("r"), vec![10, 15]);
    assert_eq!(h.next_run(), 20);
}

#[test]
fn rescheduled_repeat_runs_after_same_tick_peers() {
    let log = ExecutionLog::new();
    let mut sched = Scheduler::new();
    sched
        .schedule_repeating(RecordingTask::new("r", &log), 2)
        .unwrap();
    sched.advance(0).unwrap();
    // "r" is now due at 2, queued before "o" which is admitted for 2 as well.
    sched
        .schedule_delayed(RecordingTask::new("o", &log), 2)
        .unwrap();
    sched.advance(2).unwrap();
    assert_eq!(log.labels(), vec!["r", "r", "o"]);
}

#[test]
fn reinserted_repeat_keeps_its_admission_place() {
    let log = ExecutionLog::new();
    let mut sched = Scheduler::new();
    sched
        .schedule_repeating(RecordingTask::new("a", &log), 2)
        .unwrap();
    sched
        .schedule_delayed(RecordingTask::new("b", &log), 2)
        .unwrap();
    sched.advance(0).unwrap();
    // "a" was reinserted for tick 2 after "b" was queued, but was admitted first.
    log.clear();
    sched.advance(2).unwrap();
    assert_eq!(log.labels(), vec!["a", "b"]);
}

#[test]
fn delayed_repeating_waits_then_repeats() {
    let log = ExecutionLog::new();
    let mut sched = Scheduler::new();
    let h = sched
        .schedule_delayed_repeating(RecordingTask::new("dr", &log), 4, 3)
        .unwrap();
    assert!(h.is_delayed());
    assert!(h.is_repeating());
    for tick in 0..=10 {
        sched.advance(tick).unwrap();
    }
    assert_eq!(log.ticks_for("dr"), vec![4, 7, 10]);
}

#[test]
fn each_due_task_runs_once_per_advance() {
    let log = ExecutionLog::new();
    let mut sched = Scheduler::new();
    sched
        .schedule_repeating(RecordingTask::new("fast", &log), 1)
        .unwrap();
    sched
        .schedule_repeating(RecordingTask::new("slow", &log), 4)
        .unwrap();
    for tick in 0..8 {
        let report = sched.advance(tick).unwrap();
        assert!(report.executed <= 2);
    }
    assert_eq!(log.count("fast"), 8);
    assert_eq!(log.ticks_for("slow"), vec![0, 4]);
}

#[test]
fn report_counts_match_what_happened() {
    let log = ExecutionLog::new();
    let mut sched = Scheduler::new();
    sched
        .schedule_repeating(RecordingTask::new("rep", &log), 1)
        .unwrap();
    sched.schedule_now(RecordingTask::new("one", &log)).unwrap();
    let gone = sched.schedule_now(RecordingTask::new("gone", &log)).unwrap();
    gone.cancel();

    let report = sched.advance(0).unwrap();
    assert_eq!(report.tick, 0);
    assert_eq!(report.executed, 2);
    assert_eq!(report.rescheduled, 1);
    assert_eq!(report.completed, 1);
    assert_eq!(report.reaped, 1);
    assert!(report.failures.is_empty());
    assert_eq!(sched.pending_len(), 1);
}
