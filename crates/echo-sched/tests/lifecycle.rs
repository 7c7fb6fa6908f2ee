// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Handle lifecycle: cancellation, normalization, enable/disable, shutdown.

use echo_dry_tests::{CancelAfter, ExecutionLog, RecordingTask};
use echo_sched::{SchedError, Scheduler, NO_DELAY, ONE_SHOT};

#[test]
fn cancel_before_eligibility_reaps_on_first_due_advance() {
    let log = ExecutionLog::new();
    let mut sched = Scheduler::new();
    let h = sched
        .schedule_delayed(RecordingTask::new("never", &log), 10)
        .unwrap();
    sched.advance(5).unwrap();
    h.cancel();

    sched.advance(9).unwrap();
    assert!(sched.is_queued(&h), "not yet at the head of the queue");

    let report = sched.advance(10).unwrap();
    assert_eq!(report.reaped, 1);
    assert!(!sched.is_queued(&h));
    assert!(h.is_removed());
    assert!(log.is_empty());
}

#[test]
fn cancelling_a_repeat_between_runs_stops_it() {
    let log = ExecutionLog::new();
    let mut sched = Scheduler::new();
    let h = sched
        .schedule_repeating(RecordingTask::new("r", &log), 2)
        .unwrap();
    sched.advance(0).unwrap();
    sched.advance(2).unwrap();
    h.cancel();
    sched.advance(4).unwrap();
    sched.advance(6).unwrap();
    assert_eq!(log.ticks_for("r"), vec![0, 2]);
    assert!(!sched.is_queued(&h));
}

#[test]
fn self_cancelling_repeat_is_not_requeued() {
    let log = ExecutionLog::new();
    let mut sched = Scheduler::new();
    let h = sched
        .schedule_repeating(CancelAfter::new("c", &log, 2), 3)
        .unwrap();
    for tick in 0..=12 {
        sched.advance(tick).unwrap();
    }
    assert_eq!(log.ticks_for("c"), vec![0, 3]);
    assert!(h.is_cancelled());
    assert!(h.is_removed());
    assert_eq!(sched.pending_len(), 0);
}

#[test]
fn zero_period_behaves_like_one() {
    let zero_log = ExecutionLog::new();
    let one_log = ExecutionLog::new();
    let mut zero = Scheduler::new();
    let mut one = Scheduler::new();
    let hz = zero
        .schedule_repeating(RecordingTask::new("p", &zero_log), 0)
        .unwrap();
    one.schedule_repeating(RecordingTask::new("p", &one_log), 1)
        .unwrap();
    for tick in 0..6 {
        zero.advance(tick).unwrap();
        one.advance(tick).unwrap();
    }
    assert_eq!(hz.period_ticks(), 1);
    assert_eq!(zero_log.timeline(), one_log.timeline());
}

#[test]
fn negative_period_behaves_like_schedule_now() {
    let neg_log = ExecutionLog::new();
    let now_log = ExecutionLog::new();
    let mut neg = Scheduler::new();
    let mut now = Scheduler::new();
    let hn = neg
        .schedule_repeating(RecordingTask::new("p", &neg_log), -5)
        .unwrap();
    now.schedule_now(RecordingTask::new("p", &now_log)).unwrap();
    for tick in 0..4 {
        neg.advance(tick).unwrap();
        now.advance(tick).unwrap();
    }
    assert!(!hn.is_repeating());
    assert_eq!(hn.period_ticks(), ONE_SHOT);
    assert_eq!(neg_log.timeline(), now_log.timeline());
    assert_eq!(neg_log.len(), 1);
}

#[test]
fn non_positive_delay_means_immediate() {
    let log = ExecutionLog::new();
    let mut sched = Scheduler::new();
    let a = sched
        .schedule_delayed(RecordingTask::new("zero", &log), 0)
        .unwrap();
    let b = sched
        .schedule_delayed(RecordingTask::new("neg", &log), -3)
        .unwrap();
    assert_eq!(a.delay_ticks(), NO_DELAY);
    assert_eq!(b.delay_ticks(), NO_DELAY);
    sched.advance(0).unwrap();
    assert_eq!(log.labels(), vec!["zero", "neg"]);
}

#[test]
fn shutdown_cancels_everything_and_rejects_further_calls() {
    let log = ExecutionLog::new();
    let mut sched = Scheduler::new();
    let handles = vec![
        sched.schedule_now(RecordingTask::new("a", &log)).unwrap(),
        sched
            .schedule_delayed(RecordingTask::new("b", &log), 3)
            .unwrap(),
        sched
            .schedule_repeating(RecordingTask::new("c", &log), 1)
            .unwrap(),
    ];
    sched.shutdown();

    for h in &handles {
        assert!(h.is_cancelled());
        assert!(!sched.is_queued(h));
    }
    assert_eq!(
        sched
            .schedule_now(RecordingTask::new("late", &log))
            .unwrap_err(),
        SchedError::Disabled
    );
    assert_eq!(sched.advance(1).unwrap_err(), SchedError::Disabled);
    assert_eq!(sched.set_enabled(true), Err(SchedError::ShutDown));
    assert!(log.is_empty());
}

#[test]
fn cancel_all_keeps_the_scheduler_usable() {
    let log = ExecutionLog::new();
    let mut sched = Scheduler::new();
    let old = sched
        .schedule_repeating(RecordingTask::new("old", &log), 1)
        .unwrap();
    assert_eq!(sched.cancel_all(), 1);
    assert!(old.is_cancelled());
    assert_eq!(sched.pending_len(), 0);

    sched.schedule_now(RecordingTask::new("new", &log)).unwrap();
    sched.advance(0).unwrap();
    assert_eq!(log.labels(), vec!["new"]);
}

#[test]
fn disabled_scheduler_rejects_every_entry_point() {
    let log = ExecutionLog::new();
    let mut sched = Scheduler::new();
    sched.set_enabled(false).unwrap();
    let task = || RecordingTask::new("x", &log);
    assert_eq!(sched.schedule_now(task()).unwrap_err(), SchedError::Disabled);
    assert_eq!(
        sched.schedule_delayed(task(), 1).unwrap_err(),
        SchedError::Disabled
    );
    assert_eq!(
        sched.schedule_repeating(task(), 1).unwrap_err(),
        SchedError::Disabled
    );
    assert_eq!(
        sched.schedule_delayed_repeating(task(), 1, 1).unwrap_err(),
        SchedError::Disabled
    );
    assert_eq!(
        sched.schedule_owned("o", task(), 1, 1).unwrap_err(),
        SchedError::Disabled
    );
    assert_eq!(sched.advance(0).unwrap_err(), SchedError::Disabled);
    assert_eq!(sched.pending_len(), 0);
}
