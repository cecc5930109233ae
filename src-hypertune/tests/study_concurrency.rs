use std::sync::Arc;
use std::thread;

use hypertune::{create_study, Direction, ParameterRange, SearchSpace, TrialResult, TrialState};

fn space_x() -> SearchSpace {
    SearchSpace::new(vec![ParameterRange::float("x", 0.0, 10.0).unwrap()]).unwrap()
}

#[test]
fn test_parallel_ask_tell_keeps_numbers_dense() {
    let study = Arc::new(create_study("parallel", space_x(), Direction::Minimize).unwrap());

    let workers: Vec<_> = (0..4)
        .map(|w| {
            let study = Arc::clone(&study);
            thread::spawn(move || {
                for i in 0..25 {
                    let trial = study.ask().unwrap();
                    let x = trial.param("x").unwrap().as_float().unwrap();
                    study.report(&trial, 1, x);
                    let result = if (w + i) % 7 == 0 {
                        TrialResult::Fail
                    } else {
                        TrialResult::Value((x - 5.0).powi(2))
                    };
                    study.tell(trial.number(), result).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let trials = study.trials();
    assert_eq!(trials.len(), 100);
    for (i, trial) in trials.iter().enumerate() {
        assert_eq!(trial.number(), i);
        assert!(trial.state().is_terminal());
    }
    // The best trial is a Complete one with the extremal value.
    let best = study.best_trial().unwrap();
    assert_eq!(best.state(), TrialState::Complete);
    let min = trials
        .iter()
        .filter(|t| t.state() == TrialState::Complete)
        .filter_map(|t| t.value())
        .fold(f64::INFINITY, f64::min);
    assert_eq!(best.value(), Some(min));
}

#[test]
fn test_evaluator_reports_race_study_reads_safely() {
    let study = Arc::new(create_study("racing", space_x(), Direction::Minimize).unwrap());
    let trial = study.ask().unwrap();

    let reporter = {
        let trial = Arc::clone(&trial);
        thread::spawn(move || {
            for step in 0..500u64 {
                trial.report(step, step as f64);
            }
        })
    };
    // Concurrent reads of the intermediate map while reports stream in.
    for _ in 0..200 {
        let _ = study.should_prune(&trial);
        let _ = trial.intermediate_values();
    }
    reporter.join().unwrap();

    assert_eq!(trial.intermediate_values().len(), 500);
    assert_eq!(trial.last_step(), Some(499));
}

#[test]
fn test_batch_ask_is_atomic_for_numbering() {
    let study = Arc::new(create_study("batched", space_x(), Direction::Minimize).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let study = Arc::clone(&study);
            thread::spawn(move || {
                let batch = study.ask_batch(5).unwrap();
                let numbers: Vec<usize> = batch.iter().map(|t| t.number()).collect();
                // Contiguous within the batch even under contention.
                for pair in numbers.windows(2) {
                    assert_eq!(pair[1], pair[0] + 1);
                }
                numbers
            })
        })
        .collect();

    let mut all: Vec<usize> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort_unstable();
    let expected: Vec<usize> = (0..20).collect();
    assert_eq!(all, expected);
}
