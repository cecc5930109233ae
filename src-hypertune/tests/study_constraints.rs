use hypertune::{
    create_study, Direction, ParamValue, ParameterRange, SearchSpace, Study, TpeSampler,
    TrialResult, TrialState,
};

fn space_x() -> SearchSpace {
    SearchSpace::new(vec![ParameterRange::float("x", 0.0, 10.0).unwrap()]).unwrap()
}

fn x_of(trial: &hypertune::Trial) -> f64 {
    trial.param("x").unwrap().as_float().unwrap()
}

#[test]
fn test_feasibility_follows_the_constraint_sign() {
    // Constraint x - 5 <= 0: feasible on the left half of the domain.
    let study = Study::builder("constrained", space_x())
        .direction(Direction::Minimize)
        .sampler(Box::new(hypertune::RandomSampler::with_seed(3)))
        .build()
        .unwrap();
    study.set_constraint_function(Box::new(|trial| {
        let x = trial.param("x").and_then(ParamValue::as_float).unwrap_or(0.0);
        Ok(vec![x - 5.0])
    }));

    // Drive parameters explicitly by telling whatever was asked; the
    // constraint only reads x, so the asked values are irrelevant here.
    let mut feasible_trial = None;
    let mut infeasible_trial = None;
    for _ in 0..40 {
        let trial = study.ask().unwrap();
        let x = x_of(&trial);
        study.tell(trial.number(), TrialResult::Value(x)).unwrap();
        if x < 4.9 && feasible_trial.is_none() {
            feasible_trial = Some(trial);
        } else if x > 5.1 && infeasible_trial.is_none() {
            infeasible_trial = Some(trial);
        }
    }

    let feasible = feasible_trial.expect("no trial landed below 5");
    let infeasible = infeasible_trial.expect("no trial landed above 5");
    assert!(study.is_feasible(&feasible));
    assert!(!study.is_feasible(&infeasible));
    assert!(feasible.constraint_values().unwrap()[0] <= 0.0);
    assert!(infeasible.constraint_values().unwrap()[0] > 0.0);
}

#[test]
fn test_constraint_failure_aborts_the_tell_atomically() {
    let study = create_study("flaky", space_x(), Direction::Minimize).unwrap();
    study.set_constraint_function(Box::new(|_| Err("metrics store unreachable".into())));

    let trial = study.ask().unwrap();
    assert!(study.tell(trial.number(), TrialResult::Value(1.0)).is_err());
    assert_eq!(trial.state(), TrialState::Running);
    assert!(trial.value().is_none());
    assert!(trial.constraint_values().is_none());
    assert!(study.best_trial().is_none());

    // The caller may retry the same number after fixing the constraint.
    study.set_constraint_function(Box::new(|_| Ok(vec![-1.0])));
    study.tell(trial.number(), TrialResult::Value(1.0)).unwrap();
    assert_eq!(trial.state(), TrialState::Complete);
}

#[test]
fn test_tpe_keeps_sampling_under_an_infeasible_history() {
    // Everything reported infeasible: the sampler falls back to the
    // violation-ranked split and must keep producing in-range suggestions.
    let study = Study::builder("infeasible", space_x())
        .direction(Direction::Minimize)
        .sampler(Box::new(TpeSampler::with_seed(5)))
        .build()
        .unwrap();
    study.set_constraint_function(Box::new(|trial| {
        let x = trial.param("x").and_then(ParamValue::as_float).unwrap_or(0.0);
        Ok(vec![1.0 + x])
    }));

    for _ in 0..30 {
        let trial = study.ask().unwrap();
        let x = x_of(&trial);
        assert!((0.0..=10.0).contains(&x));
        study.tell(trial.number(), TrialResult::Value(x)).unwrap();
        assert!(!study.is_feasible(&trial));
    }
    assert_eq!(study.n_trials(), 30);
}

#[test]
fn test_tpe_prefers_the_feasible_side() {
    // Objective rewards large x, but x > 5 is infeasible; the feasibility
    // split should hold suggestions back from piling onto the right edge.
    let study = Study::builder("pull", space_x())
        .direction(Direction::Minimize)
        .sampler(Box::new(TpeSampler::with_seed(99)))
        .build()
        .unwrap();
    study.set_constraint_function(Box::new(|trial| {
        let x = trial.param("x").and_then(ParamValue::as_float).unwrap_or(0.0);
        Ok(vec![x - 5.0])
    }));

    for _ in 0..80 {
        let trial = study.ask().unwrap();
        let x = x_of(&trial);
        study.tell(trial.number(), TrialResult::Value(-x)).unwrap();
    }
    let feasible_suggestions = study
        .trials()
        .iter()
        .filter(|t| x_of(t) <= 5.0)
        .count();
    // Unconstrained TPE on -x would send nearly everything above 5.
    assert!(
        feasible_suggestions > 20,
        "only {feasible_suggestions}/80 suggestions were feasible"
    );
}
