#![doc = include_str!("../README.md")]

// Re-export workspace crates
pub use hypertune_hal as hal;
pub use hypertune_samplers as samplers;
pub use hypertune_space as space;

/// Pareto dominance, non-dominated fronts and crowding distance
pub mod multiobjective;
/// Study persistence: save and load finished trials
pub mod persistence;
/// Early-stopping policies over intermediate values
pub mod pruners;
/// Thread-safe ask/tell study coordinator
pub mod study;

// Re-export commonly used items
pub use multiobjective::{crowding_distance, dominates, pareto_front};
pub use persistence::{load_study, PersistenceError};
pub use pruners::{
    MedianPruner, NopPruner, PercentilePruner, Pruner, PrunerError, SuccessiveHalvingPruner,
};
pub use samplers::{
    CmaesConfig, CmaesMetrics, CmaesSampler, RandomSampler, Sampler, SamplerError, TpeConfig,
    TpeSampler,
};
pub use space::{
    Direction, ParamAssignment, ParamValue, ParameterRange, SearchSpace, SpaceError, Trial,
    TrialState,
};
pub use study::{
    create_multi_objective_study, create_study, ConstraintFn, Study, StudyBuilder, StudyError,
    TrialResult,
};
