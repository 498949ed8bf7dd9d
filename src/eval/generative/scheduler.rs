//! Per-epoch decision of whether to run generation metrics.

use serde::{Deserialize, Serialize};

/// How often generation-based metrics are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalcEvery {
    /// Every validation pass
    #[default]
    #[serde(alias = "every_epoch", alias = "every-epoch")]
    Epoch,
    /// Even-numbered epochs
    #[serde(alias = "every_other_epoch", alias = "every-other-epoch")]
    OtherEpoch,
    /// Final epoch only
    #[serde(alias = "last_epoch_only", alias = "last-epoch-only")]
    LastEpoch,
}

impl std::str::FromStr for CalcEvery {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "epoch" | "every_epoch" => Ok(Self::Epoch),
            "other_epoch" | "every_other_epoch" => Ok(Self::OtherEpoch),
            "last_epoch" | "last_epoch_only" => Ok(Self::LastEpoch),
            other => Err(format!(
                "unknown cadence '{other}' (expected epoch, other_epoch, or last_epoch)"
            )),
        }
    }
}

/// Whether epoch `current_epoch` (1-based) out of `total_epochs` computes metrics.
///
/// The final epoch always computes.
pub fn should_compute(calc_every: CalcEvery, current_epoch: usize, total_epochs: usize) -> bool {
    if current_epoch == total_epochs {
        return true;
    }
    match calc_every {
        CalcEvery::Epoch => true,
        CalcEvery::OtherEpoch => current_epoch % 2 == 0,
        CalcEvery::LastEpoch => false,
    }
}

/// Schedule state, recomputed at each epoch start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleState {
    pub current_epoch: usize,
    pub total_epochs: usize,
    pub compute: bool,
}

/// Tracks the cadence decision for the running epoch
#[derive(Debug, Clone)]
pub struct GenerationScheduler {
    calc_every: CalcEvery,
    state: Option<ScheduleState>,
}

impl GenerationScheduler {
    pub fn new(calc_every: CalcEvery) -> Self {
        Self {
            calc_every,
            state: None,
        }
    }

    /// Configured cadence
    pub fn calc_every(&self) -> CalcEvery {
        self.calc_every
    }

    /// Recompute the decision for a new epoch (1-based)
    pub fn start_epoch(&mut self, current_epoch: usize, total_epochs: usize) -> ScheduleState {
        let state = ScheduleState {
            current_epoch,
            total_epochs,
            compute: should_compute(self.calc_every, current_epoch, total_epochs),
        };
        self.state = Some(state);
        state
    }

    /// Decision for the running epoch; `true` before the first epoch starts
    pub fn compute(&self) -> bool {
        self.state.map_or(true, |s| s.compute)
    }

    /// Current schedule state
    pub fn state(&self) -> Option<ScheduleState> {
        self.state
    }

    /// Decisions for every epoch of a run
    pub fn plan(&self, total_epochs: usize) -> Vec<bool> {
        (1..=total_epochs)
            .map(|e| should_compute(self.calc_every, e, total_epochs))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_other_epoch_five_epochs() {
        let sched = GenerationScheduler::new(CalcEvery::OtherEpoch);
        assert_eq!(sched.plan(5), vec![false, true, false, true, true]);
    }

    #[test]
    fn test_last_epoch_only() {
        let sched = GenerationScheduler::new(CalcEvery::LastEpoch);
        assert_eq!(sched.plan(3), vec![false, false, true]);
    }

    #[test]
    fn test_every_epoch() {
        let sched = GenerationScheduler::new(CalcEvery::Epoch);
        assert!(sched.plan(4).into_iter().all(|c| c));
    }

    #[test]
    fn test_start_epoch_updates_state() {
        let mut sched = GenerationScheduler::new(CalcEvery::OtherEpoch);
        assert!(sched.compute());
        assert!(!sched.start_epoch(1, 5).compute);
        assert!(!sched.compute());
        sched.start_epoch(2, 5);
        assert!(sched.compute());
        assert_eq!(sched.state().unwrap().current_epoch, 2);
    }

    #[test]
    fn test_calc_every_parsing() {
        assert_eq!("other_epoch".parse::<CalcEvery>(), Ok(CalcEvery::OtherEpoch));
        assert_eq!("every-other-epoch".parse::<CalcEvery>(), Ok(CalcEvery::OtherEpoch));
        assert_eq!("last-epoch-only".parse::<CalcEvery>(), Ok(CalcEvery::LastEpoch));
        assert!("weekly".parse::<CalcEvery>().is_err());
        let c: CalcEvery = serde_yaml::from_str("every-epoch").unwrap();
        assert_eq!(c, CalcEvery::Epoch);
    }

    fn cadence() -> impl Strategy<Value = CalcEvery> {
        prop_oneof![
            Just(CalcEvery::Epoch),
            Just(CalcEvery::OtherEpoch),
            Just(CalcEvery::LastEpoch),
        ]
    }

    proptest! {
        #[test]
        fn prop_final_epoch_always_computes(mode in cadence(), total in 1usize..500) {
            prop_assert!(should_compute(mode, total, total));
        }

        #[test]
        fn prop_other_epoch_is_even(total in 2usize..500, epoch in 1usize..500) {
            prop_assume!(epoch < total);
            prop_assert_eq!(should_compute(CalcEvery::OtherEpoch, epoch, total), epoch % 2 == 0);
        }
    }
}
