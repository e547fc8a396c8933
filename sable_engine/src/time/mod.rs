//! Time allocation: translates the clock fields of [`Limits`] into a soft
//! target and a hard ceiling, both in milliseconds. The search raises the
//! stop flag once the soft target passes and aborts outright at the hard
//! ceiling.

use sable::Player;

use std::time::Instant;

use crate::params::Limits;

const SAFETY_MARGIN_MS: i64 = 50;
const MIN_MOVE_TIME_MS: i64 = 10;
const HARD_SLACK_MS: i64 = 50;
const DEFAULT_MOVES_TO_GO: i32 = 20;

/// Soft and hard cutoffs; both zero means "no time limit".
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeBudget {
    pub soft_ms: i64,
    pub hard_ms: i64,
}

/// Milliseconds elapsed since `start`.
#[inline]
pub fn elapsed_ms(start: Instant) -> i64 {
    chrono::Duration::from_std(start.elapsed())
        .map(|d| d.num_milliseconds())
        .unwrap_or(i64::MAX)
}

/// Maps the limits for the side to move into a [`TimeBudget`].
pub fn compute_time_budget(limits: &Limits, stm: Player) -> TimeBudget {
    let mut budget = TimeBudget::default();

    if limits.infinite {
        return budget;
    }

    if limits.movetime_ms >= 0 {
        let move_time = limits.movetime_ms.max(MIN_MOVE_TIME_MS);
        budget.soft_ms = move_time;
        budget.hard_ms = move_time + HARD_SLACK_MS;
        return budget;
    }

    let (time_left, increment) = match stm {
        Player::White => (limits.wtime_ms, limits.winc_ms),
        Player::Black => (limits.btime_ms, limits.binc_ms),
    };
    let have_clock = time_left >= 0;
    let have_increment = increment > 0;

    if !have_clock {
        // No clock at all: an increment still buys a slice of thinking time.
        if have_increment {
            let alloc = (increment / 2).max(MIN_MOVE_TIME_MS);
            budget.soft_ms = alloc;
            budget.hard_ms = alloc + HARD_SLACK_MS;
        }
        return budget;
    }

    let divisor = if limits.movestogo > 0 {
        limits.movestogo
    } else {
        DEFAULT_MOVES_TO_GO
    };
    let base_time = (time_left / i64::from(divisor.max(1))).max(0);
    let inc_time = (increment / 2).max(0);
    let mut allocate = base_time + inc_time;

    let safety_margin = SAFETY_MARGIN_MS.min((time_left / 10).max(0));
    let max_allowed = if time_left > safety_margin {
        time_left - safety_margin
    } else {
        time_left
    };
    allocate = allocate.min(max_allowed);
    if allocate < MIN_MOVE_TIME_MS {
        allocate = max_allowed.min(MIN_MOVE_TIME_MS.max(0));
    }
    allocate = allocate.clamp(0, time_left);

    budget.soft_ms = allocate;
    budget.hard_ms = (allocate + HARD_SLACK_MS).max(allocate).min(time_left);
    if budget.hard_ms < budget.soft_ms {
        budget.hard_ms = budget.soft_ms;
    }
    budget
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_means_no_limit() {
        let budget = compute_time_budget(&Limits::infinite(), Player::White);
        assert_eq!(budget, TimeBudget::default());
    }

    #[test]
    fn movetime_gets_slack() {
        let budget = compute_time_budget(&Limits::movetime(200), Player::White);
        assert_eq!(budget.soft_ms, 200);
        assert_eq!(budget.hard_ms, 250);

        // Tiny movetimes are floored.
        let budget = compute_time_budget(&Limits::movetime(1), Player::Black);
        assert_eq!(budget.soft_ms, MIN_MOVE_TIME_MS);
    }

    #[test]
    fn clock_division_by_movestogo() {
        let mut limits = Limits::default();
        limits.wtime_ms = 60_000;
        limits.movestogo = 30;
        let budget = compute_time_budget(&limits, Player::White);
        assert_eq!(budget.soft_ms, 2_000);
        assert_eq!(budget.hard_ms, 2_050);
    }

    #[test]
    fn default_movestogo_and_increment() {
        let mut limits = Limits::default();
        limits.btime_ms = 40_000;
        limits.binc_ms = 1_000;
        let budget = compute_time_budget(&limits, Player::Black);
        assert_eq!(budget.soft_ms, 40_000 / 20 + 500);
        assert!(budget.hard_ms <= 40_000);
    }

    #[test]
    fn never_allocates_more_than_the_clock() {
        let mut limits = Limits::default();
        limits.wtime_ms = 30;
        limits.movestogo = 1;
        let budget = compute_time_budget(&limits, Player::White);
        assert!(budget.soft_ms <= 30);
        assert!(budget.hard_ms <= 30);
        assert!(budget.hard_ms >= budget.soft_ms);
    }

    #[test]
    fn increment_only_degenerate_case() {
        let mut limits = Limits::default();
        limits.winc_ms = 2_000;
        let budget = compute_time_budget(&limits, Player::White);
        assert_eq!(budget.soft_ms, 1_000);
        assert_eq!(budget.hard_ms, 1_050);
    }

    #[test]
    fn no_clock_no_increment_is_unlimited() {
        let budget = compute_time_budget(&Limits::default(), Player::White);
        assert_eq!(budget, TimeBudget::default());
    }
}
