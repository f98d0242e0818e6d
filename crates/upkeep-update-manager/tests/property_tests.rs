//! Property-based tests for status reduction and consolidation

use proptest::prelude::*;
use upkeep_update_manager::prelude::*;

fn arb_version() -> impl Strategy<Value = semver::Version> {
    (0u64..100, 0u64..100, 0u64..100)
        .prop_map(|(major, minor, patch)| semver::Version::new(major, minor, patch))
}

fn arb_status() -> impl Strategy<Value = UpdateStatus> {
    prop_oneof![
        Just(UpdateStatus::Idle),
        Just(UpdateStatus::Checking),
        Just(UpdateStatus::CheckingNotPermitted),
        Just(UpdateStatus::UpdatePending),
        (0u8..=100u8).prop_map(|progress| UpdateStatus::Retrieving { progress }),
        Just(UpdateStatus::InstallPending),
        (0u8..=100u8).prop_map(|progress| UpdateStatus::Installing { progress }),
        Just(UpdateStatus::RestartPending),
        Just(UpdateStatus::Updated),
    ]
}

fn arb_check_result() -> impl Strategy<Value = UpdateCheckResult> {
    ("[a-z]{3,10}", any::<bool>(), arb_version()).prop_map(|(name, available, version)| {
        if available {
            UpdateCheckResult::available(name, version)
        } else {
            UpdateCheckResult::no_update(name)
        }
    })
}

fn into_verdicts(results: &[UpdateCheckResult]) -> Vec<CheckVerdicts> {
    results
        .iter()
        .map(|result| {
            std::iter::once((result.component.clone(), result.clone())).collect::<CheckVerdicts>()
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_aggregate_equals_min_of_individual_maps(
        statuses in prop::collection::vec(arb_status(), 0..20)
    ) {
        let expected = statuses
            .iter()
            .map(|status| UpdateManagerStatus::from(*status))
            .min()
            .unwrap_or(UpdateManagerStatus::Idle);
        prop_assert_eq!(
            UpdateManagerStatus::aggregate(statuses.iter().copied()),
            expected
        );
    }

    #[test]
    fn prop_aggregate_is_order_independent(
        statuses in prop::collection::vec(arb_status(), 0..20)
    ) {
        let forward = UpdateManagerStatus::aggregate(statuses.iter().copied());
        let reverse = UpdateManagerStatus::aggregate(statuses.iter().rev().copied());
        prop_assert_eq!(forward, reverse);
    }

    #[test]
    fn prop_any_working_component_makes_manager_working(
        statuses in prop::collection::vec(arb_status(), 1..20)
    ) {
        if statuses.iter().any(|status| status.is_working()) {
            prop_assert_eq!(
                UpdateManagerStatus::aggregate(statuses.iter().copied()),
                UpdateManagerStatus::Working
            );
        }
    }

    #[test]
    fn prop_consolidation_is_deterministic(
        results in prop::collection::vec(arb_check_result(), 0..12)
    ) {
        let verdicts = into_verdicts(&results);
        let consolidator = PreferAvailableConsolidator;
        prop_assert_eq!(
            consolidator.consolidate(&verdicts),
            consolidator.consolidate(&verdicts)
        );
    }

    #[test]
    fn prop_availability_survives_consolidation(
        results in prop::collection::vec(arb_check_result(), 0..12)
    ) {
        let verdicts = into_verdicts(&results);
        let merged = PreferAvailableConsolidator.consolidate(&verdicts);
        for (name, result) in &merged {
            let any_available = verdicts
                .iter()
                .filter_map(|verdict| verdict.get(name))
                .any(|candidate| candidate.update_available);
            prop_assert_eq!(result.update_available, any_available);
        }
    }
}
