//! Tests for the relaxation ladder.

use super::*;
use rayon::ThreadPoolBuilder;
use rstest::rstest;
use tollway_core::test_support::{TollNetwork, candidate, priced_toll};
use tollway_core::{
    ClassPrices, Cost, DiskAvoidanceBuilder, TariffCostModel, TariffTable, TollId, TollKind,
    VehicleClass,
};

fn tariffs() -> TariffCostModel {
    let open = |cents| ClassPrices::uniform(Cost::from_cents(cents));
    TariffCostModel::new(
        TariffTable::new()
            .with_open("A", open(500))
            .with_open("B", open(300))
            .with_open("C", open(200))
            .with_open("D", open(100)),
    )
}

fn network(stations: &[&str]) -> TollNetwork {
    stations
        .iter()
        .fold(TollNetwork::new(), |network, id| {
            network.with_station(id, TollKind::Open)
        })
}

fn resolve(
    network: &TollNetwork,
    config: &OptimiserConfig,
    constraint: Constraint,
) -> Result<OptimisationOutcome, OptimiseError> {
    resolve_on_threads(network, config, constraint, config.workers)
}

/// Resolve with waves of `config.workers` requests on `threads` threads.
fn resolve_on_threads(
    network: &TollNetwork,
    config: &OptimiserConfig,
    constraint: Constraint,
    threads: usize,
) -> Result<OptimisationOutcome, OptimiseError> {
    let locator = network.locator();
    let tariffs = tariffs();
    let geometry = DiskAvoidanceBuilder::default();
    let waypoints = network.waypoints();
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .expect("test pool");
    let evaluator = CandidateEvaluator::new(network, &locator, &tariffs, &geometry)
        .with_radii(&config.avoidance_radii_m)
        .with_journey(&waypoints, VehicleClass::C1);
    PriorityResolver::new(evaluator, config, &pool).resolve(&constraint)
}

fn cheapest_count(outcome: &OptimisationOutcome) -> Option<usize> {
    outcome.slots.cheapest.as_ref().map(|c| c.toll_count())
}

#[rstest]
fn unconstrained_requests_return_the_base_route() {
    let network = network(&["A", "B"])
        .with_corridor(&["A", "B"], 3_600)
        .with_corridor(&[], 5_000);

    let outcome = resolve(&network, &OptimiserConfig::default(), Constraint::None)
        .expect("base route");

    assert_eq!(outcome.resolution, ResolutionLevel::None);
    assert_eq!(cheapest_count(&outcome), Some(2));
    assert_eq!(outcome.stats.levels_tried, 0);
    assert_eq!(network.call_count(), 1);
}

#[rstest]
fn compliant_base_route_needs_no_search() {
    let network = network(&["A", "B", "C"]).with_corridor(&["A", "B", "C"], 3_600);

    let outcome = resolve(
        &network,
        &OptimiserConfig::default(),
        Constraint::ExactTollCount(3),
    )
    .expect("exact");

    assert_eq!(outcome.resolution, ResolutionLevel::Exact);
    assert_eq!(outcome.stats.attempts_used, 1);
    assert!(outcome.base_route.is_some());
}

#[rstest]
fn count_targets_relax_upwards_first() {
    let network = network(&["A", "B", "C"])
        .with_corridor(&["A", "B", "C"], 3_600)
        .with_corridor(&["A", "B"], 3_900);

    let outcome = resolve(
        &network,
        &OptimiserConfig::default(),
        Constraint::ExactTollCount(1),
    )
    .expect("plus one");

    assert_eq!(outcome.resolution, ResolutionLevel::PlusOne);
    assert_eq!(cheapest_count(&outcome), Some(2));
    assert!(outcome.stats.candidates_rejected > 0);
}

#[rstest]
fn remembered_candidates_satisfy_the_minus_one_level() {
    let network = network(&["A", "B", "C", "D"])
        .with_corridor(&["A", "B", "C", "D"], 3_600)
        .with_corridor(&["A"], 5_000);

    let outcome = resolve(
        &network,
        &OptimiserConfig::default(),
        Constraint::ExactTollCount(2),
    )
    .expect("minus one");

    assert_eq!(outcome.resolution, ResolutionLevel::MinusOne);
    assert_eq!(cheapest_count(&outcome), Some(1));
    assert_eq!(outcome.stats.levels_tried, 3);
}

#[rstest]
fn budgets_stop_at_the_first_compliant_level() {
    let network = network(&["A", "B", "C"])
        .with_corridor(&["A", "B", "C"], 3_600)
        .with_corridor(&["C"], 4_200);

    let outcome = resolve(
        &network,
        &OptimiserConfig::default(),
        Constraint::MaxBudget(Cost::from_cents(400)),
    )
    .expect("exact");

    assert_eq!(outcome.resolution, ResolutionLevel::Exact);
    let cheapest = outcome.slots.cheapest.expect("cheapest slot");
    assert_eq!(cheapest.cost(), Cost::from_cents(200));
    assert_eq!(outcome.stats.levels_tried, 1);
}

#[rstest]
fn single_stations_survive_the_cost_bound() {
    let network = network(&["A", "B", "C"])
        .with_corridor(&["A", "B", "C"], 3_600)
        .with_corridor(&["C"], 4_200);
    let config = OptimiserConfig::default().with_max_combination_size(1);

    let outcome = resolve(&network, &config, Constraint::MaxBudget(Cost::from_cents(400)))
        .expect("exact");

    assert_eq!(outcome.resolution, ResolutionLevel::Exact);
    assert!(
        outcome
            .slots
            .cheapest
            .is_some_and(|c| c.cost() <= Cost::from_cents(400))
    );
    assert_eq!(outcome.stats.combinations_pruned, 0);
}

#[rstest]
fn pairs_beyond_the_budget_are_pruned() {
    let network = network(&["A", "B", "C"])
        .with_corridor(&["A", "B", "C"], 3_600)
        .without_tollway_avoidance();
    let config = OptimiserConfig::default().with_workers(1);

    let outcome = resolve(&network, &config, Constraint::MaxBudget(Cost::from_cents(250)))
        .expect("base route survives");

    // {A,C} and {B,C} leave more than 250 on a 1000 base, at both levels.
    assert_eq!(outcome.stats.combinations_pruned, 4);
    assert_eq!(outcome.resolution, ResolutionLevel::Degraded);
    let avoided = network.avoidance_requests();
    assert!(avoided.contains(&[TollId::new("A"), TollId::new("B")].into()));
    assert!(!avoided.contains(&[TollId::new("B"), TollId::new("C")].into()));
}

#[rstest]
fn a_free_route_stops_the_rest_of_its_wave() {
    let network = network(&["A", "B", "C", "D"])
        .with_corridor(&["A", "B", "C", "D"], 3_600)
        .with_corridor(&[], 5_000);
    let config = OptimiserConfig::default().with_workers(4);

    let outcome = resolve_on_threads(
        &network,
        &config,
        Constraint::MaxBudget(Cost::from_cents(100)),
        1,
    )
    .expect("exact");

    assert_eq!(outcome.resolution, ResolutionLevel::Exact);
    assert_eq!(
        network.avoidance_requests(),
        vec![[TollId::new("A")].into()]
    );
    assert_eq!(network.call_count(), 2);
    assert_eq!(outcome.stats.candidates_evaluated, 1);
}

#[rstest]
fn single_toll_targets_detour_through_an_open_toll() {
    let network = network(&["A", "B", "C"])
        .with_corridor(&["A", "B", "C"], 3_600)
        .with_corridor(&[], 4_200)
        .with_corridor(&["C"], 4_500);

    let outcome = resolve(
        &network,
        &OptimiserConfig::default(),
        Constraint::ExactTollCount(1),
    )
    .expect("exact");

    assert_eq!(outcome.resolution, ResolutionLevel::Exact);
    let cheapest = outcome.slots.cheapest.expect("cheapest slot");
    let on_route: Vec<&str> = cheapest.on_route_ids().map(TollId::as_str).collect();
    assert_eq!(on_route, ["C"]);
    assert!(
        network
            .via_requests()
            .contains(&[TollId::new("C")].into())
    );
}

#[rstest]
fn budget_pools_take_open_tolls_near_the_base_route() {
    let closed = TollStation::new("X", TollKind::Closed, geo::Coord { x: 0.0, y: 0.0 })
        .with_cost(Cost::from_cents(50));
    let base = BaseRoute {
        candidate: Arc::new(candidate(3_600, vec![priced_toll("A", 500, 0.0)], &[])),
        nearby: vec![priced_toll("N", 200, 0.0), closed],
    };
    let ids = |constraint: Constraint| -> Vec<String> {
        avoidance_pool(&base, &constraint)
            .iter()
            .map(|toll| toll.id.to_string())
            .collect()
    };

    assert_eq!(ids(Constraint::MaxBudget(Cost::from_cents(300))), ["A", "N"]);
    assert_eq!(ids(Constraint::ExactTollCount(0)), ["A"]);
}

#[rstest]
fn percentage_budgets_bind_to_the_base_cost() {
    let network = network(&["A", "B", "C"])
        .with_corridor(&["A", "B", "C"], 3_600)
        .with_corridor(&["C"], 4_200);
    let percent = tollway_core::BudgetPercent::from_fraction(0.25).expect("fraction");

    let outcome = resolve(
        &network,
        &OptimiserConfig::default(),
        Constraint::MaxBudgetPercent {
            percent,
            base_cost: None,
        },
    )
    .expect("exact");

    assert_eq!(outcome.resolution, ResolutionLevel::Exact);
    assert!(
        outcome
            .slots
            .cheapest
            .is_some_and(|c| c.cost() <= Cost::from_cents(250))
    );
}

#[rstest]
fn near_misses_on_absolute_budgets_are_reported() {
    let network = network(&["A", "B", "C"])
        .with_corridor(&["A", "B", "C"], 3_600)
        .with_corridor(&["B", "C"], 4_000)
        .without_tollway_avoidance();

    let outcome = resolve(
        &network,
        &OptimiserConfig::default(),
        Constraint::MaxBudget(Cost::from_cents(450)),
    )
    .expect("near budget");

    assert_eq!(outcome.resolution, ResolutionLevel::NearBudget);
    assert!(
        outcome
            .slots
            .cheapest
            .is_some_and(|c| c.cost() == Cost::from_cents(500))
    );
}

#[rstest]
fn unreachable_provider_is_a_total_failure() {
    let network = network(&["A"])
        .with_corridor(&["A"], 3_600)
        .unreachable();

    let err = resolve(
        &network,
        &OptimiserConfig::default(),
        Constraint::MaxBudget(Cost::from_cents(100)),
    )
    .expect_err("nothing reachable");

    // Base route, toll-free attempt and the fallback's base retry.
    assert_eq!(err, OptimiseError::TotalFailure { attempts_used: 3 });
}

#[rstest]
fn attempt_budget_caps_provider_calls() {
    let network = network(&["A", "B", "C", "D"]).with_corridor(&["A", "B", "C", "D"], 3_600);
    let config = OptimiserConfig::default()
        .with_attempt_budget(4)
        .with_workers(2);

    let outcome = resolve(&network, &config, Constraint::ExactTollCount(1)).expect("degraded");

    assert_eq!(outcome.resolution, ResolutionLevel::Degraded);
    assert_eq!(network.call_count(), 4);
    assert_eq!(outcome.stats.attempts_used, 4);
}
