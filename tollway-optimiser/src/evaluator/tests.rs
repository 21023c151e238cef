//! Tests for radius escalation and candidate verification.

use super::*;
use rstest::{fixture, rstest};
use tollway_core::test_support::{ScriptedRoutingProvider, TollNetwork};
use tollway_core::{
    ClassPrices, Cost, DiskAvoidanceBuilder, SpatialTollLocator, TariffCostModel, TariffTable,
    TollKind,
};

use crate::CombinationGenerator;

const RADII: [f64; 2] = [250.0, 500.0];

#[fixture]
fn network() -> TollNetwork {
    TollNetwork::new()
        .with_station("A", TollKind::Open)
        .with_station("B", TollKind::Open)
        .with_station("C", TollKind::Open)
        .with_corridor(&["A", "B", "C"], 3_600)
        .with_corridor(&["A", "C"], 3_900)
        .with_corridor(&[], 5_000)
}

#[fixture]
fn tariffs() -> TariffCostModel {
    let open = |cents| ClassPrices::uniform(Cost::from_cents(cents));
    TariffCostModel::new(
        TariffTable::new()
            .with_open("A", open(500))
            .with_open("B", open(300))
            .with_open("C", open(200)),
    )
}

fn avoid(base: &Candidate, id: &str) -> AvoidanceRequest {
    CombinationGenerator::new(base.tolls_on_route())
        .generate(1..=1)
        .find(|request| {
            request
                .signature()
                .is_some_and(|signature| signature.ids() == [TollId::new(id)])
        })
        .unwrap_or_else(|| panic!("{id} should be in the pool"))
}

#[rstest]
fn base_route_is_located_and_priced(network: TollNetwork, tariffs: TariffCostModel) {
    let locator = network.locator();
    let waypoints = network.waypoints();
    let geometry = DiskAvoidanceBuilder::default();
    let evaluator = CandidateEvaluator::new(&network, &locator, &tariffs, &geometry)
        .with_journey(&waypoints, VehicleClass::C1);
    let state = SearchState::new(5);

    let base = evaluator.evaluate_base(&state).expect("base route");

    assert_eq!(base.candidate.toll_count(), 3);
    assert_eq!(base.candidate.cost(), Cost::from_cents(1_000));
    assert!(base.candidate.avoided_toll_ids().is_empty());
    assert!(base.nearby.is_empty());
    assert_eq!(state.attempts_used(), 1);
}

#[rstest]
fn avoided_station_leaves_the_route(network: TollNetwork, tariffs: TariffCostModel) {
    let locator = network.locator();
    let waypoints = network.waypoints();
    let geometry = DiskAvoidanceBuilder::default();
    let evaluator = CandidateEvaluator::new(&network, &locator, &tariffs, &geometry)
        .with_radii(&RADII)
        .with_journey(&waypoints, VehicleClass::C1);
    let state = SearchState::new(5);
    let base = evaluator.evaluate_base(&state).expect("base route");

    let candidate = evaluator
        .evaluate(&avoid(&base.candidate, "B"), &state)
        .expect("detour around B");

    let on_route: Vec<&str> = candidate.on_route_ids().map(TollId::as_str).collect();
    assert_eq!(on_route, ["A", "C"]);
    assert_eq!(candidate.cost(), Cost::from_cents(700));
    assert_eq!(state.attempts_used(), 2);
}

#[rstest]
fn stubborn_routes_escalate_then_fail(network: TollNetwork, tariffs: TariffCostModel) {
    let through = network.route_through(&["A", "B", "C"], 3_600);
    let provider = ScriptedRoutingProvider::new(Ok(through.clone()))
        .with_avoidance_responses([Ok(through.clone()), Ok(through)]);
    let locator: SpatialTollLocator = network.locator();
    let geometry = DiskAvoidanceBuilder::default();
    let evaluator = CandidateEvaluator::new(&provider, &locator, &tariffs, &geometry)
        .with_radii(&RADII)
        .with_journey(&[], VehicleClass::C1);
    let state = SearchState::new(10);
    let base = evaluator.evaluate_base(&state).expect("base route");

    let err = evaluator
        .evaluate(&avoid(&base.candidate, "B"), &state)
        .expect_err("B never leaves the route");

    assert_eq!(
        err,
        EvaluationError::Verification {
            still_present: vec![TollId::new("B")]
        }
    );
    assert_eq!(provider.call_count(), 3);
}

#[rstest]
fn escalation_stops_when_the_budget_runs_out(network: TollNetwork, tariffs: TariffCostModel) {
    let through = network.route_through(&["A", "B", "C"], 3_600);
    let provider = ScriptedRoutingProvider::new(Ok(through.clone()))
        .with_avoidance_responses([Ok(through.clone()), Ok(through)]);
    let locator = network.locator();
    let geometry = DiskAvoidanceBuilder::default();
    let evaluator = CandidateEvaluator::new(&provider, &locator, &tariffs, &geometry)
        .with_radii(&RADII)
        .with_journey(&[], VehicleClass::C1);
    let state = SearchState::new(2);
    let base = evaluator.evaluate_base(&state).expect("base route");

    let err = evaluator
        .evaluate(&avoid(&base.candidate, "B"), &state)
        .expect_err("budget is spent");

    assert_eq!(err, EvaluationError::BudgetExhausted);
    assert_eq!(provider.call_count(), 2);
}

#[rstest]
fn provider_errors_abort_without_escalating(network: TollNetwork, tariffs: TariffCostModel) {
    let through = network.route_through(&["A", "B", "C"], 3_600);
    let provider = ScriptedRoutingProvider::new(Ok(through));
    let locator = network.locator();
    let geometry = DiskAvoidanceBuilder::default();
    let evaluator = CandidateEvaluator::new(&provider, &locator, &tariffs, &geometry)
        .with_radii(&RADII)
        .with_journey(&[], VehicleClass::C1);
    let state = SearchState::new(10);
    let base = evaluator.evaluate_base(&state).expect("base route");

    let err = evaluator
        .evaluate(&avoid(&base.candidate, "A"), &state)
        .expect_err("queue is empty");

    assert_eq!(err, EvaluationError::Provider(RoutingError::NoRoute));
    assert_eq!(state.attempts_used(), 2);
}

#[rstest]
fn tollway_avoidance_is_a_single_call(network: TollNetwork, tariffs: TariffCostModel) {
    let locator = network.locator();
    let waypoints = network.waypoints();
    let geometry = DiskAvoidanceBuilder::default();
    let evaluator = CandidateEvaluator::new(&network, &locator, &tariffs, &geometry)
        .with_journey(&waypoints, VehicleClass::C1);
    let state = SearchState::new(5);

    let candidate = evaluator
        .evaluate(&AvoidanceRequest::AllTollways, &state)
        .expect("toll-free corridor");

    assert_eq!(candidate.toll_count(), 0);
    assert_eq!(candidate.duration().as_secs(), 5_000);
    assert_eq!(network.call_count(), 1);
}

#[rstest]
fn detours_pass_their_via_toll(tariffs: TariffCostModel) {
    let network = TollNetwork::new()
        .with_station("A", TollKind::Open)
        .with_station("B", TollKind::Open)
        .with_station("C", TollKind::Open)
        .with_corridor(&["A", "B", "C"], 3_600)
        .with_corridor(&[], 4_200)
        .with_corridor(&["C"], 4_500);
    let locator = network.locator();
    let waypoints = network.waypoints();
    let geometry = DiskAvoidanceBuilder::default();
    let evaluator = CandidateEvaluator::new(&network, &locator, &tariffs, &geometry)
        .with_radii(&RADII)
        .with_journey(&waypoints, VehicleClass::C1);
    let state = SearchState::new(5);
    let base = evaluator.evaluate_base(&state).expect("base route");
    let detours = CombinationGenerator::new(base.candidate.tolls_on_route()).detours(&[]);
    let through_c = detours.first().expect("a detour per open toll");

    let candidate = evaluator.evaluate(through_c, &state).expect("corridor via C");

    let on_route: Vec<&str> = candidate.on_route_ids().map(TollId::as_str).collect();
    assert_eq!(on_route, ["C"]);
    assert_eq!(candidate.cost(), Cost::from_cents(200));
    assert_eq!(candidate.avoided_toll_ids().len(), 2);
    assert_eq!(
        network.via_requests(),
        vec![BTreeSet::from([TollId::new("C")])]
    );
    assert_eq!(state.attempts_used(), 2);
}

#[rstest]
fn detours_with_nothing_to_avoid_route_once(network: TollNetwork, tariffs: TariffCostModel) {
    let locator = network.locator();
    let waypoints = network.waypoints();
    let geometry = DiskAvoidanceBuilder::default();
    let evaluator = CandidateEvaluator::new(&network, &locator, &tariffs, &geometry)
        .with_radii(&RADII)
        .with_journey(&waypoints, VehicleClass::C1);
    let state = SearchState::new(5);
    let base = evaluator.evaluate_base(&state).expect("base route");
    let via = base
        .candidate
        .tolls_on_route()
        .iter()
        .find(|toll| toll.id == TollId::new("B"))
        .cloned()
        .expect("B on the base route");
    let request = AvoidanceRequest::Detour(StationDetour {
        via,
        avoid: Vec::new(),
    });

    let candidate = evaluator.evaluate(&request, &state).expect("corridor via B");

    assert_eq!(candidate.toll_count(), 3);
    assert!(candidate.avoided_toll_ids().is_empty());
    assert_eq!(
        network.via_requests(),
        vec![BTreeSet::from([TollId::new("B")])]
    );
    assert_eq!(state.attempts_used(), 2);
}
