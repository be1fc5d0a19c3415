/// Integration tests for greedy heap allocation.
use edmsim_algorithms::*;
use proptest::prelude::*;

fn allocate(servers: &mut [EdgeServer], requests: &mut [Request]) -> RunCounters {
    let mut counters = RunCounters::new();
    GreedyHeapAllocator::new().allocate(servers, requests, &mut counters);
    counters
}

fn loads(servers: &[EdgeServer]) -> Vec<u32> {
    servers.iter().map(|s| s.current_load).collect()
}

#[test]
fn test_basic_allocation_scenario() {
    let mut servers = vec![EdgeServer::new(0, 3), EdgeServer::new(1, 2)];
    let mut requests = vec![
        Request::attack(0, 5),
        Request::attack(1, 3),
        Request::attack(2, 1),
    ];

    let counters = allocate(&mut servers, &mut requests);

    // R0 -> S0 (tie on load 0, lowest id wins), overshooting to 5.
    // R1 -> S1 (load 0), overshooting to 3.
    // R2 pops S1 (load 3 < 5), which is now full: one latency penalty.
    assert_eq!(loads(&servers), vec![5, 3]);
    assert_eq!(counters.mitigation_cost, 8);
    assert_eq!(counters.extra_service_latency, 1);
}

#[test]
fn test_exhausted_capacity_scenario() {
    let mut servers = vec![EdgeServer::with_load(0, 1, 1)];
    let mut requests = vec![Request::attack(0, 2)];

    let counters = allocate(&mut servers, &mut requests);

    assert_eq!(counters.extra_service_latency, 1);
    assert_eq!(counters.mitigation_cost, 0);
    assert_eq!(loads(&servers), vec![1]);
}

#[test]
fn test_overshoot_is_not_capped() {
    let mut servers = vec![EdgeServer::with_load(0, 4, 3)];
    let mut requests = vec![Request::attack(0, 10)];

    let counters = allocate(&mut servers, &mut requests);

    assert_eq!(servers[0].current_load, 13);
    assert!(servers[0].current_load > servers[0].capacity);
    assert_eq!(counters.mitigation_cost, 10);
}

#[test]
fn test_full_server_not_skipped_for_available_one() {
    // S0 fills on the first request. The heap still prefers S1 (load 0)
    // for the second, then S0 (load 2) vs S1 (load 2): S0 wins the tie by
    // id and fails even though S1 has room.
    let mut servers = vec![EdgeServer::new(0, 1), EdgeServer::new(1, 5)];
    let mut requests = vec![
        Request::attack(0, 2),
        Request::attack(1, 2),
        Request::attack(2, 1),
    ];

    let counters = allocate(&mut servers, &mut requests);

    assert_eq!(loads(&servers), vec![2, 2]);
    assert_eq!(counters.mitigation_cost, 4);
    assert_eq!(counters.extra_service_latency, 1);
}

fn pool() -> impl Strategy<Value = Vec<EdgeServer>> {
    prop::collection::vec((0u32..6, 0u32..6), 0..8).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (capacity, load))| EdgeServer::with_load(i as u32, capacity, load))
            .collect()
    })
}

fn batch() -> impl Strategy<Value = Vec<Request>> {
    prop::collection::vec((any::<bool>(), 0u32..10), 0..40).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (is_attack, intensity))| Request::new(i as u64, is_attack, intensity))
            .collect()
    })
}

/// Straight-line replay of the allocation loop: a linear scan for the
/// lowest `(load, id)` among servers that had room before allocation.
/// Returns final loads, admissions, cost and misses.
fn replay_allocation(servers: &[EdgeServer], requests: &[Request]) -> (Vec<u32>, u64, u64, u64) {
    let mut loads: Vec<u32> = servers.iter().map(|s| s.current_load).collect();
    let eligible: Vec<usize> = (0..servers.len())
        .filter(|&i| servers[i].current_load < servers[i].capacity)
        .collect();

    let mut order: Vec<u32> = requests.iter().map(|r| r.intensity).collect();
    order.sort_by_key(|&intensity| std::cmp::Reverse(intensity));

    let (mut admitted, mut cost, mut missed) = (0u64, 0u64, 0u64);
    for intensity in order {
        let Some(&i) = eligible
            .iter()
            .min_by_key(|&&i| (loads[i], servers[i].id))
        else {
            missed += 1;
            continue;
        };
        if loads[i] < servers[i].capacity {
            loads[i] += intensity;
            admitted += 1;
            cost += intensity as u64;
        } else {
            missed += 1;
        }
    }
    (loads, admitted, cost, missed)
}

proptest! {
    #[test]
    fn prop_mitigation_cost_equals_admitted_load(mut servers in pool(), mut requests in batch()) {
        let before: u64 = servers.iter().map(|s| s.current_load as u64).sum();
        let counters = allocate(&mut servers, &mut requests);
        let after: u64 = servers.iter().map(|s| s.current_load as u64).sum();

        // Allocation only ever adds admitted intensity to loads.
        prop_assert_eq!(after - before, counters.mitigation_cost);
        prop_assert!(counters.extra_service_latency <= requests.len() as u64);
        prop_assert_eq!(counters.total_processed_requests, 0);
    }

    #[test]
    fn prop_misses_match_replayed_allocation(mut servers in pool(), mut requests in batch()) {
        let (expected_loads, admitted, expected_cost, expected_misses) =
            replay_allocation(&servers, &requests);
        let counters = allocate(&mut servers, &mut requests);

        prop_assert_eq!(loads(&servers), expected_loads);
        prop_assert_eq!(counters.mitigation_cost, expected_cost);
        prop_assert_eq!(counters.extra_service_latency, expected_misses);
        // Every request is either admitted or penalized exactly once.
        prop_assert_eq!(admitted + counters.extra_service_latency, requests.len() as u64);
    }

    #[test]
    fn prop_no_eligible_server_penalizes_every_request(
        capacities in prop::collection::vec(0u32..5, 0..6),
        mut requests in batch(),
    ) {
        let mut servers: Vec<EdgeServer> = capacities
            .iter()
            .enumerate()
            .map(|(i, &c)| EdgeServer::with_load(i as u32, c, c))
            .collect();
        let counters = allocate(&mut servers, &mut requests);

        prop_assert_eq!(counters.extra_service_latency, requests.len() as u64);
        prop_assert_eq!(counters.mitigation_cost, 0);
    }

    #[test]
    fn prop_allocation_is_deterministic(servers in pool(), requests in batch()) {
        let mut a_servers = servers.clone();
        let mut a_requests = requests.clone();
        let a = allocate(&mut a_servers, &mut a_requests);

        let mut b_servers = servers;
        let mut b_requests = requests;
        let b = allocate(&mut b_servers, &mut b_requests);

        prop_assert_eq!(a, b);
        prop_assert_eq!(a_servers, b_servers);
        prop_assert_eq!(a_requests, b_requests);
    }

    #[test]
    fn prop_requests_left_in_descending_intensity(mut servers in pool(), mut requests in batch()) {
        allocate(&mut servers, &mut requests);
        for pair in requests.windows(2) {
            prop_assert!(pair[0].intensity >= pair[1].intensity);
            if pair[0].intensity == pair[1].intensity {
                prop_assert!(pair[0].id < pair[1].id);
            }
        }
    }
}
