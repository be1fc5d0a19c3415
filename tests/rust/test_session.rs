/// Integration tests for simulation sessions and end-to-end runs.
use edmsim_core::config::SimConfig;
use edmsim_core::workload::Workload;
use edmsim_core::*;

fn greedy() -> Box<dyn AllocationPolicy> {
    Box::new(GreedyHeapAllocator::new())
}

fn small_config() -> SimConfig {
    SimConfig::from_str(
        r#"
[simulation]
name = "session-test"
seed = 7
iterations = 10

[cluster]
num_servers = 4
capacity_min = 3
capacity_max = 5

[workload]
num_requests = 30
attack_ratio = 0.8
max_attack_intensity = 6
"#,
    )
    .unwrap()
}

#[test]
fn test_drain_cycle_scenario() {
    let mut session = SimulationSession::new(
        vec![EdgeServer::with_load(0, 5, 3)],
        vec![Request::benign(0)],
        SessionParams::default(),
        greedy(),
    )
    .unwrap();

    session.process_requests();
    assert_eq!(session.servers()[0].current_load, 2);
    assert_eq!(session.counters().total_processed_requests, 1);

    session.process_requests();
    session.process_requests();
    assert_eq!(session.servers()[0].current_load, 0);
    assert_eq!(session.counters().total_processed_requests, 3);
}

#[test]
fn test_configuration_errors_fail_before_allocation() {
    let config = small_config();
    let empty_pool = Workload {
        servers: vec![],
        requests: vec![Request::attack(0, 1)],
    };
    assert_eq!(
        run_workload(&config, empty_pool, greedy()).unwrap_err(),
        SessionError::NoServers
    );

    let zero_capacity = Workload {
        servers: vec![EdgeServer::new(0, 0), EdgeServer::new(1, 0)],
        requests: vec![Request::attack(0, 1)],
    };
    assert_eq!(
        run_workload(&config, zero_capacity, greedy()).unwrap_err(),
        SessionError::ZeroCapacity
    );
}

#[test]
fn test_run_report_consistency() {
    let config = small_config();
    let report = run_simulation(&config).unwrap();

    assert_eq!(report.name, "session-test");
    assert_eq!(report.seed, Some(7));
    assert_eq!(report.num_servers, 4);
    assert_eq!(report.num_requests, 30);
    assert_eq!(report.final_loads.len(), 4);

    // One tick drains at most one unit per server.
    assert!(report.counters.total_processed_requests <= 4);
    assert!((1..=1000).contains(&report.equilibrium.iterations));

    let expected_throughput = report.counters.total_processed_requests as f64 / 10.0;
    approx::assert_relative_eq!(report.metrics.throughput, expected_throughput);
    let expected_latency = report.counters.extra_service_latency as f64 / 30.0;
    approx::assert_relative_eq!(report.metrics.average_latency, expected_latency);
}

#[test]
fn test_identical_inputs_identical_reports() {
    let config = small_config();
    assert_eq!(run_simulation(&config).unwrap(), run_simulation(&config).unwrap());
}

#[test]
fn test_hmax_is_inert() {
    let mut a = small_config();
    a.simulation.hmax = 1;
    let mut b = small_config();
    b.simulation.hmax = 99;

    let mut ra = run_simulation(&a).unwrap();
    let rb = run_simulation(&b).unwrap();
    assert_eq!(ra.hmax, 1);
    assert_eq!(rb.hmax, 99);
    ra.hmax = rb.hmax;
    assert_eq!(ra, rb);
}

#[test]
fn test_escalation_applies_before_allocation() {
    let mut config = small_config();
    config.simulation.escalation_steps = 2;
    let workload = Workload {
        servers: vec![EdgeServer::new(0, 10)],
        requests: vec![Request::attack(0, 2), Request::benign(1)],
    };

    let report = run_workload(&config, workload, greedy()).unwrap();

    // Attack escalated 2 -> 4, benign untouched; both admitted.
    assert_eq!(report.counters.mitigation_cost, 4);
    assert_eq!(report.counters.extra_service_latency, 0);
}

#[test]
fn test_format_report_contains_required_lines() {
    let report = run_simulation(&small_config()).unwrap();
    let text = metrics::format_report(&report);
    for label in [
        "Mitigation Cost:",
        "Extra Service Latency:",
        "iterations",
        "Throughput:",
        "Average Latency:",
        "Load:",
    ] {
        assert!(text.contains(label), "missing {:?} in report", label);
    }
}
