use std::process::{Command, Output};

fn run_simulation(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_city_parking"))
        .args(args)
        .env("RUST_LOG", "warn,city_parking=info")
        .output()
        .expect("Failed to execute simulation")
}

/// Test that the simulation runs headless and streams one snapshot per tick
#[test]
fn test_headless_simulation_runs() {
    let output = run_simulation(&["--ticks", "30", "--seed", "3"]);

    assert!(
        output.status.success(),
        "Simulation failed to run. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let steps: Vec<u64> = stdout
        .lines()
        .map(|line| {
            let snapshot: serde_json::Value =
                serde_json::from_str(line).expect("each line is a JSON snapshot");
            assert!(snapshot["cars"].is_array());
            snapshot["step"].as_u64().expect("step is a number")
        })
        .collect();

    assert!(!steps.is_empty(), "No snapshots written");
    assert!(steps.len() <= 30);
    for (expected, step) in (1..).zip(&steps) {
        assert_eq!(*step, expected);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
}

/// Test that simulation statistics are logged
#[test]
fn test_simulation_statistics_logged() {
    let output = run_simulation(&["--ticks", "20", "--seed", "3", "--cars", "5"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    for needle in ["Total cars spawned:", "Total cars parked:", "Parked rate:"] {
        assert!(stderr.contains(needle), "Missing '{}' statistic", needle);
    }

    let spawned_line = stderr
        .lines()
        .find(|line| line.contains("Total cars spawned:"))
        .expect("Could not find 'Total cars spawned' line");
    let spawned_count: u32 = spawned_line
        .split("Total cars spawned:")
        .nth(1)
        .and_then(|s| s.trim().parse().ok())
        .expect("Could not parse spawned count");
    assert_eq!(spawned_count, 5);
}

/// Test that the same seed gives the same run
#[test]
fn test_seeded_runs_match() {
    let first = run_simulation(&["--ticks", "25", "--seed", "17"]);
    let second = run_simulation(&["--ticks", "25", "--seed", "17"]);

    assert!(first.status.success() && second.status.success());
    assert_eq!(first.stdout, second.stdout);
}

/// Test that a missing map file is reported as a failure
#[test]
fn test_missing_map_fails() {
    let output = run_simulation(&["--map", "no/such/map.json", "--ticks", "5"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no/such/map.json"), "stderr: {}", stderr);
}
