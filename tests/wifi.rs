use delaysim::config::WifiConfig;
use delaysim::scenario::wifi;
use delaysim::ConfigError;
use delaysim::ScenarioError;

#[test]
fn echo_comes_back() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let config = WifiConfig {
        output_dir: dir.path().to_owned(),
        ..WifiConfig::default()
    };
    let outcome = wifi::run(&config).unwrap();

    let client = outcome.echo_client().unwrap();
    assert_eq!(client.sent(), 1);
    assert_eq!(client.received(), 1);
    assert_eq!(outcome.echo_server().unwrap().echoed(), 1);

    for name in ["third-0-0.pcap", "third-0-1.pcap", "third-1-0.pcap", "third-1-1.pcap", wifi::ANIMATION_FILE] {
        let path = dir.path().join(name);
        assert!(outcome.files.contains(&path), "{} not reported", name);
        assert!(path.exists(), "{} is missing", name);
    }
}

#[test]
fn full_bounding_box() {
    let dir = tempfile::tempdir().unwrap();
    let config = WifiConfig {
        n_wifi: wifi::station_capacity(),
        n_csma: 1,
        output_dir: dir.path().to_owned(),
        ..WifiConfig::default()
    };
    let outcome = wifi::run(&config).unwrap();
    assert_eq!(outcome.echo_client().unwrap().received(), 1);
    for node in outcome.sim.nodes() {
        if node.name().starts_with("sta-") {
            let position = node.position();
            assert!(position.x <= 50.0 && position.y <= 50.0, "{:?}", position);
        }
    }
}

#[test]
fn too_many_stations_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let config = WifiConfig {
        n_wifi: 19,
        output_dir: out.clone(),
        ..WifiConfig::default()
    };
    match wifi::run(&config) {
        Err(ScenarioError::Config(ConfigError::TooManyNodes { requested: 19, capacity: 18, .. })) => (),
        res => panic!("unexpected result {:?}", res.map(|outcome| outcome.run)),
    }
    assert!(!out.exists());
}
