fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use rigprobe_discovery::{EndpointCandidate, JobOutcome, aggregate};
    use rigprobe_miner_api::{Device, QueryError, ccminer, cgminer};
    use rigprobe_protocol::{DiscoveryData, Family, ProbeMessage};
    use serde::Deserialize;

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn load_bytes(name: &str) -> Vec<u8> {
        let path = fixtures_dir().join(name);
        fs::read(&path).unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a daemon response the way it arrives on the wire: cgminer
    /// terminates its JSON with a NUL byte.
    fn load_response(name: &str) -> Vec<u8> {
        let mut bytes = load_bytes(name);
        bytes.push(0);
        bytes
    }

    fn load_json(name: &str) -> serde_json::Value {
        serde_json::from_slice(&load_bytes(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    fn endpoint(tag: &str, port: u16) -> EndpointCandidate {
        EndpointCandidate {
            tag: tag.into(),
            port,
            source: "192.168.1.10:4027".parse().unwrap(),
        }
    }

    // -----------------------------------------------------------------------
    // Daemon responses
    // -----------------------------------------------------------------------

    #[test]
    fn cgminer_asic_devs() {
        let devices = cgminer::parse_devs(&load_response("cgminer_devs_asic.json")).unwrap();
        assert_eq!(devices.len(), 2);

        let d = &devices[0];
        assert_eq!(d.id, 0);
        assert_eq!(d.name, "BTM");
        assert_eq!(d.enabled, Some(true));
        assert_eq!(d.status.as_deref(), Some("Alive"));
        assert_eq!(d.temperature, 62.0);
        assert_eq!(d.hashrate, 1_302_500_000.0);
        assert_eq!(d.hashrate_avg, 1_250_250_000.0);
        assert_eq!(d.accepted, 76800.0);
        assert_eq!(d.rejected, 0.9901);
        assert_eq!(d.hardware_errors, 7);
        assert_eq!(d.last_share_difficulty, Some(64.0));

        let d = &devices[1];
        assert_eq!(d.id, 1);
        assert_eq!(d.enabled, Some(false));
        assert_eq!(d.status.as_deref(), Some("Dead"));
        assert_eq!(d.hashrate, 0.0);
    }

    #[test]
    fn sgminer_gpu_devs() {
        let devices = cgminer::parse_devs(&load_response("sgminer_devs_gpu.json")).unwrap();
        assert_eq!(devices.len(), 1);

        let d = &devices[0];
        assert_eq!(d.id, 0);
        assert!(d.name.is_empty());
        assert_eq!(d.display_name("cgminer"), "cgminer 0");
        assert_eq!(d.frequency, 1050.0);
        // KH/s wins over MH/s when positive.
        assert_eq!(d.hashrate, 520_000.0);
        assert_eq!(d.hashrate_avg, 512_000.0);
        assert_eq!(d.rejected, 1.5);
    }

    #[test]
    fn cgminer_status_error() {
        let err = cgminer::parse_devs(&load_response("cgminer_error.json")).unwrap_err();
        match err {
            QueryError::Api(msg) => assert_eq!(msg, "Invalid command"),
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn ccminer_threads() {
        let devices = ccminer::parse_threads(&load_bytes("ccminer_threads.txt")).unwrap();
        assert_eq!(devices.len(), 2);

        let d = &devices[0];
        assert_eq!(d.id, 0);
        assert_eq!(d.name, "GeForce GTX 1060 6GB");
        assert_eq!(d.temperature, 61.0);
        assert_eq!(d.frequency, 1911.0);
        assert_eq!(d.hashrate, 22_735_500.0);
        assert_eq!(d.accepted, 37.0);
        assert_eq!(d.rejected, 1.0);
        assert_eq!(d.enabled, None);
        assert_eq!(d.status, None);

        let d = &devices[1];
        assert_eq!(d.id, 1);
        assert_eq!(d.hashrate, 30_100_250.0);
        assert_eq!(d.hardware_errors, 2);
    }

    // -----------------------------------------------------------------------
    // Probe datagrams
    // -----------------------------------------------------------------------

    #[derive(Deserialize)]
    struct DatagramCase {
        payload: String,
        tag: Option<String>,
        port: Option<u16>,
    }

    #[test]
    fn probe_datagrams() {
        let cases: Vec<DatagramCase> = serde_json::from_value(load_json("probe_datagrams.json")).unwrap();
        assert!(!cases.is_empty());

        for case in cases {
            let decoded = ProbeMessage::decode(case.payload.as_bytes());
            match (case.tag, case.port) {
                (Some(tag), Some(port)) => {
                    let msg = decoded
                        .unwrap_or_else(|e| panic!("{:?} should decode: {e}", case.payload));
                    assert_eq!(msg.tag, tag, "tag of {:?}", case.payload);
                    assert_eq!(msg.port, port, "port of {:?}", case.payload);
                }
                _ => assert!(decoded.is_err(), "{:?} should be rejected", case.payload),
            }
        }
    }

    #[test]
    fn probe_encoding() {
        for family in [Family::Cgminer, Family::Ccminer] {
            for tag in family.probe_tags() {
                let probe = ProbeMessage::new(*tag, family.report_port());
                let text = String::from_utf8(probe.encode()).unwrap();
                assert_eq!(text, format!("{tag}-FTW-{}", family.report_port()));
            }
        }
    }

    // -----------------------------------------------------------------------
    // LLD document
    // -----------------------------------------------------------------------

    fn fixture_outcomes() -> Vec<JobOutcome<EndpointCandidate, Vec<Device>, QueryError>> {
        let asic = cgminer::parse_devs(&load_response("cgminer_devs_asic.json")).unwrap();
        let gpu = cgminer::parse_devs(&load_response("sgminer_devs_gpu.json")).unwrap();
        let cuda = ccminer::parse_threads(&load_bytes("ccminer_threads.txt")).unwrap();

        // Listed in the order the queries completed.
        vec![
            JobOutcome { input: endpoint("cgminer", 4028), result: Ok(asic) },
            JobOutcome { input: endpoint("sgminer", 4029), result: Ok(gpu) },
            JobOutcome { input: endpoint("ccminer", 4068), result: Ok(cuda) },
        ]
    }

    #[test]
    fn lld_document_matches_fixture() {
        let report = aggregate(Family::Cgminer, fixture_outcomes());
        assert_eq!(report.summary.attempted, 3);
        assert_eq!(report.summary.succeeded, 3);

        let produced: serde_json::Value =
            serde_json::from_str(&report.data.to_json().unwrap()).unwrap();
        assert_eq!(produced, load_json("lld_devices.json"));
    }

    #[test]
    fn lld_document_parses_back() {
        let text = String::from_utf8(load_bytes("lld_devices.json")).unwrap();
        let data = DiscoveryData::from_json(&text).unwrap();
        assert_eq!(data.len(), 5);
        assert_eq!(data.items()[3].get("NAME"), Some("GeForce GTX 1060 6GB"));

        let expected = aggregate(Family::Cgminer, fixture_outcomes()).data;
        assert_eq!(data, expected);
    }

    #[test]
    fn lld_escapes_names() {
        let mut data = DiscoveryData::new();
        let item = rigprobe_protocol::DiscoveryItem::new().with("NAME", r#"rig "A" \ 1"#);
        data.push(item);

        let json = data.to_json().unwrap();
        assert_eq!(json, r#"{"data":[{"{#NAME}":"rig \"A\" \\ 1"}]}"#);
        assert_eq!(DiscoveryData::from_json(&json).unwrap(), data);
    }
}
