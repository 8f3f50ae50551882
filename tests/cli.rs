use std::process::Command;

fn delaysim() -> Command {
    Command::new(env!("CARGO_BIN_EXE_delaysim"))
}

#[test]
fn rejects_too_many_wifi_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let output = delaysim()
        .args(["wifi", "--n-wifi", "19", "--output-dir"])
        .arg(&out)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Number of wifi nodes 19 specified exceeds the mobility bounding box (18 max)"),
        "{}",
        stderr,
    );
    assert!(!out.exists());
}

#[test]
fn rejects_too_many_cells() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let output = delaysim()
        .args(["lte", "--nodes", "3", "--output-dir"])
        .arg(&out)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(!out.exists());
}

#[test]
fn wifi_run_writes_its_files() {
    let dir = tempfile::tempdir().unwrap();
    let output = delaysim()
        .args(["wifi", "--no-verbose", "--output-dir"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(dir.path().join("wireless-animation.xml").exists());
    assert!(dir.path().join("third-0-0.pcap").exists());
}

#[test]
fn summarizes_a_flow_monitor_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flows.xml");
    std::fs::write(&path, r#"<?xml version="1.0"?>
<FlowMonitor>
  <FlowStats>
    <Flow flowId="1" timeFirstTxPacket="+0ns" timeFirstRxPacket="+1000000000ns" timeLastTxPacket="+0ns"
          timeLastRxPacket="+2000000000ns" delaySum="+20000000ns" jitterSum="+0ns" txBytes="2000"
          txPackets="2" rxBytes="2000" rxPackets="2" lostPackets="1" timesForwarded="0"/>
  </FlowStats>
  <Ipv4FlowClassifier>
    <Flow flowId="1" sourceAddress="10.1.3.3" destinationAddress="10.1.2.4" protocol="17" sourcePort="49153" destinationPort="9"/>
  </Ipv4FlowClassifier>
</FlowMonitor>
"#).unwrap();

    let output = delaysim().arg("summarize").arg(&path).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("16 kbit/s"), "{}", stdout);
    assert!(stdout.contains("0.010000 s"), "{}", stdout);
    assert!(stdout.ends_with("1 flows, 1 packets lost\n"), "{}", stdout);
}

#[test]
fn summarize_reports_bad_documents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flows.xml");
    std::fs::write(&path, "<NotAFlowMonitor/>").unwrap();
    let output = delaysim().arg("summarize").arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn summarize_rejects_oversized_histograms() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flows.xml");
    std::fs::write(&path, r#"<?xml version="1.0"?>
<FlowMonitor>
  <FlowStats>
    <Flow flowId="1" txBytes="0" txPackets="0" rxBytes="0" rxPackets="0" lostPackets="0" timesForwarded="0">
      <delayHistogram nBins="18446744073709551615"/>
    </Flow>
  </FlowStats>
</FlowMonitor>
"#).unwrap();

    let output = delaysim().arg("summarize").arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nBins"), "{}", stderr);
}
