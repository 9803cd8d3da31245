use win11ready::engine::{Engine, EngineOptions};
use win11ready::ingest::ProcessRequest;

const READY: &str = "Memory: System_Memory=16GB :: PASS TPM: TPMVersion=2.0,x :: PASS SecureBoot: Capable :: PASS Secure Boot is enabled :: PASS Processor: :: PASS Status : Supported Caption=Intel64 Family 6 Model 165";
const SECURE_BOOT_OFF: &str = "Memory: System_Memory=8GB :: PASS TPM: TPMVersion=2.0 :: PASS SecureBoot: Capable :: PASS Secure Boot is not enabled :: FAIL Processor: :: PASS Caption=Intel64 Family 6 Model 142";
const TOO_OLD: &str = "Memory: System_Memory=4GB :: FAIL TPM: TPMVersion=1.2 :: FAIL Processor: :: FAIL Caption=Intel64 Family 6 Model 58";

fn request() -> ProcessRequest {
    let body = serde_json::json!({
        "files": [
            {
                "name": "acme-rmm.csv",
                "type": "rmm",
                "data": [
                    { "Machine Name": "WS-01", "Friendly Name": "Front desk", "Site Name": "HQ", "Output": READY },
                    { "Machine Name": "WS-02", "Friendly Name": "", "Site Name": "HQ", "Output": "Machine was offline" },
                    { "Machine Name": "WS-03", "Friendly Name": "Lab", "Site Name": "Branch", "Output": SECURE_BOOT_OFF },
                    { "Machine Name": "WS-04", "Friendly Name": "", "Site Name": "", "Output": TOO_OLD }
                ],
                "size": 512
            },
            {
                "name": "acme-scalepad.csv",
                "type": "scalepad",
                "data": [
                    { "Name": "ws-01 ", "Serial Number": "SN-1", "Warranty Expires": "2027-05-01" },
                    { "Name": "WS-03", "Serial Number": "SN-3", "Warranty Expires": "Expired" }
                ],
                "size": 128
            }
        ],
        "companyInfo": { "name": "Acme", "site": "HQ", "tenant": "acme" }
    });
    serde_json::from_value(body).expect("parse request")
}

#[test]
fn process_response_matches_golden() {
    let engine = Engine::new(EngineOptions {
        export_csv: false,
        show_progress: false,
    });
    let response = engine.process(&request()).expect("process");
    let actual = serde_json::to_value(&response).expect("serialize response");

    let golden: serde_json::Value =
        serde_json::from_str(include_str!("golden/response.json")).expect("parse golden");
    assert_eq!(
        actual,
        golden,
        "actual:\n{}",
        serde_json::to_string_pretty(&actual).unwrap_or_default()
    );
}
