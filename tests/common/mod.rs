#![allow(dead_code)]

use serde_json::{json, Value};
use site_audit::config::AuditConfig;

pub const API_PATH: &str = "/pagespeedonline/v5/runPagespeed";

/// Config pointing the client at a mock server
pub fn config_for(server_url: &str) -> AuditConfig {
    AuditConfig {
        endpoint: format!("{}{}", server_url, API_PATH),
        request_timeout_secs: 5,
        ..AuditConfig::default()
    }
}

/// PageSpeed response with kebab-case category keys
pub fn lighthouse_body(performance: f64) -> String {
    json!({
        "kind": "pagespeedonline#result",
        "lighthouseResult": {
            "categories": {
                "performance": { "score": performance },
                "accessibility": { "score": 0.92 },
                "best-practices": { "score": 1.0 },
                "seo": { "score": 0.9 }
            },
            "audits": {
                "first-contentful-paint": { "displayValue": "0.9 s", "score": 0.98 },
                "largest-contentful-paint": { "displayValue": "1.4 s", "score": 0.97 },
                "total-blocking-time": { "displayValue": "20 ms", "score": 1 }
            }
        }
    })
    .to_string()
}

/// Google API error envelope
pub fn error_body(code: u16, message: &str) -> String {
    let body: Value = json!({ "error": { "code": code, "message": message } });
    body.to_string()
}
