//! Access log format module
//!
//! Supports multiple log formats:
//! - `combined` (Apache/Nginx combined format)
//! - `common` (Common Log Format - CLF)
//! - `json` (one JSON object per line)
//! - Custom patterns with `$variable` substitution

use chrono::{DateTime, Local};
use serde_json::json;

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// One served request
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    pub time: DateTime<Local>,
    pub method: String,
    pub path: String,
    /// Query string (without leading ?)
    pub query: Option<String>,
    pub http_version: String,
    pub status: u16,
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    /// Time spent in dispatch, microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Create an entry stamped with the current time
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            query: None,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            request_time_us: 0,
        }
    }

    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => format!(
                "{} \"{}\" \"{}\"",
                self.format_common(),
                self.referer.as_deref().unwrap_or("-"),
                self.user_agent.as_deref().unwrap_or("-"),
            ),
            "common" => self.format_common(),
            "json" => self.format_json(),
            pattern => self.format_custom(pattern),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    fn request_line(&self) -> String {
        format!("{} {} HTTP/{}", self.method, self.request_uri(), self.http_version)
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format(CLF_TIME),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    fn format_json(&self) -> String {
        json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "path": self.path,
            "query": self.query,
            "http_version": self.http_version,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables: `$remote_addr`, `$time_local`, `$time_iso8601`,
    /// `$request`, `$request_method`, `$request_uri`, `$request_time`
    /// (seconds, 3 decimals), `$status`, `$body_bytes_sent`, `$http_referer`,
    /// `$http_user_agent`.
    fn format_custom(&self, pattern: &str) -> String {
        #[allow(clippy::cast_precision_loss)]
        let request_time = format!("{:.3}", self.request_time_us as f64 / 1_000_000.0);

        // Longer names first so `$request` does not eat `$request_time`
        let vars: [(&str, String); 11] = [
            ("$remote_addr", self.remote_addr.clone()),
            ("$time_local", self.time.format(CLF_TIME).to_string()),
            ("$time_iso8601", self.time.to_rfc3339()),
            ("$request_method", self.method.clone()),
            ("$request_time", request_time),
            ("$request_uri", self.request_uri()),
            ("$request", self.request_line()),
            ("$status", self.status.to_string()),
            ("$body_bytes_sent", self.body_bytes.to_string()),
            ("$http_referer", self.referer.clone().unwrap_or_else(|| "-".to_string())),
            (
                "$http_user_agent",
                self.user_agent.clone().unwrap_or_else(|| "-".to_string()),
            ),
        ];

        vars.iter()
            .fold(pattern.to_string(), |line, (name, value)| line.replace(name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "10.0.0.7".to_string(),
            "GET".to_string(),
            "/getUserInfo".to_string(),
        );
        entry.query = Some("id=1&name=thomas".to_string());
        entry.status = 200;
        entry.body_bytes = 31;
        entry.user_agent = Some("curl/8.5".to_string());
        entry.request_time_us = 1_250_000;
        entry
    }

    #[test]
    fn test_format_common() {
        let line = entry().format("common");
        assert!(line.starts_with("10.0.0.7 - - ["));
        assert!(line.ends_with("\"GET /getUserInfo?id=1&name=thomas HTTP/1.1\" 200 31"));
    }

    #[test]
    fn test_format_combined_adds_referer_and_agent() {
        let line = entry().format("combined");
        assert!(line.ends_with("200 31 \"-\" \"curl/8.5\""));
    }

    #[test]
    fn test_format_json() {
        let line = entry().format("json");
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["status"], 200);
        assert_eq!(value["query"], "id=1&name=thomas");
        assert_eq!(value["referer"], serde_json::Value::Null);
    }

    #[test]
    fn test_format_custom() {
        let line = entry().format("$request_method $request_uri $status $request_time");
        assert_eq!(line, "GET /getUserInfo?id=1&name=thomas 200 1.250");
    }
}
