use std::time::{SystemTime, UNIX_EPOCH};
use regex::Regex;

pub fn new_run_id(site: &str) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    format!("run_{}_{}", sanitize_site(site), timestamp)
}

// Site names come from user input and directory basenames; keep them filename-safe.
fn sanitize_site(site: &str) -> String {
    let re = Regex::new(r"[^a-zA-Z0-9\-_\.]").unwrap();
    re.replace_all(site, "_").to_string()
}
