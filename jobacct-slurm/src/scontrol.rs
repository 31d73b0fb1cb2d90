//! `scontrol show ... -o` parsing
//!
//! One-line output is a run of `Key=Value` tokens. Values may contain spaces
//! (`Reason=Dependency never satisfied`), so a value extends over following
//! whitespace-separated tokens until the next token that itself has a key.

use std::collections::HashMap;

/// Parse every non-empty line into a key/value map
pub fn parse_scontrol(output: &str) -> Vec<HashMap<String, String>> {
    output
        .lines()
        .map(parse_scontrol_line)
        .filter(|map| !map.is_empty())
        .collect()
}

/// Parse one `Key=Value Key=Value ...` line
pub fn parse_scontrol_line(line: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    let mut current: Option<(String, String)> = None;

    for token in line.split_whitespace() {
        match token.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                if let Some((k, v)) = current.take() {
                    map.insert(k, v);
                }
                current = Some((key.to_string(), value.to_string()));
            }
            _ => {
                if let Some((_, v)) = current.as_mut() {
                    v.push(' ');
                    v.push_str(token);
                }
            }
        }
    }

    if let Some((k, v)) = current {
        map.insert(k, v);
    }

    map
}
