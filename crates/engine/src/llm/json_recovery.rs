//! Tolerant JSON recovery for delta-extraction replies (spec §4.E).
//!
//! Models asked for JSON reliably wrap it in prose or code fences, or
//! leave a trailing comma behind. `recover_json` tries a fixed sequence
//! of increasingly aggressive cleanups and returns the first stage that
//! parses, so callers can keep using `serde_json::from_str` downstream.

/// Attempts to recover a parseable JSON object from `raw`. Returns the
/// cleaned text on success; the caller still has to `serde_json::from_str`
/// it into the target type.
pub fn recover_json(raw: &str) -> Result<String, String> {
    let candidates = [
        raw.to_string(),
        strip_code_fences(raw),
        extract_braces(raw),
        strip_trailing_commas(&extract_braces(raw)),
    ];

    for candidate in &candidates {
        if serde_json::from_str::<serde_json::Value>(candidate).is_ok() {
            return Ok(candidate.clone());
        }
    }

    Err(format!(
        "no recovery stage produced parseable JSON (last attempt: {})",
        candidates.last().cloned().unwrap_or_default()
    ))
}

/// Strips a leading/trailing ```` ```json ```` or ```` ``` ```` fence, if present.
fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    let rest = rest.trim_start_matches(['\r', '\n']);
    rest.strip_suffix("```").unwrap_or(rest).trim().to_string()
}

/// Slices from the first `{` to the matching last `}`, dropping any
/// leading/trailing prose ("Sure, here's the delta: {...} Let me know!").
fn extract_braces(raw: &str) -> String {
    let fenced = strip_code_fences(raw);
    let (Some(start), Some(end)) = (fenced.find('{'), fenced.rfind('}')) else {
        return fenced;
    };
    if start >= end {
        return fenced;
    }
    fenced[start..=end].to_string()
}

/// Removes a comma that precedes a closing `}` or `]`, ignoring commas
/// inside string literals.
fn strip_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        if c == '"' {
            in_string = true;
            out.push(c);
            continue;
        }

        if c == ',' {
            let mut lookahead = chars.clone();
            let mut next_non_ws = None;
            for nc in lookahead.by_ref() {
                if !nc.is_whitespace() {
                    next_non_ws = Some(nc);
                    break;
                }
            }
            if matches!(next_non_ws, Some('}') | Some(']')) {
                continue;
            }
        }

        out.push(c);
    }

    out
}
