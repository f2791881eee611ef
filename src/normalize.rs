// src/normalize.rs

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

/// Map a free-form region label onto its canonical lowercase code.
///
/// Legacy names are rewritten (`nafta` → `na`, `row` → `mw`). Anything
/// else, including unknown labels, passes through trimmed and lowercased.
pub fn normalize_region(raw: &str) -> String {
    let lowered = clean_str(raw).to_lowercase();
    match lowered.as_str() {
        "nafta" => "na".to_string(),
        "row" => "mw".to_string(),
        _ => lowered,
    }
}
