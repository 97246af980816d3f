//! Task identifier normalization
//!
//! Task IDs are stored and looked up in a single canonical form: lower-case
//! words joined by `-`. Word boundaries are any non-alphanumeric character and
//! case transitions, so `BuildProject`, `build_project` and `build project`
//! all normalize to `build-project`.

/// Normalize arbitrary task-name text into a canonical task ID
pub fn normalize_id(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut id = String::with_capacity(text.len() + 4);
    let mut boundary = false;

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            boundary = true;
            continue;
        }

        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map_or(false, |n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower)
            {
                boundary = true;
            }
        }

        if boundary && !id.is_empty() {
            id.push('-');
        }
        boundary = false;
        id.extend(c.to_lowercase());
    }

    id
}
