//! Browser-independent pieces of event handling.

/// Keys that activate an `svg[role=button]` like a click.
pub fn is_activation_key(key: &str) -> bool {
    matches!(key, "Enter" | " " | "Spacebar")
}

/// Minimum height for the first scroll step, so step 1 is only reached once
/// the header has scrolled away.
pub fn step_min_height(upper_height: i32) -> String {
    if upper_height < 300 {
        "350px".to_string()
    } else {
        format!("{}px", upper_height)
    }
}

/// `setTimeout` delay argument for a scheduled effect.
pub fn timeout_ms(delay_ms: u32) -> i32 {
    i32::try_from(delay_ms).unwrap_or(i32::MAX)
}
