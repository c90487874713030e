// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::Duration;

/// Render an age as "{days}d {hours}h" for monitoring alerts.
pub fn format_age(age: Duration) -> String {
    let days = age.num_days();
    let hours = age.num_hours() - days * 24;
    format!("{}d {}h", days, hours)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::hours(50)), "2d 2h");
        assert_eq!(format_age(Duration::hours(3)), "0d 3h");
        assert_eq!(format_age(Duration::minutes(90)), "0d 1h");
    }
}
