//! Timezone option list for the settings surface.
//!
//! Built from the IANA database shipped with chrono-tz, with a synthetic
//! "Device Timezone" entry pinned first. The stored `timezone` field is
//! treated as an opaque id everywhere else; it only affects how the operator
//! picks the target instant.

use chrono::{DateTime, Offset, Utc};
use serde::Serialize;

use crate::settings::DEVICE_TIMEZONE;

/// One dropdown entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimezoneOption {
    pub id: String,
    pub label: String,
    pub offset: String,
    pub offset_minutes: i32,
}

/// All selectable timezones, sorted by UTC offset then label, with the
/// device entry pinned first. Offsets are evaluated at `now`, so DST is
/// reflected in both the sort order and the offset captions.
pub fn timezone_options(now: DateTime<Utc>) -> Vec<TimezoneOption> {
    let mut options: Vec<TimezoneOption> = chrono_tz::TZ_VARIANTS
        .iter()
        .map(|tz| {
            let offset_minutes = now.with_timezone(tz).offset().fix().local_minus_utc() / 60;
            TimezoneOption {
                id: tz.name().to_string(),
                label: format_label(tz.name()),
                offset: format_offset(offset_minutes),
                offset_minutes,
            }
        })
        .collect();

    options.sort_by(|a, b| {
        a.offset_minutes
            .cmp(&b.offset_minutes)
            .then_with(|| a.label.cmp(&b.label))
    });

    options.insert(
        0,
        TimezoneOption {
            id: DEVICE_TIMEZONE.to_string(),
            label: "Device Timezone".to_string(),
            offset: String::new(),
            offset_minutes: 0,
        },
    );

    options
}

/// `America/Argentina/Buenos_Aires` -> `Argentina / Buenos Aires`.
fn format_label(name: &str) -> String {
    match name.split_once('/') {
        Some((_, rest)) => rest.replace('/', " / ").replace('_', " "),
        None => name.to_string(),
    }
}

/// `-210` -> `(UTC-03:30)`.
fn format_offset(offset_minutes: i32) -> String {
    let sign = if offset_minutes >= 0 { '+' } else { '-' };
    let abs = offset_minutes.unsigned_abs();
    format!("(UTC{}{:02}:{:02})", sign, abs / 60, abs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_entry_is_pinned_first() {
        let options = timezone_options(Utc::now());
        assert_eq!(options[0].id, "device");
        assert_eq!(options[0].label, "Device Timezone");
        assert!(options.len() > 400);
    }

    #[test]
    fn test_sorted_by_offset_then_label() {
        let options = timezone_options(Utc::now());
        for pair in options[1..].windows(2) {
            let ordered = pair[0].offset_minutes < pair[1].offset_minutes
                || (pair[0].offset_minutes == pair[1].offset_minutes
                    && pair[0].label <= pair[1].label);
            assert!(
                ordered,
                "{} ({}) sorted after {} ({})",
                pair[0].label, pair[0].offset_minutes, pair[1].label, pair[1].offset_minutes
            );
        }
    }

    #[test]
    fn test_utc_has_zero_offset() {
        let options = timezone_options(Utc::now());
        let utc = options.iter().find(|o| o.id == "UTC").unwrap();
        assert_eq!(utc.offset_minutes, 0);
        assert_eq!(utc.offset, "(UTC+00:00)");
    }

    #[test]
    fn test_label_formatting() {
        assert_eq!(
            format_label("America/Argentina/Buenos_Aires"),
            "Argentina / Buenos Aires"
        );
        assert_eq!(format_label("Europe/Oslo"), "Oslo");
        assert_eq!(format_label("UTC"), "UTC");
    }

    #[test]
    fn test_offset_formatting() {
        assert_eq!(format_offset(0), "(UTC+00:00)");
        assert_eq!(format_offset(120), "(UTC+02:00)");
        assert_eq!(format_offset(-210), "(UTC-03:30)");
    }
}
