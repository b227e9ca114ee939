//! Countdown configuration record.
//!
//! One record per device/install, persisted field-by-field in the settings
//! store under the wire keys in [`keys`]. The settings surface writes fields;
//! the render surface only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rendering strategy for the countdown display. Closed set, dispatched by
/// tag; purely a rendering concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStyle {
    Digital,
    Flip,
    Circular,
    Blocks,
}

/// How the human-readable "completes at" label is derived. Not used in
/// timing math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionMode {
    Calculated,
    Provided,
    Preview,
}

/// What appears once the countdown reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionContent {
    RichText,
    Media,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    Default,
    Solid,
    Media,
}

/// Which time units are shown. All-false is accepted and degrades to an
/// empty display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleUnits {
    pub days: bool,
    pub hours: bool,
    pub minutes: bool,
    pub seconds: bool,
}

impl Default for VisibleUnits {
    fn default() -> Self {
        Self {
            days: true,
            hours: true,
            minutes: true,
            seconds: true,
        }
    }
}

/// Display captions, one per unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitLabels {
    pub days: String,
    pub hours: String,
    pub minutes: String,
    pub seconds: String,
}

impl Default for UnitLabels {
    fn default() -> Self {
        Self {
            days: "DAYS".to_string(),
            hours: "HOURS".to_string(),
            minutes: "MINUTES".to_string(),
            seconds: "SECONDS".to_string(),
        }
    }
}

/// Sentinel timezone id meaning "use the viewing device's local zone".
pub const DEVICE_TIMEZONE: &str = "device";

/// Wire/storage keys for every persisted field.
pub mod keys {
    pub const TARGET_DATE_TIME: &str = "targetDateTime";
    pub const TIMEZONE: &str = "timezone";
    pub const DISPLAY_STYLE: &str = "displayStyle";
    pub const VISIBLE_UNITS: &str = "visibleUnits";
    pub const UNIT_LABELS: &str = "unitLabels";
    pub const TITLE_TEXT: &str = "titleText";
    pub const CTA_TEXT: &str = "ctaText";
    pub const COMPLETION_MODE: &str = "completionMode";
    pub const COMPLETION_LABEL: &str = "completionLabel";
    pub const COMPLETION_DURATION_MS: &str = "completionDurationMs";
    pub const COMPLETION_CONTENT_TYPE: &str = "completionContentType";
    pub const COMPLETION_RICH_TEXT: &str = "completionRichText";
    pub const COMPLETION_MEDIA_ID: &str = "completionMediaId";
    pub const PRIMARY_COLOR: &str = "primaryColor";
    pub const SECONDARY_COLOR: &str = "secondaryColor";
    pub const BACKGROUND_TYPE: &str = "backgroundType";
    pub const BACKGROUND_COLOR: &str = "backgroundColor";
    pub const BACKGROUND_MEDIA_ID: &str = "backgroundMediaId";
    pub const BACKGROUND_OPACITY: &str = "backgroundOpacity";

    /// All persisted keys, in hydration order.
    pub const ALL: &[&str] = &[
        TARGET_DATE_TIME,
        TIMEZONE,
        DISPLAY_STYLE,
        VISIBLE_UNITS,
        UNIT_LABELS,
        TITLE_TEXT,
        CTA_TEXT,
        COMPLETION_MODE,
        COMPLETION_LABEL,
        COMPLETION_DURATION_MS,
        COMPLETION_CONTENT_TYPE,
        COMPLETION_RICH_TEXT,
        COMPLETION_MEDIA_ID,
        PRIMARY_COLOR,
        SECONDARY_COLOR,
        BACKGROUND_TYPE,
        BACKGROUND_COLOR,
        BACKGROUND_MEDIA_ID,
        BACKGROUND_OPACITY,
    ];
}

/// The full configuration record.
///
/// `null` persisted values are meaningful for the `Option` fields and are
/// not the same as "never set".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownSettings {
    pub target_date_time: Option<DateTime<Utc>>,
    pub timezone: String,
    pub display_style: DisplayStyle,
    pub visible_units: VisibleUnits,
    pub unit_labels: UnitLabels,
    pub title_text: String,
    pub cta_text: String,
    pub completion_mode: CompletionMode,
    pub completion_label: Option<String>,
    pub completion_duration_ms: u64,
    pub completion_content_type: CompletionContent,
    pub completion_rich_text: String,
    pub completion_media_id: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub background_type: BackgroundType,
    pub background_color: String,
    pub background_media_id: Option<String>,
    pub background_opacity: f64,
}

impl Default for CountdownSettings {
    fn default() -> Self {
        Self {
            target_date_time: None,
            timezone: DEVICE_TIMEZONE.to_string(),
            display_style: DisplayStyle::Flip,
            visible_units: VisibleUnits::default(),
            unit_labels: UnitLabels::default(),
            title_text: "New Year's Eve Countdown".to_string(),
            cta_text: "Join us for the celebration!".to_string(),
            completion_mode: CompletionMode::Provided,
            completion_label: None,
            completion_duration_ms: 0,
            completion_content_type: CompletionContent::RichText,
            completion_rich_text: "The countdown has ended!".to_string(),
            completion_media_id: None,
            primary_color: "#F8B334".to_string(),
            secondary_color: "#C9C1B1".to_string(),
            background_type: BackgroundType::Default,
            background_color: "#1a1d2e".to_string(),
            background_media_id: None,
            background_opacity: 1.0,
        }
    }
}

impl CountdownSettings {
    /// Default JSON value for a field, used for hydration and for
    /// type-mismatch fallback. Returns `None` for unknown keys.
    pub fn default_value(key: &str) -> Option<Value> {
        let d = Self::default();
        let v = match key {
            keys::TARGET_DATE_TIME => json(&d.target_date_time),
            keys::TIMEZONE => json(&d.timezone),
            keys::DISPLAY_STYLE => json(&d.display_style),
            keys::VISIBLE_UNITS => json(&d.visible_units),
            keys::UNIT_LABELS => json(&d.unit_labels),
            keys::TITLE_TEXT => json(&d.title_text),
            keys::CTA_TEXT => json(&d.cta_text),
            keys::COMPLETION_MODE => json(&d.completion_mode),
            keys::COMPLETION_LABEL => json(&d.completion_label),
            keys::COMPLETION_DURATION_MS => json(&d.completion_duration_ms),
            keys::COMPLETION_CONTENT_TYPE => json(&d.completion_content_type),
            keys::COMPLETION_RICH_TEXT => json(&d.completion_rich_text),
            keys::COMPLETION_MEDIA_ID => json(&d.completion_media_id),
            keys::PRIMARY_COLOR => json(&d.primary_color),
            keys::SECONDARY_COLOR => json(&d.secondary_color),
            keys::BACKGROUND_TYPE => json(&d.background_type),
            keys::BACKGROUND_COLOR => json(&d.background_color),
            keys::BACKGROUND_MEDIA_ID => json(&d.background_media_id),
            keys::BACKGROUND_OPACITY => json(&d.background_opacity),
            _ => return None,
        };
        Some(v)
    }

    /// Assemble the record from per-field lookups.
    ///
    /// Absent or malformed persisted values fall back to the field default so
    /// schema drift never propagates a parse error into the render path.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<Value>,
    {
        let d = Self::default();
        Self {
            target_date_time: field(&lookup, keys::TARGET_DATE_TIME, d.target_date_time),
            timezone: field(&lookup, keys::TIMEZONE, d.timezone),
            display_style: field(&lookup, keys::DISPLAY_STYLE, d.display_style),
            visible_units: field(&lookup, keys::VISIBLE_UNITS, d.visible_units),
            unit_labels: field(&lookup, keys::UNIT_LABELS, d.unit_labels),
            title_text: field(&lookup, keys::TITLE_TEXT, d.title_text),
            cta_text: field(&lookup, keys::CTA_TEXT, d.cta_text),
            completion_mode: field(&lookup, keys::COMPLETION_MODE, d.completion_mode),
            completion_label: field(&lookup, keys::COMPLETION_LABEL, d.completion_label),
            completion_duration_ms: field(
                &lookup,
                keys::COMPLETION_DURATION_MS,
                d.completion_duration_ms,
            ),
            completion_content_type: field(
                &lookup,
                keys::COMPLETION_CONTENT_TYPE,
                d.completion_content_type,
            ),
            completion_rich_text: field(&lookup, keys::COMPLETION_RICH_TEXT, d.completion_rich_text),
            completion_media_id: field(&lookup, keys::COMPLETION_MEDIA_ID, d.completion_media_id),
            primary_color: field(&lookup, keys::PRIMARY_COLOR, d.primary_color),
            secondary_color: field(&lookup, keys::SECONDARY_COLOR, d.secondary_color),
            background_type: field(&lookup, keys::BACKGROUND_TYPE, d.background_type),
            background_color: field(&lookup, keys::BACKGROUND_COLOR, d.background_color),
            background_media_id: field(&lookup, keys::BACKGROUND_MEDIA_ID, d.background_media_id),
            background_opacity: field(&lookup, keys::BACKGROUND_OPACITY, d.background_opacity),
        }
    }
}

fn json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn field<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<Value>,
    T: serde::de::DeserializeOwned,
{
    match lookup(key) {
        Some(v) => serde_json::from_value(v).unwrap_or(default),
        None => default,
    }
}

/// Validate and normalize a field write coming from the settings surface.
///
/// Unknown keys and type mismatches are rejected; `backgroundOpacity` is
/// clamped into [0, 1] rather than rejected.
pub fn validate_field(key: &str, value: Value) -> Result<Value, String> {
    fn check<T: serde::de::DeserializeOwned>(key: &str, value: Value) -> Result<Value, String> {
        serde_json::from_value::<T>(value.clone())
            .map(|_| value)
            .map_err(|e| format!("invalid value for {}: {}", key, e))
    }

    match key {
        keys::TARGET_DATE_TIME => check::<Option<DateTime<Utc>>>(key, value),
        keys::TIMEZONE => check::<String>(key, value),
        keys::DISPLAY_STYLE => check::<DisplayStyle>(key, value),
        keys::VISIBLE_UNITS => check::<VisibleUnits>(key, value),
        keys::UNIT_LABELS => check::<UnitLabels>(key, value),
        keys::TITLE_TEXT => check::<String>(key, value),
        keys::CTA_TEXT => check::<String>(key, value),
        keys::COMPLETION_MODE => check::<CompletionMode>(key, value),
        keys::COMPLETION_LABEL => check::<Option<String>>(key, value),
        keys::COMPLETION_DURATION_MS => check::<u64>(key, value),
        keys::COMPLETION_CONTENT_TYPE => check::<CompletionContent>(key, value),
        keys::COMPLETION_RICH_TEXT => check::<String>(key, value),
        keys::COMPLETION_MEDIA_ID => check::<Option<String>>(key, value),
        keys::PRIMARY_COLOR => check::<String>(key, value),
        keys::SECONDARY_COLOR => check::<String>(key, value),
        keys::BACKGROUND_TYPE => check::<BackgroundType>(key, value),
        keys::BACKGROUND_COLOR => check::<String>(key, value),
        keys::BACKGROUND_MEDIA_ID => check::<Option<String>>(key, value),
        keys::BACKGROUND_OPACITY => {
            let opacity: f64 = serde_json::from_value(value)
                .map_err(|e| format!("invalid value for {}: {}", key, e))?;
            Ok(Value::from(opacity.clamp(0.0, 1.0)))
        }
        _ => Err(format!("unknown settings key: {}", key)),
    }
}
