//! SnackTrack Status Tool
//!
//! Provides runtime status information about the SnackTrack service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Tracking instructions for AI assistants
pub const TRACKING_INSTRUCTIONS: &str = r#"
# SnackTrack Instructions

SnackTrack keeps a dog's feeding log and weight history and compares what the
dog eats against its daily energy requirement.

## Daily Calorie Need

The need is never stored. It is derived from the dog's current weight and
activity level every time it is shown:

    RER  = 70 * weight_kg ^ 0.75
    need = floor(RER * activity_factor)

| activity_level | factor |
|----------------|--------|
| very_low       | 1.2    |
| low            | 1.4    |
| normal         | 1.6    |
| high           | 1.8    |
| very_high      | 2.0    |

A 10 kg dog with normal activity needs 629 kcal/day.

## Setting Up a Dog

1. `add_dog` with name, weight_kg and activity_level (birth_date as YYYY-MM-DD,
   breed, sex and target_weight_kg are optional)
2. `list_dogs` shows every dog with its current need

## Foods

Foods are stored per 100 g with the guaranteed analysis from the package label:
protein, fat, crude_fiber, raw_ash and moisture (all in g/100 g).

- Carbohydrate is derived: `100 - protein - fat - crude_fiber - raw_ash - moisture`
- Energy density (modified Atwater): `3.5*protein + 8.5*fat + 3.5*carbs` kcal/100 g
- If the label fractions add up to more than 100 g the carbohydrate becomes
  negative and the response carries a warning; double check the label

### Scanning a Barcode

1. `lookup_food_by_barcode` with the scanned digits (EAN-13, EAN-8 or UPC-A;
   spaces and dashes are ignored). UPC-A codes are stored as EAN-13 with a
   leading 0.
2. If `found` is true, use the returned food id
3. If not found, either `add_food` directly or `submit_food` to queue it for
   review (`list_food_submissions`, `review_food_submission`)

## Logging a Feeding

**Database food:** `log_food_intake` with dog_id, food_id and amount_grams.
Calories are `round(kcal_per_100g * amount_grams / 100)`.

**Anything else (treats, table scraps):** `log_manual_intake` with a name,
amount_grams and calories (> 0).

Timestamps are local time `YYYY-MM-DDTHH:MM:SS`; omit them to use now.

## Checking the Day

`daily_summary` returns consumed calories, the need and
`remaining_calories = need - consumed`. Remaining goes negative when the dog
was overfed.

## Weight

- `add_weight_entry` records a weigh-in and updates the dog's current weight
  (unless an entry with a later timestamp already exists)
- `get_weight_history` shows the change between weigh-ins and the distance to
  the target weight
- `generate_weight_report` writes a PDF with a weight chart and a per-day
  calories vs. need table

## Fixing Mistakes

- `delete_intake`, `delete_weight_entry`
- After correcting a food's label values, `recalculate_intakes_for_day`
  re-derives the calories of that day's feedings
"#;

/// Status information for the SnackTrack service
#[derive(Debug, Serialize)]
pub struct SnackTrackStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self) -> SnackTrackStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        SnackTrackStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
