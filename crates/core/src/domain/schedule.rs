use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Time of day at minute resolution, rendered as a 12-hour slot label ("9:00 AM").
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotTime(NaiveTime);

impl SlotTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        if minutes >= MINUTES_PER_DAY {
            return None;
        }
        Self::new(minutes / 60, minutes % 60)
    }

    /// Accepts either a 12-hour label (`"2:30 PM"`) or a 24-hour value (`"14:30"`).
    pub fn parse(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return None;
        }

        let upper = trimmed.to_ascii_uppercase();
        NaiveTime::parse_from_str(&upper, "%I:%M %p")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
            .ok()
            .map(Self)
    }

    pub fn minutes(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }

    pub fn label(&self) -> String {
        self.0.format("%-I:%M %p").to_string()
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for SlotTime {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| {
            format!("`{value}` is not a valid time (expected `H:MM AM|PM` or `HH:MM`)")
        })
    }
}

impl TryFrom<String> for SlotTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotTime> for String {
    fn from(value: SlotTime) -> Self {
        value.label()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub enabled: bool,
    pub start: SlotTime,
    pub end: SlotTime,
}

impl DayHours {
    pub fn open(start: SlotTime, end: SlotTime) -> Self {
        Self { enabled: true, start, end }
    }

    pub fn closed(start: SlotTime, end: SlotTime) -> Self {
        Self { enabled: false, start, end }
    }
}

/// Per-weekday opening hours, indexed Monday first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    days: [DayHours; 7],
}

impl WorkingHours {
    pub fn uniform(hours: DayHours) -> Self {
        Self { days: std::array::from_fn(|_| hours.clone()) }
    }

    pub fn for_weekday(&self, weekday: Weekday) -> &DayHours {
        &self.days[weekday.num_days_from_monday() as usize]
    }

    pub fn set(&mut self, weekday: Weekday, hours: DayHours) {
        self.days[weekday.num_days_from_monday() as usize] = hours;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &DayHours)> {
        WEEKDAYS.iter().copied().zip(self.days.iter())
    }
}

/// Clinic-configured period during which no slot is bookable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakWindow {
    pub label: String,
    pub start: SlotTime,
    pub end: SlotTime,
}

impl BreakWindow {
    /// True when `[start_mins, end_mins)` intersects this window. An empty
    /// range counts when its start lies inside the window.
    pub fn overlaps(&self, start_mins: u32, end_mins: u32) -> bool {
        let (window_start, window_end) = (self.start.minutes(), self.end.minutes());
        if start_mins >= end_mins {
            return window_start <= start_mins && start_mins < window_end;
        }
        start_mins < window_end && window_start < end_mins
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicSchedule {
    pub working_hours: WorkingHours,
    pub appointment_duration_mins: u32,
    pub buffer_time_mins: u32,
    pub max_advance_booking_days: u32,
    pub breaks: Vec<BreakWindow>,
}

impl ClinicSchedule {
    pub fn hours_for(&self, weekday: Weekday) -> &DayHours {
        self.working_hours.for_weekday(weekday)
    }
}

impl Default for ClinicSchedule {
    fn default() -> Self {
        let nine = hm(9, 0);
        let mut working_hours = WorkingHours::uniform(DayHours::open(nine, hm(17, 0)));
        working_hours.set(Weekday::Sat, DayHours::open(nine, hm(14, 0)));
        working_hours.set(Weekday::Sun, DayHours::closed(nine, hm(17, 0)));

        Self {
            working_hours,
            appointment_duration_mins: 30,
            buffer_time_mins: 15,
            max_advance_booking_days: 30,
            breaks: vec![BreakWindow {
                label: "Lunch".to_string(),
                start: hm(12, 0),
                end: hm(13, 0),
            }],
        }
    }
}

fn hm(hour: u32, minute: u32) -> SlotTime {
    SlotTime::from_minutes(hour * 60 + minute).unwrap_or(SlotTime(NaiveTime::MIN))
}
