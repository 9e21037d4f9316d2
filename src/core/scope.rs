use chrono::{DateTime, Datelike, Months, NaiveTime, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Axis label granularity for a rendered chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PresentationUnit {
    Hour,
    Day,
    Month,
}

/// Stride between axis marks for a rendered chart.
///
/// Distinct from [`PresentationUnit`]: the month scope draws per-day bars but
/// marks the axis once per week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AxisStride {
    Hour,
    Day,
    Week,
    Month,
}

/// User-selectable time window and bucketing granularity.
///
/// Serialized raw values (`day`, `week`, `month`, `halfYear`) are stable: the
/// host UI persists the selection across sessions under these keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartScope {
    Day,
    Week,
    Month,
    HalfYear,
}

impl ChartScope {
    /// All scopes in picker order.
    pub const ALL: [Self; 4] = [Self::Day, Self::Week, Self::Month, Self::HalfYear];

    /// Cutoff before which samples are excluded from the chart.
    ///
    /// Calendar arithmetic that would leave chrono's representable range falls
    /// back to the unshifted anchor instant.
    #[must_use]
    pub fn earliest_date(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let start_of_day = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        match self {
            Self::Day => start_of_day,
            Self::Week => start_of_day
                .checked_sub_signed(TimeDelta::days(6))
                .unwrap_or(start_of_day),
            Self::Month => start_of_day
                .checked_sub_months(Months::new(1))
                .unwrap_or(start_of_day),
            Self::HalfYear => {
                let start_of_month = now
                    .date_naive()
                    .with_day(1)
                    .map(|date| date.and_time(NaiveTime::MIN).and_utc())
                    .unwrap_or(start_of_day);
                start_of_month
                    .checked_sub_months(Months::new(6))
                    .unwrap_or(start_of_month)
            }
        }
    }

    /// First aligned bucket boundary strictly after `after`.
    ///
    /// Alignment follows the scope's step rule: top of the hour for day,
    /// midnight for week/month, first of the month for half-year. Returns
    /// `None` only at the edge of chrono's representable range.
    #[must_use]
    pub fn next_boundary(self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Day => {
                let top_of_hour = after.date_naive().and_hms_opt(after.hour(), 0, 0)?.and_utc();
                top_of_hour.checked_add_signed(TimeDelta::hours(1))
            }
            Self::Week | Self::Month => {
                let next_day = after.date_naive().succ_opt()?;
                Some(next_day.and_time(NaiveTime::MIN).and_utc())
            }
            Self::HalfYear => {
                let first_of_month = after.date_naive().with_day(1)?;
                let next_month = first_of_month.checked_add_months(Months::new(1))?;
                Some(next_month.and_time(NaiveTime::MIN).and_utc())
            }
        }
    }

    /// Ordered bucket boundaries covering `earliest_date(now)..=now`.
    ///
    /// Generation steps from the cutoff and stops after emitting the first
    /// boundary that exceeds `now`; that trailing boundary is kept, so the
    /// final bucket may cover a partial interval. With `now` exactly at the
    /// cutoff this yields a single boundary.
    #[must_use]
    pub fn boundaries(self, now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let mut boundaries = Vec::new();
        let mut cursor = self.earliest_date(now);
        while let Some(boundary) = self.next_boundary(cursor) {
            boundaries.push(boundary);
            if boundary > now {
                break;
            }
            cursor = boundary;
        }
        boundaries
    }

    #[must_use]
    pub fn presentation_unit(self) -> PresentationUnit {
        match self {
            Self::Day => PresentationUnit::Hour,
            Self::Week | Self::Month => PresentationUnit::Day,
            Self::HalfYear => PresentationUnit::Month,
        }
    }

    #[must_use]
    pub fn axis_stride(self) -> AxisStride {
        match self {
            Self::Day => AxisStride::Hour,
            Self::Week => AxisStride::Day,
            Self::Month => AxisStride::Week,
            Self::HalfYear => AxisStride::Month,
        }
    }

    /// Picker label for this scope.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Day => "Day",
            Self::Week => "Week",
            Self::Month => "Month",
            Self::HalfYear => "Half Year",
        }
    }
}
