use chrono::{DateTime, NaiveDate, Timelike, Utc};

/// Source of wall-clock time and the logical queue day.
///
/// Everything downstream takes time through this seam so tests can pin it.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn hour_of_day(&self) -> u32 {
        self.now().hour()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Time-of-day pricing bucket for wait estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TariffBucket {
    Peak,
    Lull,
    Normal,
}

impl TariffBucket {
    /// Late morning is the rush; the post-lunch window runs quiet.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            10..=12 => TariffBucket::Peak,
            14..=15 => TariffBucket::Lull,
            _ => TariffBucket::Normal,
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            TariffBucket::Peak => 1.2,
            TariffBucket::Lull => 0.9,
            TariffBucket::Normal => 1.0,
        }
    }
}
