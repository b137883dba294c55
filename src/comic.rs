use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::error::{FeedError, Result};

/// One comic as returned by `info.0.json`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Comic {
    pub num: u32,
    pub title: String,
    pub alt: String,
    pub img: String,
    pub year: String,
    pub month: String,
    pub day: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub news: String,
    #[serde(default)]
    pub safe_title: String,
    #[serde(default)]
    pub transcript: String,
}

impl Comic {
    /// Publication day at midnight UTC.
    pub fn published(&self) -> Result<DateTime<Utc>> {
        let invalid = || FeedError::InvalidDate {
            num: self.num,
            year: self.year.clone(),
            month: self.month.clone(),
            day: self.day.clone(),
        };

        let year: i32 = self.year.trim().parse().map_err(|_| invalid())?;
        let month: u32 = self.month.trim().parse().map_err(|_| invalid())?;
        let day: u32 = self.day.trim().parse().map_err(|_| invalid())?;

        let midnight = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(invalid)?;
        Ok(midnight.and_utc())
    }
}

/// RFC-822 timestamp as used by RSS `pubDate` and `lastBuildDate`.
pub fn rfc822(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
pub(crate) fn sample(num: u32, title: &str) -> Comic {
    Comic {
        num,
        title: title.to_string(),
        alt: format!("Alt text for {}", title),
        img: format!("https://imgs.xkcd.com/comics/{}.png", num),
        year: "2024".to_string(),
        month: "3".to_string(),
        day: "5".to_string(),
        link: String::new(),
        news: String::new(),
        safe_title: title.to_string(),
        transcript: String::new(),
    }
}
