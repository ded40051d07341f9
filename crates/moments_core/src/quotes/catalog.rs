//! Quote catalog, glyph splitting and the no-repeat deck.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::time::Duration;

use crate::motion::timings::QUOTE_GLYPH_STEP;

/// Latin words reveal as one unit; every other character on its own.
static GLYPH_UNIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)[A-Za-z][A-Za-z']*|.").expect("valid glyph unit regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub text: &'static str,
    pub author: &'static str,
    /// May be empty.
    pub era: &'static str,
}

pub const CATALOG: [Quote; 9] = [
    Quote {
        text: "逝者如斯夫，不舍昼夜",
        author: "孔子",
        era: "公元前551年",
    },
    Quote {
        text: "Time is the substance I am made of",
        author: "Borges",
        era: "1899-1986",
    },
    Quote {
        text: "往事不可谏，来者犹可追",
        author: "《论语》",
        era: "",
    },
    Quote {
        text: "人生天地之间，若白驹过隙",
        author: "庄子",
        era: "公元前369年",
    },
    Quote {
        text: "We are such stuff as dreams are made on",
        author: "Shakespeare",
        era: "1564-1616",
    },
    Quote {
        text: "盛年不重来，一日难再晨",
        author: "陶渊明",
        era: "365-427",
    },
    Quote {
        text: "今人不见古时月，今月曾经照古人",
        author: "李白",
        era: "701-762",
    },
    Quote {
        text: "此情可待成追忆，只是当时已惘然",
        author: "李商隐",
        era: "813-858",
    },
    Quote {
        text: "人生到处知何似，应似飞鸿踏雪泥",
        author: "苏轼",
        era: "1037-1101",
    },
];

/// Splits quote text into reveal units.
pub fn glyph_units(text: &str) -> Vec<&str> {
    GLYPH_UNIT_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Time until the whole text (plus closing mark) has been revealed.
pub fn reveal_duration(text: &str) -> Duration {
    let units = u32::try_from(glyph_units(text).len()).unwrap_or(u32::MAX);
    QUOTE_GLYPH_STEP * units + Duration::from_millis(500)
}

/// Header quote for the UTC day containing `at`.
pub fn daily_quote_at(at: DateTime<Utc>) -> &'static Quote {
    daily_quote(at.date_naive())
}

/// Quote for `date`, counted in days since 1970-01-01.
pub fn daily_quote(date: NaiveDate) -> &'static Quote {
    let days = date
        .signed_duration_since(NaiveDate::default())
        .num_days()
        .rem_euclid(CATALOG.len() as i64);
    &CATALOG[days as usize]
}

/// Draws catalog indices without replacement, refilling once exhausted.
#[derive(Debug, Clone)]
pub struct QuoteDeck {
    size: usize,
    used: Vec<bool>,
    used_count: usize,
}

impl QuoteDeck {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            used: vec![false; size],
            used_count: 0,
        }
    }

    pub fn used_count(&self) -> usize {
        self.used_count
    }

    pub fn is_used(&self, index: usize) -> bool {
        self.used.get(index).copied().unwrap_or(false)
    }

    /// Forgets every drawn index.
    pub fn reset(&mut self) {
        self.used.iter_mut().for_each(|slot| *slot = false);
        self.used_count = 0;
    }

    /// Draws one unused index uniformly; clears the memory first when full.
    ///
    /// Returns `None` only for an empty catalog.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        if self.size == 0 {
            return None;
        }
        if self.used_count >= self.size {
            self.reset();
        }
        let remaining = self.size - self.used_count;
        let nth = rng.gen_range(0..remaining);
        let index = self
            .used
            .iter()
            .enumerate()
            .filter(|(_, used)| !**used)
            .nth(nth)
            .map(|(index, _)| index)?;
        self.used[index] = true;
        self.used_count += 1;
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::{daily_quote, daily_quote_at, glyph_units, reveal_duration, QuoteDeck, CATALOG};
    use chrono::{DateTime, NaiveDate, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::time::Duration;

    #[test]
    fn glyph_units_keep_latin_words_whole() {
        assert_eq!(
            glyph_units("We're made"),
            vec!["We're", " ", "made"]
        );
        assert_eq!(glyph_units("逝者，如"), vec!["逝", "者", "，", "如"]);
    }

    #[test]
    fn reveal_duration_counts_units() {
        assert_eq!(reveal_duration("ab cd"), Duration::from_millis(3 * 80 + 500));
    }

    #[test]
    fn deck_exhausts_catalog_before_repeating() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut deck = QuoteDeck::new(CATALOG.len());
        let drawn: HashSet<_> = (0..CATALOG.len())
            .map(|_| deck.draw(&mut rng).unwrap())
            .collect();
        assert_eq!(drawn.len(), CATALOG.len());
        assert_eq!(deck.used_count(), CATALOG.len());

        deck.draw(&mut rng).unwrap();
        assert_eq!(deck.used_count(), 1);
    }

    #[test]
    fn daily_quote_rotates_by_day() {
        let day = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        let next = day.succ_opt().unwrap();
        assert_ne!(daily_quote(day), daily_quote(next));
    }

    #[test]
    fn daily_quote_follows_the_utc_day() {
        assert_eq!(daily_quote(NaiveDate::default()), &CATALOG[0]);
        // 07:30 at UTC+8 is still the previous UTC day.
        let at = DateTime::parse_from_rfc3339("2024-12-25T07:30:00+08:00")
            .unwrap()
            .with_timezone(&Utc);
        let utc_day = NaiveDate::from_ymd_opt(2024, 12, 24).unwrap();
        assert_eq!(daily_quote_at(at), daily_quote(utc_day));
    }
}
