//! the immutable solve record produced when the timer stops (§3.3/§4.2).

use crate::penalties::Penalties;
use crate::{SolveId, TimeMs, WallMs, NO_ID};
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// the physical puzzle a solve was performed on. Closed, ordered; 3x3x3
/// sorts first since it is the canonical/default event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum PuzzleType {
    ThreeByThree,
    TwoByTwo,
    FourByFour,
    FiveByFive,
    SixBySix,
    SevenBySeven,
    Megaminx,
    Pyraminx,
    Skewb,
    SquareOne,
    Clock,
}

impl Default for PuzzleType {
    fn default() -> Self {
        Self::ThreeByThree
    }
}

impl std::fmt::Display for PuzzleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ThreeByThree => "3x3x3",
            Self::TwoByTwo => "2x2x2",
            Self::FourByFour => "4x4x4",
            Self::FiveByFive => "5x5x5",
            Self::SixBySix => "6x6x6",
            Self::SevenBySeven => "7x7x7",
            Self::Megaminx => "Megaminx",
            Self::Pyraminx => "Pyraminx",
            Self::Skewb => "Skewb",
            Self::SquareOne => "Square-1",
            Self::Clock => "Clock",
        };
        write!(f, "{name}")
    }
}

/// immutable record of one completed solve attempt.
///
/// `exact_time_ms` is the raw elapsed time *including* time penalties, kept
/// at 1ms precision so [`Solve::get_time`] can apply the WCA rounding rule
/// at read time without ever corrupting the stored value (§3.3, §9).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Solve {
    id: SolveId,
    exact_time_ms: TimeMs,
    puzzle_type: PuzzleType,
    category: String,
    date_ms: WallMs,
    scramble: String,
    penalties: Penalties,
    comment: String,
    history: bool,
    /// lazily computed, invalidated on every `with_*` copy (§4.2 "hash is
    /// consistent with equality and cached").
    #[serde(skip)]
    hash_cache: OnceLock<u64>,
}

impl PartialEq for Solve {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.exact_time_ms == other.exact_time_ms
            && self.puzzle_type == other.puzzle_type
            && self.category == other.category
            && self.date_ms == other.date_ms
            && self.scramble == other.scramble
            && self.penalties == other.penalties
            && self.comment == other.comment
            && self.history == other.history
    }
}

impl Eq for Solve {}

impl Hash for Solve {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let cached = *self.hash_cache.get_or_init(|| {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            self.id.hash(&mut hasher);
            self.exact_time_ms.hash(&mut hasher);
            self.puzzle_type.hash(&mut hasher);
            self.category.hash(&mut hasher);
            self.date_ms.hash(&mut hasher);
            self.scramble.hash(&mut hasher);
            self.penalties.hash(&mut hasher);
            self.comment.hash(&mut hasher);
            self.history.hash(&mut hasher);
            hasher.finish()
        });
        cached.hash(state);
    }
}

/// durations below this many ms are truncated to the nearest 10ms (WCA 9f1);
/// at or above, they are rounded to the nearest 1000ms (WCA 9f2).
const WCA_ROUNDING_THRESHOLD_MS: TimeMs = 10 * 60 * 1_000;

impl Solve {
    pub fn new(
        puzzle_type: PuzzleType,
        category: impl Into<String>,
        exact_time_ms: TimeMs,
        date_ms: WallMs,
        scramble: impl Into<String>,
        penalties: Penalties,
    ) -> Self {
        let category = category.into();
        assert!(!category.is_empty(), "category must be non-empty");
        Self {
            id: NO_ID,
            exact_time_ms,
            puzzle_type,
            category,
            date_ms,
            scramble: scramble.into().trim().to_string(),
            penalties,
            comment: String::new(),
            history: false,
            hash_cache: OnceLock::new(),
        }
    }

    pub fn id(&self) -> SolveId {
        self.id
    }
    pub fn exact_time_ms(&self) -> TimeMs {
        self.exact_time_ms
    }
    pub fn puzzle_type(&self) -> PuzzleType {
        self.puzzle_type
    }
    pub fn category(&self) -> &str {
        &self.category
    }
    pub fn date_ms(&self) -> WallMs {
        self.date_ms
    }
    pub fn scramble(&self) -> &str {
        &self.scramble
    }
    pub fn penalties(&self) -> Penalties {
        self.penalties
    }
    pub fn comment(&self) -> &str {
        &self.comment
    }
    pub fn is_history(&self) -> bool {
        self.history
    }

    /// WCA-rounded time, computed at read time from the raw `exact_time_ms`
    /// (§3.3, Regulations 9f1/9f2). Returns [`crate::TIME_DNF`] if disqualified.
    pub fn get_time(&self) -> TimeMs {
        if self.penalties.is_dnf() {
            return crate::TIME_DNF;
        }
        round_wca(self.exact_time_ms)
    }

    pub fn with_id(&self, id: SolveId) -> Self {
        Self {
            id,
            hash_cache: OnceLock::new(),
            ..self.clone()
        }
    }
    pub fn with_date(&self, date_ms: WallMs) -> Self {
        Self {
            date_ms,
            hash_cache: OnceLock::new(),
            ..self.clone()
        }
    }
    pub fn with_history(&self, history: bool) -> Self {
        Self {
            history,
            hash_cache: OnceLock::new(),
            ..self.clone()
        }
    }
    pub fn with_comment(&self, comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into().trim().to_string(),
            hash_cache: OnceLock::new(),
            ..self.clone()
        }
    }

    /// replaces the penalties and shifts `exact_time_ms` by the delta in
    /// time-penalty between the old and new values, so the *solve* portion
    /// of the time is unaffected (§4.2).
    pub fn with_penalties_adjusting_time(&self, penalties: Penalties) -> Self {
        let delta = penalties.time_penalty_ms() - self.penalties.time_penalty_ms();
        Self {
            exact_time_ms: self.exact_time_ms + delta,
            penalties,
            hash_cache: OnceLock::new(),
            ..self.clone()
        }
    }

    /// replaces the penalties without touching `exact_time_ms` at all —
    /// used when the caller has already folded the new penalty into the
    /// stored time (or is only changing DNF state, which never adjusts time).
    pub fn with_penalties_not_adjusting_time(&self, penalties: Penalties) -> Self {
        Self {
            penalties,
            hash_cache: OnceLock::new(),
            ..self.clone()
        }
    }

    pub fn with_time_including_penalties(&self, exact_time_ms: TimeMs) -> Self {
        Self {
            exact_time_ms,
            hash_cache: OnceLock::new(),
            ..self.clone()
        }
    }

    pub fn with_time_excluding_penalties(&self, solve_only_ms: TimeMs) -> Self {
        Self {
            exact_time_ms: solve_only_ms + self.penalties.time_penalty_ms(),
            hash_cache: OnceLock::new(),
            ..self.clone()
        }
    }
}

/// WCA Regulations 9f1/9f2: truncate to the nearest 10ms below 10 minutes,
/// round to the nearest 1000ms at or above 10 minutes.
pub fn round_wca(exact_ms: TimeMs) -> TimeMs {
    if exact_ms < WCA_ROUNDING_THRESHOLD_MS {
        (exact_ms / 10) * 10
    } else {
        let remainder = exact_ms % 1_000;
        if remainder * 2 >= 1_000 {
            exact_ms - remainder + 1_000
        } else {
            exact_ms - remainder
        }
    }
}
