use serde_json::{Map, Value};

/// Three-level ordinal grade used by the evaluation rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    High,
    Medium,
    Low,
}

impl Grade {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "상" => Some(Grade::High),
            "중" => Some(Grade::Medium),
            "하" => Some(Grade::Low),
            _ => None,
        }
    }

    /// Midpoint of the grade's score band.
    pub fn score(self) -> u32 {
        match self {
            Grade::High => 95,
            Grade::Medium => 75,
            Grade::Low => 30,
        }
    }

    /// Weight used by the count-based overall score.
    fn weight(self) -> u64 {
        match self {
            Grade::High => 100,
            Grade::Medium => 60,
            Grade::Low => 30,
        }
    }
}

pub const UNGRADED_SCORE: u32 = 50;

pub fn grade_to_score(label: &str) -> u32 {
    Grade::from_label(label).map_or(UNGRADED_SCORE, Grade::score)
}

/// Per-criterion scores in the same key order as `grades`.
pub fn convert_scores(grades: &Map<String, Value>) -> Map<String, Value> {
    grades
        .iter()
        .map(|(key, grade)| {
            let score = grade.as_str().map_or(UNGRADED_SCORE, grade_to_score);
            (key.clone(), Value::from(score))
        })
        .collect()
}

/// Count-based overall score over the recognised grades.
///
/// Values outside the three labels are left out of both numerator and
/// denominator. No recognised grade at all scores 0.
pub fn overall_score<'a, I>(grades: I) -> u32
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut total = 0u64;
    let mut counted = 0u64;
    for grade in grades.into_iter().filter_map(|v| v.as_str().and_then(Grade::from_label)) {
        total += grade.weight();
        counted += 1;
    }
    if counted == 0 {
        return 0;
    }
    round_half_even(total, counted) as u32
}

/// `numerator / denominator` rounded to the nearest integer, ties to even.
fn round_half_even(numerator: u64, denominator: u64) -> u64 {
    let quotient = numerator / denominator;
    let twice_remainder = 2 * (numerator % denominator);
    if twice_remainder > denominator || (twice_remainder == denominator && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    }
}
