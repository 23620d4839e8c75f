use rand::Rng;

/// Letter-grade buckets with their draw probabilities, highest grade first.
/// Selection walks the cumulative sum; order is part of the contract.
pub const GRADE_DISTRIBUTION: &[(&str, f64)] = &[
    ("A", 0.20),
    ("A-", 0.15),
    ("B+", 0.15),
    ("B", 0.15),
    ("B-", 0.10),
    ("C+", 0.10),
    ("C", 0.08),
    ("C-", 0.05),
    ("D", 0.02),
];

pub const SEMESTERS: &[&str] = &["Fall", "Spring"];
pub const ACADEMIC_YEARS: &[&str] = &["2023", "2024"];

/// How many courses a fresh student gets sample grades for.
pub const SAMPLE_GRADE_COURSES: usize = 6;

/// Maps a uniform [0,1) draw to a letter grade: first bucket whose cumulative
/// probability meets or exceeds the draw wins. Falls back to `B` if floating
/// point rounding leaves a gap at the top end.
pub fn grade_for_draw(draw: f64) -> &'static str {
    let mut cumulative = 0.0;
    for (grade, probability) in GRADE_DISTRIBUTION {
        cumulative += probability;
        if draw <= cumulative {
            return grade;
        }
    }
    "B"
}

pub fn sample_grade<R: Rng>(rng: &mut R) -> &'static str {
    grade_for_draw(rng.gen::<f64>())
}

/// Random (semester, academic year) tag for seeded grades.
pub fn sample_period<R: Rng>(rng: &mut R) -> (&'static str, &'static str) {
    let semester = SEMESTERS[rng.gen_range(0..SEMESTERS.len())];
    let year = ACADEMIC_YEARS[rng.gen_range(0..ACADEMIC_YEARS.len())];
    (semester, year)
}
