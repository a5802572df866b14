use arcade_types::{AnswerSet, Category, RoundScores};

/// An answer counts only if, after trimming, it is non-empty and starts with
/// the round letter.
pub fn is_valid_answer(letter: char, answer: &str) -> bool {
    match answer.trim().chars().next() {
        Some(first) => first.to_lowercase().eq(letter.to_lowercase()),
        None => false,
    }
}

fn normalized(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Score one category for both sides:
/// - only one side valid: 10 to that side, 0 to the other
/// - both valid and identical (normalized): 5 each
/// - both valid and different: 10 each
/// - neither valid: 0 each
pub fn score_category(letter: char, mine: &str, theirs: &str) -> (u32, u32) {
    let my_valid = is_valid_answer(letter, mine);
    let their_valid = is_valid_answer(letter, theirs);

    match (my_valid, their_valid) {
        (true, true) if normalized(mine) == normalized(theirs) => (5, 5),
        (true, true) => (10, 10),
        (true, false) => (10, 0),
        (false, true) => (0, 10),
        (false, false) => (0, 0),
    }
}

/// Sum category scores over one round's two answer sets.
pub fn score_round(letter: char, mine: &AnswerSet, theirs: &AnswerSet) -> RoundScores {
    let mut scores = RoundScores { mine: 0, theirs: 0 };
    for category in Category::ALL {
        let (my_points, their_points) =
            score_category(letter, mine.get(category), theirs.get(category));
        scores.mine += my_points;
        scores.theirs += their_points;
    }
    scores
}
