use crate::db::models::{Question, QuestionOption, QuizAnswer};

/// Outcome for a single answer. `awarded == None` means the answer still
/// needs a human pass (short answers).
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AnswerScore {
    pub(crate) is_correct: Option<bool>,
    pub(crate) awarded: Option<f64>,
}

/// Scores one answer against its question. Choice questions are all or
/// nothing; a missing or unknown selection earns zero. Short answers are
/// left unscored.
pub(crate) fn score_answer(
    question: &Question,
    options: &[QuestionOption],
    answer: Option<&QuizAnswer>,
) -> AnswerScore {
    if !question.kind.is_auto_gradable() {
        return AnswerScore { is_correct: None, awarded: None };
    }

    let selected_correct = answer
        .and_then(|ans| ans.selected_option_id.as_deref())
        .and_then(|selected| options.iter().find(|opt| opt.id == selected))
        .map(|opt| opt.is_correct)
        .unwrap_or(false);

    if selected_correct {
        AnswerScore { is_correct: Some(true), awarded: Some(question.points) }
    } else {
        AnswerScore { is_correct: Some(false), awarded: Some(0.0) }
    }
}

/// A quiz made only of choice questions is final the moment it is
/// submitted; any short answer keeps the attempt waiting for staff.
pub(crate) fn fully_auto_gradable(questions: &[Question]) -> bool {
    questions.iter().all(|question| question.kind.is_auto_gradable())
}

/// Raw total treating unscored answers as zero.
pub(crate) fn total_awarded(scores: &[AnswerScore]) -> f64 {
    scores.iter().filter_map(|score| score.awarded).sum()
}

pub(crate) fn format_score(total: f64, max_points: f64) -> String {
    format!("{total}/{max_points}")
}
