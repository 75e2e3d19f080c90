//! Built-in reference question and its canned answer
//!
//! The reference question is answered locally without contacting the
//! answering service. Matching is exact after [`normalize_question`].

use super::answer::{AnswerOrigin, AnswerResult};
use crate::conversation::{Citation, CitationStore};

/// The reference question as it is usually typed, across two lines
pub const REFERENCE_QUESTION: &str = "Can the legal heirs of a claimant who died while his motor accident claim was pending\n\
continue the claim petition and recover compensation for the loss to his estate?";

/// Source label of the reference answer's only citation
pub const REFERENCE_CITATION_SOURCE: &str = "Para 7, Dani Devi v. Pritam Singh";

const REFERENCE_CITATION_TEXT: &str = "The legal representatives of the deceased claimant are \
entitled to continue the claim petition in so far as it relates to the loss caused to the \
estate of the deceased, since to that extent the cause of action survives his death.";

const REFERENCE_ANSWER: &str = "Yes, under Section 166 of the Motor Vehicles Act, 1988, an \
application for compensation may be made by all or any of the legal representatives of the \
deceased, and a pending claim petition does not abate on the claimant's death.\n\
\n\
**What the legal heirs can recover:**\n\
• Loss to the estate, including loss of earnings up to the date of death\n\
• Medical and treatment expenses actually incurred\n\
• Conveyance and attendant charges proved on record\n\
\n\
**What does not survive:** personal claims such as *pain and suffering* and *loss of \
amenities* end with the injured claimant.\n\
\n\
The heirs should move an application to be brought on record as legal representatives \
before the Motor Accidents Claims Tribunal.";

/// Collapses every run of line breaks into a single space and trims the result
///
/// # Examples
///
/// ```
/// use lexi::dispatch::normalize_question;
///
/// assert_eq!(normalize_question("  first line\r\n\nsecond line \n"), "first line second line");
/// ```
pub fn normalize_question(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut in_break = false;
    for ch in text.chars() {
        if ch == '\r' || ch == '\n' {
            if !in_break {
                normalized.push(' ');
                in_break = true;
            }
        } else {
            normalized.push(ch);
            in_break = false;
        }
    }
    normalized.trim().to_string()
}

/// Returns true if `question` is the reference question after normalization
pub fn is_reference_question(question: &str) -> bool {
    normalize_question(question) == normalize_question(REFERENCE_QUESTION)
}

/// The canned answer for the reference question
pub fn reference_answer() -> AnswerResult {
    AnswerResult {
        text: REFERENCE_ANSWER.to_string(),
        citations: CitationStore::from(vec![Citation::new(
            REFERENCE_CITATION_TEXT,
            REFERENCE_CITATION_SOURCE,
        )]),
        origin: AnswerOrigin::Reference,
    }
}
