//! Context composer: renders retrieved reviews into the active user turn.
//!
//! Record blocks follow the index order and only carry fields the record
//! actually has. An empty result set still emits the header, so the model can
//! tell "nothing matched" apart from "retrieval was skipped".

use std::fmt::Write as _;

use vector::MatchRecord;

/// Literal marker between the user's question and the retrieved reviews.
pub const RESULTS_HEADER: &str = "\n\nReturned results from vector db:";

/// Render `records` as the context block, header included.
pub fn compose_context(records: &[MatchRecord]) -> String {
    let mut block = String::from(RESULTS_HEADER);
    for record in records {
        render_record(&mut block, record);
    }
    block
}

/// The active turn's text followed by the rendered context.
pub fn augment_turn(active_content: &str, records: &[MatchRecord]) -> String {
    let mut augmented = String::with_capacity(active_content.len() + 128 * (records.len() + 1));
    augmented.push_str(active_content);
    augmented.push_str(&compose_context(records));
    augmented
}

fn render_record(out: &mut String, record: &MatchRecord) {
    // Writing into a String cannot fail.
    let _ = write!(out, "\n\nProfessor: {}", record.id);
    if let Some(review) = &record.review {
        let _ = write!(out, "\nReview: {review}");
    }
    if let Some(subject) = &record.subject {
        let _ = write!(out, "\nSubject: {subject}");
    }
    if let Some(stars) = record.stars {
        let _ = write!(out, "\nStars: {stars}");
    }
    if let Some(date) = &record.date {
        let _ = write!(out, "\nDate: {date}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, stars: Option<f32>) -> MatchRecord {
        MatchRecord {
            id: id.into(),
            review: Some(format!("{id} explains things clearly.")),
            subject: Some("Physics".into()),
            stars,
            date: Some("2024-03-01".into()),
            score: Some(0.9),
        }
    }

    #[test]
    fn empty_results_still_emit_header() {
        assert_eq!(compose_context(&[]), RESULTS_HEADER);
        assert_eq!(augment_turn("asdkjh", &[]), format!("asdkjh{RESULTS_HEADER}"));
    }

    #[test]
    fn renders_one_block_per_record_in_order() {
        let records = vec![record("Dr. B", Some(4.0)), record("Dr. A", Some(4.5))];
        let block = compose_context(&records);

        assert_eq!(block.matches("Professor: ").count(), 2);
        let b = block.find("Professor: Dr. B").unwrap();
        let a = block.find("Professor: Dr. A").unwrap();
        assert!(b < a);
        assert!(block.contains("Stars: 4\n"));
        assert!(block.contains("Stars: 4.5\n"));
    }

    #[test]
    fn exact_block_layout() {
        let block = compose_context(&[record("Dr. Lee", Some(5.0))]);
        assert_eq!(
            block,
            "\n\nReturned results from vector db:\
             \n\nProfessor: Dr. Lee\
             \nReview: Dr. Lee explains things clearly.\
             \nSubject: Physics\
             \nStars: 5\
             \nDate: 2024-03-01"
        );
    }

    #[test]
    fn absent_fields_are_omitted_not_invented() {
        let bare = MatchRecord {
            id: "Dr. Quiet".into(),
            review: None,
            subject: None,
            stars: None,
            date: None,
            score: Some(0.1),
        };
        let block = compose_context(&[bare]);
        assert!(block.ends_with("\n\nProfessor: Dr. Quiet"));
        for label in ["Review:", "Subject:", "Stars:", "Date:"] {
            assert!(!block.contains(label), "{label} should be absent");
        }
        assert!(!block.contains("undefined"));
    }
}
