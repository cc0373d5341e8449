//! Render a `Quiz` back into the text grammar accepted by the parser.
//!
//! Every question is written with an explicit `Points:` line and an explicit
//! response marker, so re-parsing the output yields the same questions.

use std::fmt;

use crate::types::{NumericAnswer, Question, QuestionType, Quiz};

impl fmt::Display for Quiz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Quiz title: {}", self.title())?;
        if !self.description().is_empty() {
            writeln!(f, "Quiz description: {}", self.description())?;
        }
        for question in self.questions() {
            writeln!(f)?;
            write_question(f, question)?;
        }
        Ok(())
    }
}

fn write_question(f: &mut fmt::Formatter<'_>, q: &Question) -> fmt::Result {
    writeln!(f, "Points: {}", q.points)?;
    writeln!(f, "{}. {}", q.ordinal, q.prompt)?;

    match q.kind {
        QuestionType::MultipleChoice | QuestionType::TrueFalse => {
            for (idx, answer) in q.answers.iter().enumerate() {
                let marker = if answer.is_correct { "*" } else { "" };
                let label = (b'a' + (idx % 26) as u8) as char;
                writeln!(f, "{marker}{label}) {}", answer.text)?;
            }
        }
        QuestionType::MultipleAnswer => {
            for answer in &q.answers {
                let mark = if answer.is_correct { '*' } else { ' ' };
                writeln!(f, "[{mark}] {}", answer.text)?;
            }
        }
        QuestionType::ShortAnswer => {
            for accepted in &q.accepted {
                writeln!(f, "* {accepted}")?;
            }
        }
        QuestionType::Numeric => match q.numeric {
            Some(NumericAnswer::Exact { value }) => writeln!(f, "= {value}")?,
            Some(NumericAnswer::Margin { value, margin }) => writeln!(f, "= {value} +- {margin}")?,
            Some(NumericAnswer::Range { low, high }) => writeln!(f, "= [{low}, {high}]")?,
            None => {}
        },
        QuestionType::Essay => writeln!(f, "____")?,
        QuestionType::FileUpload => writeln!(f, "^^^^")?,
    }

    if let Some(text) = &q.feedback.general {
        writeln!(f, "Feedback: {text}")?;
    }
    if let Some(text) = &q.feedback.correct {
        writeln!(f, "Correct feedback: {text}")?;
    }
    if let Some(text) = &q.feedback.incorrect {
        writeln!(f, "Incorrect feedback: {text}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::parser::parse;
    use crate::types::Question;

    fn without_lines(questions: &[Question]) -> Vec<Question> {
        questions
            .iter()
            .cloned()
            .map(|mut q| {
                q.line = 0;
                q
            })
            .collect()
    }

    const MIXED: &str = "\
Quiz title: Mixed bag
Quiz description: Everything the grammar supports.
Default points: 2

1. What is 2+3?
a) 6
b) 1
*c) 5
... Addition.

2. Which are prime numbers?
[ ] 4
[*] 5
[*] 7

Points: 3
3. Rome is in Italy.
*True
False
+ Correct!
- Check a map.

4. Pi to two places?
= 3.14 +- 0.005

5. Capital of France?
* Paris
* paris

6. Describe the water cycle.
It has several stages.

7. Upload your lab report.
^^^^
";

    #[test]
    fn rendered_quiz_parses_back_to_the_same_questions() {
        let first = parse(MIXED).unwrap().quiz;
        let rendered = first.to_string();
        let second = parse(&rendered).unwrap().quiz;

        assert_eq!(second.title(), first.title());
        assert_eq!(second.description(), first.description());
        assert_eq!(without_lines(second.questions()), without_lines(first.questions()));
    }

    #[test]
    fn rendering_is_explicit_about_points_and_markers() {
        let quiz = parse("Quiz title: T\n\n1. Pick all.\n*a) x\n*b) y\n\n2. Explain.\n\n").unwrap().quiz;
        assert_eq!(
            quiz.to_string(),
            "Quiz title: T\n\nPoints: 1\n1. Pick all.\n[*] x\n[*] y\n\nPoints: 1\n2. Explain.\n____\n"
        );
    }

    #[test]
    fn multi_line_prompts_and_answers_survive() {
        let text = "Quiz title: T\n1. Read this:\nsecond line\n*a) one\ncontinued\nb) two\n";
        let first = parse(text).unwrap().quiz;
        let second = parse(&first.to_string()).unwrap().quiz;
        assert_eq!(second.questions()[0].prompt, "Read this:\nsecond line");
        assert_eq!(second.questions()[0].answers[0].text, "one\ncontinued");
    }
}
