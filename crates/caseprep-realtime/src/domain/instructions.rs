//! Per-question instruction compilation.
//!
//! [`compile`] is a pure function of a template and a question number: no
//! clock, no randomness, no I/O. Identical inputs always produce
//! byte-identical text.

use caseprep_core::error::DomainError;
use caseprep_interview::domain::template::{LeadType, QuestionSpec, Template};

/// Everything the instruction text is rendered from.
#[derive(Debug, Clone, Copy)]
pub struct InstructionContext<'a> {
    /// Case category.
    pub case_type: &'a str,
    /// Who drives the conversation.
    pub lead_type: LeadType,
    /// Difficulty label.
    pub difficulty: &'a str,
    /// Firm the interviewer represents, if any.
    pub company: Option<&'a str>,
    /// Industry the case is set in, if any.
    pub industry: Option<&'a str>,
    /// The main case prompt.
    pub case_prompt: &'a str,
    /// 1-based question number being scoped.
    pub question_number: u32,
    /// Number of questions in the template.
    pub question_count: u32,
    /// The scoped question.
    pub question: &'a QuestionSpec,
}

impl<'a> InstructionContext<'a> {
    /// Builds the context for question `question_number` of `template`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidQuestion` if `question_number` is outside
    /// `[1, N]` for the template.
    pub fn new(template: &'a Template, question_number: u32) -> Result<Self, DomainError> {
        let question = template.question(question_number)?;
        Ok(Self {
            case_type: template.case_type.trim(),
            lead_type: template.lead_type,
            difficulty: template.difficulty.trim(),
            company: non_blank(template.company.as_deref()),
            industry: non_blank(template.industry.as_deref()),
            case_prompt: template.prompt.trim(),
            question_number,
            question_count: template.question_count(),
            question,
        })
    }

    /// Renders the instruction text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut sections = vec![
            self.opening(),
            format!("CASE:\n{}", self.case_prompt),
            self.question_section(),
        ];
        if let Some(notes) = non_blank(Some(&self.question.evaluator_context)) {
            sections.push(format!(
                "EVALUATOR NOTES (never read these to the candidate):\n{notes}"
            ));
        }
        sections.push(self.scope_section());
        sections.push(self.style_section());
        sections.join("\n\n")
    }

    fn opening(&self) -> String {
        let mut line = format!(
            "You are an interviewer conducting a {} case interview",
            self.case_type
        );
        if let Some(company) = self.company {
            line.push_str(" on behalf of ");
            line.push_str(company);
        }
        if let Some(industry) = self.industry {
            line.push_str(" in the ");
            line.push_str(industry);
            line.push_str(" industry");
        }
        format!("{line}.\nDifficulty: {}.", self.difficulty)
    }

    fn question_section(&self) -> String {
        let heading = match non_blank(self.question.title.as_deref()) {
            Some(title) => format!(
                "QUESTION {} OF {}: {title}",
                self.question_number, self.question_count
            ),
            None => format!(
                "QUESTION {} OF {}",
                self.question_number, self.question_count
            ),
        };
        format!("{heading}\n{}", self.question.prompt.trim())
    }

    fn scope_section(&self) -> String {
        let handoff = if self.question_number >= self.question_count {
            "tell the candidate that the case is complete"
        } else {
            "tell the candidate to continue to the next question"
        };
        format!(
            "SCOPE:\nYou handle only question {q} of {n}. Do not introduce, preview or discuss \
             any other question. When this question is finished, {handoff}.",
            q = self.question_number,
            n = self.question_count,
        )
    }

    fn style_section(&self) -> String {
        let lead: [&str; 3] = match self.lead_type {
            LeadType::InterviewerLed => [
                "Guide the candidate through the analysis one step at a time.",
                "Steer them back if they drift from the question.",
                "Offer hints only when they are stuck.",
            ],
            LeadType::CandidateLed => [
                "Let the candidate drive the analysis and choose each next step.",
                "Answer their questions using only the facts above; do not lead them.",
                "Step in only if they are clearly off track.",
            ],
        };
        let common = [
            "Keep your questions and answers concise.",
            "Close the question with brief, constructive feedback.",
        ];
        let bullets: Vec<String> = lead
            .iter()
            .chain(common.iter())
            .map(|line| format!("- {line}"))
            .collect();
        format!("STYLE:\n{}", bullets.join("\n"))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Compiles the instructions for question `question_number` of `template`.
///
/// # Errors
///
/// Returns `DomainError::InvalidQuestion` if `question_number` is outside
/// `[1, N]` for the template.
pub fn compile(template: &Template, question_number: u32) -> Result<String, DomainError> {
    Ok(InstructionContext::new(template, question_number)?.render())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn market_entry(lead_type: LeadType) -> Template {
        Template {
            id: Uuid::nil(),
            case_type: "Market Entry".to_owned(),
            lead_type,
            difficulty: "Medium".to_owned(),
            company: Some("Acme".to_owned()),
            industry: Some("Beverages".to_owned()),
            title: None,
            prompt: "Should Acme enter Brazil?".to_owned(),
            questions: vec![
                QuestionSpec {
                    title: Some("Opening".to_owned()),
                    prompt: "How would you approach this?".to_owned(),
                    evaluator_context: String::new(),
                },
                QuestionSpec {
                    title: Some("Structure".to_owned()),
                    prompt: "What factors would you consider?".to_owned(),
                    evaluator_context: "Expect market size, competition, capabilities."
                        .to_owned(),
                },
                QuestionSpec {
                    title: None,
                    prompt: "What is your recommendation?".to_owned(),
                    evaluator_context: String::new(),
                },
            ],
        }
    }

    #[test]
    fn test_compile_matches_golden_output() {
        // Arrange
        let template = market_entry(LeadType::InterviewerLed);
        let expected = concat!(
            "You are an interviewer conducting a Market Entry case interview on behalf of Acme ",
            "in the Beverages industry.\n",
            "Difficulty: Medium.\n",
            "\n",
            "CASE:\n",
            "Should Acme enter Brazil?\n",
            "\n",
            "QUESTION 2 OF 3: Structure\n",
            "What factors would you consider?\n",
            "\n",
            "EVALUATOR NOTES (never read these to the candidate):\n",
            "Expect market size, competition, capabilities.\n",
            "\n",
            "SCOPE:\n",
            "You handle only question 2 of 3. Do not introduce, preview or discuss any other ",
            "question. When this question is finished, tell the candidate to continue to the ",
            "next question.\n",
            "\n",
            "STYLE:\n",
            "- Guide the candidate through the analysis one step at a time.\n",
            "- Steer them back if they drift from the question.\n",
            "- Offer hints only when they are stuck.\n",
            "- Keep your questions and answers concise.\n",
            "- Close the question with brief, constructive feedback.",
        );

        // Act
        let instructions = compile(&template, 2).unwrap();

        // Assert
        assert_eq!(instructions, expected);
    }

    #[test]
    fn test_compile_is_byte_identical_across_calls() {
        let template = market_entry(LeadType::CandidateLed);

        let first = compile(&template, 1).unwrap();
        let second = compile(&template, 1).unwrap();

        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_lead_type_changes_phrasing() {
        let guided = compile(&market_entry(LeadType::InterviewerLed), 1).unwrap();
        let hands_off = compile(&market_entry(LeadType::CandidateLed), 1).unwrap();

        assert!(guided.contains("Guide the candidate through the analysis"));
        assert!(!hands_off.contains("Guide the candidate"));
        assert!(hands_off.contains("Let the candidate drive the analysis"));
    }

    #[test]
    fn test_optional_fields_are_omitted_when_absent() {
        // Arrange
        let mut template = market_entry(LeadType::InterviewerLed);
        template.company = None;
        template.industry = Some("  ".to_owned());

        // Act
        let instructions = compile(&template, 1).unwrap();

        // Assert
        assert!(instructions.starts_with(
            "You are an interviewer conducting a Market Entry case interview.\n"
        ));
        assert!(!instructions.contains("on behalf of"));
        assert!(!instructions.contains("EVALUATOR NOTES"));
    }

    #[test]
    fn test_last_question_closes_the_case() {
        let instructions = compile(&market_entry(LeadType::InterviewerLed), 3).unwrap();

        assert!(instructions.contains("QUESTION 3 OF 3\nWhat is your recommendation?"));
        assert!(instructions.contains("tell the candidate that the case is complete"));
    }

    #[test]
    fn test_out_of_range_question_is_invalid() {
        let template = market_entry(LeadType::InterviewerLed);

        for number in [0, 4] {
            assert!(matches!(
                compile(&template, number),
                Err(DomainError::InvalidQuestion { .. })
            ));
        }
    }
}
