//! Prompt templates and the fixed fallback payloads for the provider calls.
//!
//! The templates pin down the JSON shapes the rest of the pipeline parses, so
//! any change here has to stay in sync with the deserializers in `types.rs`.

use crate::ai::types::{Evaluation, GeneratedQuestion, SpokenExchange};
use crate::questions::QuestionKind;

pub const QUESTION_SYSTEM: &str = "You are an expert interviewer. Generate professional, \
relevant interview questions based on job requirements and candidate background. Always \
return *raw JSON*. Do NOT wrap your response in markdown or code blocks.";

pub const INTERVIEWER_SYSTEM: &str = "You are an expert interviewer.";

pub const EVALUATOR_SYSTEM: &str = "You are an expert interview evaluator.";

pub const CODE_EVALUATOR_SYSTEM: &str =
    "You are an expert interview evaluator. Return JSON only, no text outside the JSON.";

fn or_placeholder<'a>(text: &'a str, placeholder: &'a str) -> &'a str {
    if text.trim().is_empty() {
        placeholder
    } else {
        text
    }
}

/// Mixed technical/behavioral question-generation prompt.
pub fn mixed_interview_prompt(
    job_role: &str,
    experience_level: &str,
    resume_text: &str,
    job_description: &str,
    count: u32,
) -> String {
    format!(
        r#"Generate **exactly {count}** interview questions for a {job_role} position with {experience_level} experience level.

Distribute them as a mix of technical and behavioral questions (technical should be slightly more than behavioral).

Resume context: {resume}
Job Description: {job_description}

Return a JSON array with this structure:
[
  {{
    "question_text": "Your question here",
    "question_type": "technical" or "behavioral",
    "tips": ["Use the STAR method", "Focus on your actions", "Show emotional intelligence"],
    "timeLimit": 120,
    "order_index": 1
  }}
]

Make questions relevant to the role and experience level. And ensure each question has at least 2 tips."#,
        count = count,
        job_role = job_role,
        experience_level = experience_level,
        resume = or_placeholder(resume_text, "No resume provided"),
        job_description = or_placeholder(job_description, "No description provided"),
    )
}

/// Live-coding DSA question-generation prompt.
pub fn live_coding_prompt(
    job_role: &str,
    experience_level: &str,
    resume_text: &str,
    job_description: &str,
    count: u32,
) -> String {
    format!(
        r#"Generate a set of {count} live coding DSA questions for a {job_role} position with {experience_level} experience level.

Resume context: {resume}

Job Description: {job_description}

Return the output strictly as a JSON array, where each object follows this structure:

[
  {{
    "question_text": "Implement a function that reverses a linked list.",
    "question_type": "live_coding",
    "tips": [
      "Sample Input/Output: [1,2,3,4] -> [4,3,2,1]",
      "Sample Input/Output: [] -> []",
      "Constraints: Must run in O(n) time and O(1) space",
      "Hint: Consider iterative and recursive approaches, and pointer manipulation"
    ],
    "timeLimit": 900,
    "order_index": 1
  }}
]

Guidelines for generating questions:
1. Always use 'live_coding' as the question_type.
2. Include at least 2 sample inputs and outputs per question inside the tips array.
3. Include constraints and hints in tips for guidance.
4. Questions should vary in difficulty (easy, medium, hard).
5. Ensure relevance to {job_role} and {experience_level} level.
6. Include a mix of problem types: arrays, strings, linked lists, trees, graphs, dynamic programming, etc.
7. Number questions sequentially in order_index, starting at 1.
8. Keep JSON strictly valid, with no extra text outside the array."#,
        count = count,
        job_role = job_role,
        experience_level = experience_level,
        resume = or_placeholder(resume_text, "No resume provided"),
        job_description = or_placeholder(job_description, "No description provided"),
    )
}

pub fn follow_up_prompt(question_text: &str, first_transcript: &str) -> String {
    format!(
        r#"You are a professional interviewer.
Based on the following audio recorded answer to the question "{question_text}", generate a natural follow-up question to probe deeper.
Answer: {first_transcript}
Return only the follow-up question."#,
    )
}

/// Scoring prompt for a full spoken exchange (first answer + follow-up).
pub fn spoken_evaluation_prompt(exchange: &SpokenExchange<'_>) -> String {
    format!(
        r#"Evaluate the following interview exchange based on the original and follow-up answers (the answers are recorded audio responses).
Question: {question}
Follow-up Question: {followup_question}
Candidate's First Answer: {first_answer}
Candidate's Follow-up Answer: {followup_answer}
Job Role: {job_role}
Experience Level: {experience_level}
Evaluation criteria:
1. CONTENT QUALITY (40%)
2. VOICE TONE & CONFIDENCE (20%)
3. SPEAKING CLARITY (20%)
4. THOUGHT ORGANIZATION (20%)
Return JSON:
{{ "score": 8, "feedback": "Your detailed feedback here" }}. NB: For the feedback property let it be a string in html format. After giving the feedback for the places of improvement also provide example responses to clarify your recommendations."#,
        question = exchange.question_text,
        followup_question = exchange.followup_question,
        first_answer = exchange.first_transcript,
        followup_answer = exchange.followup_transcript,
        job_role = exchange.job_role,
        experience_level = exchange.experience_level,
    )
}

/// Scoring prompt for a coding submission. The feedback HTML skeleton is part
/// of the contract: criteria breakdown, improvements, at least two test cases
/// and a model solution.
pub fn code_evaluation_prompt(
    question_text: &str,
    code: &str,
    job_role: &str,
    experience_level: &str,
) -> String {
    format!(
        r#"You are an expert interviewer. Evaluate the following candidate's solution to a Data Structures & Algorithms (DSA) coding question.

Question: {question_text}
Candidate's Code Answer: {code}

Job Role: {job_role}
Experience Level: {experience_level}

Evaluation criteria (weight in parentheses):
1. CORRECTNESS (40%) - Does the code solve the problem as stated? Does it handle edge cases? Are results accurate?
2. EFFICIENCY (20%) - Time and space complexity. Does the candidate choose an optimal or near-optimal approach?
3. CODE QUALITY (20%) - Readability, structure, naming, modularity, maintainability, use of language idioms.
4. PROBLEM-SOLVING EXPLANATION (20%) - Clarity of reasoning behind the approach (if inferred from code), evidence of systematic thinking.

Return JSON:
{{
  "score": 0-10 (integer),
  "feedback": "<html>
    <h3>Evaluation</h3>
    <ul>
      <li>Correctness: .../40%</li>
      <li>Efficiency: .../20%</li>
      <li>Code Quality: .../20%</li>
      <li>Problem-Solving Explanation: .../20%</li>
    </ul>
    <h3>Improvements</h3>
    <p>List specific improvements the candidate could make.</p>
    <h3>Example Test Cases</h3>
    <ul>
      <li>Input: ... -> Output: ...</li>
      <li>Input: ... -> Output: ...</li>
    </ul>
    <h3>Model Solution</h3>
    <pre><code>// Provide an improved or correct version of the code here</code></pre>
  </html>"
}}

Guidelines:
- Score must be an integer 0-10 based on the weighted criteria.
- Feedback must be in HTML format (structured, copy-paste friendly).
- Always include at least 2 test cases in the feedback.
- Provide a corrected/optimized model solution (same language as candidate code if possible)."#,
    )
}

/// Instruction block for the ephemeral realtime voice session.
pub fn realtime_instructions(question_text: &str, job_role: &str, experience_level: &str) -> String {
    format!(
        r#"You are an AI interview evaluator conducting a real-time voice assessment.

Your role: Evaluate both content and delivery for a {job_role} position at {experience_level} level.

Current question: "{question_text}"

Evaluation criteria:
1. CONTENT QUALITY (40%): Relevance, depth, technical accuracy, examples
2. VOICE TONE & CONFIDENCE (20%): Professional tone, confidence level, enthusiasm
3. SPEAKING CLARITY (20%): Pace, articulation, filler words, pauses
4. THOUGHT ORGANIZATION (20%): Logical flow, structure, coherence

Provide real-time feedback and ask follow-up questions to dive deeper into their experience. Focus on both what they say and how they say it. Give specific feedback on their communication style.

Be encouraging but thorough in your evaluation."#,
    )
}

/// The fixed question set substituted when the model's output cannot be
/// parsed. Always exactly five questions with valid kinds.
pub fn fallback_questions() -> Vec<GeneratedQuestion> {
    let entries: [(&str, QuestionKind); 5] = [
        (
            "Tell me about yourself and your background.",
            QuestionKind::Behavioral,
        ),
        (
            "What interests you about this role?",
            QuestionKind::Behavioral,
        ),
        (
            "Describe a challenging project you've worked on.",
            QuestionKind::Behavioral,
        ),
        ("What are your technical strengths?", QuestionKind::Technical),
        (
            "Where do you see yourself in 5 years?",
            QuestionKind::Behavioral,
        ),
    ];
    entries
        .into_iter()
        .enumerate()
        .map(|(i, (text, kind))| GeneratedQuestion {
            text: text.to_string(),
            kind,
            tips: Vec::new(),
            time_limit_secs: None,
            order_index: (i + 1) as i32,
        })
        .collect()
}

/// Neutral evaluation substituted when the model's scoring output cannot be
/// parsed.
pub fn fallback_evaluation() -> Evaluation {
    Evaluation {
        score: 6,
        feedback: "Thanks for your answers. Try to include specific examples and communicate \
                   more clearly next time."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_prompt_mentions_role_level_and_count() {
        let p = mixed_interview_prompt("Backend Developer", "mid", "", "Build APIs", 5);
        assert!(p.contains("exactly 5"));
        assert!(p.contains("Backend Developer"));
        assert!(p.contains("mid experience level"));
        assert!(p.contains("No resume provided"));
        assert!(p.contains("Build APIs"));
    }

    #[test]
    fn live_coding_prompt_pins_question_type() {
        let p = live_coding_prompt("Backend Developer", "senior", "10 years of Rust", "", 1);
        assert!(p.contains("1 live coding DSA"));
        assert!(p.contains("'live_coding' as the question_type"));
        assert!(p.contains("10 years of Rust"));
        assert!(p.contains("No description provided"));
    }

    #[test]
    fn follow_up_prompt_embeds_question_and_answer() {
        let p = follow_up_prompt("Why Rust?", "Because of the borrow checker.");
        assert!(p.contains("\"Why Rust?\""));
        assert!(p.contains("Because of the borrow checker."));
        assert!(p.contains("Return only the follow-up question."));
    }

    #[test]
    fn evaluation_prompt_lists_all_four_criteria() {
        let exchange = SpokenExchange {
            question_text: "Q",
            followup_question: "FQ",
            first_transcript: "A1",
            followup_transcript: "A2",
            job_role: "Backend Developer",
            experience_level: "entry",
        };
        let p = spoken_evaluation_prompt(&exchange);
        assert!(p.contains("CONTENT QUALITY (40%)"));
        assert!(p.contains("VOICE TONE & CONFIDENCE (20%)"));
        assert!(p.contains("SPEAKING CLARITY (20%)"));
        assert!(p.contains("THOUGHT ORGANIZATION (20%)"));
        assert!(p.contains("Backend Developer"));
    }

    #[test]
    fn code_evaluation_prompt_demands_html_structure() {
        let p = code_evaluation_prompt("Reverse a list", "fn main() {}", "SWE", "mid");
        assert!(p.contains("Example Test Cases"));
        assert!(p.contains("Model Solution"));
        assert!(p.contains("fn main() {}"));
        assert!(p.contains("at least 2 test cases"));
    }

    #[test]
    fn fallback_set_is_exactly_five_with_valid_kinds() {
        let qs = fallback_questions();
        assert_eq!(qs.len(), 5);
        for (i, q) in qs.iter().enumerate() {
            assert_eq!(q.order_index, (i + 1) as i32);
            assert!(matches!(
                q.kind,
                QuestionKind::Technical | QuestionKind::Behavioral
            ));
            assert!(!q.text.is_empty());
        }
    }

    #[test]
    fn fallback_evaluation_is_well_formed() {
        let e = fallback_evaluation();
        assert!((0..=10).contains(&e.score));
        assert!(!e.feedback.is_empty());
    }
}
