use bytes::Bytes;

use crate::config::InterviewConfig;
use crate::sessions::repo::ExperienceLevel;

/// Raw multipart fields from the create-session request, collected before any
/// validation. Field names arrive in both snake_case and the camelCase the
/// older web client sends, so both spellings land in the same slot.
#[derive(Debug, Default)]
pub struct NewSessionForm {
    pub title: Option<String>,
    pub job_role: Option<String>,
    pub experience_level: Option<String>,
    pub job_description: Option<String>,
    pub number_questions: Option<String>,
    pub live_coding: Option<String>,
    pub resume_text: Option<String>,
    pub resume_file: Option<ResumeUpload>,
}

#[derive(Debug)]
pub struct ResumeUpload {
    pub filename: String,
    pub body: Bytes,
}

impl NewSessionForm {
    pub fn accept_text_field(&mut self, name: &str, value: String) {
        match name {
            "title" | "interview_title" => self.title = Some(value),
            "job_role" | "jobRole" => self.job_role = Some(value),
            "experience_level" | "experienceLevel" => self.experience_level = Some(value),
            "job_description" | "jobDescription" => self.job_description = Some(value),
            "number_questions" => self.number_questions = Some(value),
            "isLiveCoding" | "is_live_coding" => self.live_coding = Some(value),
            "resume_text" => self.resume_text = Some(value),
            _ => {}
        }
    }
}

/// Creation parameters that passed validation. Ownership and the stored
/// resume reference are filled in by the handler.
#[derive(Debug, PartialEq, Eq)]
pub struct SessionDraft {
    pub title: String,
    pub job_role: String,
    pub experience_level: ExperienceLevel,
    pub job_description: String,
    pub total_questions: i32,
    pub live_coding: bool,
}

/// Validate the collected form. `Err` carries the client-facing message for a
/// 400 response.
pub fn validate_new_session(
    form: &NewSessionForm,
    limits: &InterviewConfig,
) -> Result<SessionDraft, String> {
    let title = required_trimmed(form.title.as_deref(), "title")?;
    let job_role = required_trimmed(form.job_role.as_deref(), "job_role")?;

    let level_raw = required_trimmed(form.experience_level.as_deref(), "experience_level")?;
    let experience_level = ExperienceLevel::parse(&level_raw)
        .ok_or_else(|| "experience_level must be one of entry, mid, senior".to_string())?;

    let job_description = form
        .job_description
        .as_deref()
        .unwrap_or("")
        .trim()
        .to_string();

    let has_resume = form.resume_file.is_some()
        || form
            .resume_text
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
    if !has_resume && job_description.is_empty() {
        return Err("A resume or a job description is required".into());
    }

    let live_coding = form
        .live_coding
        .as_deref()
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

    // Bad input is rejected even when live-coding mode would override the
    // count anyway.
    let requested = match form
        .number_questions
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        None => limits.default_questions as i64,
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| "number_questions must be an integer".to_string())?,
    };
    let total_questions = if live_coding {
        limits.live_coding_questions as i32
    } else {
        // clamp needs min <= max even if the configured ceiling is 0
        requested.clamp(1, (limits.max_questions as i64).max(1)) as i32
    };

    Ok(SessionDraft {
        title,
        job_role,
        experience_level,
        job_description,
        total_questions,
        live_coding,
    })
}

/// Extensions accepted for an uploaded resume. PDF and Word files match the
/// original product; plain-text formats are welcome because they feed the
/// prompt directly.
pub fn allowed_resume_ext(ext: &str) -> bool {
    matches!(ext, "pdf" | "doc" | "docx" | "txt" | "md")
}

fn required_trimmed(value: Option<&str>, field: &str) -> Result<String, String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(format!("{field} is required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> InterviewConfig {
        InterviewConfig {
            default_questions: 5,
            max_questions: 6,
            live_coding_questions: 1,
        }
    }

    fn complete_form() -> NewSessionForm {
        let mut form = NewSessionForm::default();
        form.accept_text_field("title", "Backend screen".into());
        form.accept_text_field("job_role", "Backend Developer".into());
        form.accept_text_field("experience_level", "mid".into());
        form.accept_text_field("jobDescription", "Build APIs".into());
        form
    }

    #[test]
    fn camel_case_aliases_fill_the_same_slots() {
        let mut form = NewSessionForm::default();
        form.accept_text_field("interview_title", "T".into());
        form.accept_text_field("jobRole", "R".into());
        form.accept_text_field("experienceLevel", "senior".into());
        form.accept_text_field("job_description", "D".into());
        form.accept_text_field("unknown_field", "ignored".into());

        let draft = validate_new_session(&form, &limits()).unwrap();
        assert_eq!(draft.title, "T");
        assert_eq!(draft.job_role, "R");
        assert_eq!(draft.experience_level, ExperienceLevel::Senior);
    }

    #[test]
    fn question_count_defaults_and_clamps() {
        let form = complete_form();
        assert_eq!(validate_new_session(&form, &limits()).unwrap().total_questions, 5);

        let mut form = complete_form();
        form.accept_text_field("number_questions", "99".into());
        assert_eq!(validate_new_session(&form, &limits()).unwrap().total_questions, 6);

        let mut form = complete_form();
        form.accept_text_field("number_questions", "0".into());
        assert_eq!(validate_new_session(&form, &limits()).unwrap().total_questions, 1);

        let mut form = complete_form();
        form.accept_text_field("number_questions", "-3".into());
        assert_eq!(validate_new_session(&form, &limits()).unwrap().total_questions, 1);
    }

    #[test]
    fn a_zero_question_ceiling_caps_at_one() {
        let limits = InterviewConfig {
            default_questions: 5,
            max_questions: 0,
            live_coding_questions: 1,
        };
        let mut form = complete_form();
        form.accept_text_field("number_questions", "3".into());
        assert_eq!(validate_new_session(&form, &limits).unwrap().total_questions, 1);

        // the default count is capped the same way
        let form = complete_form();
        assert_eq!(validate_new_session(&form, &limits).unwrap().total_questions, 1);
    }

    #[test]
    fn non_integer_question_count_is_rejected() {
        let mut form = complete_form();
        form.accept_text_field("number_questions", "five".into());
        let err = validate_new_session(&form, &limits()).unwrap_err();
        assert!(err.contains("integer"));

        // rejected even though live-coding mode would override the count
        form.accept_text_field("isLiveCoding", "true".into());
        assert!(validate_new_session(&form, &limits()).is_err());
    }

    #[test]
    fn live_coding_forces_the_configured_count() {
        let mut form = complete_form();
        form.accept_text_field("number_questions", "4".into());
        form.accept_text_field("isLiveCoding", "TRUE".into());
        let draft = validate_new_session(&form, &limits()).unwrap();
        assert!(draft.live_coding);
        assert_eq!(draft.total_questions, 1);

        let mut form = complete_form();
        form.accept_text_field("isLiveCoding", "false".into());
        assert!(!validate_new_session(&form, &limits()).unwrap().live_coding);
    }

    #[test]
    fn required_fields_are_enforced() {
        let mut form = complete_form();
        form.title = None;
        assert_eq!(validate_new_session(&form, &limits()).unwrap_err(), "title is required");

        let mut form = complete_form();
        form.job_role = Some("   ".into());
        assert!(validate_new_session(&form, &limits()).is_err());

        let mut form = complete_form();
        form.accept_text_field("experience_level", "principal".into());
        let err = validate_new_session(&form, &limits()).unwrap_err();
        assert!(err.contains("entry, mid, senior"));
    }

    #[test]
    fn needs_a_resume_or_a_job_description() {
        let mut form = complete_form();
        form.job_description = None;
        let err = validate_new_session(&form, &limits()).unwrap_err();
        assert!(err.contains("resume or a job description"));

        // pasted resume text satisfies the requirement
        form.accept_text_field("resume_text", "Ten years of Rust".into());
        assert!(validate_new_session(&form, &limits()).is_ok());

        // as does an uploaded file
        let mut form = complete_form();
        form.job_description = Some("".into());
        form.resume_file = Some(ResumeUpload {
            filename: "resume.pdf".into(),
            body: Bytes::from_static(b"%PDF-"),
        });
        assert!(validate_new_session(&form, &limits()).is_ok());
    }

    #[test]
    fn resume_extension_allow_list() {
        for ext in ["pdf", "doc", "docx", "txt", "md"] {
            assert!(allowed_resume_ext(ext), "{ext} should be allowed");
        }
        for ext in ["exe", "js", "png", ""] {
            assert!(!allowed_resume_ext(ext), "{ext} should be rejected");
        }
    }
}
