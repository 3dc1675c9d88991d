use std::collections::HashMap;

use crate::GenerationError;
use indoc::indoc;
use subst::substitute;

const GENERATE_APPLICATION: &str = indoc! { "
  You need to write job application material for a candidate applying to the job posting below.

  This is the job posting (_note the XML-like tags delineate specific content_):
  <job_posting>
  ${POSTING}
  </job_posting>

  This is the candidate's profile:
  <candidate_profile>
  ${PROFILE}
  </candidate_profile>

  Write:
  1. A CV tailored to the posting. Emphasize the candidate's skills and experience that match the requirements. Do not invent employers, degrees or dates that are not in the profile.
  2. A motivation letter addressed to the company, one page at most.
  3. A compatibility percentage: an integer from 0 to 100 estimating how well the candidate matches the posting.

  Output only a single JSON object with exactly these keys and no other text:
  {
    \"cv\": \"<the tailored CV as plain text>\",
    \"motivation_letter\": \"<the motivation letter as plain text>\",
    \"compatibility_percentage\": <integer between 0 and 100>
  }
"};

/// Used when the caller supplied no profile.
pub const EMPTY_PROFILE: &str = "No profile was provided. Write a generic CV and letter for a strong applicant.";

pub fn prompt_generate_application(posting: &str, profile: &str) -> Result<String, GenerationError> {
    let res = substitute(GENERATE_APPLICATION, &{
        let mut v = HashMap::new();
        v.insert("POSTING".to_string(), posting.to_string());
        v.insert("PROFILE".to_string(), profile.to_string());
        v
    })?;
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_posting_and_profile() {
        let prompt = prompt_generate_application("{\"job_title\": \"Engineer\"}", "{\"name\": \"John Doe\"}").unwrap();
        assert!(prompt.contains("<job_posting>\n{\"job_title\": \"Engineer\"}\n</job_posting>"));
        assert!(prompt.contains("{\"name\": \"John Doe\"}"));
        assert!(prompt.contains("\"compatibility_percentage\""));
        assert!(!prompt.contains("${"));
    }

    #[test]
    fn test_substituted_values_are_not_expanded_again() {
        let prompt = prompt_generate_application("Salary in ${CURRENCY}", EMPTY_PROFILE).unwrap();
        assert!(prompt.contains("Salary in ${CURRENCY}"));
        assert!(prompt.contains(EMPTY_PROFILE));
    }
}
