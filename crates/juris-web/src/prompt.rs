//! Query validation and the legal-analysis prompt template.
//! The orchestrator never re-validates; everything it receives has passed
//! through `validate_query` first.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("query must not be empty")]
    Empty,
    #[error("query is {actual} characters long; the limit is {max}")]
    TooLong { max: usize, actual: usize },
}

/// Returns the trimmed query when it is non-empty and within `max_chars`.
pub fn validate_query(query: &str, max_chars: usize) -> Result<&str, QueryError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(QueryError::Empty);
    }
    let actual = trimmed.chars().count();
    if actual > max_chars {
        return Err(QueryError::TooLong { max: max_chars, actual });
    }
    Ok(trimmed)
}

pub fn build_prompt(query: &str) -> String {
    format!(
        "You are a legal research assistant. Analyse the question below and answer \
         in plain language.\n\
         \n\
         Structure the answer as:\n\
         1. Summary: a short direct answer.\n\
         2. Relevant law: the statutes, doctrines or leading cases that usually apply.\n\
         3. Analysis: how those rules apply to the facts given.\n\
         4. Practical next steps: what the person could do now.\n\
         \n\
         Point out where the answer depends on jurisdiction or on facts not stated. \
         Close with a reminder that this is general information, not legal advice.\n\
         \n\
         Question:\n{query}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_whitespace_rejected() {
        assert_eq!(validate_query("", 2000), Err(QueryError::Empty));
        assert_eq!(validate_query(" \n\t ", 2000), Err(QueryError::Empty));
    }

    #[test]
    fn test_length_limit_counts_characters() {
        let at_limit = "é".repeat(2000);
        assert!(validate_query(&at_limit, 2000).is_ok());

        let over = "x".repeat(2001);
        assert_eq!(
            validate_query(&over, 2000),
            Err(QueryError::TooLong { max: 2000, actual: 2001 })
        );
    }

    #[test]
    fn test_query_is_trimmed_and_embedded() {
        let q = validate_query("  Can my employer read my work email?  ", 2000).unwrap();
        assert_eq!(q, "Can my employer read my work email?");
        let prompt = build_prompt(q);
        assert!(prompt.ends_with("Question:\nCan my employer read my work email?"));
        assert!(prompt.contains("not legal advice"));
    }
}
