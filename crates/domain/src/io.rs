use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{content::Content, error::DomainError};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ContentFormat {
    Json,
    Yaml,
}

impl ContentFormat {
    /// Picks a format from the file extension, defaulting to JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => ContentFormat::Yaml,
            _ => ContentFormat::Json,
        }
    }
}

pub fn decode_content(bytes: &[u8], format: ContentFormat) -> Result<Content, DomainError> {
    match format {
        ContentFormat::Json => serde_json::from_slice(bytes)
            .map_err(|err| DomainError::Serialization(err.to_string())),
        ContentFormat::Yaml => serde_yaml::from_slice(bytes)
            .map_err(|err| DomainError::Serialization(err.to_string())),
    }
}

pub fn encode_content(content: &Content, format: ContentFormat) -> Result<Vec<u8>, DomainError> {
    match format {
        ContentFormat::Json => serde_json::to_vec_pretty(content)
            .map_err(|err| DomainError::Serialization(err.to_string())),
        ContentFormat::Yaml => serde_yaml::to_string(content)
            .map(String::into_bytes)
            .map_err(|err| DomainError::Serialization(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::{Lesson, LessonStep};

    #[test]
    fn format_follows_extension() {
        assert_eq!(ContentFormat::from_path("a/b.yml"), ContentFormat::Yaml);
        assert_eq!(ContentFormat::from_path("a/b.YAML"), ContentFormat::Yaml);
        assert_eq!(ContentFormat::from_path("a/b.json"), ContentFormat::Json);
        assert_eq!(ContentFormat::from_path("noext"), ContentFormat::Json);
    }

    #[test]
    fn exports_json() {
        let lesson = Lesson::new(
            "id",
            "title",
            "desc",
            vec![LessonStep::new("s", "e").with_targets(["C4"])],
        );
        let bytes = encode_content(&Content::Lesson(lesson), ContentFormat::Json).unwrap();
        let output = String::from_utf8(bytes).unwrap();
        assert!(output.contains("\"title\": \"title\""));
        assert!(output.contains("\"kind\": \"lesson\""));
    }

    #[test]
    fn reads_yaml() {
        let yaml = "kind: exam\ntitle: Chords\nquestions:\n  - id: q1\n    question: Major triad\n    type: chord\n    pattern: [0, 4, 7]\n";
        let content = decode_content(yaml.as_bytes(), ContentFormat::Yaml).unwrap();
        match content {
            Content::Exam(exam) => assert_eq!(exam.questions[0].pattern, vec![0, 4, 7]),
            other => panic!("unexpected content {other:?}"),
        }
    }

    #[test]
    fn malformed_input_is_a_serialization_error() {
        let err = decode_content(b"{", ContentFormat::Json).unwrap_err();
        assert!(matches!(err, DomainError::Serialization(_)));
    }
}
