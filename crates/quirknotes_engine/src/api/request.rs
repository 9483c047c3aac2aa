/* 📖 # Why parse bodies into typed shapes first?

Each body-carrying endpoint declares the JSON shape it accepts (`CreateNoteBody`,
`PatchNoteBody`). serde rejects bodies that are not JSON objects or whose fields are not
strings, and the shape is then turned into a validated `NoteDraft` or `NotePatch`.
The handler only ever passes the validated value to the store.
*/

use serde::Deserialize;
use serde::de::DeserializeOwned;

use quirknotes_base::pal::http::HttpBody;
use quirknotes_base::{QuirkError, QuirkResult};

use crate::note::{NoteDraft, NotePatch};

/// Body of `POST /postNote`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateNoteBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl CreateNoteBody {
    pub fn into_draft(self) -> QuirkResult<NoteDraft> {
        NoteDraft::new(
            self.title.unwrap_or_default(),
            self.content.unwrap_or_default(),
        )
    }
}

/// Body of `PATCH /patchNote/:noteId`.
#[derive(Debug, Default, Deserialize)]
pub struct PatchNoteBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl PatchNoteBody {
    pub fn into_patch(self) -> QuirkResult<NotePatch> {
        NotePatch::new(self.title, self.content)
    }
}

/// Deserialize a request body. A blank body parses as `{}`.
pub fn parse_body<T: DeserializeOwned>(body: &HttpBody) -> QuirkResult<T> {
    let bytes = body.as_bytes();
    let bytes: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        bytes
    };
    serde_json::from_slice(bytes).map_err(|e| {
        Box::new(QuirkError::invalid_input(format!(
            "Invalid JSON body: {}",
            e
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::MISSING_FIELDS_MESSAGE;
    use quirknotes_base::ErrorClass;

    #[test]
    fn test_parse_create_body() {
        let body: CreateNoteBody =
            parse_body(&HttpBody::from(r#"{"title":"Groceries","content":"Milk, eggs"}"#)).unwrap();
        let draft = body.into_draft().unwrap();
        assert_eq!(draft.title(), "Groceries");
        assert_eq!(draft.content(), "Milk, eggs");
    }

    #[test]
    fn test_blank_body_is_empty_object() {
        let body: CreateNoteBody = parse_body(&HttpBody::empty()).unwrap();
        let err = body.into_draft().unwrap_err();
        assert_eq!(err.to_string(), MISSING_FIELDS_MESSAGE);

        let body: PatchNoteBody = parse_body(&HttpBody::from(" \n")).unwrap();
        assert!(body.title.is_none() && body.content.is_none());
    }

    #[test]
    fn test_null_field_counts_as_missing() {
        let body: CreateNoteBody =
            parse_body(&HttpBody::from(r#"{"title":null,"content":"x"}"#)).unwrap();
        assert!(body.into_draft().is_err());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let body: PatchNoteBody =
            parse_body(&HttpBody::from(r#"{"title":"t","color":"red"}"#)).unwrap();
        assert_eq!(body.into_patch().unwrap().title(), Some("t"));
    }

    #[test]
    fn test_non_string_field_is_input_error() {
        let err = parse_body::<CreateNoteBody>(&HttpBody::from(r#"{"title":42,"content":"x"}"#))
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Input);
        assert!(
            err.to_string()
                .starts_with("Invalid JSON body: invalid type: integer `42`, expected a string")
        );
    }

    #[test]
    fn test_malformed_json_is_input_error() {
        let err = parse_body::<PatchNoteBody>(&HttpBody::from("{title:")).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Input);
        assert!(err.to_string().starts_with("Invalid JSON body: "));
    }
}
