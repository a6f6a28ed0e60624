//! Form binding and validation.
//!
//! Each form is raw submitted data plus a pure validation function that
//! returns either the cleaned values or a map of field errors. Rendering
//! is left to the caller through [`FormState`].

use std::{borrow::Cow, collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{entity::prelude::*, ids::GroupId};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str = "Upload a valid image.";

const IMAGE_EXTENSIONS: &[&str] = &["gif", "png", "jpg", "jpeg", "webp", "bmp"];

/// Field name to messages, in field order.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// How a form is presented: the values to show, their errors, and whether
/// anything was submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormState<D> {
    pub data: D,
    pub errors: FieldErrors,
    pub is_bound: bool,
}

impl<D: Default> FormState<D> {
    pub fn unbound() -> Self {
        Self::initial(D::default())
    }
}

impl<D> FormState<D> {
    /// Unbound form prefilled with existing values
    pub fn initial(data: D) -> Self {
        Self {
            data,
            errors: FieldErrors::new(),
            is_bound: false,
        }
    }

    /// Bound form that failed validation; keeps what the user typed
    pub fn invalid(data: D, errors: FieldErrors) -> Self {
        Self {
            data,
            errors,
            is_bound: true,
        }
    }
}

/// Raw post form submission. Empty strings mean "not provided".
///
/// `group` carries a group id; `image` carries the path the file store
/// assigned to an uploaded picture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFormData {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub image: String,
}

impl PostFormData {
    pub fn from_post(post: &PostModel) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
            image: post.image.clone().unwrap_or_default(),
        }
    }
}

/// Post fields that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPost {
    pub text: String,
    pub group: Option<GroupId>,
    pub image: Option<String>,
}

#[derive(Debug, Validate)]
struct PostInput {
    #[validate(length(min = 1, message = "This field is required."))]
    text: String,
    #[validate(custom(function = "validate_image_path"))]
    image: String,
}

fn validate_image_path(path: &str) -> Result<(), ValidationError> {
    if path.is_empty() || is_image_path(path) {
        return Ok(());
    }

    Err(ValidationError::new("invalid_image").with_message(Cow::Borrowed(INVALID_IMAGE)))
}

fn is_image_path(path: &str) -> bool {
    if path.starts_with('/') || path.contains('\\') || path.split('/').any(|part| part == "..") {
        return false;
    }

    let path = Path::new(path);
    let has_stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| !stem.is_empty());
    let has_image_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));

    has_stem && has_image_extension
}

/// Validate a post submission against the groups it may be filed under.
pub fn validate_post(data: &PostFormData, choices: &[GroupModel]) -> Result<ValidPost, FieldErrors> {
    let input = PostInput {
        text: data.text.trim().to_string(),
        image: data.image.trim().to_string(),
    };

    let mut errors = match input.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => collect_errors(e),
    };

    let group = match data.group.trim() {
        "" => None,
        raw => {
            let choice = GroupId::parse_str(raw)
                .ok()
                .filter(|id| choices.iter().any(|group| group.id == *id));
            if choice.is_none() {
                errors
                    .entry("group".to_string())
                    .or_default()
                    .push(INVALID_CHOICE.to_string());
            }
            choice
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidPost {
        text: input.text,
        group,
        image: (!input.image.is_empty()).then_some(input.image),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentFormData {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Validate)]
struct CommentInput {
    #[validate(length(min = 1, message = "This field is required."))]
    text: String,
}

/// Returns the cleaned comment text.
pub fn validate_comment(data: &CommentFormData) -> Result<String, FieldErrors> {
    let input = CommentInput {
        text: data.text.trim().to_string(),
    };

    input.validate().map_err(collect_errors)?;
    Ok(input.text)
}

fn collect_errors(errors: ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => e.code.to_string(),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(slug: &str) -> GroupModel {
        GroupModel {
            id: GroupId::new(),
            slug: slug.to_string(),
            title: slug.to_string(),
            description: String::new(),
        }
    }

    fn data(text: &str, group: &str, image: &str) -> PostFormData {
        PostFormData {
            text: text.to_string(),
            group: group.to_string(),
            image: image.to_string(),
        }
    }

    #[test]
    fn accepts_text_only() {
        let valid = validate_post(&data("  Hello  ", "", ""), &[]).unwrap();
        assert_eq!(valid.text, "Hello");
        assert_eq!(valid.group, None);
        assert_eq!(valid.image, None);
    }

    #[test]
    fn accepts_known_group_and_image() {
        let cats = group("cats");
        let valid = validate_post(
            &data("Hello", &cats.id.to_string(), "posts/small.gif"),
            std::slice::from_ref(&cats),
        )
        .unwrap();
        assert_eq!(valid.group, Some(cats.id));
        assert_eq!(valid.image.as_deref(), Some("posts/small.gif"));
    }

    #[test]
    fn blank_text_is_required() {
        let errors = validate_post(&data("   ", "", ""), &[]).unwrap_err();
        assert_eq!(errors["text"], vec![REQUIRED.to_string()]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn unknown_group_is_an_invalid_choice() {
        let errors = validate_post(&data("Hello", &GroupId::new().to_string(), ""), &[group("cats")])
            .unwrap_err();
        assert_eq!(errors["group"], vec![INVALID_CHOICE.to_string()]);

        let errors = validate_post(&data("Hello", "not-an-id", ""), &[]).unwrap_err();
        assert!(errors.contains_key("group"));
    }

    #[test]
    fn rejects_non_image_references() {
        for bad in ["posts/notes.txt", "/etc/passwd.png", "posts/../secret.gif", "posts/.gif"] {
            let errors = validate_post(&data("Hello", "", bad), &[]).unwrap_err();
            assert_eq!(errors["image"], vec![INVALID_IMAGE.to_string()], "{bad}");
        }
    }

    #[test]
    fn reports_every_failing_field() {
        let errors = validate_post(&data("", "bogus", "x.exe"), &[]).unwrap_err();
        let fields: Vec<_> = errors.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["group", "image", "text"]);
    }

    #[test]
    fn comment_text_is_required() {
        let errors = validate_comment(&CommentFormData::default()).unwrap_err();
        assert_eq!(errors["text"], vec![REQUIRED.to_string()]);

        let text = validate_comment(&CommentFormData {
            text: " nice post ".to_string(),
        })
        .unwrap();
        assert_eq!(text, "nice post");
    }
}
