//! Checks run on form input before anything is sent to the server.
//!
//! A form that fails validation never produces a request. Errors are collected per field so a
//! form can show each message next to its input; only the first problem of each field is kept.

use crate::api::{MediaFile, RegisterProfile};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Largest accepted image (avatar, cover image, thumbnail).
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Largest accepted video upload.
pub const MAX_VIDEO_BYTES: u64 = 500 * 1024 * 1024;

pub const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

pub const VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/mov",
    "video/avi",
    "video/mkv",
    "video/webm",
];

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("valid username regex"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9_'+\-.]*[a-z0-9_+\-]@([a-z0-9][a-z0-9\-]*\.)+[a-z]{2,}$")
        .expect("valid email regex")
});

/// The form input a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Username,
    Email,
    FullName,
    Password,
    /// Email or username on the login form.
    Identifier,
    Title,
    VideoFile,
    Thumbnail,
    Avatar,
    CoverImage,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Username => "userName",
            Field::Email => "email",
            Field::FullName => "fullName",
            Field::Password => "password",
            Field::Identifier => "identifier",
            Field::Title => "title",
            Field::VideoFile => "videoFile",
            Field::Thumbnail => "thumbnail",
            Field::Avatar => "avatar",
            Field::CoverImage => "coverImage",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

/// Every problem found in one form.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", summarize(.0))]
pub struct ValidationErrors(Vec<FieldError>);

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The message for `field`, if it has one.
    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// The first message, for forms that show a single error line.
    pub fn first(&self) -> Option<&'static str> {
        self.0.first().map(|e| e.message)
    }

    /// Records `message` unless `field` already has one.
    fn add(&mut self, field: Field, message: &'static str) {
        if self.get(field).is_none() {
            self.0.push(FieldError { field, message });
        }
    }

    fn check(&mut self, field: Field, ok: bool, message: &'static str) {
        if !ok {
            self.add(field, message);
        }
    }

    fn merge(&mut self, other: Result<(), ValidationErrors>) {
        if let Err(other) = other {
            for error in other.0 {
                self.add(error.field, error.message);
            }
        }
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Validates the signup form.
pub fn validate_signup(profile: &RegisterProfile) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let username = &profile.username;
    let len = username.chars().count();
    errors.check(
        Field::Username,
        len >= 3,
        "Username must be at least 3 characters",
    );
    errors.check(
        Field::Username,
        len <= 20,
        "Username must be less than 20 characters",
    );
    errors.check(
        Field::Username,
        USERNAME_RE.is_match(username),
        "Username can only contain letters, numbers, and underscores",
    );
    errors.check(
        Field::Username,
        *username == username.to_lowercase(),
        "Username must be lowercase",
    );

    errors.check(
        Field::Email,
        is_valid_email(&profile.email),
        "Please enter a valid email address",
    );

    let len = profile.full_name.chars().count();
    errors.check(
        Field::FullName,
        len >= 2,
        "Full name must be at least 2 characters",
    );
    errors.check(
        Field::FullName,
        len <= 50,
        "Full name must be less than 50 characters",
    );
    errors.check(
        Field::FullName,
        !profile.full_name.trim().is_empty(),
        "Full name is required",
    );

    let len = profile.password.chars().count();
    errors.check(
        Field::Password,
        len >= 6,
        "Password must be at least 6 characters",
    );
    errors.check(Field::Password, len <= 100, "Password is too long");

    errors.into_result()
}

fn is_valid_email(email: &str) -> bool {
    !email.starts_with('.') && !email.contains("..") && EMAIL_RE.is_match(email)
}

/// Validates the login form: both inputs must be filled in.
pub fn validate_login(identifier: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    errors.check(
        Field::Identifier,
        !identifier.trim().is_empty(),
        "Please enter your email or username",
    );
    errors.check(
        Field::Password,
        !password.is_empty(),
        "Please enter your password",
    );
    errors.into_result()
}

/// Validates an image picked for `field` (avatar, cover image or thumbnail).
pub fn validate_image(field: Field, file: &MediaFile) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    errors.check(
        field,
        IMAGE_TYPES.contains(&file.content_type.as_str()),
        "Please select a valid image file (JPEG, PNG, or WebP)",
    );
    let too_large = if field == Field::Thumbnail {
        "Thumbnail image size must be less than 5MB"
    } else {
        "Image size must be less than 5MB"
    };
    errors.check(field, file.len() <= MAX_IMAGE_BYTES, too_large);
    errors.into_result()
}

/// Validates a video picked for upload.
pub fn validate_video(file: &MediaFile) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    errors.check(
        Field::VideoFile,
        VIDEO_TYPES.contains(&file.content_type.as_str()),
        "Please select a valid video file (MP4, MOV, AVI, MKV, or WebM)",
    );
    errors.check(
        Field::VideoFile,
        file.len() <= MAX_VIDEO_BYTES,
        "Video file size must be less than 500MB",
    );
    errors.into_result()
}

/// Validates the upload form as a whole, including the files it carries.
pub fn validate_upload(
    title: &str,
    video_file: Option<&MediaFile>,
    thumbnail: Option<&MediaFile>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    match video_file {
        Some(file) => errors.merge(validate_video(file)),
        None => errors.add(Field::VideoFile, "Please select a video file to upload"),
    }
    errors.check(
        Field::Title,
        !title.trim().is_empty(),
        "Please enter a title for your video",
    );
    if let Some(thumbnail) = thumbnail {
        errors.merge(validate_image(Field::Thumbnail, thumbnail));
    }
    errors.into_result()
}
