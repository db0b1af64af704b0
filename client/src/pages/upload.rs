//! The upload form.

use super::Feedback;
use crate::api::{ApiClient, MediaFile, NewVideo};
use crate::validation::{self, Field, ValidationErrors};
use tracing::instrument;

/// State of the upload form.
#[derive(Debug)]
pub struct UploadController {
    api: ApiClient,
    pub title: String,
    pub description: String,
    pub is_public: bool,
    video_file: Option<MediaFile>,
    thumbnail: Option<MediaFile>,
    uploading: bool,
    feedback: Option<Feedback>,
}

impl UploadController {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            title: String::new(),
            description: String::new(),
            is_public: true,
            video_file: None,
            thumbnail: None,
            uploading: false,
            feedback: None,
        }
    }

    pub fn video_file(&self) -> Option<&MediaFile> {
        self.video_file.as_ref()
    }

    pub fn thumbnail(&self) -> Option<&MediaFile> {
        self.thumbnail.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Picks the video to upload. An invalid file is rejected and the previous pick kept.
    pub fn select_video(&mut self, file: MediaFile) -> Result<(), ValidationErrors> {
        self.check(validation::validate_video(&file))?;
        self.video_file = Some(file);
        Ok(())
    }

    /// Picks the thumbnail. An invalid file is rejected and the previous pick kept.
    pub fn select_thumbnail(&mut self, file: MediaFile) -> Result<(), ValidationErrors> {
        self.check(validation::validate_image(Field::Thumbnail, &file))?;
        self.thumbnail = Some(file);
        Ok(())
    }

    /// Shows the first validation problem, or clears the feedback if there is none.
    fn check(&mut self, result: Result<(), ValidationErrors>) -> Result<(), ValidationErrors> {
        self.feedback = match &result {
            Ok(()) => None,
            Err(errors) => errors.first().map(Feedback::error),
        };
        result
    }

    pub fn clear_video(&mut self) {
        self.video_file = None;
    }

    pub fn clear_thumbnail(&mut self) {
        self.thumbnail = None;
    }

    /// Uploads the video.
    ///
    /// # Returns
    ///
    /// The id of the new video, which the caller can navigate to. `None` if the form was
    /// invalid or the upload failed; the reason is in [`feedback`](Self::feedback).
    #[instrument(skip(self), fields(title = %self.title))]
    pub async fn submit(&mut self) -> Option<String> {
        let valid = validation::validate_upload(
            &self.title,
            self.video_file.as_ref(),
            self.thumbnail.as_ref(),
        );
        self.check(valid).ok()?;
        let video_file = self.video_file.clone()?;

        let upload = NewVideo {
            title: self.title.clone(),
            description: self.description.clone(),
            video_file,
            thumbnail: self.thumbnail.clone(),
            is_public: self.is_public,
        };
        self.uploading = true;
        let result = self.api.publish_video(&upload).await;
        self.uploading = false;

        match result {
            Ok(video) => {
                self.feedback = Some(Feedback::success("Video uploaded successfully!"));
                Some(video.id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "upload failed");
                self.feedback = Some(Feedback::error(e.message));
                None
            }
        }
    }
}
