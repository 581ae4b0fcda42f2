use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use models::icon::IconView;
use tracing::{debug, info, instrument, warn};

use super::domain::{CreateEmojiRequest, DatabaseInfo, DeleteEmojiRequest};
use super::permission::check_authorization;
use super::repository::IconRepository;
use crate::envelope::Envelope;
use crate::errors::ServiceError;

pub const CREATED_MESSAGE: &str = "New emoji added successfully";
pub const DUPLICATE_MESSAGE: &str = "Ooops something went wrong, emoji already exists";
pub const DELETED_MESSAGE: &str = "Emoji deleted successfully";
pub const CREATE_FORBIDDEN_MESSAGE: &str = "You are not authorized to create new emoji";
pub const DELETE_FORBIDDEN_MESSAGE: &str = "You are not authorized to delete this emoji";

/// Emoji business service independent of transport.
///
/// Read paths never fail: storage errors come back as a `NOT FOUND` envelope.
/// Mutations return `ServiceError::Unauthorized` when the permission check
/// decides the outcome, and propagate storage errors.
pub struct EmojiService<R: IconRepository + ?Sized> {
    repo: Arc<R>,
    database: Option<DatabaseInfo>,
}

impl<R: IconRepository + ?Sized> EmojiService<R> {
    pub fn new(repo: Arc<R>, database: Option<DatabaseInfo>) -> Self { Self { repo, database } }

    pub async fn list_all(&self) -> Envelope<Vec<IconView>> {
        match self.repo.list_all().await {
            Ok(rows) => Envelope::ok(rows),
            Err(e) => {
                warn!(error = %e, "list icons failed");
                Envelope::not_found()
            }
        }
    }

    pub async fn get_one(&self, id: i64) -> Envelope<IconView> {
        let Ok(id) = i32::try_from(id) else {
            debug!(id, "icon id out of range");
            return Envelope::not_found();
        };
        match self.repo.get_by_id(id).await {
            Ok(view) => Envelope::ok(view),
            Err(e) => {
                debug!(id, error = %e, "icon lookup failed");
                Envelope::not_found()
            }
        }
    }

    pub fn database_info(&self) -> Envelope<DatabaseInfo> {
        match &self.database {
            Some(info) => Envelope::with_data("Ok", info.clone(), StatusCode::OK),
            None => Envelope::not_found(),
        }
    }

    /// Create an icon.
    ///
    /// A duplicate name answers 400 whatever the permission outcome; the
    /// permission failure only surfaces when the name is new.
    ///
    /// # Examples
    /// ```
    /// use service::emoji::{EmojiService, repository::mock::MockIconRepository};
    /// use service::emoji::domain::{CreateEmojiRequest, IconInput};
    /// use std::sync::Arc;
    /// let svc = EmojiService::new(Arc::new(MockIconRepository::default()), None);
    /// let req = CreateEmojiRequest {
    ///     data: IconInput { html_code: "1F600".into(), name: "grin".into() },
    ///     applicant: "dashboard_queue-1".into(),
    ///     recipient: "core_queue-2".into(),
    /// };
    /// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    /// let env = rt.block_on(svc.create_one(&req)).unwrap();
    /// assert_eq!(env.status, 201);
    /// ```
    #[instrument(skip(self, req), fields(name = %req.data.name, html_code = %req.data.html_code))]
    pub async fn create_one(&self, req: &CreateEmojiRequest) -> Result<Envelope<()>, ServiceError> {
        let authorized = check_authorization(&req.permission());
        let duplicate = self.repo.find_by_name(&req.data.name).await?.is_some();

        if authorized && !duplicate {
            let created = self.repo.insert(&req.data).await?;
            info!(id = created.id, "emoji_created");
            Ok(Envelope::message(CREATED_MESSAGE, StatusCode::CREATED))
        } else if duplicate {
            info!(authorized, "emoji_duplicate");
            Ok(Envelope::message(DUPLICATE_MESSAGE, StatusCode::BAD_REQUEST))
        } else {
            warn!(applicant = %req.applicant, recipient = %req.recipient, "emoji_create_unauthorized");
            Err(ServiceError::Unauthorized(CREATE_FORBIDDEN_MESSAGE.into()))
        }
    }

    /// Soft-delete an icon by stamping `deleted_at`.
    #[instrument(skip(self, req), fields(id = req.id))]
    pub async fn delete_one(&self, req: &DeleteEmojiRequest) -> Result<Envelope<()>, ServiceError> {
        if !check_authorization(&req.permission()) {
            warn!(applicant = %req.applicant, recipient = %req.recipient, "emoji_delete_unauthorized");
            return Err(ServiceError::Unauthorized(DELETE_FORBIDDEN_MESSAGE.into()));
        }

        match self.repo.find_by_id(req.id).await? {
            Some(mut icon) => {
                icon.deleted_at = Some(Utc::now().into());
                self.repo.save(icon).await?;
                info!("emoji_soft_deleted");
                Ok(Envelope::message(DELETED_MESSAGE, StatusCode::OK))
            }
            None => Ok(Envelope::not_found()),
        }
    }
}
