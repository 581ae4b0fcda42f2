use async_trait::async_trait;
use models::errors::ModelError;
use models::icon::{self, IconView};
use sea_orm::DatabaseConnection;

use super::domain::IconInput;
use crate::errors::ServiceError;

/// Persistence gateway over the `icon` table.
#[async_trait]
pub trait IconRepository: Send + Sync {
    /// Every row, id order, projected to `{id, htmlCode, name}`.
    async fn list_all(&self) -> Result<Vec<IconView>, ServiceError>;
    /// `ServiceError::NotFound` when no row has this id.
    async fn get_by_id(&self, id: i32) -> Result<IconView, ServiceError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<icon::Model>, ServiceError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<icon::Model>, ServiceError>;
    /// Insert a new row with `created_at` = now.
    async fn insert(&self, input: &IconInput) -> Result<icon::Model, ServiceError>;
    /// Persist an existing, mutated row.
    async fn save(&self, icon: icon::Model) -> Result<icon::Model, ServiceError>;
}

fn db_err(e: ModelError) -> ServiceError {
    match e {
        ModelError::Db(msg) => ServiceError::Db(msg),
        other => ServiceError::Model(other),
    }
}

/// SeaORM-backed repository implementation.
pub struct SeaOrmIconRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmIconRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

#[async_trait]
impl IconRepository for SeaOrmIconRepository {
    async fn list_all(&self) -> Result<Vec<IconView>, ServiceError> {
        icon::list_views(&self.db).await.map_err(db_err)
    }

    async fn get_by_id(&self, id: i32) -> Result<IconView, ServiceError> {
        icon::find_view(&self.db, id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| ServiceError::not_found("icon"))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<icon::Model>, ServiceError> {
        icon::find_by_name(&self.db, name).await.map_err(db_err)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<icon::Model>, ServiceError> {
        icon::find_by_id(&self.db, id).await.map_err(db_err)
    }

    async fn insert(&self, input: &IconInput) -> Result<icon::Model, ServiceError> {
        icon::create(&self.db, &input.html_code, &input.name).await.map_err(db_err)
    }

    async fn save(&self, icon: icon::Model) -> Result<icon::Model, ServiceError> {
        icon::save(&self.db, icon).await.map_err(db_err)
    }
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Mutex, MutexGuard};

    /// Rows live in a `Vec`; ids are assigned sequentially from 1.
    /// `htmlCode` uniqueness is enforced like the table constraint, `name` is not.
    #[derive(Default)]
    pub struct MockIconRepository {
        rows: Mutex<Vec<icon::Model>>,
        unavailable: AtomicBool,
    }

    impl MockIconRepository {
        /// Make every call fail as if the connection were down.
        pub fn set_unavailable(&self, down: bool) { self.unavailable.store(down, Ordering::SeqCst); }

        pub fn snapshot(&self) -> Vec<icon::Model> {
            self.rows.lock().map(|rows| rows.clone()).unwrap_or_default()
        }

        fn rows(&self) -> Result<MutexGuard<'_, Vec<icon::Model>>, ServiceError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(ServiceError::Db("connection refused".into()));
            }
            self.rows.lock().map_err(|e| ServiceError::Db(e.to_string()))
        }
    }

    #[async_trait]
    impl IconRepository for MockIconRepository {
        async fn list_all(&self) -> Result<Vec<IconView>, ServiceError> {
            let mut views: Vec<IconView> = self.rows()?.iter().cloned().map(IconView::from).collect();
            views.sort_by_key(|v| v.id);
            Ok(views)
        }

        async fn get_by_id(&self, id: i32) -> Result<IconView, ServiceError> {
            self.rows()?
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .map(IconView::from)
                .ok_or_else(|| ServiceError::not_found("icon"))
        }

        async fn find_by_name(&self, name: &str) -> Result<Option<icon::Model>, ServiceError> {
            Ok(self.rows()?.iter().find(|r| r.name == name).cloned())
        }

        async fn find_by_id(&self, id: i32) -> Result<Option<icon::Model>, ServiceError> {
            Ok(self.rows()?.iter().find(|r| r.id == id).cloned())
        }

        async fn insert(&self, input: &IconInput) -> Result<icon::Model, ServiceError> {
            icon::validate_html_code(&input.html_code)?;
            icon::validate_name(&input.name)?;
            let mut rows = self.rows()?;
            if rows.iter().any(|r| r.html_code == input.html_code) {
                return Err(ServiceError::Db(format!("duplicate htmlCode {}", input.html_code)));
            }
            let id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
            let row = icon::Model {
                id,
                html_code: input.html_code.clone(),
                name: input.name.clone(),
                created_at: Utc::now().into(),
                updated_at: None,
                deleted_at: None,
            };
            rows.push(row.clone());
            Ok(row)
        }

        async fn save(&self, icon: icon::Model) -> Result<icon::Model, ServiceError> {
            let mut rows = self.rows()?;
            let slot = rows
                .iter_mut()
                .find(|r| r.id == icon.id)
                .ok_or_else(|| ServiceError::not_found("icon"))?;
            *slot = icon.clone();
            Ok(icon)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn seaorm_get_by_id_maps_empty_result_to_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, sea_orm::Value>>::new()])
            .into_connection();
        let repo = SeaOrmIconRepository::new(db);
        let err = repo.get_by_id(7).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn seaorm_query_failure_maps_to_db_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([sea_orm::DbErr::Custom("pool timed out".into())])
            .into_connection();
        let repo = SeaOrmIconRepository::new(db);
        let err = repo.list_all().await.unwrap_err();
        assert!(matches!(err, ServiceError::Db(_)));
    }

    #[tokio::test]
    async fn mock_enforces_html_code_but_not_name_uniqueness() {
        let repo = mock::MockIconRepository::default();
        let grin = IconInput { html_code: "1F600".into(), name: "grin".into() };
        repo.insert(&grin).await.unwrap();
        assert!(matches!(repo.insert(&grin).await, Err(ServiceError::Db(_))));

        // storage admits a second row with the same name; only the service guards names
        let same_name = IconInput { html_code: "1F601".into(), name: "grin".into() };
        let second = repo.insert(&same_name).await.unwrap();
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn mock_unavailable_fails_every_call() {
        let repo = mock::MockIconRepository::default();
        repo.set_unavailable(true);
        assert!(repo.list_all().await.is_err());
        assert!(repo.find_by_name("grin").await.is_err());
    }
}
