//! [`Command`] for updating a [`Property`].

pub mod form;
pub mod intent;

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update, Upload,
};
use derive_more::{Display, Error, From};
use futures::future;
use tracerr::Traced;
use tracing as log;

use crate::{
    authorization::{authorize, Denial},
    domain::{media, property, user, Property},
    infra::{database, storage, Database, Storage},
    Service,
};

use super::{timed, Command, Stage};

pub use self::{
    form::{Form, Part, Payload},
    intent::{Intent, MalformedPayload},
};

/// [`Command`] for replacing all the mutable data of a [`Property`] with the
/// submitted [`Payload`].
#[derive(Clone, Debug)]
pub struct UpdateProperty {
    /// ID of the [`Property`] to update.
    pub property_id: property::Id,

    /// ID of the caller, if authenticated.
    pub caller: Option<user::Id>,

    /// Submitted [`Payload`].
    pub payload: Payload,
}

impl<Db, St, Nt> Command<UpdateProperty> for Service<Db, St, Nt>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Property, property::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<Property>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
    St: Storage<
        Upload<storage::Object>,
        Ok = media::Reference,
        Err = Traced<storage::Error>,
    >,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateProperty,
    ) -> Result<Self::Ok, Self::Err> {
        let property_id = cmd.property_id;
        let caller = cmd.caller;

        let mut stage = Stage::Authenticate;
        let res = self.run_update(cmd, &mut stage).await;
        res.inspect_err(|e| {
            if e.as_ref().is_client_error() {
                log::warn!(
                    %property_id, user_id = ?caller, %stage,
                    "`Property` update rejected: {e}",
                );
            } else {
                log::error!(
                    %property_id, user_id = ?caller, %stage,
                    "`Property` update failed: {e}",
                );
            }
        })
    }
}

impl<Db, St, Nt> Service<Db, St, Nt>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Property, property::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<Property>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
    St: Storage<
        Upload<storage::Object>,
        Ok = media::Reference,
        Err = Traced<storage::Error>,
    >,
{
    /// Executes the [`UpdateProperty`] pipeline, tracking the [`Stage`] it
    /// has reached.
    async fn run_update(
        &self,
        cmd: UpdateProperty,
        stage: &mut Stage,
    ) -> Result<Property, Traced<ExecutionError>> {
        use ExecutionError as E;

        let UpdateProperty {
            property_id,
            caller,
            payload,
        } = cmd;

        *stage = Stage::Authenticate;
        let user_id = caller
            .ok_or(Denial::Unauthenticated)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        *stage = Stage::Fetch;
        let current = timed(
            self.config().store_timeout,
            self.database().execute(Select(By::new(property_id))),
            database::Error::Timeout,
        )
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))?
        .ok_or(Denial::NotFound)
        .map_err(tracerr::from_and_wrap!(=> E))?;

        *stage = Stage::Authorize;
        _ = authorize(Some(user_id), Some(&current))
            .map_err(tracerr::from_and_wrap!(=> E))?;

        *stage = Stage::Normalize;
        let Intent {
            fields,
            kept_images,
            attachments,
        } = Intent::normalize(payload)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let fields = fields.coerce().map_err(tracerr::from_and_wrap!(=> E))?;

        *stage = Stage::Upload;
        let uploaded = self.upload(attachments).await?;

        *stage = Stage::Persist;
        let images = property::merge_images(kept_images, uploaded.clone());
        self.persist(property_id, fields, images).await.inspect_err(|_| {
            if !uploaded.is_empty() {
                log::warn!(
                    "leaking {} uploaded images of `Property(id: \
                     {property_id})`: {uploaded:?}",
                    uploaded.len(),
                );
            }
        })
    }
}

impl<Db, St, Nt> Service<Db, St, Nt>
where
    St: Storage<
        Upload<storage::Object>,
        Ok = media::Reference,
        Err = Traced<storage::Error>,
    >,
{
    /// Uploads the provided [`media::Attachment`]s concurrently, returning
    /// their [`media::Reference`]s in the submission order.
    ///
    /// Every upload is awaited, even if some of them fail.
    ///
    /// # Errors
    ///
    /// With the first failed upload in the submission order.
    async fn upload(
        &self,
        attachments: Vec<media::Attachment>,
    ) -> Result<Vec<media::Reference>, Traced<ExecutionError>> {
        let results =
            future::join_all(attachments.into_iter().map(|attachment| {
                timed(
                    self.config().upload_timeout,
                    self.storage().execute(Upload(storage::Object {
                        namespace: self.config().upload_namespace.clone(),
                        attachment,
                    })),
                    storage::Error::Timeout,
                )
            }))
            .await;

        let mut uploaded = Vec::with_capacity(results.len());
        let mut failed = Vec::new();
        for res in results {
            match res {
                Ok(reference) => uploaded.push(reference),
                Err(e) => failed.push(e),
            }
        }

        let mut failed = failed.into_iter();
        let Some(first) = failed.next() else {
            return Ok(uploaded);
        };
        for e in failed {
            log::error!("image upload failed: {e}");
        }
        if !uploaded.is_empty() {
            log::warn!(
                "leaking {} uploaded images after failed upload: \
                 {uploaded:?}",
                uploaded.len(),
            );
        }
        Err(first).map_err(tracerr::map_from_and_wrap!(=> ExecutionError))
    }
}

impl<Db, St, Nt> Service<Db, St, Nt>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Property, property::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<Property>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    /// Replaces the mutable data of the [`Property`] with the provided one
    /// atomically.
    ///
    /// # Errors
    ///
    /// If the [`Property`] has disappeared, or the [`Database`] fails.
    async fn persist(
        &self,
        property_id: property::Id,
        fields: property::Fields,
        images: Vec<media::Reference>,
    ) -> Result<Property, Traced<ExecutionError>> {
        use ExecutionError as E;

        let timeout = self.config().store_timeout;

        let tx = timed(
            timeout,
            self.database().execute(Transact),
            database::Error::Timeout,
        )
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Property`.
        timed(
            timeout,
            tx.execute(Lock(By::<Property, _>::new(property_id))),
            database::Error::Timeout,
        )
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let property = timed(
            timeout,
            tx.execute(Select(By::<Option<Property>, _>::new(property_id))),
            database::Error::Timeout,
        )
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))?
        .ok_or(Denial::NotFound)
        .map_err(tracerr::from_and_wrap!(=> E))?
        .replaced(fields, images);

        timed(
            timeout,
            tx.execute(Update(property.clone())),
            database::Error::Timeout,
        )
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))?;

        timed(timeout, tx.execute(Commit), database::Error::Timeout)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(property)
    }
}

/// Error of [`UpdateProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Caller is not allowed to update the [`Property`].
    #[display("Update denied: {_0}")]
    Denied(Denial),

    /// Submitted [`Payload`] is malformed.
    #[display("Malformed payload: {_0}")]
    Malformed(MalformedPayload),

    /// [`Storage`] error.
    #[display("`Storage` operation failed: {_0}")]
    Upload(storage::Error),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

impl ExecutionError {
    /// Indicates whether this [`ExecutionError`] is caused by the caller
    /// rather than by the infrastructure.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Denied(_) | Self::Malformed(_))
    }
}

#[cfg(test)]
mod spec {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use common::operations::{By, Select, Upload};
    use tracerr::Traced;

    use crate::{
        authorization::Denial,
        command::{Command as _, Stage},
        domain::{media, property, user, Property},
        infra::{self, storage, Database as _, Storage},
        test::{self, seed},
        Service,
    };

    use super::{ExecutionError, Form, Payload, UpdateProperty};

    /// [`Storage`] failing on the configured uploads.
    #[derive(Clone, Debug, Default)]
    struct FlakyStorage {
        inner: infra::storage::Memory,
        calls: Arc<AtomicUsize>,
        fail_on: Vec<usize>,
        hang: bool,
    }

    impl Storage<Upload<storage::Object>> for FlakyStorage {
        type Ok = media::Reference;
        type Err = Traced<storage::Error>;

        async fn execute(
            &self,
            upload: Upload<storage::Object>,
        ) -> Result<Self::Ok, Self::Err> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
            if self.fail_on.contains(&n) {
                return Err(tracerr::new!(storage::Error::Rejected(
                    reqwest::StatusCode::BAD_GATEWAY,
                )));
            }
            self.inner.execute(upload).await
        }
    }

    fn service_with(
        storage: FlakyStorage,
    ) -> Service<infra::database::Memory, FlakyStorage, infra::notifier::Memory>
    {
        Service::new(
            test::config(),
            infra::database::Memory::new(),
            storage,
            infra::notifier::Memory::new(),
        )
    }

    async fn stored(
        db: &infra::database::Memory,
        id: property::Id,
    ) -> Option<Property> {
        db.execute(Select(By::new(id))).await.unwrap()
    }

    fn update(
        property: &Property,
        caller: Option<user::Id>,
        form: Form,
    ) -> UpdateProperty {
        UpdateProperty {
            property_id: property.id,
            caller,
            payload: Payload::Form(form),
        }
    }

    #[tokio::test]
    async fn replaces_fields_and_merges_images() {
        let service = test::service();
        let owner = user::Id::new();
        let property = seed(service.database(), owner).await;

        let updated = service
            .execute(update(
                &property,
                Some(owner),
                Form::new()
                    .text("name", "Cozy Cabin")
                    .text("beds", "2")
                    .text("amenities", "Wifi")
                    .text("existingImages", r#"["https://cdn/b.jpg"]"#)
                    .file("images", "c.png", Some("image/png"), vec![1])
                    .file("images", "d.jpg", None, vec![2]),
            ))
            .await
            .unwrap();

        let uploaded = service.storage().references().await;
        assert_eq!(uploaded.len(), 2);
        assert_eq!(
            updated.images,
            [
                media::Reference::new("https://cdn/b.jpg"),
                uploaded[0].clone(),
                uploaded[1].clone(),
            ],
        );
        assert_eq!(
            updated.fields.name,
            Some(property::Name::from("Cozy Cabin".to_owned())),
        );
        assert_eq!(updated.fields.amenities.len(), 1);
        assert_eq!(updated.fields.description, None);
        assert_eq!(updated.id, property.id);
        assert_eq!(updated.owner, owner);
        assert_eq!(updated.created_at, property.created_at);
        assert!(updated.updated_at > property.updated_at);
        assert_eq!(
            stored(service.database(), property.id).await,
            Some(updated),
        );
    }

    #[tokio::test]
    async fn owner_cannot_be_reassigned() {
        let service = test::service();
        let owner = user::Id::new();
        let property = seed(service.database(), owner).await;

        let updated = service
            .execute(update(
                &property,
                Some(owner),
                Form::new().text("owner", user::Id::new().to_string()),
            ))
            .await
            .unwrap();

        assert_eq!(updated.owner, owner);
    }

    #[tokio::test]
    async fn drops_images_missing_from_kept_list() {
        let service = test::service();
        let owner = user::Id::new();
        let property = seed(service.database(), owner).await;

        let updated = service
            .execute(update(
                &property,
                Some(owner),
                Form::new().text("existingImages", "not json"),
            ))
            .await
            .unwrap();

        assert!(updated.images.is_empty());
        assert!(service.storage().references().await.is_empty());
    }

    #[tokio::test]
    async fn denies_foreign_caller_without_changes() {
        let service = test::service();
        let property = seed(service.database(), user::Id::new()).await;
        let stranger = user::Id::new();

        let err = service
            .execute(update(
                &property,
                Some(stranger),
                Form::new()
                    .text("name", "Hijacked")
                    .file("images", "x.jpg", None, vec![1]),
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Denied(Denial::Forbidden { user_id, .. })
                if *user_id == stranger,
        ));
        assert!(service.storage().references().await.is_empty());
        assert_eq!(
            stored(service.database(), property.id).await,
            Some(property),
        );
    }

    #[tokio::test]
    async fn denies_anonymous_caller() {
        let service = test::service();
        let property = seed(service.database(), user::Id::new()).await;

        let err = service
            .execute(update(&property, None, Form::new()))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Denied(Denial::Unauthenticated),
        ));
    }

    #[tokio::test]
    async fn reports_missing_property() {
        let service = test::service();

        let err = service
            .execute(UpdateProperty {
                property_id: property::Id::new(),
                caller: Some(user::Id::new()),
                payload: Payload::Form(Form::new().text("name", "Ghost")),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Denied(Denial::NotFound),
        ));
    }

    #[tokio::test]
    async fn tracks_stage_of_denial() {
        let service = test::service();
        let property = seed(service.database(), user::Id::new()).await;

        let mut stage = Stage::Persist;
        _ = service
            .run_update(update(&property, None, Form::new()), &mut stage)
            .await
            .unwrap_err();
        assert_eq!(stage, Stage::Authenticate);

        let mut stage = Stage::Persist;
        let err = service
            .run_update(
                UpdateProperty {
                    property_id: property::Id::new(),
                    caller: Some(user::Id::new()),
                    payload: Payload::Form(Form::new()),
                },
                &mut stage,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Denied(Denial::NotFound),
        ));
        assert_eq!(stage, Stage::Fetch);

        let mut stage = Stage::Persist;
        _ = service
            .run_update(
                update(&property, Some(user::Id::new()), Form::new()),
                &mut stage,
            )
            .await
            .unwrap_err();
        assert_eq!(stage, Stage::Authorize);

        let mut stage = Stage::Authenticate;
        _ = service
            .run_update(
                update(
                    &property,
                    Some(property.owner),
                    Form::new().text("beds", "two"),
                ),
                &mut stage,
            )
            .await
            .unwrap_err();
        assert_eq!(stage, Stage::Normalize);
    }

    #[tokio::test]
    async fn rejects_malformed_numbers_before_uploading() {
        let service = test::service();
        let owner = user::Id::new();
        let property = seed(service.database(), owner).await;

        let err = service
            .execute(update(
                &property,
                Some(owner),
                Form::new()
                    .text("baths", "many")
                    .file("images", "x.jpg", None, vec![1]),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Malformed(_)));
        assert!(service.storage().references().await.is_empty());
        assert_eq!(
            stored(service.database(), property.id).await,
            Some(property),
        );
    }

    #[tokio::test]
    async fn rejects_unreadable_payload() {
        let service = test::service();
        let owner = user::Id::new();
        let property = seed(service.database(), owner).await;

        let err = service
            .execute(UpdateProperty {
                property_id: property.id,
                caller: Some(owner),
                payload: Payload::Unreadable("not multipart".into()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Malformed(_)));
    }

    #[tokio::test]
    async fn keeps_property_intact_on_partial_upload_failure() {
        let service = service_with(FlakyStorage {
            fail_on: vec![1],
            ..FlakyStorage::default()
        });
        let owner = user::Id::new();
        let property = seed(service.database(), owner).await;

        let err = service
            .execute(update(
                &property,
                Some(owner),
                Form::new()
                    .text("name", "Renamed")
                    .file("images", "a.jpg", None, vec![1])
                    .file("images", "b.jpg", None, vec![2])
                    .file("images", "c.jpg", None, vec![3]),
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Upload(storage::Error::Rejected(_)),
        ));
        assert_eq!(service.storage().calls.load(Ordering::SeqCst), 3);
        assert_eq!(service.storage().inner.references().await.len(), 2);
        assert_eq!(
            stored(service.database(), property.id).await,
            Some(property),
        );
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_hanging_uploads() {
        let service = service_with(FlakyStorage {
            hang: true,
            ..FlakyStorage::default()
        });
        let owner = user::Id::new();
        let property = seed(service.database(), owner).await;

        let err = service
            .execute(update(
                &property,
                Some(owner),
                Form::new().file("images", "a.jpg", None, vec![1]),
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Upload(storage::Error::Timeout),
        ));
        assert_eq!(
            stored(service.database(), property.id).await,
            Some(property),
        );
    }

    #[test]
    fn classifies_errors() {
        assert!(ExecutionError::Denied(Denial::NotFound).is_client_error());
        assert!(
            !ExecutionError::Upload(storage::Error::Timeout).is_client_error()
        );
    }
}
