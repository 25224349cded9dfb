//! [`Command`] for deleting a [`Property`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    authorization::{authorize, Denial},
    domain::{property, user, Property},
    infra::{database, Database},
    Service,
};

use super::{timed, Command, Stage};

/// [`Command`] for deleting a [`Property`] by its owner.
#[derive(Clone, Copy, Debug)]
pub struct DeleteProperty {
    /// ID of the [`Property`] to delete.
    pub property_id: property::Id,

    /// ID of the caller, if authenticated.
    pub caller: Option<user::Id>,
}

impl<Db, St, Nt> Command<DeleteProperty> for Service<Db, St, Nt>
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
        > + Database<
            Delete<By<Property, property::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteProperty,
    ) -> Result<Self::Ok, Self::Err> {
        let DeleteProperty {
            property_id,
            caller,
        } = cmd;

        let mut stage = Stage::Authenticate;
        let res = self.run_delete(cmd, &mut stage).await;
        res.inspect_err(|e| {
            if matches!(e.as_ref(), ExecutionError::Denied(_)) {
                log::warn!(
                    %property_id, user_id = ?caller, %stage,
                    "`Property` deletion rejected: {e}",
                );
            } else {
                log::error!(
                    %property_id, user_id = ?caller, %stage,
                    "`Property` deletion failed: {e}",
                );
            }
        })
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
        > + Database<
            Delete<By<Property, property::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    /// Executes the [`DeleteProperty`] pipeline, tracking the [`Stage`] it
    /// has reached.
    async fn run_delete(
        &self,
        cmd: DeleteProperty,
        stage: &mut Stage,
    ) -> Result<Property, Traced<ExecutionError>> {
        use ExecutionError as E;

        let DeleteProperty {
            property_id,
            caller,
        } = cmd;
        let timeout = self.config().store_timeout;

        *stage = Stage::Authenticate;
        let user_id = caller
            .ok_or(Denial::Unauthenticated)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        *stage = Stage::Fetch;
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
        .map_err(tracerr::from_and_wrap!(=> E))?;

        *stage = Stage::Authorize;
        _ = authorize(Some(user_id), Some(&property))
            .map_err(tracerr::from_and_wrap!(=> E))?;

        *stage = Stage::Persist;
        timed(
            timeout,
            tx.execute(Delete(By::<Property, _>::new(property_id))),
            database::Error::Timeout,
        )
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))?;

        timed(timeout, tx.execute(Commit), database::Error::Timeout)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        if !property.images.is_empty() {
            log::info!(
                "`Property(id: {property_id})` deleted, leaving {} images in \
                 storage: {:?}",
                property.images.len(),
                property.images,
            );
        }
        Ok(property)
    }
}

/// Error of [`DeleteProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Caller is not allowed to delete the [`Property`].
    #[display("Deletion denied: {_0}")]
    Denied(Denial),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}
