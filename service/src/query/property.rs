//! [`Query`] collection related to a single [`Property`].

use common::operations::By;

use crate::domain::{property, Property};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Property`] by its [`property::Id`].
pub type ById = DatabaseQuery<By<Option<Property>, property::Id>>;

#[cfg(test)]
mod spec {
    use crate::{
        domain::{property, user},
        query::Query as _,
        test::{self, seed},
    };

    use super::ById;

    #[tokio::test]
    async fn finds_stored_property() {
        let service = test::service();
        let property = seed(service.database(), user::Id::new()).await;

        let found = service.execute(ById::by(property.id)).await.unwrap();

        assert_eq!(found, Some(property));
    }

    #[tokio::test]
    async fn returns_nothing_for_unknown_id() {
        let service = test::service();

        let found =
            service.execute(ById::by(property::Id::new())).await.unwrap();

        assert_eq!(found, None);
    }
}
