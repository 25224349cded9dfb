//! [`Property`]-related [`Database`] implementations.

use common::operations::{By, Delete, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        property::{self, Fields, Location, Rates, SellerInfo},
        Property,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of a full [`Property`] snapshot.
const COLUMNS: &str = "\
    id, owner_id, \
    kind, name, description, \
    street, city, state, zipcode, \
    beds, baths, square_feet, \
    amenities, \
    weekly_rate, monthly_rate, nightly_rate, \
    seller_name, seller_email, seller_phone, \
    images, \
    created_at, updated_at";

/// Reads a [`Property`] out of the provided [`Row`] selected with [`COLUMNS`].
fn from_row(row: &Row) -> Property {
    Property {
        id: row.get("id"),
        owner: row.get("owner_id"),
        fields: Fields {
            kind: row.get("kind"),
            name: row.get("name"),
            description: row.get("description"),
            location: Location {
                street: row.get("street"),
                city: row.get("city"),
                state: row.get("state"),
                zipcode: row.get("zipcode"),
            },
            beds: row.get("beds"),
            baths: row.get("baths"),
            square_feet: row.get("square_feet"),
            amenities: row.get("amenities"),
            rates: Rates {
                weekly: row.get("weekly_rate"),
                monthly: row.get("monthly_rate"),
                nightly: row.get("nightly_rate"),
            },
            seller_info: SellerInfo {
                name: row.get("seller_name"),
                email: row.get("seller_email"),
                phone: row.get("seller_phone"),
            },
        },
        images: row.get("images"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Property>, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: property::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM properties \
             WHERE id = $1::UUID \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Lock<By<Property, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: property::Id = by.into_inner();

        // Row is held until the end of the current transaction.
        const SQL: &str = "\
            SELECT id \
            FROM properties \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Update<Property>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(property): Update<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        let Property {
            id,
            owner: _,
            fields:
                Fields {
                    kind,
                    name,
                    description,
                    location:
                        Location {
                            street,
                            city,
                            state,
                            zipcode,
                        },
                    beds,
                    baths,
                    square_feet,
                    amenities,
                    rates:
                        Rates {
                            weekly,
                            monthly,
                            nightly,
                        },
                    seller_info:
                        SellerInfo {
                            name: seller_name,
                            email: seller_email,
                            phone: seller_phone,
                        },
                },
            images,
            created_at: _,
            updated_at,
        } = property;

        // `owner_id` and `created_at` are never rewritten.
        const SQL: &str = "\
            UPDATE properties \
            SET kind = $2::VARCHAR, \
                name = $3::VARCHAR, \
                description = $4::TEXT, \
                street = $5::VARCHAR, \
                city = $6::VARCHAR, \
                state = $7::VARCHAR, \
                zipcode = $8::VARCHAR, \
                beds = $9::NUMERIC, \
                baths = $10::NUMERIC, \
                square_feet = $11::NUMERIC, \
                amenities = $12::VARCHAR[], \
                weekly_rate = $13::NUMERIC, \
                monthly_rate = $14::NUMERIC, \
                nightly_rate = $15::NUMERIC, \
                seller_name = $16::VARCHAR, \
                seller_email = $17::VARCHAR, \
                seller_phone = $18::VARCHAR, \
                images = $19::VARCHAR[], \
                updated_at = $20::TIMESTAMPTZ \
            WHERE id = $1::UUID";
        self.exec(
            SQL,
            &[
                &id,
                &kind,
                &name,
                &description,
                &street,
                &city,
                &state,
                &zipcode,
                &beds,
                &baths,
                &square_feet,
                &amenities,
                &weekly,
                &monthly,
                &nightly,
                &seller_name,
                &seller_email,
                &seller_phone,
                &images,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Property, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: property::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM properties \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
