//! `PostgresMlsStore`: the sole `sea-orm` implementation of the `RelationalStore` port.
//! One adapter struct, one connection, every operation spec.md §4.4 lists plus the
//! sync-state/settings/quarantine/progress getters and setters layered on top.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, Set, Statement, TransactionTrait,
};
use std::sync::Arc;

use super::domain::{Listing, Member, MediaAsset, Office, OpenHouse, Room, UnitType};
use super::entity::{
    media, members, offices, open_houses, problematic_properties, progress_history, properties,
    rate_limit_events, rooms, settings, sync_state, unit_types,
};
use super::store::{
    ProblematicListingState, ProgressCounts, RelationalStore, RelationalStoreError, SyncResource,
};

pub struct PostgresMlsStore {
    db: Arc<DatabaseConnection>,
}

impl PostgresMlsStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn map_db_err(e: DbErr) -> RelationalStoreError {
    RelationalStoreError::Database(e.to_string())
}

fn to_decimal(v: Option<f64>) -> Option<sea_orm::prelude::Decimal> {
    v.and_then(sea_orm::prelude::Decimal::from_f64_retain)
}

fn to_tz(v: DateTime<Utc>) -> sea_orm::prelude::DateTimeWithTimeZone {
    v.fixed_offset()
}

fn from_tz(v: sea_orm::prelude::DateTimeWithTimeZone) -> DateTime<Utc> {
    v.with_timezone(&Utc)
}

#[async_trait]
impl RelationalStore for PostgresMlsStore {
    async fn upsert_listing(&self, listing: &Listing) -> Result<(), RelationalStoreError> {
        let now = Utc::now().fixed_offset();
        let model = properties::ActiveModel {
            listing_key: Set(listing.listing_key.clone()),
            originating_system: Set(listing.originating_system.clone()),
            standard_status: Set(listing.standard_status.clone()),
            property_type: Set(listing.property_type.clone()),
            property_sub_type: Set(listing.property_sub_type.clone()),
            list_price: Set(to_decimal(listing.list_price)),
            original_list_price: Set(to_decimal(listing.original_list_price)),
            bedrooms_total: Set(listing.bedrooms_total),
            bathrooms_total_integer: Set(listing.bathrooms_total_integer),
            living_area: Set(listing.living_area),
            year_built: Set(listing.year_built),
            lot_size_area: Set(to_decimal(listing.lot_size_area)),
            garage_spaces: Set(listing.garage_spaces),
            parking_total: Set(listing.parking_total),
            latitude: Set(listing.latitude),
            longitude: Set(listing.longitude),
            unparsed_address: Set(listing.unparsed_address.clone()),
            city: Set(listing.city.clone()),
            state_or_province: Set(listing.state_or_province.clone()),
            postal_code: Set(listing.postal_code.clone()),
            county_or_parish: Set(listing.county_or_parish.clone()),
            subdivision_name: Set(listing.subdivision_name.clone()),
            public_remarks: Set(listing.public_remarks.clone()),
            mlg_can_view: Set(listing.mlg_can_view),
            permitted_use: Set(listing.permitted_use.clone()),
            modification_timestamp: Set(to_tz(listing.modification_timestamp)),
            photos_change_timestamp: Set(listing.photos_change_timestamp.map(to_tz)),
            original_entry_timestamp: Set(listing.original_entry_timestamp.map(to_tz)),
            price_change_timestamp: Set(listing.price_change_timestamp.map(to_tz)),
            major_change_timestamp: Set(listing.major_change_timestamp.map(to_tz)),
            raw: Set(listing.raw.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        properties::Entity::insert(model)
            .on_conflict(
                OnConflict::column(properties::Column::ListingKey)
                    .update_columns([
                        properties::Column::OriginatingSystem,
                        properties::Column::StandardStatus,
                        properties::Column::PropertyType,
                        properties::Column::PropertySubType,
                        properties::Column::ListPrice,
                        properties::Column::OriginalListPrice,
                        properties::Column::BedroomsTotal,
                        properties::Column::BathroomsTotalInteger,
                        properties::Column::LivingArea,
                        properties::Column::YearBuilt,
                        properties::Column::LotSizeArea,
                        properties::Column::GarageSpaces,
                        properties::Column::ParkingTotal,
                        properties::Column::Latitude,
                        properties::Column::Longitude,
                        properties::Column::UnparsedAddress,
                        properties::Column::City,
                        properties::Column::StateOrProvince,
                        properties::Column::PostalCode,
                        properties::Column::CountyOrParish,
                        properties::Column::SubdivisionName,
                        properties::Column::PublicRemarks,
                        properties::Column::MlgCanView,
                        properties::Column::PermittedUse,
                        properties::Column::ModificationTimestamp,
                        properties::Column::PhotosChangeTimestamp,
                        properties::Column::OriginalEntryTimestamp,
                        properties::Column::PriceChangeTimestamp,
                        properties::Column::MajorChangeTimestamp,
                        properties::Column::Raw,
                        properties::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&*self.db)
            .await
            .map_err(map_db_err)?;

        Ok(())
    }

    async fn upsert_media_metadata(
        &self,
        listing_key: &str,
        assets: &[MediaAsset],
    ) -> Result<(), RelationalStoreError> {
        if assets.is_empty() {
            return Ok(());
        }

        let keys: Vec<String> = assets.iter().map(|a| a.media_key.clone()).collect();
        let existing = media::Entity::find()
            .filter(media::Column::MediaKey.is_in(keys))
            .all(&*self.db)
            .await
            .map_err(map_db_err)?;
        let existing_by_key: std::collections::HashMap<String, media::Model> =
            existing.into_iter().map(|m| (m.media_key.clone(), m)).collect();

        let now = Utc::now().fixed_offset();
        let models: Vec<media::ActiveModel> = assets
            .iter()
            .map(|a| {
                // `local_url` is monotonic once set (spec.md §3): preserve it unless the
                // upstream modification timestamp for this asset has actually advanced,
                // in which case the stale hydrated bytes no longer match and the media
                // worker must be allowed to re-hydrate.
                let local_url = match existing_by_key.get(&a.media_key) {
                    Some(existing) if from_tz(existing.media_modification_timestamp) < a.media_modification_timestamp => None,
                    Some(existing) => existing.local_url.clone(),
                    None => None,
                };

                media::ActiveModel {
                    media_key: Set(a.media_key.clone()),
                    resource_record_key: Set(listing_key.to_string()),
                    media_category: Set(a.media_category.clone()),
                    media_order: Set(a.media_order),
                    media_url: Set(a.media_url.clone()),
                    local_url: Set(local_url),
                    image_width: Set(a.image_width),
                    image_height: Set(a.image_height),
                    media_modification_timestamp: Set(to_tz(a.media_modification_timestamp)),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
            })
            .collect();

        media::Entity::insert_many(models)
            .on_conflict(
                OnConflict::column(media::Column::MediaKey)
                    .update_columns([
                        media::Column::ResourceRecordKey,
                        media::Column::MediaCategory,
                        media::Column::MediaOrder,
                        media::Column::MediaUrl,
                        media::Column::LocalUrl,
                        media::Column::ImageWidth,
                        media::Column::ImageHeight,
                        media::Column::MediaModificationTimestamp,
                        media::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&*self.db)
            .await
            .map_err(map_db_err)?;

        Ok(())
    }

    async fn replace_rooms(&self, listing_key: &str, rooms_in: &[Room]) -> Result<(), RelationalStoreError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        rooms::Entity::delete_many()
            .filter(rooms::Column::ListingKey.eq(listing_key))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if !rooms_in.is_empty() {
            let now = Utc::now().fixed_offset();
            let models: Vec<rooms::ActiveModel> = rooms_in
                .iter()
                .map(|r| rooms::ActiveModel {
                    id: sea_orm::NotSet,
                    listing_key: Set(r.listing_key.clone()),
                    room_type: Set(r.room_type.clone()),
                    room_level: Set(r.room_level.clone()),
                    room_length: Set(to_decimal(r.room_length)),
                    room_width: Set(to_decimal(r.room_width)),
                    created_at: Set(now),
                })
                .collect();
            rooms::Entity::insert_many(models)
                .exec(&txn)
                .await
                .map_err(map_db_err)?;
        }

        txn.commit().await.map_err(map_db_err)
    }

    async fn replace_unit_types(
        &self,
        listing_key: &str,
        unit_types_in: &[UnitType],
    ) -> Result<(), RelationalStoreError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        unit_types::Entity::delete_many()
            .filter(unit_types::Column::ListingKey.eq(listing_key))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if !unit_types_in.is_empty() {
            let now = Utc::now().fixed_offset();
            let models: Vec<unit_types::ActiveModel> = unit_types_in
                .iter()
                .map(|u| unit_types::ActiveModel {
                    id: sea_orm::NotSet,
                    listing_key: Set(u.listing_key.clone()),
                    unit_type_type: Set(u.unit_type_type.clone()),
                    beds_total: Set(u.beds_total),
                    baths_total: Set(to_decimal(u.baths_total)),
                    actual_rent: Set(to_decimal(u.actual_rent)),
                    created_at: Set(now),
                })
                .collect();
            unit_types::Entity::insert_many(models)
                .exec(&txn)
                .await
                .map_err(map_db_err)?;
        }

        txn.commit().await.map_err(map_db_err)
    }

    async fn upsert_open_house(&self, open_house: &OpenHouse) -> Result<(), RelationalStoreError> {
        let now = Utc::now().fixed_offset();
        let model = open_houses::ActiveModel {
            open_house_key: Set(open_house.open_house_key.clone()),
            listing_key: Set(open_house.listing_key.clone()),
            open_house_start_time: Set(to_tz(open_house.open_house_start_time)),
            open_house_end_time: Set(to_tz(open_house.open_house_end_time)),
            open_house_remarks: Set(open_house.open_house_remarks.clone()),
            modification_timestamp: Set(to_tz(open_house.modification_timestamp)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        open_houses::Entity::insert(model)
            .on_conflict(
                OnConflict::column(open_houses::Column::OpenHouseKey)
                    .update_columns([
                        open_houses::Column::ListingKey,
                        open_houses::Column::OpenHouseStartTime,
                        open_houses::Column::OpenHouseEndTime,
                        open_houses::Column::OpenHouseRemarks,
                        open_houses::Column::ModificationTimestamp,
                        open_houses::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&*self.db)
            .await
            .map_err(map_db_err)?;

        Ok(())
    }

    async fn delete_listing(&self, listing_key: &str) -> Result<(), RelationalStoreError> {
        properties::Entity::delete_by_id(listing_key)
            .exec(&*self.db)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn upsert_member(&self, member: &Member) -> Result<(), RelationalStoreError> {
        let now = Utc::now().fixed_offset();
        let model = members::ActiveModel {
            member_key: Set(member.member_key.clone()),
            originating_system: Set(member.originating_system.clone()),
            member_full_name: Set(member.member_full_name.clone()),
            member_email: Set(member.member_email.clone()),
            member_phone: Set(member.member_phone.clone()),
            office_key: Set(member.office_key.clone()),
            member_status: Set(member.member_status.clone()),
            raw: Set(member.raw.clone()),
            modification_timestamp: Set(to_tz(member.modification_timestamp)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        members::Entity::insert(model)
            .on_conflict(
                OnConflict::column(members::Column::MemberKey)
                    .update_columns([
                        members::Column::OriginatingSystem,
                        members::Column::MemberFullName,
                        members::Column::MemberEmail,
                        members::Column::MemberPhone,
                        members::Column::OfficeKey,
                        members::Column::MemberStatus,
                        members::Column::Raw,
                        members::Column::ModificationTimestamp,
                        members::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&*self.db)
            .await
            .map_err(map_db_err)?;

        Ok(())
    }

    async fn upsert_office(&self, office: &Office) -> Result<(), RelationalStoreError> {
        let now = Utc::now().fixed_offset();
        let model = offices::ActiveModel {
            office_key: Set(office.office_key.clone()),
            originating_system: Set(office.originating_system.clone()),
            office_name: Set(office.office_name.clone()),
            office_phone: Set(office.office_phone.clone()),
            office_email: Set(office.office_email.clone()),
            office_address1: Set(office.office_address1.clone()),
            office_city: Set(office.office_city.clone()),
            office_state_or_province: Set(office.office_state_or_province.clone()),
            office_postal_code: Set(office.office_postal_code.clone()),
            raw: Set(office.raw.clone()),
            modification_timestamp: Set(to_tz(office.modification_timestamp)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        offices::Entity::insert(model)
            .on_conflict(
                OnConflict::column(offices::Column::OfficeKey)
                    .update_columns([
                        offices::Column::OriginatingSystem,
                        offices::Column::OfficeName,
                        offices::Column::OfficePhone,
                        offices::Column::OfficeEmail,
                        offices::Column::OfficeAddress1,
                        offices::Column::OfficeCity,
                        offices::Column::OfficeStateOrProvince,
                        offices::Column::OfficePostalCode,
                        offices::Column::Raw,
                        offices::Column::ModificationTimestamp,
                        offices::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&*self.db)
            .await
            .map_err(map_db_err)?;

        Ok(())
    }

    async fn mark_media_downloaded(&self, asset_key: &str, local_url: &str) -> Result<(), RelationalStoreError> {
        let existing = media::Entity::find_by_id(asset_key)
            .one(&*self.db)
            .await
            .map_err(map_db_err)?;

        let Some(existing) = existing else {
            return Ok(());
        };

        let mut am: media::ActiveModel = existing.into();
        am.local_url = Set(Some(local_url.to_string()));
        am.updated_at = Set(Utc::now().fixed_offset());
        am.update(&*self.db).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn update_media_url(
        &self,
        asset_key: &str,
        url: &str,
        modified: DateTime<Utc>,
    ) -> Result<(), RelationalStoreError> {
        let existing = media::Entity::find_by_id(asset_key)
            .one(&*self.db)
            .await
            .map_err(map_db_err)?;

        let Some(existing) = existing else {
            return Ok(());
        };

        let mut am: media::ActiveModel = existing.into();
        am.media_url = Set(Some(url.to_string()));
        am.media_modification_timestamp = Set(to_tz(modified));
        am.updated_at = Set(Utc::now().fixed_offset());
        am.update(&*self.db).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn delete_media_not_in(
        &self,
        listing_key: &str,
        keep_asset_keys: &[String],
    ) -> Result<Vec<String>, RelationalStoreError> {
        let mut query = media::Entity::find().filter(media::Column::ResourceRecordKey.eq(listing_key));
        if !keep_asset_keys.is_empty() {
            query = query.filter(media::Column::MediaKey.is_not_in(keep_asset_keys.to_vec()));
        }

        let orphans = query.all(&*self.db).await.map_err(map_db_err)?;
        let orphan_keys: Vec<String> = orphans.iter().map(|m| m.media_key.clone()).collect();

        if orphan_keys.is_empty() {
            return Ok(orphan_keys);
        }

        media::Entity::delete_many()
            .filter(media::Column::MediaKey.is_in(orphan_keys.clone()))
            .exec(&*self.db)
            .await
            .map_err(map_db_err)?;

        Ok(orphan_keys)
    }

    async fn media_keys_missing_local_url(&self, listing_key: &str) -> Result<Vec<String>, RelationalStoreError> {
        let rows = media::Entity::find()
            .filter(media::Column::ResourceRecordKey.eq(listing_key))
            .filter(media::Column::LocalUrl.is_null())
            .filter(media::Column::MediaUrl.is_not_null())
            .all(&*self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(|m| m.media_key).collect())
    }

    async fn count_missing_media(&self) -> Result<i64, RelationalStoreError> {
        let sql = "SELECT COUNT(*) AS count FROM mls_media \
            WHERE local_url IS NULL AND media_url IS NOT NULL \
            AND (media_category IS NULL OR lower(media_category) <> 'video')";
        let row = self
            .db
            .query_one(Statement::from_string(self.db.get_database_backend(), sql))
            .await
            .map_err(map_db_err)?;
        match row {
            Some(row) => row.try_get::<i64>("", "count").map_err(map_db_err),
            None => Ok(0),
        }
    }

    async fn pick_listing_with_missing_media(
        &self,
        exclude: &[String],
        limit: usize,
    ) -> Result<Vec<String>, RelationalStoreError> {
        let backend = self.db.get_database_backend();
        let mut values: Vec<sea_orm::Value> = Vec::new();
        let mut sql = String::from(
            "SELECT p.listing_key FROM mls_properties p WHERE EXISTS ( \
                SELECT 1 FROM mls_media m WHERE m.resource_record_key = p.listing_key \
                AND m.local_url IS NULL AND m.media_url IS NOT NULL \
                AND (m.media_category IS NULL OR lower(m.media_category) <> 'video') \
            )",
        );

        if !exclude.is_empty() {
            let placeholders: Vec<String> = (0..exclude.len()).map(|i| format!("${}", i + 1)).collect();
            sql.push_str(&format!(" AND p.listing_key NOT IN ({})", placeholders.join(", ")));
            for key in exclude {
                values.push(sea_orm::Value::String(Some(Box::new(key.clone()))));
            }
        }

        sql.push_str(&format!(
            " ORDER BY p.modification_timestamp DESC LIMIT ${}",
            values.len() + 1
        ));
        values.push(sea_orm::Value::BigInt(Some(limit as i64)));

        let stmt = Statement::from_sql_and_values(backend, sql, values);
        let rows = self.db.query_all(stmt).await.map_err(map_db_err)?;
        rows.iter()
            .map(|r| r.try_get::<String>("", "listing_key").map_err(map_db_err))
            .collect()
    }

    async fn local_listing_count(&self) -> Result<i64, RelationalStoreError> {
        properties::Entity::find()
            .count(&*self.db)
            .await
            .map(|c| c as i64)
            .map_err(map_db_err)
    }

    async fn get_high_water_mark(
        &self,
        resource: SyncResource,
        originating_system: &str,
    ) -> Result<Option<DateTime<Utc>>, RelationalStoreError> {
        let row = sync_state::Entity::find_by_id((resource.as_str().to_string(), originating_system.to_string()))
            .one(&*self.db)
            .await
            .map_err(map_db_err)?;
        Ok(row.map(|r| from_tz(r.high_water_mark)))
    }

    async fn set_high_water_mark(
        &self,
        resource: SyncResource,
        originating_system: &str,
        hwm: DateTime<Utc>,
    ) -> Result<(), RelationalStoreError> {
        let now = Utc::now().fixed_offset();
        let model = sync_state::ActiveModel {
            resource: Set(resource.as_str().to_string()),
            originating_system: Set(originating_system.to_string()),
            high_water_mark: Set(to_tz(hwm)),
            last_run_at: Set(Some(now)),
            updated_at: Set(now),
        };

        sync_state::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([sync_state::Column::Resource, sync_state::Column::OriginatingSystem])
                    .update_columns([
                        sync_state::Column::HighWaterMark,
                        sync_state::Column::LastRunAt,
                        sync_state::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&*self.db)
            .await
            .map_err(map_db_err)?;

        Ok(())
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>, RelationalStoreError> {
        let row = settings::Entity::find_by_id(key)
            .one(&*self.db)
            .await
            .map_err(map_db_err)?;
        Ok(row.map(|r| r.value))
    }

    async fn get_problematic_listing(
        &self,
        listing_key: &str,
    ) -> Result<Option<ProblematicListingState>, RelationalStoreError> {
        let row = problematic_properties::Entity::find_by_id(listing_key)
            .one(&*self.db)
            .await
            .map_err(map_db_err)?;
        Ok(row.map(|r| ProblematicListingState {
            consecutive_fails: r.consecutive_fails,
            cooldown_until: r.cooldown_until.map(from_tz),
        }))
    }

    async fn record_problematic_listing(
        &self,
        listing_key: &str,
        consecutive_fails: i32,
        cooldown_until: Option<DateTime<Utc>>,
        reason: &str,
    ) -> Result<(), RelationalStoreError> {
        let now = Utc::now().fixed_offset();
        let model = problematic_properties::ActiveModel {
            listing_key: Set(listing_key.to_string()),
            consecutive_fails: Set(consecutive_fails),
            last_fail_at: Set(Some(now)),
            cooldown_until: Set(cooldown_until.map(to_tz)),
            last_fail_reason: Set(Some(reason.to_string())),
            updated_at: Set(now),
        };

        problematic_properties::Entity::insert(model)
            .on_conflict(
                OnConflict::column(problematic_properties::Column::ListingKey)
                    .update_columns([
                        problematic_properties::Column::ConsecutiveFails,
                        problematic_properties::Column::LastFailAt,
                        problematic_properties::Column::CooldownUntil,
                        problematic_properties::Column::LastFailReason,
                        problematic_properties::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&*self.db)
            .await
            .map_err(map_db_err)?;

        Ok(())
    }

    async fn clear_problematic_listing(&self, listing_key: &str) -> Result<(), RelationalStoreError> {
        problematic_properties::Entity::delete_by_id(listing_key)
            .exec(&*self.db)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn record_rate_limit_event(
        &self,
        endpoint: &str,
        retry_after_seconds: Option<i32>,
    ) -> Result<(), RelationalStoreError> {
        let model = rate_limit_events::ActiveModel {
            id: sea_orm::NotSet,
            endpoint: Set(endpoint.to_string()),
            retry_after_seconds: Set(retry_after_seconds),
            occurred_at: Set(Utc::now().fixed_offset()),
        };
        model.insert(&*self.db).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn progress_counts(&self) -> Result<ProgressCounts, RelationalStoreError> {
        let sql = "SELECT \
                (SELECT COUNT(*) FROM mls_properties) AS total_listings, \
                (SELECT COUNT(*) FROM mls_properties WHERE mlg_can_view) AS active_listings, \
                (SELECT COUNT(*) FROM mls_media) AS total_media, \
                (SELECT COUNT(*) FROM mls_media WHERE local_url IS NOT NULL) AS hydrated_media, \
                (SELECT COUNT(*) FROM mls_media WHERE local_url IS NULL AND media_url IS NOT NULL \
                    AND (media_category IS NULL OR lower(media_category) <> 'video')) AS missing_media, \
                (SELECT COUNT(DISTINCT resource_record_key) FROM mls_media WHERE local_url IS NULL \
                    AND media_url IS NOT NULL \
                    AND (media_category IS NULL OR lower(media_category) <> 'video')) AS listings_with_missing_media";

        let row = self
            .db
            .query_one(Statement::from_string(self.db.get_database_backend(), sql))
            .await
            .map_err(map_db_err)?;

        match row {
            Some(row) => Ok(ProgressCounts {
                total_listings: row.try_get("", "total_listings").map_err(map_db_err)?,
                active_listings: row.try_get("", "active_listings").map_err(map_db_err)?,
                total_media: row.try_get("", "total_media").map_err(map_db_err)?,
                hydrated_media: row.try_get("", "hydrated_media").map_err(map_db_err)?,
                missing_media: row.try_get("", "missing_media").map_err(map_db_err)?,
                listings_with_missing_media: row
                    .try_get("", "listings_with_missing_media")
                    .map_err(map_db_err)?,
            }),
            None => Ok(ProgressCounts::default()),
        }
    }

    async fn insert_progress_sample(
        &self,
        counts: ProgressCounts,
        downloads_completed: i64,
        api_rate_limited: bool,
        media_rate_limited: bool,
    ) -> Result<(), RelationalStoreError> {
        let pct = if counts.total_media > 0 {
            (counts.hydrated_media as f64 / counts.total_media as f64) * 100.0
        } else {
            0.0
        };

        let model = progress_history::ActiveModel {
            id: sea_orm::NotSet,
            recorded_at: Set(Utc::now().fixed_offset()),
            total_listings: Set(counts.total_listings),
            active_listings: Set(counts.active_listings),
            total_media: Set(counts.total_media),
            hydrated_media: Set(counts.hydrated_media),
            missing_media: Set(counts.missing_media),
            pct_hydrated: Set(sea_orm::prelude::Decimal::from_f64_retain(pct).unwrap_or_default()),
            listings_with_missing_media: Set(counts.listings_with_missing_media),
            downloads_completed: Set(downloads_completed),
            api_rate_limited: Set(api_rate_limited),
            media_rate_limited: Set(media_rate_limited),
        };

        model.insert(&*self.db).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn prune_progress_history(&self, older_than: DateTime<Utc>) -> Result<(), RelationalStoreError> {
        progress_history::Entity::delete_many()
            .filter(progress_history::Column::RecordedAt.lt(to_tz(older_than)))
            .exec(&*self.db)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn reset_all_tables(&self) -> Result<(), RelationalStoreError> {
        let sql = "TRUNCATE TABLE \
            mls_problematic_properties, mls_rate_limit_events, mls_progress_history, \
            mls_open_houses, mls_media, mls_rooms, mls_unit_types, mls_properties, \
            mls_members, mls_offices, mls_sync_state, mls_lookups \
            RESTART IDENTITY CASCADE";

        self.db
            .execute(Statement::from_string(self.db.get_database_backend(), sql))
            .await
            .map_err(map_db_err)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    fn sample_listing() -> Listing {
        Listing::from_upstream(
            json!({
                "ListingKey": "L1",
                "ModificationTimestamp": "2025-01-01T00:00:00Z",
                "MlgCanView": true,
                "LivingArea": "472.44",
            }),
            "ABOR",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn upsert_listing_executes_without_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let store = PostgresMlsStore::new(Arc::new(db));
        let result = store.upsert_listing(&sample_listing()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn upsert_media_metadata_short_circuits_on_empty_assets() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let store = PostgresMlsStore::new(Arc::new(db));
        let result = store.upsert_media_metadata("L1", &[]).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn get_high_water_mark_returns_none_when_absent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<sync_state::Model>::new()])
            .into_connection();

        let store = PostgresMlsStore::new(Arc::new(db));
        let result = store
            .get_high_water_mark(SyncResource::Property, "ABOR")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn get_high_water_mark_returns_persisted_value() {
        let hwm = Utc::now().fixed_offset();
        let model = sync_state::Model {
            resource: "Property".to_string(),
            originating_system: "ABOR".to_string(),
            high_water_mark: hwm,
            last_run_at: Some(hwm),
            updated_at: hwm,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model]])
            .into_connection();

        let store = PostgresMlsStore::new(Arc::new(db));
        let result = store
            .get_high_water_mark(SyncResource::Property, "ABOR")
            .await
            .unwrap();
        assert_eq!(result.unwrap(), from_tz(hwm));
    }

    #[tokio::test]
    async fn delete_media_not_in_returns_empty_when_no_orphans() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<media::Model>::new()])
            .into_connection();

        let store = PostgresMlsStore::new(Arc::new(db));
        let result = store
            .delete_media_not_in("L1", &["M1".to_string()])
            .await
            .unwrap();
        assert!(result.is_empty());
    }
}
