//! Catalogue seeding.
//!
//! Runs at startup when `SEED_CATALOG` is enabled. Everything is
//! get-or-create: existing rows are left untouched, and a grant is only
//! written when the `(user type, sub-resource)` pair has none yet, so grants
//! edited by an operator survive restarts.

use std::collections::HashMap;

use civic_core::catalog::{self, GrantSpec};
use civic_core::types::DbId;

use crate::models::resource::NewSubResource;
use crate::models::user_type::NewUserType;
use crate::store::{AuthStore, StoreError, StoreResult};

/// What a seeding run changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub user_types: usize,
    pub resources: usize,
    pub sub_resources: usize,
    /// Grants written by this run (explicit and staff defaults).
    pub grants_created: usize,
}

/// Apply the built-in catalogue to `store`.
pub async fn apply_catalog(store: &dyn AuthStore) -> StoreResult<SeedReport> {
    let mut report = SeedReport::default();

    let mut type_ids: HashMap<&'static str, DbId> = HashMap::new();
    for spec in catalog::USER_TYPES {
        let user_type = store
            .get_or_create_user_type(&NewUserType {
                name: spec.name.to_string(),
                description: spec.description.to_string(),
                is_municipal_staff: spec.is_municipal_staff,
            })
            .await?;
        type_ids.insert(spec.name, user_type.id);
        report.user_types += 1;
    }

    let mut sub_ids: HashMap<&'static str, DbId> = HashMap::new();
    for spec in catalog::RESOURCES {
        let resource = store
            .get_or_create_resource(spec.name, spec.description)
            .await?;
        report.resources += 1;

        for sub in spec.sub_resources {
            let row = store
                .get_or_create_sub_resource(&NewSubResource {
                    resource_id: resource.id,
                    name: sub.name.to_string(),
                    description: sub.description.to_string(),
                    allow_anonymous: sub.allow_anonymous,
                })
                .await?;
            sub_ids.insert(sub.name, row.id);
            report.sub_resources += 1;
        }
    }

    let grants = catalog::explicit_grants()
        .into_iter()
        .chain(catalog::municipal_staff_defaults());
    for grant in grants {
        if create_grant_if_absent(store, &type_ids, &sub_ids, &grant).await? {
            report.grants_created += 1;
        }
    }

    tracing::info!(
        user_types = report.user_types,
        resources = report.resources,
        sub_resources = report.sub_resources,
        grants_created = report.grants_created,
        "Catalogue seeded"
    );
    Ok(report)
}

async fn create_grant_if_absent(
    store: &dyn AuthStore,
    type_ids: &HashMap<&'static str, DbId>,
    sub_ids: &HashMap<&'static str, DbId>,
    grant: &GrantSpec,
) -> StoreResult<bool> {
    let (Some(&user_type_id), Some(&sub_resource_id)) =
        (type_ids.get(grant.user_type), sub_ids.get(grant.sub_resource))
    else {
        return Err(StoreError::NotFound(format!(
            "catalogue grant {} -> {}",
            grant.user_type, grant.sub_resource
        )));
    };

    if store
        .find_user_type_grant(user_type_id, sub_resource_id)
        .await?
        .is_some()
    {
        return Ok(false);
    }
    store
        .upsert_user_type_grant(user_type_id, sub_resource_id, grant.levels)
        .await?;
    Ok(true)
}
