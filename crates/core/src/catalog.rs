//! Built-in catalogue of user types, resources and default grants.
//!
//! The auth service seeds this on startup (see `civic_db::seed`). Seeding is
//! get-or-create, so operators can edit grants afterwards without the next
//! restart reverting them.
//!
//! Sub-resource names are unique across the whole catalogue; grants refer to
//! sub-resources by name only.

use std::collections::HashSet;

use crate::permission::PermissionLevel::{self, Admin, Read, Write};

pub struct UserTypeSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub is_municipal_staff: bool,
}

pub struct SubResourceSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub allow_anonymous: bool,
}

pub struct ResourceSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub sub_resources: &'static [SubResourceSpec],
}

/// One default grant: `user_type` may act on `sub_resource` with `levels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantSpec {
    pub user_type: &'static str,
    pub resource: &'static str,
    pub sub_resource: &'static str,
    pub levels: &'static [PermissionLevel],
}

const R: &[PermissionLevel] = &[Read];
const W: &[PermissionLevel] = &[Write];
const RW: &[PermissionLevel] = &[Read, Write];
const RWA: &[PermissionLevel] = &[Read, Write, Admin];

const fn user_type(
    name: &'static str,
    description: &'static str,
    is_municipal_staff: bool,
) -> UserTypeSpec {
    UserTypeSpec {
        name,
        description,
        is_municipal_staff,
    }
}

const fn sub(
    name: &'static str,
    description: &'static str,
    allow_anonymous: bool,
) -> SubResourceSpec {
    SubResourceSpec {
        name,
        description,
        allow_anonymous,
    }
}

pub const USER_TYPES: &[UserTypeSpec] = &[
    user_type("resident", "Local resident", false),
    user_type("tourist", "Visitor to the area", false),
    user_type("property-developer", "Property developer", false),
    user_type("planning-department", "Municipal planning staff", true),
    user_type("building-inspector", "Municipal building inspector", true),
    user_type("environmental-officer", "Environmental health officer", true),
    user_type("funeral-home", "Funeral home operator", false),
    user_type("event-organizer", "Community event organizer", false),
    user_type("library-staff", "Municipal library staff", true),
    user_type("business-support", "Economic development staff", true),
    user_type("fire-department", "Fire and safety officer", true),
    user_type("law-enforcement", "Municipal law enforcement", true),
    user_type("waste-management", "Waste management staff", true),
    user_type("health-services", "Public health staff", true),
    user_type("community-services", "Community services staff", true),
    user_type("business-owner", "Local business owner", false),
    user_type("restaurant-owner", "Restaurant owner/manager", false),
    user_type("accommodation-provider", "Accommodation provider", false),
    user_type("activities-provider", "Activities provider", false),
];

pub const RESOURCES: &[ResourceSpec] = &[
    ResourceSpec {
        name: "calendar-services",
        description: "Calendar and events services",
        sub_resources: &[
            sub("events", "Calendar events sub resource services", true),
            sub("comments", "Calendar comments sub resource services", true),
        ],
    },
    ResourceSpec {
        name: "activities-services",
        description: "Activities services",
        sub_resources: &[
            sub("fetch-activities", "Activities fetching sub resource services", true),
            sub("modify-activities", "Activities modifying sub resource services", false),
            sub("review-activities", "Activities reviewing sub resource services", false),
        ],
    },
    ResourceSpec {
        name: "places-services",
        description: "Places of interest services",
        sub_resources: &[
            sub("fetch-places", "Place of interest fetching sub resource services", true),
            sub("modify-places", "Place of interest modifying sub resource services", false),
            sub("review-places", "Place of interest reviewing sub resource services", false),
        ],
    },
    ResourceSpec {
        name: "accommodation-services",
        description: "Accommodation services",
        sub_resources: &[
            sub("fetch-accommodation", "Accommodation fetching sub resource services", true),
            sub("modify-accommodation", "Accommodation modifying sub resource services", false),
            sub("review-accommodation", "Accommodation reviewing sub resource services", false),
        ],
    },
    ResourceSpec {
        name: "restaurants-services",
        description: "Restaurants services",
        sub_resources: &[
            sub("fetch-restaurants", "Restaurant fetching sub resource services", true),
            sub("review-restaurants", "Restaurant reviewing sub resource services", false),
        ],
    },
    ResourceSpec {
        name: "mapping-services",
        description: "Mapping services",
        sub_resources: &[sub("fetch-mapping", "Mapping fetching sub resource services", true)],
    },
    ResourceSpec {
        name: "weather-services",
        description: "Weather services",
        sub_resources: &[sub("fetch-weather", "Weather fetching sub resource services", true)],
    },
    ResourceSpec {
        name: "property-services",
        description: "Property and land management services",
        sub_resources: &[
            sub("property", "Property public sub resource services", true),
            sub("property-admin", "Property admin sub resource services", false),
        ],
    },
    ResourceSpec {
        name: "health-services",
        description: "Health services",
        sub_resources: &[
            sub("environment-health", "Environmental health sub services", true),
            sub("modify-cemetery-health", "Cemetery health sub services", false),
            sub("fetch-cemetery-health", "Cemetery health sub services", true),
            sub("complaint-health", "Health complaint sub services", false),
        ],
    },
    ResourceSpec {
        name: "community-services",
        description: "Community services",
        sub_resources: &[
            sub("books", "Books sub resource services", true),
            sub("borrow", "Borrow sub resource services", false),
        ],
    },
    ResourceSpec {
        name: "economic-services",
        description: "Economic development services",
        sub_resources: &[
            sub("register-business", "Register business sub resource services", true),
            sub("modify-attraction", "Modify attraction sub resource services", false),
            sub("fetch-attraction", "Fetch attraction sub resource services", true),
            sub("modify-events", "Modify events sub resource services", false),
            sub("fetch-events", "Fetch events sub resource services", true),
        ],
    },
    ResourceSpec {
        name: "safety-services",
        description: "Public safety services",
        sub_resources: &[
            sub("report-incident", "Report incident sub resource services", false),
            sub("status-incident", "Status incident sub resource services", true),
        ],
    },
    ResourceSpec {
        name: "waste-services",
        description: "Waste management services",
        sub_resources: &[
            sub("fetch-schedule", "Fetch schedule sub resource services", true),
            sub("modify-schedule", "Modify schedule sub resource services", false),
            sub("report-pickup", "Report pickup sub resource services", false),
            sub("fetch-recycling", "Fetch recycling sub resource services", true),
            sub("modify-recycling", "Modify recycling sub resource services", false),
            sub("bin", "Bin sub resource services", true),
            sub(
                "missed-waste-pickups",
                "Manage missed waste pickups sub resource services",
                false,
            ),
        ],
    },
    ResourceSpec {
        name: "citizen-portal",
        description: "Citizen portal services",
        sub_resources: &[sub("auth", "Citizen authentication sub resource services", true)],
    },
];

type GrantTable = &'static [(&'static str, &'static [(&'static str, &'static [PermissionLevel])])];

/// Explicit grants per user type, keyed by sub-resource name.
const USER_TYPE_GRANTS: GrantTable = &[
    (
        "resident",
        &[
            ("events", R),
            ("comments", RW),
            ("fetch-activities", R),
            ("modify-activities", R),
            ("review-activities", RW),
            ("fetch-places", R),
            ("review-places", RW),
            ("fetch-accommodation", R),
            ("review-accommodation", RW),
            ("fetch-restaurants", R),
            ("review-restaurants", RW),
            ("fetch-mapping", R),
            ("fetch-weather", R),
            ("property", R),
            ("environment-health", R),
            ("fetch-cemetery-health", R),
            ("complaint-health", RW),
            ("books", R),
            ("borrow", RW),
            ("register-business", RW),
            ("fetch-attraction", R),
            ("fetch-events", R),
            ("report-incident", RW),
            ("status-incident", R),
            ("fetch-schedule", R),
            ("report-pickup", RW),
            ("fetch-recycling", R),
            ("bin", RW),
            ("auth", RW),
            ("missed-waste-pickups", W),
        ],
    ),
    (
        "tourist",
        &[
            ("events", R),
            ("fetch-activities", R),
            ("modify-activities", R),
            ("review-activities", RW),
            ("fetch-places", R),
            ("fetch-accommodation", R),
            ("fetch-restaurants", R),
            ("fetch-mapping", R),
            ("fetch-weather", R),
            ("property", R),
            ("environment-health", R),
            ("fetch-cemetery-health", R),
            ("books", R),
            ("fetch-attraction", R),
            ("fetch-events", R),
            ("status-incident", R),
            ("fetch-schedule", R),
            ("fetch-recycling", R),
            ("auth", RW),
        ],
    ),
    (
        "property-developer",
        &[("property", RW), ("property-admin", R), ("auth", RW)],
    ),
    (
        "planning-department",
        &[
            ("property", R),
            ("property-admin", RWA),
            ("auth", RW),
            ("missed-waste-pickups", W),
        ],
    ),
    (
        "building-inspector",
        &[
            ("property", R),
            ("property-admin", RWA),
            ("auth", RW),
            ("missed-waste-pickups", W),
        ],
    ),
    (
        "environmental-officer",
        &[
            ("environment-health", RWA),
            ("complaint-health", RWA),
            ("auth", RW),
            ("missed-waste-pickups", W),
        ],
    ),
    (
        "funeral-home",
        &[
            ("fetch-cemetery-health", R),
            ("modify-cemetery-health", RW),
            ("auth", RW),
            ("missed-waste-pickups", W),
        ],
    ),
    (
        "event-organizer",
        &[
            ("events", RW),
            ("modify-events", RW),
            ("auth", RW),
            ("missed-waste-pickups", W),
        ],
    ),
    (
        "library-staff",
        &[
            ("books", RWA),
            ("borrow", RWA),
            ("auth", RW),
            ("missed-waste-pickups", W),
        ],
    ),
    (
        "business-support",
        &[
            ("register-business", RWA),
            ("modify-attraction", RWA),
            ("fetch-attraction", R),
            ("modify-events", RWA),
            ("fetch-events", R),
            ("auth", RW),
            ("missed-waste-pickups", W),
        ],
    ),
    (
        "fire-department",
        &[
            ("report-incident", RWA),
            ("status-incident", RWA),
            ("auth", RW),
            ("missed-waste-pickups", W),
        ],
    ),
    (
        "law-enforcement",
        &[
            ("report-incident", RWA),
            ("status-incident", RWA),
            ("auth", RW),
            ("missed-waste-pickups", W),
        ],
    ),
    (
        "waste-management",
        &[
            ("fetch-schedule", R),
            ("modify-schedule", RWA),
            ("report-pickup", RWA),
            ("fetch-recycling", R),
            ("modify-recycling", RWA),
            ("bin", RWA),
            ("auth", RW),
            ("missed-waste-pickups", RWA),
        ],
    ),
    (
        "health-services",
        &[
            ("environment-health", RWA),
            ("modify-cemetery-health", RWA),
            ("fetch-cemetery-health", R),
            ("complaint-health", RWA),
            ("auth", RW),
            ("missed-waste-pickups", W),
        ],
    ),
    (
        "community-services",
        &[
            ("books", RWA),
            ("borrow", RWA),
            ("auth", RW),
            ("missed-waste-pickups", W),
        ],
    ),
    (
        "business-owner",
        &[
            ("register-business", RW),
            ("auth", RW),
            ("missed-waste-pickups", W),
        ],
    ),
    (
        "restaurant-owner",
        &[
            ("fetch-restaurants", R),
            ("review-restaurants", RWA),
            ("auth", RW),
            ("missed-waste-pickups", W),
        ],
    ),
    (
        "accommodation-provider",
        &[
            ("fetch-accommodation", R),
            ("review-accommodation", RWA),
            ("auth", RW),
            ("missed-waste-pickups", W),
        ],
    ),
    (
        "activities-provider",
        &[
            ("fetch-activities", R),
            ("modify-activities", RWA),
            ("review-activities", RWA),
            ("auth", RW),
            ("missed-waste-pickups", W),
        ],
    ),
];

/// Find the resource owning a sub-resource name.
pub fn resource_of(sub_resource: &str) -> Option<&'static ResourceSpec> {
    RESOURCES
        .iter()
        .find(|r| r.sub_resources.iter().any(|s| s.name == sub_resource))
}

/// Every explicit grant in the catalogue.
///
/// Grants naming an unknown sub-resource are skipped; the catalogue tests
/// make sure there are none.
pub fn explicit_grants() -> Vec<GrantSpec> {
    USER_TYPE_GRANTS
        .iter()
        .flat_map(|(user_type, grants)| {
            grants.iter().filter_map(move |(sub_resource, levels)| {
                resource_of(sub_resource).map(|resource| GrantSpec {
                    user_type,
                    resource: resource.name,
                    sub_resource,
                    levels,
                })
            })
        })
        .collect()
}

/// Implicit `read` grants for municipal staff.
///
/// Every municipal-staff user type can read every sub-resource that is not
/// already anonymous and for which it has no explicit grant.
pub fn municipal_staff_defaults() -> Vec<GrantSpec> {
    let explicit: HashSet<(&str, &str)> = explicit_grants()
        .iter()
        .map(|g| (g.user_type, g.sub_resource))
        .collect();

    let mut defaults = Vec::new();
    for staff in USER_TYPES.iter().filter(|t| t.is_municipal_staff) {
        for resource in RESOURCES {
            for sub in resource.sub_resources.iter().filter(|s| !s.allow_anonymous) {
                if explicit.contains(&(staff.name, sub.name)) {
                    continue;
                }
                defaults.push(GrantSpec {
                    user_type: staff.name,
                    resource: resource.name,
                    sub_resource: sub.name,
                    levels: R,
                });
            }
        }
    }
    defaults
}
