// Known message kinds emitted by the bundled auditor.

use super::{Level, MessageKind};

pub const DATE_MISSING: MessageKind = MessageKind::from_static("DATE_MISSING");
pub const LM_FUTURE: MessageKind = MessageKind::from_static("LM_FUTURE");
pub const CL_CORRECT: MessageKind = MessageKind::from_static("CL_CORRECT");
pub const TRANSFER_CODING_CHUNKED: MessageKind =
    MessageKind::from_static("TRANSFER_CODING_CHUNKED");
pub const REQUEST_CHUNKED: MessageKind = MessageKind::from_static("REQUEST_CHUNKED");
pub const CT_MISSING: MessageKind = MessageKind::from_static("CT_MISSING");
pub const REDIRECT_LOCATION: MessageKind = MessageKind::from_static("REDIRECT_LOCATION");
pub const REDIRECT_NO_LOCATION: MessageKind = MessageKind::from_static("REDIRECT_NO_LOCATION");
pub const FRESHNESS_FRESH: MessageKind = MessageKind::from_static("FRESHNESS_FRESH");
pub const FRESHNESS_STALE: MessageKind = MessageKind::from_static("FRESHNESS_STALE");
pub const FRESHNESS_HEURISTIC: MessageKind = MessageKind::from_static("FRESHNESS_HEURISTIC");
pub const FRESHNESS_NONE: MessageKind = MessageKind::from_static("FRESHNESS_NONE");
pub const INM_304: MessageKind = MessageKind::from_static("INM_304");
pub const IMS_304: MessageKind = MessageKind::from_static("IMS_304");
pub const INM_FULL: MessageKind = MessageKind::from_static("INM_FULL");
pub const IMS_FULL: MessageKind = MessageKind::from_static("IMS_FULL");
pub const MISSING_HDRS_304: MessageKind = MessageKind::from_static("MISSING_HDRS_304");
pub const VALIDATION_FAILED: MessageKind = MessageKind::from_static("VALIDATION_FAILED");

pub const CATEGORY_GENERAL: &str = "general";
pub const CATEGORY_CONNECTION: &str = "connection";
pub const CATEGORY_CACHING: &str = "caching";
pub const CATEGORY_VALIDATION: &str = "validation";

/// Every kind the auditor can emit, with the level and category it is
/// emitted at.
pub const REGISTRY: &[(MessageKind, Level, &str)] = &[
    (DATE_MISSING, Level::Bad, CATEGORY_GENERAL),
    (LM_FUTURE, Level::Bad, CATEGORY_CACHING),
    (CL_CORRECT, Level::Good, CATEGORY_CONNECTION),
    (TRANSFER_CODING_CHUNKED, Level::Info, CATEGORY_CONNECTION),
    (REQUEST_CHUNKED, Level::Info, CATEGORY_CONNECTION),
    (CT_MISSING, Level::Warning, CATEGORY_GENERAL),
    (REDIRECT_LOCATION, Level::Uri, CATEGORY_GENERAL),
    (REDIRECT_NO_LOCATION, Level::Bad, CATEGORY_GENERAL),
    (FRESHNESS_FRESH, Level::Good, CATEGORY_CACHING),
    (FRESHNESS_STALE, Level::Info, CATEGORY_CACHING),
    (FRESHNESS_HEURISTIC, Level::Warning, CATEGORY_CACHING),
    (FRESHNESS_NONE, Level::Info, CATEGORY_CACHING),
    (INM_304, Level::Good, CATEGORY_VALIDATION),
    (IMS_304, Level::Good, CATEGORY_VALIDATION),
    (INM_FULL, Level::Info, CATEGORY_VALIDATION),
    (IMS_FULL, Level::Info, CATEGORY_VALIDATION),
    (MISSING_HDRS_304, Level::Warning, CATEGORY_VALIDATION),
    (VALIDATION_FAILED, Level::Info, CATEGORY_VALIDATION),
];
