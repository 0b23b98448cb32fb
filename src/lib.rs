//! linkhoard: Browser bookmark import and link status verification
//!
//! Commands:
//! - import: Normalize and deduplicate Netscape bookmark exports
//! - check: Probe bookmark URLs and annotate each with its HTTP status

pub mod add_date;
pub mod anchors;
pub mod canonical;
pub mod config;
pub mod dedupe;
pub mod import;
pub mod logging;
pub mod probe;
pub mod settled;
pub mod status_check;
pub mod title;

pub use add_date::{decode_add_date, FALLBACK_CREATED_AT};
pub use anchors::{extract_anchors, AnchorCandidate};
pub use canonical::{canonicalize, try_canonicalize, UrlPolicy, UrlRejection};
pub use config::{CheckConfig, ImportConfig};
pub use dedupe::{dedupe, CanonicalBookmarkImport, ImportRecord};
pub use import::{import_files, import_report, BookmarkSource, ImportReport, InMemoryFile};
pub use probe::{ProbeFailure, StatusOutcome, StatusProbe};
pub use settled::{run_all, run_all_bounded, Settled};
pub use status_check::{check_all, Annotated, HasUrl, LinkItem, StatusChecker, StatusReport};
pub use title::normalize_title;
