//! Manifest layer
//! - types.rs: Package record and checkver descriptor
//! - decode.rs: manifest / install-record decoding
//! - traits.rs: ManifestStore trait and ScanFilter
//! - installed.rs: installed apps (`<root>/apps`)
//! - bucket.rs: bucket catalogs (`<root>/buckets`)

pub mod bucket;
pub mod decode;
pub mod error;
pub mod installed;
pub mod traits;
pub mod types;
mod walk;

pub use bucket::BucketStore;
pub use error::{ManifestError, StoreError};
pub use installed::InstalledStore;
pub use traits::{ManifestStore, ScanFilter};
pub use types::{Checkver, CheckverStrategy, Package, UNKNOWN};
