pub mod event;
pub mod response;
pub mod root;

pub use event::{Event, SUPPORTED_FIELDS, SUPPORTED_JSON_FIELDS};
pub use response::{EventVerification, LogResult, RawSearchResult, ReturnedEvent, ServerResponse, VerifiedEvent};
pub use root::{MerkleRoot, RootSource};
