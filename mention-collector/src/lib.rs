pub mod collector;
pub mod mention;
pub mod source;

pub use collector::{CollectionReport, CommunityFailure, MentionCollector};
pub use source::SourceCollector;
