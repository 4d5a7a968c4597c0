pub mod cascade;
pub mod config;
pub mod error;
pub mod listing;
pub mod region;
pub mod session;
pub mod source;

pub use cascade::{Callbacks, Cascade, CascadeState, SelectOutcome, Selection};
pub use config::{WilayahSettings, load_settings};
pub use error::{ConfigError, FetchError, ListingError, SessionError, ValidationError};
pub use listing::{
    ListingClient, PropertyCommand, UpdatePropertyCore, UpdatePropertyFacility,
    UpdatePropertyImages, UpdatePropertySpecification,
};
pub use region::{Level, Region, RegionQuery};
pub use session::{Session, SessionStore};
pub use source::{CachedSource, RegionClient, RegionSource};
