//! Postcode lookups and per-user saved postcodes.
//!
//! [`PostcodeLookup`] talks to postcodes.io; [`PostcodeStore`] keeps each
//! signed-in user's list of postcodes in a local SQLite file and refuses
//! postcodes the lookup service does not recognise.

pub mod error;
pub mod lookup;
pub mod store;
pub mod userdata;

pub use error::{LookupError, StoreError};
pub use lookup::{Coordinates, PostcodeDetails, PostcodeLookup};
pub use store::PostcodeStore;
pub use userdata::UserDataDb;
