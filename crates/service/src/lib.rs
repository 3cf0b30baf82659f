//! Service layer for the heritage travel API.
//! - `storage` holds the document contract and its Firestore and JSON file strategies.
//! - `bootstrap` picks the strategy once at startup.
//! - `catalog`, `bookmarks` and `itinerary` implement the business operations on top.

pub mod errors;
pub mod runtime;
pub mod storage;
pub mod bootstrap;
pub mod catalog;
pub mod bookmarks;
pub mod itinerary;
