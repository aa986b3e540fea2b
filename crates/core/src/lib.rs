//! Core domain logic for Ubuntu Lingo: the cultural game catalog, the scripted
//! conversation driver, and the capability and storage contracts the API
//! service plugs into.

pub mod catalog;
pub mod conversation;
pub mod feedback;
pub mod language;
pub mod phrasebook;
pub mod scoring;
pub mod speech;
pub mod store;
pub mod translation;
