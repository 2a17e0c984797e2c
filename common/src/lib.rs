//! Filter state, URL codec and result types shared by the navigation backend
//! and whatever presentation layer renders its pages.

extern crate serde;


pub mod search_const;
pub mod dimension;
pub mod filter_state;
pub mod url_codec;
pub mod breadcrumbs;
pub mod search_result;

pub use dimension::{Dimension, DIMENSIONS};
pub use filter_state::{CameraSelection, FilterState};
pub use url_codec::{DecodeError, canonical_url, decode, page_url};
