pub mod reviews;

pub use reviews::{Review, ReviewFilter, ReviewStore, StoreError, TIMESTAMP_FORMAT};
