pub mod reviewer_cache;
