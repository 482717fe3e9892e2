pub mod utils;

mod sessions;
