pub mod db;

pub use db::{VoyagerDb, DEFAULT_DB_PATH};
