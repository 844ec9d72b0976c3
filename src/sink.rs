pub mod db;

pub use self::db::UpsertSink;
