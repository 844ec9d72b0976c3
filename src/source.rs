pub mod db;
pub mod file;

pub use self::db::DbSource;
pub use self::file::CsvSource;
