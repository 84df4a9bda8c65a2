// Points infrastructure - SQLite storage implementation

mod sqlite_points_store;

pub use sqlite_points_store::SqlitePointsStore;
