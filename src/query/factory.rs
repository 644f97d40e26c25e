use super::Query;
use crate::connection::Connection;

/// Creates fresh, empty queries bound to a connection. No I/O happens here.
pub trait QueryFactory: Send + Sync {
    fn create<'c>(&self, connection: &'c dyn Connection) -> Query<'c>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultQueryFactory;

impl QueryFactory for DefaultQueryFactory {
    fn create<'c>(&self, connection: &'c dyn Connection) -> Query<'c> {
        Query::new(connection)
    }
}
